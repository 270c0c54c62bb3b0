//! User repository implementation

use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use super::map_unique_violation;
use crate::database::store::UserStore;
use crate::models::user::{Role, User};
use crate::utils::errors::{ConflictReason, EventHubError, Result};
use crate::utils::helpers::like_pattern;

const USER_COLUMNS: &str =
    "id, name, email, password_hash, role, phone, bio, last_login, created_at, updated_at";

#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn push_user_filters(builder: &mut QueryBuilder<'_, Postgres>, role: Option<Role>, search: Option<&str>) {
    if let Some(role) = role {
        builder.push(" AND role = ").push_bind(role);
    }
    if let Some(search) = search {
        let pattern = like_pattern(search);
        builder
            .push(" AND (name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR email ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
}

impl UserStore for UserRepository {
    async fn insert_user(&self, user: &User) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO users (id, name, email, password_hash, role, phone, bio, last_login, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(user.id)
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.role)
        .bind(&user.phone)
        .bind(&user.bio)
        .bind(user.last_login)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_unique_violation(e, ConflictReason::DuplicateEmail))?;

        Ok(())
    }

    async fn find_user(&self, id: Uuid) -> Result<Option<User>> {
        let sql = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let sql = format!("SELECT {} FROM users WHERE email = $1", USER_COLUMNS);
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    async fn list_users(
        &self,
        role: Option<Role>,
        search: Option<&str>,
        offset: u64,
        limit: u32,
    ) -> Result<(Vec<User>, u64)> {
        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM users WHERE TRUE");
        push_user_filters(&mut count, role, search);
        let total: i64 = count.build_query_scalar().fetch_one(&self.pool).await?;

        let mut select =
            QueryBuilder::<Postgres>::new(format!("SELECT {} FROM users WHERE TRUE", USER_COLUMNS));
        push_user_filters(&mut select, role, search);
        select
            .push(" ORDER BY created_at DESC, id ASC LIMIT ")
            .push_bind(i64::from(limit))
            .push(" OFFSET ")
            .push_bind(offset as i64);
        let users = select.build_query_as::<User>().fetch_all(&self.pool).await?;

        Ok((users, total.max(0) as u64))
    }

    async fn update_user(&self, user: &User) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET name = $2, email = $3, role = $4, phone = $5, bio = $6, updated_at = $7
            WHERE id = $1
            "#,
        )
        .bind(user.id)
        .bind(&user.name)
        .bind(&user.email)
        .bind(user.role)
        .bind(&user.phone)
        .bind(&user.bio)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_unique_violation(e, ConflictReason::DuplicateEmail))?;

        if result.rows_affected() == 0 {
            return Err(EventHubError::UserNotFound { user_id: user.id });
        }
        Ok(())
    }

    async fn record_login(&self, id: Uuid, at: DateTime<Utc>) -> Result<bool> {
        let result = sqlx::query("UPDATE users SET last_login = $2 WHERE id = $1")
            .bind(id)
            .bind(at)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn delete_user_if_idle(&self, id: Uuid) -> Result<bool> {
        let mut tx = self.pool.begin().await?;

        let locked: Option<Uuid> = sqlx::query_scalar("SELECT id FROM users WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;
        if locked.is_none() {
            return Ok(false);
        }

        let active_organized: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM events WHERE organizer_id = $1 AND status = 'active'",
        )
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;
        if active_organized > 0 {
            return Err(EventHubError::Conflict(ConflictReason::HasActiveEvents));
        }

        let pulled = sqlx::query(
            r#"
            UPDATE events
            SET participants = array_remove(participants, $1),
                version = version + 1,
                updated_at = NOW()
            WHERE $1 = ANY(participants)
            "#,
        )
        .bind(id)
        .execute(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        tracing::debug!(user_id = %id, rosters = pulled.rows_affected(), "User removed from rosters and deleted");
        Ok(true)
    }
}
