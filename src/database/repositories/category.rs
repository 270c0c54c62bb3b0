//! Category repository implementation

use sqlx::PgPool;
use uuid::Uuid;

use super::map_unique_violation;
use crate::database::store::CategoryStore;
use crate::models::category::{Category, CategoryDeletion};
use crate::utils::errors::{ConflictReason, EventHubError, Result};

const CATEGORY_COLUMNS: &str = "id, name, description, active, created_at, updated_at";

#[derive(Debug, Clone)]
pub struct CategoryRepository {
    pool: PgPool,
}

impl CategoryRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl CategoryStore for CategoryRepository {
    async fn insert_category(&self, category: &Category) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO categories (id, name, description, active, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(category.id)
        .bind(&category.name)
        .bind(&category.description)
        .bind(category.active)
        .bind(category.created_at)
        .bind(category.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_unique_violation(e, ConflictReason::DuplicateCategoryName))?;

        Ok(())
    }

    async fn find_category(&self, id: Uuid) -> Result<Option<Category>> {
        let sql = format!("SELECT {} FROM categories WHERE id = $1", CATEGORY_COLUMNS);
        let category = sqlx::query_as::<_, Category>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(category)
    }

    async fn find_category_by_name(&self, name: &str) -> Result<Option<Category>> {
        let sql = format!("SELECT {} FROM categories WHERE name = $1", CATEGORY_COLUMNS);
        let category = sqlx::query_as::<_, Category>(&sql)
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;

        Ok(category)
    }

    async fn list_categories(&self, include_inactive: bool) -> Result<Vec<Category>> {
        let sql = format!(
            "SELECT {} FROM categories WHERE active OR $1 ORDER BY name ASC",
            CATEGORY_COLUMNS
        );
        let categories = sqlx::query_as::<_, Category>(&sql)
            .bind(include_inactive)
            .fetch_all(&self.pool)
            .await?;

        Ok(categories)
    }

    async fn update_category(&self, category: &Category) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE categories
            SET name = $2, description = $3, active = $4, updated_at = $5
            WHERE id = $1
            "#,
        )
        .bind(category.id)
        .bind(&category.name)
        .bind(&category.description)
        .bind(category.active)
        .bind(category.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_unique_violation(e, ConflictReason::DuplicateCategoryName))?;

        if result.rows_affected() == 0 {
            return Err(EventHubError::CategoryNotFound {
                category_id: category.id,
            });
        }
        Ok(())
    }

    async fn delete_or_deactivate_category(&self, id: Uuid) -> Result<CategoryDeletion> {
        let mut tx = self.pool.begin().await?;

        let locked: Option<Uuid> =
            sqlx::query_scalar("SELECT id FROM categories WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;
        if locked.is_none() {
            return Err(EventHubError::CategoryNotFound { category_id: id });
        }

        let dependent: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM events WHERE category_id = $1")
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;

        let outcome = if dependent > 0 {
            sqlx::query("UPDATE categories SET active = FALSE, updated_at = NOW() WHERE id = $1")
                .bind(id)
                .execute(&mut *tx)
                .await?;
            CategoryDeletion::Deactivated {
                dependent_events: dependent as u64,
            }
        } else {
            sqlx::query("DELETE FROM categories WHERE id = $1")
                .bind(id)
                .execute(&mut *tx)
                .await?;
            CategoryDeletion::Deleted
        };

        tx.commit().await?;
        Ok(outcome)
    }
}
