//! Event repository implementation

use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::database::store::EventStore;
use crate::models::event::Event;
use crate::search::{EventFilter, EventQuery, SortOrder};
use crate::utils::errors::Result;
use crate::utils::helpers::like_pattern;

const EVENT_COLUMNS: &str = "id, title, description, event_date, end_date, address, city, state, \
     country, category_id, capacity, price, organizer_id, participants, tags, status, \
     approval_status, approved_by, approval_date, rejection_reason, version, created_at, updated_at";

#[derive(Debug, Clone)]
pub struct EventRepository {
    pool: PgPool,
}

impl EventRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch_where(&self, clause: &str, id: Uuid) -> Result<Vec<Event>> {
        let sql = format!(
            "SELECT {} FROM events WHERE {} ORDER BY event_date ASC, id ASC",
            EVENT_COLUMNS, clause
        );
        let events = sqlx::query_as::<_, Event>(&sql)
            .bind(id)
            .fetch_all(&self.pool)
            .await?;
        Ok(events)
    }
}

/// Render the filter conjunction after a `WHERE TRUE`
fn push_filters(builder: &mut QueryBuilder<'_, Postgres>, filters: &[EventFilter]) {
    for filter in filters {
        match filter {
            EventFilter::Text(q) => {
                builder
                    .push(" AND search_vector @@ plainto_tsquery('simple', ")
                    .push_bind(q.clone())
                    .push(")");
            }
            EventFilter::Keyword(keyword) => {
                let pattern = like_pattern(keyword);
                builder
                    .push(" AND (title ILIKE ")
                    .push_bind(pattern.clone())
                    .push(" OR description ILIKE ")
                    .push_bind(pattern)
                    .push(")");
            }
            EventFilter::Categories(ids) => {
                builder.push(" AND category_id = ANY(").push_bind(ids.clone()).push(")");
            }
            EventFilter::Status(status) => {
                builder.push(" AND status = ").push_bind(*status);
            }
            EventFilter::Approval(approval) => {
                builder.push(" AND approval_status = ").push_bind(*approval);
            }
            EventFilter::DateRange { from, to } => {
                if let Some(from) = from {
                    builder.push(" AND event_date >= ").push_bind(*from);
                }
                if let Some(to) = to {
                    builder.push(" AND event_date <= ").push_bind(*to);
                }
            }
            EventFilter::AnyLocation(needle) => {
                let pattern = like_pattern(needle);
                builder
                    .push(" AND (city ILIKE ")
                    .push_bind(pattern.clone())
                    .push(" OR state ILIKE ")
                    .push_bind(pattern.clone())
                    .push(" OR country ILIKE ")
                    .push_bind(pattern)
                    .push(")");
            }
            EventFilter::City(needle) => {
                builder.push(" AND city ILIKE ").push_bind(like_pattern(needle));
            }
            EventFilter::State(needle) => {
                builder.push(" AND state ILIKE ").push_bind(like_pattern(needle));
            }
            EventFilter::Country(needle) => {
                builder.push(" AND country ILIKE ").push_bind(like_pattern(needle));
            }
            EventFilter::PriceRange { min, max } => {
                if let Some(min) = min {
                    builder.push(" AND price >= ").push_bind(*min);
                }
                if let Some(max) = max {
                    builder.push(" AND price <= ").push_bind(*max);
                }
            }
            EventFilter::Free => {
                builder.push(" AND price = 0");
            }
            EventFilter::Tags(tags) => {
                builder.push(" AND tags && ").push_bind(tags.clone());
            }
            EventFilter::HasAvailability => {
                builder.push(" AND cardinality(participants) < capacity");
            }
        }
    }
}

fn push_order(builder: &mut QueryBuilder<'_, Postgres>, query: &EventQuery) {
    match (query.sort, query.text()) {
        (SortOrder::Relevance, Some(q)) => {
            builder
                .push(" ORDER BY ts_rank(search_vector, plainto_tsquery('simple', ")
                .push_bind(q.to_string())
                .push(")) DESC, event_date ASC");
        }
        (SortOrder::Relevance | SortOrder::DateAsc, _) => {
            builder.push(" ORDER BY event_date ASC");
        }
        (SortOrder::DateDesc, _) => {
            builder.push(" ORDER BY event_date DESC");
        }
        (SortOrder::PriceAsc, _) => {
            builder.push(" ORDER BY price ASC");
        }
        (SortOrder::PriceDesc, _) => {
            builder.push(" ORDER BY price DESC");
        }
        (SortOrder::Recent, _) => {
            builder.push(" ORDER BY created_at DESC");
        }
    }
    builder.push(", id ASC");
}

impl EventStore for EventRepository {
    async fn insert_event(&self, event: &Event) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO events (id, title, description, event_date, end_date, address, city, state, country,
                                category_id, capacity, price, organizer_id, participants, tags, status,
                                approval_status, approved_by, approval_date, rejection_reason, version,
                                created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19, $20, $21, $22, $23)
            "#,
        )
        .bind(event.id)
        .bind(&event.title)
        .bind(&event.description)
        .bind(event.date)
        .bind(event.end_date)
        .bind(&event.location.address)
        .bind(&event.location.city)
        .bind(&event.location.state)
        .bind(&event.location.country)
        .bind(event.category_id)
        .bind(event.capacity)
        .bind(event.price)
        .bind(event.organizer_id)
        .bind(&event.participants)
        .bind(&event.tags)
        .bind(event.status)
        .bind(event.approval_status)
        .bind(event.approved_by)
        .bind(event.approval_date)
        .bind(&event.rejection_reason)
        .bind(event.version)
        .bind(event.created_at)
        .bind(event.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_event(&self, id: Uuid) -> Result<Option<Event>> {
        let sql = format!("SELECT {} FROM events WHERE id = $1", EVENT_COLUMNS);
        let event = sqlx::query_as::<_, Event>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(event)
    }

    async fn update_event(&self, event: &Event, expected_version: i64) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE events
            SET title = $3,
                description = $4,
                event_date = $5,
                end_date = $6,
                address = $7,
                city = $8,
                state = $9,
                country = $10,
                category_id = $11,
                capacity = $12,
                price = $13,
                tags = $14,
                status = $15,
                approval_status = $16,
                approved_by = $17,
                approval_date = $18,
                rejection_reason = $19,
                updated_at = $20,
                version = version + 1
            WHERE id = $1 AND version = $2 AND cardinality(participants) <= $12
            "#,
        )
        .bind(event.id)
        .bind(expected_version)
        .bind(&event.title)
        .bind(&event.description)
        .bind(event.date)
        .bind(event.end_date)
        .bind(&event.location.address)
        .bind(&event.location.city)
        .bind(&event.location.state)
        .bind(&event.location.country)
        .bind(event.category_id)
        .bind(event.capacity)
        .bind(event.price)
        .bind(&event.tags)
        .bind(event.status)
        .bind(event.approval_status)
        .bind(event.approved_by)
        .bind(event.approval_date)
        .bind(&event.rejection_reason)
        .bind(event.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn add_participant(&self, event_id: Uuid, user_id: Uuid) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE events
            SET participants = array_append(participants, $2),
                version = version + 1,
                updated_at = NOW()
            WHERE id = $1
              AND status = 'active'
              AND approval_status = 'approved'
              AND NOT ($2 = ANY(participants))
              AND cardinality(participants) < capacity
            "#,
        )
        .bind(event_id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn remove_participant(&self, event_id: Uuid, user_id: Uuid) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE events
            SET participants = array_remove(participants, $2),
                version = version + 1,
                updated_at = NOW()
            WHERE id = $1 AND $2 = ANY(participants)
            "#,
        )
        .bind(event_id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn delete_event_if_empty(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM events WHERE id = $1 AND cardinality(participants) = 0")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn search_events(&self, query: &EventQuery) -> Result<(Vec<Event>, u64)> {
        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM events WHERE TRUE");
        push_filters(&mut count, &query.filters);
        let total: i64 = count.build_query_scalar().fetch_one(&self.pool).await?;

        let mut select =
            QueryBuilder::<Postgres>::new(format!("SELECT {} FROM events WHERE TRUE", EVENT_COLUMNS));
        push_filters(&mut select, &query.filters);
        push_order(&mut select, query);
        select
            .push(" LIMIT ")
            .push_bind(i64::from(query.limit))
            .push(" OFFSET ")
            .push_bind(query.offset() as i64);

        let events = select.build_query_as::<Event>().fetch_all(&self.pool).await?;

        tracing::debug!(total, returned = events.len(), "Event search executed");
        Ok((events, total.max(0) as u64))
    }

    async fn pending_events(&self) -> Result<Vec<Event>> {
        let sql = format!(
            "SELECT {} FROM events WHERE approval_status = 'pending' ORDER BY created_at DESC, id ASC",
            EVENT_COLUMNS
        );
        let events = sqlx::query_as::<_, Event>(&sql)
            .fetch_all(&self.pool)
            .await?;

        Ok(events)
    }

    async fn events_in_category(&self, category_id: Uuid) -> Result<Vec<Event>> {
        self.fetch_where("category_id = $1", category_id).await
    }

    async fn events_organized_by(&self, user_id: Uuid) -> Result<Vec<Event>> {
        self.fetch_where("organizer_id = $1", user_id).await
    }

    async fn events_participated_by(&self, user_id: Uuid) -> Result<Vec<Event>> {
        self.fetch_where("$1 = ANY(participants)", user_id).await
    }

    async fn finish_past_events(&self, now: DateTime<Utc>) -> Result<u64> {
        let result = sqlx::query(
            r#"
            UPDATE events
            SET status = 'finished', version = version + 1, updated_at = $1
            WHERE status = 'active' AND COALESCE(end_date, event_date) < $1
            "#,
        )
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}
