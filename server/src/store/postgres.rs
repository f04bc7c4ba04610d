use async_trait::async_trait;
use chrono::{DateTime, Utc};
use civic_core::{Event, EventId, EventUpdate, NewEvent};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use super::EventStore;
use crate::utils::error::AppError;

const SELECT_EVENT: &str = "SELECT id, title, description, event_type, thumbnail_url, location, \
     event_date, members, created_by, created_at FROM events";

#[derive(Debug, FromRow)]
struct EventRow {
    id: Uuid,
    title: String,
    description: String,
    event_type: String,
    thumbnail_url: String,
    location: String,
    event_date: DateTime<Utc>,
    members: Vec<String>,
    created_by: String,
    created_at: DateTime<Utc>,
}

impl From<EventRow> for Event {
    fn from(row: EventRow) -> Self {
        Event {
            id: row.id.into(),
            title: row.title,
            description: row.description,
            kind: row.event_type,
            thumbnail_url: row.thumbnail_url,
            location: row.location,
            event_date: row.event_date,
            members: row.members,
            created_by: row.created_by,
            created_at: row.created_at,
        }
    }
}

/// Events table in PostgreSQL. Members live in a `TEXT[]` column.
#[derive(Clone)]
pub struct PgEventStore {
    pool: PgPool,
}

impl PgEventStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EventStore for PgEventStore {
    async fn list_events(&self) -> Result<Vec<Event>, AppError> {
        let rows = sqlx::query_as::<_, EventRow>(SELECT_EVENT)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(Event::from).collect())
    }

    async fn get_event(&self, id: EventId) -> Result<Event, AppError> {
        let query = format!("{SELECT_EVENT} WHERE id = $1");
        sqlx::query_as::<_, EventRow>(&query)
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?
            .map(Event::from)
            .ok_or_else(|| AppError::event_not_found(id))
    }

    async fn create_event(&self, fields: NewEvent) -> Result<Event, AppError> {
        let event = fields.into_event(EventId::new(), Utc::now())?;

        sqlx::query(
            "INSERT INTO events (id, title, description, event_type, thumbnail_url, location, \
             event_date, members, created_by, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
        )
        .bind(event.id.as_uuid())
        .bind(&event.title)
        .bind(&event.description)
        .bind(&event.kind)
        .bind(&event.thumbnail_url)
        .bind(&event.location)
        .bind(event.event_date)
        .bind(&event.members)
        .bind(&event.created_by)
        .bind(event.created_at)
        .execute(&self.pool)
        .await?;

        tracing::debug!(event_id = %event.id, "Inserted event");
        Ok(event)
    }

    async fn add_member(&self, id: EventId, email: &str) -> Result<bool, AppError> {
        // The UPDATE takes the row lock before evaluating the CASE, so two
        // concurrent joins with the same email see each other's write.
        let appended = sqlx::query_scalar::<_, bool>(
            "UPDATE events e \
             SET members = CASE WHEN $2 = ANY(e.members) THEN e.members \
                                ELSE array_append(e.members, $2) END \
             FROM (SELECT id, $2 = ANY(members) AS present FROM events WHERE id = $1 FOR UPDATE) t \
             WHERE e.id = t.id \
             RETURNING NOT t.present",
        )
        .bind(id.as_uuid())
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        appended.ok_or_else(|| AppError::event_not_found(id))
    }

    async fn replace_event(&self, id: EventId, fields: EventUpdate) -> Result<(), AppError> {
        let result = sqlx::query(
            "UPDATE events SET title = $2, description = $3, event_type = $4, \
             thumbnail_url = $5, location = $6, event_date = $7, members = $8, created_by = $9 \
             WHERE id = $1",
        )
        .bind(id.as_uuid())
        .bind(fields.title)
        .bind(fields.description)
        .bind(fields.kind)
        .bind(fields.thumbnail_url)
        .bind(fields.location)
        .bind(fields.event_date)
        .bind(fields.members)
        .bind(fields.created_by)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::event_not_found(id));
        }
        Ok(())
    }

    async fn delete_event(&self, id: EventId) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM events WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::event_not_found(id));
        }
        Ok(())
    }
}
