//! Calendar events repository

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{types::Json, Pool, Postgres};
use uuid::Uuid;

use super::CalendarStore;
use crate::{
    error::{AppError, AppResult},
    models::{
        calendar_event::{CalendarEventRow, NotificationAttempt},
        CalendarEvent, EventFilter, EventKind, NewCalendarEvent,
    },
};

const UNIQUE_VIOLATION: &str = "23505";

#[derive(Clone)]
pub struct CalendarRepository {
    pool: Pool<Postgres>,
}

impl CalendarRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get event by ID
    pub async fn get_by_id(&self, id: Uuid) -> AppResult<CalendarEvent> {
        sqlx::query_as::<_, CalendarEventRow>("SELECT * FROM calendar_events WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(CalendarEvent::from)
            .ok_or_else(|| AppError::NotFound(format!("Event {} not found", id)))
    }

    /// Move or resize an event; `end_at` is derived from start and duration
    pub async fn reschedule(
        &self,
        id: Uuid,
        barber: &str,
        start: DateTime<Utc>,
        duration_min: i32,
        end: DateTime<Utc>,
        lock_reason: Option<&str>,
    ) -> AppResult<CalendarEvent> {
        sqlx::query_as::<_, CalendarEventRow>(
            r#"
            UPDATE calendar_events
            SET barber = $2, start_at = $3, duration_min = $4, end_at = $5,
                lock_reason = $6, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(barber)
        .bind(start)
        .bind(duration_min)
        .bind(end)
        .bind(lock_reason)
        .fetch_optional(&self.pool)
        .await?
        .map(CalendarEvent::from)
        .ok_or_else(|| AppError::NotFound(format!("Event {} not found", id)))
    }

    /// Delete a single event (cancellation)
    pub async fn delete(&self, id: Uuid) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM calendar_events WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Event {} not found", id)));
        }
        Ok(())
    }
}

#[async_trait]
impl CalendarStore for CalendarRepository {
    async fn find_events(&self, filter: &EventFilter) -> AppResult<Vec<CalendarEvent>> {
        let kinds: Vec<String> = filter.kind_in.iter().map(EventKind::to_string).collect();

        let rows = sqlx::query_as::<_, CalendarEventRow>(
            r#"
            SELECT * FROM calendar_events
            WHERE start_at < $2 AND end_at > $1
              AND kind = ANY($3)
              AND ($4::text[] IS NULL OR barber = ANY($4))
            ORDER BY start_at
            "#,
        )
        .bind(filter.from)
        .bind(filter.to)
        .bind(&kinds)
        .bind(filter.barber_in.as_deref())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(CalendarEvent::from).collect())
    }

    async fn create_event(&self, event: &NewCalendarEvent) -> AppResult<CalendarEvent> {
        let row = sqlx::query_as::<_, CalendarEventRow>(
            r#"
            INSERT INTO calendar_events (
                id, barber, kind, start_at, duration_min, end_at, status,
                origin, source_customer_id, batch_id,
                customer_id, customer_name, customer_phone,
                lock_reason, generation
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&event.barber)
        .bind(event.kind)
        .bind(event.start)
        .bind(event.duration_min)
        .bind(event.end())
        .bind(event.status)
        .bind(event.origin.as_str())
        .bind(event.origin.source_customer_id())
        .bind(event.origin.batch_id())
        .bind(event.customer_id)
        .bind(&event.customer_name)
        .bind(&event.customer_phone)
        .bind(&event.lock_reason)
        .bind(event.generation.clone().map(Json))
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.code().as_deref() == Some(UNIQUE_VIOLATION) => {
                AppError::Conflict("Occurrence already generated for this customer".to_string())
            }
            _ => AppError::Database(e),
        })?;

        Ok(row.into())
    }

    async fn delete_events(&self, ids: &[Uuid]) -> AppResult<u64> {
        if ids.is_empty() {
            return Ok(0);
        }
        let result = sqlx::query("DELETE FROM calendar_events WHERE id = ANY($1)")
            .bind(ids)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn append_notification(&self, ids: &[Uuid], attempt: &NotificationAttempt) -> AppResult<()> {
        sqlx::query(
            r#"
            UPDATE calendar_events
            SET notifications = notifications || $2::jsonb, updated_at = NOW()
            WHERE id = ANY($1)
            "#,
        )
        .bind(ids)
        .bind(Json(vec![attempt]))
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
