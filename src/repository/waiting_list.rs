//! Waiting list repository

use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{
        patterns::normalize_phone,
        waiting_list::{CreateWaitingListEntry, UpdateWaitingListEntry, WaitingListQuery},
        WaitingListEntry, WaitingStatus,
    },
};

#[derive(Clone)]
pub struct WaitingListRepository {
    pool: Pool<Postgres>,
}

impl WaitingListRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// List entries, oldest first so the queue order is preserved
    pub async fn list(&self, query: &WaitingListQuery) -> AppResult<Vec<WaitingListEntry>> {
        let rows = sqlx::query_as::<_, WaitingListEntry>(
            r#"
            SELECT * FROM waiting_list
            WHERE ($1::text IS NULL OR status = $1)
              AND ($2::text IS NULL OR barber = $2)
            ORDER BY created_at
            "#,
        )
        .bind(query.status)
        .bind(&query.barber)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn create(&self, data: &CreateWaitingListEntry) -> AppResult<WaitingListEntry> {
        let row = sqlx::query_as::<_, WaitingListEntry>(
            r#"
            INSERT INTO waiting_list (id, customer_name, phone, barber, desired_date, notes, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(data.customer_name.trim())
        .bind(data.phone.as_deref().map(normalize_phone))
        .bind(&data.barber)
        .bind(data.desired_date)
        .bind(&data.notes)
        .bind(WaitingStatus::Waiting)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn update(&self, id: Uuid, data: &UpdateWaitingListEntry) -> AppResult<WaitingListEntry> {
        sqlx::query_as::<_, WaitingListEntry>(
            r#"
            UPDATE waiting_list
            SET status = COALESCE($2, status),
                notes = COALESCE($3, notes),
                desired_date = COALESCE($4, desired_date),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(data.status)
        .bind(&data.notes)
        .bind(data.desired_date)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Waiting list entry {} not found", id)))
    }

    pub async fn delete(&self, id: Uuid) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM waiting_list WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Waiting list entry {} not found", id)));
        }
        Ok(())
    }
}
