//! Generation batches repository

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{types::Json, Pool, Postgres};
use uuid::Uuid;

use super::BatchStore;
use crate::{
    error::{AppError, AppResult},
    models::{
        generation_batch::{BatchQuery, GenerationBatchRow},
        GenerationBatch, GenerationTotals, SummaryRow,
    },
};

#[derive(Clone)]
pub struct BatchesRepository {
    pool: Pool<Postgres>,
}

impl BatchesRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BatchStore for BatchesRepository {
    async fn list_batches(&self, query: &BatchQuery) -> AppResult<(Vec<GenerationBatch>, i64)> {
        let page = query.page.unwrap_or(1).max(1);
        let per_page = query.per_page.unwrap_or(20).clamp(1, 200);
        let offset = (page - 1) * per_page;

        let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM generation_batches")
            .fetch_one(&self.pool)
            .await?;

        let rows = sqlx::query_as::<_, GenerationBatchRow>(
            "SELECT * FROM generation_batches ORDER BY created_at DESC LIMIT $1 OFFSET $2",
        )
        .bind(per_page)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok((rows.into_iter().map(GenerationBatch::from).collect(), total))
    }

    async fn insert_batch(&self, batch: &GenerationBatch) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO generation_batches (
                id, initiated_by, range_from, range_to, totals,
                touched_customer_ids, appointment_ids, summary, dry_run, created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(batch.id)
        .bind(&batch.initiated_by)
        .bind(batch.range.from)
        .bind(batch.range.to)
        .bind(Json(&batch.totals))
        .bind(&batch.touched_customer_ids)
        .bind(&batch.appointment_ids)
        .bind(Json(&batch.summary))
        .bind(batch.dry_run)
        .bind(batch.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn update_batch_results(
        &self,
        id: Uuid,
        totals: &GenerationTotals,
        summary: &[SummaryRow],
    ) -> AppResult<()> {
        let result = sqlx::query(
            "UPDATE generation_batches SET totals = $2, summary = $3 WHERE id = $1",
        )
        .bind(id)
        .bind(Json(totals))
        .bind(Json(summary))
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Batch {} not found", id)));
        }
        Ok(())
    }

    async fn get_batch(&self, id: Uuid) -> AppResult<GenerationBatch> {
        sqlx::query_as::<_, GenerationBatchRow>("SELECT * FROM generation_batches WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(GenerationBatch::from)
            .ok_or_else(|| AppError::NotFound(format!("Batch {} not found", id)))
    }

    async fn mark_undone(&self, id: Uuid, at: DateTime<Utc>, reason: Option<&str>) -> AppResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE generation_batches
            SET undone_at = $2, undo_reason = $3
            WHERE id = $1 AND undone_at IS NULL AND NOT dry_run
            "#,
        )
        .bind(id)
        .bind(at)
        .bind(reason)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }
}
