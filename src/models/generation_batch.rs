//! Generation batch model (audit trail of recurring appointment runs)

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{types::Json, FromRow};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use super::enums::{OccurrenceStatus, SmsStatus};

/// Counters accumulated over a run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct GenerationTotals {
    pub attempted: u32,
    pub inserted: u32,
    pub moved: u32,
    pub skipped: u32,
    pub existing: u32,
    pub sms_sent: u32,
    pub sms_failed: u32,
    pub sms_skipped: u32,
}

impl GenerationTotals {
    pub fn record(&mut self, status: OccurrenceStatus) {
        self.attempted += 1;
        match status {
            OccurrenceStatus::Inserted => self.inserted += 1,
            OccurrenceStatus::Moved => self.moved += 1,
            OccurrenceStatus::Skipped => self.skipped += 1,
            OccurrenceStatus::Existing => self.existing += 1,
        }
    }
}

/// One generated occurrence and what became of it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct SummaryRow {
    pub auto_customer_id: Uuid,
    pub customer_name: String,
    pub barber: String,
    pub scheduled_for: DateTime<Utc>,
    pub status: OccurrenceStatus,
    /// Machine readable reason code (e.g. "conflict", "manual-skip")
    pub reason: String,
    pub shift_minutes: i64,
    pub sms_status: SmsStatus,
    pub sms_reason: Option<String>,
    pub sms_error: Option<String>,
    /// Event created (or found) for this occurrence
    pub appointment_id: Option<Uuid>,
}

/// Requested generation range (inclusive dates, shop local time)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct DateRange {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

/// Persisted generation batch
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct GenerationBatch {
    pub id: Uuid,
    pub initiated_by: String,
    pub range: DateRange,
    pub totals: GenerationTotals,
    pub touched_customer_ids: Vec<Uuid>,
    pub appointment_ids: Vec<Uuid>,
    pub summary: Vec<SummaryRow>,
    pub dry_run: bool,
    pub created_at: DateTime<Utc>,
    pub undone_at: Option<DateTime<Utc>>,
    pub undo_reason: Option<String>,
}

/// Database row for `generation_batches`
#[derive(Debug, Clone, FromRow)]
pub struct GenerationBatchRow {
    pub id: Uuid,
    pub initiated_by: String,
    pub range_from: NaiveDate,
    pub range_to: NaiveDate,
    pub totals: Json<GenerationTotals>,
    pub touched_customer_ids: Vec<Uuid>,
    pub appointment_ids: Vec<Uuid>,
    pub summary: Json<Vec<SummaryRow>>,
    pub dry_run: bool,
    pub created_at: DateTime<Utc>,
    pub undone_at: Option<DateTime<Utc>>,
    pub undo_reason: Option<String>,
}

impl From<GenerationBatchRow> for GenerationBatch {
    fn from(row: GenerationBatchRow) -> Self {
        Self {
            id: row.id,
            initiated_by: row.initiated_by,
            range: DateRange {
                from: row.range_from,
                to: row.range_to,
            },
            totals: row.totals.0,
            touched_customer_ids: row.touched_customer_ids,
            appointment_ids: row.appointment_ids,
            summary: row.summary.0,
            dry_run: row.dry_run,
            created_at: row.created_at,
            undone_at: row.undone_at,
            undo_reason: row.undo_reason,
        }
    }
}

/// Batch listing entry (without the per-occurrence summary)
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct GenerationBatchShort {
    pub id: Uuid,
    pub initiated_by: String,
    pub range: DateRange,
    pub totals: GenerationTotals,
    pub created_count: usize,
    pub created_at: DateTime<Utc>,
    pub undone_at: Option<DateTime<Utc>>,
}

impl From<GenerationBatch> for GenerationBatchShort {
    fn from(batch: GenerationBatch) -> Self {
        Self {
            id: batch.id,
            initiated_by: batch.initiated_by,
            range: batch.range,
            totals: batch.totals,
            created_count: batch.appointment_ids.len(),
            created_at: batch.created_at,
            undone_at: batch.undone_at,
        }
    }
}

/// Generation request
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct GenerateRequest {
    /// First day of the range (YYYY-MM-DD)
    pub from: NaiveDate,
    /// Last day of the range, inclusive (YYYY-MM-DD)
    pub to: NaiveDate,
    /// Preview only; nothing is written
    #[serde(default)]
    pub dry_run: bool,
    /// Restrict the run to these auto customers; all active ones otherwise
    pub auto_customer_ids: Option<Vec<Uuid>>,
}

/// Generation result
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct GenerateResponse {
    pub dry_run: bool,
    pub batch_id: Option<Uuid>,
    pub range: DateRange,
    pub totals: GenerationTotals,
    pub summary: Vec<SummaryRow>,
    pub created_count: usize,
    /// Set when the batch record was persisted
    pub saved_batch_id: Option<Uuid>,
}

/// Undo request
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UndoRequest {
    pub reason: Option<String>,
}

/// Undo result
#[derive(Debug, Serialize, ToSchema)]
pub struct UndoResponse {
    pub success: bool,
    pub message: String,
}

/// Query parameters for batch listing
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct BatchQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}
