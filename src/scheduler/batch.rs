//! Accumulates the outcome of a generation run

use chrono::{DateTime, Utc};
use indexmap::IndexSet;
use uuid::Uuid;

use crate::models::{
    generation_batch::{DateRange, GenerateResponse},
    AutoCustomer, GenerationBatch, GenerationTotals, OccurrenceStatus, SmsStatus, SummaryRow,
};

/// Appointment created by this run, pending notification
#[derive(Debug, Clone)]
pub struct CreatedAppointment {
    pub event_id: Uuid,
    pub customer_id: Uuid,
    pub customer_name: String,
    pub phone: Option<String>,
    pub barber: String,
    pub start: DateTime<Utc>,
    /// Position of the matching row in the summary
    pub row: usize,
}

/// Shared outcome of one consolidated message
#[derive(Debug, Clone)]
pub struct SmsOutcome {
    pub status: SmsStatus,
    pub reason: Option<String>,
    pub error: Option<String>,
}

#[derive(Debug)]
pub struct BatchRecorder {
    batch_id: Uuid,
    range: DateRange,
    dry_run: bool,
    totals: GenerationTotals,
    summary: Vec<SummaryRow>,
    created: Vec<CreatedAppointment>,
    touched: IndexSet<Uuid>,
}

impl BatchRecorder {
    pub fn new(batch_id: Uuid, range: DateRange, dry_run: bool) -> Self {
        Self {
            batch_id,
            range,
            dry_run,
            totals: GenerationTotals::default(),
            summary: Vec::new(),
            created: Vec::new(),
            touched: IndexSet::new(),
        }
    }

    pub fn batch_id(&self) -> Uuid {
        self.batch_id
    }

    pub fn totals(&self) -> &GenerationTotals {
        &self.totals
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    pub fn summary(&self) -> &[SummaryRow] {
        &self.summary
    }

    pub fn created(&self) -> &[CreatedAppointment] {
        &self.created
    }

    /// Customers with at least one occurrence materialized by this run
    pub fn touched(&self) -> Vec<Uuid> {
        self.touched.iter().copied().collect()
    }

    pub fn appointment_ids(&self) -> Vec<Uuid> {
        self.created.iter().map(|c| c.event_id).collect()
    }

    fn push(
        &mut self,
        customer: &AutoCustomer,
        barber: &str,
        at: DateTime<Utc>,
        status: OccurrenceStatus,
        reason: &str,
        shift_minutes: i64,
        appointment_id: Option<Uuid>,
    ) -> usize {
        self.totals.record(status);
        self.summary.push(SummaryRow {
            auto_customer_id: customer.id,
            customer_name: customer.name.clone(),
            barber: barber.to_string(),
            scheduled_for: at,
            status,
            reason: reason.to_string(),
            shift_minutes,
            sms_status: SmsStatus::None,
            sms_reason: if self.dry_run { Some("dry-run".to_string()) } else { None },
            sms_error: None,
            appointment_id,
        });
        self.summary.len() - 1
    }

    pub fn record_skipped(&mut self, customer: &AutoCustomer, barber: &str, at: DateTime<Utc>, reason: &str) {
        self.push(customer, barber, at, OccurrenceStatus::Skipped, reason, 0, None);
    }

    pub fn record_existing(
        &mut self,
        customer: &AutoCustomer,
        barber: &str,
        at: DateTime<Utc>,
        shift_minutes: i64,
        event_id: Uuid,
    ) {
        self.push(
            customer,
            barber,
            at,
            OccurrenceStatus::Existing,
            "already-generated",
            shift_minutes,
            Some(event_id),
        );
    }

    /// Record a placed occurrence; `event_id` is `None` on dry runs
    pub fn record_placed(
        &mut self,
        customer: &AutoCustomer,
        barber: &str,
        at: DateTime<Utc>,
        shift_minutes: i64,
        event_id: Option<Uuid>,
    ) -> OccurrenceStatus {
        let (status, reason) = if shift_minutes == 0 {
            (OccurrenceStatus::Inserted, "planned")
        } else {
            (OccurrenceStatus::Moved, "shifted")
        };
        let row = self.push(customer, barber, at, status, reason, shift_minutes, event_id);
        self.touched.insert(customer.id);

        if let Some(event_id) = event_id {
            self.created.push(CreatedAppointment {
                event_id,
                customer_id: customer.id,
                customer_name: customer.name.clone(),
                phone: customer.phone.clone(),
                barber: barber.to_string(),
                start: at,
                row,
            });
        }
        status
    }

    /// Apply a message outcome to the summary rows of `event_ids`
    pub fn record_sms(&mut self, event_ids: &[Uuid], outcome: &SmsOutcome) {
        match outcome.status {
            SmsStatus::Sent => self.totals.sms_sent += 1,
            SmsStatus::Failed => self.totals.sms_failed += 1,
            SmsStatus::MissingPhone | SmsStatus::Disabled => self.totals.sms_skipped += 1,
            SmsStatus::None => {}
        }
        for created in self.created.iter().filter(|c| event_ids.contains(&c.event_id)) {
            if let Some(row) = self.summary.get_mut(created.row) {
                row.sms_status = outcome.status;
                row.sms_reason = outcome.reason.clone();
                row.sms_error = outcome.error.clone();
            }
        }
    }

    /// Batch record for persistence
    pub fn to_batch(&self, initiated_by: &str, created_at: DateTime<Utc>) -> GenerationBatch {
        GenerationBatch {
            id: self.batch_id,
            initiated_by: initiated_by.to_string(),
            range: self.range,
            totals: self.totals.clone(),
            touched_customer_ids: self.touched(),
            appointment_ids: self.appointment_ids(),
            summary: self.summary.clone(),
            dry_run: self.dry_run,
            created_at,
            undone_at: None,
            undo_reason: None,
        }
    }

    pub fn into_response(self, saved_batch_id: Option<Uuid>) -> GenerateResponse {
        GenerateResponse {
            dry_run: self.dry_run,
            batch_id: if self.dry_run { None } else { Some(self.batch_id) },
            range: self.range,
            created_count: self.created.len(),
            totals: self.totals,
            summary: self.summary,
            saved_batch_id,
        }
    }
}
