//! Calendar event model (appointments, breaks, locks)

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{types::Json, FromRow};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use super::enums::{AppointmentStatus, EventKind, SmsStatus};

/// Default appointment length in minutes
pub const DEFAULT_DURATION_MIN: i32 = 40;

/// Where an event comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum EventOrigin {
    Manual,
    AutoCustomer {
        source_customer_id: Uuid,
        batch_id: Uuid,
    },
}

impl EventOrigin {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventOrigin::Manual => "manual",
            EventOrigin::AutoCustomer { .. } => "auto-customer",
        }
    }

    pub fn source_customer_id(&self) -> Option<Uuid> {
        match self {
            EventOrigin::Manual => None,
            EventOrigin::AutoCustomer { source_customer_id, .. } => Some(*source_customer_id),
        }
    }

    pub fn batch_id(&self) -> Option<Uuid> {
        match self {
            EventOrigin::Manual => None,
            EventOrigin::AutoCustomer { batch_id, .. } => Some(*batch_id),
        }
    }
}

/// How an auto-generated event was placed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct GenerationMeta {
    /// Start the cadence planned before shifting or overriding
    pub planned_start: DateTime<Utc>,
    pub shift_minutes: i64,
    pub override_applied: bool,
}

/// One attempt to notify the customer about an event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct NotificationAttempt {
    /// e.g. "confirmation"
    pub kind: String,
    pub sent_at: DateTime<Utc>,
    pub message_id: Option<String>,
    pub status: SmsStatus,
    pub retry_count: i32,
    pub error: Option<String>,
}

/// Calendar event
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CalendarEvent {
    pub id: Uuid,
    pub barber: String,
    pub kind: EventKind,
    pub start: DateTime<Utc>,
    pub duration_min: i32,
    /// Always `start + duration_min`
    pub end: DateTime<Utc>,
    /// Set for appointments only
    pub status: Option<AppointmentStatus>,
    pub origin: EventOrigin,
    pub customer_id: Option<Uuid>,
    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
    pub lock_reason: Option<String>,
    pub generation: Option<GenerationMeta>,
    pub notifications: Vec<NotificationAttempt>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Database row for `calendar_events`
#[derive(Debug, Clone, FromRow)]
pub struct CalendarEventRow {
    pub id: Uuid,
    pub barber: String,
    pub kind: EventKind,
    pub start_at: DateTime<Utc>,
    pub duration_min: i32,
    pub end_at: DateTime<Utc>,
    pub status: Option<AppointmentStatus>,
    pub origin: String,
    pub source_customer_id: Option<Uuid>,
    pub batch_id: Option<Uuid>,
    pub customer_id: Option<Uuid>,
    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
    pub lock_reason: Option<String>,
    pub generation: Option<Json<GenerationMeta>>,
    pub notifications: Json<Vec<NotificationAttempt>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<CalendarEventRow> for CalendarEvent {
    fn from(row: CalendarEventRow) -> Self {
        let origin = match (row.origin.as_str(), row.source_customer_id, row.batch_id) {
            ("auto-customer", Some(source_customer_id), Some(batch_id)) => {
                EventOrigin::AutoCustomer { source_customer_id, batch_id }
            }
            _ => EventOrigin::Manual,
        };

        Self {
            id: row.id,
            barber: row.barber,
            kind: row.kind,
            start: row.start_at,
            duration_min: row.duration_min,
            end: row.end_at,
            status: row.status,
            origin,
            customer_id: row.customer_id,
            customer_name: row.customer_name,
            customer_phone: row.customer_phone,
            lock_reason: row.lock_reason,
            generation: row.generation.map(|g| g.0),
            notifications: row.notifications.0,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Event about to be inserted; the store assigns id and timestamps
#[derive(Debug, Clone)]
pub struct NewCalendarEvent {
    pub barber: String,
    pub kind: EventKind,
    pub start: DateTime<Utc>,
    pub duration_min: i32,
    pub status: Option<AppointmentStatus>,
    pub origin: EventOrigin,
    pub customer_id: Option<Uuid>,
    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
    pub lock_reason: Option<String>,
    pub generation: Option<GenerationMeta>,
}

impl NewCalendarEvent {
    pub fn end(&self) -> DateTime<Utc> {
        self.start + Duration::minutes(self.duration_min as i64)
    }
}

/// Range query over the calendar
#[derive(Debug, Clone)]
pub struct EventFilter {
    /// Restrict to these barbers; `None` means all
    pub barber_in: Option<Vec<String>>,
    /// Events intersecting `[from, to)`
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
    pub kind_in: Vec<EventKind>,
}

impl EventFilter {
    pub fn matches(&self, event: &CalendarEvent) -> bool {
        event.start < self.to
            && event.end > self.from
            && self.kind_in.contains(&event.kind)
            && self
                .barber_in
                .as_ref()
                .map(|barbers| barbers.iter().any(|b| b == &event.barber))
                .unwrap_or(true)
    }
}

/// Book an appointment manually
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateAppointment {
    #[validate(length(min = 1, message = "Barber is required"))]
    pub barber: String,
    pub start: DateTime<Utc>,
    /// Defaults to 40 minutes
    #[validate(range(min = 5, max = 600, message = "Duration must be between 5 and 600 minutes"))]
    pub duration_min: Option<i32>,
    pub customer_id: Option<Uuid>,
    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
    /// Book even if the slot overlaps another event
    pub force: Option<bool>,
}

/// Block time for a break
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateBreak {
    #[validate(length(min = 1, message = "Barber is required"))]
    pub barber: String,
    pub start: DateTime<Utc>,
    #[validate(range(min = 5, max = 600, message = "Duration must be between 5 and 600 minutes"))]
    pub duration_min: i32,
}

/// Lock a range of a barber's calendar
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateLock {
    #[validate(length(min = 1, message = "Barber is required"))]
    pub barber: String,
    pub start: DateTime<Utc>,
    /// Explicit end; takes precedence over `duration_min`
    pub end: Option<DateTime<Utc>>,
    #[validate(range(min = 1, message = "Duration must be positive"))]
    pub duration_min: Option<i32>,
    pub reason: Option<String>,
}

/// Reschedule or resize an event
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateCalendarEvent {
    pub barber: Option<String>,
    pub start: Option<DateTime<Utc>>,
    /// Locks may run up to two weeks; other events up to 600 minutes
    #[validate(range(min = 1, message = "Duration must be positive"))]
    pub duration_min: Option<i32>,
    pub lock_reason: Option<String>,
    pub force: Option<bool>,
}

/// Query parameters for the calendar
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct CalendarQuery {
    /// Range start (RFC 3339)
    pub from: DateTime<Utc>,
    /// Range end (RFC 3339)
    pub to: DateTime<Utc>,
    pub barber: Option<String>,
    pub kind: Option<EventKind>,
}
