//! Auto customer model (recurring booking templates)

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{types::Json, FromRow};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use super::patterns::{PHONE_RE, TIME_OF_DAY_RE};

/// Cadences a recurring booking may use, in weeks
pub const ALLOWED_CADENCES: [i16; 5] = [1, 2, 3, 4, 5];

/// Replaces one planned occurrence, keyed by its original start
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate, ToSchema)]
pub struct OccurrenceOverride {
    pub original_start: DateTime<Utc>,
    pub override_start: DateTime<Utc>,
    #[validate(range(min = 5, max = 600, message = "Duration must be between 5 and 600 minutes"))]
    pub duration_min: Option<i32>,
    pub barber: Option<String>,
}

/// Recurring booking template
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AutoCustomer {
    pub id: Uuid,
    pub name: String,
    pub phone: Option<String>,
    pub barber: String,
    /// Day of week (0=Sunday, 6=Saturday)
    pub weekday: i16,
    /// Local time of day (HH:mm)
    pub time_of_day: String,
    pub duration_min: i32,
    pub cadence_weeks: i16,
    pub active: bool,
    pub paused: bool,
    pub start_from: NaiveDate,
    pub until: Option<NaiveDate>,
    pub max_occurrences: Option<i32>,
    pub notes: Option<String>,
    /// Original planned starts that must not be booked
    pub skipped: Vec<DateTime<Utc>>,
    pub overrides: Vec<OccurrenceOverride>,
    pub last_pushed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AutoCustomer {
    pub fn time_of_day(&self) -> Option<NaiveTime> {
        if !TIME_OF_DAY_RE.is_match(&self.time_of_day) {
            return None;
        }
        NaiveTime::parse_from_str(&self.time_of_day, "%H:%M").ok()
    }
}

/// Database row for `auto_customers`
#[derive(Debug, Clone, FromRow)]
pub struct AutoCustomerRow {
    pub id: Uuid,
    pub name: String,
    pub phone: Option<String>,
    pub barber: String,
    pub weekday: i16,
    pub time_of_day: String,
    pub duration_min: i32,
    pub cadence_weeks: i16,
    pub active: bool,
    pub paused: bool,
    pub start_from: NaiveDate,
    pub until: Option<NaiveDate>,
    pub max_occurrences: Option<i32>,
    pub notes: Option<String>,
    pub skipped: Json<Vec<DateTime<Utc>>>,
    pub overrides: Json<Vec<OccurrenceOverride>>,
    pub last_pushed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<AutoCustomerRow> for AutoCustomer {
    fn from(row: AutoCustomerRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            phone: row.phone,
            barber: row.barber,
            weekday: row.weekday,
            time_of_day: row.time_of_day,
            duration_min: row.duration_min,
            cadence_weeks: row.cadence_weeks,
            active: row.active,
            paused: row.paused,
            start_from: row.start_from,
            until: row.until,
            max_occurrences: row.max_occurrences,
            notes: row.notes,
            skipped: row.skipped.0,
            overrides: row.overrides.0,
            last_pushed_at: row.last_pushed_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Create auto customer request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateAutoCustomer {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
    #[validate(regex(path = *PHONE_RE, message = "Invalid phone number"))]
    pub phone: Option<String>,
    #[validate(length(min = 1, message = "Barber is required"))]
    pub barber: String,
    /// Day of week (0=Sunday, 6=Saturday)
    #[validate(range(min = 0, max = 6, message = "Weekday must be between 0 and 6"))]
    pub weekday: i16,
    /// Time of day (HH:mm)
    #[validate(regex(path = *TIME_OF_DAY_RE, message = "Time of day must be HH:mm"))]
    pub time_of_day: String,
    /// Defaults to 40 minutes
    #[validate(range(min = 5, max = 600, message = "Duration must be between 5 and 600 minutes"))]
    pub duration_min: Option<i32>,
    /// Defaults to 1 week
    #[validate(range(min = 1, max = 5, message = "Cadence must be between 1 and 5 weeks"))]
    pub cadence_weeks: Option<i16>,
    pub active: Option<bool>,
    pub paused: Option<bool>,
    pub start_from: NaiveDate,
    pub until: Option<NaiveDate>,
    #[validate(range(min = 1, message = "Max occurrences must be positive"))]
    pub max_occurrences: Option<i32>,
    pub notes: Option<String>,
}

/// Update auto customer request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateAutoCustomer {
    #[validate(length(min = 1, message = "Name cannot be empty"))]
    pub name: Option<String>,
    #[validate(regex(path = *PHONE_RE, message = "Invalid phone number"))]
    pub phone: Option<String>,
    #[validate(length(min = 1, message = "Barber cannot be empty"))]
    pub barber: Option<String>,
    #[validate(range(min = 0, max = 6, message = "Weekday must be between 0 and 6"))]
    pub weekday: Option<i16>,
    #[validate(regex(path = *TIME_OF_DAY_RE, message = "Time of day must be HH:mm"))]
    pub time_of_day: Option<String>,
    #[validate(range(min = 5, max = 600, message = "Duration must be between 5 and 600 minutes"))]
    pub duration_min: Option<i32>,
    #[validate(range(min = 1, max = 5, message = "Cadence must be between 1 and 5 weeks"))]
    pub cadence_weeks: Option<i16>,
    pub active: Option<bool>,
    pub paused: Option<bool>,
    pub start_from: Option<NaiveDate>,
    /// Omit to keep, `null` to clear
    #[serde(default, with = "::serde_with::rust::double_option")]
    #[schema(value_type = Option<String>, format = Date)]
    pub until: Option<Option<NaiveDate>>,
    /// Omit to keep, `null` to clear
    #[serde(default, with = "::serde_with::rust::double_option")]
    #[schema(value_type = Option<i32>)]
    pub max_occurrences: Option<Option<i32>>,
    pub notes: Option<String>,
}

/// Skip (or un-skip) one planned occurrence
#[derive(Debug, Deserialize, ToSchema)]
pub struct SkipOccurrence {
    pub original_start: DateTime<Utc>,
}

/// Query parameters for auto customers
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct AutoCustomerQuery {
    pub barber: Option<String>,
    pub active: Option<bool>,
}
