//! Waiting list model

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use super::{enums::WaitingStatus, patterns::PHONE_RE};

/// Customer waiting for a free slot
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct WaitingListEntry {
    pub id: Uuid,
    pub customer_name: String,
    pub phone: Option<String>,
    pub barber: Option<String>,
    pub desired_date: Option<NaiveDate>,
    pub notes: Option<String>,
    pub status: WaitingStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Create waiting list entry request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateWaitingListEntry {
    #[validate(length(min = 1, message = "Customer name is required"))]
    pub customer_name: String,
    #[validate(regex(path = *PHONE_RE, message = "Invalid phone number"))]
    pub phone: Option<String>,
    pub barber: Option<String>,
    /// Desired date (YYYY-MM-DD)
    pub desired_date: Option<NaiveDate>,
    pub notes: Option<String>,
}

/// Update waiting list entry request
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateWaitingListEntry {
    pub status: Option<WaitingStatus>,
    pub notes: Option<String>,
    pub desired_date: Option<NaiveDate>,
}

/// Query parameters for the waiting list
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct WaitingListQuery {
    pub status: Option<WaitingStatus>,
    pub barber: Option<String>,
}
