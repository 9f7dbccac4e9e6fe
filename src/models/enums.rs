//! Shared domain enums stored as text columns

use serde::{Deserialize, Serialize};
use sqlx::{Decode, Encode, Postgres};
use utoipa::ToSchema;

/// Implements `as_str`, `Display`, `FromStr` and the SQLx text conversions
/// for a fieldless enum whose variants map one-to-one to string slugs.
macro_rules! text_enum {
    ($name:ident { $($variant:ident => $slug:literal),+ $(,)? }) => {
        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $slug,)+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($slug => Ok($name::$variant),)+
                    _ => Err(format!("Invalid {} value: {}", stringify!($name), s)),
                }
            }
        }

        impl sqlx::Type<Postgres> for $name {
            fn type_info() -> sqlx::postgres::PgTypeInfo {
                <String as sqlx::Type<Postgres>>::type_info()
            }

            fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
                <String as sqlx::Type<Postgres>>::compatible(ty)
            }
        }

        impl<'r> Decode<'r, Postgres> for $name {
            fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
                let s: String = Decode::<Postgres>::decode(value)?;
                s.parse().map_err(|e: String| e.into())
            }
        }

        impl Encode<'_, Postgres> for $name {
            fn encode_by_ref(&self, buf: &mut sqlx::postgres::PgArgumentBuffer) -> sqlx::encode::IsNull {
                <&str as Encode<Postgres>>::encode(self.as_str(), buf)
            }
        }
    };
}

// ---------------------------------------------------------------------------
// EventKind
// ---------------------------------------------------------------------------

/// Kind of block occupying a barber's calendar
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Appointment,
    Break,
    Lock,
}

text_enum!(EventKind {
    Appointment => "appointment",
    Break => "break",
    Lock => "lock",
});

impl EventKind {
    /// Kinds that block a slot for new appointments
    pub const BLOCKING: [EventKind; 3] = [EventKind::Appointment, EventKind::Lock, EventKind::Break];
}

// ---------------------------------------------------------------------------
// AppointmentStatus
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum AppointmentStatus {
    Confirmed,
}

text_enum!(AppointmentStatus {
    Confirmed => "confirmed",
});

// ---------------------------------------------------------------------------
// OccurrenceStatus
// ---------------------------------------------------------------------------

/// Outcome of one generated occurrence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum OccurrenceStatus {
    /// Created at the planned (or overridden) time
    Inserted,
    /// Created at a shifted time
    Moved,
    /// Not created (manual skip, conflict or persistence failure)
    Skipped,
    /// Already materialized by an earlier run
    Existing,
}

text_enum!(OccurrenceStatus {
    Inserted => "inserted",
    Moved => "moved",
    Skipped => "skipped",
    Existing => "existing",
});

// ---------------------------------------------------------------------------
// SmsStatus
// ---------------------------------------------------------------------------

/// Delivery outcome of a confirmation message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "kebab-case")]
pub enum SmsStatus {
    /// No message concerns this row (nothing created, or dry run)
    None,
    Sent,
    Failed,
    MissingPhone,
    Disabled,
}

text_enum!(SmsStatus {
    None => "none",
    Sent => "sent",
    Failed => "failed",
    MissingPhone => "missing-phone",
    Disabled => "disabled",
});

// ---------------------------------------------------------------------------
// WaitingStatus
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum WaitingStatus {
    Waiting,
    Contacted,
    Booked,
    Cancelled,
}

text_enum!(WaitingStatus {
    Waiting => "waiting",
    Contacted => "contacted",
    Booked => "booked",
    Cancelled => "cancelled",
});

// ---------------------------------------------------------------------------
// StaffRole
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum StaffRole {
    Admin,
    Manager,
    Barber,
}

text_enum!(StaffRole {
    Admin => "admin",
    Manager => "manager",
    Barber => "barber",
});
