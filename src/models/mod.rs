//! Data models for the barbershop server

pub mod auto_customer;
pub mod calendar_event;
pub mod customer;
pub mod enums;
pub mod generation_batch;
pub mod patterns;
pub mod staff;
pub mod waiting_list;

// Re-export commonly used types
pub use auto_customer::{AutoCustomer, OccurrenceOverride};
pub use calendar_event::{CalendarEvent, EventFilter, EventOrigin, NewCalendarEvent};
pub use customer::{Customer, CustomerNote};
pub use enums::{AppointmentStatus, EventKind, OccurrenceStatus, SmsStatus, StaffRole, WaitingStatus};
pub use generation_batch::{GenerationBatch, GenerationTotals, SummaryRow};
pub use staff::StaffClaims;
pub use waiting_list::WaitingListEntry;
