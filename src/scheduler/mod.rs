//! Recurring appointment scheduling
//!
//! Pure building blocks of a generation run: the per-barber conflict
//! index, the cadence expansion of auto customers, the conflict resolver
//! and the batch recorder. I/O lives in `services::generation`.

pub mod batch;
pub mod index;
pub mod occurrences;
pub mod resolver;

pub use batch::{BatchRecorder, CreatedAppointment, SmsOutcome};
pub use index::{slot_conflicts, BusySlot, ScheduleIndex};
pub use occurrences::{Candidate, GenerationWindow, OccurrencePlan, PlanRejection, PlannedOccurrence};
pub use resolver::{conflict_reason, resolve, ExistingOccurrences, Resolution};
