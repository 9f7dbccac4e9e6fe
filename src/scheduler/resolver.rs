//! Conflict resolution for generated occurrences

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::{index::ScheduleIndex, occurrences::Candidate};
use crate::models::{CalendarEvent, EventKind};

/// Auto-generated appointments already on the calendar, keyed by
/// customer and start epoch
#[derive(Debug, Default, Clone)]
pub struct ExistingOccurrences {
    keys: HashMap<(Uuid, i64), Uuid>,
}

impl ExistingOccurrences {
    pub fn build<'a>(events: impl IntoIterator<Item = &'a CalendarEvent>) -> Self {
        let mut existing = Self::default();
        for event in events {
            if event.kind != EventKind::Appointment {
                continue;
            }
            if let Some(customer_id) = event.origin.source_customer_id() {
                existing.insert(customer_id, event.start, event.id);
            }
        }
        existing
    }

    pub fn insert(&mut self, customer_id: Uuid, start: DateTime<Utc>, event_id: Uuid) {
        self.keys.insert((customer_id, start.timestamp()), event_id);
    }

    pub fn get(&self, customer_id: Uuid, start: DateTime<Utc>) -> Option<Uuid> {
        self.keys.get(&(customer_id, start.timestamp())).copied()
    }
}

/// Decision for one candidate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// The occurrence was materialized by an earlier run
    Existing {
        start: DateTime<Utc>,
        shift_minutes: i64,
        event_id: Uuid,
    },
    /// Free slot found
    Accept {
        start: DateTime<Utc>,
        shift_minutes: i64,
    },
    /// Every allowed shift is taken
    Conflict,
}

/// Conflict reason recorded for a candidate no shift could place
pub fn conflict_reason(candidate: &Candidate) -> &'static str {
    if candidate.override_applied {
        "override-conflict"
    } else {
        "conflict"
    }
}

/// Pick the first usable start for `candidate`.
///
/// Idempotency is checked across all allowed starts before any conflict
/// test: an earlier run may have placed the occurrence at a shifted time
/// that is the only one now blocked (by that very appointment).
pub fn resolve(
    candidate: &Candidate,
    customer_id: Uuid,
    index: &ScheduleIndex,
    existing: &ExistingOccurrences,
) -> Resolution {
    for (shift_minutes, start) in candidate.starts() {
        if let Some(event_id) = existing.get(customer_id, start) {
            return Resolution::Existing {
                start,
                shift_minutes,
                event_id,
            };
        }
    }

    candidate
        .starts()
        .find(|(_, start)| !index.conflicts(&candidate.barber, *start, candidate.duration_min))
        .map(|(shift_minutes, start)| Resolution::Accept { start, shift_minutes })
        .unwrap_or(Resolution::Conflict)
}
