//! Per-barber conflict index built from existing calendar events

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};

use crate::models::{CalendarEvent, EventKind};

/// Time a barber is already busy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BusySlot {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub kind: EventKind,
}

/// True when `[start, start + duration)` overlaps any slot.
///
/// `slots` must be ordered by start.
pub fn slot_conflicts(slots: &[BusySlot], start: DateTime<Utc>, duration_min: i64) -> bool {
    let end = start + Duration::minutes(duration_min);
    // Slots starting at or after `end` cannot overlap
    let candidates = slots.partition_point(|slot| slot.start < end);
    slots[..candidates].iter().any(|slot| start < slot.end)
}

/// Busy slots grouped by barber, each list ordered by start
#[derive(Debug, Default, Clone)]
pub struct ScheduleIndex {
    by_barber: HashMap<String, Vec<BusySlot>>,
}

impl ScheduleIndex {
    /// Index every blocking event; other kinds are ignored
    pub fn build<'a>(events: impl IntoIterator<Item = &'a CalendarEvent>) -> Self {
        let mut index = Self::default();
        for event in events {
            index.add_event(
                &event.barber,
                event.start,
                (event.end - event.start).num_minutes(),
                event.kind,
            );
        }
        index
    }

    /// Register a slot so later lookups in the same run see it
    pub fn add_event(&mut self, barber: &str, start: DateTime<Utc>, duration_min: i64, kind: EventKind) {
        if !EventKind::BLOCKING.contains(&kind) {
            return;
        }
        let slot = BusySlot {
            start,
            end: start + Duration::minutes(duration_min),
            kind,
        };
        let slots = self.by_barber.entry(barber.to_string()).or_default();
        let pos = slots.partition_point(|s| s.start <= slot.start);
        slots.insert(pos, slot);
    }

    pub fn slots(&self, barber: &str) -> &[BusySlot] {
        self.by_barber.get(barber).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn conflicts(&self, barber: &str, start: DateTime<Utc>, duration_min: i64) -> bool {
        slot_conflicts(self.slots(barber), start, duration_min)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, h, m, 0).unwrap()
    }

    #[test]
    fn test_overlap_is_half_open() {
        let mut index = ScheduleIndex::default();
        index.add_event("alex", at(9, 0), 40, EventKind::Appointment);

        assert!(index.conflicts("alex", at(9, 0), 40));
        assert!(index.conflicts("alex", at(8, 30), 31));
        assert!(index.conflicts("alex", at(9, 39), 10));
        // Touching edges do not overlap
        assert!(!index.conflicts("alex", at(9, 40), 40));
        assert!(!index.conflicts("alex", at(8, 20), 40));
        // Other barbers are independent
        assert!(!index.conflicts("sam", at(9, 0), 40));
    }

    #[test]
    fn test_long_slot_before_short_ones_still_conflicts() {
        let mut index = ScheduleIndex::default();
        index.add_event("alex", at(8, 0), 240, EventKind::Lock);
        index.add_event("alex", at(9, 0), 10, EventKind::Break);
        index.add_event("alex", at(13, 0), 30, EventKind::Appointment);

        assert!(index.conflicts("alex", at(11, 0), 30));
        assert!(!index.conflicts("alex", at(12, 0), 60));
        let starts: Vec<_> = index.slots("alex").iter().map(|s| s.start).collect();
        assert_eq!(starts, vec![at(8, 0), at(9, 0), at(13, 0)]);
    }
}
