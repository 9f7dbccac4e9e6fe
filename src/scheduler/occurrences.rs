//! Expansion of auto customer cadences into concrete occurrences
//!
//! A customer's planned instants form an arithmetic sequence: the first
//! `weekday` on or after `start_from` at `time_of_day` (shop local time),
//! then every `cadence_weeks` weeks. Skips and overrides are keyed by the
//! planned instant truncated to the minute.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Datelike, Duration, FixedOffset, NaiveDate, NaiveTime, TimeZone, Utc};

use crate::models::{
    auto_customer::ALLOWED_CADENCES, generation_batch::DateRange, AutoCustomer, OccurrenceOverride,
};

/// Instant of a local wall-clock time in the shop's offset
pub fn local_instant(date: NaiveDate, time: NaiveTime, offset: FixedOffset) -> DateTime<Utc> {
    let local = date.and_time(time) - Duration::seconds(offset.local_minus_utc() as i64);
    Utc.from_utc_datetime(&local)
}

fn minute_key(instant: DateTime<Utc>) -> i64 {
    instant.timestamp().div_euclid(60)
}

/// Half-open generation window `[start, end)` derived from inclusive dates
#[derive(Debug, Clone, Copy)]
pub struct GenerationWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub offset: FixedOffset,
}

impl GenerationWindow {
    pub fn from_range(range: DateRange, offset: FixedOffset) -> Self {
        Self {
            start: local_instant(range.from, NaiveTime::MIN, offset),
            end: local_instant(range.to + Duration::days(1), NaiveTime::MIN, offset),
            offset,
        }
    }

    /// The window widened on both sides, used to load events that may overlap edges
    pub fn padded(&self, days: i64) -> (DateTime<Utc>, DateTime<Utc>) {
        (self.start - Duration::days(days), self.end + Duration::days(days))
    }

    /// Events a run must see: the padded window, stretched over every
    /// override that moves an occurrence of this window elsewhere
    pub fn snapshot_range(&self, days: i64, customers: &[AutoCustomer]) -> (DateTime<Utc>, DateTime<Utc>) {
        let (mut from, mut to) = self.padded(days);
        for customer in customers {
            for o in &customer.overrides {
                if o.original_start < self.start || o.original_start >= self.end {
                    continue;
                }
                let duration = o.duration_min.unwrap_or(customer.duration_min) as i64;
                from = from.min(o.override_start - Duration::days(days));
                to = to.max(o.override_start + Duration::minutes(duration) + Duration::days(days));
            }
        }
        (from, to)
    }
}

/// A bookable occurrence handed to the conflict resolver
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    /// Instant produced by the cadence, before any override
    pub planned_start: DateTime<Utc>,
    pub desired_start: DateTime<Utc>,
    pub barber: String,
    pub duration_min: i64,
    /// Minutes added to `desired_start`, tried in order
    pub shifts: Vec<i64>,
    pub override_applied: bool,
}

impl Candidate {
    pub fn starts(&self) -> impl Iterator<Item = (i64, DateTime<Utc>)> + '_ {
        self.shifts
            .iter()
            .map(move |shift| (*shift, self.desired_start + Duration::minutes(*shift)))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlannedOccurrence {
    /// Listed in the customer's skip set
    Skipped { planned_start: DateTime<Utc> },
    Candidate(Candidate),
}

/// Why a customer produced no plan
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanRejection {
    Inactive,
    Paused,
    InvalidTimeOfDay,
    InvalidWeekday,
    InvalidCadence,
}

impl PlanRejection {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlanRejection::Inactive => "inactive",
            PlanRejection::Paused => "paused",
            PlanRejection::InvalidTimeOfDay => "invalid-time-of-day",
            PlanRejection::InvalidWeekday => "invalid-weekday",
            PlanRejection::InvalidCadence => "invalid-cadence",
        }
    }
}

/// Lazily walks one customer's occurrences inside a window
#[derive(Debug)]
pub struct OccurrencePlan<'a> {
    customer: &'a AutoCustomer,
    window: GenerationWindow,
    until_end: Option<DateTime<Utc>>,
    step: Duration,
    next: DateTime<Utc>,
    shift_minutes: &'a [i64],
    skipped: HashSet<i64>,
    overrides: HashMap<i64, &'a OccurrenceOverride>,
    cap: Option<u32>,
}

impl<'a> OccurrencePlan<'a> {
    pub fn new(
        customer: &'a AutoCustomer,
        window: GenerationWindow,
        shift_minutes: &'a [i64],
        default_max_per_run: u32,
    ) -> Result<Self, PlanRejection> {
        if !customer.active {
            return Err(PlanRejection::Inactive);
        }
        if customer.paused {
            return Err(PlanRejection::Paused);
        }
        let time = customer.time_of_day().ok_or(PlanRejection::InvalidTimeOfDay)?;
        if !(0..=6).contains(&customer.weekday) {
            return Err(PlanRejection::InvalidWeekday);
        }
        if !ALLOWED_CADENCES.contains(&customer.cadence_weeks) {
            return Err(PlanRejection::InvalidCadence);
        }

        let offset = window.offset;
        let step = Duration::weeks(customer.cadence_weeks as i64);

        // First `weekday` on or after start_from anchors the sequence
        let from_weekday = customer.start_from.weekday().num_days_from_sunday() as i64;
        let delta = (customer.weekday as i64 - from_weekday).rem_euclid(7);
        let anchor = local_instant(customer.start_from + Duration::days(delta), time, offset);

        let lower = window
            .start
            .max(local_instant(customer.start_from, NaiveTime::MIN, offset));
        let next = if anchor >= lower {
            anchor
        } else {
            let gap = (lower - anchor).num_seconds();
            let step_secs = step.num_seconds();
            let steps = (gap + step_secs - 1) / step_secs;
            anchor + Duration::seconds(steps * step_secs)
        };

        let until_end = customer
            .until
            .map(|until| local_instant(until + Duration::days(1), NaiveTime::MIN, offset));

        let cap = match (customer.max_occurrences, customer.until) {
            (Some(max), _) => Some(max.max(0) as u32),
            (None, Some(_)) => None,
            (None, None) => Some(default_max_per_run),
        };

        Ok(Self {
            customer,
            window,
            until_end,
            step,
            next,
            shift_minutes,
            skipped: customer.skipped.iter().copied().map(minute_key).collect(),
            overrides: customer
                .overrides
                .iter()
                .map(|o| (minute_key(o.original_start), o))
                .collect(),
            cap,
        })
    }

    /// Maximum occurrences this run may materialize for the customer
    pub fn cap(&self) -> Option<u32> {
        self.cap
    }

    fn within_bounds(&self, instant: DateTime<Utc>) -> bool {
        instant >= self.window.start
            && instant < self.window.end
            && self.until_end.map(|end| instant < end).unwrap_or(true)
    }

    fn candidate_for(&self, planned: DateTime<Utc>) -> Candidate {
        if let Some(o) = self.overrides.get(&minute_key(planned)) {
            return Candidate {
                planned_start: planned,
                desired_start: o.override_start,
                barber: o.barber.clone().unwrap_or_else(|| self.customer.barber.clone()),
                duration_min: o.duration_min.unwrap_or(self.customer.duration_min) as i64,
                shifts: vec![0],
                override_applied: true,
            };
        }

        let planned_weekday = planned.with_timezone(&self.window.offset).weekday();
        let shifts = self
            .shift_minutes
            .iter()
            .copied()
            .filter(|shift| {
                let shifted = planned + Duration::minutes(*shift);
                shifted.with_timezone(&self.window.offset).weekday() == planned_weekday
                    && self.within_bounds(shifted)
            })
            .collect();

        Candidate {
            planned_start: planned,
            desired_start: planned,
            barber: self.customer.barber.clone(),
            duration_min: self.customer.duration_min as i64,
            shifts,
            override_applied: false,
        }
    }
}

impl Iterator for OccurrencePlan<'_> {
    type Item = PlannedOccurrence;

    fn next(&mut self) -> Option<Self::Item> {
        let planned = self.next;
        if !self.within_bounds(planned) {
            return None;
        }
        self.next = planned + self.step;

        if self.skipped.contains(&minute_key(planned)) {
            return Some(PlannedOccurrence::Skipped { planned_start: planned });
        }
        Some(PlannedOccurrence::Candidate(self.candidate_for(planned)))
    }
}
