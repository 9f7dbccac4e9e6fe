//! Manual calendar operations (bookings, breaks, locks)

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use super::notifications::NotificationDispatcher;
use crate::{
    error::{AppError, AppResult},
    models::{
        calendar_event::{
            CalendarQuery, CreateAppointment, CreateBreak, CreateLock, NotificationAttempt,
            UpdateCalendarEvent, DEFAULT_DURATION_MIN,
        },
        patterns::normalize_phone,
        AppointmentStatus, CalendarEvent, EventFilter, EventKind, EventOrigin, NewCalendarEvent,
    },
    repository::{CalendarStore, Repository},
    scheduler::ScheduleIndex,
};

/// Longest lock accepted, in minutes (two weeks)
const MAX_LOCK_MINUTES: i64 = 14 * 24 * 60;

/// Bounds for appointments and breaks, in minutes
const MIN_EVENT_MINUTES: i64 = 5;
const MAX_EVENT_MINUTES: i64 = 600;

/// Reject a length the event kind cannot have
pub fn check_duration(kind: EventKind, duration_min: i32) -> AppResult<()> {
    let minutes = duration_min as i64;
    let (min, max) = match kind {
        EventKind::Lock => (1, MAX_LOCK_MINUTES),
        _ => (MIN_EVENT_MINUTES, MAX_EVENT_MINUTES),
    };
    if minutes < min || minutes > max {
        return Err(AppError::Validation(format!(
            "A {} lasts between {} and {} minutes",
            kind, min, max
        )));
    }
    Ok(())
}

/// Duration of a lock given an explicit end or a length
pub fn lock_duration(start: DateTime<Utc>, end: Option<DateTime<Utc>>, duration_min: Option<i32>) -> AppResult<i32> {
    let minutes = match (end, duration_min) {
        (Some(end), _) => {
            let span = end - start;
            if span.num_seconds() % 60 != 0 {
                return Err(AppError::Validation(
                    "Lock end must fall on a whole minute after its start".to_string(),
                ));
            }
            span.num_minutes()
        }
        (None, Some(duration)) => duration as i64,
        (None, None) => {
            return Err(AppError::Validation(
                "A lock needs an end or a duration".to_string(),
            ))
        }
    };
    if minutes <= 0 {
        return Err(AppError::Validation("Lock must end after it starts".to_string()));
    }
    if minutes > MAX_LOCK_MINUTES {
        return Err(AppError::Validation("Lock may not exceed two weeks".to_string()));
    }
    Ok(minutes as i32)
}

/// True if `[start, start + duration)` overlaps a blocking event other than `exclude`
pub fn overlaps(
    events: &[CalendarEvent],
    barber: &str,
    start: DateTime<Utc>,
    duration_min: i64,
    exclude: Option<Uuid>,
) -> bool {
    let index = ScheduleIndex::build(events.iter().filter(|e| Some(e.id) != exclude));
    index.conflicts(barber, start, duration_min)
}

#[derive(Clone)]
pub struct CalendarService {
    repository: Repository,
    notifications: NotificationDispatcher,
}

impl CalendarService {
    pub fn new(repository: Repository, notifications: NotificationDispatcher) -> Self {
        Self {
            repository,
            notifications,
        }
    }

    pub async fn list(&self, query: &CalendarQuery) -> AppResult<Vec<CalendarEvent>> {
        if query.to <= query.from {
            return Err(AppError::Validation("`to` must be after `from`".to_string()));
        }
        self.repository
            .calendar
            .find_events(&EventFilter {
                barber_in: query.barber.clone().map(|b| vec![b]),
                from: query.from,
                to: query.to,
                kind_in: query
                    .kind
                    .map(|k| vec![k])
                    .unwrap_or_else(|| EventKind::BLOCKING.to_vec()),
            })
            .await
    }

    pub async fn get_by_id(&self, id: Uuid) -> AppResult<CalendarEvent> {
        self.repository.calendar.get_by_id(id).await
    }

    async fn ensure_free(
        &self,
        barber: &str,
        start: DateTime<Utc>,
        duration_min: i32,
        exclude: Option<Uuid>,
    ) -> AppResult<()> {
        let events = self
            .repository
            .calendar
            .find_events(&EventFilter {
                barber_in: Some(vec![barber.to_string()]),
                from: start,
                to: start + Duration::minutes(duration_min as i64),
                kind_in: EventKind::BLOCKING.to_vec(),
            })
            .await?;
        if overlaps(&events, barber, start, duration_min as i64, exclude) {
            return Err(AppError::Conflict(format!(
                "{} is not available at {}",
                barber, start
            )));
        }
        Ok(())
    }

    /// Book an appointment. Overlaps are refused unless `force` is set.
    pub async fn create_appointment(&self, data: &CreateAppointment) -> AppResult<CalendarEvent> {
        let duration_min = data.duration_min.unwrap_or(DEFAULT_DURATION_MIN);

        let (mut name, mut phone) = (data.customer_name.clone(), data.customer_phone.clone());
        if let Some(customer_id) = data.customer_id {
            let customer = self.repository.customers.get_by_id(customer_id).await?;
            name = name.or(Some(customer.name));
            phone = phone.or(customer.phone);
        }
        let name = name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .ok_or_else(|| AppError::Validation("Customer name or id is required".to_string()))?;

        if !data.force.unwrap_or(false) {
            self.ensure_free(&data.barber, data.start, duration_min, None).await?;
        }

        let event = self
            .repository
            .calendar
            .create_event(&NewCalendarEvent {
                barber: data.barber.clone(),
                kind: EventKind::Appointment,
                start: data.start,
                duration_min,
                status: Some(AppointmentStatus::Confirmed),
                origin: EventOrigin::Manual,
                customer_id: data.customer_id,
                customer_name: Some(name),
                customer_phone: phone.as_deref().map(normalize_phone),
                lock_reason: None,
                generation: None,
            })
            .await?;

        tracing::info!("Booked {} with {} at {}", event.id, event.barber, event.start);
        Ok(event)
    }

    pub async fn create_break(&self, data: &CreateBreak) -> AppResult<CalendarEvent> {
        self.repository
            .calendar
            .create_event(&NewCalendarEvent {
                barber: data.barber.clone(),
                kind: EventKind::Break,
                start: data.start,
                duration_min: data.duration_min,
                status: None,
                origin: EventOrigin::Manual,
                customer_id: None,
                customer_name: None,
                customer_phone: None,
                lock_reason: None,
                generation: None,
            })
            .await
    }

    pub async fn create_lock(&self, data: &CreateLock) -> AppResult<CalendarEvent> {
        let duration_min = lock_duration(data.start, data.end, data.duration_min)?;
        self.repository
            .calendar
            .create_event(&NewCalendarEvent {
                barber: data.barber.clone(),
                kind: EventKind::Lock,
                start: data.start,
                duration_min,
                status: None,
                origin: EventOrigin::Manual,
                customer_id: None,
                customer_name: None,
                customer_phone: None,
                lock_reason: data.reason.clone(),
                generation: None,
            })
            .await
    }

    /// Move or resize an event. Appointments keep the overlap check.
    pub async fn update(&self, id: Uuid, data: &UpdateCalendarEvent) -> AppResult<CalendarEvent> {
        let event = self.repository.calendar.get_by_id(id).await?;
        let barber = data.barber.clone().unwrap_or_else(|| event.barber.clone());
        let start = data.start.unwrap_or(event.start);
        let duration_min = data.duration_min.unwrap_or(event.duration_min);
        check_duration(event.kind, duration_min)?;

        if event.kind == EventKind::Appointment && !data.force.unwrap_or(false) {
            self.ensure_free(&barber, start, duration_min, Some(id)).await?;
        }

        let lock_reason = match event.kind {
            EventKind::Lock => data.lock_reason.clone().or(event.lock_reason),
            _ => None,
        };
        let end = start + Duration::minutes(duration_min as i64);

        self.repository
            .calendar
            .reschedule(id, &barber, start, duration_min, end, lock_reason.as_deref())
            .await
    }

    pub async fn delete(&self, id: Uuid) -> AppResult<()> {
        self.repository.calendar.delete(id).await
    }

    pub async fn resend_confirmation(&self, id: Uuid) -> AppResult<NotificationAttempt> {
        let event = self.repository.calendar.get_by_id(id).await?;
        if event.kind != EventKind::Appointment {
            return Err(AppError::BadRequest("Only appointments have confirmations".to_string()));
        }
        self.notifications
            .resend_confirmation(&event, &self.repository.calendar)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        repository::memory::MemoryStore,
        scheduler::occurrences::tests::utc,
    };

    #[test]
    fn test_lock_duration_prefers_explicit_end() {
        let start = utc(2024, 1, 1, 12, 0);
        assert_eq!(lock_duration(start, Some(utc(2024, 1, 1, 13, 30)), Some(10)).unwrap(), 90);
        assert_eq!(lock_duration(start, None, Some(45)).unwrap(), 45);
        assert!(lock_duration(start, None, None).is_err());
        assert!(lock_duration(start, Some(start), None).is_err());
        assert!(lock_duration(start, Some(utc(2024, 2, 1, 12, 0)), None).is_err());
    }

    #[test]
    fn test_lock_end_with_seconds_is_rejected() {
        let start = utc(2024, 1, 1, 12, 0);
        let end = utc(2024, 1, 1, 13, 0) + Duration::seconds(30);
        assert!(matches!(lock_duration(start, Some(end), None), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_resize_limits_depend_on_kind() {
        let week = 7 * 24 * 60;
        assert!(check_duration(EventKind::Lock, week).is_ok());
        assert!(check_duration(EventKind::Lock, 15 * 24 * 60).is_err());
        assert!(check_duration(EventKind::Appointment, week).is_err());
        assert!(check_duration(EventKind::Appointment, 40).is_ok());
        assert!(check_duration(EventKind::Break, 2).is_err());
    }

    #[test]
    fn test_overlap_ignores_the_event_being_moved() {
        let store = MemoryStore::default();
        let event = store.insert_event(NewCalendarEvent {
            barber: "alex".to_string(),
            kind: EventKind::Appointment,
            start: utc(2024, 1, 1, 9, 0),
            duration_min: 40,
            status: Some(AppointmentStatus::Confirmed),
            origin: EventOrigin::Manual,
            customer_id: None,
            customer_name: Some("Jordan".to_string()),
            customer_phone: None,
            lock_reason: None,
            generation: None,
        });
        let events = store.events();

        assert!(overlaps(&events, "alex", utc(2024, 1, 1, 9, 20), 40, None));
        assert!(!overlaps(&events, "alex", utc(2024, 1, 1, 9, 20), 40, Some(event.id)));
        assert!(!overlaps(&events, "sam", utc(2024, 1, 1, 9, 20), 40, None));
        assert!(!overlaps(&events, "alex", utc(2024, 1, 1, 9, 40), 40, None));
    }
}
