//! Recurring appointment generation and batch undo

use std::sync::Arc;

use chrono::{DateTime, Duration, FixedOffset, Utc};
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{notifications::NotificationDispatcher, redis::RedisService};
use crate::{
    config::GenerationConfig,
    error::{AppError, AppResult},
    models::{
        calendar_event::GenerationMeta,
        generation_batch::{BatchQuery, DateRange, GenerateRequest, GenerateResponse, UndoResponse},
        AppointmentStatus, AutoCustomer, CalendarEvent, EventFilter, EventKind, EventOrigin,
        GenerationBatch, NewCalendarEvent,
    },
    repository::{AutoCustomerStore, BatchStore, CalendarStore},
    scheduler::{
        conflict_reason, resolve, BatchRecorder, Candidate, ExistingOccurrences, GenerationWindow,
        OccurrencePlan, PlannedOccurrence, Resolution, ScheduleIndex,
    },
};

/// Longest range a single run may cover, in days
const MAX_RANGE_DAYS: i64 = 366;

/// Mutable state of one run, shared across customers
struct RunState {
    index: ScheduleIndex,
    existing: ExistingOccurrences,
    recorder: BatchRecorder,
}

#[derive(Clone)]
pub struct GenerationService {
    calendar: Arc<dyn CalendarStore>,
    batches: Arc<dyn BatchStore>,
    customers: Arc<dyn AutoCustomerStore>,
    notifications: NotificationDispatcher,
    settings: GenerationConfig,
    offset: FixedOffset,
    /// Serializes committed runs and undos within this process
    writer: Arc<Mutex<()>>,
    lock: Option<RedisService>,
}

impl GenerationService {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        calendar: Arc<dyn CalendarStore>,
        batches: Arc<dyn BatchStore>,
        customers: Arc<dyn AutoCustomerStore>,
        notifications: NotificationDispatcher,
        settings: GenerationConfig,
        offset: FixedOffset,
        lock: Option<RedisService>,
    ) -> Self {
        Self {
            calendar,
            batches,
            customers,
            notifications,
            settings,
            offset,
            writer: Arc::new(Mutex::new(())),
            lock,
        }
    }

    fn validate_range(request: &GenerateRequest) -> AppResult<DateRange> {
        if request.to < request.from {
            return Err(AppError::Validation(format!(
                "Range end {} is before its start {}",
                request.to, request.from
            )));
        }
        if (request.to - request.from).num_days() >= MAX_RANGE_DAYS {
            return Err(AppError::Validation(format!(
                "Range may cover at most {} days",
                MAX_RANGE_DAYS
            )));
        }
        Ok(DateRange {
            from: request.from,
            to: request.to,
        })
    }

    /// Generate appointments for the requested range.
    ///
    /// Dry runs share the selection logic but write nothing.
    pub async fn generate(&self, request: &GenerateRequest, initiated_by: &str) -> AppResult<GenerateResponse> {
        let range = Self::validate_range(request)?;
        let customers = self
            .customers
            .list_for_generation(request.auto_customer_ids.as_deref())
            .await?;

        if request.dry_run {
            return self.run(range, &customers, true, initiated_by).await;
        }

        let _guard = self.writer.lock().await;
        let held = match &self.lock {
            Some(redis) => Some(redis.acquire_generation_lock(&barbers_of(&customers)).await?),
            None => None,
        };

        let result = self.run(range, &customers, false, initiated_by).await;

        if let (Some(redis), Some(held)) = (&self.lock, held) {
            if let Err(e) = redis.release(held).await {
                tracing::warn!("Failed to release generation lock: {}", e);
            }
        }
        result
    }

    async fn run(
        &self,
        range: DateRange,
        customers: &[AutoCustomer],
        dry_run: bool,
        initiated_by: &str,
    ) -> AppResult<GenerateResponse> {
        let window = GenerationWindow::from_range(range, self.offset);
        let (from, to) = window.snapshot_range(self.settings.window_padding_days, customers);
        let events = self
            .calendar
            .find_events(&EventFilter {
                barber_in: None,
                from,
                to,
                kind_in: EventKind::BLOCKING.to_vec(),
            })
            .await?;

        let mut state = RunState {
            index: ScheduleIndex::build(&events),
            existing: ExistingOccurrences::build(&events),
            recorder: BatchRecorder::new(Uuid::new_v4(), range, dry_run),
        };

        tracing::info!(
            "Generating {} to {} for {} customers ({} existing events, dry_run={})",
            range.from,
            range.to,
            customers.len(),
            events.len(),
            dry_run
        );

        for customer in customers {
            self.place_customer(customer, window, &mut state).await;
        }

        if dry_run {
            return Ok(state.recorder.into_response(None));
        }

        let mut recorder = state.recorder;
        let created_at = Utc::now();
        let saved_batch_id = match self.batches.insert_batch(&recorder.to_batch(initiated_by, created_at)).await {
            Ok(()) => Some(recorder.batch_id()),
            Err(e) => {
                tracing::error!("Failed to save generation batch {}: {}", recorder.batch_id(), e);
                None
            }
        };

        let touched = recorder.touched();
        if !touched.is_empty() {
            if let Err(e) = self.customers.touch_last_pushed(&touched, created_at).await {
                tracing::warn!("Failed to update last push time: {}", e);
            }
        }

        self.notifications.notify_batch(&mut recorder, self.calendar.as_ref()).await;

        if let Some(id) = saved_batch_id {
            if let Err(e) = self
                .batches
                .update_batch_results(id, recorder.totals(), recorder.summary())
                .await
            {
                tracing::error!("Failed to store SMS results for batch {}: {}", id, e);
            }
        }

        let totals = recorder.totals();
        tracing::info!(
            "Batch {}: {} inserted, {} moved, {} skipped, {} existing",
            recorder.batch_id(),
            totals.inserted,
            totals.moved,
            totals.skipped,
            totals.existing
        );

        Ok(recorder.into_response(saved_batch_id))
    }

    /// Walk one customer's occurrences until the range or the cap is exhausted
    async fn place_customer(&self, customer: &AutoCustomer, window: GenerationWindow, state: &mut RunState) {
        let plan = match OccurrencePlan::new(
            customer,
            window,
            &self.settings.shift_minutes,
            self.settings.default_max_per_run,
        ) {
            Ok(plan) => plan,
            Err(rejection) => {
                tracing::debug!("Auto customer {} not scheduled: {}", customer.id, rejection.as_str());
                return;
            }
        };

        let cap = plan.cap();
        let mut generated: u32 = 0;

        for occurrence in plan {
            if cap.map(|cap| generated >= cap).unwrap_or(false) {
                break;
            }
            match occurrence {
                PlannedOccurrence::Skipped { planned_start } => {
                    state
                        .recorder
                        .record_skipped(customer, &customer.barber, planned_start, "manual-skip");
                }
                PlannedOccurrence::Candidate(candidate) => {
                    if self.place_candidate(customer, &candidate, state).await {
                        generated += 1;
                    }
                }
            }
        }
    }

    /// Resolve and persist one candidate. Returns true if the occurrence is
    /// now on the calendar.
    async fn place_candidate(&self, customer: &AutoCustomer, candidate: &Candidate, state: &mut RunState) -> bool {
        loop {
            let (start, shift_minutes) = match resolve(candidate, customer.id, &state.index, &state.existing) {
                Resolution::Existing {
                    start,
                    shift_minutes,
                    event_id,
                } => {
                    state
                        .recorder
                        .record_existing(customer, &candidate.barber, start, shift_minutes, event_id);
                    return true;
                }
                Resolution::Conflict => {
                    state.recorder.record_skipped(
                        customer,
                        &candidate.barber,
                        candidate.desired_start,
                        conflict_reason(candidate),
                    );
                    return false;
                }
                Resolution::Accept { start, shift_minutes } => (start, shift_minutes),
            };

            if state.recorder.is_dry_run() {
                state
                    .index
                    .add_event(&candidate.barber, start, candidate.duration_min, EventKind::Appointment);
                state
                    .recorder
                    .record_placed(customer, &candidate.barber, start, shift_minutes, None);
                return true;
            }

            // Another writer may have booked the slot since the snapshot
            match self.fresh_conflicts(&candidate.barber, start, candidate.duration_min).await {
                Ok(fresh) if !fresh.is_empty() => {
                    tracing::debug!(
                        "Slot {} for {} taken since snapshot, retrying",
                        start,
                        candidate.barber
                    );
                    for event in &fresh {
                        state
                            .index
                            .add_event(&event.barber, event.start, event.duration_min as i64, event.kind);
                        if let (EventKind::Appointment, Some(source)) = (event.kind, event.origin.source_customer_id()) {
                            state.existing.insert(source, event.start, event.id);
                        }
                    }
                    continue;
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!("Slot re-check failed for {}: {}", customer.id, e);
                    state
                        .recorder
                        .record_skipped(customer, &candidate.barber, start, "persist-error");
                    return false;
                }
            }

            let event = NewCalendarEvent {
                barber: candidate.barber.clone(),
                kind: EventKind::Appointment,
                start,
                duration_min: candidate.duration_min as i32,
                status: Some(AppointmentStatus::Confirmed),
                origin: EventOrigin::AutoCustomer {
                    source_customer_id: customer.id,
                    batch_id: state.recorder.batch_id(),
                },
                customer_id: None,
                customer_name: Some(customer.name.clone()),
                customer_phone: customer.phone.clone(),
                lock_reason: None,
                generation: Some(GenerationMeta {
                    planned_start: candidate.planned_start,
                    shift_minutes,
                    override_applied: candidate.override_applied,
                }),
            };

            return match self.calendar.create_event(&event).await {
                Ok(created) => {
                    state
                        .index
                        .add_event(&created.barber, created.start, candidate.duration_min, created.kind);
                    state.existing.insert(customer.id, created.start, created.id);
                    state
                        .recorder
                        .record_placed(customer, &candidate.barber, start, shift_minutes, Some(created.id));
                    true
                }
                Err(AppError::Conflict(_)) => {
                    state
                        .recorder
                        .record_skipped(customer, &candidate.barber, start, "duplicate");
                    false
                }
                Err(e) => {
                    tracing::warn!("Failed to persist occurrence {} for {}: {}", start, customer.id, e);
                    state
                        .recorder
                        .record_skipped(customer, &candidate.barber, start, "persist-error");
                    false
                }
            };
        }
    }

    async fn fresh_conflicts(
        &self,
        barber: &str,
        start: DateTime<Utc>,
        duration_min: i64,
    ) -> AppResult<Vec<CalendarEvent>> {
        self.calendar
            .find_events(&EventFilter {
                barber_in: Some(vec![barber.to_string()]),
                from: start,
                to: start + Duration::minutes(duration_min),
                kind_in: EventKind::BLOCKING.to_vec(),
            })
            .await
    }

    /// Delete the appointments a batch created and mark it undone
    pub async fn undo(&self, batch_id: Uuid, reason: Option<&str>) -> AppResult<UndoResponse> {
        let batch = self.batches.get_batch(batch_id).await?;
        if batch.dry_run {
            return Err(AppError::BadRequest("Dry-run batches cannot be undone".to_string()));
        }
        if batch.undone_at.is_some() {
            return Err(AppError::BadRequest(format!("Batch {} is already undone", batch_id)));
        }

        let _guard = self.writer.lock().await;
        let removed = self.calendar.delete_events(&batch.appointment_ids).await?;
        if !self.batches.mark_undone(batch_id, Utc::now(), reason).await? {
            return Err(AppError::BadRequest(format!("Batch {} is already undone", batch_id)));
        }

        tracing::info!(
            "Undid batch {}: removed {} of {} appointments",
            batch_id,
            removed,
            batch.appointment_ids.len()
        );

        Ok(UndoResponse {
            success: true,
            message: format!(
                "Removed {} of {} generated appointments",
                removed,
                batch.appointment_ids.len()
            ),
        })
    }

    pub async fn list_batches(&self, query: &BatchQuery) -> AppResult<(Vec<GenerationBatch>, i64)> {
        self.batches.list_batches(query).await
    }

    pub async fn get_batch(&self, id: Uuid) -> AppResult<GenerationBatch> {
        self.batches.get_batch(id).await
    }
}

/// Every barber a run may book for, overrides included
fn barbers_of(customers: &[AutoCustomer]) -> Vec<String> {
    let mut barbers: Vec<String> = customers
        .iter()
        .flat_map(|c| {
            std::iter::once(c.barber.clone()).chain(c.overrides.iter().filter_map(|o| o.barber.clone()))
        })
        .collect();
    barbers.sort();
    barbers.dedup();
    barbers
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        models::{OccurrenceOverride, OccurrenceStatus, SmsStatus},
        repository::memory::MemoryStore,
        models::calendar_event::NotificationAttempt,
        scheduler::occurrences::tests::{customer, date, utc},
        services::sms::{MockNotifier, Notifier, SendReceipt},
    };
    use async_trait::async_trait;

    fn service_with(
        calendar: Arc<dyn CalendarStore>,
        store: Arc<MemoryStore>,
        notifier: Arc<dyn Notifier>,
    ) -> GenerationService {
        let offset = FixedOffset::east_opt(0).unwrap();
        let notifications = NotificationDispatcher::new(
            notifier,
            "Fade Street".to_string(),
            offset,
            std::time::Duration::from_secs(5),
        );
        GenerationService::new(
            calendar,
            store.clone(),
            store,
            notifications,
            GenerationConfig::default(),
            offset,
            None,
        )
    }

    fn service(store: Arc<MemoryStore>, notifier: MockNotifier) -> GenerationService {
        service_with(store.clone(), store, Arc::new(notifier))
    }

    fn sending_notifier(times: usize) -> MockNotifier {
        let mut notifier = MockNotifier::new();
        notifier.expect_is_enabled().return_const(true);
        notifier.expect_send().times(times).returning(|_, _| {
            Ok(SendReceipt {
                success: true,
                message_id: Some("msg-1".to_string()),
                error: None,
            })
        });
        notifier
    }

    fn request(from: chrono::NaiveDate, to: chrono::NaiveDate, dry_run: bool) -> GenerateRequest {
        GenerateRequest {
            from,
            to,
            dry_run,
            auto_customer_ids: None,
        }
    }

    fn manual(kind: EventKind, start: DateTime<Utc>, duration_min: i32) -> NewCalendarEvent {
        NewCalendarEvent {
            barber: "alex".to_string(),
            kind,
            start,
            duration_min,
            status: (kind == EventKind::Appointment).then_some(AppointmentStatus::Confirmed),
            origin: EventOrigin::Manual,
            customer_id: None,
            customer_name: None,
            customer_phone: None,
            lock_reason: None,
            generation: None,
        }
    }

    fn block(store: &MemoryStore, kind: EventKind, start: DateTime<Utc>, duration_min: i32) {
        store.insert_event(manual(kind, start, duration_min));
    }

    /// Calendar that gains `late` right after the run's snapshot is read,
    /// as if another writer booked between snapshot and commit
    struct LateBookingCalendar {
        inner: Arc<MemoryStore>,
        late: Mutex<Option<NewCalendarEvent>>,
    }

    impl LateBookingCalendar {
        fn new(inner: Arc<MemoryStore>, late: NewCalendarEvent) -> Self {
            Self {
                inner,
                late: Mutex::new(Some(late)),
            }
        }
    }

    #[async_trait]
    impl CalendarStore for LateBookingCalendar {
        async fn find_events(&self, filter: &EventFilter) -> AppResult<Vec<CalendarEvent>> {
            let events = self.inner.find_events(filter).await?;
            let late = self.late.lock().await.take();
            if let Some(event) = late {
                self.inner.insert_event(event);
            }
            Ok(events)
        }

        async fn create_event(&self, event: &NewCalendarEvent) -> AppResult<CalendarEvent> {
            self.inner.create_event(event).await
        }

        async fn delete_events(&self, ids: &[Uuid]) -> AppResult<u64> {
            self.inner.delete_events(ids).await
        }

        async fn append_notification(&self, ids: &[Uuid], attempt: &NotificationAttempt) -> AppResult<()> {
            self.inner.append_notification(ids, attempt).await
        }
    }

    /// Provider that never answers within the dispatcher timeout
    struct StalledNotifier;

    #[async_trait]
    impl Notifier for StalledNotifier {
        fn is_enabled(&self) -> bool {
            true
        }

        async fn send(&self, _phone: &str, _message: &str) -> AppResult<SendReceipt> {
            tokio::time::sleep(std::time::Duration::from_secs(60)).await;
            Ok(SendReceipt {
                success: true,
                message_id: None,
                error: None,
            })
        }
    }

    #[tokio::test]
    async fn test_biweekly_run_books_every_occurrence() {
        let c = customer(1, "09:00", 2, date(2024, 1, 1));
        let id = c.id;
        let store = Arc::new(MemoryStore::with_customers(vec![c]));
        let svc = service(store.clone(), sending_notifier(1));

        let response = svc
            .generate(&request(date(2024, 1, 1), date(2024, 2, 15), false), "manager-1")
            .await
            .unwrap();

        assert_eq!(response.totals.inserted, 4);
        assert_eq!(response.totals.sms_sent, 1);
        assert_eq!(response.created_count, 4);
        let starts: Vec<_> = response.summary.iter().map(|r| r.scheduled_for).collect();
        assert_eq!(
            starts,
            vec![
                utc(2024, 1, 1, 9, 0),
                utc(2024, 1, 15, 9, 0),
                utc(2024, 1, 29, 9, 0),
                utc(2024, 2, 12, 9, 0),
            ]
        );

        let batch_id = response.saved_batch_id.expect("batch saved");
        let batch = svc.get_batch(batch_id).await.unwrap();
        assert_eq!(batch.appointment_ids.len(), 4);
        assert_eq!(batch.touched_customer_ids, vec![id]);
        assert_eq!(batch.totals.sms_sent, 1);
        assert_eq!(batch.summary[0].sms_status, SmsStatus::Sent);

        assert!(store.customer(id).unwrap().last_pushed_at.is_some());
        for event in store.events() {
            assert_eq!(event.origin.batch_id(), Some(batch_id));
            assert_eq!(event.notifications.len(), 1);
        }
    }

    #[tokio::test]
    async fn test_busy_slot_moves_by_fifteen_minutes() {
        let c = customer(1, "09:00", 1, date(2024, 1, 1));
        let store = Arc::new(MemoryStore::with_customers(vec![c]));
        block(&store, EventKind::Appointment, utc(2024, 1, 1, 8, 30), 45);
        let svc = service(store.clone(), sending_notifier(1));

        let response = svc
            .generate(&request(date(2024, 1, 1), date(2024, 1, 1), false), "manager-1")
            .await
            .unwrap();

        assert_eq!(response.totals.moved, 1);
        let row = &response.summary[0];
        assert_eq!(row.status, OccurrenceStatus::Moved);
        assert_eq!(row.scheduled_for, utc(2024, 1, 1, 9, 15));
        assert_eq!(row.shift_minutes, 15);

        let generated = store
            .events()
            .into_iter()
            .find(|e| e.origin.source_customer_id().is_some())
            .unwrap();
        let meta = generated.generation.unwrap();
        assert_eq!(meta.planned_start, utc(2024, 1, 1, 9, 0));
        assert_eq!(meta.shift_minutes, 15);
    }

    #[tokio::test]
    async fn test_blocked_override_is_not_shifted() {
        let mut c = customer(1, "09:00", 1, date(2024, 1, 1));
        c.overrides = vec![OccurrenceOverride {
            original_start: utc(2024, 1, 1, 9, 0),
            override_start: utc(2024, 1, 2, 10, 0),
            duration_min: None,
            barber: None,
        }];
        let store = Arc::new(MemoryStore::with_customers(vec![c]));
        block(&store, EventKind::Lock, utc(2024, 1, 2, 9, 0), 120);
        let mut notifier = MockNotifier::new();
        notifier.expect_is_enabled().return_const(true);
        notifier.expect_send().never();
        let svc = service(store.clone(), notifier);

        let response = svc
            .generate(&request(date(2024, 1, 1), date(2024, 1, 6), false), "manager-1")
            .await
            .unwrap();

        assert_eq!(response.totals.skipped, 1);
        assert_eq!(response.summary[0].reason, "override-conflict");
        assert_eq!(store.events().len(), 1);
    }

    #[tokio::test]
    async fn test_manual_skip_does_not_consume_cap() {
        let mut c = customer(1, "09:00", 1, date(2024, 1, 1));
        c.max_occurrences = Some(2);
        c.skipped = vec![utc(2024, 1, 8, 9, 0)];
        let store = Arc::new(MemoryStore::with_customers(vec![c]));
        let svc = service(store.clone(), sending_notifier(1));

        let response = svc
            .generate(&request(date(2024, 1, 1), date(2024, 1, 31), false), "manager-1")
            .await
            .unwrap();

        let outcome: Vec<_> = response
            .summary
            .iter()
            .map(|r| (r.scheduled_for, r.status, r.reason.as_str()))
            .collect();
        assert_eq!(
            outcome,
            vec![
                (utc(2024, 1, 1, 9, 0), OccurrenceStatus::Inserted, "planned"),
                (utc(2024, 1, 8, 9, 0), OccurrenceStatus::Skipped, "manual-skip"),
                (utc(2024, 1, 15, 9, 0), OccurrenceStatus::Inserted, "planned"),
            ]
        );
        assert_eq!(response.totals.attempted, 3);
    }

    #[tokio::test]
    async fn test_rerun_reports_existing_without_duplicates() {
        let c = customer(1, "09:00", 2, date(2024, 1, 1));
        let store = Arc::new(MemoryStore::with_customers(vec![c]));
        let svc = service(store.clone(), sending_notifier(1));
        let range = request(date(2024, 1, 1), date(2024, 2, 15), false);

        svc.generate(&range, "manager-1").await.unwrap();
        let second = svc.generate(&range, "manager-1").await.unwrap();

        assert_eq!(second.totals.existing, 4);
        assert_eq!(second.totals.inserted, 0);
        assert_eq!(second.created_count, 0);
        assert_eq!(store.events().len(), 4);
        // The second run still leaves an audit record
        assert!(second.saved_batch_id.is_some());
    }

    #[tokio::test]
    async fn test_dry_run_writes_nothing() {
        let c = customer(1, "09:00", 1, date(2024, 1, 1));
        let id = c.id;
        let store = Arc::new(MemoryStore::with_customers(vec![c]));
        block(&store, EventKind::Break, utc(2024, 1, 8, 9, 0), 20);
        let mut notifier = MockNotifier::new();
        notifier.expect_send().never();
        let svc = service(store.clone(), notifier);

        let preview = svc
            .generate(&request(date(2024, 1, 1), date(2024, 1, 14), true), "manager-1")
            .await
            .unwrap();

        assert!(preview.dry_run);
        assert_eq!(preview.batch_id, None);
        assert_eq!(preview.saved_batch_id, None);
        assert_eq!((preview.totals.inserted, preview.totals.moved), (1, 1));
        assert_eq!(preview.summary[1].scheduled_for, utc(2024, 1, 8, 9, 30));
        assert_eq!(store.events().len(), 1);
        assert!(store.batches.lock().unwrap().is_empty());
        assert!(store.customer(id).unwrap().last_pushed_at.is_none());
    }

    #[tokio::test]
    async fn test_dry_run_matches_committed_selection() {
        let c = customer(1, "09:00", 1, date(2024, 1, 1));
        let store = Arc::new(MemoryStore::with_customers(vec![c]));
        block(&store, EventKind::Appointment, utc(2024, 1, 15, 9, 0), 30);
        let svc = service(store.clone(), sending_notifier(1));
        let mut req = request(date(2024, 1, 1), date(2024, 1, 31), true);

        let preview = svc.generate(&req, "manager-1").await.unwrap();
        req.dry_run = false;
        let committed = svc.generate(&req, "manager-1").await.unwrap();

        let key = |r: &crate::models::SummaryRow| (r.scheduled_for, r.status, r.shift_minutes);
        assert_eq!(
            preview.summary.iter().map(key).collect::<Vec<_>>(),
            committed.summary.iter().map(key).collect::<Vec<_>>()
        );
    }

    #[tokio::test]
    async fn test_undo_removes_batch_appointments_once() {
        let c = customer(1, "09:00", 1, date(2024, 1, 1));
        let store = Arc::new(MemoryStore::with_customers(vec![c]));
        block(&store, EventKind::Break, utc(2024, 1, 3, 12, 0), 30);
        let svc = service(store.clone(), sending_notifier(1));

        let response = svc
            .generate(&request(date(2024, 1, 1), date(2024, 1, 21), false), "manager-1")
            .await
            .unwrap();
        let batch_id = response.saved_batch_id.unwrap();
        assert_eq!(store.events().len(), 4);

        let undo = svc.undo(batch_id, Some("wrong range")).await.unwrap();
        assert!(undo.success);
        let remaining = store.events();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].kind, EventKind::Break);

        let batch = svc.get_batch(batch_id).await.unwrap();
        assert!(batch.undone_at.is_some());
        assert_eq!(batch.undo_reason.as_deref(), Some("wrong range"));

        let again = svc.undo(batch_id, None).await.unwrap_err();
        assert!(matches!(again, AppError::BadRequest(_)));
        let missing = svc.undo(Uuid::new_v4(), None).await.unwrap_err();
        assert!(matches!(missing, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_missing_phone_skips_sms() {
        let mut c = customer(1, "09:00", 1, date(2024, 1, 1));
        c.phone = None;
        let store = Arc::new(MemoryStore::with_customers(vec![c]));
        let mut notifier = MockNotifier::new();
        notifier.expect_is_enabled().return_const(true);
        notifier.expect_send().never();
        let svc = service(store.clone(), notifier);

        let response = svc
            .generate(&request(date(2024, 1, 1), date(2024, 1, 7), false), "manager-1")
            .await
            .unwrap();

        assert_eq!(response.totals.sms_skipped, 1);
        assert_eq!(response.summary[0].sms_status, SmsStatus::MissingPhone);
        assert_eq!(response.summary[0].sms_reason.as_deref(), Some("missing-phone"));
    }

    #[tokio::test]
    async fn test_notifier_failure_keeps_appointments() {
        let c = customer(1, "09:00", 1, date(2024, 1, 1));
        let store = Arc::new(MemoryStore::with_customers(vec![c]));
        let mut notifier = MockNotifier::new();
        notifier.expect_is_enabled().return_const(true);
        notifier
            .expect_send()
            .times(1)
            .returning(|_, _| Err(AppError::Notifier("gateway down".to_string())));
        let svc = service(store.clone(), notifier);

        let response = svc
            .generate(&request(date(2024, 1, 1), date(2024, 1, 14), false), "manager-1")
            .await
            .unwrap();

        assert_eq!(response.totals.inserted, 2);
        assert_eq!(response.totals.sms_failed, 1);
        assert!(response.summary[0].sms_error.as_deref().unwrap().contains("gateway down"));
        let events = store.events();
        assert_eq!(events.len(), 2);
        assert!(events.iter().all(|e| e.notifications[0].status == SmsStatus::Failed));
    }

    #[tokio::test]
    async fn test_persist_failure_is_recorded_and_run_continues() {
        let c = customer(1, "09:00", 1, date(2024, 1, 1));
        let store = Arc::new(MemoryStore::with_customers(vec![c]));
        store.failing_starts.lock().unwrap().push(utc(2024, 1, 8, 9, 0));
        let svc = service(store.clone(), sending_notifier(1));

        let response = svc
            .generate(&request(date(2024, 1, 1), date(2024, 1, 21), false), "manager-1")
            .await
            .unwrap();

        assert_eq!(response.totals.inserted, 2);
        assert_eq!(response.totals.skipped, 1);
        assert_eq!(response.summary[1].reason, "persist-error");
        assert_eq!(store.events().len(), 2);
    }

    #[tokio::test]
    async fn test_override_outside_window_previews_like_commit() {
        let mut c = customer(1, "09:00", 1, date(2024, 1, 1));
        c.overrides = vec![OccurrenceOverride {
            original_start: utc(2024, 1, 1, 9, 0),
            override_start: utc(2024, 1, 10, 10, 0),
            duration_min: None,
            barber: None,
        }];
        let store = Arc::new(MemoryStore::with_customers(vec![c]));
        block(&store, EventKind::Lock, utc(2024, 1, 10, 9, 0), 180);
        let mut notifier = MockNotifier::new();
        notifier.expect_is_enabled().return_const(true);
        notifier.expect_send().never();
        let svc = service(store.clone(), notifier);
        let mut req = request(date(2024, 1, 1), date(2024, 1, 1), true);

        let preview = svc.generate(&req, "manager-1").await.unwrap();
        req.dry_run = false;
        let committed = svc.generate(&req, "manager-1").await.unwrap();

        let key = |r: &crate::models::SummaryRow| (r.scheduled_for, r.status, r.reason.clone());
        let expected = vec![(
            utc(2024, 1, 10, 10, 0),
            OccurrenceStatus::Skipped,
            "override-conflict".to_string(),
        )];
        assert_eq!(preview.summary.iter().map(key).collect::<Vec<_>>(), expected);
        assert_eq!(committed.summary.iter().map(key).collect::<Vec<_>>(), expected);
        assert_eq!(store.events().len(), 1);
    }

    #[tokio::test]
    async fn test_override_outside_window_is_existing_on_rerun() {
        let mut c = customer(1, "09:00", 1, date(2024, 1, 1));
        c.overrides = vec![OccurrenceOverride {
            original_start: utc(2024, 1, 1, 9, 0),
            override_start: utc(2024, 1, 10, 10, 0),
            duration_min: None,
            barber: None,
        }];
        let store = Arc::new(MemoryStore::with_customers(vec![c]));
        let svc = service(store.clone(), sending_notifier(1));
        let mut req = request(date(2024, 1, 1), date(2024, 1, 1), false);

        let first = svc.generate(&req, "manager-1").await.unwrap();
        assert_eq!(first.totals.inserted, 1);

        req.dry_run = true;
        let preview = svc.generate(&req, "manager-1").await.unwrap();
        assert_eq!(preview.totals.existing, 1);
        assert_eq!(preview.totals.inserted, 0);
        assert_eq!(store.events().len(), 1);
    }

    #[tokio::test]
    async fn test_slot_taken_after_snapshot_moves_to_next_shift() {
        let c = customer(1, "09:00", 1, date(2024, 1, 1));
        let store = Arc::new(MemoryStore::with_customers(vec![c]));
        let calendar = Arc::new(LateBookingCalendar::new(
            store.clone(),
            manual(EventKind::Appointment, utc(2024, 1, 1, 9, 0), 15),
        ));
        let svc = service_with(calendar, store.clone(), Arc::new(sending_notifier(1)));

        let response = svc
            .generate(&request(date(2024, 1, 1), date(2024, 1, 1), false), "manager-1")
            .await
            .unwrap();

        assert_eq!(response.summary.len(), 1);
        let row = &response.summary[0];
        assert_eq!(row.status, OccurrenceStatus::Moved);
        assert_eq!(row.shift_minutes, 15);
        assert_eq!(row.scheduled_for, utc(2024, 1, 1, 9, 15));

        let events = store.events();
        assert_eq!(events.len(), 2);
        let generated: Vec<_> = events
            .iter()
            .filter(|e| e.origin.source_customer_id().is_some())
            .collect();
        assert_eq!(generated.len(), 1);
        assert_eq!(generated[0].start, utc(2024, 1, 1, 9, 15));
    }

    #[tokio::test]
    async fn test_own_occurrence_booked_after_snapshot_is_existing() {
        let c = customer(1, "09:00", 1, date(2024, 1, 1));
        let id = c.id;
        let store = Arc::new(MemoryStore::with_customers(vec![c]));
        let mut late = manual(EventKind::Appointment, utc(2024, 1, 1, 9, 0), 40);
        late.origin = EventOrigin::AutoCustomer {
            source_customer_id: id,
            batch_id: Uuid::new_v4(),
        };
        let calendar = Arc::new(LateBookingCalendar::new(store.clone(), late));
        let mut notifier = MockNotifier::new();
        notifier.expect_send().never();
        let svc = service_with(calendar, store.clone(), Arc::new(notifier));

        let response = svc
            .generate(&request(date(2024, 1, 1), date(2024, 1, 1), false), "manager-1")
            .await
            .unwrap();

        assert_eq!(response.summary[0].status, OccurrenceStatus::Existing);
        assert_eq!(response.summary[0].scheduled_for, utc(2024, 1, 1, 9, 0));
        assert_eq!(response.created_count, 0);
        assert_eq!(store.events().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_notifier_timeout_counts_as_failure() {
        let c = customer(1, "09:00", 1, date(2024, 1, 1));
        let store = Arc::new(MemoryStore::with_customers(vec![c]));
        let svc = service_with(store.clone(), store.clone(), Arc::new(StalledNotifier));

        let response = svc
            .generate(&request(date(2024, 1, 1), date(2024, 1, 14), false), "manager-1")
            .await
            .unwrap();

        assert_eq!(response.totals.inserted, 2);
        assert_eq!(response.totals.sms_failed, 1);
        assert_eq!(response.summary[0].sms_status, SmsStatus::Failed);
        assert!(response.summary[0].sms_error.as_deref().unwrap().contains("timed out"));
        let events = store.events();
        assert_eq!(events.len(), 2);
        assert!(events.iter().all(|e| e.notifications[0].status == SmsStatus::Failed));
    }

    #[tokio::test]
    async fn test_reversed_range_is_rejected() {
        let store = Arc::new(MemoryStore::default());
        let svc = service(store.clone(), MockNotifier::new());

        let err = svc
            .generate(&request(date(2024, 2, 1), date(2024, 1, 1), false), "manager-1")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert!(store.batches.lock().unwrap().is_empty());
    }
}
