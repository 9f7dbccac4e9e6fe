//! In-memory stores for service tests

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::{AutoCustomerStore, BatchStore, CalendarStore};
use crate::{
    error::{AppError, AppResult},
    models::{
        calendar_event::NotificationAttempt, generation_batch::BatchQuery, AutoCustomer,
        CalendarEvent, EventFilter, GenerationBatch, GenerationTotals, NewCalendarEvent,
        SummaryRow,
    },
};

#[derive(Default)]
pub struct MemoryStore {
    pub events: Mutex<Vec<CalendarEvent>>,
    pub batches: Mutex<HashMap<Uuid, GenerationBatch>>,
    pub customers: Mutex<Vec<AutoCustomer>>,
    /// Starts for which `create_event` fails, to exercise persistence errors
    pub failing_starts: Mutex<Vec<DateTime<Utc>>>,
}

impl MemoryStore {
    pub fn with_customers(customers: Vec<AutoCustomer>) -> Self {
        Self {
            customers: Mutex::new(customers),
            ..Default::default()
        }
    }

    pub fn insert_event(&self, event: NewCalendarEvent) -> CalendarEvent {
        let created = materialize(&event);
        self.events.lock().unwrap().push(created.clone());
        created
    }

    pub fn events(&self) -> Vec<CalendarEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn customer(&self, id: Uuid) -> Option<AutoCustomer> {
        self.customers.lock().unwrap().iter().find(|c| c.id == id).cloned()
    }
}

fn materialize(event: &NewCalendarEvent) -> CalendarEvent {
    let now = Utc::now();
    CalendarEvent {
        id: Uuid::new_v4(),
        barber: event.barber.clone(),
        kind: event.kind,
        start: event.start,
        duration_min: event.duration_min,
        end: event.end(),
        status: event.status,
        origin: event.origin,
        customer_id: event.customer_id,
        customer_name: event.customer_name.clone(),
        customer_phone: event.customer_phone.clone(),
        lock_reason: event.lock_reason.clone(),
        generation: event.generation.clone(),
        notifications: Vec::new(),
        created_at: now,
        updated_at: now,
    }
}

#[async_trait]
impl CalendarStore for MemoryStore {
    async fn find_events(&self, filter: &EventFilter) -> AppResult<Vec<CalendarEvent>> {
        let mut events: Vec<_> = self
            .events
            .lock()
            .unwrap()
            .iter()
            .filter(|e| filter.matches(e))
            .cloned()
            .collect();
        events.sort_by_key(|e| e.start);
        Ok(events)
    }

    async fn create_event(&self, event: &NewCalendarEvent) -> AppResult<CalendarEvent> {
        if self.failing_starts.lock().unwrap().contains(&event.start) {
            return Err(AppError::Internal("simulated write failure".to_string()));
        }
        Ok(self.insert_event(event.clone()))
    }

    async fn delete_events(&self, ids: &[Uuid]) -> AppResult<u64> {
        let mut events = self.events.lock().unwrap();
        let before = events.len();
        events.retain(|e| !ids.contains(&e.id));
        Ok((before - events.len()) as u64)
    }

    async fn append_notification(&self, ids: &[Uuid], attempt: &NotificationAttempt) -> AppResult<()> {
        for event in self.events.lock().unwrap().iter_mut() {
            if ids.contains(&event.id) {
                event.notifications.push(attempt.clone());
            }
        }
        Ok(())
    }
}

#[async_trait]
impl BatchStore for MemoryStore {
    async fn list_batches(&self, query: &BatchQuery) -> AppResult<(Vec<GenerationBatch>, i64)> {
        let per_page = query.per_page.unwrap_or(20).clamp(1, 200) as usize;
        let page = query.page.unwrap_or(1).max(1) as usize;
        let mut batches: Vec<_> = self.batches.lock().unwrap().values().cloned().collect();
        batches.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        let total = batches.len() as i64;
        let page = batches.into_iter().skip((page - 1) * per_page).take(per_page).collect();
        Ok((page, total))
    }

    async fn insert_batch(&self, batch: &GenerationBatch) -> AppResult<()> {
        self.batches.lock().unwrap().insert(batch.id, batch.clone());
        Ok(())
    }

    async fn update_batch_results(
        &self,
        id: Uuid,
        totals: &GenerationTotals,
        summary: &[SummaryRow],
    ) -> AppResult<()> {
        let mut batches = self.batches.lock().unwrap();
        let batch = batches
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("Batch {} not found", id)))?;
        batch.totals = totals.clone();
        batch.summary = summary.to_vec();
        Ok(())
    }

    async fn get_batch(&self, id: Uuid) -> AppResult<GenerationBatch> {
        self.batches
            .lock()
            .unwrap()
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("Batch {} not found", id)))
    }

    async fn mark_undone(&self, id: Uuid, at: DateTime<Utc>, reason: Option<&str>) -> AppResult<bool> {
        let mut batches = self.batches.lock().unwrap();
        match batches.get_mut(&id) {
            Some(batch) if batch.undone_at.is_none() && !batch.dry_run => {
                batch.undone_at = Some(at);
                batch.undo_reason = reason.map(str::to_string);
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

#[async_trait]
impl AutoCustomerStore for MemoryStore {
    async fn list_for_generation(&self, ids: Option<&[Uuid]>) -> AppResult<Vec<AutoCustomer>> {
        Ok(self
            .customers
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.active && ids.map(|ids| ids.contains(&c.id)).unwrap_or(true))
            .cloned()
            .collect())
    }

    async fn touch_last_pushed(&self, ids: &[Uuid], at: DateTime<Utc>) -> AppResult<()> {
        for customer in self.customers.lock().unwrap().iter_mut() {
            if ids.contains(&customer.id) {
                customer.last_pushed_at = Some(at);
            }
        }
        Ok(())
    }
}
