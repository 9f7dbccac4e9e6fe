//! Repository layer for database operations

pub mod auto_customers;
pub mod batches;
pub mod calendar;
pub mod customers;
pub mod waiting_list;

#[cfg(test)]
pub mod memory;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{
        calendar_event::NotificationAttempt, generation_batch::BatchQuery, AutoCustomer,
        CalendarEvent, EventFilter, GenerationBatch, GenerationTotals, NewCalendarEvent,
        SummaryRow,
    },
};

/// Calendar storage consumed by the scheduler
#[async_trait]
pub trait CalendarStore: Send + Sync {
    /// Events intersecting the filter's range, ordered by start
    async fn find_events(&self, filter: &EventFilter) -> AppResult<Vec<CalendarEvent>>;

    async fn create_event(&self, event: &NewCalendarEvent) -> AppResult<CalendarEvent>;

    /// Delete every listed event; unknown ids are ignored. Returns the number removed.
    async fn delete_events(&self, ids: &[Uuid]) -> AppResult<u64>;

    async fn append_notification(&self, ids: &[Uuid], attempt: &NotificationAttempt) -> AppResult<()>;
}

/// Generation batch storage
#[async_trait]
pub trait BatchStore: Send + Sync {
    /// Batches newest first, with the total count
    async fn list_batches(&self, query: &BatchQuery) -> AppResult<(Vec<GenerationBatch>, i64)>;

    async fn insert_batch(&self, batch: &GenerationBatch) -> AppResult<()>;

    /// Store totals and summary after the notification pass
    async fn update_batch_results(
        &self,
        id: Uuid,
        totals: &GenerationTotals,
        summary: &[SummaryRow],
    ) -> AppResult<()>;

    async fn get_batch(&self, id: Uuid) -> AppResult<GenerationBatch>;

    /// Stamp the batch as undone. Returns false if it already was.
    async fn mark_undone(&self, id: Uuid, at: DateTime<Utc>, reason: Option<&str>) -> AppResult<bool>;
}

/// Auto customer storage consumed by the scheduler
#[async_trait]
pub trait AutoCustomerStore: Send + Sync {
    /// Active customers, optionally restricted to `ids`
    async fn list_for_generation(&self, ids: Option<&[Uuid]>) -> AppResult<Vec<AutoCustomer>>;

    async fn touch_last_pushed(&self, ids: &[Uuid], at: DateTime<Utc>) -> AppResult<()>;
}

/// Main repository struct holding database connection pool
#[derive(Clone)]
pub struct Repository {
    pub pool: Pool<Postgres>,
    pub customers: customers::CustomersRepository,
    pub waiting_list: waiting_list::WaitingListRepository,
    pub calendar: calendar::CalendarRepository,
    pub auto_customers: auto_customers::AutoCustomersRepository,
    pub batches: batches::BatchesRepository,
}

impl Repository {
    /// Create a new repository with the given database pool
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self {
            customers: customers::CustomersRepository::new(pool.clone()),
            waiting_list: waiting_list::WaitingListRepository::new(pool.clone()),
            calendar: calendar::CalendarRepository::new(pool.clone()),
            auto_customers: auto_customers::AutoCustomersRepository::new(pool.clone()),
            batches: batches::BatchesRepository::new(pool.clone()),
            pool,
        }
    }

    /// Check database connectivity
    pub async fn ping(&self) -> AppResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
