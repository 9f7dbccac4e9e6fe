//! Business logic services

pub mod auto_customers;
pub mod calendar;
pub mod customers;
pub mod generation;
pub mod notifications;
pub mod redis;
pub mod sms;
pub mod waiting_list;

use std::{sync::Arc, time::Duration};

use crate::{config::AppConfig, error::AppResult, repository::Repository};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    repository: Repository,
    pub customers: customers::CustomersService,
    pub waiting_list: waiting_list::WaitingListService,
    pub calendar: calendar::CalendarService,
    pub auto_customers: auto_customers::AutoCustomersService,
    pub generation: generation::GenerationService,
}

impl Services {
    /// Create all services with the given repository
    pub fn new(
        repository: Repository,
        config: &AppConfig,
        redis_service: Option<redis::RedisService>,
    ) -> AppResult<Self> {
        let notifier: Arc<dyn sms::Notifier> = if config.sms.enabled {
            Arc::new(sms::HttpSmsNotifier::new(config.sms.clone())?)
        } else {
            tracing::info!("SMS delivery disabled");
            Arc::new(sms::DisabledNotifier)
        };
        let notifications = notifications::NotificationDispatcher::new(
            notifier,
            config.shop.name.clone(),
            config.shop.offset(),
            Duration::from_secs(config.sms.timeout_secs),
        );

        let calendar_store = Arc::new(repository.calendar.clone());

        Ok(Self {
            repository: repository.clone(),
            customers: customers::CustomersService::new(repository.clone()),
            waiting_list: waiting_list::WaitingListService::new(repository.clone()),
            calendar: calendar::CalendarService::new(repository.clone(), notifications.clone()),
            auto_customers: auto_customers::AutoCustomersService::new(repository.clone()),
            generation: generation::GenerationService::new(
                calendar_store,
                Arc::new(repository.batches.clone()),
                Arc::new(repository.auto_customers.clone()),
                notifications,
                config.generation.clone(),
                config.shop.offset(),
                redis_service,
            ),
        })
    }

    /// Check that the database answers
    pub async fn ping(&self) -> AppResult<()> {
        self.repository.ping().await
    }
}
