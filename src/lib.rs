//! Barbershop booking server
//!
//! REST JSON API for a barbershop: customers, waiting list, a calendar of
//! appointments, breaks and locks, and a generator that books recurring
//! customers into the calendar in auditable, undoable batches.

use std::sync::Arc;

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod repository;
pub mod scheduler;
pub mod services;

pub use config::AppConfig;
pub use error::{AppError, AppResult};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub services: Arc<services::Services>,
}
