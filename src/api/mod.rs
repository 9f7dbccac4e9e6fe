//! API handlers for the barbershop REST endpoints

pub mod auto_customers;
pub mod calendar;
pub mod customers;
pub mod generation;
pub mod health;
pub mod openapi;
pub mod waiting_list;

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
    routing::{get, post, put},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{error::AppError, models::StaffClaims, AppState};

/// Extractor for authenticated staff from JWT token
pub struct AuthenticatedUser(pub StaffClaims);

#[async_trait]
impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| AppError::Authentication("Missing authorization header".to_string()))?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or_else(|| AppError::Authentication("Invalid authorization header format".to_string()))?;

        let claims = StaffClaims::from_token(token, &state.config.auth.jwt_secret)
            .map_err(|e| AppError::Authentication(e.to_string()))?;

        Ok(AuthenticatedUser(claims))
    }
}

/// Create the application router with all routes
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_v1 = Router::new()
        // Health check
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        // Customers
        .route(
            "/customers",
            get(customers::list_customers).post(customers::create_customer),
        )
        .route(
            "/customers/:id",
            get(customers::get_customer)
                .put(customers::update_customer)
                .delete(customers::delete_customer),
        )
        .route(
            "/customers/:id/notes",
            get(customers::list_notes).post(customers::create_note),
        )
        .route(
            "/customers/:id/notes/:note_id",
            axum::routing::delete(customers::delete_note),
        )
        // Waiting list
        .route(
            "/waiting-list",
            get(waiting_list::list_entries).post(waiting_list::create_entry),
        )
        .route(
            "/waiting-list/:id",
            put(waiting_list::update_entry).delete(waiting_list::delete_entry),
        )
        // Calendar
        .route("/calendar", get(calendar::list_events))
        .route("/calendar/appointments", post(calendar::create_appointment))
        .route("/calendar/breaks", post(calendar::create_break))
        .route("/calendar/locks", post(calendar::create_lock))
        .route(
            "/calendar/:id",
            get(calendar::get_event)
                .put(calendar::update_event)
                .delete(calendar::delete_event),
        )
        .route(
            "/calendar/:id/resend-confirmation",
            post(calendar::resend_confirmation),
        )
        // Auto customers
        .route(
            "/auto-customers",
            get(auto_customers::list_auto_customers).post(auto_customers::create_auto_customer),
        )
        .route("/auto-customers/push", post(generation::push_auto_customers))
        .route(
            "/auto-customers/:id",
            get(auto_customers::get_auto_customer)
                .put(auto_customers::update_auto_customer)
                .delete(auto_customers::delete_auto_customer),
        )
        .route(
            "/auto-customers/:id/skips",
            post(auto_customers::add_skip).delete(auto_customers::remove_skip),
        )
        .route(
            "/auto-customers/:id/overrides",
            put(auto_customers::set_override).delete(auto_customers::remove_override),
        )
        // Generation batches
        .route("/generation-batches", get(generation::list_batches))
        .route("/generation-batches/:id", get(generation::get_batch))
        .route("/generation-batches/:id/undo", post(generation::undo_batch))
        .with_state(state);

    Router::new()
        .nest("/api/v1", api_v1)
        .merge(openapi::create_openapi_router())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
