//! OpenAPI documentation

use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{auto_customers, calendar, customers, generation, health, waiting_list};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Barbershop API",
        version = "0.3.0",
        description = "Barbershop booking REST API with recurring appointment generation"
    ),
    servers(
        (url = "/api/v1", description = "API v1")
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Customers
        customers::list_customers,
        customers::get_customer,
        customers::create_customer,
        customers::update_customer,
        customers::delete_customer,
        customers::list_notes,
        customers::create_note,
        customers::delete_note,
        // Waiting list
        waiting_list::list_entries,
        waiting_list::create_entry,
        waiting_list::update_entry,
        waiting_list::delete_entry,
        // Calendar
        calendar::list_events,
        calendar::get_event,
        calendar::create_appointment,
        calendar::create_break,
        calendar::create_lock,
        calendar::update_event,
        calendar::delete_event,
        calendar::resend_confirmation,
        // Auto customers
        auto_customers::list_auto_customers,
        auto_customers::get_auto_customer,
        auto_customers::create_auto_customer,
        auto_customers::update_auto_customer,
        auto_customers::delete_auto_customer,
        auto_customers::add_skip,
        auto_customers::remove_skip,
        auto_customers::set_override,
        auto_customers::remove_override,
        // Generation
        generation::push_auto_customers,
        generation::list_batches,
        generation::get_batch,
        generation::undo_batch,
    ),
    components(
        schemas(
            // Customers
            crate::models::customer::Customer,
            crate::models::customer::CreateCustomer,
            crate::models::customer::UpdateCustomer,
            crate::models::customer::CustomerNote,
            crate::models::customer::CreateCustomerNote,
            customers::CustomersListResponse,
            // Waiting list
            crate::models::waiting_list::WaitingListEntry,
            crate::models::waiting_list::CreateWaitingListEntry,
            crate::models::waiting_list::UpdateWaitingListEntry,
            crate::models::enums::WaitingStatus,
            // Calendar
            crate::models::calendar_event::CalendarEvent,
            crate::models::calendar_event::EventOrigin,
            crate::models::calendar_event::GenerationMeta,
            crate::models::calendar_event::NotificationAttempt,
            crate::models::calendar_event::CreateAppointment,
            crate::models::calendar_event::CreateBreak,
            crate::models::calendar_event::CreateLock,
            crate::models::calendar_event::UpdateCalendarEvent,
            crate::models::enums::EventKind,
            crate::models::enums::AppointmentStatus,
            crate::models::enums::SmsStatus,
            // Auto customers
            crate::models::auto_customer::AutoCustomer,
            crate::models::auto_customer::CreateAutoCustomer,
            crate::models::auto_customer::UpdateAutoCustomer,
            crate::models::auto_customer::OccurrenceOverride,
            crate::models::auto_customer::SkipOccurrence,
            // Generation
            crate::models::generation_batch::GenerateRequest,
            crate::models::generation_batch::GenerateResponse,
            crate::models::generation_batch::GenerationBatch,
            crate::models::generation_batch::GenerationBatchShort,
            crate::models::generation_batch::GenerationTotals,
            crate::models::generation_batch::SummaryRow,
            crate::models::generation_batch::DateRange,
            crate::models::generation_batch::UndoRequest,
            crate::models::generation_batch::UndoResponse,
            crate::models::enums::OccurrenceStatus,
            generation::BatchesListResponse,
            // Health
            health::HealthResponse,
            // Errors
            crate::error::ErrorResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "customers", description = "Customer directory and notes"),
        (name = "waiting-list", description = "Waiting list"),
        (name = "calendar", description = "Appointments, breaks and locks"),
        (name = "auto-customers", description = "Recurring booking templates"),
        (name = "generation", description = "Recurring appointment generation and undo")
    )
)]
pub struct ApiDoc;

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
