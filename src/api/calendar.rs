//! Calendar endpoints (appointments, breaks, locks)

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    error::AppResult,
    models::{
        calendar_event::{
            CalendarQuery, CreateAppointment, CreateBreak, CreateLock, NotificationAttempt,
            UpdateCalendarEvent,
        },
        CalendarEvent,
    },
};

use super::AuthenticatedUser;

/// Events intersecting a time range
#[utoipa::path(
    get,
    path = "/calendar",
    tag = "calendar",
    security(("bearer_auth" = [])),
    params(CalendarQuery),
    responses(
        (status = 200, description = "Events ordered by start", body = Vec<CalendarEvent>),
        (status = 400, description = "Invalid range")
    )
)]
pub async fn list_events(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Query(query): Query<CalendarQuery>,
) -> AppResult<Json<Vec<CalendarEvent>>> {
    let events = state.services.calendar.list(&query).await?;
    Ok(Json(events))
}

/// Get event by ID
#[utoipa::path(
    get,
    path = "/calendar/{id}",
    tag = "calendar",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Event ID")),
    responses(
        (status = 200, description = "Event details", body = CalendarEvent),
        (status = 404, description = "Event not found")
    )
)]
pub async fn get_event(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<CalendarEvent>> {
    let event = state.services.calendar.get_by_id(id).await?;
    Ok(Json(event))
}

/// Book an appointment
#[utoipa::path(
    post,
    path = "/calendar/appointments",
    tag = "calendar",
    security(("bearer_auth" = [])),
    request_body = CreateAppointment,
    responses(
        (status = 201, description = "Appointment booked", body = CalendarEvent),
        (status = 409, description = "Slot already taken")
    )
)]
pub async fn create_appointment(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Json(data): Json<CreateAppointment>,
) -> AppResult<(StatusCode, Json<CalendarEvent>)> {
    data.validate()?;
    let event = state.services.calendar.create_appointment(&data).await?;
    Ok((StatusCode::CREATED, Json(event)))
}

/// Add a break
#[utoipa::path(
    post,
    path = "/calendar/breaks",
    tag = "calendar",
    security(("bearer_auth" = [])),
    request_body = CreateBreak,
    responses(
        (status = 201, description = "Break created", body = CalendarEvent)
    )
)]
pub async fn create_break(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Json(data): Json<CreateBreak>,
) -> AppResult<(StatusCode, Json<CalendarEvent>)> {
    data.validate()?;
    let event = state.services.calendar.create_break(&data).await?;
    Ok((StatusCode::CREATED, Json(event)))
}

/// Lock part of a barber's calendar
#[utoipa::path(
    post,
    path = "/calendar/locks",
    tag = "calendar",
    security(("bearer_auth" = [])),
    request_body = CreateLock,
    responses(
        (status = 201, description = "Lock created", body = CalendarEvent),
        (status = 400, description = "Missing or invalid end")
    )
)]
pub async fn create_lock(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Json(data): Json<CreateLock>,
) -> AppResult<(StatusCode, Json<CalendarEvent>)> {
    data.validate()?;
    let event = state.services.calendar.create_lock(&data).await?;
    Ok((StatusCode::CREATED, Json(event)))
}

/// Reschedule or resize an event
#[utoipa::path(
    put,
    path = "/calendar/{id}",
    tag = "calendar",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Event ID")),
    request_body = UpdateCalendarEvent,
    responses(
        (status = 200, description = "Event updated", body = CalendarEvent),
        (status = 409, description = "Slot already taken")
    )
)]
pub async fn update_event(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(data): Json<UpdateCalendarEvent>,
) -> AppResult<Json<CalendarEvent>> {
    data.validate()?;
    let event = state.services.calendar.update(id, &data).await?;
    Ok(Json(event))
}

/// Delete (cancel) an event
#[utoipa::path(
    delete,
    path = "/calendar/{id}",
    tag = "calendar",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Event ID")),
    responses(
        (status = 204, description = "Event deleted")
    )
)]
pub async fn delete_event(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    state.services.calendar.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Send the confirmation SMS of an appointment again
#[utoipa::path(
    post,
    path = "/calendar/{id}/resend-confirmation",
    tag = "calendar",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Event ID")),
    responses(
        (status = 200, description = "Attempt recorded", body = NotificationAttempt),
        (status = 400, description = "Not an appointment, no phone, or SMS disabled")
    )
)]
pub async fn resend_confirmation(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<NotificationAttempt>> {
    let attempt = state.services.calendar.resend_confirmation(id).await?;
    Ok(Json(attempt))
}
