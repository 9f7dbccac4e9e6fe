//! Auto customer endpoints (recurring templates and their exceptions)

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
        auto_customer::{AutoCustomerQuery, CreateAutoCustomer, SkipOccurrence, UpdateAutoCustomer},
        AutoCustomer, OccurrenceOverride,
    },
};

use super::AuthenticatedUser;

/// List auto customers
#[utoipa::path(
    get,
    path = "/auto-customers",
    tag = "auto-customers",
    security(("bearer_auth" = [])),
    params(AutoCustomerQuery),
    responses(
        (status = 200, description = "Auto customers", body = Vec<AutoCustomer>)
    )
)]
pub async fn list_auto_customers(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Query(query): Query<AutoCustomerQuery>,
) -> AppResult<Json<Vec<AutoCustomer>>> {
    let customers = state.services.auto_customers.list(&query).await?;
    Ok(Json(customers))
}

/// Get auto customer by ID
#[utoipa::path(
    get,
    path = "/auto-customers/{id}",
    tag = "auto-customers",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Auto customer ID")),
    responses(
        (status = 200, description = "Auto customer details", body = AutoCustomer),
        (status = 404, description = "Auto customer not found")
    )
)]
pub async fn get_auto_customer(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<AutoCustomer>> {
    let customer = state.services.auto_customers.get_by_id(id).await?;
    Ok(Json(customer))
}

/// Create an auto customer
#[utoipa::path(
    post,
    path = "/auto-customers",
    tag = "auto-customers",
    security(("bearer_auth" = [])),
    request_body = CreateAutoCustomer,
    responses(
        (status = 201, description = "Auto customer created", body = AutoCustomer),
        (status = 400, description = "Invalid input")
    )
)]
pub async fn create_auto_customer(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(data): Json<CreateAutoCustomer>,
) -> AppResult<(StatusCode, Json<AutoCustomer>)> {
    claims.require_scheduler()?;
    data.validate()?;
    let customer = state.services.auto_customers.create(&data).await?;
    Ok((StatusCode::CREATED, Json(customer)))
}

/// Update an auto customer
#[utoipa::path(
    put,
    path = "/auto-customers/{id}",
    tag = "auto-customers",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Auto customer ID")),
    request_body = UpdateAutoCustomer,
    responses(
        (status = 200, description = "Auto customer updated", body = AutoCustomer)
    )
)]
pub async fn update_auto_customer(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(data): Json<UpdateAutoCustomer>,
) -> AppResult<Json<AutoCustomer>> {
    claims.require_scheduler()?;
    data.validate()?;
    let customer = state.services.auto_customers.update(id, &data).await?;
    Ok(Json(customer))
}

/// Delete an auto customer
#[utoipa::path(
    delete,
    path = "/auto-customers/{id}",
    tag = "auto-customers",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Auto customer ID")),
    responses(
        (status = 204, description = "Auto customer deleted")
    )
)]
pub async fn delete_auto_customer(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    claims.require_scheduler()?;
    state.services.auto_customers.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Skip one planned occurrence
#[utoipa::path(
    post,
    path = "/auto-customers/{id}/skips",
    tag = "auto-customers",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Auto customer ID")),
    request_body = SkipOccurrence,
    responses(
        (status = 200, description = "Skip recorded", body = AutoCustomer)
    )
)]
pub async fn add_skip(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(data): Json<SkipOccurrence>,
) -> AppResult<Json<AutoCustomer>> {
    claims.require_scheduler()?;
    let customer = state.services.auto_customers.skip(id, data.original_start).await?;
    Ok(Json(customer))
}

/// Remove a skip
#[utoipa::path(
    delete,
    path = "/auto-customers/{id}/skips",
    tag = "auto-customers",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Auto customer ID"),
        ("original_start" = String, Query, description = "Planned start (RFC 3339)")
    ),
    responses(
        (status = 200, description = "Skip removed", body = AutoCustomer),
        (status = 404, description = "No skip at that time")
    )
)]
pub async fn remove_skip(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<Uuid>,
    Query(data): Query<SkipOccurrence>,
) -> AppResult<Json<AutoCustomer>> {
    claims.require_scheduler()?;
    let customer = state.services.auto_customers.unskip(id, data.original_start).await?;
    Ok(Json(customer))
}

/// Set (or replace) the override of one planned occurrence
#[utoipa::path(
    put,
    path = "/auto-customers/{id}/overrides",
    tag = "auto-customers",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Auto customer ID")),
    request_body = OccurrenceOverride,
    responses(
        (status = 200, description = "Override stored", body = AutoCustomer)
    )
)]
pub async fn set_override(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(data): Json<OccurrenceOverride>,
) -> AppResult<Json<AutoCustomer>> {
    claims.require_scheduler()?;
    data.validate()?;
    let customer = state.services.auto_customers.set_override(id, data).await?;
    Ok(Json(customer))
}

/// Remove an override
#[utoipa::path(
    delete,
    path = "/auto-customers/{id}/overrides",
    tag = "auto-customers",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Auto customer ID"),
        ("original_start" = String, Query, description = "Planned start (RFC 3339)")
    ),
    responses(
        (status = 200, description = "Override removed", body = AutoCustomer),
        (status = 404, description = "No override at that time")
    )
)]
pub async fn remove_override(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<Uuid>,
    Query(data): Query<SkipOccurrence>,
) -> AppResult<Json<AutoCustomer>> {
    claims.require_scheduler()?;
    let customer = state
        .services
        .auto_customers
        .clear_override(id, data.original_start)
        .await?;
    Ok(Json(customer))
}
