//! Customer directory and notes endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    error::AppResult,
    models::{
        customer::{CreateCustomer, CreateCustomerNote, CustomerQuery, UpdateCustomer},
        Customer, CustomerNote,
    },
};

use super::AuthenticatedUser;

/// Paginated customers response
#[derive(Serialize, ToSchema)]
pub struct CustomersListResponse {
    pub customers: Vec<Customer>,
    pub total: i64,
}

/// List customers with search and pagination
#[utoipa::path(
    get,
    path = "/customers",
    tag = "customers",
    security(("bearer_auth" = [])),
    params(CustomerQuery),
    responses(
        (status = 200, description = "Customers list", body = CustomersListResponse)
    )
)]
pub async fn list_customers(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Query(query): Query<CustomerQuery>,
) -> AppResult<Json<CustomersListResponse>> {
    let (customers, total) = state.services.customers.list(&query).await?;
    Ok(Json(CustomersListResponse { customers, total }))
}

/// Get customer by ID
#[utoipa::path(
    get,
    path = "/customers/{id}",
    tag = "customers",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Customer ID")),
    responses(
        (status = 200, description = "Customer details", body = Customer),
        (status = 404, description = "Customer not found")
    )
)]
pub async fn get_customer(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Customer>> {
    let customer = state.services.customers.get_by_id(id).await?;
    Ok(Json(customer))
}

/// Create a customer
#[utoipa::path(
    post,
    path = "/customers",
    tag = "customers",
    security(("bearer_auth" = [])),
    request_body = CreateCustomer,
    responses(
        (status = 201, description = "Customer created", body = Customer),
        (status = 400, description = "Invalid input")
    )
)]
pub async fn create_customer(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Json(data): Json<CreateCustomer>,
) -> AppResult<(StatusCode, Json<Customer>)> {
    data.validate()?;
    let customer = state.services.customers.create(&data).await?;
    Ok((StatusCode::CREATED, Json(customer)))
}

/// Update a customer
#[utoipa::path(
    put,
    path = "/customers/{id}",
    tag = "customers",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Customer ID")),
    request_body = UpdateCustomer,
    responses(
        (status = 200, description = "Customer updated", body = Customer)
    )
)]
pub async fn update_customer(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(data): Json<UpdateCustomer>,
) -> AppResult<Json<Customer>> {
    data.validate()?;
    let customer = state.services.customers.update(id, &data).await?;
    Ok(Json(customer))
}

/// Delete a customer (admin only)
#[utoipa::path(
    delete,
    path = "/customers/{id}",
    tag = "customers",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Customer ID")),
    responses(
        (status = 204, description = "Customer deleted")
    )
)]
pub async fn delete_customer(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    claims.require_admin()?;
    state.services.customers.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// List notes of a customer
#[utoipa::path(
    get,
    path = "/customers/{id}/notes",
    tag = "customers",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Customer ID")),
    responses(
        (status = 200, description = "Notes, newest first", body = Vec<CustomerNote>)
    )
)]
pub async fn list_notes(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Vec<CustomerNote>>> {
    let notes = state.services.customers.list_notes(id).await?;
    Ok(Json(notes))
}

/// Add a note to a customer
#[utoipa::path(
    post,
    path = "/customers/{id}/notes",
    tag = "customers",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Customer ID")),
    request_body = CreateCustomerNote,
    responses(
        (status = 201, description = "Note created", body = CustomerNote)
    )
)]
pub async fn create_note(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(data): Json<CreateCustomerNote>,
) -> AppResult<(StatusCode, Json<CustomerNote>)> {
    data.validate()?;
    let note = state.services.customers.create_note(id, &claims.sub, &data).await?;
    Ok((StatusCode::CREATED, Json(note)))
}

/// Delete a customer note
#[utoipa::path(
    delete,
    path = "/customers/{id}/notes/{note_id}",
    tag = "customers",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Customer ID"),
        ("note_id" = Uuid, Path, description = "Note ID")
    ),
    responses(
        (status = 204, description = "Note deleted")
    )
)]
pub async fn delete_note(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Path((id, note_id)): Path<(Uuid, Uuid)>,
) -> AppResult<StatusCode> {
    state.services.customers.delete_note(id, note_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
