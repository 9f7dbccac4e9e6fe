//! Waiting list endpoints

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
        waiting_list::{CreateWaitingListEntry, UpdateWaitingListEntry, WaitingListQuery},
        WaitingListEntry,
    },
};

use super::AuthenticatedUser;

/// List waiting list entries in queue order
#[utoipa::path(
    get,
    path = "/waiting-list",
    tag = "waiting-list",
    security(("bearer_auth" = [])),
    params(WaitingListQuery),
    responses(
        (status = 200, description = "Waiting list", body = Vec<WaitingListEntry>)
    )
)]
pub async fn list_entries(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Query(query): Query<WaitingListQuery>,
) -> AppResult<Json<Vec<WaitingListEntry>>> {
    let entries = state.services.waiting_list.list(&query).await?;
    Ok(Json(entries))
}

/// Add someone to the waiting list
#[utoipa::path(
    post,
    path = "/waiting-list",
    tag = "waiting-list",
    security(("bearer_auth" = [])),
    request_body = CreateWaitingListEntry,
    responses(
        (status = 201, description = "Entry created", body = WaitingListEntry)
    )
)]
pub async fn create_entry(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Json(data): Json<CreateWaitingListEntry>,
) -> AppResult<(StatusCode, Json<WaitingListEntry>)> {
    data.validate()?;
    let entry = state.services.waiting_list.create(&data).await?;
    Ok((StatusCode::CREATED, Json(entry)))
}

/// Update status, notes or desired date
#[utoipa::path(
    put,
    path = "/waiting-list/{id}",
    tag = "waiting-list",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Entry ID")),
    request_body = UpdateWaitingListEntry,
    responses(
        (status = 200, description = "Entry updated", body = WaitingListEntry)
    )
)]
pub async fn update_entry(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(data): Json<UpdateWaitingListEntry>,
) -> AppResult<Json<WaitingListEntry>> {
    let entry = state.services.waiting_list.update(id, &data).await?;
    Ok(Json(entry))
}

/// Remove an entry
#[utoipa::path(
    delete,
    path = "/waiting-list/{id}",
    tag = "waiting-list",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Entry ID")),
    responses(
        (status = 204, description = "Entry deleted")
    )
)]
pub async fn delete_entry(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    state.services.waiting_list.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
