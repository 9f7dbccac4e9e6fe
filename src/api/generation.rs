//! Recurring appointment generation and batch endpoints

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::generation_batch::{
        BatchQuery, GenerateRequest, GenerateResponse, GenerationBatch, GenerationBatchShort,
        UndoRequest, UndoResponse,
    },
};

use super::AuthenticatedUser;

/// Paginated batches response
#[derive(Serialize, ToSchema)]
pub struct BatchesListResponse {
    pub batches: Vec<GenerationBatchShort>,
    pub total: i64,
}

/// Generate appointments for auto customers over a date range
#[utoipa::path(
    post,
    path = "/auto-customers/push",
    tag = "generation",
    security(("bearer_auth" = [])),
    request_body = GenerateRequest,
    responses(
        (status = 200, description = "Run summary", body = GenerateResponse),
        (status = 400, description = "Invalid range"),
        (status = 403, description = "Manager privileges required"),
        (status = 409, description = "Another run holds the barber lock")
    )
)]
pub async fn push_auto_customers(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(request): Json<GenerateRequest>,
) -> AppResult<Json<GenerateResponse>> {
    claims.require_scheduler()?;
    let response = state.services.generation.generate(&request, &claims.sub).await?;
    Ok(Json(response))
}

/// List generation batches, newest first
#[utoipa::path(
    get,
    path = "/generation-batches",
    tag = "generation",
    security(("bearer_auth" = [])),
    params(BatchQuery),
    responses(
        (status = 200, description = "Batches", body = BatchesListResponse)
    )
)]
pub async fn list_batches(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(query): Query<BatchQuery>,
) -> AppResult<Json<BatchesListResponse>> {
    claims.require_scheduler()?;
    let (batches, total) = state.services.generation.list_batches(&query).await?;
    Ok(Json(BatchesListResponse {
        batches: batches.into_iter().map(GenerationBatchShort::from).collect(),
        total,
    }))
}

/// Get a batch with its full summary
#[utoipa::path(
    get,
    path = "/generation-batches/{id}",
    tag = "generation",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Batch ID")),
    responses(
        (status = 200, description = "Batch details", body = GenerationBatch),
        (status = 404, description = "Batch not found")
    )
)]
pub async fn get_batch(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<GenerationBatch>> {
    claims.require_scheduler()?;
    let batch = state.services.generation.get_batch(id).await?;
    Ok(Json(batch))
}

/// Undo a batch, deleting the appointments it created
#[utoipa::path(
    post,
    path = "/generation-batches/{id}/undo",
    tag = "generation",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Batch ID")),
    request_body = UndoRequest,
    responses(
        (status = 200, description = "Batch undone", body = UndoResponse),
        (status = 400, description = "Dry run or already undone"),
        (status = 404, description = "Batch not found")
    )
)]
pub async fn undo_batch(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<Uuid>,
    body: Option<Json<UndoRequest>>,
) -> AppResult<Json<UndoResponse>> {
    claims.require_scheduler()?;
    let request = body.map(|Json(r)| r).unwrap_or_default();
    let response = state
        .services
        .generation
        .undo(id, request.reason.as_deref())
        .await?;
    Ok(Json(response))
}
