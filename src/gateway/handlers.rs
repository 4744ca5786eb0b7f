//! Point handlers
//!
//! Parameter validation happens here; the ledger assumes ids >= 1 and
//! amounts >= 0.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
};
use utoipa::ToSchema;

use super::state::AppState;
use super::types::{ApiResult, ok, validate_amount, validate_user_id};
use crate::core_types::now_ms;
use crate::models::{HistoryEntry, UserBalance};

/// Health check response data
#[derive(serde::Serialize, serde::Deserialize, ToSchema)]
pub struct HealthResponse {
    /// Server timestamp in milliseconds
    #[schema(example = 1703494800000_i64)]
    pub timestamp_ms: i64,
}

/// Health check endpoint
#[utoipa::path(
    get,
    path = "/api/v1/health",
    responses(
        (status = 200, description = "Service healthy", body = HealthResponse, content_type = "application/json")
    ),
    tag = "System"
)]
pub async fn health_check() -> ApiResult<HealthResponse> {
    ok(HealthResponse {
        timestamp_ms: now_ms(),
    })
}

/// Current point balance
///
/// GET /point/{id}
#[utoipa::path(
    get,
    path = "/point/{id}",
    params(("id" = i64, Path, description = "User id (>= 1)")),
    responses(
        (status = 200, description = "Balance snapshot", body = UserBalance, content_type = "application/json"),
        (status = 400, description = "Invalid user id"),
        (status = 404, description = "User has no point history")
    ),
    tag = "Point"
)]
pub async fn get_point(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> ApiResult<UserBalance> {
    let user_id = validate_user_id(id)?;
    ok(state.ledger.get_balance(user_id).await?)
}

/// Charge/use history, oldest first
///
/// GET /point/{id}/histories
#[utoipa::path(
    get,
    path = "/point/{id}/histories",
    params(("id" = i64, Path, description = "User id (>= 1)")),
    responses(
        (status = 200, description = "History entries (possibly empty)", body = Vec<HistoryEntry>, content_type = "application/json"),
        (status = 400, description = "Invalid user id")
    ),
    tag = "Point"
)]
pub async fn get_histories(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> ApiResult<Vec<HistoryEntry>> {
    let user_id = validate_user_id(id)?;
    ok(state.ledger.get_history(user_id).await?)
}

/// Charge points
///
/// PATCH /point/{id}/charge
#[utoipa::path(
    patch,
    path = "/point/{id}/charge",
    params(("id" = i64, Path, description = "User id (>= 1)")),
    request_body(content = i64, description = "Amount to charge (>= 0)", content_type = "application/json"),
    responses(
        (status = 200, description = "Updated balance", body = UserBalance, content_type = "application/json"),
        (status = 400, description = "Invalid user id, amount or body"),
        (status = 404, description = "User has no point history"),
        (status = 422, description = "Balance would exceed the cap"),
        (status = 503, description = "User lock busy")
    ),
    tag = "Point"
)]
pub async fn charge(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    body: Result<Json<i64>, JsonRejection>,
) -> ApiResult<UserBalance> {
    let user_id = validate_user_id(id)?;
    let Json(amount) = body?;
    let amount = validate_amount(amount)?;
    tracing::info!(user_id, amount, "Charge request");
    ok(state.ledger.charge(user_id, amount).await?)
}

/// Use points
///
/// PATCH /point/{id}/use
#[utoipa::path(
    patch,
    path = "/point/{id}/use",
    params(("id" = i64, Path, description = "User id (>= 1)")),
    request_body(content = i64, description = "Amount to use (>= 0)", content_type = "application/json"),
    responses(
        (status = 200, description = "Updated balance", body = UserBalance, content_type = "application/json"),
        (status = 400, description = "Invalid user id, amount or body"),
        (status = 404, description = "User has no point history"),
        (status = 422, description = "Insufficient points"),
        (status = 503, description = "User lock busy")
    ),
    tag = "Point"
)]
pub async fn use_points(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    body: Result<Json<i64>, JsonRejection>,
) -> ApiResult<UserBalance> {
    let user_id = validate_user_id(id)?;
    let Json(amount) = body?;
    let amount = validate_amount(amount)?;
    tracing::info!(user_id, amount, "Use request");
    ok(state.ledger.use_points(user_id, amount).await?)
}
