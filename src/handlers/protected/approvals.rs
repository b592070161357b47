// handlers/protected/approvals.rs - Department approval endpoints

use axum::{
    extract::{Path, Query, State},
    response::Response,
};

use crate::error::ApiError;
use crate::handlers::{
    params::{require_id, require_status, StatusQuery},
    AppState,
};
use crate::middleware::{ForwardedAuth, JsonBody};
use crate::proxy::{Forward, Relay};

/// POST /api/approvals/create
pub async fn create(
    State(state): State<AppState>,
    auth: ForwardedAuth,
    JsonBody(body): JsonBody,
) -> Result<Response, ApiError> {
    let forward = Forward::post(["approvals", "create"]).auth(auth).json(body);
    state.proxy.relay(forward, Relay::Negotiate).await
}

/// GET /api/approvals/by-status?status=
pub async fn by_status_query(
    State(state): State<AppState>,
    auth: ForwardedAuth,
    Query(query): Query<StatusQuery>,
) -> Result<Response, ApiError> {
    let status = require_status(query.status.as_deref())?;
    let forward = Forward::get(["approvals", "by-status", status]).auth(auth);
    state.proxy.relay(forward, Relay::Negotiate).await
}

/// GET /api/approvals/by-status/:status
pub async fn by_status_path(
    State(state): State<AppState>,
    auth: ForwardedAuth,
    Path(status): Path<String>,
) -> Result<Response, ApiError> {
    let status = require_status(Some(&status))?;
    let forward = Forward::get(["approvals", "by-status", status]).auth(auth);
    state.proxy.relay(forward, Relay::Negotiate).await
}

/// GET /api/approvals/:id
pub async fn find(
    State(state): State<AppState>,
    auth: ForwardedAuth,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let id = require_id(&id)?;
    let forward = Forward::get(["approvals", "find", id]).auth(auth);
    state.proxy.relay(forward, Relay::Negotiate).await
}

/// PUT /api/approvals/:id/update - full-record replace
pub async fn update(
    State(state): State<AppState>,
    auth: ForwardedAuth,
    Path(id): Path<String>,
    JsonBody(body): JsonBody,
) -> Result<Response, ApiError> {
    let id = require_id(&id)?;
    let forward = Forward::put(["approvals", "update", id]).auth(auth).json(body);
    state.proxy.relay(forward, Relay::Negotiate).await
}
