// handlers/protected/requisitions.rs - Requisition endpoints

use axum::{
    extract::{Path, Query, State},
    response::Response,
};

use crate::error::ApiError;
use crate::handlers::{
    params::{require_id, require_status, StatusQuery},
    AppState,
};
use crate::middleware::{ForwardedAuth, JsonBody, MultipartBody};
use crate::proxy::{Forward, Relay};

/// POST /api/requisitions/create
pub async fn create(
    State(state): State<AppState>,
    auth: ForwardedAuth,
    JsonBody(body): JsonBody,
) -> Result<Response, ApiError> {
    let forward = Forward::post(["requisitions", "create"]).auth(auth).json(body);
    state.proxy.relay(forward, Relay::Json).await
}

/// GET /api/requisitions/by-status?status=
pub async fn by_status_query(
    State(state): State<AppState>,
    auth: ForwardedAuth,
    Query(query): Query<StatusQuery>,
) -> Result<Response, ApiError> {
    let status = require_status(query.status.as_deref())?;
    list_by_status(&state, auth, status).await
}

/// GET /api/requisitions/by-status/:status
pub async fn by_status_path(
    State(state): State<AppState>,
    auth: ForwardedAuth,
    Path(status): Path<String>,
) -> Result<Response, ApiError> {
    let status = require_status(Some(&status))?;
    list_by_status(&state, auth, status).await
}

async fn list_by_status(state: &AppState, auth: ForwardedAuth, status: &str) -> Result<Response, ApiError> {
    let forward = Forward::get(["requisitions", "by-status", status]).auth(auth);
    state.proxy.relay(forward, Relay::Negotiate).await
}

/// GET /api/requisitions/:id
pub async fn find(
    State(state): State<AppState>,
    auth: ForwardedAuth,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let id = require_id(&id)?;
    let forward = Forward::get(["requisitions", "find", id]).auth(auth);
    state.proxy.relay(forward, Relay::Negotiate).await
}

/// PUT /api/requisitions/:id/update - full-document replace
pub async fn update(
    State(state): State<AppState>,
    auth: ForwardedAuth,
    Path(id): Path<String>,
    JsonBody(body): JsonBody,
) -> Result<Response, ApiError> {
    let id = require_id(&id)?;
    let forward = Forward::put(["requisitions", "update", id]).auth(auth).json(body);
    state.proxy.relay(forward, Relay::Negotiate).await
}

/// POST /api/requisitions/:id/approval - open or advance the approval record
pub async fn approval(
    State(state): State<AppState>,
    auth: ForwardedAuth,
    Path(id): Path<String>,
    JsonBody(body): JsonBody,
) -> Result<Response, ApiError> {
    let id = require_id(&id)?;
    let forward = Forward::post(["requisitions", id, "approval"]).auth(auth).json(body);
    state.proxy.relay(forward, Relay::Negotiate).await
}

/// POST /api/requisitions/:id/upload - attach files to a requisition
pub async fn upload(
    State(state): State<AppState>,
    auth: ForwardedAuth,
    Path(id): Path<String>,
    body: MultipartBody,
) -> Result<Response, ApiError> {
    let id = require_id(&id)?;
    let forward = Forward::post(["attachments", "requisition", id, "upload"])
        .auth(auth)
        .raw(body.content_type, body.body);
    state.proxy.relay(forward, Relay::Negotiate).await
}
