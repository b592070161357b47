// handlers/protected/attachments.rs - Attachment endpoints

use axum::{
    extract::{Path, Query, State},
    response::Response,
};

use crate::error::ApiError;
use crate::handlers::{
    params::{require_id, PageQuery},
    AppState,
};
use crate::middleware::{ForwardedAuth, JsonBody, MultipartBody};
use crate::proxy::{Forward, Relay};

/// GET /api/attachments/requisition/:id?page=0&size=10 - zero-based page
pub async fn list_for_requisition(
    State(state): State<AppState>,
    auth: ForwardedAuth,
    Path(id): Path<String>,
    Query(query): Query<PageQuery>,
) -> Result<Response, ApiError> {
    let id = require_id(&id)?;
    let forward = Forward::get(["attachments", "requisition", id])
        .query("page", query.page()?.to_string())
        .query("size", query.size()?.to_string())
        .auth(auth);
    state.proxy.relay(forward, Relay::Negotiate).await
}

/// POST /api/attachments/:id/upload - `:id` is the requisition
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

/// PUT /api/attachments/:id/rename
pub async fn rename(
    State(state): State<AppState>,
    auth: ForwardedAuth,
    Path(id): Path<String>,
    JsonBody(body): JsonBody,
) -> Result<Response, ApiError> {
    let id = require_id(&id)?;
    let forward = Forward::put(["attachments", id, "rename"]).auth(auth).json(body);
    state.proxy.relay(forward, Relay::Negotiate).await
}

/// DELETE /api/attachments/:id
pub async fn delete(
    State(state): State<AppState>,
    auth: ForwardedAuth,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let id = require_id(&id)?;
    let forward = Forward::delete(["attachments", id]).auth(auth);
    state.proxy.relay(forward, Relay::Negotiate).await
}

/// GET /api/attachments/:id/download - relays Content-Disposition and friends
pub async fn download(
    State(state): State<AppState>,
    auth: ForwardedAuth,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let id = require_id(&id)?;
    let forward = Forward::get(["attachments", id, "download"]).auth(auth);
    state.proxy.relay(forward, Relay::Download).await
}
