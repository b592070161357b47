// handlers/protected/auth.rs - User profile endpoints

use axum::{
    extract::{Path, State},
    response::Response,
};

use crate::error::ApiError;
use crate::handlers::{params::require_id, AppState};
use crate::middleware::{ForwardedAuth, RawBody};
use crate::proxy::{Forward, Relay};

/// PUT /api/auth/update/id/:id - update a user profile, body passed through untouched
pub async fn update_user(
    State(state): State<AppState>,
    auth: ForwardedAuth,
    Path(id): Path<String>,
    body: RawBody,
) -> Result<Response, ApiError> {
    let id = require_id(&id)?;
    let forward = Forward::put(["auth", "update", "id", id])
        .auth(auth)
        .raw(body.content_type, body.body);
    state.proxy.relay(forward, Relay::Negotiate).await
}

/// GET /api/auth/user/id/:id
pub async fn get_user(
    State(state): State<AppState>,
    auth: ForwardedAuth,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let id = require_id(&id)?;
    let forward = Forward::get(["auth", "user", "id", id]).auth(auth);
    state.proxy.relay(forward, Relay::Negotiate).await
}
