// handlers/protected/signature.rs - Signature image endpoints

use axum::{
    extract::{Path, Query, State},
    http::header,
    response::{IntoResponse, Response},
};

use crate::error::ApiError;
use crate::handlers::{
    params::{require_email, require_id, EmailQuery},
    AppState,
};
use crate::middleware::{ForwardedAuth, MultipartBody};
use crate::proxy::{Forward, Relay};
use crate::signature;

/// GET /api/signature/user/email?email= - the stored signature path, as plain text
pub async fn by_email(
    State(state): State<AppState>,
    auth: ForwardedAuth,
    Query(query): Query<EmailQuery>,
) -> Result<Response, ApiError> {
    let email = require_email(query.email.as_deref())?;
    let forward = Forward::get(["signature", "user", "email", email]).auth(auth);
    state.proxy.relay(forward, Relay::Text).await
}

/// GET /api/signature/file/:id - image bytes exactly as stored
pub async fn file(
    State(state): State<AppState>,
    auth: ForwardedAuth,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let id = require_id(&id)?;
    let forward = Forward::get(["signature", "file", id]).auth(auth);
    state.proxy.relay(forward, Relay::Binary).await
}

/// GET /api/signature/file/:id/normalized - whitened PNG.
///
/// Anything that is not a decodable image, including backend errors, is
/// relayed as the plain binary response would be.
pub async fn file_normalized(
    State(state): State<AppState>,
    auth: ForwardedAuth,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let id = require_id(&id)?;
    let upstream = state
        .proxy
        .send(Forward::get(["signature", "file", id]).auth(auth))
        .await?;

    if !upstream.status.is_success() {
        return upstream.into_response(Relay::Binary);
    }

    match signature::normalize(&upstream.body) {
        Ok(png) => Ok(([(header::CONTENT_TYPE, "image/png")], png).into_response()),
        Err(e) => {
            tracing::debug!(signature_id = %id, "Relaying original signature: {}", e);
            upstream.into_response(Relay::Binary)
        }
    }
}

/// POST /api/signature/upload/:email
pub async fn upload(
    State(state): State<AppState>,
    auth: ForwardedAuth,
    Path(email): Path<String>,
    body: MultipartBody,
) -> Result<Response, ApiError> {
    let email = require_email(Some(&email))?;
    let forward = Forward::post(["signature", "upload", email])
        .auth(auth)
        .raw(body.content_type, body.body);
    state.proxy.relay(forward, Relay::Negotiate).await
}

/// PUT /api/signature/update/:email
pub async fn update(
    State(state): State<AppState>,
    auth: ForwardedAuth,
    Path(email): Path<String>,
    body: MultipartBody,
) -> Result<Response, ApiError> {
    let email = require_email(Some(&email))?;
    let forward = Forward::put(["signature", "update", email])
        .auth(auth)
        .raw(body.content_type, body.body);
    state.proxy.relay(forward, Relay::Negotiate).await
}

/// DELETE /api/signature/:id
pub async fn delete(
    State(state): State<AppState>,
    auth: ForwardedAuth,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let id = require_id(&id)?;
    let forward = Forward::delete(["signature", id]).auth(auth);
    state.proxy.relay(forward, Relay::Negotiate).await
}
