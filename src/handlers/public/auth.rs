// handlers/public/auth.rs - POST /api/auth/authenticate

use axum::{extract::State, response::Response};

use crate::error::ApiError;
use crate::handlers::AppState;
use crate::middleware::{ForwardedAuth, JsonBody};
use crate::proxy::{Forward, Relay};

/// POST /api/auth/authenticate - exchange credentials for an access token.
///
/// The body (`{"email","password"}`) is forwarded as-is and the backend's
/// answer is always re-emitted as JSON so the caller can read the token
/// fields, or `{}` when the backend returned something unreadable.
pub async fn authenticate(
    State(state): State<AppState>,
    auth: ForwardedAuth,
    JsonBody(body): JsonBody,
) -> Result<Response, ApiError> {
    let forward = Forward::post(["auth", "authenticate"]).auth(auth).json(body);
    state.proxy.relay(forward, Relay::Json).await
}
