use axum::{
    extract::{FromRequest, Request},
    http::{header, HeaderValue},
    response::{IntoResponse, Response},
};
use bytes::Bytes;
use serde_json::{json, Value};

use crate::error::ApiError;

/// A JSON request body. Empty input is `{}`; anything unparseable is a 400.
#[derive(Debug, Clone)]
pub struct JsonBody(pub Value);

/// Body bytes with the caller's content type, defaulting to JSON
#[derive(Debug, Clone)]
pub struct RawBody {
    pub content_type: HeaderValue,
    pub body: Bytes,
}

/// A `multipart/*` body kept whole so its boundary survives forwarding
#[derive(Debug, Clone)]
pub struct MultipartBody {
    pub content_type: HeaderValue,
    pub body: Bytes,
}

pub fn parse_json_body(bytes: &[u8]) -> Result<Value, ApiError> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(json!({}));
    }
    serde_json::from_slice(bytes).map_err(|e| {
        tracing::debug!("Rejecting request body: {}", e);
        ApiError::invalid_json("Invalid JSON body")
    })
}

fn content_type_of(req: &Request) -> Option<HeaderValue> {
    req.headers()
        .get(header::CONTENT_TYPE)
        .filter(|v| !v.is_empty())
        .cloned()
}

async fn read_bytes<S: Send + Sync>(req: Request, state: &S) -> Result<Bytes, Response> {
    Bytes::from_request(req, state)
        .await
        .map_err(IntoResponse::into_response)
}

#[axum::async_trait]
impl<S> FromRequest<S> for JsonBody
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = read_bytes(req, state).await?;
        parse_json_body(&bytes)
            .map(JsonBody)
            .map_err(IntoResponse::into_response)
    }
}

#[axum::async_trait]
impl<S> FromRequest<S> for RawBody
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let content_type = content_type_of(&req)
            .unwrap_or_else(|| HeaderValue::from_static("application/json"));
        let body = read_bytes(req, state).await?;
        Ok(RawBody { content_type, body })
    }
}

#[axum::async_trait]
impl<S> FromRequest<S> for MultipartBody
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let content_type = content_type_of(&req)
            .filter(|ct| {
                ct.to_str()
                    .map(|s| s.to_ascii_lowercase().starts_with("multipart/"))
                    .unwrap_or(false)
            })
            .ok_or_else(|| ApiError::bad_request("Expected multipart form data").into_response())?;
        let body = read_bytes(req, state).await?;
        Ok(MultipartBody { content_type, body })
    }
}
