use axum::{
    body::Body,
    http::{header, HeaderMap, HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Json, Response},
};
use bytes::Bytes;
use serde_json::{json, Value};

use crate::error::ApiError;

/// How a backend response is re-emitted to the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relay {
    /// Always JSON; an unreadable body becomes `{}`
    Json,
    /// JSON when the backend says JSON and it parses, raw bytes otherwise
    Negotiate,
    /// Body verbatim as `text/plain`
    Text,
    /// Bytes plus content type only
    Binary,
    /// Bytes plus every end-to-end backend header
    Download,
}

/// A fully-read backend response
#[derive(Debug, Clone)]
pub struct Upstream {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl Upstream {
    pub fn content_type(&self) -> Option<&str> {
        self.headers
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .filter(|ct| !ct.is_empty())
    }

    pub fn is_json(&self) -> bool {
        self.content_type()
            .map(|ct| ct.to_ascii_lowercase().contains("application/json"))
            .unwrap_or(false)
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn into_response(self, relay: Relay) -> Result<Response, ApiError> {
        if is_bodyless(self.status) {
            return Ok(self.status.into_response());
        }

        match relay {
            Relay::Json => {
                let value = serde_json::from_slice::<Value>(&self.body).unwrap_or_else(|_| json!({}));
                Ok((self.status, Json(value)).into_response())
            }
            Relay::Negotiate => {
                if self.is_json() {
                    if self.body.iter().all(u8::is_ascii_whitespace) {
                        return Ok((self.status, Json(json!({}))).into_response());
                    }
                    if let Ok(value) = serde_json::from_slice::<Value>(&self.body) {
                        return Ok((self.status, Json(value)).into_response());
                    }
                    tracing::debug!("Backend declared JSON but body did not parse; relaying as text");
                }
                let content_type = self.content_type().unwrap_or("text/plain").to_string();
                raw(self.status, &content_type, self.body)
            }
            Relay::Text => raw(self.status, "text/plain", self.body),
            Relay::Binary => {
                let content_type = self.content_type().unwrap_or("application/octet-stream").to_string();
                raw(self.status, &content_type, self.body)
            }
            Relay::Download => {
                let mut response = Response::new(Body::from(self.body));
                *response.status_mut() = self.status;
                let headers = response.headers_mut();
                for (name, value) in self.headers.iter() {
                    if !is_hop_by_hop(name) {
                        headers.append(name.clone(), value.clone());
                    }
                }
                Ok(response)
            }
        }
    }
}

fn raw(status: StatusCode, content_type: &str, body: Bytes) -> Result<Response, ApiError> {
    let content_type = HeaderValue::from_str(content_type)
        .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream"));
    Response::builder()
        .status(status)
        .header(header::CONTENT_TYPE, content_type)
        .body(Body::from(body))
        .map_err(|e| {
            tracing::error!("Failed to build relayed response: {}", e);
            ApiError::internal_server_error("Failed to build response")
        })
}

fn is_bodyless(status: StatusCode) -> bool {
    status == StatusCode::NO_CONTENT || status == StatusCode::NOT_MODIFIED
}

// Length is recomputed for the relayed body
fn is_hop_by_hop(name: &HeaderName) -> bool {
    matches!(
        name.as_str(),
        "connection"
            | "keep-alive"
            | "proxy-authenticate"
            | "proxy-authorization"
            | "te"
            | "trailer"
            | "transfer-encoding"
            | "upgrade"
            | "content-length"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upstream(status: u16, content_type: Option<&str>, body: &'static [u8]) -> Upstream {
        let mut headers = HeaderMap::new();
        if let Some(ct) = content_type {
            headers.insert(header::CONTENT_TYPE, HeaderValue::from_str(ct).unwrap());
        }
        Upstream {
            status: StatusCode::from_u16(status).unwrap(),
            headers,
            body: Bytes::from_static(body),
        }
    }

    async fn body_of(response: Response) -> Bytes {
        axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap()
    }

    #[tokio::test]
    async fn negotiate_reemits_json_with_status() {
        let up = upstream(201, Some("application/json;charset=UTF-8"), br#"{"id":5}"#);
        let response = up.into_response(Relay::Negotiate).unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let value: Value = serde_json::from_slice(&body_of(response).await).unwrap();
        assert_eq!(value, json!({"id": 5}));
    }

    #[tokio::test]
    async fn negotiate_falls_back_to_text_on_bad_json() {
        let up = upstream(500, Some("application/json"), b"not json");
        let response = up.into_response(Relay::Negotiate).unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(&body_of(response).await[..], b"not json");
    }

    #[tokio::test]
    async fn negotiate_defaults_to_text_plain() {
        let up = upstream(409, None, b"already approved");
        let response = up.into_response(Relay::Negotiate).unwrap();
        assert_eq!(response.headers()[header::CONTENT_TYPE], "text/plain");
    }

    #[tokio::test]
    async fn json_mode_swallows_unreadable_body() {
        let up = upstream(401, Some("text/html"), b"<html>");
        let response = up.into_response(Relay::Json).unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let value: Value = serde_json::from_slice(&body_of(response).await).unwrap();
        assert_eq!(value, json!({}));
    }

    #[tokio::test]
    async fn binary_defaults_content_type() {
        let up = upstream(200, None, &[0x89, b'P', b'N', b'G']);
        let response = up.into_response(Relay::Binary).unwrap();
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/octet-stream");
        assert_eq!(&body_of(response).await[..], &[0x89, b'P', b'N', b'G']);
    }

    #[tokio::test]
    async fn download_keeps_disposition_and_drops_hop_by_hop() {
        let mut up = upstream(200, Some("application/pdf"), b"%PDF");
        up.headers.insert(
            header::CONTENT_DISPOSITION,
            HeaderValue::from_static("attachment; filename=\"terms.pdf\""),
        );
        up.headers.insert(header::TRANSFER_ENCODING, HeaderValue::from_static("chunked"));
        let response = up.into_response(Relay::Download).unwrap();
        assert_eq!(response.headers()[header::CONTENT_DISPOSITION], "attachment; filename=\"terms.pdf\"");
        assert!(response.headers().get(header::TRANSFER_ENCODING).is_none());
    }

    #[tokio::test]
    async fn no_content_has_no_body() {
        let up = upstream(204, Some("application/json"), b"");
        let response = up.into_response(Relay::Negotiate).unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert!(body_of(response).await.is_empty());
    }
}
