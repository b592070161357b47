use std::convert::Infallible;

use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap, HeaderValue},
};

/// The caller's `Authorization` header, carried to the backend untouched.
///
/// The gateway never validates credentials; the backend is the only judge.
/// An absent or blank header is treated the same: nothing is forwarded.
#[derive(Debug, Clone, Default)]
pub struct ForwardedAuth(Option<HeaderValue>);

impl ForwardedAuth {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let value = headers
            .get(header::AUTHORIZATION)
            .filter(|v| !v.as_bytes().iter().all(u8::is_ascii_whitespace))
            .cloned();
        Self(value)
    }

    /// Build from a bearer token, e.g. one read from a stored session
    pub fn bearer(token: &str) -> Self {
        let token = token.trim();
        if token.is_empty() {
            return Self(None);
        }
        Self(HeaderValue::from_str(&format!("Bearer {}", token)).ok())
    }

    pub fn is_present(&self) -> bool {
        self.0.is_some()
    }

    /// Token part of a `Bearer` credential, if that is what was sent
    pub fn bearer_token(&self) -> Option<&str> {
        let raw = self.0.as_ref()?.to_str().ok()?;
        raw.strip_prefix("Bearer ")
            .map(str::trim)
            .filter(|token| !token.is_empty())
    }

    pub fn into_header(self) -> Option<HeaderValue> {
        self.0
    }
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for ForwardedAuth
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self::from_headers(&parts.headers))
    }
}
