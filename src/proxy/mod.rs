//! Same-origin forwarding to the requisition backend.
//!
//! Every proxy route is the same operation with different parameters: build
//! the backend URL from encoded path segments, copy the caller's bearer
//! credential, send the body through untouched, then relay the answer with
//! one of the [`Relay`] modes. Nothing is retried or cached.

pub mod encode;
pub mod relay;

use std::time::Duration;

use axum::{
    http::{header, HeaderValue, Method},
    response::Response,
};
use bytes::Bytes;
use serde_json::Value;
use thiserror::Error;

use crate::config::BackendConfig;
use crate::error::ApiError;
use crate::middleware::ForwardedAuth;

pub use relay::{Relay, Upstream};

#[derive(Debug, Error)]
pub enum ProxySetupError {
    #[error("Invalid backend URL '{0}': {1}")]
    InvalidBaseUrl(String, url::ParseError),

    #[error("Backend URL must be http or https: {0}")]
    UnsupportedScheme(String),

    #[error("Failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

/// Body sent to the backend, exactly as received
#[derive(Debug, Clone)]
pub enum ForwardBody {
    Empty,
    Json(Value),
    Raw { content_type: HeaderValue, body: Bytes },
}

/// One backend call: method, resource path, query and credentials
#[derive(Debug, Clone)]
pub struct Forward {
    method: Method,
    segments: Vec<String>,
    query: Vec<(String, String)>,
    auth: ForwardedAuth,
    body: ForwardBody,
}

impl Forward {
    pub fn new<I, S>(method: Method, segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            method,
            segments: segments.into_iter().map(Into::into).collect(),
            query: Vec::new(),
            auth: ForwardedAuth::default(),
            body: ForwardBody::Empty,
        }
    }

    pub fn get<I: IntoIterator<Item = S>, S: Into<String>>(segments: I) -> Self {
        Self::new(Method::GET, segments)
    }

    pub fn post<I: IntoIterator<Item = S>, S: Into<String>>(segments: I) -> Self {
        Self::new(Method::POST, segments)
    }

    pub fn put<I: IntoIterator<Item = S>, S: Into<String>>(segments: I) -> Self {
        Self::new(Method::PUT, segments)
    }

    pub fn delete<I: IntoIterator<Item = S>, S: Into<String>>(segments: I) -> Self {
        Self::new(Method::DELETE, segments)
    }

    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    pub fn auth(mut self, auth: ForwardedAuth) -> Self {
        self.auth = auth;
        self
    }

    pub fn json(mut self, value: Value) -> Self {
        self.body = ForwardBody::Json(value);
        self
    }

    pub fn raw(mut self, content_type: HeaderValue, body: Bytes) -> Self {
        self.body = ForwardBody::Raw { content_type, body };
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Path and query relative to the backend prefix
    pub fn target(&self) -> String {
        let path = encode::encode_path(&self.segments);
        let query = encode::encode_query(&self.query);
        if query.is_empty() {
            path
        } else {
            format!("{}?{}", path, query)
        }
    }
}

/// Shared HTTP client bound to one backend base URL
#[derive(Debug, Clone)]
pub struct ProxyClient {
    http: reqwest::Client,
    base_url: String,
    api_prefix: String,
}

impl ProxyClient {
    pub fn new(config: &BackendConfig) -> Result<Self, ProxySetupError> {
        let base_url = config.base_url.trim_end_matches('/').to_string();
        let parsed = url::Url::parse(&base_url)
            .map_err(|e| ProxySetupError::InvalidBaseUrl(base_url.clone(), e))?;
        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return Err(ProxySetupError::UnsupportedScheme(base_url));
        }

        let mut builder = reqwest::Client::builder();
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }

        Ok(Self {
            http: builder.build()?,
            base_url,
            api_prefix: config.api_prefix.clone(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn url_for(&self, forward: &Forward) -> String {
        format!("{}{}{}", self.base_url, self.api_prefix, forward.target())
    }

    /// Send the request and read the whole response.
    ///
    /// Transport failures of any kind become the fixed `502 Proxy error`.
    pub async fn send(&self, forward: Forward) -> Result<Upstream, ApiError> {
        let url = self.url_for(&forward);
        tracing::debug!(method = %forward.method, %url, "Forwarding to backend");

        let mut request = self
            .http
            .request(forward.method.clone(), &url)
            .header(header::ACCEPT, "*/*");

        if let Some(value) = forward.auth.into_header() {
            request = request.header(header::AUTHORIZATION, value);
        }

        request = match forward.body {
            ForwardBody::Empty => request,
            ForwardBody::Json(value) => request.json(&value),
            ForwardBody::Raw { content_type, body } => {
                request.header(header::CONTENT_TYPE, content_type).body(body)
            }
        };

        let response = request.send().await?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await?;

        tracing::debug!(%status, bytes = body.len(), "Backend responded");
        Ok(Upstream { status, headers, body })
    }

    /// Send and re-emit the backend response in the given mode
    pub async fn relay(&self, forward: Forward, relay: Relay) -> Result<Response, ApiError> {
        self.send(forward).await?.into_response(relay)
    }
}
