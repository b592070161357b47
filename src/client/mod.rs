//! Typed access to the gateway's proxy surface.
//!
//! [`RequisitionApi`] is the seam the workflow runs against. [`HttpClient`]
//! implements it over HTTP for the CLI and integration tests; unit tests
//! substitute an in-memory fake.

mod http;

pub use http::{HttpClient, HttpClientBuilder};

use async_trait::async_trait;
use bytes::Bytes;
use serde_json::Value;
use thiserror::Error;

use crate::workflow::model::{Approval, AttachmentPage, Requisition};
use crate::workflow::submission::Mutation;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Network error: {0}")]
    Network(String),

    /// Non-2xx answer; displays as the backend's body text
    #[error("{}", rejected_message(.status, .body))]
    Rejected { status: u16, body: String },

    /// A local precondition failed before any request was sent
    #[error("{0}")]
    MissingPrecondition(String),

    /// An outgoing upload that could not be built
    #[error("Invalid upload: {0}")]
    InvalidUpload(String),

    #[error("Unexpected response: {0}")]
    Decode(String),

    #[error("Request cancelled")]
    Cancelled,

    #[error("Configuration error: {0}")]
    Configuration(String),
}

fn rejected_message(status: &u16, body: &str) -> String {
    if body.trim().is_empty() {
        format!("Request failed with status {}", status)
    } else {
        body.to_string()
    }
}

impl ClientError {
    pub fn missing(what: impl Into<String>) -> Self {
        ClientError::MissingPrecondition(what.into())
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Rejected { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        ClientError::Network(err.to_string())
    }
}

/// A file to send as one `files` (or `file`) multipart part
#[derive(Debug, Clone)]
pub struct UploadFile {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

/// A downloaded attachment with whatever naming the backend supplied
#[derive(Debug, Clone)]
pub struct Download {
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

#[async_trait]
pub trait RequisitionApi: Send + Sync {
    /// Raw authenticate response; see [`crate::session::Session::from_auth_response`]
    async fn authenticate(&self, email: &str, password: &str) -> Result<Value, ClientError>;
    async fn user(&self, id: &str) -> Result<Value, ClientError>;
    async fn update_user(&self, id: &str, body: &Value) -> Result<Value, ClientError>;

    async fn requisition(&self, id: &str) -> Result<Requisition, ClientError>;
    async fn requisitions_by_status(&self, status: &str) -> Result<Vec<Requisition>, ClientError>;
    async fn approval(&self, id: &str) -> Result<Approval, ClientError>;
    async fn approvals_by_status(&self, status: &str) -> Result<Vec<Approval>, ClientError>;

    /// Send one planned state change
    async fn apply(&self, mutation: &Mutation) -> Result<Value, ClientError>;

    /// `page` is zero-based
    async fn attachments(&self, requisition_id: &str, page: u32, size: u32) -> Result<AttachmentPage, ClientError>;
    async fn upload_attachments(&self, requisition_id: &str, files: Vec<UploadFile>) -> Result<Value, ClientError>;
    async fn rename_attachment(&self, id: &str, file_name: &str) -> Result<Value, ClientError>;
    async fn delete_attachment(&self, id: &str) -> Result<(), ClientError>;
    async fn download_attachment(&self, id: &str) -> Result<Download, ClientError>;

    /// Stored signature path for a user, as plain text
    async fn signature_path(&self, email: &str) -> Result<String, ClientError>;
    async fn signature_file(&self, id: &str) -> Result<Bytes, ClientError>;
    async fn upload_signature(&self, email: &str, file: UploadFile) -> Result<Value, ClientError>;
    async fn update_signature(&self, email: &str, file: UploadFile) -> Result<Value, ClientError>;
    async fn delete_signature(&self, id: &str) -> Result<(), ClientError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejection_displays_backend_text() {
        let err = ClientError::Rejected {
            status: 409,
            body: "Approval already closed".into(),
        };
        assert_eq!(err.to_string(), "Approval already closed");
        assert_eq!(err.status(), Some(409));
    }

    #[test]
    fn empty_rejection_mentions_status() {
        let err = ClientError::Rejected { status: 500, body: " ".into() };
        assert_eq!(err.to_string(), "Request failed with status 500");
    }
}
