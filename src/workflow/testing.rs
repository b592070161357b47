//! In-memory [`RequisitionApi`] that records every call it receives.

use std::sync::Mutex;

use async_trait::async_trait;
use bytes::Bytes;
use serde_json::Value;

use super::model::{Approval, AttachmentPage, Requisition};
use super::submission::Mutation;
use crate::client::{ClientError, Download, RequisitionApi, UploadFile};

#[derive(Default)]
pub struct FakeApi {
    calls: Mutex<Vec<String>>,
    applied: Mutex<Vec<Mutation>>,
    attachments: Option<Value>,
    requisition: Option<Value>,
    approval: Option<Value>,
    listing: Vec<Value>,
    signature_path: String,
    signature: Option<Vec<u8>>,
    reject: Option<(String, u16, String)>,
    stall: bool,
}

impl FakeApi {
    pub fn with_attachments(mut self, page: Value) -> Self {
        self.attachments = Some(page);
        self
    }

    pub fn with_requisition(mut self, record: Value) -> Self {
        self.requisition = Some(record);
        self
    }

    pub fn with_approval(mut self, record: Value) -> Self {
        self.approval = Some(record);
        self
    }

    pub fn with_listing(mut self, items: Vec<Value>) -> Self {
        self.listing = items;
        self
    }

    pub fn with_signature(mut self, path: &str, image: Option<Vec<u8>>) -> Self {
        self.signature_path = path.to_string();
        self.signature = image;
        self
    }

    /// Answer mutations on `path` with a non-2xx status
    pub fn rejecting(mut self, path: &str, status: u16, body: &str) -> Self {
        self.reject = Some((path.to_string(), status, body.to_string()));
        self
    }

    /// Mutations never complete
    pub fn stalling(mut self) -> Self {
        self.stall = true;
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn applied(&self) -> Vec<Mutation> {
        self.applied.lock().unwrap().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    fn decode<T: serde::de::DeserializeOwned>(value: &Option<Value>) -> Result<T, ClientError> {
        match value {
            Some(v) => serde_json::from_value(v.clone()).map_err(|e| ClientError::Decode(e.to_string())),
            None => Err(ClientError::Rejected {
                status: 404,
                body: "Not found".into(),
            }),
        }
    }

    fn decode_listing<T: serde::de::DeserializeOwned>(&self) -> Result<Vec<T>, ClientError> {
        self.listing
            .iter()
            .map(|v| serde_json::from_value(v.clone()).map_err(|e| ClientError::Decode(e.to_string())))
            .collect()
    }
}

#[async_trait]
impl RequisitionApi for FakeApi {
    async fn authenticate(&self, email: &str, _password: &str) -> Result<Value, ClientError> {
        self.record(format!("POST authenticate {}", email));
        Ok(Value::Null)
    }

    async fn user(&self, id: &str) -> Result<Value, ClientError> {
        self.record(format!("GET user {}", id));
        Ok(Value::Null)
    }

    async fn update_user(&self, id: &str, _body: &Value) -> Result<Value, ClientError> {
        self.record(format!("PUT user {}", id));
        Ok(Value::Null)
    }

    async fn requisition(&self, id: &str) -> Result<Requisition, ClientError> {
        self.record(format!("GET requisition {}", id));
        Self::decode(&self.requisition)
    }

    async fn requisitions_by_status(&self, status: &str) -> Result<Vec<Requisition>, ClientError> {
        self.record(format!("GET requisitions by-status {}", status));
        self.decode_listing()
    }

    async fn approval(&self, id: &str) -> Result<Approval, ClientError> {
        self.record(format!("GET approval {}", id));
        Self::decode(&self.approval)
    }

    async fn approvals_by_status(&self, status: &str) -> Result<Vec<Approval>, ClientError> {
        self.record(format!("GET approvals by-status {}", status));
        self.decode_listing()
    }

    async fn apply(&self, mutation: &Mutation) -> Result<Value, ClientError> {
        self.record(format!("{} {}", mutation.method, mutation.path));
        if self.stall {
            std::future::pending::<()>().await;
        }
        if let Some((path, status, body)) = &self.reject {
            if *path == mutation.path {
                return Err(ClientError::Rejected {
                    status: *status,
                    body: body.clone(),
                });
            }
        }
        self.applied.lock().unwrap().push(mutation.clone());
        Ok(Value::Null)
    }

    async fn attachments(&self, requisition_id: &str, page: u32, size: u32) -> Result<AttachmentPage, ClientError> {
        self.record(format!("GET attachments {} page={} size={}", requisition_id, page, size));
        Self::decode(&self.attachments)
    }

    async fn upload_attachments(&self, requisition_id: &str, files: Vec<UploadFile>) -> Result<Value, ClientError> {
        self.record(format!("POST upload {} {} files", requisition_id, files.len()));
        Ok(Value::Null)
    }

    async fn rename_attachment(&self, id: &str, file_name: &str) -> Result<Value, ClientError> {
        self.record(format!("PUT rename {} {}", id, file_name));
        Ok(Value::Null)
    }

    async fn delete_attachment(&self, id: &str) -> Result<(), ClientError> {
        self.record(format!("DELETE attachment {}", id));
        Ok(())
    }

    async fn download_attachment(&self, id: &str) -> Result<Download, ClientError> {
        self.record(format!("GET download {}", id));
        Ok(Download {
            file_name: None,
            content_type: Some("application/pdf".into()),
            bytes: Bytes::from_static(b"%PDF-1.4"),
        })
    }

    async fn signature_path(&self, email: &str) -> Result<String, ClientError> {
        self.record(format!("GET signature path {}", email));
        Ok(self.signature_path.clone())
    }

    async fn signature_file(&self, id: &str) -> Result<Bytes, ClientError> {
        self.record(format!("GET signature file {}", id));
        match &self.signature {
            Some(bytes) => Ok(Bytes::from(bytes.clone())),
            None => Err(ClientError::Rejected {
                status: 404,
                body: String::new(),
            }),
        }
    }

    async fn upload_signature(&self, email: &str, _file: UploadFile) -> Result<Value, ClientError> {
        self.record(format!("POST signature {}", email));
        Ok(Value::Null)
    }

    async fn update_signature(&self, email: &str, _file: UploadFile) -> Result<Value, ClientError> {
        self.record(format!("PUT signature {}", email));
        Ok(Value::Null)
    }

    async fn delete_signature(&self, id: &str) -> Result<(), ClientError> {
        self.record(format!("DELETE signature {}", id));
        Ok(())
    }
}
