use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{header, multipart, Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};

use super::{ClientError, Download, RequisitionApi, UploadFile};
use crate::middleware::ForwardedAuth;
use crate::proxy::encode::{encode_path, encode_query};
use crate::workflow::model::{Approval, AttachmentPage, Listing, Requisition};
use crate::workflow::submission::Mutation;

#[derive(Debug)]
pub struct HttpClientBuilder {
    base_url: String,
    timeout: Option<Duration>,
    token: Option<String>,
}

impl HttpClientBuilder {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim().trim_end_matches('/').to_string(),
            timeout: None,
            token: None,
        }
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn build(self) -> Result<HttpClient, ClientError> {
        url::Url::parse(&self.base_url)
            .map_err(|e| ClientError::Configuration(format!("invalid server URL '{}': {}", self.base_url, e)))?;

        let mut builder = Client::builder();
        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| ClientError::Configuration(e.to_string()))?;

        Ok(HttpClient {
            client,
            base_url: self.base_url,
            auth: self.token.as_deref().map(ForwardedAuth::bearer).unwrap_or_default(),
        })
    }
}

/// [`RequisitionApi`] over HTTP against a running gateway
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    base_url: String,
    auth: ForwardedAuth,
}

impl HttpClient {
    pub fn builder(base_url: impl Into<String>) -> HttpClientBuilder {
        HttpClientBuilder::new(base_url)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn has_token(&self) -> bool {
        self.auth.is_present()
    }

    fn url(&self, segments: &[&str]) -> String {
        format!("{}{}", self.base_url, encode_path(segments))
    }

    fn request(&self, method: Method, url: String) -> RequestBuilder {
        let req = self.client.request(method, url).header(header::ACCEPT, "*/*");
        match self.auth.clone().into_header() {
            Some(value) => req.header(header::AUTHORIZATION, value),
            None => req,
        }
    }

    /// Send and turn any non-2xx status into [`ClientError::Rejected`]
    async fn execute(&self, req: RequestBuilder) -> Result<Response, ClientError> {
        let response = req.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        tracing::debug!(%status, "Request rejected");
        Err(ClientError::Rejected {
            status: status.as_u16(),
            body,
        })
    }

    async fn json<T: DeserializeOwned>(&self, req: RequestBuilder) -> Result<T, ClientError> {
        let text = self.execute(req).await?.text().await?;
        serde_json::from_str(&text).map_err(|e| ClientError::Decode(e.to_string()))
    }

    /// Body as JSON when it parses, as a string otherwise, null when empty
    async fn loose(&self, req: RequestBuilder) -> Result<Value, ClientError> {
        let text = self.execute(req).await?.text().await?;
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&text).unwrap_or(Value::String(text)))
    }

    async fn get_json<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<T, ClientError> {
        self.json(self.request(Method::GET, self.url(segments))).await
    }
}

fn part(file: UploadFile) -> Result<multipart::Part, ClientError> {
    let part = multipart::Part::bytes(file.bytes.to_vec()).file_name(file.file_name);
    match file.content_type {
        Some(ct) => part
            .mime_str(&ct)
            .map_err(|e| ClientError::InvalidUpload(format!("content type '{}': {}", ct, e))),
        None => Ok(part),
    }
}

/// `filename` from a Content-Disposition header
fn disposition_file_name(value: &str) -> Option<String> {
    value.split(';').map(str::trim).find_map(|param| {
        let (key, val) = param.split_once('=')?;
        if key.trim().eq_ignore_ascii_case("filename") {
            Some(val.trim().trim_matches('"').to_string()).filter(|s| !s.is_empty())
        } else {
            None
        }
    })
}

#[async_trait]
impl RequisitionApi for HttpClient {
    async fn authenticate(&self, email: &str, password: &str) -> Result<Value, ClientError> {
        let req = self
            .request(Method::POST, self.url(&["api", "auth", "authenticate"]))
            .json(&json!({ "email": email, "password": password }));
        self.loose(req).await
    }

    async fn user(&self, id: &str) -> Result<Value, ClientError> {
        self.get_json(&["api", "auth", "user", "id", id]).await
    }

    async fn update_user(&self, id: &str, body: &Value) -> Result<Value, ClientError> {
        let req = self
            .request(Method::PUT, self.url(&["api", "auth", "update", "id", id]))
            .json(body);
        self.loose(req).await
    }

    async fn requisition(&self, id: &str) -> Result<Requisition, ClientError> {
        self.get_json(&["api", "requisitions", id]).await
    }

    async fn requisitions_by_status(&self, status: &str) -> Result<Vec<Requisition>, ClientError> {
        let listing: Listing<Requisition> = self.get_json(&["api", "requisitions", "by-status", status]).await?;
        Ok(listing.into_items())
    }

    async fn approval(&self, id: &str) -> Result<Approval, ClientError> {
        self.get_json(&["api", "approvals", id]).await
    }

    async fn approvals_by_status(&self, status: &str) -> Result<Vec<Approval>, ClientError> {
        let listing: Listing<Approval> = self.get_json(&["api", "approvals", "by-status", status]).await?;
        Ok(listing.into_items())
    }

    async fn apply(&self, mutation: &Mutation) -> Result<Value, ClientError> {
        tracing::debug!(method = %mutation.method, path = %mutation.path, "Applying mutation");
        let url = format!("{}{}", self.base_url, mutation.path);
        let req = self.request(mutation.method.clone(), url).json(&mutation.body);
        self.loose(req).await
    }

    async fn attachments(&self, requisition_id: &str, page: u32, size: u32) -> Result<AttachmentPage, ClientError> {
        let url = format!(
            "{}?{}",
            self.url(&["api", "attachments", "requisition", requisition_id]),
            encode_query(&[("page", page.to_string()), ("size", size.to_string())])
        );
        self.json(self.request(Method::GET, url)).await
    }

    async fn upload_attachments(&self, requisition_id: &str, files: Vec<UploadFile>) -> Result<Value, ClientError> {
        let mut form = multipart::Form::new();
        for file in files {
            form = form.part("files", part(file)?);
        }
        let req = self
            .request(Method::POST, self.url(&["api", "requisitions", requisition_id, "upload"]))
            .multipart(form);
        self.loose(req).await
    }

    async fn rename_attachment(&self, id: &str, file_name: &str) -> Result<Value, ClientError> {
        let req = self
            .request(Method::PUT, self.url(&["api", "attachments", id, "rename"]))
            .json(&json!({ "fileName": file_name }));
        self.loose(req).await
    }

    async fn delete_attachment(&self, id: &str) -> Result<(), ClientError> {
        self.execute(self.request(Method::DELETE, self.url(&["api", "attachments", id])))
            .await?;
        Ok(())
    }

    async fn download_attachment(&self, id: &str) -> Result<Download, ClientError> {
        let response = self
            .execute(self.request(Method::GET, self.url(&["api", "attachments", id, "download"])))
            .await?;
        let header_str = |name: header::HeaderName| {
            response
                .headers()
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };
        let file_name = header_str(header::CONTENT_DISPOSITION).and_then(|v| disposition_file_name(&v));
        let content_type = header_str(header::CONTENT_TYPE);
        let bytes = response.bytes().await?;
        Ok(Download {
            file_name,
            content_type,
            bytes,
        })
    }

    async fn signature_path(&self, email: &str) -> Result<String, ClientError> {
        let url = format!(
            "{}?{}",
            self.url(&["api", "signature", "user", "email"]),
            encode_query(&[("email", email)])
        );
        let text = self.execute(self.request(Method::GET, url)).await?.text().await?;
        Ok(text.trim().to_string())
    }

    async fn signature_file(&self, id: &str) -> Result<Bytes, ClientError> {
        let response = self
            .execute(self.request(Method::GET, self.url(&["api", "signature", "file", id])))
            .await?;
        Ok(response.bytes().await?)
    }

    async fn upload_signature(&self, email: &str, file: UploadFile) -> Result<Value, ClientError> {
        let form = multipart::Form::new().part("file", part(file)?);
        let req = self
            .request(Method::POST, self.url(&["api", "signature", "upload", email]))
            .multipart(form);
        self.loose(req).await
    }

    async fn update_signature(&self, email: &str, file: UploadFile) -> Result<Value, ClientError> {
        let form = multipart::Form::new().part("file", part(file)?);
        let req = self
            .request(Method::PUT, self.url(&["api", "signature", "update", email]))
            .multipart(form);
        self.loose(req).await
    }

    async fn delete_signature(&self, id: &str) -> Result<(), ClientError> {
        self.execute(self.request(Method::DELETE, self.url(&["api", "signature", id])))
            .await?;
        Ok(())
    }
}
