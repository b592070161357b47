//! Paged attachment listing for one requisition.
//!
//! Pages are 1-based here and zero-based on the wire. Every change reloads
//! the page the user is looking at.

use serde::Serialize;

use super::model::{Attachment, RecordId};
use super::WorkflowError;
use crate::client::{RequisitionApi, UploadFile};

pub const DEFAULT_PAGE_SIZE: u32 = 10;

#[derive(Debug, Clone, Serialize)]
pub struct AttachmentBrowser {
    requisition_id: RecordId,
    page: u32,
    size: u32,
    total_pages: u32,
    rows: Vec<Attachment>,
}

impl AttachmentBrowser {
    pub fn new(requisition_id: impl Into<RecordId>) -> Self {
        Self {
            requisition_id: requisition_id.into(),
            page: 1,
            size: DEFAULT_PAGE_SIZE,
            total_pages: 1,
            rows: Vec::new(),
        }
    }

    pub fn with_size(mut self, size: u32) -> Self {
        self.size = size.max(1);
        self
    }

    pub fn requisition_id(&self) -> &RecordId {
        &self.requisition_id
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn total_pages(&self) -> u32 {
        self.total_pages
    }

    pub fn rows(&self) -> &[Attachment] {
        &self.rows
    }

    /// Load `page` (1-based; 0 is treated as 1)
    pub async fn load(&mut self, api: &dyn RequisitionApi, page: u32) -> Result<(), WorkflowError> {
        let page = page.max(1);
        let listing = api
            .attachments(self.requisition_id.as_str(), page - 1, self.size)
            .await?;
        self.page = page;
        self.total_pages = listing.total_pages();
        self.rows = listing.content;
        Ok(())
    }

    pub async fn reload(&mut self, api: &dyn RequisitionApi) -> Result<(), WorkflowError> {
        self.load(api, self.page).await
    }

    /// Returns `false` when there was nothing to send
    pub async fn upload(&mut self, api: &dyn RequisitionApi, files: Vec<UploadFile>) -> Result<bool, WorkflowError> {
        if files.is_empty() {
            return Ok(false);
        }
        api.upload_attachments(self.requisition_id.as_str(), files).await?;
        self.reload(api).await?;
        Ok(true)
    }

    /// Empty or unchanged names send nothing and return `false`
    pub async fn rename(
        &mut self,
        api: &dyn RequisitionApi,
        attachment_id: &str,
        new_name: &str,
    ) -> Result<bool, WorkflowError> {
        let new_name = new_name.trim();
        if new_name.is_empty() {
            return Ok(false);
        }
        let unchanged = self
            .rows
            .iter()
            .any(|row| row.id.as_str() == attachment_id && row.file_name == new_name);
        if unchanged {
            return Ok(false);
        }
        api.rename_attachment(attachment_id, new_name).await?;
        self.reload(api).await?;
        Ok(true)
    }

    pub async fn delete(&mut self, api: &dyn RequisitionApi, attachment_id: &str) -> Result<(), WorkflowError> {
        api.delete_attachment(attachment_id).await?;
        self.reload(api).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::testing::FakeApi;
    use serde_json::json;

    fn fake_with_page() -> FakeApi {
        FakeApi::default().with_attachments(json!({
            "content": [
                {"id": 5, "fileName": "quote.pdf", "size": 1200},
                {"id": 6, "fileName": "terms.docx"}
            ],
            "totalPages": 3,
            "number": 1,
            "size": 10
        }))
    }

    #[tokio::test]
    async fn second_page_requests_zero_based_index() {
        let api = fake_with_page();
        let mut browser = AttachmentBrowser::new("7");
        browser.load(&api, 2).await.unwrap();

        assert_eq!(api.calls(), vec!["GET attachments 7 page=1 size=10"]);
        assert_eq!(browser.page(), 2);
        assert_eq!(browser.total_pages(), 3);
        assert_eq!(browser.rows().len(), 2);
        assert_eq!(browser.rows()[0].file_name, "quote.pdf");
    }

    #[tokio::test]
    async fn missing_total_pages_means_one() {
        let api = FakeApi::default().with_attachments(json!({"content": []}));
        let mut browser = AttachmentBrowser::new("7");
        browser.load(&api, 1).await.unwrap();
        assert_eq!(browser.total_pages(), 1);
    }

    #[tokio::test]
    async fn rename_noop_cases_send_nothing() {
        let api = fake_with_page();
        let mut browser = AttachmentBrowser::new("7");
        browser.load(&api, 1).await.unwrap();

        assert!(!browser.rename(&api, "5", "  ").await.unwrap());
        assert!(!browser.rename(&api, "5", "quote.pdf").await.unwrap());
        assert_eq!(api.calls().len(), 1);

        assert!(browser.rename(&api, "5", "final-quote.pdf").await.unwrap());
        assert_eq!(
            api.calls(),
            vec![
                "GET attachments 7 page=0 size=10",
                "PUT rename 5 final-quote.pdf",
                "GET attachments 7 page=0 size=10",
            ]
        );
    }

    #[tokio::test]
    async fn empty_upload_sends_nothing() {
        let api = fake_with_page();
        let mut browser = AttachmentBrowser::new("7");
        assert!(!browser.upload(&api, Vec::new()).await.unwrap());
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn delete_reloads_current_page() {
        let api = fake_with_page();
        let mut browser = AttachmentBrowser::new("7");
        browser.load(&api, 2).await.unwrap();
        browser.delete(&api, "6").await.unwrap();
        assert_eq!(
            api.calls(),
            vec![
                "GET attachments 7 page=1 size=10",
                "DELETE attachment 6",
                "GET attachments 7 page=1 size=10",
            ]
        );
    }
}
