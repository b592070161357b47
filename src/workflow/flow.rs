//! The network side of queues and decision forms.
//!
//! Every request made for a form runs under the form's cancellation token.
//! Once the form is closed, responses that arrive late are dropped. An
//! interrupted submission moves the form to an error instead of leaving it
//! `Submitting`.

use std::future::Future;

use chrono::{DateTime, Utc};
use futures::future::join_all;
use serde::Serialize;
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use super::display::{upstream_entries, UpstreamEntry};
use super::form::{DecisionForm, FormState};
use super::model::{Approval, RecordId, Requisition};
use super::queue::{sort_items, QueueItem, SortKey, SortOrder};
use super::status::{Reviewer, Source, Stage};
use super::submission::{FormRecord, Mutation, SubmissionPlan};
use super::WorkflowError;
use crate::client::{ClientError, RequisitionApi};
use crate::signature::{normalize_or_original, signature_file_id};

/// A row of a reviewer's queue, whichever record type backs it
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueRow {
    pub id: RecordId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requisition_id: Option<RecordId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

impl QueueItem for QueueRow {
    fn id(&self) -> &RecordId {
        &self.id
    }

    fn created_at(&self) -> Option<&Value> {
        self.created_at.as_ref()
    }
}

impl From<Requisition> for QueueRow {
    fn from(req: Requisition) -> Self {
        let summary = match (&req.requisition_from, &req.requisition_to) {
            (Some(from), Some(to)) => Some(format!("{} → {}", from, to)),
            (Some(one), None) | (None, Some(one)) => Some(one.clone()),
            (None, None) => None,
        };
        Self {
            id: req.id,
            requisition_id: None,
            status: req.requisition_status,
            created_at: req.created_at,
            summary,
        }
    }
}

impl From<Approval> for QueueRow {
    fn from(approval: Approval) -> Self {
        Self {
            id: approval.id,
            requisition_id: approval.requisition_id,
            status: approval.approval_status,
            created_at: approval.created_at,
            summary: approval.approval_subject,
        }
    }
}

/// Everything waiting on `reviewer`, sorted
pub async fn load_queue(
    api: &dyn RequisitionApi,
    reviewer: Reviewer,
    key: SortKey,
    order: SortOrder,
) -> Result<Vec<QueueRow>, WorkflowError> {
    let status = reviewer.waiting_status();
    let mut rows: Vec<QueueRow> = match reviewer.queue_source() {
        Source::Requisitions => api
            .requisitions_by_status(status)
            .await?
            .into_iter()
            .map(QueueRow::from)
            .collect(),
        Source::Approvals => api
            .approvals_by_status(status)
            .await?
            .into_iter()
            .map(QueueRow::from)
            .collect(),
    };
    sort_items(&mut rows, key, order);
    tracing::debug!(%reviewer, status, count = rows.len(), "Loaded queue");
    Ok(rows)
}

/// Run `fut` unless `token` fires first
async fn guarded<T, F>(token: &CancellationToken, fut: F) -> Result<T, WorkflowError>
where
    F: Future<Output = Result<T, ClientError>>,
{
    tokio::select! {
        biased;
        _ = token.cancelled() => Err(WorkflowError::Cancelled),
        result = fut => result.map_err(WorkflowError::from),
    }
}

/// Fetch the record an opened form works on
pub async fn load_form(api: &dyn RequisitionApi, form: &mut DecisionForm) -> Result<(), WorkflowError> {
    let failed = matches!(form.state(), FormState::Error(_)) && form.record().is_none();
    if failed {
        form.retry_load()?;
    } else if *form.state() != FormState::Loading {
        return Ok(());
    }
    let id = form.id().clone();
    if id.is_empty() {
        return Err(WorkflowError::MissingRecordId);
    }
    let token = form.cancel_token();

    let fetched = match form.reviewer().stage() {
        Stage::Raise => {
            return Err(WorkflowError::WrongRecord {
                reviewer: form.reviewer(),
                kind: "existing requisition",
            })
        }
        Stage::RequisitionReview | Stage::OpenApproval => guarded(&token, api.requisition(id.as_str()))
            .await
            .map(FormRecord::Requisition),
        Stage::ApprovalReview => guarded(&token, api.approval(id.as_str()))
            .await
            .map(|approval| FormRecord::Approval {
                approval,
                route_id: id.clone(),
            }),
    };

    match fetched {
        Ok(record) => form.loaded(record),
        Err(WorkflowError::Cancelled) => Err(WorkflowError::Cancelled),
        Err(e) => {
            form.load_failed(e.to_string());
            Err(e)
        }
    }
}

/// Outcome of the Sign action
#[derive(Debug, Clone)]
pub struct SignedSignature {
    pub path: String,
    pub file_id: String,
    /// Whitened PNG, or `None` when the image could not be fetched
    pub preview: Option<Vec<u8>>,
}

/// Look up the user's stored signature and attach it to the form.
///
/// Nothing further is requested once a precondition fails.
pub async fn sign(
    api: &dyn RequisitionApi,
    form: &mut DecisionForm,
    email: Option<&str>,
) -> Result<SignedSignature, WorkflowError> {
    if !form.is_editable() {
        return Err(WorkflowError::InvalidTransition {
            action: "sign",
            state: form.state().to_string(),
        });
    }
    let email = email
        .map(str::trim)
        .filter(|e| !e.is_empty())
        .ok_or(WorkflowError::MissingEmail)?;
    let token = form.cancel_token();

    let path = guarded(&token, api.signature_path(email)).await?;
    let path = path.trim().trim_matches('"').to_string();
    if path.is_empty() {
        return Err(WorkflowError::SignaturePathNotFound);
    }
    let file_id = signature_file_id(&path)
        .ok_or(WorkflowError::InvalidSignaturePath)?
        .to_string();

    let preview = match guarded(&token, api.signature_file(&file_id)).await {
        Ok(bytes) => Some(normalize_or_original(&bytes).into_owned()),
        Err(WorkflowError::Cancelled) => return Err(WorkflowError::Cancelled),
        Err(e) => {
            tracing::debug!(file_id, "Signature preview unavailable: {}", e);
            None
        }
    };

    form.attach_signature(path.clone())?;
    Ok(SignedSignature { path, file_id, preview })
}

/// Earlier departments' sign-offs, with signature images fetched concurrently.
///
/// Forms that are not on an approval have none. An image that fails to
/// load leaves its entry without a preview.
pub async fn upstream(api: &dyn RequisitionApi, form: &DecisionForm) -> Result<Vec<UpstreamEntry>, WorkflowError> {
    let approval = match form.record() {
        Some(FormRecord::Approval { approval, .. }) => approval,
        _ => return Ok(Vec::new()),
    };
    let mut entries = upstream_entries(approval, form.reviewer().department());

    let ids: Vec<Option<String>> = entries.iter().map(|e| e.signature_file_id.clone()).collect();
    let fetches = ids.into_iter().map(|id| async move {
        match id {
            Some(id) => api.signature_file(&id).await.ok(),
            None => None,
        }
    });
    let token = form.cancel_token();
    let images = guarded(&token, async { Ok::<_, ClientError>(join_all(fetches).await) }).await?;

    for (entry, image) in entries.iter_mut().zip(images) {
        entry.preview = image.map(|bytes| normalize_or_original(&bytes).into_owned());
    }
    Ok(entries)
}

async fn apply_all(api: &dyn RequisitionApi, mutations: &[Mutation]) -> Result<(), ClientError> {
    for mutation in mutations {
        api.apply(mutation).await?;
    }
    Ok(())
}

const SUBMISSION_CANCELLED: &str = "Submission cancelled";

/// Send a confirmed decision.
///
/// Requests go out in order and stop at the first failure, whose text
/// becomes the form's error. A cancelled submission ends in an error too,
/// so the form never stays `Submitting`.
pub async fn submit(
    api: &dyn RequisitionApi,
    form: &mut DecisionForm,
    now: DateTime<Utc>,
) -> Result<SubmissionPlan, WorkflowError> {
    let plan = form.begin_submit(now)?;
    let token = form.cancel_token();

    match guarded(&token, apply_all(api, &plan.mutations)).await {
        Ok(()) => {
            tracing::info!(reviewer = %form.reviewer(), status = %plan.status, "Decision submitted");
            form.finish(Ok(()));
            Ok(plan)
        }
        Err(WorkflowError::Cancelled) => {
            tracing::debug!(reviewer = %form.reviewer(), "Submission cancelled");
            form.finish(Err(SUBMISSION_CANCELLED.to_string()));
            Err(WorkflowError::Cancelled)
        }
        Err(e) => {
            tracing::warn!(reviewer = %form.reviewer(), "Decision rejected: {}", e);
            form.finish(Err(e.to_string()));
            Err(e)
        }
    }
}
