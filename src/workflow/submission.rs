//! Turning a confirmed decision into the backend requests that record it.
//!
//! Planning is pure: the same inputs and clock give the same requests, so
//! every reviewer's payload can be checked without a backend.

use axum::http::Method;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use serde_json::{json, Map, Value};

use super::model::{Approval, NewRequisition, RecordId, Requisition, SignOff};
use super::status::{Decision, Department, Reviewer, Stage};
use super::WorkflowError;
use crate::proxy::encode::encode_path;

/// One state-changing request against the gateway's proxy surface
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Mutation {
    #[serde(with = "method_str")]
    pub method: Method,
    /// Already-encoded local path, e.g. `/api/approvals/7/update`
    pub path: String,
    pub body: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubmissionPlan {
    pub status: String,
    pub mutations: Vec<Mutation>,
    pub navigate_to: &'static str,
}

/// The record a decision form is working on
#[derive(Debug, Clone)]
pub enum FormRecord {
    Draft(NewRequisition),
    Requisition(Requisition),
    Approval {
        approval: Approval,
        /// Id the form was opened with, used when the record has no `requisitionId`
        route_id: RecordId,
    },
}

impl FormRecord {
    fn kind(&self) -> &'static str {
        match self {
            FormRecord::Draft(_) => "new requisition",
            FormRecord::Requisition(_) => "requisition",
            FormRecord::Approval { .. } => "approval",
        }
    }
}

/// Header of the approval document legal opens
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApprovalHeader {
    pub to: Option<String>,
    pub reference: Option<String>,
    pub subject: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Submission<'a> {
    pub reviewer: Reviewer,
    pub decision: Decision,
    pub record: &'a FormRecord,
    pub signature_path: Option<&'a str>,
    pub comments: &'a str,
    pub header: &'a ApprovalHeader,
    pub now: DateTime<Utc>,
}

/// Full timestamp for department sign-offs
pub fn timestamp(now: DateTime<Utc>) -> String {
    now.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Calendar day for requisition-level fields
pub fn day(now: DateTime<Utc>) -> String {
    now.format("%Y-%m-%d").to_string()
}

pub fn plan(submission: &Submission<'_>) -> Result<SubmissionPlan, WorkflowError> {
    let reviewer = submission.reviewer;
    let status = reviewer.next_status(submission.decision);

    let mutations = match (reviewer.stage(), submission.record) {
        (Stage::Raise, FormRecord::Draft(draft)) => vec![raise(submission, draft, &status)],
        (Stage::RequisitionReview, FormRecord::Requisition(req)) => {
            vec![review_requisition(submission, req, &status)?]
        }
        (Stage::OpenApproval, FormRecord::Requisition(req)) => vec![open_approval(submission, req, &status)?],
        (Stage::ApprovalReview, FormRecord::Approval { approval, route_id }) => {
            review_approval(submission, approval, route_id, &status)?
        }
        (_, record) => {
            return Err(WorkflowError::WrongRecord {
                reviewer,
                kind: record.kind(),
            })
        }
    };

    Ok(SubmissionPlan {
        status,
        mutations,
        navigate_to: reviewer.queue_path(),
    })
}

fn raise(submission: &Submission<'_>, draft: &NewRequisition, status: &str) -> Mutation {
    let mut draft = draft.clone().with_flag_defaults();
    draft.set("headOfDept", submission.decision.verdict());
    draft.set("headDate", day(submission.now));
    draft.set("requisitionStatus", status);

    Mutation {
        method: Method::POST,
        path: encode_path(&["api", "requisitions", "create"]),
        body: Value::Object(draft.fields),
    }
}

fn review_requisition(
    submission: &Submission<'_>,
    req: &Requisition,
    status: &str,
) -> Result<Mutation, WorkflowError> {
    let id = require_id(&req.id)?;
    let mut body = as_object(req)?;
    let decision = submission.decision;
    let today = day(submission.now);

    body.insert("requisitionStatus".into(), json!(status));
    match submission.reviewer {
        Reviewer::FinanceDirector => {
            body.insert("fundingAvailable".into(), json!(decision.yes_no()));
            body.insert("financeDirector".into(), json!(decision.verdict()));
            body.insert("financeDate".into(), json!(today));
        }
        Reviewer::ProcurementManager => {
            body.insert("procurementComplied".into(), json!(decision.yes_no()));
            body.insert("procurementManager".into(), json!(decision.verdict()));
            body.insert("procurementDate".into(), json!(today));
        }
        Reviewer::CompanySecretary => {
            match submission.signature_path {
                Some(path) => body.insert("companySecretary".into(), json!(path)),
                None => body.remove("companySecretary"),
            };
            body.insert("secretaryDate".into(), json!(today));
        }
        _ => {}
    }

    Ok(Mutation {
        method: Method::PUT,
        path: encode_path(&["api", "requisitions", id.as_str(), "update"]),
        body: Value::Object(body),
    })
}

fn open_approval(submission: &Submission<'_>, req: &Requisition, status: &str) -> Result<Mutation, WorkflowError> {
    let id = require_id(&req.id)?;
    let header = submission.header;
    let mut approval = Approval {
        approval_to: header.to.clone(),
        approval_date: Some(json!(day(submission.now))),
        approval_reference: header.reference.clone(),
        approval_subject: header.subject.clone(),
        approval_status: Some(status.to_string()),
        ..Approval::default()
    };
    approval.set_sign_off(Department::Legal, sign_off(submission));

    let mut body = as_object(&approval)?;
    // The record does not exist yet; the backend assigns its id
    body.remove("id");

    Ok(Mutation {
        method: Method::POST,
        path: encode_path(&["api", "requisitions", id.as_str(), "approval"]),
        body: Value::Object(body),
    })
}

fn review_approval(
    submission: &Submission<'_>,
    approval: &Approval,
    route_id: &RecordId,
    status: &str,
) -> Result<Vec<Mutation>, WorkflowError> {
    let department = submission
        .reviewer
        .department()
        .ok_or(WorkflowError::WrongRecord {
            reviewer: submission.reviewer,
            kind: "approval",
        })?;
    let approval_id = require_id(&approval.id)?;
    let requisition_id = approval
        .requisition_id
        .as_ref()
        .filter(|id| !id.is_empty())
        .unwrap_or(route_id);
    let requisition_id = require_id(requisition_id)?;

    let entry = sign_off(submission);

    let mut merged = approval.clone();
    merged.set_sign_off(department, entry.clone());
    merged.approval_status = Some(status.to_string());

    let mut progress = Map::new();
    progress.insert("approvalStatus".into(), json!(status));
    if let Some(date) = &entry.signature_date {
        progress.insert(department.signature_date_key(), date.clone());
    }
    if let Some(comments) = &entry.comments {
        progress.insert(department.comments_key(), json!(comments));
    }
    if let Some(signature) = &entry.signature {
        progress.insert(department.signature_key(), json!(signature));
    }

    Ok(vec![
        Mutation {
            method: Method::PUT,
            path: encode_path(&["api", "approvals", approval_id.as_str(), "update"]),
            body: Value::Object(as_object(&merged)?),
        },
        Mutation {
            method: Method::POST,
            path: encode_path(&["api", "requisitions", requisition_id.as_str(), "approval"]),
            body: Value::Object(progress),
        },
    ])
}

fn sign_off(submission: &Submission<'_>) -> SignOff {
    SignOff {
        signature: submission.signature_path.map(str::to_string),
        signature_date: Some(json!(timestamp(submission.now))),
        comments: Some(submission.comments.to_string()),
    }
}

fn require_id(id: &RecordId) -> Result<&RecordId, WorkflowError> {
    if id.is_empty() {
        Err(WorkflowError::MissingRecordId)
    } else {
        Ok(id)
    }
}

fn as_object<T: Serialize>(value: &T) -> Result<Map<String, Value>, WorkflowError> {
    match serde_json::to_value(value).map_err(|e| WorkflowError::Encode(e.to_string()))? {
        Value::Object(map) => Ok(map),
        _ => Err(WorkflowError::Encode("record is not a JSON object".to_string())),
    }
}

mod method_str {
    use axum::http::Method;
    use serde::Serializer;

    pub fn serialize<S: Serializer>(method: &Method, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(method.as_str())
    }
}
