//! Decision form state machine.
//!
//! ```text
//! Loading ─▶ Ready ─▶ Editing ─▶ Confirming ─▶ Submitting ─▶ Done
//!                        ▲            │              │
//!                        └────────────┘              ▼
//!                        └──────────────────────── Error
//! ```
//!
//! `Error` keeps the form contents; editing or confirming again from there
//! is allowed, which is how a failed submission is retried.

use std::fmt;

use chrono::{DateTime, Utc};
use tokio_util::sync::CancellationToken;

use super::model::RecordId;
use super::status::{Decision, Reviewer};
use super::submission::{self, ApprovalHeader, FormRecord, Submission, SubmissionPlan};
use super::WorkflowError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormState {
    Loading,
    Ready,
    Editing,
    Confirming,
    Submitting,
    Done,
    Error(String),
}

impl fmt::Display for FormState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormState::Loading => f.write_str("loading"),
            FormState::Ready => f.write_str("ready"),
            FormState::Editing => f.write_str("editing"),
            FormState::Confirming => f.write_str("confirming"),
            FormState::Submitting => f.write_str("submitting"),
            FormState::Done => f.write_str("done"),
            FormState::Error(_) => f.write_str("error"),
        }
    }
}

#[derive(Debug)]
pub struct DecisionForm {
    reviewer: Reviewer,
    id: RecordId,
    state: FormState,
    record: Option<FormRecord>,
    decision: Option<Decision>,
    comments: String,
    signature_path: Option<String>,
    header: ApprovalHeader,
    message: Option<String>,
    cancel: CancellationToken,
}

impl DecisionForm {
    /// A form for an existing record, waiting for it to load
    pub fn open(reviewer: Reviewer, id: impl Into<RecordId>) -> Self {
        Self {
            reviewer,
            id: id.into(),
            state: FormState::Loading,
            record: None,
            decision: None,
            comments: String::new(),
            signature_path: None,
            header: ApprovalHeader::default(),
            message: None,
            cancel: CancellationToken::new(),
        }
    }

    /// A form for a record that does not exist yet; nothing to load
    pub fn draft(reviewer: Reviewer, record: FormRecord) -> Self {
        let mut form = Self::open(reviewer, RecordId::default());
        form.record = Some(record);
        form.state = FormState::Ready;
        form
    }

    pub fn reviewer(&self) -> Reviewer {
        self.reviewer
    }

    pub fn id(&self) -> &RecordId {
        &self.id
    }

    pub fn state(&self) -> &FormState {
        &self.state
    }

    pub fn record(&self) -> Option<&FormRecord> {
        self.record.as_ref()
    }

    pub fn decision(&self) -> Option<Decision> {
        self.decision
    }

    pub fn comments(&self) -> &str {
        &self.comments
    }

    pub fn signature_path(&self) -> Option<&str> {
        self.signature_path.as_deref()
    }

    pub fn header(&self) -> &ApprovalHeader {
        &self.header
    }

    /// Last success or error text shown to the user
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// Token every request made on behalf of this form runs under
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// The form is going away; in-flight responses must be ignored
    pub fn close(&self) {
        self.cancel.cancel();
    }

    pub fn is_closed(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Whether decision, comments or signature can change right now
    pub fn is_editable(&self) -> bool {
        self.record.is_some()
            && matches!(
                self.state,
                FormState::Ready | FormState::Editing | FormState::Error(_)
            )
    }

    pub fn loaded(&mut self, record: FormRecord) -> Result<(), WorkflowError> {
        self.expect(&[FormState::Loading], "load")?;
        self.record = Some(record);
        self.state = FormState::Ready;
        Ok(())
    }

    pub fn load_failed(&mut self, message: impl Into<String>) {
        let message = message.into();
        self.message = Some(message.clone());
        self.state = FormState::Error(message);
    }

    /// Return a form whose load failed to `Loading` so the fetch can run again
    pub fn retry_load(&mut self) -> Result<(), WorkflowError> {
        if self.record.is_some() || !matches!(self.state, FormState::Error(_)) {
            return Err(self.invalid("reload"));
        }
        self.message = None;
        self.state = FormState::Loading;
        Ok(())
    }

    pub fn set_decision(&mut self, decision: Decision) -> Result<(), WorkflowError> {
        self.begin_edit("choose a decision")?;
        self.decision = Some(decision);
        Ok(())
    }

    pub fn set_comments(&mut self, comments: impl Into<String>) -> Result<(), WorkflowError> {
        self.begin_edit("edit comments")?;
        self.comments = comments.into();
        Ok(())
    }

    pub fn set_header(&mut self, header: ApprovalHeader) -> Result<(), WorkflowError> {
        self.begin_edit("edit the approval header")?;
        self.header = header;
        Ok(())
    }

    /// Result of a successful Sign action
    pub fn attach_signature(&mut self, path: impl Into<String>) -> Result<(), WorkflowError> {
        self.begin_edit("sign")?;
        self.signature_path = Some(path.into());
        Ok(())
    }

    /// Open the confirmation step. Sends nothing.
    pub fn confirm(&mut self) -> Result<(), WorkflowError> {
        match self.state {
            FormState::Ready | FormState::Editing | FormState::Error(_) => {}
            _ => return Err(self.invalid("confirm")),
        }
        if self.record.is_none() {
            return Err(WorkflowError::NotLoaded);
        }
        if self.decision.is_none() {
            return Err(WorkflowError::MissingDecision);
        }
        self.state = FormState::Confirming;
        Ok(())
    }

    pub fn cancel_confirm(&mut self) -> Result<(), WorkflowError> {
        self.expect(&[FormState::Confirming], "cancel confirmation")?;
        self.state = FormState::Editing;
        Ok(())
    }

    /// Requests a submission would send, without leaving `Confirming`
    pub fn preview(&self, now: DateTime<Utc>) -> Result<SubmissionPlan, WorkflowError> {
        self.expect(&[FormState::Confirming], "preview")?;
        self.plan(now)
    }

    /// Move to `Submitting` and produce the requests to send.
    ///
    /// A second call while the first is in flight is refused.
    pub fn begin_submit(&mut self, now: DateTime<Utc>) -> Result<SubmissionPlan, WorkflowError> {
        if self.state == FormState::Submitting {
            return Err(WorkflowError::AlreadySubmitting);
        }
        self.expect(&[FormState::Confirming], "submit")?;
        let plan = self.plan(now)?;
        self.message = None;
        self.state = FormState::Submitting;
        Ok(plan)
    }

    /// Record the outcome of the submission requests
    pub fn finish(&mut self, outcome: Result<(), String>) {
        if self.state != FormState::Submitting {
            tracing::debug!(state = %self.state, "Ignoring submission outcome");
            return;
        }
        match outcome {
            Ok(()) => {
                self.message = Some(format!("{} decision submitted.", self.reviewer));
                self.state = FormState::Done;
            }
            Err(message) => {
                self.message = Some(message.clone());
                self.state = FormState::Error(message);
            }
        }
    }

    fn plan(&self, now: DateTime<Utc>) -> Result<SubmissionPlan, WorkflowError> {
        let decision = self.decision.ok_or(WorkflowError::MissingDecision)?;
        let record = self.record.as_ref().ok_or(WorkflowError::NotLoaded)?;
        submission::plan(&Submission {
            reviewer: self.reviewer,
            decision,
            record,
            signature_path: self.signature_path.as_deref(),
            comments: &self.comments,
            header: &self.header,
            now,
        })
    }

    fn begin_edit(&mut self, action: &'static str) -> Result<(), WorkflowError> {
        match self.state {
            FormState::Ready | FormState::Editing | FormState::Error(_) => {
                if self.record.is_none() {
                    return Err(WorkflowError::NotLoaded);
                }
                self.state = FormState::Editing;
                Ok(())
            }
            _ => Err(self.invalid(action)),
        }
    }

    fn expect(&self, allowed: &[FormState], action: &'static str) -> Result<(), WorkflowError> {
        if allowed.contains(&self.state) {
            Ok(())
        } else {
            Err(self.invalid(action))
        }
    }

    fn invalid(&self, action: &'static str) -> WorkflowError {
        WorkflowError::InvalidTransition {
            action,
            state: self.state.to_string(),
        }
    }
}
