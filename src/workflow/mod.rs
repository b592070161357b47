//! Reviewer-facing workflow: queues, decision forms and the requests that
//! record a decision.
//!
//! Everything here runs against [`crate::client::RequisitionApi`], so the
//! same code drives the CLI over HTTP and the unit tests over a fake.

pub mod attachments;
pub mod display;
pub mod flow;
pub mod form;
pub mod model;
pub mod queue;
pub mod status;
pub mod submission;

#[cfg(test)]
pub(crate) mod testing;

use thiserror::Error;

use crate::client::ClientError;

pub use attachments::AttachmentBrowser;
pub use form::{DecisionForm, FormState};
pub use status::{Decision, Department, Reviewer, Source, Stage};
pub use submission::{ApprovalHeader, FormRecord, Mutation, SubmissionPlan};

#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("Cannot {action} while the form is {state}")]
    InvalidTransition { action: &'static str, state: String },

    #[error("Select approve or reject before confirming")]
    MissingDecision,

    #[error("A submission is already in progress")]
    AlreadySubmitting,

    #[error("The record has not loaded yet")]
    NotLoaded,

    #[error("Record has no id")]
    MissingRecordId,

    #[error("{reviewer} cannot decide on a {kind}")]
    WrongRecord { reviewer: Reviewer, kind: &'static str },

    #[error("Failed to encode record: {0}")]
    Encode(String),

    #[error("Missing user email")]
    MissingEmail,

    #[error("Signature path not found")]
    SignaturePathNotFound,

    #[error("Invalid signature path")]
    InvalidSignaturePath,

    #[error("Request cancelled")]
    Cancelled,

    #[error(transparent)]
    Client(#[from] ClientError),
}
