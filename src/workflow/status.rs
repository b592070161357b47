//! Who reviews what, and which status each decision moves a record to.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::Role;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "UPPERCASE")]
pub enum Decision {
    Approve,
    Reject,
}

impl Decision {
    /// `APPROVED`/`REJECTED`, the word requisition-level reviewers store
    pub fn verdict(self) -> &'static str {
        match self {
            Decision::Approve => "APPROVED",
            Decision::Reject => "REJECTED",
        }
    }

    /// `YES`/`NO`, for funding and compliance flags
    pub fn yes_no(self) -> &'static str {
        match self {
            Decision::Approve => "YES",
            Decision::Reject => "NO",
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Decision::Approve => "APPROVE",
            Decision::Reject => "REJECT",
        })
    }
}

/// Departments that sign the approval record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Department {
    Legal,
    Technical,
    Financial,
    Commercial,
    BusinessDevelopment,
    Procurement,
}

impl Department {
    pub const ALL: [Department; 6] = [
        Department::Legal,
        Department::Technical,
        Department::Financial,
        Department::Commercial,
        Department::BusinessDevelopment,
        Department::Procurement,
    ];

    /// camelCase stem of the record keys, e.g. `businessDevelopment`
    pub fn key(self) -> &'static str {
        match self {
            Department::Legal => "legal",
            Department::Technical => "technical",
            Department::Financial => "financial",
            Department::Commercial => "commercial",
            Department::BusinessDevelopment => "businessDevelopment",
            Department::Procurement => "procurement",
        }
    }

    pub fn signature_key(self) -> String {
        format!("{}Signature", self.key())
    }

    pub fn signature_date_key(self) -> String {
        format!("{}SignatureDate", self.key())
    }

    pub fn comments_key(self) -> String {
        format!("{}Comments", self.key())
    }

    pub fn label(self) -> &'static str {
        match self {
            Department::Legal => "Legal",
            Department::Technical => "Technical",
            Department::Financial => "Financial",
            Department::Commercial => "Commercial",
            Department::BusinessDevelopment => "Business Development",
            Department::Procurement => "Procurement",
        }
    }
}

/// Where a reviewer's work items come from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    Requisitions,
    Approvals,
}

/// What kind of record a reviewer's form edits, and how it is submitted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// POST a new requisition
    Raise,
    /// PUT the whole requisition back with the reviewer's fields
    RequisitionReview,
    /// POST the opening approval document for a requisition
    OpenApproval,
    /// PUT the merged approval, then POST the department's entry
    ApprovalReview,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, clap::ValueEnum)]
pub enum Reviewer {
    #[value(name = "hod")]
    HeadOfDepartment,
    FinanceDirector,
    ProcurementManager,
    CompanySecretary,
    Legal,
    Technical,
    Financial,
    Commercial,
    BusinessDevelopment,
    Procurement,
}

impl Reviewer {
    pub const ALL: [Reviewer; 10] = [
        Reviewer::HeadOfDepartment,
        Reviewer::FinanceDirector,
        Reviewer::ProcurementManager,
        Reviewer::CompanySecretary,
        Reviewer::Legal,
        Reviewer::Technical,
        Reviewer::Financial,
        Reviewer::Commercial,
        Reviewer::BusinessDevelopment,
        Reviewer::Procurement,
    ];

    /// Role claim that grants access to this reviewer's queue
    pub fn role(self) -> Role {
        match self {
            Reviewer::HeadOfDepartment => Role::Hod,
            Reviewer::FinanceDirector | Reviewer::Financial => Role::FinanceDirector,
            Reviewer::ProcurementManager | Reviewer::Procurement => Role::ProcurementManager,
            Reviewer::CompanySecretary => Role::CompanySecretary,
            Reviewer::Legal => Role::PaLegal,
            Reviewer::Technical => Role::TechnicalDirector,
            Reviewer::Commercial => Role::CommercialDirector,
            Reviewer::BusinessDevelopment => Role::BusinessManager,
        }
    }

    pub fn stage(self) -> Stage {
        match self {
            Reviewer::HeadOfDepartment => Stage::Raise,
            Reviewer::FinanceDirector | Reviewer::ProcurementManager | Reviewer::CompanySecretary => {
                Stage::RequisitionReview
            }
            Reviewer::Legal => Stage::OpenApproval,
            Reviewer::Technical
            | Reviewer::Financial
            | Reviewer::Commercial
            | Reviewer::BusinessDevelopment
            | Reviewer::Procurement => Stage::ApprovalReview,
        }
    }

    pub fn department(self) -> Option<Department> {
        match self {
            Reviewer::Legal => Some(Department::Legal),
            Reviewer::Technical => Some(Department::Technical),
            Reviewer::Financial => Some(Department::Financial),
            Reviewer::Commercial => Some(Department::Commercial),
            Reviewer::BusinessDevelopment => Some(Department::BusinessDevelopment),
            Reviewer::Procurement => Some(Department::Procurement),
            _ => None,
        }
    }

    /// Prefix of the `<PREFIX>_APPROVED`/`<PREFIX>_REJECTED` statuses
    pub fn status_prefix(self) -> &'static str {
        match self {
            Reviewer::HeadOfDepartment => "HOD",
            Reviewer::FinanceDirector => "FINANCEDIRECTOR",
            Reviewer::ProcurementManager => "PROCUREMENTMANAGER",
            Reviewer::CompanySecretary => "COMPANYSECRETARY",
            Reviewer::Legal => "LEGAL",
            Reviewer::Technical => "TECHNICAL",
            Reviewer::Financial => "FINANCIAL",
            Reviewer::Commercial => "COMMERCIAL",
            Reviewer::BusinessDevelopment => "BUSINESS_DEVELOPMENT",
            Reviewer::Procurement => "PROCUREMENT",
        }
    }

    /// Status the record moves to on this decision.
    ///
    /// A head of department approving raises the requisition as `SUBMITTED`.
    pub fn next_status(self, decision: Decision) -> String {
        match (self, decision) {
            (Reviewer::HeadOfDepartment, Decision::Approve) => "SUBMITTED".to_string(),
            (_, Decision::Approve) => format!("{}_APPROVED", self.status_prefix()),
            (_, Decision::Reject) => format!("{}_REJECTED", self.status_prefix()),
        }
    }

    pub fn queue_source(self) -> Source {
        match self.stage() {
            Stage::ApprovalReview => Source::Approvals,
            _ => Source::Requisitions,
        }
    }

    /// Status of the items waiting on this reviewer
    pub fn waiting_status(self) -> &'static str {
        match self {
            Reviewer::HeadOfDepartment | Reviewer::FinanceDirector => "SUBMITTED",
            Reviewer::ProcurementManager => "FINANCEDIRECTOR_APPROVED",
            Reviewer::CompanySecretary => "PROCUREMENTMANAGER_APPROVED",
            Reviewer::Legal => "COMPANYSECRETARY_APPROVED",
            Reviewer::Technical => "LEGAL_APPROVED",
            Reviewer::Financial => "TECHNICAL_APPROVED",
            Reviewer::Commercial => "FINANCIAL_APPROVED",
            Reviewer::BusinessDevelopment => "COMMERCIAL_APPROVED",
            Reviewer::Procurement => "BUSINESS_DEVELOPMENT_APPROVED",
        }
    }

    /// Page the reviewer lands on after a decision
    pub fn queue_path(self) -> &'static str {
        match self {
            Reviewer::HeadOfDepartment => "/requisitions/submitted",
            Reviewer::FinanceDirector => "/requisitions/finance",
            Reviewer::ProcurementManager => "/requisitions/procurement",
            Reviewer::CompanySecretary => "/requisitions/secretary",
            Reviewer::Legal => "/requisitions/approvals",
            Reviewer::Technical => "/requisitions/technical",
            Reviewer::Financial => "/requisitions/finance-approvals",
            Reviewer::Commercial => "/requisitions/commercial",
            Reviewer::BusinessDevelopment => "/requisitions/business-development",
            Reviewer::Procurement => "/requisitions/procurement-approvals",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Reviewer::HeadOfDepartment => "Head of Department",
            Reviewer::FinanceDirector => "Finance Director",
            Reviewer::ProcurementManager => "Procurement Manager",
            Reviewer::CompanySecretary => "Company Secretary",
            Reviewer::Legal => "Legal",
            Reviewer::Technical => "Technical",
            Reviewer::Financial => "Financial",
            Reviewer::Commercial => "Commercial",
            Reviewer::BusinessDevelopment => "Business Development",
            Reviewer::Procurement => "Procurement",
        }
    }
}

impl fmt::Display for Reviewer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decision_table() {
        assert_eq!(Reviewer::HeadOfDepartment.next_status(Decision::Approve), "SUBMITTED");
        assert_eq!(Reviewer::HeadOfDepartment.next_status(Decision::Reject), "HOD_REJECTED");
        assert_eq!(Reviewer::Technical.next_status(Decision::Reject), "TECHNICAL_REJECTED");
        assert_eq!(
            Reviewer::BusinessDevelopment.next_status(Decision::Approve),
            "BUSINESS_DEVELOPMENT_APPROVED"
        );
        assert_eq!(Reviewer::FinanceDirector.next_status(Decision::Approve), "FINANCEDIRECTOR_APPROVED");
    }

    #[test]
    fn each_queue_waits_on_the_previous_approval() {
        // Every review stage after the first waits on a status some reviewer can produce
        let produced: Vec<String> = Reviewer::ALL
            .iter()
            .map(|r| r.next_status(Decision::Approve))
            .collect();
        for reviewer in Reviewer::ALL {
            assert!(
                produced.iter().any(|s| s == reviewer.waiting_status()),
                "{} waits on a status nobody produces",
                reviewer
            );
        }
    }

    #[test]
    fn approval_reviewers_read_approvals() {
        assert_eq!(Reviewer::Technical.queue_source(), Source::Approvals);
        assert_eq!(Reviewer::Legal.queue_source(), Source::Requisitions);
        assert_eq!(Reviewer::Legal.department(), Some(Department::Legal));
        assert_eq!(Reviewer::FinanceDirector.department(), None);
    }

    #[test]
    fn department_keys() {
        assert_eq!(Department::BusinessDevelopment.signature_key(), "businessDevelopmentSignature");
        assert_eq!(Department::Technical.signature_date_key(), "technicalSignatureDate");
        assert_eq!(Department::Legal.comments_key(), "legalComments");
    }
}
