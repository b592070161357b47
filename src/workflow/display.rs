//! Read-only rendering of upstream sign-offs on a decision form.

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use super::model::{Approval, SignOff};
use super::queue::timestamp_millis;
use super::status::Department;
use crate::signature::signature_file_id;

const MONTHS: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// `1 March 2024`; input that is not a date comes back unchanged
pub fn format_display_date(raw: &str) -> String {
    let trimmed = raw.trim();
    let date = DateTime::parse_from_rfc3339(trimmed)
        .map(|dt| dt.date_naive())
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S%.f")
                .map(|dt| dt.date())
                .ok()
        })
        .or_else(|| NaiveDate::parse_from_str(trimmed, "%Y-%m-%d").ok());

    match date {
        Some(d) => day_month_year(d),
        None => raw.to_string(),
    }
}

/// Display form of a backend date field, or `None` when there is nothing to show
pub fn format_display_value(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(format_display_date(s)),
        Value::Number(_) | Value::Array(_) => match timestamp_millis(value) {
            0 => None,
            millis => DateTime::<Utc>::from_timestamp_millis(millis).map(|dt| day_month_year(dt.date_naive())),
        },
        _ => None,
    }
}

fn day_month_year(d: NaiveDate) -> String {
    format!("{} {} {}", d.day(), MONTHS[d.month0() as usize], d.year())
}

/// Signature text worth showing as-is. Paths are rendered as images instead.
pub fn visible_signature_text(signature: &str) -> Option<&str> {
    let trimmed = signature.trim();
    if trimmed.is_empty() || trimmed.starts_with('/') {
        None
    } else {
        Some(trimmed)
    }
}

/// One department's entry as shown to a later reviewer
#[derive(Debug, Clone, Serialize)]
pub struct UpstreamEntry {
    pub department: &'static str,
    pub signature_text: Option<String>,
    /// Id to fetch the signature image with, when the signature is a file path
    pub signature_file_id: Option<String>,
    pub date: Option<String>,
    pub comments: Option<String>,
    /// Whitened PNG, or the stored bytes when they do not decode; filled in
    /// when the image could be fetched
    #[serde(skip)]
    pub preview: Option<Vec<u8>>,
}

impl UpstreamEntry {
    pub fn from_sign_off(department: Department, sign_off: &SignOff) -> Self {
        let signature = sign_off.signature.as_deref().unwrap_or("");
        Self {
            department: department.label(),
            signature_text: visible_signature_text(signature).map(str::to_string),
            signature_file_id: signature_file_id(signature).map(str::to_string),
            date: sign_off.signature_date.as_ref().and_then(format_display_value),
            comments: sign_off.comments.clone().filter(|c| !c.is_empty()),
            preview: None,
        }
    }

    pub fn has_preview(&self) -> bool {
        self.preview.is_some()
    }
}

/// Every department other than `own`, in signing order
pub fn upstream_entries(approval: &Approval, own: Option<Department>) -> Vec<UpstreamEntry> {
    Department::ALL
        .iter()
        .copied()
        .filter(|d| Some(*d) != own)
        .map(|d| UpstreamEntry::from_sign_off(d, &approval.sign_off(d)))
        .collect()
}
