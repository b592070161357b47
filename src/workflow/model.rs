//! Typed views of backend records.
//!
//! The backend owns these documents and reviewers send them back whole, so
//! every struct keeps the fields it does not name in `extra` and skips
//! absent optionals when serializing. A decode/encode cycle is lossless.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use super::status::Department;

/// Backend identifier; numeric in practice but accepted as a string too
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct RecordId(String);

impl RecordId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into().trim().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Numeric value for ordering; non-numeric ids sort as 0
    pub fn numeric(&self) -> i64 {
        self.0.parse().unwrap_or(0)
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RecordId {
    fn from(s: &str) -> Self {
        RecordId::new(s)
    }
}

impl From<i64> for RecordId {
    fn from(n: i64) -> Self {
        RecordId(n.to_string())
    }
}

impl Serialize for RecordId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.0.parse::<i64>() {
            Ok(n) => serializer.serialize_i64(n),
            Err(_) => serializer.serialize_str(&self.0),
        }
    }
}

impl<'de> Deserialize<'de> for RecordId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match Value::deserialize(deserializer)? {
            Value::Number(n) => Ok(RecordId(n.to_string())),
            Value::String(s) => Ok(RecordId::new(s)),
            Value::Null => Ok(RecordId::default()),
            other => Err(serde::de::Error::custom(format!("invalid record id: {}", other))),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Requisition {
    #[serde(default)]
    pub id: RecordId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requisition_status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requisition_from: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requisition_to: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contract_price: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One department's sign-off as stored on an approval record.
///
/// Dates stay raw JSON: the backend sends ISO strings, epoch millis or
/// `[y, m, d, h, mi, s]` arrays depending on the field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SignOff {
    pub signature: Option<String>,
    pub signature_date: Option<Value>,
    pub comments: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Approval {
    #[serde(default)]
    pub id: RecordId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requisition_id: Option<RecordId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approval_status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approval_to: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approval_date: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approval_reference: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approval_subject: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub legal_signature: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub legal_signature_date: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub legal_comments: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub technical_signature: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub technical_signature_date: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub technical_comments: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub financial_signature: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub financial_signature_date: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub financial_comments: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commercial_signature: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commercial_signature_date: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commercial_comments: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub business_development_signature: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub business_development_signature_date: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub business_development_comments: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub procurement_signature: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub procurement_signature_date: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub procurement_comments: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Approval {
    pub fn sign_off(&self, department: Department) -> SignOff {
        let (signature, signature_date, comments) = match department {
            Department::Legal => (&self.legal_signature, &self.legal_signature_date, &self.legal_comments),
            Department::Technical => (
                &self.technical_signature,
                &self.technical_signature_date,
                &self.technical_comments,
            ),
            Department::Financial => (
                &self.financial_signature,
                &self.financial_signature_date,
                &self.financial_comments,
            ),
            Department::Commercial => (
                &self.commercial_signature,
                &self.commercial_signature_date,
                &self.commercial_comments,
            ),
            Department::BusinessDevelopment => (
                &self.business_development_signature,
                &self.business_development_signature_date,
                &self.business_development_comments,
            ),
            Department::Procurement => (
                &self.procurement_signature,
                &self.procurement_signature_date,
                &self.procurement_comments,
            ),
        };
        SignOff {
            signature: signature.clone(),
            signature_date: signature_date.clone(),
            comments: comments.clone(),
        }
    }

    pub fn set_sign_off(&mut self, department: Department, sign_off: SignOff) {
        let (signature, signature_date, comments) = match department {
            Department::Legal => (
                &mut self.legal_signature,
                &mut self.legal_signature_date,
                &mut self.legal_comments,
            ),
            Department::Technical => (
                &mut self.technical_signature,
                &mut self.technical_signature_date,
                &mut self.technical_comments,
            ),
            Department::Financial => (
                &mut self.financial_signature,
                &mut self.financial_signature_date,
                &mut self.financial_comments,
            ),
            Department::Commercial => (
                &mut self.commercial_signature,
                &mut self.commercial_signature_date,
                &mut self.commercial_comments,
            ),
            Department::BusinessDevelopment => (
                &mut self.business_development_signature,
                &mut self.business_development_signature_date,
                &mut self.business_development_comments,
            ),
            Department::Procurement => (
                &mut self.procurement_signature,
                &mut self.procurement_signature_date,
                &mut self.procurement_comments,
            ),
        };
        *signature = sign_off.signature;
        *signature_date = sign_off.signature_date;
        *comments = sign_off.comments;
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    #[serde(default)]
    pub id: RecordId,
    #[serde(default)]
    pub file_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_by: Option<String>,
}

/// Spring-style page of attachments
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachmentPage {
    #[serde(default)]
    pub content: Vec<Attachment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_pages: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_elements: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u32>,
}

impl AttachmentPage {
    pub fn total_pages(&self) -> u32 {
        self.total_pages.unwrap_or(1).max(1)
    }
}

/// Approval listings arrive either bare or wrapped in a page
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Listing<T> {
    Items(Vec<T>),
    Page { content: Vec<T> },
}

impl<T> Listing<T> {
    pub fn into_items(self) -> Vec<T> {
        match self {
            Listing::Items(items) => items,
            Listing::Page { content } => content,
        }
    }
}

/// YES/NO flags a new requisition must always carry
pub const NEW_REQUISITION_FLAGS: [&str; 6] = [
    "isRenewable",
    "deliveryNA",
    "warrantyNA",
    "serviceSupport",
    "fundingAvailable",
    "procurementComplied",
];

/// Field values for a requisition being raised by a head of department
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewRequisition {
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl NewRequisition {
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(fields) => Some(Self { fields }),
            _ => None,
        }
    }

    pub fn set(&mut self, key: &str, value: impl Into<Value>) {
        self.fields.insert(key.to_string(), value.into());
    }

    /// Fill every unset or blank YES/NO flag with `NO`
    pub fn with_flag_defaults(mut self) -> Self {
        for flag in NEW_REQUISITION_FLAGS {
            let blank = match self.fields.get(flag) {
                None | Some(Value::Null) => true,
                Some(Value::String(s)) => s.trim().is_empty(),
                Some(_) => false,
            };
            if blank {
                self.fields.insert(flag.to_string(), Value::String("NO".to_string()));
            }
        }
        self
    }
}
