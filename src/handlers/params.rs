// handlers/params.rs - Path and query parameter checks shared by proxy handlers

use serde::Deserialize;

use crate::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct StatusQuery {
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct EmailQuery {
    pub email: Option<String>,
}

/// Raw strings so a malformed number is answered with the JSON error body
#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub page: Option<String>,
    pub size: Option<String>,
}

impl PageQuery {
    pub const DEFAULT_SIZE: u32 = 10;

    pub fn page(&self) -> Result<u32, ApiError> {
        number(self.page.as_deref(), "page", 0)
    }

    pub fn size(&self) -> Result<u32, ApiError> {
        number(self.size.as_deref(), "size", Self::DEFAULT_SIZE)
    }
}

// Absent or blank means the default
fn number(value: Option<&str>, what: &str, default: u32) -> Result<u32, ApiError> {
    match value.map(str::trim) {
        None | Some("") => Ok(default),
        Some(v) => v
            .parse()
            .map_err(|_| ApiError::bad_request(format!("Invalid {}: {}", what, v))),
    }
}

/// Trimmed value, rejecting blanks and the literal `undefined` a form sends
/// before its select has a value
fn required<'a>(value: Option<&'a str>, what: &str) -> Result<&'a str, ApiError> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() && !v.eq_ignore_ascii_case("undefined") => Ok(v),
        _ => Err(ApiError::missing(what)),
    }
}

pub fn require_status(value: Option<&str>) -> Result<&str, ApiError> {
    required(value, "status")
}

pub fn require_id(value: &str) -> Result<&str, ApiError> {
    required(Some(value), "id")
}

pub fn require_email(value: Option<&str>) -> Result<&str, ApiError> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(ApiError::missing("email")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_rejects_placeholder_values() {
        assert_eq!(require_status(Some(" SUBMITTED ")).unwrap(), "SUBMITTED");
        assert_eq!(require_status(Some("undefined")).unwrap_err().message(), "Missing status");
        assert_eq!(require_status(Some("UNDEFINED")).unwrap_err().message(), "Missing status");
        assert!(require_status(Some("  ")).is_err());
        assert!(require_status(None).is_err());
    }

    #[test]
    fn email_only_rejects_blank() {
        assert_eq!(require_email(Some("a@b.c")).unwrap(), "a@b.c");
        assert_eq!(require_email(Some("")).unwrap_err().message(), "Missing email");
    }

    #[test]
    fn page_defaults() {
        let q = PageQuery { page: None, size: Some(" ".into()) };
        assert_eq!((q.page().unwrap(), q.size().unwrap()), (0, 10));
        let q = PageQuery { page: Some("2".into()), size: Some("25".into()) };
        assert_eq!((q.page().unwrap(), q.size().unwrap()), (2, 25));
    }

    #[test]
    fn malformed_page_is_bad_request() {
        let q = PageQuery { page: Some("abc".into()), size: None };
        let err = q.page().unwrap_err();
        assert_eq!(err.status_code(), 400);
        assert_eq!(err.message(), "Invalid page: abc");
        assert!(PageQuery { page: None, size: Some("-1".into()) }.size().is_err());
    }
}
