// src/fetch/registry.rs

use serde_json::Value;
use std::fmt;

use crate::record::UNKNOWN;

/// What the registry knows about one company.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryEntry {
    pub company_number: String,
    pub status: String,
}

/// Settled result of one lookup. Everything except `Found` means "no data"
/// for the merge step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    Found(RegistryEntry),
    /// HTTP 200 without `results.company`.
    NoData,
    HttpStatus(u16),
    Transport(String),
    Decode(String),
    /// Still in flight when the batch timeout elapsed.
    TimedOut,
}

impl FetchOutcome {
    pub fn entry(&self) -> Option<&RegistryEntry> {
        match self {
            FetchOutcome::Found(e) => Some(e),
            _ => None,
        }
    }

    pub fn is_failure(&self) -> bool {
        !matches!(self, FetchOutcome::Found(_) | FetchOutcome::NoData)
    }
}

impl fmt::Display for FetchOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchOutcome::Found(e) => write!(f, "found {} ({})", e.company_number, e.status),
            FetchOutcome::NoData => write!(f, "no registry data"),
            FetchOutcome::HttpStatus(code) => write!(f, "HTTP {}", code),
            FetchOutcome::Transport(cause) => write!(f, "transport error: {}", cause),
            FetchOutcome::Decode(cause) => write!(f, "invalid response body: {}", cause),
            FetchOutcome::TimedOut => write!(f, "batch timed out"),
        }
    }
}

fn field(company: &Value, key: &str) -> String {
    match company.get(key) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => UNKNOWN.to_string(),
        Some(other) => other.to_string(),
    }
}

/// Interpret a 200 body: `{ "results": { "company": { ... } } }`.
pub fn parse_lookup_body(body: &str) -> FetchOutcome {
    let doc: Value = match serde_json::from_str(body) {
        Ok(v) => v,
        Err(e) => return FetchOutcome::Decode(e.to_string()),
    };
    match doc.get("results").and_then(|r| r.get("company")) {
        Some(company) if company.is_object() => FetchOutcome::Found(RegistryEntry {
            company_number: field(company, "company_number"),
            status: field(company, "current_status"),
        }),
        _ => FetchOutcome::NoData,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_payload() {
        let body = r#"{"api_version":"0.4","results":{"company":{
            "name":"ACME CORP","company_number":"01234567","current_status":"Active",
            "jurisdiction_code":"gb"}}}"#;
        assert_eq!(
            parse_lookup_body(body),
            FetchOutcome::Found(RegistryEntry {
                company_number: "01234567".to_string(),
                status: "Active".to_string(),
            })
        );
    }

    #[test]
    fn test_missing_fields_default_to_unknown() {
        let body = r#"{"results":{"company":{"current_status":null}}}"#;
        let out = parse_lookup_body(body);
        let entry = out.entry().expect("company present");
        assert_eq!(entry.company_number, UNKNOWN);
        assert_eq!(entry.status, UNKNOWN);
    }

    #[test]
    fn test_numeric_company_number_is_stringified() {
        let body = r#"{"results":{"company":{"company_number":42,"current_status":"Dissolved"}}}"#;
        let entry = parse_lookup_body(body).entry().cloned().expect("found");
        assert_eq!(entry.company_number, "42");
    }

    #[test]
    fn test_no_company_is_no_data() {
        assert_eq!(parse_lookup_body(r#"{"results":{}}"#), FetchOutcome::NoData);
        assert_eq!(parse_lookup_body(r#"{"error":"x"}"#), FetchOutcome::NoData);
        assert_eq!(parse_lookup_body(r#"[1,2]"#), FetchOutcome::NoData);
    }

    #[test]
    fn test_garbage_is_decode_error() {
        assert!(matches!(
            parse_lookup_body("<html>rate limited</html>"),
            FetchOutcome::Decode(_)
        ));
    }

    #[test]
    fn test_failure_classification() {
        assert!(!FetchOutcome::NoData.is_failure());
        assert!(FetchOutcome::HttpStatus(500).is_failure());
        assert!(FetchOutcome::TimedOut.is_failure());
        assert_eq!(FetchOutcome::HttpStatus(404).to_string(), "HTTP 404");
    }
}
