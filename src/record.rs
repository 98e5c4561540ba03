// src/record.rs

use serde::Serialize;

/// Sentinel used for every field the input (or the registry) did not provide.
pub const UNKNOWN: &str = "Unknown";

/// A single company as parsed from one block of the uploaded file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompanyRecord {
    pub name: String,
    pub employees: String,
    pub category: String,
    pub location: String,
    pub id: String,
    pub status: String,
    pub contact: String,
    /// Only populated by enrichment; `None` means the record was never enriched.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub registration_number: Option<String>,
}

impl Default for CompanyRecord {
    fn default() -> Self {
        Self {
            name: UNKNOWN.to_string(),
            employees: UNKNOWN.to_string(),
            category: UNKNOWN.to_string(),
            location: UNKNOWN.to_string(),
            id: UNKNOWN.to_string(),
            status: UNKNOWN.to_string(),
            contact: UNKNOWN.to_string(),
            registration_number: None,
        }
    }
}

impl CompanyRecord {
    /// True when the location is a real value rather than blank or the sentinel.
    pub fn has_location(&self) -> bool {
        let loc = self.location.trim();
        !loc.is_empty() && loc != UNKNOWN
    }

    pub fn is_enriched(&self) -> bool {
        self.registration_number.is_some()
    }
}
