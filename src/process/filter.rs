// src/process/filter.rs

use tracing::debug;

use super::fuzzy::partial_ratio;
use crate::record::CompanyRecord;

/// Records must score strictly above this to pass the name filter.
pub const NAME_MATCH_THRESHOLD: f64 = 80.0;

/// Name and location predicates, combined with AND. Blank strings are no-ops.
#[derive(Debug, Clone)]
pub struct FilterCriteria {
    pub name: Option<String>,
    pub location: Option<String>,
    pub name_threshold: f64,
}

impl Default for FilterCriteria {
    fn default() -> Self {
        Self {
            name: None,
            location: None,
            name_threshold: NAME_MATCH_THRESHOLD,
        }
    }
}

fn non_blank(s: Option<&str>) -> Option<&str> {
    s.filter(|s| !s.trim().is_empty())
}

impl FilterCriteria {
    pub fn new(name: Option<&str>, location: Option<&str>) -> Self {
        Self {
            name: non_blank(name).map(str::to_string),
            location: non_blank(location).map(str::to_string),
            ..Self::default()
        }
    }

    pub fn with_name_threshold(mut self, threshold: f64) -> Self {
        self.name_threshold = threshold;
        self
    }

    pub fn is_empty(&self) -> bool {
        non_blank(self.name.as_deref()).is_none() && non_blank(self.location.as_deref()).is_none()
    }

    /// Whether a single record passes every active predicate.
    pub fn matches(&self, record: &CompanyRecord) -> bool {
        if let Some(name) = non_blank(self.name.as_deref()) {
            if partial_ratio(name, &record.name) <= self.name_threshold {
                return false;
            }
        }
        if let Some(loc) = non_blank(self.location.as_deref()) {
            if !record.has_location()
                || !record
                    .location
                    .to_lowercase()
                    .contains(&loc.to_lowercase())
            {
                return false;
            }
        }
        true
    }

    /// Filter `records`, preserving their relative order.
    pub fn apply(&self, records: &[CompanyRecord]) -> Vec<CompanyRecord> {
        let kept: Vec<CompanyRecord> = records
            .iter()
            .filter(|r| self.matches(r))
            .cloned()
            .collect();
        debug!(
            before = records.len(),
            after = kept.len(),
            name = ?self.name,
            location = ?self.location,
            "applied filters"
        );
        kept
    }
}

/// Convenience wrapper over [`FilterCriteria::apply`] with the default threshold.
pub fn filter_records(
    records: &[CompanyRecord],
    name: Option<&str>,
    location: Option<&str>,
) -> Vec<CompanyRecord> {
    FilterCriteria::new(name, location).apply(records)
}
