// src/config.rs

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::{fs, ops::RangeInclusive, path::Path, time::Duration};
use url::Url;

use crate::fetch::{EnrichmentSettings, RetryPolicy, DEFAULT_BASE_URL};

/// Accepted pacing delay, in whole seconds.
pub const RATE_LIMIT_DELAY_RANGE: RangeInclusive<u64> = 1..=10;
pub const MAX_ATTEMPTS_RANGE: RangeInclusive<u32> = 1..=10;

/// Operator settings for enrichment. Loaded from YAML; every field is optional
/// in the file. The API key never lives here.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub base_url: String,
    pub rate_limit_delay_secs: u64,
    pub max_attempts: u32,
    pub initial_backoff_ms: u64,
    pub request_timeout_secs: u64,
    pub batch_timeout_secs: Option<u64>,
    pub retry_server_errors: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            rate_limit_delay_secs: 1,
            max_attempts: 3,
            initial_backoff_ms: 100,
            request_timeout_secs: 30,
            batch_timeout_secs: None,
            retry_server_errors: true,
        }
    }
}

impl AppConfig {
    pub fn from_yaml_str(s: &str) -> Result<Self> {
        serde_yaml::from_str(s).context("parsing config YAML")
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text =
            fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
        Self::from_yaml_str(&text).with_context(|| format!("in {}", path.display()))
    }

    /// Check bounds and convert into client settings.
    pub fn enrichment_settings(&self) -> Result<EnrichmentSettings> {
        if !RATE_LIMIT_DELAY_RANGE.contains(&self.rate_limit_delay_secs) {
            bail!(
                "rate_limit_delay_secs must be within {}..={}, got {}",
                RATE_LIMIT_DELAY_RANGE.start(),
                RATE_LIMIT_DELAY_RANGE.end(),
                self.rate_limit_delay_secs
            );
        }
        if !MAX_ATTEMPTS_RANGE.contains(&self.max_attempts) {
            bail!(
                "max_attempts must be within {}..={}, got {}",
                MAX_ATTEMPTS_RANGE.start(),
                MAX_ATTEMPTS_RANGE.end(),
                self.max_attempts
            );
        }
        if self.request_timeout_secs == 0 {
            bail!("request_timeout_secs must be positive");
        }
        let base_url = Url::parse(&self.base_url)
            .with_context(|| format!("invalid base_url {}", self.base_url))?;

        Ok(EnrichmentSettings {
            base_url,
            rate_limit_delay: Duration::from_secs(self.rate_limit_delay_secs),
            retry: RetryPolicy {
                max_attempts: self.max_attempts,
                initial_backoff: Duration::from_millis(self.initial_backoff_ms),
            },
            request_timeout: Duration::from_secs(self.request_timeout_secs),
            batch_timeout: self.batch_timeout_secs.map(Duration::from_secs),
            retry_server_errors: self.retry_server_errors,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults_are_valid() {
        let s = AppConfig::default().enrichment_settings().unwrap();
        assert_eq!(s.rate_limit_delay, Duration::from_secs(1));
        assert_eq!(s.retry.max_attempts, 3);
        assert_eq!(s.base_url.as_str(), DEFAULT_BASE_URL);
        assert!(s.batch_timeout.is_none());
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let cfg = AppConfig::from_yaml_str("rate_limit_delay_secs: 5\nbatch_timeout_secs: 120\n")
            .unwrap();
        assert_eq!(cfg.rate_limit_delay_secs, 5);
        assert_eq!(cfg.batch_timeout_secs, Some(120));
        assert_eq!(cfg.max_attempts, 3);
    }

    #[test]
    fn test_unknown_keys_rejected() {
        assert!(AppConfig::from_yaml_str("api_key: secret\n").is_err());
    }

    #[test]
    fn test_delay_bounds() {
        for bad in [0, 11] {
            let cfg = AppConfig {
                rate_limit_delay_secs: bad,
                ..AppConfig::default()
            };
            assert!(cfg.enrichment_settings().is_err(), "delay {}", bad);
        }
        let cfg = AppConfig {
            rate_limit_delay_secs: 10,
            ..AppConfig::default()
        };
        assert!(cfg.enrichment_settings().is_ok());
    }

    #[test]
    fn test_bad_url_rejected() {
        let cfg = AppConfig {
            base_url: "not a url".into(),
            ..AppConfig::default()
        };
        assert!(cfg.enrichment_settings().is_err());
    }

    #[test]
    fn test_shipped_example_is_valid() {
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/config/bizscope.yaml");
        let cfg = AppConfig::load(path).unwrap();
        assert_eq!(cfg, AppConfig::default());
        assert!(cfg.enrichment_settings().is_ok());
    }

    #[test]
    fn test_load_from_file() {
        let mut f = NamedTempFile::new().unwrap();
        writeln!(f, "base_url: http://localhost:9999/companies").unwrap();
        writeln!(f, "retry_server_errors: false").unwrap();
        let cfg = AppConfig::load(f.path()).unwrap();
        assert_eq!(cfg.base_url, "http://localhost:9999/companies");
        assert!(!cfg.retry_server_errors);
    }
}
