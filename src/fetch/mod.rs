// src/fetch/mod.rs

//! Registry enrichment: one paced, retried lookup per record, all in flight
//! at once on a single task, merged back by position.
//!
//! Pacing is a fixed sleep before each lookup. Every lookup in a batch
//! sleeps the same delay and then fires, so this spaces a batch out from
//! whatever ran before it but does not throttle requests within the batch.
//! Strict throttling would need a token bucket or semaphore in front of
//! `fetch_company`.

pub mod registry;
pub mod retry;

use futures::{stream::FuturesUnordered, StreamExt};
use reqwest::{Client, StatusCode};
use std::{error::Error as _, time::Duration};
use thiserror::Error;
use tokio::time::{sleep, timeout, Instant};
use tracing::{debug, error, info, instrument, warn};
use url::Url;

use crate::record::{CompanyRecord, UNKNOWN};
pub use registry::{parse_lookup_body, FetchOutcome, RegistryEntry};
pub use retry::RetryPolicy;

pub const DEFAULT_BASE_URL: &str = "https://api.opencorporates.com/v0.4/companies";

#[derive(Error, Debug)]
pub enum EnrichError {
    #[error("an API key is required for enrichment")]
    MissingCredential,

    #[error("invalid enrichment settings: {0}")]
    InvalidSettings(String),

    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),

    #[error("failed to start async runtime: {0}")]
    Runtime(#[from] std::io::Error),
}

#[derive(Debug, Clone)]
pub struct EnrichmentSettings {
    /// Lookups go to `{base_url}/{company_name}`.
    pub base_url: Url,
    /// Slept before the first attempt of every lookup.
    pub rate_limit_delay: Duration,
    pub retry: RetryPolicy,
    pub request_timeout: Duration,
    /// Safety net for the whole batch; lookups still running are dropped.
    pub batch_timeout: Option<Duration>,
    /// Also retry 5xx responses, not just transport failures.
    pub retry_server_errors: bool,
}

impl Default for EnrichmentSettings {
    fn default() -> Self {
        Self {
            base_url: Url::parse(DEFAULT_BASE_URL).expect("default base URL should parse"),
            rate_limit_delay: Duration::from_secs(1),
            retry: RetryPolicy::default(),
            request_timeout: Duration::from_secs(30),
            batch_timeout: None,
            retry_server_errors: true,
        }
    }
}

/// `{base}/{name}` with `name` percent-encoded as a single path segment.
pub fn company_url(base: &Url, name: &str) -> Option<Url> {
    let mut url = base.clone();
    url.path_segments_mut().ok()?.pop_if_empty().push(name);
    Some(url)
}

/// Describe a transport failure without the request URL, which carries the
/// API key in its query string.
pub fn transport_cause(err: reqwest::Error) -> String {
    let err = err.without_url();
    let mut msg = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        msg.push_str(": ");
        msg.push_str(&cause.to_string());
        source = cause.source();
    }
    msg
}

/// Write outcomes back onto the records they were fetched for, by index.
pub fn merge_outcomes(records: &mut [CompanyRecord], outcomes: &[FetchOutcome]) {
    for (record, outcome) in records.iter_mut().zip(outcomes) {
        match outcome.entry() {
            Some(entry) => {
                record.registration_number = Some(entry.company_number.clone());
                record.status = entry.status.clone();
            }
            None => {
                record.registration_number = Some(UNKNOWN.to_string());
            }
        }
    }
}

pub struct EnrichmentClient {
    settings: EnrichmentSettings,
}

impl EnrichmentClient {
    pub fn new(settings: EnrichmentSettings) -> Result<Self, EnrichError> {
        if settings.base_url.cannot_be_a_base() {
            return Err(EnrichError::InvalidSettings(format!(
                "base URL {} cannot take path segments",
                settings.base_url
            )));
        }
        Ok(Self { settings })
    }

    pub fn settings(&self) -> &EnrichmentSettings {
        &self.settings
    }

    fn http_client(&self) -> Result<Client, EnrichError> {
        Ok(Client::builder()
            .timeout(self.settings.request_timeout)
            .build()?)
    }

    fn should_retry(&self, outcome: &FetchOutcome) -> bool {
        match outcome {
            FetchOutcome::Transport(_) => true,
            FetchOutcome::HttpStatus(code) => {
                self.settings.retry_server_errors && *code >= 500 && *code < 600
            }
            _ => false,
        }
    }

    async fn attempt(&self, client: &Client, url: &Url, api_key: &str) -> FetchOutcome {
        let resp = match client
            .get(url.clone())
            .query(&[("api_token", api_key)])
            .send()
            .await
        {
            Ok(resp) => resp,
            Err(e) => return FetchOutcome::Transport(transport_cause(e)),
        };

        let status = resp.status();
        if status != StatusCode::OK {
            return FetchOutcome::HttpStatus(status.as_u16());
        }

        match resp.text().await {
            Ok(body) => parse_lookup_body(&body),
            Err(e) => FetchOutcome::Transport(transport_cause(e)),
        }
    }

    /// Look up one company: pace, then retry per policy. Failures are logged
    /// and returned as outcomes, never as errors.
    #[instrument(level = "debug", skip(self, client, api_key))]
    pub async fn fetch_company(&self, client: &Client, company: &str, api_key: &str) -> FetchOutcome {
        sleep(self.settings.rate_limit_delay).await;

        let Some(url) = company_url(&self.settings.base_url, company) else {
            return FetchOutcome::Transport(format!(
                "cannot build lookup URL from {}",
                self.settings.base_url
            ));
        };

        let outcome = self
            .settings
            .retry
            .run(
                company,
                |_| self.attempt(client, &url, api_key),
                |o| self.should_retry(o),
            )
            .await;

        match &outcome {
            FetchOutcome::Found(entry) => {
                debug!(company, number = %entry.company_number, "registry hit")
            }
            FetchOutcome::NoData => debug!(company, "registry returned no company"),
            FetchOutcome::HttpStatus(code) => {
                warn!(company, status = code, "failed to fetch registry data")
            }
            FetchOutcome::Transport(cause) => {
                error!(company, error = %cause, "error fetching registry data")
            }
            FetchOutcome::Decode(cause) => {
                warn!(company, error = %cause, "unreadable registry response")
            }
            FetchOutcome::TimedOut => {}
        }
        outcome
    }

    /// Enrich `records` in place. Returns one outcome per record, in record
    /// order. Only a missing key or an unusable client fails the call, and
    /// both are checked before any request goes out.
    pub async fn enrich(
        &self,
        records: &mut [CompanyRecord],
        api_key: &str,
    ) -> Result<Vec<FetchOutcome>, EnrichError> {
        let api_key = api_key.trim();
        if api_key.is_empty() {
            return Err(EnrichError::MissingCredential);
        }
        let client = self.http_client()?;

        let start = Instant::now();
        info!(
            count = records.len(),
            delay_ms = self.settings.rate_limit_delay.as_millis() as u64,
            "starting enrichment batch"
        );

        let mut pending: FuturesUnordered<_> = records
            .iter()
            .enumerate()
            .map(|(idx, rec)| {
                let name = rec.name.clone();
                let client = &client;
                async move { (idx, self.fetch_company(client, &name, api_key).await) }
            })
            .collect();

        let mut slots: Vec<Option<FetchOutcome>> = (0..records.len()).map(|_| None).collect();
        let gather = async {
            while let Some((idx, outcome)) = pending.next().await {
                slots[idx] = Some(outcome);
            }
        };
        match self.settings.batch_timeout {
            Some(limit) => {
                if timeout(limit, gather).await.is_err() {
                    warn!(
                        limit_ms = limit.as_millis() as u64,
                        "enrichment batch timed out; dropping unfinished lookups"
                    );
                }
            }
            None => gather.await,
        }
        drop(pending);

        let outcomes: Vec<FetchOutcome> = slots
            .into_iter()
            .map(|o| o.unwrap_or(FetchOutcome::TimedOut))
            .collect();
        merge_outcomes(records, &outcomes);

        let found = outcomes.iter().filter(|o| o.entry().is_some()).count();
        let failed = outcomes.iter().filter(|o| o.is_failure()).count();
        info!(
            found,
            failed,
            elapsed = ?start.elapsed(),
            "enrichment batch complete"
        );
        Ok(outcomes)
    }

    /// Blocking facade: runs [`enrich`](Self::enrich) to completion on a
    /// fresh current-thread runtime. Must not be called from inside a runtime.
    pub fn enrich_blocking(
        &self,
        records: &mut [CompanyRecord],
        api_key: &str,
    ) -> Result<Vec<FetchOutcome>, EnrichError> {
        if api_key.trim().is_empty() {
            return Err(EnrichError::MissingCredential);
        }
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        rt.block_on(self.enrich(records, api_key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(name: &str, status: &str) -> CompanyRecord {
        CompanyRecord {
            name: name.to_string(),
            status: status.to_string(),
            ..CompanyRecord::default()
        }
    }

    #[test]
    fn test_company_url_encodes_segment() {
        let base = Url::parse("https://api.example.com/v0.4/companies/").unwrap();
        let url = company_url(&base, "Acme Corp/UK").unwrap();
        assert_eq!(
            url.as_str(),
            "https://api.example.com/v0.4/companies/Acme%20Corp%2FUK"
        );
    }

    #[test]
    fn test_merge_is_positional() {
        let mut recs = vec![rec("A", "old-a"), rec("B", "old-b"), rec("C", "old-c")];
        let outcomes = vec![
            FetchOutcome::HttpStatus(500),
            FetchOutcome::Found(RegistryEntry {
                company_number: "222".into(),
                status: "Active".into(),
            }),
            FetchOutcome::NoData,
        ];
        merge_outcomes(&mut recs, &outcomes);

        assert_eq!(recs[0].registration_number.as_deref(), Some(UNKNOWN));
        assert_eq!(recs[0].status, "old-a");
        assert_eq!(recs[1].registration_number.as_deref(), Some("222"));
        assert_eq!(recs[1].status, "Active");
        assert_eq!(recs[2].registration_number.as_deref(), Some(UNKNOWN));
        assert_eq!(recs[2].status, "old-c");
    }

    #[test]
    fn test_missing_credential_before_any_work() {
        let client = EnrichmentClient::new(EnrichmentSettings::default()).unwrap();
        let mut recs = vec![rec("A", "s")];
        let err = client.enrich_blocking(&mut recs, "   ").unwrap_err();
        assert!(matches!(err, EnrichError::MissingCredential));
        assert_eq!(recs[0].registration_number, None);
    }

    #[test]
    fn test_rejects_non_base_url() {
        let settings = EnrichmentSettings {
            base_url: Url::parse("mailto:ops@example.com").unwrap(),
            ..EnrichmentSettings::default()
        };
        assert!(matches!(
            EnrichmentClient::new(settings),
            Err(EnrichError::InvalidSettings(_))
        ));
    }

    #[test]
    fn test_retry_classification() {
        let client = EnrichmentClient::new(EnrichmentSettings::default()).unwrap();
        assert!(client.should_retry(&FetchOutcome::Transport("reset".into())));
        assert!(client.should_retry(&FetchOutcome::HttpStatus(503)));
        assert!(!client.should_retry(&FetchOutcome::HttpStatus(404)));
        assert!(!client.should_retry(&FetchOutcome::NoData));

        let no_5xx = EnrichmentClient::new(EnrichmentSettings {
            retry_server_errors: false,
            ..EnrichmentSettings::default()
        })
        .unwrap();
        assert!(!no_5xx.should_retry(&FetchOutcome::HttpStatus(503)));
    }

    #[tokio::test]
    async fn test_empty_batch() {
        let client = EnrichmentClient::new(EnrichmentSettings::default()).unwrap();
        let mut recs: Vec<CompanyRecord> = Vec::new();
        let out = client.enrich(&mut recs, "key").await.unwrap();
        assert!(out.is_empty());
    }
}
