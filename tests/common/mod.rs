#![allow(dead_code)]

use bizscope::fetch::{EnrichmentSettings, RetryPolicy};
use bizscope::record::CompanyRecord;
use serde_json::json;
use std::time::Duration;
use url::Url;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const API_KEY: &str = "test-key";

/// Settings pointed at a mock server, with no pacing and millisecond backoff.
pub fn fast_settings(server: &MockServer) -> EnrichmentSettings {
    EnrichmentSettings {
        base_url: Url::parse(&format!("{}/companies", server.uri())).unwrap(),
        rate_limit_delay: Duration::ZERO,
        retry: RetryPolicy {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(1),
        },
        request_timeout: Duration::from_secs(5),
        batch_timeout: None,
        retry_server_errors: true,
    }
}

pub fn record(name: &str, status: &str) -> CompanyRecord {
    CompanyRecord {
        name: name.to_string(),
        status: status.to_string(),
        ..CompanyRecord::default()
    }
}

pub fn company_body(number: &str, status: &str) -> serde_json::Value {
    json!({
        "api_version": "0.4",
        "results": {
            "company": {
                "name": "whatever",
                "company_number": number,
                "current_status": status,
                "jurisdiction_code": "gb"
            }
        }
    })
}

/// Mount a registry hit for `name` that answers after `delay`.
pub async fn mount_company(
    server: &MockServer,
    name: &str,
    number: &str,
    status: &str,
    delay: Duration,
) {
    Mock::given(method("GET"))
        .and(path(format!("/companies/{}", name)))
        .and(query_param("api_token", API_KEY))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(company_body(number, status))
                .set_delay(delay),
        )
        .mount(server)
        .await;
}

/// Mount a fixed status for `name`, expecting exactly `times` requests.
pub async fn mount_status(server: &MockServer, name: &str, status: u16, times: u64) {
    Mock::given(method("GET"))
        .and(path(format!("/companies/{}", name)))
        .respond_with(ResponseTemplate::new(status))
        .expect(times)
        .mount(server)
        .await;
}
