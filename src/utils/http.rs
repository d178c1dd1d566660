// src/utils/http.rs

//! Resilient HTTP fetching.
//!
//! A [`Fetcher`] is built once from [`FetchConfig`] and handed to whoever
//! needs network access. Every request carries the same user agent and
//! header set, is bounded by the configured timeout, and is retried with
//! exponential backoff before giving up with [`AppError::Fetch`].

use std::time::Duration;

use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, HeaderMap, HeaderValue};

use crate::error::{AppError, Result};
use crate::models::FetchConfig;

/// Upper bound for a single backoff sleep.
const MAX_BACKOFF_SECS: f64 = 60.0;

/// HTTP GET with retry, backoff and a politeness delay.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: reqwest::Client,
    max_retries: u32,
    backoff_base: f64,
    request_delay: Duration,
}

impl Fetcher {
    /// Build a fetcher and its underlying client.
    pub fn new(config: &FetchConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static(
                "text/html,application/xhtml+xml,application/json;q=0.9,*/*;q=0.8",
            ),
        );
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));

        let client = reqwest::Client::builder()
            .user_agent(&config.user_agent)
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            max_retries: config.max_retries.max(1),
            backoff_base: config.backoff_base,
            request_delay: Duration::from_millis(config.request_delay_ms),
        })
    }

    /// Fetch raw bytes, retrying transport errors and non-2xx responses.
    pub async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>> {
        let mut last_cause = String::from("no attempt made");

        for attempt in 1..=self.max_retries {
            match self.try_fetch(url).await {
                Ok(bytes) => return Ok(bytes),
                Err(e) => {
                    log::debug!(
                        "Fetch attempt {}/{} failed for {}: {}",
                        attempt,
                        self.max_retries,
                        url,
                        e
                    );
                    last_cause = e.to_string();
                }
            }

            if attempt < self.max_retries {
                tokio::time::sleep(self.backoff(attempt)).await;
            }
        }

        Err(AppError::fetch(url, last_cause))
    }

    /// Fetch a page as text. Invalid UTF-8 is replaced, not rejected.
    pub async fn fetch_text(&self, url: &str) -> Result<String> {
        let bytes = self.fetch_bytes(url).await?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Sleep for the politeness delay between page requests.
    pub async fn pause(&self) {
        if !self.request_delay.is_zero() {
            tokio::time::sleep(self.request_delay).await;
        }
    }

    /// Backoff after failed attempt number `attempt` (1-based).
    pub fn backoff(&self, attempt: u32) -> Duration {
        let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
        let secs = self.backoff_base.powi(exponent);
        Duration::from_secs_f64(secs.clamp(0.0, MAX_BACKOFF_SECS))
    }

    async fn try_fetch(&self, url: &str) -> reqwest::Result<Vec<u8>> {
        let response = self.client.get(url).send().await?.error_for_status()?;
        Ok(response.bytes().await?.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn fast_config(max_retries: u32) -> FetchConfig {
        FetchConfig {
            user_agent: "catalog-sync-test/1.0".to_string(),
            timeout_secs: 5,
            max_retries,
            backoff_base: 0.0,
            request_delay_ms: 0,
        }
    }

    #[test]
    fn test_backoff_grows_exponentially() {
        let fetcher = Fetcher::new(&FetchConfig {
            backoff_base: 2.0,
            ..fast_config(4)
        })
        .unwrap();
        assert_eq!(fetcher.backoff(1), Duration::from_secs(2));
        assert_eq!(fetcher.backoff(3), Duration::from_secs(8));
        assert_eq!(fetcher.backoff(30), Duration::from_secs(60));
    }

    #[tokio::test]
    async fn test_fetch_sends_identity_headers() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/list.html"))
            .and(header("user-agent", "catalog-sync-test/1.0"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html></html>"))
            .expect(1)
            .mount(&server)
            .await;

        let fetcher = Fetcher::new(&fast_config(3)).unwrap();
        let body = fetcher
            .fetch_text(&format!("{}/list.html", server.uri()))
            .await
            .unwrap();
        assert_eq!(body, "<html></html>");
    }

    #[tokio::test]
    async fn test_retries_until_success() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/flaky"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(2)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/flaky"))
            .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
            .mount(&server)
            .await;

        let fetcher = Fetcher::new(&fast_config(3)).unwrap();
        let body = fetcher
            .fetch_text(&format!("{}/flaky", server.uri()))
            .await
            .unwrap();
        assert_eq!(body, "ok");
    }

    #[tokio::test]
    async fn test_exhausted_retries_is_fetch_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/gone"))
            .respond_with(ResponseTemplate::new(404))
            .expect(2)
            .mount(&server)
            .await;

        let fetcher = Fetcher::new(&fast_config(2)).unwrap();
        let url = format!("{}/gone", server.uri());
        let err = fetcher.fetch_bytes(&url).await.unwrap_err();

        match err {
            AppError::Fetch { url: failed, cause } => {
                assert_eq!(failed, url);
                assert!(cause.contains("404"), "cause was: {cause}");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
