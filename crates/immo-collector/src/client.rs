//! HTTP client for the thinkimmo.com `/immo` search endpoint.

use std::time::Duration;

use reqwest::Client;
use serde_json::Value;

use crate::error::CollectorError;
use crate::query::SearchQuery;
use crate::rate_limit::retry_with_backoff;

pub const DEFAULT_BASE_URL: &str = "https://api.thinkimmo.com";

/// Fetches single search pages. 429, 5xx and network failures are retried
/// with exponential backoff up to `max_retries` additional attempts.
pub struct ThinkImmoClient {
    client: Client,
    search_url: reqwest::Url,
    max_retries: u32,
    backoff_base_ms: u64,
}

impl ThinkImmoClient {
    /// # Errors
    ///
    /// Returns [`CollectorError::InvalidBaseUrl`] if `base_url` does not parse,
    /// or [`CollectorError::Http`] if the `reqwest::Client` cannot be built.
    pub fn new(
        base_url: &str,
        timeout_secs: u64,
        user_agent: &str,
        max_retries: u32,
        backoff_base_ms: u64,
    ) -> Result<Self, CollectorError> {
        let search_url = format!("{}/immo", base_url.trim_end_matches('/'));
        let search_url =
            reqwest::Url::parse(&search_url).map_err(|e| CollectorError::InvalidBaseUrl {
                base_url: base_url.to_owned(),
                reason: e.to_string(),
            })?;
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;
        Ok(Self {
            client,
            search_url,
            max_retries,
            backoff_base_ms,
        })
    }

    /// Fetches one page of search results as raw JSON.
    ///
    /// # Errors
    ///
    /// - [`CollectorError::RateLimited`]: HTTP 429 after all retries.
    /// - [`CollectorError::UnexpectedStatus`]: any other non-2xx (5xx retried, 4xx not).
    /// - [`CollectorError::Http`]: network or TLS failure after all retries.
    /// - [`CollectorError::Deserialize`]: body is not JSON (not retried).
    pub async fn fetch_page(&self, query: &SearchQuery) -> Result<Value, CollectorError> {
        let params = query.to_params();
        let params = &params;

        retry_with_backoff(self.max_retries, self.backoff_base_ms, || async move {
            let response = self
                .client
                .get(self.search_url.clone())
                .query(params)
                .header(reqwest::header::ACCEPT, "application/json")
                .send()
                .await?;
            let status = response.status();

            if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                let retry_after_secs = response
                    .headers()
                    .get(reqwest::header::RETRY_AFTER)
                    .and_then(|v| v.to_str().ok())
                    .and_then(|s| s.trim().parse::<u64>().ok());
                return Err(CollectorError::RateLimited { retry_after_secs });
            }

            if !status.is_success() {
                return Err(CollectorError::UnexpectedStatus {
                    status: status.as_u16(),
                    url: self.search_url.to_string(),
                });
            }

            let body = response.text().await?;
            serde_json::from_str::<Value>(&body).map_err(|e| CollectorError::Deserialize {
                context: format!(
                    "search page for {} at offset {}",
                    query.city.name, query.offset
                ),
                source: e,
            })
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_url_joins_base_without_double_slash() {
        let client = ThinkImmoClient::new("http://127.0.0.1:9/", 5, "immo-test/0.1", 0, 0)
            .expect("client");
        assert_eq!(client.search_url.as_str(), "http://127.0.0.1:9/immo");
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        let result = ThinkImmoClient::new("not a url", 5, "immo-test/0.1", 0, 0);
        assert!(matches!(
            result,
            Err(CollectorError::InvalidBaseUrl { ref base_url, .. }) if base_url == "not a url"
        ));
    }
}
