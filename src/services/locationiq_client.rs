// src/services/locationiq_client.rs
// DOCUMENTATION: LocationIQ API client
// PURPOSE: Handle communication with LocationIQ search and nearby endpoints

use crate::config::Config;
use crate::errors::AppError;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use reqwest::Client;
use serde_json::Value;
use std::num::NonZeroU32;
use std::time::Duration;

/// LocationIQ API client
/// DOCUMENTATION: One shared HTTP client plus an outbound rate limiter
/// Requests wait for a permit instead of exceeding the provider quota
pub struct LocationIqClient {
    /// HTTP client for making requests
    client: Client,
    /// LocationIQ API key
    api_key: String,
    /// Base URL, e.g. https://us1.locationiq.com/v1
    base_url: String,
    limiter: DefaultDirectRateLimiter,
}

impl LocationIqClient {
    /// Create new LocationIQ client
    /// DOCUMENTATION: `rate_limit` is requests per second, 0 is treated as 1
    pub fn new(client: Client, api_key: String, base_url: String, rate_limit: u32) -> Self {
        let per_second = NonZeroU32::new(rate_limit).unwrap_or(NonZeroU32::MIN);

        Self {
            client,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            limiter: RateLimiter::direct(Quota::per_second(per_second)),
        }
    }

    /// Build the client and its reqwest::Client from configuration
    pub fn from_config(config: &Config) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.locationiq_timeout))
            .build()
            .map_err(|e| AppError::InternalError(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self::new(
            client,
            config.locationiq_api_key.clone(),
            config.locationiq_base_url.clone(),
            config.locationiq_rate_limit,
        ))
    }

    /// Get API key
    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    /// Free-text search
    /// DOCUMENTATION: GET {base}/search, returns the raw JSON items
    pub async fn search(&self, params: &[(&str, String)]) -> Result<Vec<Value>, AppError> {
        self.fetch("search", params).await
    }

    /// Points of interest around a coordinate
    /// DOCUMENTATION: GET {base}/nearby, returns the raw JSON items
    pub async fn nearby(&self, params: &[(&str, String)]) -> Result<Vec<Value>, AppError> {
        self.fetch("nearby", params).await
    }

    async fn fetch(
        &self,
        endpoint: &str,
        params: &[(&str, String)],
    ) -> Result<Vec<Value>, AppError> {
        let url = format!("{}/{}", self.base_url, endpoint);

        self.limiter.until_ready().await;
        log::debug!("LocationIQ request: GET {}", url);

        let response = self
            .client
            .get(&url)
            .query(params)
            .send()
            .await
            .map_err(|e| {
                log::error!("LocationIQ request failed: {}", e);
                AppError::ExternalService {
                    status: 503,
                    message: "LocationIQ temporarily unavailable".to_string(),
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            log::error!("LocationIQ API error {}: {}", status, body);
            return Err(AppError::ExternalService {
                status: status.as_u16(),
                message: format!("LocationIQ error: {}", body),
            });
        }

        let payload: Value = response.json().await.map_err(|e| {
            log::error!("Failed to parse LocationIQ response: {}", e);
            AppError::ExternalService {
                status: 502,
                message: "LocationIQ returned an unreadable response".to_string(),
            }
        })?;

        match payload {
            Value::Array(items) => {
                log::info!("LocationIQ {} returned {} results", endpoint, items.len());
                Ok(items)
            }
            other => {
                log::error!("LocationIQ {} returned a non-list payload: {}", endpoint, other);
                Err(AppError::ExternalService {
                    status: 502,
                    message: "LocationIQ returned an unexpected response".to_string(),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};

    fn client(base_url: &str) -> LocationIqClient {
        LocationIqClient::new(Client::new(), "test-key".to_string(), base_url.to_string(), 100)
    }

    #[tokio::test]
    async fn test_search_returns_items_and_sends_key() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/search")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("key".into(), "test-key".into()),
                Matcher::UrlEncoded("q".into(), "Berlin".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"[{"place_id":"1","lat":"52.5","lon":"13.4","display_name":"Berlin"}]"#)
            .expect(1)
            .create_async()
            .await;

        let client = client(&server.url());
        let params = vec![("key", "test-key".to_string()), ("q", "Berlin".to_string())];
        let items = client.search(&params).await.unwrap();

        assert_eq!(items.len(), 1);
        assert_eq!(items[0]["display_name"], "Berlin");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_provider_status_is_propagated() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/nearby")
            .match_query(Matcher::Any)
            .with_status(401)
            .with_body(r#"{"error":"Invalid key"}"#)
            .create_async()
            .await;

        match client(&server.url()).nearby(&[]).await {
            Err(AppError::ExternalService { status, message }) => {
                assert_eq!(status, 401);
                assert!(message.starts_with("LocationIQ error: "));
                assert!(message.contains("Invalid key"));
            }
            other => panic!("expected external service error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_non_list_payload_is_bad_gateway() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/search")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"error":"Unable to geocode"}"#)
            .create_async()
            .await;

        let err = client(&server.url()).search(&[]).await.unwrap_err();
        assert!(matches!(err, AppError::ExternalService { status: 502, .. }));
    }

    #[tokio::test]
    async fn test_unreachable_provider_is_service_unavailable() {
        // Nothing listens on port 9 (discard) in the test environment
        let err = client("http://127.0.0.1:9").search(&[]).await.unwrap_err();

        match err {
            AppError::ExternalService { status, message } => {
                assert_eq!(status, 503);
                assert_eq!(message, "LocationIQ temporarily unavailable");
            }
            other => panic!("expected external service error, got {:?}", other),
        }
    }
}
