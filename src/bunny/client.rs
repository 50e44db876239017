//! Bunny API client implementation.
//!
//! This module provides the HTTP client for interacting with the Bunny REST API.

use reqwest::{Client, Method, StatusCode, header};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, trace};

use crate::config::ProviderConfig;
use crate::error::{ApiError, ProviderError, Result};

use super::types::{
    ApiErrorBody, EdgeRule, PullZone, StorageZone, StorageZoneAddOptions, StorageZoneUpdateOptions,
};

/// Header carrying the account API key.
const ACCESS_KEY_HEADER: &str = "AccessKey";

/// Maximum number of retries for transient failures.
const MAX_RETRIES: u32 = 3;

/// Delay between retries in milliseconds.
const RETRY_DELAY_MS: u64 = 1000;

/// Bunny API client.
#[derive(Debug, Clone)]
pub struct BunnyClient {
    /// HTTP client.
    client: Client,
    /// API key.
    api_key: String,
    /// API base URL without trailing slash.
    base_url: String,
    /// Base delay between retries.
    retry_delay: Duration,
}

/// What a request addresses, for not-found errors.
struct Target<'a> {
    kind: &'a str,
    id: String,
}

impl BunnyClient {
    /// Creates a client from the provider configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(config: &ProviderConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ApiError::network(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            base_url: config.api_url.trim_end_matches('/').to_string(),
            retry_delay: Duration::from_millis(RETRY_DELAY_MS),
        })
    }

    /// Overrides the base delay between retries.
    #[must_use]
    pub const fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    /// Executes a request, retrying transient failures.
    async fn execute(
        &self,
        method: Method,
        path: &str,
        body: Option<serde_json::Value>,
        target: &Target<'_>,
    ) -> Result<String> {
        let mut last_error = None;

        for attempt in 0..=MAX_RETRIES {
            if attempt > 0 {
                debug!("Retry attempt {attempt} of {MAX_RETRIES}");
                tokio::time::sleep(self.retry_delay * attempt).await;
            }

            match self.execute_once(method.clone(), path, body.as_ref(), target).await {
                Ok(text) => return Ok(text),
                Err(e) if e.is_retryable() => {
                    last_error = Some(ProviderError::Api(e));
                }
                Err(e) => return Err(ProviderError::Api(e)),
            }
        }

        Err(last_error.unwrap_or_else(|| {
            ProviderError::Api(ApiError::network("Max retries exceeded"))
        }))
    }

    /// Executes a single request.
    async fn execute_once(
        &self,
        method: Method,
        path: &str,
        body: Option<&serde_json::Value>,
        target: &Target<'_>,
    ) -> std::result::Result<String, ApiError> {
        let url = format!("{}{path}", self.base_url);
        trace!("{method} {url}");

        let mut request = self
            .client
            .request(method, &url)
            .header(ACCESS_KEY_HEADER, &self.api_key)
            .header(header::ACCEPT, "application/json");

        if let Some(body) = body {
            trace!("Request body: {body}");
            request = request.json(body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| ApiError::network(format!("Request failed: {e}")))?;

        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get(header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse().ok())
                .unwrap_or(1);

            return Err(ApiError::RateLimited {
                retry_after_secs: retry_after,
            });
        }

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(ApiError::AuthenticationFailed {
                message: String::from("Invalid API key"),
            });
        }

        if status == StatusCode::NOT_FOUND {
            return Err(ApiError::NotFound {
                kind: target.kind.to_string(),
                id: target.id.clone(),
            });
        }

        let text = response
            .text()
            .await
            .map_err(|e| ApiError::network(format!("Failed to read response: {e}")))?;

        if !status.is_success() {
            let message = serde_json::from_str::<ApiErrorBody>(&text)
                .ok()
                .and_then(|b| b.message)
                .unwrap_or(text);
            return Err(ApiError::request(status.as_u16(), message));
        }

        Ok(text)
    }

    fn parse<T: DeserializeOwned>(text: &str) -> Result<T> {
        serde_json::from_str(text).map_err(|e| {
            ProviderError::Api(ApiError::invalid_response(format!(
                "Failed to parse response: {e}"
            )))
        })
    }

    fn to_body<T: serde::Serialize>(value: &T) -> Result<serde_json::Value> {
        serde_json::to_value(value)
            .map_err(|e| ProviderError::internal(format!("Failed to serialize request: {e}")))
    }

    /// Creates a storage zone.
    ///
    /// # Errors
    ///
    /// Returns an error if the zone cannot be created.
    pub async fn add_storage_zone(&self, options: &StorageZoneAddOptions) -> Result<StorageZone> {
        let target = Target { kind: "storage zone", id: options.name.clone() };
        let text = self
            .execute(Method::POST, "/storagezone", Some(Self::to_body(options)?), &target)
            .await?;

        Self::parse(&text)
    }

    /// Gets a storage zone by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the zone is not found or the API call fails.
    pub async fn get_storage_zone(&self, id: i64) -> Result<StorageZone> {
        let target = Target { kind: "storage zone", id: id.to_string() };
        let text = self
            .execute(Method::GET, &format!("/storagezone/{id}"), None, &target)
            .await?;

        Self::parse(&text)
    }

    /// Updates the mutable fields of a storage zone.
    ///
    /// # Errors
    ///
    /// Returns an error if the zone cannot be updated.
    pub async fn update_storage_zone(
        &self,
        id: i64,
        options: &StorageZoneUpdateOptions,
    ) -> Result<()> {
        let target = Target { kind: "storage zone", id: id.to_string() };
        self.execute(
            Method::POST,
            &format!("/storagezone/{id}"),
            Some(Self::to_body(options)?),
            &target,
        )
        .await?;

        Ok(())
    }

    /// Deletes a storage zone and all the data it contains.
    ///
    /// # Errors
    ///
    /// Returns an error if the zone cannot be deleted.
    pub async fn delete_storage_zone(&self, id: i64) -> Result<()> {
        let target = Target { kind: "storage zone", id: id.to_string() };
        self.execute(Method::DELETE, &format!("/storagezone/{id}"), None, &target)
            .await?;

        Ok(())
    }

    /// Gets a pull zone, including its edge rules.
    ///
    /// # Errors
    ///
    /// Returns an error if the pull zone is not found or the API call fails.
    pub async fn get_pull_zone(&self, id: i64) -> Result<PullZone> {
        let target = Target { kind: "pull zone", id: id.to_string() };
        let text = self
            .execute(Method::GET, &format!("/pullzone/{id}"), None, &target)
            .await?;

        Self::parse(&text)
    }

    /// Adds an edge rule, or updates it when `rule.guid` is set.
    ///
    /// # Errors
    ///
    /// Returns an error if the rule cannot be stored.
    pub async fn add_or_update_edge_rule(&self, pull_zone_id: i64, rule: &EdgeRule) -> Result<()> {
        let target = Target { kind: "pull zone", id: pull_zone_id.to_string() };
        self.execute(
            Method::POST,
            &format!("/pullzone/{pull_zone_id}/edgerules/addOrUpdate"),
            Some(Self::to_body(rule)?),
            &target,
        )
        .await?;

        Ok(())
    }

    /// Deletes an edge rule.
    ///
    /// # Errors
    ///
    /// Returns an error if the rule cannot be deleted.
    pub async fn delete_edge_rule(&self, pull_zone_id: i64, guid: &str) -> Result<()> {
        let target = Target { kind: "edge rule", id: guid.to_string() };
        self.execute(
            Method::DELETE,
            &format!("/pullzone/{pull_zone_id}/edgerules/{guid}"),
            None,
            &target,
        )
        .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> BunnyClient {
        let config = ProviderConfig::new("test-key").with_api_url(server.uri());
        BunnyClient::new(&config)
            .expect("client")
            .with_retry_delay(Duration::from_millis(1))
    }

    #[tokio::test]
    async fn test_get_storage_zone_sends_access_key() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/storagezone/7"))
            .and(header("AccessKey", "test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "Id": 7,
                "Name": "assets",
                "Region": "DE",
                "ReplicationRegions": ["NY"],
                "ZoneTier": 0
            })))
            .expect(1)
            .mount(&server)
            .await;

        let zone = client(&server).get_storage_zone(7).await.expect("zone");
        assert_eq!(zone.name.as_deref(), Some("assets"));
        assert_eq!(zone.zone_tier, Some(0));
    }

    #[tokio::test]
    async fn test_add_storage_zone_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/storagezone"))
            .and(body_json(serde_json::json!({
                "Name": "assets",
                "Region": "SYD",
                "ReplicationRegions": ["DE"],
                "ZoneTier": 1
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({
                "Id": 99,
                "Name": "assets",
                "Region": "SYD"
            })))
            .mount(&server)
            .await;

        let options = StorageZoneAddOptions {
            name: String::from("assets"),
            region: Some(String::from("SYD")),
            replication_regions: vec![String::from("DE")],
            origin_url: None,
            zone_tier: Some(1),
        };

        let zone = client(&server).add_storage_zone(&options).await.expect("created");
        assert_eq!(zone.id, Some(99));
    }

    #[tokio::test]
    async fn test_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/storagezone/1"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let err = client(&server).get_storage_zone(1).await.expect_err("missing");
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_api_error_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/storagezone/1"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "ErrorKey": "storagezone.validation",
                "Message": "Replication region is not valid"
            })))
            .mount(&server)
            .await;

        let err = client(&server)
            .update_storage_zone(1, &StorageZoneUpdateOptions::default())
            .await
            .expect_err("bad request");

        match err {
            ProviderError::Api(ApiError::RequestFailed { status, message }) => {
                assert_eq!(status, 400);
                assert_eq!(message, "Replication region is not valid");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_unauthorized_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/storagezone/3"))
            .respond_with(ResponseTemplate::new(401))
            .expect(1)
            .mount(&server)
            .await;

        let err = client(&server).delete_storage_zone(3).await.expect_err("unauthorized");
        assert!(matches!(err, ProviderError::Api(ApiError::AuthenticationFailed { .. })));
    }

    #[tokio::test]
    async fn test_rate_limit_retried() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/pullzone/5"))
            .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "0"))
            .expect(4)
            .mount(&server)
            .await;

        let err = client(&server).get_pull_zone(5).await.expect_err("rate limited");
        assert!(matches!(err, ProviderError::Api(ApiError::RateLimited { .. })));
    }

    #[tokio::test]
    async fn test_succeeds_on_third_retry() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/pullzone/5"))
            .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "0"))
            .up_to_n_times(3)
            .expect(3)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/pullzone/5"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "Id": 5,
                "Name": "cdn",
                "EdgeRules": []
            })))
            .expect(1)
            .mount(&server)
            .await;

        let zone = client(&server).get_pull_zone(5).await.expect("pull zone");
        assert_eq!(zone.id, Some(5));
    }

    #[tokio::test]
    async fn test_delete_edge_rule_path() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/pullzone/5/edgerules/abc-123"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        client(&server)
            .delete_edge_rule(5, "abc-123")
            .await
            .expect("deleted");
    }
}
