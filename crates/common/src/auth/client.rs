//! OAuth 2.0 client-credentials client
//!
//! Posts `client_id`, `client_secret` and `grant_type=client_credentials`
//! form-encoded to the server's token endpoint.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use patcher_domain::constants::OAUTH_TOKEN_PATH;
use patcher_domain::PatcherError;
use reqwest::header::ACCEPT;
use reqwest::Client;
use serde_json::Value;
use tracing::debug;

use super::traits::TokenClient;
use super::types::{parse_token_response, AccessToken, ClientCredentials};

/// Token endpoint client backed by `reqwest`.
#[derive(Debug, Clone)]
pub struct OAuthClient {
    client: Client,
}

impl OAuthClient {
    /// Create a client whose requests time out after `timeout`.
    ///
    /// # Errors
    /// Returns [`PatcherError::Config`] if the HTTP client cannot be built.
    pub fn new(timeout: Duration) -> Result<Self, PatcherError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| PatcherError::config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client })
    }

    fn token_url(server_url: &str) -> String {
        format!("{}{}", server_url.trim_end_matches('/'), OAUTH_TOKEN_PATH)
    }
}

#[async_trait]
impl TokenClient for OAuthClient {
    async fn client_credentials(
        &self,
        credentials: &ClientCredentials,
    ) -> Result<AccessToken, PatcherError> {
        let url = Self::token_url(&credentials.server_url);
        let params = [
            ("client_id", credentials.client_id.as_str()),
            ("client_secret", credentials.client_secret.as_str()),
            ("grant_type", "client_credentials"),
        ];

        debug!(url = %url, "requesting client credentials token");
        let issued_at = Utc::now();
        let response = self
            .client
            .post(&url)
            .header(ACCEPT, "application/json")
            .form(&params)
            .send()
            .await
            .map_err(|e| PatcherError::token_fetch(format!("request to {url} failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PatcherError::token_fetch(format!("{} - {}", status.as_u16(), body)));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| PatcherError::token_fetch(format!("malformed token response: {e}")))?;

        parse_token_response(&body, issued_at)
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for auth::client.
    use wiremock::matchers::{body_string_contains, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn credentials(server: &MockServer) -> ClientCredentials {
        ClientCredentials::new(server.uri(), "client-123", "secret-456")
    }

    #[tokio::test]
    async fn posts_form_encoded_grant() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(OAUTH_TOKEN_PATH))
            .and(header("content-type", "application/x-www-form-urlencoded"))
            .and(body_string_contains("grant_type=client_credentials"))
            .and(body_string_contains("client_id=client-123"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"access_token": "abc", "expires_in": 1799})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = OAuthClient::new(Duration::from_secs(5)).unwrap();
        let token = client.client_credentials(&credentials(&server)).await.unwrap();
        assert_eq!(token.value, "abc");
        assert!(token.seconds_until_expiry() > 1700);
    }

    #[tokio::test]
    async fn non_success_status_reports_status_and_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(OAUTH_TOKEN_PATH))
            .respond_with(ResponseTemplate::new(500).set_body_string("upstream down"))
            .mount(&server)
            .await;

        let client = OAuthClient::new(Duration::from_secs(5)).unwrap();
        let err = client.client_credentials(&credentials(&server)).await.unwrap_err();
        assert_eq!(err, PatcherError::token_fetch("500 - upstream down"));
    }

    #[tokio::test]
    async fn zero_lifetime_is_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(OAUTH_TOKEN_PATH))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"access_token": "abc", "expires_in": 0})),
            )
            .mount(&server)
            .await;

        let client = OAuthClient::new(Duration::from_secs(5)).unwrap();
        let err = client.client_credentials(&credentials(&server)).await.unwrap_err();
        assert!(matches!(err, PatcherError::TokenLifetime { lifetime: Some(0) }));
    }

    #[tokio::test]
    async fn oversized_lifetime_is_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(OAUTH_TOKEN_PATH))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"access_token": "abc", "expires_in": 1e30})),
            )
            .mount(&server)
            .await;

        let client = OAuthClient::new(Duration::from_secs(5)).unwrap();
        let err = client.client_credentials(&credentials(&server)).await.unwrap_err();
        assert!(matches!(err, PatcherError::TokenLifetime { .. }));
    }
}
