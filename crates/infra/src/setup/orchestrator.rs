//! First-run setup
//!
//! Walks an administrator from a server URL to a working client-credentials
//! token:
//!
//! ```text
//! NotStarted → AwaitingConfirmation → BasicAuthFlow → RoleCreated → ClientCreated
//!                                   └→ ManualCredentialFlow ────────────────┤
//!                                                                           ↓
//!                                 Complete ← ConfigPersisted ← TokenIssued ←┘
//! ```
//!
//! The completion marker is written only after every step succeeded, so an
//! interrupted setup starts over on the next launch.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{Duration, Utc};
use patcher_common::auth::{AccessToken, ClientCredentials, TokenClient};
use patcher_common::security::CredentialStore;
use patcher_core::{CompletionMarker, Prompter};
use patcher_domain::constants::{
    API_CLIENT_NAME, API_CLIENT_TOKEN_LIFETIME_SECS, API_INTEGRATIONS_PATH, API_ROLES_PATH,
    API_ROLE_NAME, API_ROLE_PRIVILEGES, BASIC_TOKEN_PATH,
};
use patcher_domain::{Config, CredentialKey, PatcherError, Result};
use reqwest::header::{ACCEPT, AUTHORIZATION};
use reqwest::{Method, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info, instrument, warn};
use url::Url;

use crate::config::save_to_file;
use crate::http::HttpClient;

const DEFAULT_FONT_NAME: &str = "Assistant";
const CUSTOM_FONT_NAME: &str = "CustomFont";
const FONTS_DIR_NAME: &str = "fonts";

/// Progress through the setup flow
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetupState {
    NotStarted,
    AwaitingConfirmation,
    BasicAuthFlow,
    ManualCredentialFlow,
    RoleCreated,
    ClientCreated,
    TokenIssued,
    ConfigPersisted,
    Complete,
}

/// How a call to [`SetupOrchestrator::run`] ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetupOutcome {
    /// Every step succeeded and the marker was written
    Completed,
    /// The marker already recorded a finished setup
    AlreadyComplete,
    /// The user answered no to the confirmation prompt
    Declined,
}

/// Options for a single setup run
#[derive(Debug, Clone, Copy)]
pub struct SetupOptions {
    /// Ask "Ready to proceed?" before prompting for credentials
    pub confirm: bool,
}

impl Default for SetupOptions {
    fn default() -> Self {
        Self { confirm: true }
    }
}

#[derive(Debug, Deserialize)]
struct BasicTokenResponse {
    token: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiClientResponse {
    id: Value,
    client_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ClientSecretResponse {
    client_secret: Option<String>,
}

/// Drives first-run setup and credential reset
pub struct SetupOrchestrator {
    http: HttpClient,
    store: Arc<dyn CredentialStore>,
    token_client: Arc<dyn TokenClient>,
    marker: Arc<dyn CompletionMarker>,
    prompter: Arc<dyn Prompter>,
    config: Config,
    config_path: PathBuf,
    state: SetupState,
}

impl SetupOrchestrator {
    /// Create an orchestrator using the configured request timeout
    ///
    /// # Errors
    /// Returns [`PatcherError::Config`] if the HTTP client cannot be built.
    pub fn new(
        config: Config,
        config_path: PathBuf,
        store: Arc<dyn CredentialStore>,
        token_client: Arc<dyn TokenClient>,
        marker: Arc<dyn CompletionMarker>,
        prompter: Arc<dyn Prompter>,
    ) -> Result<Self> {
        let http = HttpClient::builder()
            .timeout(config.api.request_timeout())
            .build()
            .map_err(|e| PatcherError::config(e.to_string()))?;

        Ok(Self {
            http,
            store,
            token_client,
            marker,
            prompter,
            config,
            config_path,
            state: SetupState::NotStarted,
        })
    }

    #[must_use]
    pub fn state(&self) -> SetupState {
        self.state
    }

    /// Configuration including any report settings captured during setup
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Whether the completion marker records a finished setup
    ///
    /// # Errors
    /// Returns [`PatcherError::Plist`] if the marker cannot be read.
    pub fn is_complete(&self) -> Result<bool> {
        self.marker.is_complete()
    }

    /// Run the setup flow unless it already completed
    ///
    /// # Errors
    /// - [`PatcherError::Setup`] for invalid input or a rejected SSO fallback
    /// - [`PatcherError::TokenFetch`] / [`PatcherError::TokenLifetime`] when no
    ///   usable token can be obtained
    /// - [`PatcherError::ApiResponse`] when role or client creation fails
    /// - [`PatcherError::Keychain`], [`PatcherError::Config`] or
    ///   [`PatcherError::Plist`] when local state cannot be written
    #[instrument(skip(self), fields(confirm = options.confirm))]
    pub async fn run(&mut self, options: SetupOptions) -> Result<SetupOutcome> {
        if self.marker.is_complete()? {
            debug!("Setup already completed");
            self.state = SetupState::Complete;
            return Ok(SetupOutcome::AlreadyComplete);
        }

        info!("Starting setup assistant");
        self.state = SetupState::AwaitingConfirmation;
        if options.confirm && !self.prompter.confirm("Ready to proceed?", false)? {
            info!("User declined setup");
            self.state = SetupState::NotStarted;
            return Ok(SetupOutcome::Declined);
        }

        let raw_url = self.prompter.input("Enter your Jamf Pro URL", None)?;
        let server_url = normalize_server_url(&raw_url)?;
        let username = self.prompter.input("Enter your Jamf Pro username", None)?;
        let password = self.prompter.secret("Enter your Jamf Pro password")?;

        self.state = SetupState::BasicAuthFlow;
        let (client_id, client_secret) =
            match self.basic_token(&server_url, &username, &password).await? {
                Some(token) => self.provision_client(&server_url, &token).await?,
                None => self.manual_credentials()?,
            };

        self.store_credentials(&server_url, &client_id, &client_secret)?;
        self.issue_token(ClientCredentials::new(&server_url, client_id, client_secret)).await?;

        self.capture_report_settings()?;
        save_to_file(&self.config, &self.config_path)?;
        self.state = SetupState::ConfigPersisted;

        self.marker.set_complete(true)?;
        self.state = SetupState::Complete;
        info!(server_url = %server_url, "Setup completed");
        Ok(SetupOutcome::Completed)
    }

    /// Remove every stored secret and clear the completion marker
    ///
    /// All deletions are attempted. If any of them fails the marker is left
    /// untouched.
    ///
    /// # Errors
    /// - [`PatcherError::CredentialDeletion`] listing the secrets that remain
    /// - [`PatcherError::Plist`] if the marker cannot be written
    #[instrument(skip(self))]
    pub fn reset(&mut self) -> Result<()> {
        let failed: Vec<String> = CredentialKey::ALL
            .into_iter()
            .filter_map(|key| match self.store.delete(key) {
                Ok(()) => None,
                Err(e) => {
                    warn!(credential = %key, error = %e, "Failed to delete credential");
                    Some(key.to_string())
                }
            })
            .collect();

        if !failed.is_empty() {
            return Err(PatcherError::CredentialDeletion { credentials: failed });
        }

        self.marker.set_complete(false)?;
        self.state = SetupState::NotStarted;
        info!("Credentials removed and setup marker cleared");
        Ok(())
    }

    /// Basic-auth token, or `None` when the server answered 401
    #[instrument(skip_all, fields(server_url = %server_url))]
    async fn basic_token(
        &self,
        server_url: &str,
        username: &str,
        password: &str,
    ) -> Result<Option<String>> {
        let url = format!("{server_url}{BASIC_TOKEN_PATH}");
        let request = self
            .http
            .request(Method::POST, &url)
            .basic_auth(username, Some(password))
            .header(ACCEPT, "application/json");

        let response = self
            .http
            .send(request)
            .await
            .map_err(|e| PatcherError::token_fetch(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            warn!("Basic authentication returned 401");
            return Ok(None);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PatcherError::token_fetch(format!("{} - {}", status.as_u16(), body)));
        }

        let body: BasicTokenResponse = response.json().await.map_err(|e| {
            PatcherError::token_fetch(format!("malformed basic token response: {e}"))
        })?;

        if body.token.is_empty() {
            return Err(PatcherError::token_fetch("basic token response was empty"));
        }
        Ok(Some(body.token))
    }

    fn manual_credentials(&mut self) -> Result<(String, String)> {
        if !self.prompter.confirm("We received a 401 response. Are you using SSO?", false)? {
            return Err(PatcherError::setup(
                "basic authentication was rejected; verify the account does not use SSO",
            ));
        }

        self.state = SetupState::ManualCredentialFlow;
        let client_id = self.prompter.input("Enter your API Client ID", None)?;
        let client_secret = self.prompter.secret("Enter your API Client Secret")?;
        if client_id.trim().is_empty() || client_secret.trim().is_empty() {
            return Err(PatcherError::setup("API client id and secret are required"));
        }
        Ok((client_id.trim().to_string(), client_secret.trim().to_string()))
    }

    #[instrument(skip_all, fields(server_url = %server_url))]
    async fn provision_client(
        &mut self,
        server_url: &str,
        token: &str,
    ) -> Result<(String, String)> {
        let role = json!({
            "displayName": API_ROLE_NAME,
            "privileges": API_ROLE_PRIVILEGES,
        });
        self.post_json(&format!("{server_url}{API_ROLES_PATH}"), token, Some(&role)).await?;
        self.state = SetupState::RoleCreated;
        info!(role = API_ROLE_NAME, "API role created");

        let client = json!({
            "authorizationScopes": [API_ROLE_NAME],
            "displayName": API_CLIENT_NAME,
            "enabled": true,
            "accessTokenLifetimeSeconds": API_CLIENT_TOKEN_LIFETIME_SECS,
        });
        let created: ApiClientResponse = decode(
            self.post_json(&format!("{server_url}{API_INTEGRATIONS_PATH}"), token, Some(&client))
                .await?,
        )?;

        let client_id = created
            .client_id
            .filter(|id| !id.is_empty())
            .ok_or_else(|| PatcherError::setup("API client response did not contain a clientId"))?;
        let integration_id = match created.id {
            Value::String(id) if !id.is_empty() => id,
            Value::Number(id) => id.to_string(),
            _ => return Err(PatcherError::setup("API client response did not contain an id")),
        };

        let secret_url =
            format!("{server_url}{API_INTEGRATIONS_PATH}/{integration_id}/client-credentials");
        let secret: ClientSecretResponse = decode(self.post_json(&secret_url, token, None).await?)?;
        let client_secret = secret
            .client_secret
            .filter(|s| !s.is_empty())
            .ok_or_else(|| PatcherError::setup("unable to retrieve client secret"))?;

        self.state = SetupState::ClientCreated;
        info!(client = API_CLIENT_NAME, client_id = %client_id, "API client created");
        Ok((client_id, client_secret))
    }

    async fn post_json(&self, url: &str, token: &str, body: Option<&Value>) -> Result<Value> {
        let mut request = self
            .http
            .request(Method::POST, url)
            .header(AUTHORIZATION, format!("Bearer {token}"))
            .header(ACCEPT, "application/json");
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = self
            .http
            .send(request)
            .await
            .map_err(|e| PatcherError::api_response(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(PatcherError::api_response(format!(
                "{} - {} ({url})",
                status.as_u16(),
                text
            )));
        }

        response
            .json()
            .await
            .map_err(|e| PatcherError::api_response(format!("malformed response from {url}: {e}")))
    }

    fn store_credentials(
        &self,
        server_url: &str,
        client_id: &str,
        client_secret: &str,
    ) -> Result<()> {
        self.store.set(CredentialKey::Url, server_url)?;
        self.store.set(CredentialKey::ClientId, client_id)?;
        self.store.set(CredentialKey::ClientSecret, client_secret)?;
        debug!("Stored server URL and client credentials");
        Ok(())
    }

    #[instrument(skip_all)]
    async fn issue_token(&mut self, credentials: ClientCredentials) -> Result<AccessToken> {
        let token = self.token_client.client_credentials(&credentials).await?;

        let leeway = Duration::seconds(self.config.api.token_refresh_leeway_secs);
        if !token.is_valid_at(Utc::now(), leeway) {
            return Err(PatcherError::token_lifetime(token.seconds_until_expiry()));
        }

        self.store.set(CredentialKey::Token, &token.value)?;
        self.store.set(CredentialKey::TokenExpiration, &token.expires_at.to_rfc3339())?;
        self.state = SetupState::TokenIssued;
        info!(expires_in = token.seconds_until_expiry(), "Client credentials token issued");
        Ok(token)
    }

    fn capture_report_settings(&mut self) -> Result<()> {
        let header = self.prompter.input("Enter the Header Text to use on PDF reports", None)?;
        let footer = self.prompter.input("Enter the Footer Text to use on PDF reports", None)?;

        let report = &mut self.config.report;
        report.header_text = header;
        report.footer_text = footer;

        if self.prompter.confirm("Would you like to use a custom font?", false)? {
            let font_name =
                self.prompter.input("Enter the custom font name", Some(CUSTOM_FONT_NAME))?;
            let regular = self.prompter.input("Enter the path to the regular font file", None)?;
            let bold = self.prompter.input("Enter the path to the bold font file", None)?;

            let fonts_dir = self.config.paths.support_dir().join(FONTS_DIR_NAME);
            let regular = copy_font(Path::new(regular.trim()), &fonts_dir)?;
            let bold = copy_font(Path::new(bold.trim()), &fonts_dir)?;

            let report = &mut self.config.report;
            report.font_name = font_name;
            report.font_regular_path = Some(regular);
            report.font_bold_path = Some(bold);
        } else {
            let report = &mut self.config.report;
            report.font_name = DEFAULT_FONT_NAME.to_string();
            report.font_regular_path = None;
            report.font_bold_path = None;
        }
        Ok(())
    }
}

/// Validate a server URL, defaulting the scheme to https
///
/// # Errors
/// Returns [`PatcherError::Setup`] when the input is not an http(s) URL with a
/// host.
pub fn normalize_server_url(raw: &str) -> Result<String> {
    let trimmed = raw.trim();
    let candidate =
        if trimmed.contains("://") { trimmed.to_string() } else { format!("https://{trimmed}") };

    let parsed = Url::parse(&candidate)
        .map_err(|e| PatcherError::setup(format!("invalid Jamf Pro URL '{trimmed}': {e}")))?;

    if !matches!(parsed.scheme(), "http" | "https") || parsed.host_str().is_none() {
        return Err(PatcherError::setup(format!("invalid Jamf Pro URL '{trimmed}'")));
    }

    Ok(parsed.as_str().trim_end_matches('/').to_string())
}

fn decode<T: serde::de::DeserializeOwned>(value: Value) -> Result<T> {
    serde_json::from_value(value)
        .map_err(|e| PatcherError::api_response(format!("unexpected response shape: {e}")))
}

fn copy_font(source: &Path, fonts_dir: &Path) -> Result<PathBuf> {
    let file_name = source
        .file_name()
        .ok_or_else(|| PatcherError::setup(format!("invalid font path '{}'", source.display())))?;

    std::fs::create_dir_all(fonts_dir).map_err(|_| PatcherError::DirectoryCreation {
        path: Some(fonts_dir.display().to_string()),
    })?;

    let destination = fonts_dir.join(file_name);
    std::fs::copy(source, &destination).map_err(|e| {
        PatcherError::setup(format!("unable to copy font '{}': {e}", source.display()))
    })?;

    debug!(source = %source.display(), destination = %destination.display(), "Copied font");
    Ok(destination)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_adds_https_and_trims_slash() {
        assert_eq!(
            normalize_server_url(" example.jamfcloud.com/ ").unwrap(),
            "https://example.jamfcloud.com"
        );
        assert_eq!(
            normalize_server_url("http://localhost:8080").unwrap(),
            "http://localhost:8080"
        );
    }

    #[test]
    fn normalize_rejects_other_schemes() {
        assert!(matches!(
            normalize_server_url("ftp://example.com"),
            Err(PatcherError::Setup { .. })
        ));
        assert!(matches!(normalize_server_url(""), Err(PatcherError::Setup { .. })));
    }

    #[test]
    fn default_options_ask_for_confirmation() {
        assert!(SetupOptions::default().confirm);
    }
}
