//! Application context - dependency wiring for a single command

use std::path::PathBuf;
use std::sync::Arc;

use patcher_common::auth::{OAuthClient, TokenManager};
use patcher_common::security::{CredentialStore, KeychainProvider};
use patcher_core::{Prompter, ReportService};
use patcher_domain::constants::KEYCHAIN_SERVICE;
use patcher_domain::{Config, CredentialKey, PatcherError, Result};
use patcher_infra::{JamfClient, JsonReportExporter, PlistMarker, SetupOrchestrator};

/// Shared services built from the loaded configuration
pub struct AppContext {
    pub config: Config,
    pub config_path: PathBuf,
    keychain: Arc<KeychainProvider>,
    token_client: Arc<OAuthClient>,
    marker: Arc<PlistMarker>,
}

impl AppContext {
    /// Build the context; `config_path` is where setup persists settings.
    ///
    /// # Errors
    /// Returns [`PatcherError::Config`] if the HTTP client cannot be built.
    pub fn new(config: Config, config_path: PathBuf) -> Result<Self> {
        let token_client = Arc::new(OAuthClient::new(config.api.request_timeout())?);
        let marker = Arc::new(PlistMarker::new(config.paths.marker_path()));

        Ok(Self {
            config,
            config_path,
            keychain: Arc::new(KeychainProvider::new(KEYCHAIN_SERVICE)),
            token_client,
            marker,
        })
    }

    pub fn setup(&self, prompter: Arc<dyn Prompter>) -> Result<SetupOrchestrator> {
        SetupOrchestrator::new(
            self.config.clone(),
            self.config_path.clone(),
            self.keychain.clone(),
            self.token_client.clone(),
            self.marker.clone(),
            prompter,
        )
    }

    /// Report pipeline talking to the server stored in the keychain.
    ///
    /// # Errors
    /// - [`PatcherError::Setup`] if no server URL has been stored yet
    /// - [`PatcherError::Keychain`] if the keychain cannot be read
    pub fn report_service(&self) -> Result<ReportService> {
        let server_url = self
            .keychain
            .get(CredentialKey::Url)?
            .filter(|url| !url.trim().is_empty())
            .ok_or_else(|| PatcherError::setup("no Jamf Pro URL stored; run `patcher setup`"))?;

        let tokens = Arc::new(TokenManager::new(
            self.token_client.clone(),
            self.keychain.clone(),
            self.config.api.token_refresh_leeway_secs,
        ));
        let client = JamfClient::new(server_url, tokens, &self.config.api)?;
        let exporter = JsonReportExporter::new(self.config.report.clone());

        Ok(ReportService::new(Arc::new(client), Arc::new(exporter)))
    }
}
