//! Jamf Pro API client
//!
//! Every management call carries the current bearer token. A 401 triggers
//! one forced token refresh and one retry; a second 401 is final. Per-id
//! lookups fan out with a bounded number of requests in flight and keep the
//! input order.

use std::sync::Arc;

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use patcher_common::auth::AccessToken;
use patcher_core::PatchDataSource;
use patcher_domain::constants::{MOBILE_DEVICES_PATH, PATCH_TITLES_PATH};
use patcher_domain::{
    ApiSettings, DeviceRecord, PatchSummary, PatcherError, PolicyId, ReleaseEntry,
};
use reqwest::header::{ACCEPT, AUTHORIZATION};
use reqwest::{Method, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, error, info, instrument, warn};

use super::auth::AccessTokenProvider;
use super::responses::{
    DeviceDetailResponse, DeviceListResponse, PatchSummaryResponse, PolicyRecord, ReleaseFeed,
};
use crate::http::HttpClient;

/// Outcome of a failed management call.
///
/// Authentication failures abort a whole fan-out; anything else only drops
/// the affected record.
#[derive(Debug)]
enum RequestError {
    Auth(PatcherError),
    Other(PatcherError),
}

impl From<RequestError> for PatcherError {
    fn from(err: RequestError) -> Self {
        match err {
            RequestError::Auth(e) | RequestError::Other(e) => e,
        }
    }
}

/// Client for the Jamf Pro management API and the SOFA release feed
pub struct JamfClient {
    http: HttpClient,
    auth: Arc<dyn AccessTokenProvider>,
    base_url: String,
    feed_url: String,
    max_concurrency: usize,
}

impl JamfClient {
    /// Create a new API client
    ///
    /// # Errors
    /// Returns [`PatcherError::Config`] if the HTTP client cannot be built.
    pub fn new(
        base_url: impl Into<String>,
        auth: Arc<dyn AccessTokenProvider>,
        settings: &ApiSettings,
    ) -> Result<Self, PatcherError> {
        let http = HttpClient::builder()
            .timeout(settings.request_timeout())
            .build()
            .map_err(|e| PatcherError::config(e.to_string()))?;

        Ok(Self::with_http(http, base_url, auth, settings))
    }

    /// Create a client around an existing [`HttpClient`].
    pub fn with_http(
        http: HttpClient,
        base_url: impl Into<String>,
        auth: Arc<dyn AccessTokenProvider>,
        settings: &ApiSettings,
    ) -> Self {
        Self {
            http,
            auth,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            feed_url: settings.sofa_feed_url.clone(),
            max_concurrency: settings.max_concurrency.max(1),
        }
    }

    #[instrument(skip(self), fields(path = %path))]
    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, RequestError> {
        let url = format!("{}{}", self.base_url, path);
        let token = self.auth.access_token().await.map_err(RequestError::Auth)?;

        let mut response = self.authorized_get(&url, &token).await?;
        if response.status() == StatusCode::UNAUTHORIZED {
            warn!(url = %url, "Received 401, refreshing token and retrying once");
            let fresh = self.auth.refresh_token(&token).await.map_err(RequestError::Auth)?;
            response = self.authorized_get(&url, &fresh).await?;

            if response.status() == StatusCode::UNAUTHORIZED {
                error!(url = %url, "Request still unauthorized after token refresh");
                return Err(RequestError::Auth(PatcherError::api_response(format!(
                    "401 - unauthorized after token refresh: {url}"
                ))));
            }
        }

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RequestError::Other(PatcherError::api_response(format!(
                "{} - {} ({url})",
                status.as_u16(),
                body
            ))));
        }

        response.json().await.map_err(|e| {
            RequestError::Other(PatcherError::api_response(format!(
                "malformed response from {url}: {e}"
            )))
        })
    }

    async fn authorized_get(
        &self,
        url: &str,
        token: &AccessToken,
    ) -> Result<Response, RequestError> {
        let request = self
            .http
            .request(Method::GET, url)
            .header(AUTHORIZATION, format!("Bearer {}", token.value))
            .header(ACCEPT, "application/json");

        self.http
            .send(request)
            .await
            .map_err(|e| RequestError::Other(PatcherError::api_response(e.to_string())))
    }

    async fn fetch_summary(&self, policy_id: &str) -> Result<Option<PatchSummary>, RequestError> {
        let path = format!("{PATCH_TITLES_PATH}/{policy_id}/patch-summary");
        let response: PatchSummaryResponse = self.get_json(&path).await?;
        Ok(response.into_summary())
    }

    async fn fetch_device(&self, device_id: &str) -> Result<Option<DeviceRecord>, RequestError> {
        let path = format!("{MOBILE_DEVICES_PATH}/{device_id}/detail");
        let detail: DeviceDetailResponse = self.get_json(&path).await?;

        Ok(detail.os_version.filter(|os| !os.trim().is_empty()).map(|os_version| DeviceRecord {
            device_id: device_id.to_string(),
            serial_number: detail.serial_number,
            os_version,
        }))
    }
}

/// Keep successful records in order, skip failed or malformed ones and stop
/// at the first authentication failure.
fn collect_in_order<T>(
    ids: &[String],
    results: Vec<Result<Option<T>, RequestError>>,
    kind: &str,
) -> Result<Vec<T>, PatcherError> {
    let mut records = Vec::with_capacity(results.len());
    for (id, result) in ids.iter().zip(results) {
        match result {
            Ok(Some(record)) => records.push(record),
            Ok(None) => warn!(id = %id, kind, "Skipping malformed record"),
            Err(RequestError::Auth(e)) => return Err(e),
            Err(RequestError::Other(e)) => {
                warn!(id = %id, kind, error = %e, "Skipping failed lookup");
            }
        }
    }
    Ok(records)
}

#[async_trait]
impl PatchDataSource for JamfClient {
    async fn get_policies(&self) -> Result<Vec<PolicyId>, PatcherError> {
        match self.get_json::<Vec<PolicyRecord>>(PATCH_TITLES_PATH).await {
            Ok(records) => {
                info!(count = records.len(), "Retrieved patch title configurations");
                Ok(records.into_iter().map(|record| record.id).collect())
            }
            Err(RequestError::Auth(e)) => Err(e),
            Err(RequestError::Other(e)) => {
                error!(error = %e, "Unable to list patch title configurations");
                Err(PatcherError::PolicyFetch { url: Some(self.base_url.clone()) })
            }
        }
    }

    async fn get_summaries(
        &self,
        policy_ids: &[PolicyId],
    ) -> Result<Vec<PatchSummary>, PatcherError> {
        let results: Vec<_> = stream::iter(policy_ids.iter().cloned())
            .map(|id| async move { self.fetch_summary(&id).await })
            .buffered(self.max_concurrency)
            .collect()
            .await;

        let summaries = collect_in_order(policy_ids, results, "patch_summary")?;
        debug!(requested = policy_ids.len(), received = summaries.len(), "Fetched patch summaries");
        Ok(summaries)
    }

    async fn get_device_ids(&self) -> Result<Vec<String>, PatcherError> {
        match self.get_json::<DeviceListResponse>(MOBILE_DEVICES_PATH).await {
            Ok(list) => {
                info!(count = list.results.len(), "Retrieved mobile device ids");
                Ok(list.results.into_iter().map(|device| device.id).collect())
            }
            Err(RequestError::Auth(e)) => Err(e),
            Err(RequestError::Other(e)) => Err(PatcherError::device_id_fetch(e.to_string())),
        }
    }

    async fn get_device_os_versions(
        &self,
        device_ids: &[String],
    ) -> Result<Vec<DeviceRecord>, PatcherError> {
        if device_ids.is_empty() {
            return Ok(Vec::new());
        }

        let results: Vec<_> = stream::iter(device_ids.iter().cloned())
            .map(|id| async move { self.fetch_device(&id).await })
            .buffered(self.max_concurrency)
            .collect()
            .await;

        let devices = collect_in_order(device_ids, results, "device_detail")?;
        debug!(
            requested = device_ids.len(),
            received = devices.len(),
            "Fetched device OS versions"
        );
        Ok(devices)
    }

    #[instrument(skip(self), fields(url = %self.feed_url))]
    async fn get_release_feed(&self) -> Result<Vec<ReleaseEntry>, PatcherError> {
        let feed_error = |reason: String| PatcherError::sofa_feed(reason, self.feed_url.clone());

        let request =
            self.http.request(Method::GET, &self.feed_url).header(ACCEPT, "application/json");
        let response = self.http.send(request).await.map_err(|e| feed_error(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(feed_error(format!("unexpected status {}", status.as_u16())));
        }

        let feed: ReleaseFeed =
            response.json().await.map_err(|e| feed_error(format!("malformed feed: {e}")))?;

        let entries = feed
            .os_versions
            .into_iter()
            .map(|version| version.into_entry().map_err(&feed_error))
            .collect::<Result<Vec<_>, _>>()?;

        info!(count = entries.len(), "Retrieved release catalog");
        Ok(entries)
    }

    fn server_url(&self) -> Option<String> {
        Some(self.base_url.clone())
    }
}
