//! Integration tests for the Jamf Pro API client
//!
//! Runs the real token manager and OAuth client against a wiremock server
//! standing in for both the management API and the release feed.

use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::{Duration, Utc};
use patcher_common::auth::{OAuthClient, TokenManager};
use patcher_common::testing::MockKeychainProvider;
use patcher_core::{PatchDataSource, ReportRequest, ReportService};
use patcher_domain::{ApiSettings, CredentialKey, PatcherError, ReportSettings};
use patcher_infra::{JamfClient, JsonReportExporter};
use serde_json::{json, Value};
use wiremock::matchers::{header, method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

const POLICIES_PATH: &str = "/api/v2/patch-software-title-configurations";
const DEVICES_PATH: &str = "/api/v2/mobile-devices";
const TOKEN_PATH: &str = "/api/oauth/token";
const FEED_PATH: &str = "/v1/ios_data_feed.json";

type Manager = TokenManager<OAuthClient, MockKeychainProvider>;

/// Keychain holding client credentials plus a cached token valid for an hour.
fn keychain_for(server: &MockServer, cached_token: &str) -> MockKeychainProvider {
    let url = server.uri();
    let expiry = (Utc::now() + Duration::hours(1)).to_rfc3339();
    MockKeychainProvider::with_entries([
        (CredentialKey::Url, url.as_str()),
        (CredentialKey::ClientId, "client-id"),
        (CredentialKey::ClientSecret, "client-secret"),
        (CredentialKey::Token, cached_token),
        (CredentialKey::TokenExpiration, expiry.as_str()),
    ])
}

fn client_for(server: &MockServer, keychain: MockKeychainProvider) -> (JamfClient, Arc<Manager>) {
    let oauth = OAuthClient::new(StdDuration::from_secs(5)).unwrap();
    let manager = Arc::new(TokenManager::new(Arc::new(oauth), Arc::new(keychain), 30));
    let settings = ApiSettings {
        max_concurrency: 2,
        sofa_feed_url: format!("{}{FEED_PATH}", server.uri()),
        ..ApiSettings::default()
    };
    let client = JamfClient::new(server.uri(), manager.clone(), &settings).unwrap();
    (client, manager)
}

async fn mount_token_endpoint(server: &MockServer, token: &str, expected_calls: u64) {
    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({
                "access_token": token,
                "expires_in": 1800
            })),
        )
        .expect(expected_calls)
        .mount(server)
        .await;
}

async fn mount_summary(server: &MockServer, id: &str, title: &str, delay_ms: u64) {
    Mock::given(method("GET"))
        .and(path(format!("{POLICIES_PATH}/{id}/patch-summary")))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({
                    "softwareTitleId": id,
                    "title": title,
                    "releaseDate": "2024-05-20T17:12:34Z",
                    "upToDate": 3,
                    "outOfDate": 1
                }))
                .set_delay(StdDuration::from_millis(delay_ms)),
        )
        .mount(server)
        .await;
}

fn feed_body() -> Value {
    json!({
        "OSVersions": [
            {
                "OSVersion": "17",
                "Latest": {"ProductVersion": "17.5.1", "ReleaseDate": "2024-05-13T00:00:00Z"}
            },
            {
                "OSVersion": "16",
                "Latest": {"ProductVersion": "16.7.8", "ReleaseDate": "2024-05-13T00:00:00Z"}
            }
        ]
    })
}

#[tokio::test]
async fn test_summaries_keep_policy_order_with_cached_token() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server, "unused", 0).await;

    Mock::given(method("GET"))
        .and(path(POLICIES_PATH))
        .and(header("authorization", "Bearer cached-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": "1", "displayName": "Chrome"},
            {"id": 2, "displayName": "Zoom"},
            {"id": "3", "displayName": "Slack"}
        ])))
        .expect(1)
        .mount(&server)
        .await;
    mount_summary(&server, "1", "Google Chrome", 150).await;
    mount_summary(&server, "2", "Zoom", 0).await;
    mount_summary(&server, "3", "Slack", 50).await;

    let (client, _) = client_for(&server, keychain_for(&server, "cached-token"));

    let policies = client.get_policies().await.unwrap();
    assert_eq!(policies, vec!["1", "2", "3"]);

    let summaries = client.get_summaries(&policies).await.unwrap();
    let titles: Vec<_> = summaries.iter().map(|s| s.software_title.as_str()).collect();
    assert_eq!(titles, vec!["Google Chrome", "Zoom", "Slack"]);
    assert_eq!(summaries[0].total_hosts, 4);
    assert_eq!(summaries[0].completion_percent, 75.0);
}

#[tokio::test]
async fn test_unauthorized_refreshes_once_and_retries() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server, "fresh-token", 1).await;

    Mock::given(method("GET"))
        .and(path(POLICIES_PATH))
        .and(header("authorization", "Bearer stale-token"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(POLICIES_PATH))
        .and(header("authorization", "Bearer fresh-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": "7"}])))
        .expect(1)
        .mount(&server)
        .await;

    let keychain = keychain_for(&server, "stale-token");
    let (client, manager) = client_for(&server, keychain.clone());

    let policies = client.get_policies().await.unwrap();

    assert_eq!(policies, vec!["7"]);
    assert_eq!(manager.current_token().await.map(|t| t.value), Some("fresh-token".to_string()));
    assert_eq!(keychain.value(CredentialKey::Token).as_deref(), Some("fresh-token"));
}

#[tokio::test]
async fn test_second_unauthorized_is_final() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server, "fresh-token", 1).await;

    Mock::given(method("GET"))
        .and(path(POLICIES_PATH))
        .respond_with(ResponseTemplate::new(401))
        .expect(2)
        .mount(&server)
        .await;

    let (client, _) = client_for(&server, keychain_for(&server, "stale-token"));

    let err = client.get_policies().await.unwrap_err();
    match err {
        PatcherError::ApiResponse { reason: Some(reason) } => {
            assert!(reason.starts_with("401"), "unexpected reason: {reason}");
        }
        other => panic!("expected ApiResponse, got {other:?}"),
    }
}

#[tokio::test]
async fn test_policy_listing_failure_names_server() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(POLICIES_PATH))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .expect(1)
        .mount(&server)
        .await;

    let (client, _) = client_for(&server, keychain_for(&server, "cached-token"));

    let err = client.get_policies().await.unwrap_err();
    assert_eq!(err, PatcherError::PolicyFetch { url: Some(server.uri()) });
}

#[tokio::test]
async fn test_device_details_skip_malformed_and_failed_records() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(DEVICES_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "totalCount": 3,
            "results": [{"id": "1"}, {"id": 2}, {"id": "3"}]
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("{DEVICES_PATH}/1/detail")))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"serialNumber": "C02AAA", "osVersion": "17.5.1"})),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("{DEVICES_PATH}/2/detail")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"serialNumber": "C02BBB"})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("{DEVICES_PATH}/3/detail")))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let (client, _) = client_for(&server, keychain_for(&server, "cached-token"));

    let ids = client.get_device_ids().await.unwrap();
    assert_eq!(ids, vec!["1", "2", "3"]);

    let devices = client.get_device_os_versions(&ids).await.unwrap();
    assert_eq!(devices.len(), 1);
    assert_eq!(devices[0].device_id, "1");
    assert_eq!(devices[0].serial_number.as_deref(), Some("C02AAA"));
    assert_eq!(devices[0].os_version, "17.5.1");
}

#[tokio::test]
async fn test_release_feed_parses_latest_versions() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(FEED_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(feed_body()))
        .expect(1)
        .mount(&server)
        .await;

    let (client, _) = client_for(&server, keychain_for(&server, "cached-token"));

    let catalog = client.get_release_feed().await.unwrap();
    assert_eq!(catalog.len(), 2);
    assert_eq!(catalog[0].os_major_version, 17);
    assert_eq!(catalog[0].product_version, "17.5.1");
    assert_eq!(catalog[1].os_major_version, 16);
}

#[tokio::test]
async fn test_release_feed_malformed_payload_is_sofa_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(FEED_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"unexpected": true})))
        .mount(&server)
        .await;

    let (client, _) = client_for(&server, keychain_for(&server, "cached-token"));

    let err = client.get_release_feed().await.unwrap_err();
    match err {
        PatcherError::SofaFeed { url, .. } => {
            assert_eq!(url, Some(format!("{}{FEED_PATH}", server.uri())));
        }
        other => panic!("expected SofaFeed, got {other:?}"),
    }
}

#[tokio::test]
async fn test_empty_policies_never_request_summaries() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(POLICIES_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path_regex(r"^/api/v2/patch-software-title-configurations/.+/patch-summary$"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let (client, _) = client_for(&server, keychain_for(&server, "cached-token"));
    let service = ReportService::new(
        Arc::new(client),
        Arc::new(JsonReportExporter::new(ReportSettings::default())),
    );
    let output = tempfile::tempdir().unwrap();

    let request = ReportRequest { path: output.path().to_path_buf(), ..ReportRequest::default() };
    let err = service.process_reports(&request).await.unwrap_err();

    assert_eq!(err, PatcherError::PolicyFetch { url: Some(server.uri()) });
}

#[tokio::test]
async fn test_report_pipeline_writes_ios_rows() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(POLICIES_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": "1"}, {"id": "2"}])))
        .mount(&server)
        .await;
    mount_summary(&server, "1", "Google Chrome", 0).await;
    mount_summary(&server, "2", "Zoom", 0).await;
    Mock::given(method("GET"))
        .and(path(DEVICES_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"totalCount": 2, "results": [{"id": "10"}, {"id": "11"}]})),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("{DEVICES_PATH}/10/detail")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"osVersion": "17.5.1"})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("{DEVICES_PATH}/11/detail")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"osVersion": "17.4"})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(FEED_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(feed_body()))
        .mount(&server)
        .await;

    let (client, _) = client_for(&server, keychain_for(&server, "cached-token"));
    let settings = ReportSettings { header_text: "Fleet".to_string(), ..ReportSettings::default() };
    let service = ReportService::new(Arc::new(client), Arc::new(JsonReportExporter::new(settings)));
    let output = tempfile::tempdir().unwrap();

    let request = ReportRequest {
        path: output.path().to_path_buf(),
        sort: Some("Software Title".to_string()),
        ios: true,
        ..ReportRequest::default()
    };
    let written = service.process_reports(&request).await.unwrap();

    assert!(written.starts_with(output.path().join("Patch-Reports")));
    let document: Value =
        serde_json::from_str(&std::fs::read_to_string(&written).unwrap()).unwrap();
    assert_eq!(document["header"], "Fleet");

    let rows = document["rows"].as_array().unwrap();
    let titles: Vec<_> = rows.iter().map(|row| row["software_title"].as_str().unwrap()).collect();
    assert_eq!(titles, vec!["Google Chrome", "Zoom", "iOS 17.5.1"]);
    assert_eq!(rows[2]["hosts_patched"], 1);
    assert_eq!(rows[2]["total_hosts"], 2);
    assert_eq!(rows[2]["completion_percent"], 50.0);
}
