//! Secret Manager provider against local mocks of the REST API and the
//! metadata server.

use ipsync_core::{Configuration, Error, SecretNames, SecretProvider};
use ipsync_secret_gcp::GcpSecretManager;
use serde_json::json;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const PROJECT: &str = "my-project";

fn access_path(name: &str) -> String {
    format!("/v1/projects/{}/secrets/{}/versions/latest:access", PROJECT, name)
}

fn secret_response(name: &str, encoded: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "name": format!("projects/123456/secrets/{}/versions/3", name),
        "payload": { "data": encoded, "dataCrc32c": "0" }
    }))
}

fn provider(server: &MockServer) -> GcpSecretManager {
    GcpSecretManager::new(PROJECT, "test-access-token")
        .expect("provider builds")
        .with_base_url(server.uri())
}

#[tokio::test]
async fn latest_version_is_decoded() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(access_path("dns-hostname")))
        .and(header("authorization", "Bearer test-access-token"))
        // "vm.example.com"
        .respond_with(secret_response("dns-hostname", "dm0uZXhhbXBsZS5jb20="))
        .expect(1)
        .mount(&mock_server)
        .await;

    let value = provider(&mock_server)
        .get_secret("dns-hostname")
        .await
        .expect("secret is readable");

    assert_eq!(value, "vm.example.com");
}

#[tokio::test]
async fn missing_secret_carries_the_gcp_message() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "error": {
                "code": 404,
                "message": "Secret [projects/123456/secrets/dns-zone-id] not found or has no versions.",
                "status": "NOT_FOUND"
            }
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let err = provider(&mock_server)
        .get_secret("dns-zone-id")
        .await
        .expect_err("secret is missing");

    assert!(matches!(err, Error::Secret(_)));
    assert!(err.to_string().contains("NOT_FOUND"));
}

#[tokio::test]
async fn non_utf8_payload_is_rejected() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(secret_response("dns-api-token", "//4="))
        .mount(&mock_server)
        .await;

    let err = provider(&mock_server)
        .get_secret("dns-api-token")
        .await
        .expect_err("payload is binary");

    assert!(err.to_string().contains("UTF-8"));
}

#[tokio::test]
async fn loads_a_full_configuration() {
    let mock_server = MockServer::start().await;
    // zone-123, record-456, test-token, vm.example.com (trailing newline)
    for (name, encoded) in [
        ("dns-zone-id", "em9uZS0xMjM="),
        ("dns-record-id", "cmVjb3JkLTQ1Ng=="),
        ("dns-api-token", "dGVzdC10b2tlbg=="),
        ("dns-hostname", "dm0uZXhhbXBsZS5jb20K"),
    ] {
        Mock::given(method("GET"))
            .and(path(access_path(name)))
            .respond_with(secret_response(name, encoded))
            .expect(1)
            .mount(&mock_server)
            .await;
    }

    let config = Configuration::load(&provider(&mock_server), &SecretNames::new())
        .await
        .expect("configuration loads");

    assert_eq!(config.zone_id, "zone-123");
    assert_eq!(config.record_id, "record-456");
    assert_eq!(config.api_token, "test-token");
    assert_eq!(config.target_hostname, "vm.example.com");
}

#[tokio::test]
async fn connect_uses_the_metadata_token() {
    let metadata = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/token"))
        .and(header("Metadata-Flavor", "Google"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "ya29.metadata-token",
            "expires_in": 3599,
            "token_type": "Bearer"
        })))
        .expect(1)
        .mount(&metadata)
        .await;

    let api = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(access_path("dns-zone-id")))
        .and(header("authorization", "Bearer ya29.metadata-token"))
        .respond_with(secret_response("dns-zone-id", "em9uZS0xMjM="))
        .expect(1)
        .mount(&api)
        .await;

    let provider =
        GcpSecretManager::connect_with_metadata_url(PROJECT, &format!("{}/token", metadata.uri()))
            .await
            .expect("token is issued")
            .with_base_url(api.uri());

    assert_eq!(provider.get_secret("dns-zone-id").await.unwrap(), "zone-123");
}

#[tokio::test]
async fn metadata_refusal_fails_connect() {
    let metadata = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&metadata)
        .await;

    let err = GcpSecretManager::connect_with_metadata_url(PROJECT, &metadata.uri())
        .await
        .expect_err("no token");

    assert!(matches!(err, Error::Secret(_)));
}
