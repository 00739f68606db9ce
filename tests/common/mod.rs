//! Common test fixtures for gateway and HTTP API integration tests.
//!
//! `MockVault` starts a wiremock server that plays both the Entra ID token
//! endpoint and the Key Vault secret endpoint. Only the service principal
//! `t1`/`c1`/`s1` is issued a token, and only secrets registered with
//! `with_secret` exist.

#![allow(dead_code)]

use keyvault_gateway::config::{VaultSettings, DEFAULT_AUTHORITY_HOST};
use keyvault_gateway::{SecretGateway, VaultCredentials};
use wiremock::matchers::{body_string_contains, header, method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const TENANT_ID: &str = "t1";
pub const CLIENT_ID: &str = "c1";
pub const CLIENT_SECRET: &str = "s1";
pub const ACCESS_TOKEN: &str = "test-access-token";

/// Set up logging for integration tests; output is captured per test.
pub fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("info")
        .with_test_writer() // This ensures output goes to both stdout and test output
        .try_init();
}

pub struct MockVault {
    server: MockServer,
}

impl MockVault {
    pub async fn start() -> Self {
        let server = MockServer::start().await;

        let token_path = format!("/{}/oauth2/v2.0/token", TENANT_ID);
        Mock::given(method("POST"))
            .and(path(token_path.as_str()))
            .and(body_string_contains(format!("client_id={}&", CLIENT_ID).as_str()))
            .and(body_string_contains(format!("client_secret={}&", CLIENT_SECRET).as_str()))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "token_type": "Bearer",
                "expires_in": 3599,
                "access_token": ACCESS_TOKEN
            })))
            .with_priority(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path_regex(r"^/[^/]+/oauth2/v2\.0/token$"))
            .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
                "error": "invalid_client",
                "error_description": "AADSTS7000215: Invalid client secret provided."
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path_regex(r"^/secrets/.+$"))
            .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({
                "error": {
                    "code": "SecretNotFound",
                    "message": "A secret with the given name was not found in this key vault."
                }
            })))
            .mount(&server)
            .await;

        Self { server }
    }

    /// A mock whose token endpoint throttles every request.
    pub async fn throttled_authority() -> Self {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path_regex(r"^/[^/]+/oauth2/v2\.0/token$"))
            .respond_with(
                ResponseTemplate::new(429)
                    .insert_header("retry-after", "5")
                    .set_body_json(serde_json::json!({
                        "error": "temporarily_unavailable",
                        "error_description": "AADSTS50196: Request throttled."
                    })),
            )
            .mount(&server)
            .await;
        Self { server }
    }

    /// Token requests the mock has seen so far.
    pub async fn token_requests(&self) -> usize {
        self.received_requests()
            .await
            .iter()
            .filter(|r| r.method.as_str() == "POST")
            .count()
    }

    /// Registers a secret readable with the issued access token.
    pub async fn with_secret(self, name: &str, value: &str) -> Self {
        let secret_path = format!("/secrets/{}", name);
        let bearer = format!("Bearer {}", ACCESS_TOKEN);
        Mock::given(method("GET"))
            .and(path(secret_path.as_str()))
            .and(header("authorization", bearer.as_str()))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "value": value,
                "id": format!("{}/secrets/{}/0123456789abcdef", self.server.uri(), name),
                "attributes": { "enabled": true }
            })))
            .with_priority(1)
            .mount(&self.server)
            .await;
        self
    }

    /// Makes every secret read fail with `status` and an internal-looking body.
    pub async fn failing(self, status: u16) -> Self {
        Mock::given(method("GET"))
            .and(path_regex(r"^/secrets/.+$"))
            .respond_with(
                ResponseTemplate::new(status)
                    .set_body_string("internal detail: backend 10.1.2.3 down"),
            )
            .with_priority(1)
            .mount(&self.server)
            .await;
        self
    }

    /// Requests the mock has seen so far.
    pub async fn received_requests(&self) -> Vec<wiremock::Request> {
        self.server.received_requests().await.unwrap_or_default()
    }

    pub fn uri(&self) -> String {
        self.server.uri()
    }

    pub fn settings(&self, client_secret: &str) -> VaultSettings {
        VaultSettings {
            enabled: true,
            tenant_id: Some(TENANT_ID.to_string()),
            client_id: Some(CLIENT_ID.to_string()),
            client_secret: Some(client_secret.to_string()),
            vault_url: Some(self.uri()),
            authority_host: self.uri(),
        }
    }

    pub fn gateway(&self, client_secret: &str) -> SecretGateway {
        let credentials = VaultCredentials::load(&self.settings(client_secret)).unwrap();
        SecretGateway::new(credentials).unwrap()
    }
}

/// Settings for a disabled integration.
pub fn disabled_settings() -> VaultSettings {
    VaultSettings {
        enabled: false,
        authority_host: DEFAULT_AUTHORITY_HOST.to_string(),
        ..VaultSettings::default()
    }
}
