//! Client implementation for Key Vault secret reads.
//!
//! A `VaultClient` is the authenticated handle the gateway fetches through.
//! It holds no mutable state, so one instance can serve concurrent requests.

use crate::vault::{ClientSecretCredential, VaultError};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use secrecy::ExposeSecret;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, instrument};
use url::Url;

/// Key Vault REST API version used for secret reads.
pub const API_VERSION: &str = "7.4";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Read access to named secrets.
#[async_trait]
pub trait SecretStore: Send + Sync {
    /// Returns the current value of the secret called `name`.
    async fn get_secret(&self, name: &str) -> Result<String, VaultError>;
}

#[derive(Deserialize)]
struct SecretBundle {
    value: String,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

/// Client for the Key Vault data-plane API, bound to one vault and one
/// credential.
#[derive(Debug)]
pub struct VaultClient {
    vault_url: Url,
    credential: ClientSecretCredential,
    http: Client,
}

impl VaultClient {
    /// Binds `credential` to the vault at `vault_url`. Performs no I/O.
    pub fn new(vault_url: &str, credential: ClientSecretCredential) -> Result<Self, VaultError> {
        let vault_url = Url::parse(vault_url)
            .map_err(|e| VaultError::authentication(format!("Invalid vault URL: {}", e)))?;
        if vault_url.cannot_be_a_base() {
            return Err(VaultError::authentication(
                "Vault URL cannot be a base URL",
            ));
        }

        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| {
                VaultError::authentication(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self {
            vault_url,
            credential,
            http,
        })
    }

    pub fn vault_url(&self) -> &Url {
        &self.vault_url
    }

    /// `.` and `..` would be dropped as dot segments and turn the read into
    /// a request for the secret list, so no secret can have those names.
    fn secret_url(&self, name: &str) -> Result<Url, VaultError> {
        if matches!(name, "." | "..") {
            return Err(VaultError::not_found(name));
        }
        let mut url = self.vault_url.clone();
        url.path_segments_mut()
            .map_err(|_| VaultError::Parse("Vault URL cannot be a base URL".to_string()))?
            .pop_if_empty()
            .extend(["secrets", name]);
        url.query_pairs_mut().append_pair("api-version", API_VERSION);
        Ok(url)
    }
}

#[async_trait]
impl SecretStore for VaultClient {
    #[instrument(skip(self), fields(vault = %self.vault_url))]
    async fn get_secret(&self, name: &str) -> Result<String, VaultError> {
        let url = self.secret_url(name)?;
        let token = self.credential.get_token(&self.http).await?;

        debug!("Requesting secret from vault");
        let response = self
            .http
            .get(url)
            .bearer_auth(token.secret().expose_secret())
            .send()
            .await
            .map_err(|e| VaultError::network(format!("Request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorEnvelope>(&body)
                .ok()
                .and_then(|e| e.error.message)
                .unwrap_or_else(|| status.to_string());
            return Err(match status {
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                    VaultError::authentication(message)
                }
                StatusCode::NOT_FOUND => VaultError::not_found(name),
                _ => VaultError::HttpStatus(status.as_u16(), message),
            });
        }

        let bundle: SecretBundle = response
            .json()
            .await
            .map_err(|e| VaultError::Parse(format!("Failed to parse secret response: {}", e)))?;
        debug!("Secret retrieved");
        Ok(bundle.value)
    }
}
