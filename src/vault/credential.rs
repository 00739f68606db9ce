//! Service-principal credential for Microsoft Entra ID.
//!
//! Building a credential only assembles the token endpoint; the token itself
//! is requested with the OAuth2 client-credentials grant on first use and
//! reused until it is close to expiry.

use crate::vault::VaultError;
use arc_swap::ArcSwapOption;
use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, instrument, warn};
use url::Url;

/// OAuth2 scope granting access to Key Vault data-plane operations.
pub const KEY_VAULT_SCOPE: &str = "https://vault.azure.net/.default";

/// Tokens expiring within this window are requested again.
const REFRESH_MARGIN: Duration = Duration::from_secs(300);

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: u64,
}

#[derive(Deserialize)]
struct TokenErrorResponse {
    error: String,
}

/// Bearer token for the Key Vault scope.
#[derive(Debug)]
pub struct AccessToken {
    secret: SecretString,
    expires_at: Instant,
}

impl AccessToken {
    pub fn secret(&self) -> &SecretString {
        &self.secret
    }

    fn is_fresh(&self) -> bool {
        self.expires_at.saturating_duration_since(Instant::now()) > REFRESH_MARGIN
    }
}

/// Client-secret credential bound to one tenant.
///
/// The last token is swapped in atomically, so concurrent fetches never
/// wait on each other; two racing refreshes both succeed and the later one
/// is kept.
#[derive(Debug)]
pub struct ClientSecretCredential {
    client_id: String,
    client_secret: SecretString,
    token_url: Url,
    cached: ArcSwapOption<AccessToken>,
}

impl ClientSecretCredential {
    pub fn new(
        authority_host: &str,
        tenant_id: &str,
        client_id: &str,
        client_secret: &SecretString,
    ) -> Result<Self, VaultError> {
        let mut token_url = Url::parse(authority_host)
            .map_err(|e| VaultError::authentication(format!("Invalid authority host: {}", e)))?;
        token_url
            .path_segments_mut()
            .map_err(|_| VaultError::authentication("Authority host cannot be a base URL"))?
            .pop_if_empty()
            .extend([tenant_id, "oauth2", "v2.0", "token"]);

        Ok(Self {
            client_id: client_id.to_string(),
            client_secret: SecretString::from(client_secret.expose_secret().to_string()),
            token_url,
            cached: ArcSwapOption::empty(),
        })
    }

    pub fn token_url(&self) -> &Url {
        &self.token_url
    }

    /// Returns a token for the Key Vault scope, requesting a new one only
    /// when none is cached or the cached one is about to expire.
    #[instrument(skip(self, http), fields(client_id = %self.client_id))]
    pub async fn get_token(&self, http: &Client) -> Result<Arc<AccessToken>, VaultError> {
        if let Some(token) = self.cached.load_full().filter(|t| t.is_fresh()) {
            debug!("Using cached access token");
            return Ok(token);
        }

        let token = Arc::new(self.request_token(http).await?);
        if token.is_fresh() {
            self.cached.store(Some(Arc::clone(&token)));
        }
        Ok(token)
    }

    /// 400, 401 and 403 from the authority mean the identity was rejected
    /// (unknown tenant, unknown client, wrong or expired secret). Throttling
    /// and other failures are reported as plain HTTP errors.
    async fn request_token(&self, http: &Client) -> Result<AccessToken, VaultError> {
        let form = [
            ("grant_type", "client_credentials"),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.expose_secret()),
            ("scope", KEY_VAULT_SCOPE),
        ];

        let requested_at = Instant::now();
        let response = http
            .post(self.token_url.clone())
            .form(&form)
            .send()
            .await
            .map_err(|e| VaultError::network(format!("Token request failed: {}", e)))?;

        let status = response.status();
        match status {
            StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                let body = response.text().await.unwrap_or_default();
                let reason = serde_json::from_str::<TokenErrorResponse>(&body)
                    .map(|e| e.error)
                    .unwrap_or_else(|_| status.to_string());
                warn!(%status, %reason, "Token request rejected");
                return Err(VaultError::authentication(format!(
                    "Token request rejected: {}",
                    reason
                )));
            }
            _ if !status.is_success() => {
                let body = response.text().await.unwrap_or_default();
                warn!(%status, "Token request failed");
                return Err(VaultError::HttpStatus(status.as_u16(), body));
            }
            _ => {}
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| VaultError::Parse(format!("Failed to parse token response: {}", e)))?;
        debug!(expires_in = token.expires_in, "Acquired access token");
        Ok(AccessToken {
            secret: SecretString::from(token.access_token),
            expires_at: requested_at + Duration::from_secs(token.expires_in),
        })
    }
}
