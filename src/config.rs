//! Service-principal configuration for the Key Vault integration.
//!
//! Values come from command-line flags or the environment (a `.env` file in
//! the working directory is merged into the environment by the binary before
//! parsing). `VaultCredentials::load` validates them once at startup so an
//! enabled-but-incomplete configuration never reaches the first request.

use clap::{ArgAction, Args};
use secrecy::{ExposeSecret, SecretString};
use tracing::info;
use url::Url;

/// Default Microsoft Entra ID authority used for token requests.
pub const DEFAULT_AUTHORITY_HOST: &str = "https://login.microsoftonline.com";

/// Raw `vault.*` options as supplied by the command line or environment.
#[derive(Args, Clone, Default)]
pub struct VaultSettings {
    /// Enable the Key Vault integration.
    #[arg(
        long = "vault-enabled",
        env = "VAULT_ENABLED",
        default_value_t = true,
        action = ArgAction::Set
    )]
    pub enabled: bool,

    /// Directory (tenant) ID of the service principal.
    #[arg(long = "vault-tenant-id", env = "VAULT_TENANT_ID")]
    pub tenant_id: Option<String>,

    /// Application (client) ID of the service principal.
    #[arg(long = "vault-client-id", env = "VAULT_CLIENT_ID")]
    pub client_id: Option<String>,

    /// Client secret of the service principal.
    #[arg(long = "vault-client-secret", env = "VAULT_CLIENT_SECRET", hide_env_values = true)]
    pub client_secret: Option<String>,

    /// Key Vault endpoint, e.g. "https://my-vault.vault.azure.net".
    #[arg(long = "vault-url", env = "VAULT_URL")]
    pub vault_url: Option<String>,

    /// Authority host used to acquire access tokens.
    #[arg(
        long = "vault-authority-host",
        env = "VAULT_AUTHORITY_HOST",
        default_value = DEFAULT_AUTHORITY_HOST
    )]
    pub authority_host: String,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} is required when the Key Vault integration is enabled")]
    Missing(&'static str),

    #[error("{option} is not a valid absolute URL: {reason}")]
    InvalidUrl {
        option: &'static str,
        reason: String,
    },
}

/// Validated service-principal credentials and vault endpoint.
///
/// Immutable once loaded; `Debug` output redacts the client secret.
#[derive(Debug)]
pub struct VaultCredentials {
    tenant_id: String,
    client_id: String,
    client_secret: SecretString,
    vault_url: String,
    authority_host: String,
    enabled: bool,
}

impl VaultCredentials {
    /// Validates `settings` without touching the network.
    ///
    /// When the integration is enabled every identifier must be non-blank
    /// after trimming and both endpoints must be absolute URLs. A disabled
    /// configuration is accepted as-is.
    pub fn load(settings: &VaultSettings) -> Result<Self, ConfigError> {
        let credentials = Self {
            tenant_id: trimmed(settings.tenant_id.as_deref()),
            client_id: trimmed(settings.client_id.as_deref()),
            client_secret: SecretString::from(trimmed(settings.client_secret.as_deref())),
            vault_url: trimmed(settings.vault_url.as_deref())
                .trim_end_matches('/')
                .to_string(),
            authority_host: settings.authority_host.trim().trim_end_matches('/').to_string(),
            enabled: settings.enabled,
        };

        if !credentials.enabled {
            info!("Key Vault integration disabled; skipping credential validation");
            return Ok(credentials);
        }

        require("vault.clientId", &credentials.client_id)?;
        require("vault.clientSecret", credentials.client_secret.expose_secret())?;
        require("vault.tenantId", &credentials.tenant_id)?;
        require("vault.vaultUrl", &credentials.vault_url)?;
        require_absolute_url("vault.vaultUrl", &credentials.vault_url)?;
        require_absolute_url("vault.authorityHost", &credentials.authority_host)?;

        info!(
            vault_url = %credentials.vault_url,
            "Key Vault configuration validation passed"
        );
        Ok(credentials)
    }

    pub fn tenant_id(&self) -> &str {
        &self.tenant_id
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub fn client_secret(&self) -> &SecretString {
        &self.client_secret
    }

    pub fn vault_url(&self) -> &str {
        &self.vault_url
    }

    pub fn authority_host(&self) -> &str {
        &self.authority_host
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }
}

fn trimmed(value: Option<&str>) -> String {
    value.map(str::trim).unwrap_or_default().to_string()
}

fn require(option: &'static str, value: &str) -> Result<(), ConfigError> {
    if value.is_empty() {
        return Err(ConfigError::Missing(option));
    }
    Ok(())
}

fn require_absolute_url(option: &'static str, value: &str) -> Result<(), ConfigError> {
    let url = Url::parse(value).map_err(|e| ConfigError::InvalidUrl {
        option,
        reason: e.to_string(),
    })?;
    if url.cannot_be_a_base() {
        return Err(ConfigError::InvalidUrl {
            option,
            reason: "URL cannot carry a path".to_string(),
        });
    }
    Ok(())
}
