//! Construction of authenticated vault clients.

use crate::config::VaultCredentials;
use crate::vault::{ClientSecretCredential, VaultClient, VaultError};
use tracing::debug;

/// Builds a client for the configured vault.
///
/// Two steps, neither touching the network: a credential from the three
/// service-principal identifiers, then a client binding that credential to
/// the vault URL. Whether the result is kept for the process lifetime or
/// dropped after one request is up to the caller. Any failure surfaces as
/// `VaultError::Authentication`.
pub fn build_client(credentials: &VaultCredentials) -> Result<VaultClient, VaultError> {
    debug!(vault_url = credentials.vault_url(), "Building Key Vault client");
    let credential = ClientSecretCredential::new(
        credentials.authority_host(),
        credentials.tenant_id(),
        credentials.client_id(),
        credentials.client_secret(),
    )?;
    VaultClient::new(credentials.vault_url(), credential)
}
