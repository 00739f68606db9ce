//! Azure Key Vault access over its REST API.
//!
//! - `credential`: service-principal token acquisition
//! - `client`: the authenticated handle and the `SecretStore` seam
//! - `factory`: the one construction path used by every client lifetime
//! - `error`: transport-level failures, classified later by the gateway

pub mod client;
pub mod credential;
pub mod error;
pub mod factory;

pub use client::{SecretStore, VaultClient};
pub use credential::ClientSecretCredential;
pub use error::VaultError;
pub use factory::build_client;
