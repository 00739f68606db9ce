//! keyvault-gateway - REST facade over Azure Key Vault secrets
//!
//! Fetches a named secret with a service principal and returns it as JSON,
//! translating vault failures into HTTP status codes.
//!
//! ## Architecture
//!
//! - `config` module - service-principal settings, validated once at startup
//! - `vault` module - credential, client and client construction
//! - `gateway` module - single fetch operation and failure classification
//! - `server` module - HTTP API (can only access the gateway)

pub mod config;
pub mod gateway;
pub mod server;
pub mod vault;

pub use config::{ConfigError, VaultCredentials, VaultSettings};
pub use gateway::{ClientLifecycle, ErrorKind, SecretGateway, SecretResult};
pub use vault::{VaultClient, VaultError};

use tracing_subscriber::EnvFilter;

/// Initialize logging for the application. `RUST_LOG` overrides the
/// default `info` filter.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    #[cfg(test)]
    let builder = builder.with_test_writer();
    let _ = builder.try_init();
}
