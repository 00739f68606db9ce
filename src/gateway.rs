//! Secret lookup and failure classification.
//!
//! `fetch_with` performs one remote read through any `SecretStore` and turns
//! the outcome into a `SecretResult`. Failures are returned as data, never as
//! errors, and every one is classified into exactly one `ErrorKind`.
//!
//! `SecretGateway` owns the process-wide client and knows how to build a
//! fresh one per call; both lifetimes go through the same construction
//! function and the same classification.

use crate::config::VaultCredentials;
use crate::vault::{build_client, SecretStore, VaultClient, VaultError};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, error, info, instrument};

/// Closed set of failure classifications a fetch can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    AuthenticationFailed,
    SecretNotFound,
    Unknown,
}

impl From<&VaultError> for ErrorKind {
    fn from(err: &VaultError) -> Self {
        match err {
            VaultError::Authentication(_) => ErrorKind::AuthenticationFailed,
            VaultError::SecretNotFound(_) => ErrorKind::SecretNotFound,
            _ => ErrorKind::Unknown,
        }
    }
}

impl ErrorKind {
    /// Message safe to hand to callers: names the secret, nothing else.
    pub fn public_message(&self, name: &str) -> String {
        match self {
            ErrorKind::AuthenticationFailed => format!("Authentication failed for secret: {}", name),
            ErrorKind::SecretNotFound => format!("Secret not found: {}", name),
            ErrorKind::Unknown => format!("Failed to retrieve secret: {}", name),
        }
    }
}

/// Which client lifetime a fetch goes through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientLifecycle {
    /// The client built once and kept for the process lifetime.
    Shared,
    /// A client built for this call and dropped afterwards.
    Ephemeral,
}

/// Outcome of a single fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SecretResult {
    Success {
        name: String,
        value: String,
        retrieved_at: DateTime<Utc>,
    },
    Failure {
        name: String,
        kind: ErrorKind,
        message: String,
    },
}

impl SecretResult {
    pub fn failure(name: &str, kind: ErrorKind, message: impl Into<String>) -> Self {
        SecretResult::Failure {
            name: name.to_string(),
            kind,
            message: message.into(),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            SecretResult::Success { name, .. } | SecretResult::Failure { name, .. } => name,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, SecretResult::Success { .. })
    }

    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            SecretResult::Success { .. } => None,
            SecretResult::Failure { kind, .. } => Some(*kind),
        }
    }
}

/// Reads `name` from `store` with a single remote attempt.
pub async fn fetch_with<S>(store: &S, name: &str) -> SecretResult
where
    S: SecretStore + ?Sized,
{
    if name.trim().is_empty() {
        return SecretResult::failure(
            name,
            ErrorKind::SecretNotFound,
            "Secret name must not be empty",
        );
    }

    debug!(secret = name, "Retrieving secret");
    match store.get_secret(name).await {
        Ok(value) => {
            debug!(secret = name, "Successfully retrieved secret");
            SecretResult::Success {
                name: name.to_string(),
                value,
                retrieved_at: Utc::now(),
            }
        }
        Err(err) => classify(name, &err),
    }
}

fn classify(name: &str, err: &VaultError) -> SecretResult {
    let kind = ErrorKind::from(err);
    let message = match kind {
        ErrorKind::Unknown => format!("{}. Error: {}", kind.public_message(name), err),
        _ => kind.public_message(name),
    };
    error!(secret = name, ?kind, error = %err, "Failed to retrieve secret");
    SecretResult::failure(name, kind, message)
}

/// Entry point shared by request handlers and the CLI.
pub struct SecretGateway {
    credentials: VaultCredentials,
    shared: Arc<VaultClient>,
}

impl SecretGateway {
    /// Builds the shared client eagerly. A construction failure is fatal to
    /// the gateway and is not retried.
    pub fn new(credentials: VaultCredentials) -> Result<Self, VaultError> {
        info!(
            vault_url = credentials.vault_url(),
            "Initializing Azure Key Vault client"
        );
        let shared = Arc::new(build_client(&credentials).inspect_err(|e| {
            error!(error = %e, "Failed to initialize Azure Key Vault client");
        })?);
        info!("Azure Key Vault client initialized successfully");
        Ok(Self {
            credentials,
            shared,
        })
    }

    /// The process-wide client; every call returns the same instance.
    pub fn shared_client(&self) -> Arc<VaultClient> {
        Arc::clone(&self.shared)
    }

    /// A newly built client that is not retained.
    pub fn ephemeral_client(&self) -> Result<Arc<VaultClient>, VaultError> {
        build_client(&self.credentials).map(Arc::new)
    }

    #[instrument(skip(self))]
    pub async fn fetch(&self, name: &str, lifecycle: ClientLifecycle) -> SecretResult {
        match lifecycle {
            ClientLifecycle::Shared => fetch_with(self.shared.as_ref(), name).await,
            ClientLifecycle::Ephemeral => match self.ephemeral_client() {
                Ok(client) => fetch_with(client.as_ref(), name).await,
                Err(err) => classify(name, &err),
            },
        }
    }
}
