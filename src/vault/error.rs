/// Errors raised while building a vault client or talking to the vault.
#[derive(Debug, thiserror::Error)]
pub enum VaultError {
    /// Credential construction or token acquisition was rejected, or the
    /// vault refused the presented token.
    #[error("Authentication error: {0}")]
    Authentication(String),

    #[error("Secret not found: {0}")]
    SecretNotFound(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("HTTP status {0}: {1}")]
    HttpStatus(u16, String),

    #[error("Parse error: {0}")]
    Parse(String),
}

impl VaultError {
    pub fn authentication(msg: impl Into<String>) -> Self {
        Self::Authentication(msg.into())
    }

    pub fn not_found(name: impl Into<String>) -> Self {
        Self::SecretNotFound(name.into())
    }

    pub fn network(msg: impl Into<String>) -> Self {
        Self::Network(msg.into())
    }
}
