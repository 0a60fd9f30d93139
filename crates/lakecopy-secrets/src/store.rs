//! Secret store trait and credential resolution

use lakecopy_core::{CredentialError, DatabaseSecret};

/// Errors that can occur when retrieving a secret
#[derive(Debug, Clone, thiserror::Error)]
pub enum SecretError {
    #[error("Secret not found: {0}")]
    NotFound(String),

    #[error("Access denied to secret {0}")]
    AccessDenied(String),

    #[error("Secret {0} has no string value")]
    MissingSecretString(String),

    #[error("Secret {secret_id} is malformed: {source}")]
    Malformed {
        secret_id: String,
        #[source]
        source: CredentialError,
    },

    #[error("Secret store error: {0}")]
    Service(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// A managed secret store holding JSON credential documents
#[async_trait::async_trait]
pub trait SecretStore: Send + Sync {
    /// Get the store name (e.g., "AWS Secrets Manager")
    fn name(&self) -> &'static str;

    /// Fetch the raw string value of a secret
    async fn get_secret_string(&self, secret_id: &str) -> Result<String, SecretError>;
}

/// Fetch a secret and decode it into database credentials
///
/// Any retrieval or decoding failure is returned as-is; callers treat it as
/// fatal. The secret contents are never logged.
pub async fn resolve_credentials(
    store: &dyn SecretStore,
    secret_id: &str,
) -> Result<DatabaseSecret, SecretError> {
    tracing::info!(store = store.name(), secret_id, "Resolving source credentials");

    let raw = store.get_secret_string(secret_id).await?;
    let secret = DatabaseSecret::from_json(&raw).map_err(|source| SecretError::Malformed {
        secret_id: secret_id.to_string(),
        source,
    })?;

    tracing::debug!(host = %secret.host, port = secret.port, dbname = %secret.dbname, "Credentials resolved");
    Ok(secret)
}
