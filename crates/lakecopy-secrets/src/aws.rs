//! AWS Secrets Manager store
//!
//! Credentials for the AWS call itself come from the default provider chain
//! (environment, profile, instance/role metadata). Only the region is
//! configured explicitly.
//!
//! ```rust,ignore
//! let store = SecretsManagerStore::from_region("eu-central-1").await;
//! let raw = store.get_secret_string("prod/aurora/etl").await?;
//! ```

use crate::store::{SecretError, SecretStore};

#[cfg(feature = "aws")]
use aws_sdk_secretsmanager::config::Region;

#[cfg(feature = "aws")]
use aws_sdk_secretsmanager::error::{DisplayErrorContext, ProvideErrorMetadata};

#[cfg(feature = "aws")]
use aws_sdk_secretsmanager::Client;

/// Secret store backed by AWS Secrets Manager
pub struct SecretsManagerStore {
    #[cfg(feature = "aws")]
    client: Client,

    region: String,
}

impl SecretsManagerStore {
    /// Build a store for `region` using the default AWS credential chain
    #[cfg(feature = "aws")]
    pub async fn from_region(region: impl Into<String>) -> Self {
        let region = region.into();
        let sdk_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(Region::new(region.clone()))
            .load()
            .await;

        Self {
            client: Client::new(&sdk_config),
            region,
        }
    }

    /// Wrap an already configured client
    #[cfg(feature = "aws")]
    pub fn with_client(client: Client, region: impl Into<String>) -> Self {
        Self {
            client,
            region: region.into(),
        }
    }

    /// Create store without aws feature (every lookup fails)
    #[cfg(not(feature = "aws"))]
    pub async fn from_region(region: impl Into<String>) -> Self {
        Self {
            region: region.into(),
        }
    }

    pub fn region(&self) -> &str {
        &self.region
    }
}

#[async_trait::async_trait]
impl SecretStore for SecretsManagerStore {
    fn name(&self) -> &'static str {
        "AWS Secrets Manager"
    }

    #[cfg(feature = "aws")]
    async fn get_secret_string(&self, secret_id: &str) -> Result<String, SecretError> {
        let output = match self.client.get_secret_value().secret_id(secret_id).send().await {
            Ok(output) => output,
            Err(err) => {
                let message = DisplayErrorContext(&err).to_string();
                let service_err = err.into_service_error();

                return Err(if service_err.is_resource_not_found_exception() {
                    SecretError::NotFound(secret_id.to_string())
                } else if service_err.code() == Some("AccessDeniedException") {
                    SecretError::AccessDenied(secret_id.to_string())
                } else {
                    SecretError::Service(format!(
                        "GetSecretValue for {} in {} failed: {}",
                        secret_id, self.region, message
                    ))
                });
            }
        };

        output
            .secret_string()
            .map(str::to_string)
            .ok_or_else(|| SecretError::MissingSecretString(secret_id.to_string()))
    }

    #[cfg(not(feature = "aws"))]
    async fn get_secret_string(&self, _secret_id: &str) -> Result<String, SecretError> {
        Err(SecretError::ConfigError(
            "AWS Secrets Manager support not compiled. Rebuild with: cargo build --features aws".to_string()
        ))
    }
}
