//! In-memory secret store for tests and local runs
//!
//! ```rust,ignore
//! let store = StaticSecretStore::new()
//!     .with_secret("dev/pg", r#"{"host":"localhost","port":5432, ...}"#);
//! let raw = store.get_secret_string("dev/pg").await?;
//! ```

use crate::store::{SecretError, SecretStore};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Secret store backed by a fixed map
#[derive(Clone, Default)]
pub struct StaticSecretStore {
    secrets: HashMap<String, String>,

    /// Errors to return for specific secret ids
    errors: HashMap<String, SecretError>,

    /// Every secret id requested, in order
    lookups: Arc<Mutex<Vec<String>>>,
}

impl StaticSecretStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a secret value
    pub fn with_secret(mut self, secret_id: impl Into<String>, value: impl Into<String>) -> Self {
        self.secrets.insert(secret_id.into(), value.into());
        self
    }

    /// Configure an error to be returned for a secret id
    pub fn with_error(mut self, secret_id: impl Into<String>, error: SecretError) -> Self {
        self.errors.insert(secret_id.into(), error);
        self
    }

    /// Secret ids requested so far
    pub fn lookups(&self) -> Vec<String> {
        self.lookups.lock().map(|l| l.clone()).unwrap_or_default()
    }
}

#[async_trait::async_trait]
impl SecretStore for StaticSecretStore {
    fn name(&self) -> &'static str {
        "Static"
    }

    async fn get_secret_string(&self, secret_id: &str) -> Result<String, SecretError> {
        if let Ok(mut lookups) = self.lookups.lock() {
            lookups.push(secret_id.to_string());
        }

        if let Some(error) = self.errors.get(secret_id) {
            return Err(error.clone());
        }

        self.secrets
            .get(secret_id)
            .cloned()
            .ok_or_else(|| SecretError::NotFound(secret_id.to_string()))
    }
}
