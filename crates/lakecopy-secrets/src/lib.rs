//! Secret store access for source credentials
//!
//! The job never reads credentials from configuration; it receives a secret
//! identifier and resolves it here at run time.
//!
//! ## Features
//!
//! - `aws` (default) - AWS Secrets Manager support
//!
//! ## Example
//!
//! ```rust,ignore
//! use lakecopy_secrets::{SecretsManagerStore, resolve_credentials};
//!
//! let store = SecretsManagerStore::from_region("eu-central-1").await;
//! let secret = resolve_credentials(&store, "prod/aurora/etl").await?;
//! ```

pub mod store;
pub mod aws;
pub mod static_store;

pub use store::{SecretStore, SecretError, resolve_credentials};
pub use aws::SecretsManagerStore;
pub use static_store::StaticSecretStore;
