//! lakecopy core
//!
//! Domain model shared by every stage of a copy run: the portable type
//! system, in-memory table datasets, source credentials and the connection
//! descriptor derived from them, job configuration and the run report.

pub mod schema;
pub mod value;
pub mod dataset;
pub mod credentials;
pub mod config;
pub mod report;

pub use schema::{LogicalType, Column, Schema, Nullability};
pub use value::{Value, Row, ValueError};
pub use dataset::{TableDataset, DatasetError};
pub use credentials::{DatabaseSecret, ConnectionOptions, CredentialError, POSTGRES_DRIVER};
pub use config::{Config, ConfigError, SourceConfig, SecretsConfig, DestinationConfig};
pub use report::{RunReport, ReportVersion, RunStatus, TableEntry, TableOutcomeKind, FailureEntry};
