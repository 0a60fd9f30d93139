//! Configuration schema (lakecopy.toml)

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Source database settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Schema whose base tables are copied
    #[serde(default = "default_source_schema")]
    pub schema: String,

    /// Sort enumerated table names lexicographically instead of keeping
    /// the order returned by the metadata catalog
    #[serde(default)]
    pub sort_tables: bool,

    /// Connect over TLS
    #[serde(default)]
    pub tls: bool,
}

fn default_source_schema() -> String {
    "public".to_string()
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            schema: default_source_schema(),
            sort_tables: false,
            tls: false,
        }
    }
}

/// Secret store settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretsConfig {
    /// Region of the secret store
    #[serde(default = "default_region")]
    pub region: String,
}

fn default_region() -> String {
    "eu-central-1".to_string()
}

impl Default for SecretsConfig {
    fn default() -> Self {
        Self {
            region: default_region(),
        }
    }
}

/// Lakehouse destination settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DestinationConfig {
    /// Name the catalog is registered under in the session
    #[serde(default = "default_catalog_name")]
    pub catalog_name: String,

    /// Namespace (Glue database) receiving the tables
    #[serde(default = "default_namespace")]
    pub namespace: String,

    /// Path below the bucket holding the warehouse
    #[serde(default = "default_warehouse_prefix")]
    pub warehouse_prefix: String,

    /// Table format version of created tables
    #[serde(default = "default_format_version")]
    pub format_version: u8,

    /// Create the namespace when it does not exist yet
    #[serde(default = "default_true")]
    pub create_namespace: bool,

    /// Extra table properties set on every created table
    #[serde(default)]
    pub properties: BTreeMap<String, String>,
}

fn default_catalog_name() -> String {
    "glue_catalog".to_string()
}

fn default_namespace() -> String {
    "ecommerce_db_dev".to_string()
}

fn default_warehouse_prefix() -> String {
    "iceberg".to_string()
}

fn default_format_version() -> u8 {
    2
}

fn default_true() -> bool {
    true
}

impl Default for DestinationConfig {
    fn default() -> Self {
        Self {
            catalog_name: default_catalog_name(),
            namespace: default_namespace(),
            warehouse_prefix: default_warehouse_prefix(),
            format_version: default_format_version(),
            create_namespace: true,
            properties: BTreeMap::new(),
        }
    }
}

impl DestinationConfig {
    /// Warehouse location for a destination bucket
    ///
    /// A bare bucket name becomes `s3://{bucket}/{prefix}`; a value that
    /// already carries a scheme is used as the base as-is.
    pub fn warehouse_location(&self, bucket: &str) -> String {
        let base = if bucket.contains("://") {
            bucket.trim_end_matches('/').to_string()
        } else {
            format!("s3://{}", bucket.trim_matches('/'))
        };

        let prefix = self.warehouse_prefix.trim_matches('/');
        if prefix.is_empty() {
            base
        } else {
            format!("{}/{}", base, prefix)
        }
    }
}

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub source: SourceConfig,

    #[serde(default)]
    pub secrets: SecretsConfig,

    #[serde(default)]
    pub destination: DestinationConfig,
}

impl Config {
    /// Load config from TOML file
    pub fn from_file(path: &std::path::Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::IoError(format!("{}: {}", path.display(), e)))?;

        Self::from_toml(&contents)
    }

    /// Load config from TOML string
    pub fn from_toml(toml: &str) -> Result<Self, ConfigError> {
        toml::from_str(toml)
            .map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Serialize back to TOML
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self)
            .map_err(|e| ConfigError::SerializeError(e.to_string()))
    }
}

/// Config error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Serialize error: {0}")]
    SerializeError(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = Config::default();
        assert_eq!(config.source.schema, "public");
        assert!(!config.source.sort_tables);
        assert_eq!(config.secrets.region, "eu-central-1");
        assert_eq!(config.destination.catalog_name, "glue_catalog");
        assert_eq!(config.destination.namespace, "ecommerce_db_dev");
        assert_eq!(config.destination.format_version, 2);
        assert!(config.destination.create_namespace);
    }

    #[test]
    fn empty_toml_is_default() {
        assert_eq!(Config::from_toml("").unwrap(), Config::default());
    }

    #[test]
    fn partial_toml_keeps_other_defaults() {
        let config = Config::from_toml(
            r#"
            [source]
            schema = "sales"
            sort_tables = true

            [destination]
            namespace = "sales_raw"

            [destination.properties]
            "write.parquet.compression-codec" = "zstd"
            "#,
        )
        .unwrap();

        assert_eq!(config.source.schema, "sales");
        assert!(config.source.sort_tables);
        assert!(!config.source.tls);
        assert_eq!(config.destination.namespace, "sales_raw");
        assert_eq!(config.destination.catalog_name, "glue_catalog");
        assert_eq!(
            config.destination.properties.get("write.parquet.compression-codec").map(String::as_str),
            Some("zstd")
        );
    }

    #[test]
    fn invalid_toml_is_parse_error() {
        assert!(matches!(
            Config::from_toml("[source\nschema = 1"),
            Err(ConfigError::ParseError(_))
        ));
    }

    #[test]
    fn config_toml_roundtrip() {
        let config = Config::default();
        let toml = config.to_toml().unwrap();
        assert_eq!(Config::from_toml(&toml).unwrap(), config);
    }

    #[test]
    fn warehouse_location_from_bucket() {
        let dest = DestinationConfig::default();
        assert_eq!(dest.warehouse_location("my-lake"), "s3://my-lake/iceberg");
        assert_eq!(dest.warehouse_location("s3://my-lake/"), "s3://my-lake/iceberg");
        assert_eq!(dest.warehouse_location("file:///tmp/lake"), "file:///tmp/lake/iceberg");

        let bare = DestinationConfig {
            warehouse_prefix: String::new(),
            ..DestinationConfig::default()
        };
        assert_eq!(bare.warehouse_location("my-lake"), "s3://my-lake");
    }
}
