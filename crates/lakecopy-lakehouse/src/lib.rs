//! Lakehouse destination for copied tables
//!
//! A [`LakeSession`] stages loaded datasets as temporary views and executes
//! create-if-absent statements against a [`LakehouseCatalog`]. The Iceberg
//! implementation registers tables in AWS Glue and writes Parquet data files
//! to the warehouse location.
//!
//! ## Features
//!
//! - `glue` (default) - Iceberg tables in an AWS Glue catalog
//!
//! ## Example
//!
//! ```rust,ignore
//! use lakecopy_lakehouse::{temp_view_name, IcebergLakehouse, LakeSession, SessionSettings};
//!
//! let settings = SessionSettings::from_config(&config.destination, "my-bucket");
//! let catalog = IcebergLakehouse::connect_glue(&settings, "eu-central-1").await?;
//! let mut session = LakeSession::open(Box::new(catalog), settings).await?;
//!
//! let view = temp_view_name("orders");
//! session.create_or_replace_temp_view(view.as_str(), dataset);
//! let statement = session.create_table_as_select("orders", &view);
//! session.execute(&statement).await?;
//! session.stop();
//! ```

pub mod catalog;
pub mod arrow;
pub mod glue;
pub mod memory;
pub mod session;

pub use catalog::{DestinationTable, LakehouseCatalog, TableFormat, TableSpec, WriteError};
pub use glue::IcebergLakehouse;
pub use memory::{CatalogCall, MemoryLakehouse};
pub use session::{
    temp_view_name, CreateTableAsSelect, LakeSession, Materialization, SessionError,
    SessionSettings, SUPPORTED_FORMAT_VERSION, TEMP_VIEW_PREFIX,
};
