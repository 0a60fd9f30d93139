//! Source database access for table discovery and full-table loads
//!
//! This crate lists the base tables of a schema through the database's
//! INFORMATION_SCHEMA views and reads whole tables into [`TableDataset`]s.
//!
//! ## Features
//!
//! - `postgres` (default) - PostgreSQL / Aurora PostgreSQL support
//!
//! ## Example
//!
//! ```rust,ignore
//! use lakecopy_source::{PostgresConnector, SourceConnector, TableIdentifier};
//!
//! let source = PostgresConnector::new().connect(&options).await?;
//! for name in source.list_tables("public").await? {
//!     let table = TableIdentifier::new("shop", "public", name);
//!     let dataset = source.load_table(&table).await?;
//! }
//! ```
//!
//! [`TableDataset`]: lakecopy_core::TableDataset

pub mod adapter;
pub mod postgres;
pub mod mock;

pub use adapter::{SourceDatabase, SourceConnector, TableIdentifier, FetchError};
pub use postgres::{PostgresSource, PostgresConnector};
pub use mock::{MockSource, MockSourceBuilder, SourceCall};
