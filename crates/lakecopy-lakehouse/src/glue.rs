//! Iceberg tables registered in an AWS Glue catalog
//!
//! Tables are created from the dataset schema, filled with Parquet data
//! files written through the Iceberg writer stack and committed as a single
//! fast-append snapshot. The warehouse location (`s3://bucket/prefix`) and
//! region are passed to the Glue catalog; AWS credentials come from the
//! default provider chain.
//!
//! ## Usage
//!
//! ```rust,ignore
//! let lakehouse = IcebergLakehouse::connect_glue(&settings, "eu-central-1").await?;
//! lakehouse.ensure_namespace("ecommerce_db_dev", true).await?;
//! let rows = lakehouse.create_table_as(&table, &dataset, &TableSpec::iceberg(2)).await?;
//! ```
//!
//! Reference: https://iceberg.apache.org/spec/

use crate::catalog::{DestinationTable, LakehouseCatalog, TableSpec, WriteError};
use crate::session::SessionSettings;
use lakecopy_core::TableDataset;

#[cfg(feature = "glue")]
use lakecopy_core::{LogicalType, Schema};

#[cfg(feature = "glue")]
use std::collections::HashMap;

#[cfg(feature = "glue")]
use std::sync::Arc;

#[cfg(feature = "glue")]
use iceberg::spec::{DataFileFormat, NestedField, PrimitiveType, Schema as IcebergSchema, Type};

#[cfg(feature = "glue")]
use iceberg::table::Table;

#[cfg(feature = "glue")]
use iceberg::transaction::{ApplyTransactionAction, Transaction};

#[cfg(feature = "glue")]
use iceberg::writer::base_writer::data_file_writer::DataFileWriterBuilder;

#[cfg(feature = "glue")]
use iceberg::writer::file_writer::location_generator::{
    DefaultFileNameGenerator, DefaultLocationGenerator,
};

#[cfg(feature = "glue")]
use iceberg::writer::file_writer::rolling_writer::RollingFileWriterBuilder;

#[cfg(feature = "glue")]
use iceberg::writer::file_writer::ParquetWriterBuilder;

#[cfg(feature = "glue")]
use iceberg::writer::{IcebergWriter, IcebergWriterBuilder};

#[cfg(feature = "glue")]
use iceberg::{Catalog, CatalogBuilder, NamespaceIdent, TableCreation, TableIdent};

#[cfg(feature = "glue")]
use iceberg_catalog_glue::{GlueCatalogBuilder, AWS_REGION_NAME, GLUE_CATALOG_PROP_WAREHOUSE};

#[cfg(feature = "glue")]
use parquet::file::properties::WriterProperties;

/// Size at which the writer rolls over to a new data file
#[cfg(feature = "glue")]
const TARGET_FILE_SIZE_BYTES: usize = 512 * 1024 * 1024;

/// Iceberg lakehouse backed by AWS Glue
pub struct IcebergLakehouse {
    /// Iceberg catalog (only available with glue feature)
    #[cfg(feature = "glue")]
    catalog: Arc<dyn Catalog>,

    /// Warehouse root, `s3://bucket/prefix`
    warehouse: String,
}

impl IcebergLakehouse {
    /// Load a Glue catalog for the session's warehouse
    #[cfg(feature = "glue")]
    pub async fn connect_glue(settings: &SessionSettings, region: &str) -> Result<Self, WriteError> {
        let props = HashMap::from([
            (GLUE_CATALOG_PROP_WAREHOUSE.to_string(), settings.warehouse.clone()),
            (AWS_REGION_NAME.to_string(), region.to_string()),
        ]);

        let catalog = GlueCatalogBuilder::default()
            .load(settings.catalog_name.clone(), props)
            .await
            .map_err(|e| WriteError::ConfigError(format!(
                "Failed to load Glue catalog for {}: {}",
                settings.warehouse, e
            )))?;

        tracing::info!(warehouse = %settings.warehouse, region, "Glue catalog loaded");

        Ok(Self {
            catalog: Arc::new(catalog),
            warehouse: settings.warehouse.clone(),
        })
    }

    /// Wrap an already loaded Iceberg catalog
    #[cfg(feature = "glue")]
    pub fn with_catalog(catalog: Arc<dyn Catalog>, warehouse: impl Into<String>) -> Self {
        Self {
            catalog,
            warehouse: warehouse.into(),
        }
    }

    /// Create lakehouse without glue feature (returns error)
    #[cfg(not(feature = "glue"))]
    pub async fn connect_glue(_settings: &SessionSettings, _region: &str) -> Result<Self, WriteError> {
        Err(WriteError::ConfigError(
            "Iceberg support not compiled. Rebuild with: cargo build --features glue".to_string()
        ))
    }

    /// Get the warehouse root
    pub fn warehouse(&self) -> &str {
        &self.warehouse
    }

    /// Convert a dataset schema to an Iceberg schema
    ///
    /// Field ids are assigned 1..n in column order; columns known to be
    /// non-nullable become required fields.
    #[cfg(feature = "glue")]
    pub fn iceberg_schema(schema: &Schema) -> Result<IcebergSchema, WriteError> {
        let fields = schema
            .columns
            .iter()
            .enumerate()
            .map(|(idx, column)| {
                let id = idx as i32 + 1;
                let field_type = Type::Primitive(Self::primitive_type(column.logical_type));
                let field = if column.nullable.is_nullable() {
                    NestedField::optional(id, &column.name, field_type)
                } else {
                    NestedField::required(id, &column.name, field_type)
                };
                Arc::new(field)
            })
            .collect::<Vec<_>>();

        IcebergSchema::builder()
            .with_fields(fields)
            .build()
            .map_err(|e| WriteError::SchemaError(e.to_string()))
    }

    #[cfg(feature = "glue")]
    fn primitive_type(ty: LogicalType) -> PrimitiveType {
        match ty {
            LogicalType::Bool => PrimitiveType::Boolean,
            LogicalType::Int => PrimitiveType::Int,
            LogicalType::Long => PrimitiveType::Long,
            LogicalType::Float => PrimitiveType::Float,
            LogicalType::Double => PrimitiveType::Double,
            LogicalType::Decimal { precision, scale } => PrimitiveType::Decimal { precision, scale },
            LogicalType::String => PrimitiveType::String,
            LogicalType::Binary => PrimitiveType::Binary,
            LogicalType::Date => PrimitiveType::Date,
            LogicalType::Timestamp => PrimitiveType::Timestamp,
            LogicalType::TimestampTz => PrimitiveType::Timestamptz,
        }
    }

    #[cfg(feature = "glue")]
    fn table_ident(table: &DestinationTable) -> TableIdent {
        TableIdent::new(NamespaceIdent::new(table.namespace.clone()), table.name.clone())
    }

    /// Write every row as Parquet data files and commit a fast-append
    #[cfg(feature = "glue")]
    async fn append_rows(&self, table: &Table, data: &TableDataset) -> Result<u64, WriteError> {
        if data.row_count() == 0 {
            return Ok(0);
        }

        let metadata = table.metadata();
        let iceberg_schema = metadata.current_schema().clone();

        // Field ids in the arrow metadata tie parquet columns to the table schema
        let arrow_schema = iceberg::arrow::schema_to_arrow_schema(&iceberg_schema)
            .map_err(|e| WriteError::SchemaError(e.to_string()))?;
        let batch = crate::arrow::record_batch(data, Arc::new(arrow_schema))
            .map_err(|e| WriteError::ConversionError(e.to_string()))?;

        let location_generator = DefaultLocationGenerator::new(metadata.clone())
            .map_err(|e| WriteError::DataFileError(e.to_string()))?;
        let file_name_generator = DefaultFileNameGenerator::new(
            format!("lakecopy-{}", chrono::Utc::now().format("%Y%m%d%H%M%S%3f")),
            None,
            DataFileFormat::Parquet,
        );
        let parquet_writer = ParquetWriterBuilder::new(
            WriterProperties::default(),
            iceberg_schema,
            None,
            table.file_io().clone(),
            location_generator,
            file_name_generator,
        );
        let rolling_writer = RollingFileWriterBuilder::new(parquet_writer, TARGET_FILE_SIZE_BYTES);

        // Unpartitioned tables use the default partition spec
        let mut writer = DataFileWriterBuilder::new(rolling_writer, None, 0)
            .build()
            .await
            .map_err(|e| WriteError::DataFileError(e.to_string()))?;
        writer
            .write(batch)
            .await
            .map_err(|e| WriteError::DataFileError(e.to_string()))?;
        let data_files = writer
            .close()
            .await
            .map_err(|e| WriteError::DataFileError(e.to_string()))?;

        tracing::debug!(files = data_files.len(), rows = data.row_count(), "Data files written");

        let tx = Transaction::new(table);
        let append = tx.fast_append().add_data_files(data_files);
        let tx = append
            .apply(tx)
            .map_err(|e| WriteError::CommitError(e.to_string()))?;
        tx.commit(self.catalog.as_ref())
            .await
            .map_err(|e| WriteError::CommitError(e.to_string()))?;

        Ok(data.row_count() as u64)
    }
}

#[async_trait::async_trait]
impl LakehouseCatalog for IcebergLakehouse {
    fn name(&self) -> &'static str {
        "AWS Glue"
    }

    #[cfg(feature = "glue")]
    async fn ensure_namespace(&self, namespace: &str, create: bool) -> Result<(), WriteError> {
        let ident = NamespaceIdent::new(namespace.to_string());

        let exists = self.catalog
            .namespace_exists(&ident)
            .await
            .map_err(|e| WriteError::NamespaceError(format!("Looking up {}: {}", namespace, e)))?;

        if exists {
            return Ok(());
        }

        if !create {
            return Err(WriteError::NamespaceError(format!(
                "Namespace {} does not exist",
                namespace
            )));
        }

        self.catalog
            .create_namespace(&ident, HashMap::new())
            .await
            .map_err(|e| WriteError::NamespaceError(format!("Creating {}: {}", namespace, e)))?;

        tracing::info!(namespace, "Namespace created");
        Ok(())
    }

    #[cfg(not(feature = "glue"))]
    async fn ensure_namespace(&self, _namespace: &str, _create: bool) -> Result<(), WriteError> {
        Err(WriteError::ConfigError(
            "Iceberg support not compiled. Rebuild with: cargo build --features glue".to_string()
        ))
    }

    #[cfg(feature = "glue")]
    async fn table_exists(&self, table: &DestinationTable) -> Result<bool, WriteError> {
        self.catalog
            .table_exists(&Self::table_ident(table))
            .await
            .map_err(|e| WriteError::CatalogError(format!("Looking up {}: {}", table, e)))
    }

    #[cfg(not(feature = "glue"))]
    async fn table_exists(&self, _table: &DestinationTable) -> Result<bool, WriteError> {
        Err(WriteError::ConfigError(
            "Iceberg support not compiled. Rebuild with: cargo build --features glue".to_string()
        ))
    }

    #[cfg(feature = "glue")]
    async fn create_table_as(
        &self,
        table: &DestinationTable,
        data: &TableDataset,
        spec: &TableSpec,
    ) -> Result<u64, WriteError> {
        // iceberg-rust writes v2 metadata for new tables
        if spec.format_version != crate::session::SUPPORTED_FORMAT_VERSION {
            return Err(WriteError::UnsupportedFormat(format!(
                "{} format version {}",
                spec.format, spec.format_version
            )));
        }

        let schema = Self::iceberg_schema(data.schema())?;
        let creation = TableCreation::builder()
            .name(table.name.clone())
            .schema(schema)
            .properties(spec.properties.clone().into_iter().collect::<HashMap<_, _>>())
            .build();

        let created = self.catalog
            .create_table(&NamespaceIdent::new(table.namespace.clone()), creation)
            .await
            .map_err(|e| WriteError::CatalogError(format!("Creating {}: {}", table, e)))?;

        tracing::info!(table = %table, location = created.metadata().location(), "Table created");

        match self.append_rows(&created, data).await {
            Ok(rows) => Ok(rows),
            Err(err) => {
                // An empty table left behind would be skipped by the next run
                if let Err(drop_err) = self.catalog.drop_table(&Self::table_ident(table)).await {
                    tracing::warn!(table = %table, "Failed to drop partially written table: {}", drop_err);
                }
                Err(err)
            }
        }
    }

    #[cfg(not(feature = "glue"))]
    async fn create_table_as(
        &self,
        _table: &DestinationTable,
        _data: &TableDataset,
        _spec: &TableSpec,
    ) -> Result<u64, WriteError> {
        Err(WriteError::ConfigError(
            "Iceberg support not compiled. Rebuild with: cargo build --features glue".to_string()
        ))
    }

    #[cfg(feature = "glue")]
    async fn test_connection(&self) -> Result<(), WriteError> {
        self.catalog
            .list_namespaces(None)
            .await
            .map_err(|e| WriteError::CatalogError(format!("Connection test failed: {}", e)))?;
        Ok(())
    }

    #[cfg(not(feature = "glue"))]
    async fn test_connection(&self) -> Result<(), WriteError> {
        Err(WriteError::ConfigError(
            "Iceberg support not compiled. Rebuild with: cargo build --features glue".to_string()
        ))
    }
}
