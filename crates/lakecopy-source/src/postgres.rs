//! PostgreSQL source using information_schema
//!
//! Works with PostgreSQL 9.4+ and Aurora PostgreSQL. Tables are enumerated
//! from `information_schema.tables`, column metadata comes from
//! `information_schema.columns`, and rows are read with a single
//! `SELECT` whose column list casts every column to the wire type of its
//! logical type.
//!
//! ## Usage
//!
//! ```rust,ignore
//! let connector = PostgresConnector::new().with_tls(true);
//! let source = connector.connect(&options).await?;
//! let tables = source.list_tables("public").await?;
//! ```
//!
//! Reference: https://www.postgresql.org/docs/current/information-schema.html

use crate::adapter::{quote_ident, FetchError, SourceConnector, SourceDatabase, TableIdentifier};
use lakecopy_core::{Column, ConnectionOptions, LogicalType, Nullability, Schema, TableDataset};

#[cfg(feature = "postgres")]
use lakecopy_core::value::{parse_decimal, Value};

#[cfg(feature = "postgres")]
use tokio_postgres::{error::SqlState, Client, Config as PgConfig, NoTls};

#[cfg(feature = "postgres")]
use postgres_native_tls::MakeTlsConnector;

#[cfg(feature = "postgres")]
use native_tls::TlsConnector;

/// PostgreSQL source database
pub struct PostgresSource {
    /// PostgreSQL client (only available with postgres feature)
    #[cfg(feature = "postgres")]
    client: Client,

    /// Connection host
    host: String,

    /// Connection port
    port: u16,

    /// Database name
    database: String,
}

impl PostgresSource {
    /// Connect using a connection descriptor
    ///
    /// The password is handed to the driver directly and never formatted
    /// into a connection string.
    #[cfg(feature = "postgres")]
    pub async fn connect(options: &ConnectionOptions, tls: bool) -> Result<Self, FetchError> {
        let (host, port, database) = options
            .endpoint()
            .map_err(|e| FetchError::ConfigError(e.to_string()))?;

        let mut config = PgConfig::new();
        config
            .host(&host)
            .port(port)
            .dbname(&database)
            .user(&options.user)
            .password(&options.password)
            .application_name("lakecopy");

        let client = if tls {
            let connector = TlsConnector::builder()
                .build()
                .map_err(|e| FetchError::ConfigError(format!(
                    "Failed to create TLS connector: {}", e
                )))?;

            let (client, connection) = config
                .connect(MakeTlsConnector::new(connector))
                .await
                .map_err(|e| connect_error(&host, port, e))?;

            // Spawn connection handler in background
            let host_clone = host.clone();
            tokio::spawn(async move {
                if let Err(e) = connection.await {
                    tracing::error!(host = %host_clone, port, "PostgreSQL TLS connection error: {}", e);
                }
            });

            client
        } else {
            let (client, connection) = config
                .connect(NoTls)
                .await
                .map_err(|e| connect_error(&host, port, e))?;

            let host_clone = host.clone();
            tokio::spawn(async move {
                if let Err(e) = connection.await {
                    tracing::error!(host = %host_clone, port, "PostgreSQL connection error: {}", e);
                }
            });

            client
        };

        tracing::info!(url = %options.redacted_url(), tls, "Connected to PostgreSQL");

        Ok(Self {
            client,
            host,
            port,
            database,
        })
    }

    /// Create source without postgres feature (returns error)
    #[cfg(not(feature = "postgres"))]
    pub async fn connect(_options: &ConnectionOptions, _tls: bool) -> Result<Self, FetchError> {
        Err(FetchError::ConfigError(
            "PostgreSQL support not compiled. Rebuild with: cargo build --features postgres".to_string()
        ))
    }

    /// Convert PostgreSQL type to LogicalType
    ///
    /// `pg_type` is the `data_type` from information_schema, with numeric
    /// precision and scale appended (`numeric(10,2)`) and arrays written as
    /// `element[]`.
    ///
    /// # Mapping
    ///
    /// - **Boolean**: `boolean` → Bool
    /// - **Integer**: `smallint`, `integer` → Int; `bigint`, `oid` → Long
    /// - **Floating Point**: `real` → Float; `double precision` → Double
    /// - **Numeric**: `numeric(p,s)` → Decimal(p,s); unconstrained → Decimal(38,18);
    ///   precision above 38 → String; `money` → Decimal(19,2)
    /// - **Binary**: `bytea` → Binary
    /// - **Date/Time**: `date` → Date; `timestamp` → Timestamp; `timestamptz` → TimestampTz
    /// - Everything else (text, json, uuid, time, interval, arrays, network,
    ///   geometric, range types) is read as its text representation
    pub fn map_postgres_type(pg_type: &str) -> LogicalType {
        if pg_type.ends_with("[]") {
            return LogicalType::String;
        }

        let base_type = pg_type.split('(').next()
            .unwrap_or(pg_type)
            .trim()
            .to_lowercase();

        match base_type.as_str() {
            // Boolean types
            "boolean" | "bool" => LogicalType::Bool,

            // Integer types
            "smallint" | "int2" => LogicalType::Int,
            "integer" | "int" | "int4" => LogicalType::Int,
            "serial" | "serial4" | "smallserial" | "serial2" => LogicalType::Int,
            "bigint" | "int8" => LogicalType::Long,
            "bigserial" | "serial8" => LogicalType::Long,
            "oid" => LogicalType::Long,

            // Floating point types
            "real" | "float4" => LogicalType::Float,
            "double precision" | "float8" | "float" => LogicalType::Double,

            // Numeric/Decimal types
            "numeric" | "decimal" => Self::parse_numeric_type(pg_type),

            // Money type (fixed precision)
            "money" => LogicalType::Decimal {
                precision: 19,
                scale: 2,
            },

            // Binary data
            "bytea" => LogicalType::Binary,

            // Date/Time types
            "date" => LogicalType::Date,
            "timestamp without time zone" | "timestamp" => LogicalType::Timestamp,
            "timestamp with time zone" | "timestamptz" => LogicalType::TimestampTz,

            _ => LogicalType::String,
        }
    }

    /// Parse numeric type with precision and scale
    ///
    /// Handles types like:
    /// - `numeric` - arbitrary precision
    /// - `numeric(10)` - precision 10, scale 0
    /// - `numeric(10,2)` - precision 10, scale 2
    fn parse_numeric_type(type_str: &str) -> LogicalType {
        let mut declared = None;

        if let Some(params) = type_str.split('(').nth(1) {
            if let Some(params) = params.strip_suffix(')') {
                let parts: Vec<&str> = params.split(',').collect();
                let precision: Option<u32> = parts.first().and_then(|p| p.trim().parse().ok());
                let scale: Option<u32> = match parts.len() {
                    1 => Some(0),
                    2 => parts[1].trim().parse().ok(),
                    _ => None,
                };
                if let (Some(precision), Some(scale)) = (precision, scale) {
                    declared = Some((precision, scale));
                }
            }
        }

        match declared {
            Some((precision, scale))
                if precision <= LogicalType::MAX_DECIMAL_PRECISION && scale <= precision =>
            {
                LogicalType::Decimal { precision, scale }
            }
            // Wider than the fixed-point representation allows
            Some(_) => LogicalType::String,
            // NUMERIC without precision has arbitrary precision
            None => LogicalType::UNBOUNDED_DECIMAL,
        }
    }

    /// Column expression that casts a column to the wire type its logical
    /// type is decoded from
    pub fn select_expression(column: &Column) -> String {
        let ident = quote_ident(&column.name);
        match column.logical_type {
            LogicalType::Bool
            | LogicalType::Binary
            | LogicalType::Date
            | LogicalType::Timestamp
            | LogicalType::TimestampTz => ident,
            LogicalType::Int => format!("{}::int4", ident),
            LogicalType::Long => format!("{}::int8", ident),
            LogicalType::Float => format!("{}::float4", ident),
            LogicalType::Double => format!("{}::float8", ident),
            LogicalType::Decimal { .. } => format!("{}::numeric::text", ident),
            LogicalType::String => format!("{}::text", ident),
        }
    }

    /// Full-table query for a resolved schema
    pub fn select_statement(table: &TableIdentifier, schema: &Schema) -> String {
        let columns: Vec<String> = schema.columns.iter().map(Self::select_expression).collect();
        format!("SELECT {} FROM {}", columns.join(", "), table.quoted())
    }

    /// Get the connection host
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Get the connection port
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Get the database name
    pub fn database(&self) -> &str {
        &self.database
    }
}

#[cfg(feature = "postgres")]
fn connect_error(host: &str, port: u16, e: tokio_postgres::Error) -> FetchError {
    let message = format!("Failed to connect to PostgreSQL at {}:{}: {}", host, port, e);
    match e.code() {
        Some(code)
            if *code == SqlState::INVALID_PASSWORD
                || *code == SqlState::INVALID_AUTHORIZATION_SPECIFICATION =>
        {
            FetchError::AuthenticationError(message)
        }
        Some(_) => FetchError::QueryError(message),
        None => FetchError::NetworkError(message),
    }
}

#[cfg(feature = "postgres")]
fn query_error(context: &str, e: tokio_postgres::Error) -> FetchError {
    let message = format!("{}: {}", context, e);
    match e.code() {
        Some(code) if *code == SqlState::UNDEFINED_TABLE => FetchError::TableNotFound(message),
        Some(code) if *code == SqlState::INSUFFICIENT_PRIVILEGE => FetchError::PermissionDenied(message),
        Some(_) => FetchError::QueryError(message),
        None if e.is_closed() => FetchError::NetworkError(message),
        None => FetchError::QueryError(message),
    }
}

/// Decode one cell according to its column's logical type
#[cfg(feature = "postgres")]
fn decode_value(row: &tokio_postgres::Row, idx: usize, column: &Column) -> Result<Value, FetchError> {
    let invalid = |e: tokio_postgres::Error| {
        FetchError::InvalidResponse(format!("column '{}': {}", column.name, e))
    };

    let value = match column.logical_type {
        LogicalType::Bool => row.try_get::<_, Option<bool>>(idx).map_err(invalid)?.map(Value::Bool),
        LogicalType::Int => row.try_get::<_, Option<i32>>(idx).map_err(invalid)?.map(Value::Int),
        LogicalType::Long => row.try_get::<_, Option<i64>>(idx).map_err(invalid)?.map(Value::Long),
        LogicalType::Float => row.try_get::<_, Option<f32>>(idx).map_err(invalid)?.map(Value::Float),
        LogicalType::Double => row.try_get::<_, Option<f64>>(idx).map_err(invalid)?.map(Value::Double),
        LogicalType::Decimal { precision, scale } => {
            match row.try_get::<_, Option<String>>(idx).map_err(invalid)? {
                Some(text) => {
                    let unscaled = parse_decimal(&text, precision, scale).map_err(|e| {
                        FetchError::InvalidResponse(format!("column '{}': {}", column.name, e))
                    })?;
                    Some(Value::Decimal(unscaled))
                }
                None => None,
            }
        }
        LogicalType::String => row.try_get::<_, Option<String>>(idx).map_err(invalid)?.map(Value::String),
        LogicalType::Binary => row.try_get::<_, Option<Vec<u8>>>(idx).map_err(invalid)?.map(Value::Binary),
        LogicalType::Date => row
            .try_get::<_, Option<chrono::NaiveDate>>(idx)
            .map_err(invalid)?
            .map(Value::Date),
        LogicalType::Timestamp => row
            .try_get::<_, Option<chrono::NaiveDateTime>>(idx)
            .map_err(invalid)?
            .map(Value::Timestamp),
        LogicalType::TimestampTz => row
            .try_get::<_, Option<chrono::DateTime<chrono::Utc>>>(idx)
            .map_err(invalid)?
            .map(Value::TimestampTz),
    };

    Ok(value.unwrap_or(Value::Null))
}

#[async_trait::async_trait]
impl SourceDatabase for PostgresSource {
    fn name(&self) -> &'static str {
        "PostgreSQL"
    }

    #[cfg(feature = "postgres")]
    async fn list_tables(&self, schema: &str) -> Result<Vec<String>, FetchError> {
        // information_schema columns are domain types; compare and return as text
        let query = r#"
            SELECT table_name::text
            FROM information_schema.tables
            WHERE table_schema::text = $1
              AND table_type = 'BASE TABLE'
        "#;

        let rows = self.client
            .query(query, &[&schema])
            .await
            .map_err(|e| query_error(&format!("Listing tables of schema {}", schema), e))?;

        let tables: Vec<String> = rows.iter().map(|row| row.get(0)).collect();
        tracing::info!(schema, count = tables.len(), "Enumerated base tables");
        Ok(tables)
    }

    #[cfg(not(feature = "postgres"))]
    async fn list_tables(&self, _schema: &str) -> Result<Vec<String>, FetchError> {
        Err(FetchError::ConfigError(
            "PostgreSQL support not compiled. Rebuild with: cargo build --features postgres".to_string()
        ))
    }

    #[cfg(feature = "postgres")]
    async fn fetch_schema(&self, table: &TableIdentifier) -> Result<Schema, FetchError> {
        let query = r#"
            SELECT
                column_name::text,
                data_type::text,
                is_nullable::text,
                numeric_precision::int4,
                numeric_scale::int4,
                udt_name::text
            FROM information_schema.columns
            WHERE table_schema::text = $1
              AND table_name::text = $2
            ORDER BY ordinal_position
        "#;

        let rows = self.client
            .query(query, &[&table.schema, &table.table])
            .await
            .map_err(|e| query_error(&format!("Fetching columns of {}", table.fqn()), e))?;

        let mut columns = Vec::new();

        for row in rows {
            let col_name: String = row.get(0);
            let data_type: String = row.get(1);
            let is_nullable: String = row.get(2);
            let numeric_precision: Option<i32> = row.get(3);
            let numeric_scale: Option<i32> = row.get(4);
            let udt_name: String = row.get(5);

            // Build full type string for numeric types with precision/scale
            let full_type = if data_type == "numeric" {
                match (numeric_precision, numeric_scale) {
                    (Some(p), Some(s)) => format!("numeric({},{})", p, s),
                    (Some(p), None) => format!("numeric({})", p),
                    _ => data_type.clone(),
                }
            } else if data_type == "ARRAY" {
                // Array type - convert _int4 to int4[]
                format!("{}[]", udt_name.trim_start_matches('_'))
            } else {
                data_type.clone()
            };

            let nullable = match is_nullable.to_uppercase().as_str() {
                "YES" => Nullability::Yes,
                "NO" => Nullability::No,
                _ => Nullability::Unknown,
            };

            columns.push(
                Column::new(col_name, Self::map_postgres_type(&full_type))
                    .with_nullability(nullable)
            );
        }

        if columns.is_empty() {
            return Err(FetchError::TableNotFound(format!(
                "Table {} not found or has no columns",
                table.fqn()
            )));
        }

        Ok(Schema::from_columns(columns))
    }

    #[cfg(not(feature = "postgres"))]
    async fn fetch_schema(&self, _table: &TableIdentifier) -> Result<Schema, FetchError> {
        Err(FetchError::ConfigError(
            "PostgreSQL support not compiled. Rebuild with: cargo build --features postgres".to_string()
        ))
    }

    #[cfg(feature = "postgres")]
    async fn load_table(&self, table: &TableIdentifier) -> Result<TableDataset, FetchError> {
        let schema = self.fetch_schema(table).await?;
        let statement = Self::select_statement(table, &schema);
        tracing::debug!(table = %table, %statement, "Loading table");

        let rows = self.client
            .query(statement.as_str(), &[])
            .await
            .map_err(|e| query_error(&format!("Reading {}", table.fqn()), e))?;

        let mut values = Vec::with_capacity(rows.len());
        for row in &rows {
            let mut record = Vec::with_capacity(schema.len());
            for (idx, column) in schema.columns.iter().enumerate() {
                record.push(decode_value(row, idx, column)?);
            }
            values.push(record);
        }

        tracing::debug!(table = %table, rows = values.len(), "Table loaded");

        TableDataset::new(table.table.clone(), schema, values)
            .map_err(|e| FetchError::InvalidResponse(e.to_string()))
    }

    #[cfg(not(feature = "postgres"))]
    async fn load_table(&self, _table: &TableIdentifier) -> Result<TableDataset, FetchError> {
        Err(FetchError::ConfigError(
            "PostgreSQL support not compiled. Rebuild with: cargo build --features postgres".to_string()
        ))
    }

    #[cfg(feature = "postgres")]
    async fn test_connection(&self) -> Result<(), FetchError> {
        // Simple query to test connection
        self.client
            .query("SELECT 1", &[])
            .await
            .map_err(|e| FetchError::QueryError(format!("Connection test failed: {}", e)))?;
        Ok(())
    }

    #[cfg(not(feature = "postgres"))]
    async fn test_connection(&self) -> Result<(), FetchError> {
        Err(FetchError::ConfigError(
            "PostgreSQL support not compiled. Rebuild with: cargo build --features postgres".to_string()
        ))
    }
}

/// Connector opening [`PostgresSource`] connections
#[derive(Debug, Clone, Default)]
pub struct PostgresConnector {
    tls: bool,
}

impl PostgresConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use TLS for every connection
    pub fn with_tls(mut self, tls: bool) -> Self {
        self.tls = tls;
        self
    }
}

#[async_trait::async_trait]
impl SourceConnector for PostgresConnector {
    fn name(&self) -> &'static str {
        "PostgreSQL"
    }

    async fn connect(&self, options: &ConnectionOptions) -> Result<Box<dyn SourceDatabase>, FetchError> {
        let source = PostgresSource::connect(options, self.tls).await?;
        Ok(Box::new(source))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_type_mapping() {
        // Boolean
        assert_eq!(PostgresSource::map_postgres_type("boolean"), LogicalType::Bool);

        // Integer types
        assert_eq!(PostgresSource::map_postgres_type("integer"), LogicalType::Int);
        assert_eq!(PostgresSource::map_postgres_type("smallint"), LogicalType::Int);
        assert_eq!(PostgresSource::map_postgres_type("bigint"), LogicalType::Long);
        assert_eq!(PostgresSource::map_postgres_type("oid"), LogicalType::Long);

        // Float types
        assert_eq!(PostgresSource::map_postgres_type("real"), LogicalType::Float);
        assert_eq!(PostgresSource::map_postgres_type("double precision"), LogicalType::Double);
    }

    #[test]
    fn test_string_type_mapping() {
        for pg_type in ["text", "character varying", "character", "name", "uuid", "json", "jsonb", "xml"] {
            assert_eq!(PostgresSource::map_postgres_type(pg_type), LogicalType::String, "{pg_type}");
        }
    }

    #[test]
    fn test_datetime_type_mapping() {
        assert_eq!(PostgresSource::map_postgres_type("date"), LogicalType::Date);
        assert_eq!(PostgresSource::map_postgres_type("timestamp without time zone"), LogicalType::Timestamp);
        assert_eq!(PostgresSource::map_postgres_type("timestamp with time zone"), LogicalType::TimestampTz);
        // No time-of-day logical type; read as text
        assert_eq!(PostgresSource::map_postgres_type("time without time zone"), LogicalType::String);
        assert_eq!(PostgresSource::map_postgres_type("interval"), LogicalType::String);
    }

    #[test]
    fn test_numeric_type_parsing() {
        assert_eq!(
            PostgresSource::map_postgres_type("numeric"),
            LogicalType::Decimal { precision: 38, scale: 18 }
        );
        assert_eq!(
            PostgresSource::map_postgres_type("numeric(10,2)"),
            LogicalType::Decimal { precision: 10, scale: 2 }
        );
        assert_eq!(
            PostgresSource::map_postgres_type("numeric(10)"),
            LogicalType::Decimal { precision: 10, scale: 0 }
        );
        assert_eq!(
            PostgresSource::map_postgres_type("money"),
            LogicalType::Decimal { precision: 19, scale: 2 }
        );
        assert_eq!(PostgresSource::map_postgres_type("numeric(60,4)"), LogicalType::String);
    }

    #[test]
    fn test_array_and_binary_mapping() {
        assert_eq!(PostgresSource::map_postgres_type("int4[]"), LogicalType::String);
        assert_eq!(PostgresSource::map_postgres_type("text[]"), LogicalType::String);
        assert_eq!(PostgresSource::map_postgres_type("bytea"), LogicalType::Binary);
    }

    #[test]
    fn test_network_and_geometric_mapping() {
        for pg_type in ["inet", "cidr", "macaddr", "point", "polygon", "tsvector", "int4range"] {
            assert_eq!(PostgresSource::map_postgres_type(pg_type), LogicalType::String, "{pg_type}");
        }
    }

    #[test]
    fn test_select_expressions() {
        let cases = [
            (LogicalType::Bool, "\"c\""),
            (LogicalType::Int, "\"c\"::int4"),
            (LogicalType::Long, "\"c\"::int8"),
            (LogicalType::Float, "\"c\"::float4"),
            (LogicalType::Double, "\"c\"::float8"),
            (LogicalType::Decimal { precision: 10, scale: 2 }, "\"c\"::numeric::text"),
            (LogicalType::String, "\"c\"::text"),
            (LogicalType::Binary, "\"c\""),
            (LogicalType::TimestampTz, "\"c\""),
        ];
        for (ty, expected) in cases {
            assert_eq!(PostgresSource::select_expression(&Column::new("c", ty)), expected);
        }
    }

    #[test]
    fn test_select_statement() {
        let table = TableIdentifier::new("shop", "public", "orders");
        let schema = Schema::from_columns(vec![
            Column::new("id", LogicalType::Long),
            Column::new("total", LogicalType::Decimal { precision: 10, scale: 2 }),
            Column::new("placed_at", LogicalType::TimestampTz),
        ]);

        assert_eq!(
            PostgresSource::select_statement(&table, &schema),
            "SELECT \"id\"::int8, \"total\"::numeric::text, \"placed_at\" FROM \"public\".\"orders\""
        );
    }
}
