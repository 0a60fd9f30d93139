//! Schema types and canonical type system

use serde::{Deserialize, Serialize};

/// Portable logical type system
///
/// Source column types are mapped onto these before loading, and the
/// lakehouse maps them onto its own primitive types when materializing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum LogicalType {
    /// Boolean type
    Bool,

    /// 32-bit integer
    Int,

    /// 64-bit integer
    Long,

    /// 32-bit floating point
    Float,

    /// 64-bit floating point
    Double,

    /// Fixed-point decimal, values carried unscaled
    Decimal {
        precision: u32,
        scale: u32,
    },

    /// String/text type
    String,

    /// Raw bytes
    Binary,

    /// Date (no time component)
    Date,

    /// Timestamp without time zone
    Timestamp,

    /// Timestamp normalized to UTC
    TimestampTz,
}

impl LogicalType {
    /// Largest decimal precision that fits the unscaled 128-bit representation
    pub const MAX_DECIMAL_PRECISION: u32 = 38;

    /// Decimal used when the source declares no precision
    pub const UNBOUNDED_DECIMAL: LogicalType = LogicalType::Decimal {
        precision: 38,
        scale: 18,
    };
}

impl std::fmt::Display for LogicalType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bool => write!(f, "boolean"),
            Self::Int => write!(f, "integer"),
            Self::Long => write!(f, "long"),
            Self::Float => write!(f, "float"),
            Self::Double => write!(f, "double"),
            Self::Decimal { precision, scale } => write!(f, "decimal({},{})", precision, scale),
            Self::String => write!(f, "string"),
            Self::Binary => write!(f, "binary"),
            Self::Date => write!(f, "date"),
            Self::Timestamp => write!(f, "timestamp_ntz"),
            Self::TimestampTz => write!(f, "timestamp"),
        }
    }
}

/// Nullability state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Nullability {
    /// Definitely nullable
    Yes,

    /// Definitely not nullable
    No,

    /// Cannot determine nullability
    Unknown,
}

impl Nullability {
    /// Whether the column may hold NULLs (unknown is treated as nullable)
    pub fn is_nullable(&self) -> bool {
        !matches!(self, Self::No)
    }
}

/// A column in a schema
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Column {
    /// Column name
    pub name: String,

    /// Logical type
    pub logical_type: LogicalType,

    /// Nullability
    pub nullable: Nullability,
}

impl Column {
    /// Create a new column with unknown nullability
    pub fn new(name: impl Into<String>, logical_type: LogicalType) -> Self {
        Self {
            name: name.into(),
            logical_type,
            nullable: Nullability::Unknown,
        }
    }

    /// Set nullability
    pub fn with_nullability(mut self, nullable: Nullability) -> Self {
        self.nullable = nullable;
        self
    }
}

/// An ordered collection of columns
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    /// Ordered list of columns
    pub columns: Vec<Column>,
}

impl Schema {
    /// Create a new empty schema
    pub fn new() -> Self {
        Self {
            columns: Vec::new(),
        }
    }

    /// Create a schema from columns
    pub fn from_columns(columns: Vec<Column>) -> Self {
        Self { columns }
    }

    /// Find a column by name
    pub fn find_column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Get column names
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Number of columns
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Whether the schema has no columns
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Render the schema as an indented tree for operators
    ///
    /// ```text
    /// root
    ///  |-- id: long (nullable = false)
    ///  |-- email: string (nullable = true)
    /// ```
    pub fn tree_string(&self) -> String {
        let mut out = String::from("root\n");
        for column in &self.columns {
            out.push_str(&format!(
                " |-- {}: {} (nullable = {})\n",
                column.name,
                column.logical_type,
                column.nullable.is_nullable()
            ));
        }
        out
    }
}

impl Default for Schema {
    fn default() -> Self {
        Self::new()
    }
}
