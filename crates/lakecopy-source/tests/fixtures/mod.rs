//! Test fixtures for source integration tests
//!
//! Small e-commerce tables with deterministic contents, shaped like the
//! tables an operational Aurora database typically holds.

#![allow(dead_code)]

use chrono::{NaiveDate, TimeZone, Utc};
use lakecopy_core::{Column, LogicalType, Nullability, Row, Schema, TableDataset, Value};

/// Orders table schema
///
/// - Primary key (id)
/// - Foreign key (customer_id)
/// - Financial data (total_amount)
/// - Status tracking
pub fn orders_schema() -> Schema {
    Schema::from_columns(vec![
        Column::new("id", LogicalType::Long).with_nullability(Nullability::No),
        Column::new("customer_id", LogicalType::Long).with_nullability(Nullability::No),
        Column::new(
            "total_amount",
            LogicalType::Decimal {
                precision: 10,
                scale: 2,
            },
        )
        .with_nullability(Nullability::No),
        Column::new("status", LogicalType::String).with_nullability(Nullability::No),
        Column::new("placed_at", LogicalType::TimestampTz).with_nullability(Nullability::No),
    ])
}

/// `count` orders spread over three customers
pub fn orders(count: usize) -> TableDataset {
    let statuses = ["pending", "shipped", "delivered"];
    let rows: Vec<Row> = (0..count)
        .map(|i| {
            vec![
                Value::Long(i as i64 + 1),
                Value::Long((i % 3) as i64 + 1),
                Value::Decimal(1999 + (i as i128) * 100),
                Value::String(statuses[i % statuses.len()].to_string()),
                Value::TimestampTz(Utc.timestamp_opt(1_700_000_000 + (i as i64) * 3_600, 0).unwrap()),
            ]
        })
        .collect();

    TableDataset::new("orders", orders_schema(), rows).unwrap()
}

/// Customers table schema
pub fn customers_schema() -> Schema {
    Schema::from_columns(vec![
        Column::new("id", LogicalType::Long).with_nullability(Nullability::No),
        Column::new("email", LogicalType::String).with_nullability(Nullability::No),
        Column::new("name", LogicalType::String).with_nullability(Nullability::Yes),
        Column::new("signup_date", LogicalType::Date).with_nullability(Nullability::No),
        Column::new("is_active", LogicalType::Bool).with_nullability(Nullability::No),
    ])
}

/// Three customers, one without a name
pub fn customers() -> TableDataset {
    let rows = vec![
        vec![
            Value::Long(1),
            Value::String("ada@example.com".to_string()),
            Value::String("Ada".to_string()),
            Value::Date(NaiveDate::from_ymd_opt(2023, 1, 15).unwrap()),
            Value::Bool(true),
        ],
        vec![
            Value::Long(2),
            Value::String("grace@example.com".to_string()),
            Value::Null,
            Value::Date(NaiveDate::from_ymd_opt(2023, 6, 2).unwrap()),
            Value::Bool(true),
        ],
        vec![
            Value::Long(3),
            Value::String("linus@example.com".to_string()),
            Value::String("Linus".to_string()),
            Value::Date(NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()),
            Value::Bool(false),
        ],
    ];

    TableDataset::new("customers", customers_schema(), rows).unwrap()
}

/// Products table schema
pub fn products_schema() -> Schema {
    Schema::from_columns(vec![
        Column::new("id", LogicalType::Int).with_nullability(Nullability::No),
        Column::new("name", LogicalType::String).with_nullability(Nullability::No),
        Column::new("description", LogicalType::String).with_nullability(Nullability::Yes),
        Column::new(
            "price",
            LogicalType::Decimal {
                precision: 10,
                scale: 2,
            },
        )
        .with_nullability(Nullability::No),
        Column::new("stock_quantity", LogicalType::Int).with_nullability(Nullability::No),
        Column::new("updated_at", LogicalType::Timestamp).with_nullability(Nullability::Yes),
    ])
}

/// `count` products
pub fn products(count: usize) -> TableDataset {
    let updated = NaiveDate::from_ymd_opt(2024, 5, 1)
        .unwrap()
        .and_hms_opt(12, 0, 0)
        .unwrap();
    let rows: Vec<Row> = (0..count)
        .map(|i| {
            vec![
                Value::Int(i as i32 + 1),
                Value::String(format!("product-{}", i + 1)),
                if i % 2 == 0 { Value::Null } else { Value::String("in stock".to_string()) },
                Value::Decimal(499 + i as i128),
                Value::Int((i * 7) as i32),
                Value::Timestamp(updated),
            ]
        })
        .collect();

    TableDataset::new("products", products_schema(), rows).unwrap()
}

/// One column for every logical type, all nullable
pub fn all_types_schema() -> Schema {
    Schema::from_columns(vec![
        Column::new("bool_col", LogicalType::Bool),
        Column::new("int_col", LogicalType::Int),
        Column::new("long_col", LogicalType::Long),
        Column::new("float_col", LogicalType::Float),
        Column::new("double_col", LogicalType::Double),
        Column::new("decimal_col", LogicalType::Decimal { precision: 12, scale: 4 }),
        Column::new("string_col", LogicalType::String),
        Column::new("binary_col", LogicalType::Binary),
        Column::new("date_col", LogicalType::Date),
        Column::new("timestamp_col", LogicalType::Timestamp),
        Column::new("timestamptz_col", LogicalType::TimestampTz),
    ])
}
