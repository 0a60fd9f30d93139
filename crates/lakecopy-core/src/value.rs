//! Cell values carried between the source reader and the lakehouse writer.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::schema::LogicalType;

/// A single cell.
///
/// Each variant corresponds to one [`LogicalType`]; decimals are held as the
/// unscaled integer so that `12.50` in a `decimal(10,2)` column is `1250`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    Decimal(i128),
    String(String),
    Binary(Vec<u8>),
    Date(NaiveDate),
    Timestamp(NaiveDateTime),
    TimestampTz(DateTime<Utc>),
}

/// One table row, in schema column order.
pub type Row = Vec<Value>;

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Whether this value may be stored in a column of `ty`.
    pub fn fits(&self, ty: &LogicalType) -> bool {
        matches!(
            (self, ty),
            (Value::Null, _)
                | (Value::Bool(_), LogicalType::Bool)
                | (Value::Int(_), LogicalType::Int)
                | (Value::Long(_), LogicalType::Long)
                | (Value::Float(_), LogicalType::Float)
                | (Value::Double(_), LogicalType::Double)
                | (Value::Decimal(_), LogicalType::Decimal { .. })
                | (Value::String(_), LogicalType::String)
                | (Value::Binary(_), LogicalType::Binary)
                | (Value::Date(_), LogicalType::Date)
                | (Value::Timestamp(_), LogicalType::Timestamp)
                | (Value::TimestampTz(_), LogicalType::TimestampTz)
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValueError {
    #[error("Invalid decimal literal '{0}'")]
    InvalidDecimal(String),

    #[error("Decimal '{literal}' does not fit precision {precision}")]
    DecimalOverflow { literal: String, precision: u32 },
}

/// Parse a decimal literal into its unscaled representation at `scale`.
///
/// Extra fractional digits are rounded half away from zero. Special values
/// (`NaN`, `Infinity`) and exponent notation are rejected.
pub fn parse_decimal(literal: &str, precision: u32, scale: u32) -> Result<i128, ValueError> {
    let invalid = || ValueError::InvalidDecimal(literal.to_string());
    let overflow = || ValueError::DecimalOverflow {
        literal: literal.to_string(),
        precision,
    };

    let trimmed = literal.trim();
    let (negative, digits) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
    };

    let (int_part, frac_part) = match digits.split_once('.') {
        Some((i, f)) => (i, f),
        None => (digits, ""),
    };

    if int_part.is_empty() && frac_part.is_empty() {
        return Err(invalid());
    }
    if !int_part.chars().all(|c| c.is_ascii_digit()) || !frac_part.chars().all(|c| c.is_ascii_digit()) {
        return Err(invalid());
    }

    let scale = scale as usize;
    let mut unscaled: i128 = 0;
    let mut push_digit = |d: u8| -> Result<(), ValueError> {
        unscaled = unscaled
            .checked_mul(10)
            .and_then(|v| v.checked_add(i128::from(d)))
            .ok_or_else(overflow)?;
        Ok(())
    };

    for b in int_part.bytes() {
        push_digit(b - b'0')?;
    }

    let frac = frac_part.as_bytes();
    for i in 0..scale {
        push_digit(frac.get(i).map(|b| b - b'0').unwrap_or(0))?;
    }

    if frac.get(scale).is_some_and(|b| *b >= b'5') {
        unscaled = unscaled.checked_add(1).ok_or_else(overflow)?;
    }

    let limit = 10i128.checked_pow(precision).ok_or_else(overflow)?;
    if unscaled >= limit {
        return Err(overflow());
    }

    Ok(if negative { -unscaled } else { unscaled })
}
