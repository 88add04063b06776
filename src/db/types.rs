//! Driver row decoding.
//!
//! Type conversion uses a two-phase approach:
//! 1. `TypeCategory` classifies the column type into a logical category
//! 2. A dialect-specific decoder extracts the value for that category
//!
//! A value that does not decode under its category falls back to a probe
//! chain (text, integer, float, bytes) before giving up as NULL. Catalog
//! queries lean on this for expression columns whose declared type is
//! unknown to the driver.

use crate::db::catalog::CatalogRow;
use crate::models::DatabaseType;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde_json::Value as JsonValue;
use sqlx::mysql::{MySqlRow, MySqlTypeInfo, MySqlValueRef};
use sqlx::postgres::{PgRow, PgTypeInfo, PgValueFormat, PgValueRef};
use sqlx::sqlite::SqliteRow;
use sqlx::{Column, ColumnIndex, Decode, Row, Type, TypeInfo, ValueRef};

/// Logical category for database column types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeCategory {
    Integer,
    Float,
    Decimal,
    Boolean,
    Text,
    Binary,
    Json,
    Temporal,
    Unknown,
}

/// Classify a database type name into a logical category.
pub fn categorize_type(type_name: &str, db: DatabaseType) -> TypeCategory {
    let lower = type_name.to_lowercase();

    if lower == "interval" || lower == "point" {
        return TypeCategory::Unknown;
    }

    // Checked before floats: "numeric" would otherwise be ambiguous
    if lower.contains("decimal") || lower.contains("numeric") {
        if db == DatabaseType::SQLite {
            return TypeCategory::Float;
        }
        return TypeCategory::Decimal;
    }

    if lower.contains("int") || lower.contains("serial") || lower == "oid" {
        return TypeCategory::Integer;
    }

    if lower == "bool" || lower == "boolean" {
        return TypeCategory::Boolean;
    }

    if lower.contains("float") || lower.contains("double") || lower == "real" {
        return TypeCategory::Float;
    }

    if lower == "json" || lower == "jsonb" {
        return TypeCategory::Json;
    }

    if lower.contains("blob") || lower.contains("binary") || lower == "bytea" {
        return TypeCategory::Binary;
    }

    if lower.contains("timestamp")
        || lower.contains("datetime")
        || lower == "date"
        || lower == "time"
        || lower == "timetz"
    {
        return TypeCategory::Temporal;
    }

    if lower.contains("char") || lower.contains("text") || lower == "name" || lower == "uuid" {
        return TypeCategory::Text;
    }

    TypeCategory::Unknown
}

/// Binary data as JSON: UTF-8 text when valid, base64 otherwise.
///
/// MySQL reports several information_schema columns as binary strings, so
/// the text attempt matters for catalog reads as well as user data.
pub fn decode_binary_value(bytes: &[u8]) -> JsonValue {
    use base64::{Engine as _, engine::general_purpose::STANDARD};

    match std::str::from_utf8(bytes) {
        Ok(s) => JsonValue::String(s.to_string()),
        Err(_) => JsonValue::String(STANDARD.encode(bytes)),
    }
}

fn float_value(v: f64) -> JsonValue {
    serde_json::Number::from_f64(v)
        .map(JsonValue::Number)
        .unwrap_or_else(|| JsonValue::String(v.to_string()))
}

// =============================================================================
// Decimal Type Support
// =============================================================================

/// DECIMAL/NUMERIC rendered as its exact decimal string.
#[derive(Debug)]
pub struct RawDecimal(pub String);

impl Type<sqlx::MySql> for RawDecimal {
    fn type_info() -> MySqlTypeInfo {
        <String as Type<sqlx::MySql>>::type_info()
    }

    fn compatible(ty: &MySqlTypeInfo) -> bool {
        let name = ty.name().to_lowercase();
        name.contains("decimal") || name.contains("numeric")
    }
}

impl<'r> Decode<'r, sqlx::MySql> for RawDecimal {
    fn decode(value: MySqlValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s = <&str as Decode<sqlx::MySql>>::decode(value)?;
        Ok(RawDecimal(s.to_string()))
    }
}

impl Type<sqlx::Postgres> for RawDecimal {
    fn type_info() -> PgTypeInfo {
        PgTypeInfo::with_name("NUMERIC")
    }

    fn compatible(ty: &PgTypeInfo) -> bool {
        ty.name().eq_ignore_ascii_case("numeric")
    }
}

impl<'r> Decode<'r, sqlx::Postgres> for RawDecimal {
    fn decode(value: PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        match value.format() {
            PgValueFormat::Text => {
                let s = <&str as Decode<sqlx::Postgres>>::decode(value)?;
                Ok(RawDecimal(s.to_string()))
            }
            PgValueFormat::Binary => {
                let bytes = <&[u8] as Decode<sqlx::Postgres>>::decode(value)?;
                Ok(RawDecimal(pg_numeric_to_string(bytes)?))
            }
        }
    }
}

/// Render PostgreSQL's binary NUMERIC wire format as a decimal string.
///
/// Layout: ndigits, weight, sign, dscale (all 16-bit big endian), then
/// `ndigits` base-10000 digits. Digit `i` is scaled by 10000^(weight - i).
fn pg_numeric_to_string(bytes: &[u8]) -> Result<String, sqlx::error::BoxDynError> {
    fn read_u16(bytes: &[u8], at: usize) -> Result<u16, sqlx::error::BoxDynError> {
        bytes
            .get(at..at + 2)
            .map(|b| u16::from_be_bytes([b[0], b[1]]))
            .ok_or_else(|| "truncated NUMERIC value".into())
    }

    let ndigits = read_u16(bytes, 0)? as usize;
    let weight = read_u16(bytes, 2)? as i16 as i32;
    let sign = read_u16(bytes, 4)?;
    let dscale = read_u16(bytes, 6)? as usize;

    match sign {
        0xC000 => return Ok("NaN".to_string()),
        0xD000 => return Ok("Infinity".to_string()),
        0xF000 => return Ok("-Infinity".to_string()),
        _ => {}
    }

    let digits = (0..ndigits)
        .map(|i| read_u16(bytes, 8 + i * 2))
        .collect::<Result<Vec<u16>, _>>()?;
    let digit_at = |i: i32| -> u16 {
        if i >= 0 {
            digits.get(i as usize).copied().unwrap_or(0)
        } else {
            0
        }
    };

    let mut out = String::new();
    if sign == 0x4000 {
        out.push('-');
    }

    if weight < 0 {
        out.push('0');
    } else {
        out.push_str(&digit_at(0).to_string());
        for i in 1..=weight {
            out.push_str(&format!("{:04}", digit_at(i)));
        }
    }

    if dscale > 0 {
        let mut fraction = String::new();
        let mut i = weight + 1;
        while fraction.len() < dscale {
            fraction.push_str(&format!("{:04}", digit_at(i)));
            i += 1;
        }
        fraction.truncate(dscale);
        out.push('.');
        out.push_str(&fraction);
    }

    Ok(out)
}

// =============================================================================
// Row conversion
// =============================================================================

/// Decode a driver row into a `CatalogRow`.
pub trait ToCatalogRow {
    fn to_catalog_row(&self) -> CatalogRow;
}

impl ToCatalogRow for MySqlRow {
    fn to_catalog_row(&self) -> CatalogRow {
        convert(self, mysql::decode_column)
    }
}

impl ToCatalogRow for PgRow {
    fn to_catalog_row(&self) -> CatalogRow {
        convert(self, postgres::decode_column)
    }
}

impl ToCatalogRow for SqliteRow {
    fn to_catalog_row(&self) -> CatalogRow {
        convert(self, sqlite::decode_column)
    }
}

fn convert<R: Row>(row: &R, decode: fn(&R, usize, &str) -> JsonValue) -> CatalogRow {
    let mut out = CatalogRow::new();
    for (idx, col) in row.columns().iter().enumerate() {
        let type_name = col.type_info().name().to_string();
        out.push(col.name(), decode(row, idx, &type_name));
    }
    out
}

/// Last-resort decode for values whose category did not match.
fn probe<'r, R>(row: &'r R, idx: usize) -> JsonValue
where
    R: Row,
    usize: ColumnIndex<R>,
    String: Decode<'r, R::Database> + Type<R::Database>,
    i64: Decode<'r, R::Database> + Type<R::Database>,
    f64: Decode<'r, R::Database> + Type<R::Database>,
    Vec<u8>: Decode<'r, R::Database> + Type<R::Database>,
{
    if let Ok(v) = row.try_get::<Option<String>, _>(idx) {
        return v.map(JsonValue::String).unwrap_or(JsonValue::Null);
    }
    if let Ok(v) = row.try_get::<Option<i64>, _>(idx) {
        return v.map(|n| JsonValue::Number(n.into())).unwrap_or(JsonValue::Null);
    }
    if let Ok(v) = row.try_get::<Option<f64>, _>(idx) {
        return v.map(float_value).unwrap_or(JsonValue::Null);
    }
    if let Ok(v) = row.try_get::<Option<Vec<u8>>, _>(idx) {
        return v
            .map(|b| decode_binary_value(&b))
            .unwrap_or(JsonValue::Null);
    }
    tracing::debug!(column = idx, "Column value could not be decoded; returning null");
    JsonValue::Null
}

/// Temporal values as text. Timezone-aware values use RFC 3339.
fn temporal<'r, R>(row: &'r R, idx: usize) -> Option<JsonValue>
where
    R: Row,
    usize: ColumnIndex<R>,
    NaiveDateTime: Decode<'r, R::Database> + Type<R::Database>,
    DateTime<Utc>: Decode<'r, R::Database> + Type<R::Database>,
    NaiveDate: Decode<'r, R::Database> + Type<R::Database>,
    NaiveTime: Decode<'r, R::Database> + Type<R::Database>,
{
    if let Ok(v) = row.try_get::<Option<NaiveDateTime>, _>(idx) {
        return Some(v.map(|t| JsonValue::String(t.to_string())).unwrap_or(JsonValue::Null));
    }
    if let Ok(v) = row.try_get::<Option<DateTime<Utc>>, _>(idx) {
        return Some(
            v.map(|t| JsonValue::String(t.to_rfc3339()))
                .unwrap_or(JsonValue::Null),
        );
    }
    if let Ok(v) = row.try_get::<Option<NaiveDate>, _>(idx) {
        return Some(v.map(|t| JsonValue::String(t.to_string())).unwrap_or(JsonValue::Null));
    }
    if let Ok(v) = row.try_get::<Option<NaiveTime>, _>(idx) {
        return Some(v.map(|t| JsonValue::String(t.to_string())).unwrap_or(JsonValue::Null));
    }
    None
}

mod mysql {
    use super::*;

    pub fn decode_column(row: &MySqlRow, idx: usize, type_name: &str) -> JsonValue {
        let decoded = match categorize_type(type_name, DatabaseType::MySQL) {
            TypeCategory::Decimal => row
                .try_get::<Option<RawDecimal>, _>(idx)
                .ok()
                .map(|v| v.map(|d| JsonValue::String(d.0)).unwrap_or(JsonValue::Null)),
            TypeCategory::Integer => decode_integer(row, idx),
            TypeCategory::Boolean => row
                .try_get::<Option<bool>, _>(idx)
                .ok()
                .map(|v| v.map(JsonValue::Bool).unwrap_or(JsonValue::Null)),
            TypeCategory::Float => row
                .try_get::<Option<f64>, _>(idx)
                .ok()
                .map(|v| v.map(float_value).unwrap_or(JsonValue::Null)),
            TypeCategory::Binary => row
                .try_get::<Option<Vec<u8>>, _>(idx)
                .ok()
                .map(|v| v.map(|b| decode_binary_value(&b)).unwrap_or(JsonValue::Null)),
            TypeCategory::Json => row.try_get::<Option<JsonValue>, _>(idx).ok().flatten(),
            TypeCategory::Temporal => temporal(row, idx),
            TypeCategory::Text | TypeCategory::Unknown => None,
        };
        decoded.unwrap_or_else(|| probe(row, idx))
    }

    fn decode_integer(row: &MySqlRow, idx: usize) -> Option<JsonValue> {
        if let Ok(v) = row.try_get::<Option<i64>, _>(idx) {
            return Some(v.map(|n| JsonValue::Number(n.into())).unwrap_or(JsonValue::Null));
        }
        // BIGINT UNSIGNED does not fit i64
        if let Ok(v) = row.try_get::<Option<u64>, _>(idx) {
            return Some(v.map(|n| JsonValue::Number(n.into())).unwrap_or(JsonValue::Null));
        }
        None
    }
}

mod postgres {
    use super::*;

    pub fn decode_column(row: &PgRow, idx: usize, type_name: &str) -> JsonValue {
        let decoded = match categorize_type(type_name, DatabaseType::PostgreSQL) {
            TypeCategory::Decimal => row
                .try_get::<Option<RawDecimal>, _>(idx)
                .ok()
                .map(|v| v.map(|d| JsonValue::String(d.0)).unwrap_or(JsonValue::Null)),
            TypeCategory::Integer => decode_integer(row, idx),
            TypeCategory::Boolean => row
                .try_get::<Option<bool>, _>(idx)
                .ok()
                .map(|v| v.map(JsonValue::Bool).unwrap_or(JsonValue::Null)),
            TypeCategory::Float => decode_float(row, idx),
            TypeCategory::Binary => row
                .try_get::<Option<Vec<u8>>, _>(idx)
                .ok()
                .map(|v| v.map(|b| decode_binary_value(&b)).unwrap_or(JsonValue::Null)),
            TypeCategory::Json => row.try_get::<Option<JsonValue>, _>(idx).ok().flatten(),
            TypeCategory::Temporal => temporal(row, idx),
            TypeCategory::Text | TypeCategory::Unknown => None,
        };
        decoded.unwrap_or_else(|| probe(row, idx))
    }

    fn decode_integer(row: &PgRow, idx: usize) -> Option<JsonValue> {
        if let Ok(v) = row.try_get::<Option<i64>, _>(idx) {
            return Some(v.map(|n| JsonValue::Number(n.into())).unwrap_or(JsonValue::Null));
        }
        if let Ok(v) = row.try_get::<Option<i32>, _>(idx) {
            return Some(v.map(|n| JsonValue::Number(n.into())).unwrap_or(JsonValue::Null));
        }
        if let Ok(v) = row.try_get::<Option<i16>, _>(idx) {
            return Some(v.map(|n| JsonValue::Number(n.into())).unwrap_or(JsonValue::Null));
        }
        if let Ok(v) = row.try_get::<Option<sqlx::postgres::types::Oid>, _>(idx) {
            return Some(
                v.map(|oid| JsonValue::Number(oid.0.into()))
                    .unwrap_or(JsonValue::Null),
            );
        }
        None
    }

    fn decode_float(row: &PgRow, idx: usize) -> Option<JsonValue> {
        if let Ok(v) = row.try_get::<Option<f64>, _>(idx) {
            return Some(v.map(float_value).unwrap_or(JsonValue::Null));
        }
        if let Ok(v) = row.try_get::<Option<f32>, _>(idx) {
            return Some(
                v.map(|f| float_value(f as f64))
                    .unwrap_or(JsonValue::Null),
            );
        }
        None
    }
}

mod sqlite {
    use super::*;

    /// SQLite values carry their own storage class, so the runtime type of
    /// the value decides the decoder rather than the declared column type.
    pub fn decode_column(row: &SqliteRow, idx: usize, declared: &str) -> JsonValue {
        let runtime = match row.try_get_raw(idx) {
            Ok(value) if value.is_null() => return JsonValue::Null,
            Ok(value) => value.type_info().name().to_string(),
            Err(_) => declared.to_string(),
        };

        let decoded = match categorize_type(&runtime, DatabaseType::SQLite) {
            TypeCategory::Integer => row
                .try_get::<Option<i64>, _>(idx)
                .ok()
                .map(|v| v.map(|n| JsonValue::Number(n.into())).unwrap_or(JsonValue::Null)),
            TypeCategory::Float | TypeCategory::Decimal => row
                .try_get::<Option<f64>, _>(idx)
                .ok()
                .map(|v| v.map(float_value).unwrap_or(JsonValue::Null)),
            TypeCategory::Binary => row
                .try_get::<Option<Vec<u8>>, _>(idx)
                .ok()
                .map(|v| v.map(|b| decode_binary_value(&b)).unwrap_or(JsonValue::Null)),
            _ => None,
        };
        decoded.unwrap_or_else(|| probe(row, idx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_categorize_type_integer() {
        assert_eq!(
            categorize_type("INT", DatabaseType::MySQL),
            TypeCategory::Integer
        );
        assert_eq!(
            categorize_type("INT8", DatabaseType::PostgreSQL),
            TypeCategory::Integer
        );
        assert_eq!(
            categorize_type("BIGINT UNSIGNED", DatabaseType::MySQL),
            TypeCategory::Integer
        );
        assert_eq!(
            categorize_type("INTERVAL", DatabaseType::PostgreSQL),
            TypeCategory::Unknown
        );
    }

    #[test]
    fn test_categorize_type_decimal() {
        assert_eq!(
            categorize_type("DECIMAL", DatabaseType::MySQL),
            TypeCategory::Decimal
        );
        assert_eq!(
            categorize_type("NUMERIC", DatabaseType::PostgreSQL),
            TypeCategory::Decimal
        );
        assert_eq!(
            categorize_type("numeric", DatabaseType::SQLite),
            TypeCategory::Float
        );
    }

    #[test]
    fn test_categorize_type_temporal_and_text() {
        assert_eq!(
            categorize_type("TIMESTAMPTZ", DatabaseType::PostgreSQL),
            TypeCategory::Temporal
        );
        assert_eq!(
            categorize_type("DATETIME", DatabaseType::MySQL),
            TypeCategory::Temporal
        );
        assert_eq!(
            categorize_type("VARCHAR", DatabaseType::MySQL),
            TypeCategory::Text
        );
        assert_eq!(
            categorize_type("NAME", DatabaseType::PostgreSQL),
            TypeCategory::Text
        );
    }

    #[test]
    fn test_decode_binary_value() {
        assert_eq!(
            decode_binary_value(b"ORDERS"),
            JsonValue::String("ORDERS".to_string())
        );
        assert_eq!(
            decode_binary_value(&[0xFF, 0xFE, 0x00, 0x01]),
            JsonValue::String("//4AAQ==".to_string())
        );
        assert_eq!(decode_binary_value(&[]), JsonValue::String(String::new()));
    }

    fn numeric(ndigits: u16, weight: i16, sign: u16, dscale: u16, digits: &[u16]) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&ndigits.to_be_bytes());
        out.extend_from_slice(&weight.to_be_bytes());
        out.extend_from_slice(&sign.to_be_bytes());
        out.extend_from_slice(&dscale.to_be_bytes());
        for d in digits {
            out.extend_from_slice(&d.to_be_bytes());
        }
        out
    }

    #[test]
    fn test_pg_numeric_binary() {
        // 12345.67 = [1, 2345, 6700] with weight 1
        let bytes = numeric(3, 1, 0, 2, &[1, 2345, 6700]);
        assert_eq!(pg_numeric_to_string(&bytes).unwrap(), "12345.67");

        // -0.005 = [50] with weight -1, dscale 3
        let bytes = numeric(1, -1, 0x4000, 3, &[50]);
        assert_eq!(pg_numeric_to_string(&bytes).unwrap(), "-0.005");

        // 10000 = [1] with weight 1
        let bytes = numeric(1, 1, 0, 0, &[1]);
        assert_eq!(pg_numeric_to_string(&bytes).unwrap(), "10000");

        let bytes = numeric(0, 0, 0, 0, &[]);
        assert_eq!(pg_numeric_to_string(&bytes).unwrap(), "0");

        let bytes = numeric(0, 0, 0xC000, 0, &[]);
        assert_eq!(pg_numeric_to_string(&bytes).unwrap(), "NaN");
    }

    #[test]
    fn test_pg_numeric_truncated_is_error() {
        assert!(pg_numeric_to_string(&[0, 1]).is_err());
        let bytes = numeric(2, 0, 0, 0, &[7]);
        assert!(pg_numeric_to_string(&bytes).is_err());
    }

    #[tokio::test]
    async fn test_sqlite_row_decoding() {
        let pool = sqlx::SqlitePool::connect("sqlite::memory:").await.unwrap();
        let row = sqlx::query(
            "SELECT 'orders' AS TABLE_NAME, 3 AS COLUMN_ID, 1.5 AS RATIO, NULL AS COMMENTS, X'FF00' AS RAW",
        )
        .fetch_one(&pool)
        .await
        .unwrap();

        let row = row.to_catalog_row();
        assert_eq!(row.string("TABLE_NAME").as_deref(), Some("orders"));
        assert_eq!(row.i64("COLUMN_ID"), Some(3));
        assert_eq!(row.get("RATIO"), Some(&serde_json::json!(1.5)));
        assert_eq!(row.get("COMMENTS"), Some(&JsonValue::Null));
        assert_eq!(row.string("RAW").as_deref(), Some("/wA="));
    }
}
