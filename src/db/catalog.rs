//! Dialect-neutral catalog rows.
//!
//! Driver rows are decoded into a `CatalogRow` once, at the connection
//! boundary. Everything above this point reads columns by name through the
//! lenient accessors here and never touches a driver row type.

use crate::error::{DbError, DbResult};
use serde_json::Value as JsonValue;

/// One decoded result row: column names in select order, each with a JSON value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CatalogRow {
    columns: Vec<(String, JsonValue)>,
}

impl CatalogRow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder used by tests and stub providers.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        self.push(name, value);
        self
    }

    pub fn push(&mut self, name: impl Into<String>, value: impl Into<JsonValue>) {
        self.columns.push((name.into(), value.into()));
    }

    /// Look up a column by name, ignoring ASCII case.
    pub fn get(&self, name: &str) -> Option<&JsonValue> {
        self.columns
            .iter()
            .find(|(col, _)| col.eq_ignore_ascii_case(name))
            .map(|(_, value)| value)
    }

    /// Value as text. Numbers and booleans are rendered; NULL and missing columns are None.
    pub fn string(&self, name: &str) -> Option<String> {
        match self.get(name)? {
            JsonValue::Null => None,
            JsonValue::String(s) => Some(s.clone()),
            JsonValue::Number(n) => Some(n.to_string()),
            JsonValue::Bool(b) => Some(b.to_string()),
            other => Some(other.to_string()),
        }
    }

    /// Value as text, with surrounding whitespace removed and empty strings dropped.
    pub fn trimmed(&self, name: &str) -> Option<String> {
        self.string(name)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    }

    /// Value as an integer. Numeric strings and integral floats are accepted.
    pub fn i64(&self, name: &str) -> Option<i64> {
        match self.get(name)? {
            JsonValue::Number(n) => n
                .as_i64()
                .or_else(|| n.as_u64().and_then(|v| i64::try_from(v).ok()))
                .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
            JsonValue::String(s) => {
                let s = s.trim();
                s.parse::<i64>().ok().or_else(|| {
                    s.parse::<f64>()
                        .ok()
                        .filter(|f| f.is_finite() && f.fract() == 0.0)
                        .map(|f| f as i64)
                })
            }
            JsonValue::Bool(b) => Some(i64::from(*b)),
            _ => None,
        }
    }

    /// Non-negative count; negative or missing values become None.
    pub fn count(&self, name: &str) -> Option<u64> {
        self.i64(name).and_then(|v| u64::try_from(v).ok())
    }

    /// Required text column, as an internal error when absent.
    pub fn require_string(&self, name: &str) -> DbResult<String> {
        self.string(name).ok_or_else(|| {
            DbError::internal(format!("Catalog row is missing required column {}", name))
        })
    }

    /// First column's value, for single-value queries.
    pub fn first_value(&self) -> Option<&JsonValue> {
        self.columns.first().map(|(_, value)| value)
    }

    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|(name, _)| name.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn into_json_map(self) -> serde_json::Map<String, JsonValue> {
        self.columns.into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row() -> CatalogRow {
        CatalogRow::new()
            .with("table_name", "orders")
            .with("NUM_ROWS", "1500")
            .with("COLUMN_ID", 3)
            .with("DATA_DEFAULT", "  'new'  ")
            .with("COMMENTS", JsonValue::Null)
            .with("RELTUPLES", json!(42.0))
    }

    #[test]
    fn test_get_is_case_insensitive() {
        let row = row();
        assert_eq!(row.string("TABLE_NAME").as_deref(), Some("orders"));
        assert_eq!(row.string("Table_Name").as_deref(), Some("orders"));
    }

    #[test]
    fn test_lenient_integers() {
        let row = row();
        assert_eq!(row.i64("NUM_ROWS"), Some(1500));
        assert_eq!(row.i64("COLUMN_ID"), Some(3));
        assert_eq!(row.i64("RELTUPLES"), Some(42));
        assert_eq!(row.i64("TABLE_NAME"), None);
        assert_eq!(row.string("COLUMN_ID").as_deref(), Some("3"));
    }

    #[test]
    fn test_null_and_missing() {
        let row = row();
        assert_eq!(row.string("COMMENTS"), None);
        assert_eq!(row.string("NOT_THERE"), None);
        assert!(row.require_string("NOT_THERE").is_err());
    }

    #[test]
    fn test_trimmed() {
        let row = row().with("BLANK", "   ");
        assert_eq!(row.trimmed("DATA_DEFAULT").as_deref(), Some("'new'"));
        assert_eq!(row.trimmed("BLANK"), None);
    }

    #[test]
    fn test_count_rejects_negative() {
        let row = CatalogRow::new().with("N", -1);
        assert_eq!(row.count("N"), None);
    }

    #[test]
    fn test_into_json_map_keeps_names() {
        let map = row().into_json_map();
        assert_eq!(map["table_name"], "orders");
        assert_eq!(map.len(), 6);
    }
}
