//! Query parameters and row limits.

use serde::{Deserialize, Serialize};

/// Default row limit for the query tool.
pub const DEFAULT_ROW_LIMIT: u32 = 100;

/// Maximum allowed row limit for the query tool.
pub const MAX_ROW_LIMIT: u32 = 10000;

/// A bind value for parameterized SQL.
///
/// Catalog lookups bind table names as strings; the query tool accepts any
/// of these from the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum QueryParam {
    Null,
    Bool(bool),
    /// Stored as i64 for maximum range
    Int(i64),
    Float(f64),
    String(String),
}

impl QueryParam {
    pub fn text(value: impl Into<String>) -> Self {
        Self::String(value.into())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Get the type name of this parameter for debugging.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::String(_) => "string",
        }
    }
}

/// Clamp a caller-supplied row limit to the allowed range.
pub fn effective_row_limit(limit: Option<u32>) -> u32 {
    limit
        .map(|l| l.clamp(1, MAX_ROW_LIMIT))
        .unwrap_or(DEFAULT_ROW_LIMIT)
}
