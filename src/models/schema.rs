//! Schema discovery entities.
//!
//! Every type here is a plain value handed to the caller. Table and column
//! names are uppercase by the time they reach these structs.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize, Serializer};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TableSummary {
    pub table_name: String,
    /// Approximate, from optimizer statistics. 0 when not requested.
    pub row_count: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<String>,
    /// Tablespace or equivalent storage group
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage_group: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl TableSummary {
    pub fn new(table_name: impl Into<String>) -> Self {
        Self {
            table_name: table_name.into(),
            row_count: 0,
            last_modified: None,
            storage_group: None,
            comment: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ColumnDescriptor {
    pub column_name: String,
    pub data_type: String,
    pub nullable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_length: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_precision: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_scale: Option<i64>,
    /// Default expression, trimmed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

/// Kind of a table constraint.
///
/// Codes the mapping does not recognize are kept verbatim in `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ConstraintKind {
    PrimaryKey,
    ForeignKey,
    Unique,
    Check,
    Other(String),
}

impl ConstraintKind {
    /// Map a catalog constraint-type code.
    ///
    /// Accepts the single-letter codes (`P`, `R`/`F`, `U`, `C`) as well as the
    /// spelled-out names used by information_schema.
    pub fn from_code(code: &str) -> Self {
        let trimmed = code.trim();
        match trimmed.to_uppercase().replace('_', " ").as_str() {
            "P" | "PRIMARY KEY" => Self::PrimaryKey,
            "R" | "F" | "FOREIGN KEY" => Self::ForeignKey,
            "U" | "UNIQUE" => Self::Unique,
            "C" | "CHECK" => Self::Check,
            _ => Self::Other(trimmed.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::PrimaryKey => "PRIMARY_KEY",
            Self::ForeignKey => "FOREIGN_KEY",
            Self::Unique => "UNIQUE",
            Self::Check => "CHECK",
            Self::Other(code) => code,
        }
    }

    pub fn is_foreign_key(&self) -> bool {
        matches!(self, Self::ForeignKey)
    }
}

impl std::fmt::Display for ConstraintKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ConstraintKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ConstraintKind {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let code = String::deserialize(deserializer)?;
        Ok(Self::from_code(&code))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ConstraintDescriptor {
    pub constraint_name: String,
    /// PRIMARY_KEY, FOREIGN_KEY, UNIQUE, CHECK, or an unrecognized catalog code
    #[schemars(with = "String")]
    pub constraint_type: ConstraintKind,
    /// In key-position order
    pub columns: Vec<String>,
    /// FOREIGN_KEY only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub referenced_table: Option<String>,
    /// FOREIGN_KEY only, aligned with `columns`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub referenced_columns: Option<Vec<String>>,
    /// CHECK only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub check_condition: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TableDescription {
    pub table_name: String,
    /// In declared ordinal order
    pub columns: Vec<ColumnDescriptor>,
    /// Absent when constraints were not requested; empty when there are none
    #[serde(skip_serializing_if = "Option::is_none")]
    pub constraints: Option<Vec<ConstraintDescriptor>>,
}

/// Foreign key delete rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum DeleteRule {
    #[serde(rename = "CASCADE")]
    Cascade,
    #[serde(rename = "SET NULL")]
    SetNull,
    #[serde(rename = "SET DEFAULT")]
    SetDefault,
    #[serde(rename = "RESTRICT")]
    Restrict,
    #[serde(rename = "NO ACTION")]
    NoAction,
}

impl DeleteRule {
    /// Parse from a catalog string. Unknown rules are treated as unspecified.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().replace('_', " ").as_str() {
            "CASCADE" => Some(Self::Cascade),
            "SET NULL" => Some(Self::SetNull),
            "SET DEFAULT" => Some(Self::SetDefault),
            "RESTRICT" => Some(Self::Restrict),
            "NO ACTION" => Some(Self::NoAction),
            _ => None,
        }
    }
}

impl std::fmt::Display for DeleteRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cascade => write!(f, "CASCADE"),
            Self::SetNull => write!(f, "SET NULL"),
            Self::SetDefault => write!(f, "SET DEFAULT"),
            Self::Restrict => write!(f, "RESTRICT"),
            Self::NoAction => write!(f, "NO ACTION"),
        }
    }
}

/// One foreign key constraint, as a directed edge between two tables.
///
/// `source_columns[i]` references `target_columns[i]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ForeignKeyEdge {
    pub constraint_name: String,
    pub source_table: String,
    pub source_columns: Vec<String>,
    pub target_table: String,
    pub target_columns: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delete_rule: Option<DeleteRule>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TableRelations {
    pub table_name: String,
    /// Edges where this table is the source
    pub foreign_keys: Vec<ForeignKeyEdge>,
    /// Edges where this table is the target
    pub referenced_by: Vec<ForeignKeyEdge>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ColumnSample {
    pub column_name: String,
    /// Non-null example values, or a single `<error: ...>` placeholder
    pub sample_values: Vec<serde_json::Value>,
    /// Over a bounded row prefix
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distinct_count: Option<u64>,
    /// Over a bounded row prefix
    #[serde(skip_serializing_if = "Option::is_none")]
    pub null_count: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ColumnSample {
    /// Placeholder entry for a column whose sampling failed.
    pub fn failed(column_name: impl Into<String>, message: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            column_name: column_name.into(),
            sample_values: vec![serde_json::Value::String(format!("<error: {}>", message))],
            distinct_count: None,
            null_count: None,
            error: Some(message),
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum RelationshipKind {
    ForeignKey,
    NamingPattern,
    SharedColumns,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RelatedTableSuggestion {
    pub table_name: String,
    pub relationship_type: RelationshipKind,
    /// Ranking score in [0.0, 1.0]
    pub confidence: f64,
    pub reason: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constraint_kind_codes() {
        assert_eq!(ConstraintKind::from_code("P"), ConstraintKind::PrimaryKey);
        assert_eq!(ConstraintKind::from_code("r"), ConstraintKind::ForeignKey);
        assert_eq!(
            ConstraintKind::from_code("FOREIGN KEY"),
            ConstraintKind::ForeignKey
        );
        assert_eq!(
            ConstraintKind::from_code("primary_key"),
            ConstraintKind::PrimaryKey
        );
        assert_eq!(ConstraintKind::from_code("U"), ConstraintKind::Unique);
        assert_eq!(ConstraintKind::from_code("CHECK"), ConstraintKind::Check);
    }

    #[test]
    fn test_unknown_constraint_code_passes_through() {
        let kind = ConstraintKind::from_code("x");
        assert_eq!(kind, ConstraintKind::Other("x".to_string()));
        assert_eq!(serde_json::to_value(&kind).unwrap(), "x");
    }

    #[test]
    fn test_constraint_kind_serializes_upper_snake() {
        assert_eq!(
            serde_json::to_value(ConstraintKind::PrimaryKey).unwrap(),
            "PRIMARY_KEY"
        );
        assert_eq!(
            serde_json::to_value(ConstraintKind::ForeignKey).unwrap(),
            "FOREIGN_KEY"
        );
    }

    #[test]
    fn test_delete_rule_parse() {
        assert_eq!(DeleteRule::parse("CASCADE"), Some(DeleteRule::Cascade));
        assert_eq!(DeleteRule::parse("set null"), Some(DeleteRule::SetNull));
        assert_eq!(DeleteRule::parse("NO_ACTION"), Some(DeleteRule::NoAction));
        assert_eq!(DeleteRule::parse(""), None);
        assert_eq!(DeleteRule::parse("NONE"), None);
        assert_eq!(
            serde_json::to_value(DeleteRule::SetNull).unwrap(),
            "SET NULL"
        );
    }

    #[test]
    fn test_edge_serializes_camel_case() {
        let edge = ForeignKeyEdge {
            constraint_name: "FK_1".to_string(),
            source_table: "ORDER_ITEMS".to_string(),
            source_columns: vec!["ORDER_ID".to_string()],
            target_table: "ORDERS".to_string(),
            target_columns: vec!["ORDER_ID".to_string()],
            delete_rule: None,
        };
        let json = serde_json::to_value(&edge).unwrap();
        assert_eq!(json["sourceTable"], "ORDER_ITEMS");
        assert!(json.get("deleteRule").is_none());
    }

    #[test]
    fn test_failed_sample_sentinel() {
        let sample = ColumnSample::failed("EMAIL", "permission denied");
        assert!(sample.is_error());
        assert_eq!(sample.sample_values.len(), 1);
        assert_eq!(sample.sample_values[0], "<error: permission denied>");
    }

    #[test]
    fn test_relationship_kind_tags() {
        assert_eq!(
            serde_json::to_value(RelationshipKind::NamingPattern).unwrap(),
            "naming_pattern"
        );
    }
}
