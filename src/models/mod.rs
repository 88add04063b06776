//! Data models for the catalog MCP server.

pub mod connection;
pub mod query;
pub mod schema;

pub use connection::DatabaseType;
pub use query::{DEFAULT_ROW_LIMIT, MAX_ROW_LIMIT, QueryParam, effective_row_limit};
pub use schema::{
    ColumnDescriptor, ColumnSample, ConstraintDescriptor, ConstraintKind, DeleteRule,
    ForeignKeyEdge, RelatedTableSuggestion, RelationshipKind, TableDescription, TableRelations,
    TableSummary,
};
