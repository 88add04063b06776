//! MCP tool implementations.
//!
//! - `schema`: the five discovery tools
//! - `query`: read-only SQL
//! - `response`: the result envelope shared by all of them
//! - `sql_validator`: read-only enforcement for `query`

pub mod query;
pub mod response;
pub mod schema;
pub mod sql_validator;

pub use query::{QueryInput, QueryOutput, QueryParamInput, QueryToolHandler};
pub use response::ToolResponse;
pub use schema::{
    DescribeTableInput, ListTablesInput, SampleValuesInput, SchemaToolHandler,
    SuggestRelatedInput, TableNameInput,
};
