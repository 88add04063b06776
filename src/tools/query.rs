//! Read-only query tool.
//!
//! Every statement goes through [`sql_validator::validate_readonly`] before
//! it reaches the database. Refusals and execution failures come back in the
//! same envelope as the discovery tools.

use crate::db::provider::{CatalogConnection, ConnectionProvider};
use crate::error::{DbError, DbResult};
use crate::models::{QueryParam, effective_row_limit};
use crate::tools::response::{ToolResponse, truncate_for_log};
use crate::tools::schema::elapsed_ms;
use crate::tools::sql_validator;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::time::Instant;
use tracing::{debug, error, info};

/// Input for the query tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct QueryInput {
    /// Read-only SQL: SELECT, SHOW, DESCRIBE or EXPLAIN. Anything else is refused.
    pub sql: String,
    /// Positional parameters (use ? or $1,$2... placeholders in SQL)
    #[serde(default)]
    pub params: Vec<QueryParamInput>,
    /// Maximum rows to return. Default: 100, max: 10000
    #[serde(default)]
    pub limit: Option<u32>,
}

/// Input parameter that can be various JSON types.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum QueryParamInput {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
}

impl From<QueryParamInput> for QueryParam {
    fn from(input: QueryParamInput) -> Self {
        match input {
            QueryParamInput::Null => QueryParam::Null,
            QueryParamInput::Bool(v) => QueryParam::Bool(v),
            QueryParamInput::Int(v) => QueryParam::Int(v),
            QueryParamInput::Float(v) => QueryParam::Float(v),
            QueryParamInput::String(v) => QueryParam::String(v),
        }
    }
}

#[derive(Debug, Clone, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct QueryOutput {
    /// Column names in select order. Empty when no rows came back.
    pub columns: Vec<String>,
    pub rows: Vec<serde_json::Map<String, JsonValue>>,
    pub row_count: usize,
    /// True if more rows were available than the limit allowed
    pub truncated: bool,
    pub execution_time_ms: u64,
}

pub struct QueryToolHandler<P> {
    provider: P,
    redact_errors: bool,
}

impl<P: ConnectionProvider> QueryToolHandler<P> {
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            redact_errors: false,
        }
    }

    pub fn with_redacted_errors(mut self, redact: bool) -> Self {
        self.redact_errors = redact;
        self
    }

    pub async fn query(&self, input: QueryInput) -> DbResult<ToolResponse<QueryOutput>> {
        if input.sql.trim().is_empty() {
            return Err(DbError::invalid_input("sql must not be empty"));
        }

        let started = Instant::now();
        match self.run(input.sql.as_str(), input.params, input.limit).await {
            Ok(output) => {
                info!(
                    row_count = output.row_count,
                    truncated = output.truncated,
                    execution_time_ms = output.execution_time_ms,
                    "Query executed"
                );
                Ok(ToolResponse::ok(output))
            }
            Err(e) => {
                error!(
                    operation = "query",
                    input = %truncate_for_log(&input.sql, 64),
                    elapsed_ms = elapsed_ms(started),
                    error = %e,
                    "Query failed"
                );
                Ok(ToolResponse::failure(&e, self.redact_errors))
            }
        }
    }

    async fn run(
        &self,
        sql: &str,
        params: Vec<QueryParamInput>,
        limit: Option<u32>,
    ) -> DbResult<QueryOutput> {
        sql_validator::validate_readonly(sql, self.provider.dialect())?;

        let params: Vec<QueryParam> = params.into_iter().map(Into::into).collect();
        let limit = effective_row_limit(limit) as usize;
        debug!(
            params = ?params.iter().map(QueryParam::type_name).collect::<Vec<_>>(),
            limit,
            "Running query"
        );

        let started = Instant::now();
        let mut conn = self.provider.acquire().await?;
        // One extra row tells us whether the limit cut anything off
        let result = conn.fetch(sql, &params, limit + 1).await;
        conn.release().await;
        let mut rows = result?;
        let execution_time_ms = elapsed_ms(started);

        let truncated = rows.len() > limit;
        rows.truncate(limit);
        let columns = rows.first().map(|r| r.column_names()).unwrap_or_default();
        let rows: Vec<_> = rows.into_iter().map(|r| r.into_json_map()).collect();

        Ok(QueryOutput {
            columns,
            row_count: rows.len(),
            rows,
            truncated,
            execution_time_ms,
        })
    }
}
