//! Schema discovery tools.
//!
//! Implements `listTables`, `describeTable`, `getTableRelations`,
//! `getSampleValues` and `suggestRelatedTables`. Malformed input is returned
//! as an `Err` so the transport can answer with `invalid_params`; everything
//! that fails after validation is folded into a [`ToolResponse`] failure.

use crate::db::provider::ConnectionProvider;
use crate::discovery::{
    ROW_COUNT_NOTE, SchemaDiscovery, effective_max_suggestions, effective_sample_size,
    normalize_table_name,
};
use crate::error::{DbError, DbResult};
use crate::models::{
    ColumnSample, RelatedTableSuggestion, TableDescription, TableRelations, TableSummary,
};
use crate::tools::response::{ToolResponse, truncate_for_log};
use schemars::JsonSchema;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info};

/// Longest input echoed into a failure log.
const LOG_INPUT_CHARS: usize = 64;

/// Input for the listTables tool.
#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ListTablesInput {
    /// Include approximate row counts and last-analyzed times from optimizer statistics. Default: false
    #[serde(default)]
    pub include_row_counts: bool,
}

/// Input for the describeTable tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DescribeTableInput {
    /// Table name (case-insensitive)
    pub table_name: String,
    /// Include primary, foreign, unique and check constraints. Default: true
    #[serde(default = "default_true")]
    pub include_constraints: bool,
}

/// Input for tools that only need a table.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TableNameInput {
    /// Table name (case-insensitive)
    pub table_name: String,
}

/// Input for the getSampleValues tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SampleValuesInput {
    /// Table name (case-insensitive)
    pub table_name: String,
    /// Columns to sample. Default: every column of the table
    #[serde(default)]
    pub column_names: Option<Vec<String>>,
    /// Non-null values per column, 1 to 10. Default: 3
    #[serde(default)]
    #[schemars(range(min = 1))]
    pub sample_size: Option<i64>,
}

/// Input for the suggestRelatedTables tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SuggestRelatedInput {
    /// Table name (case-insensitive)
    pub table_name: String,
    /// Maximum suggestions, 1 to 20. Default: 10
    #[serde(default)]
    #[schemars(range(min = 1))]
    pub max_suggestions: Option<i64>,
}

fn default_true() -> bool {
    true
}

/// Reject a positive-integer option below 1; larger values are clamped later.
fn positive_option(value: Option<i64>, field: &str) -> DbResult<Option<u32>> {
    match value {
        None => Ok(None),
        Some(n) if n < 1 => Err(DbError::invalid_input(format!(
            "{} must be at least 1, got {}",
            field, n
        ))),
        Some(n) => Ok(Some(u32::try_from(n).unwrap_or(u32::MAX))),
    }
}

pub struct SchemaToolHandler<P> {
    discovery: Arc<SchemaDiscovery<P>>,
    audit: bool,
    redact_errors: bool,
}

impl<P: ConnectionProvider> SchemaToolHandler<P> {
    pub fn new(discovery: Arc<SchemaDiscovery<P>>) -> Self {
        Self {
            discovery,
            audit: false,
            redact_errors: false,
        }
    }

    pub fn with_audit(mut self, audit: bool) -> Self {
        self.audit = audit;
        self
    }

    pub fn with_redacted_errors(mut self, redact: bool) -> Self {
        self.redact_errors = redact;
        self
    }

    pub fn discovery(&self) -> &Arc<SchemaDiscovery<P>> {
        &self.discovery
    }

    pub async fn list_tables(
        &self,
        input: ListTablesInput,
    ) -> DbResult<ToolResponse<Vec<TableSummary>>> {
        let started = Instant::now();
        let response = match self.discovery.list_tables(input.include_row_counts).await {
            Ok(lookup) => {
                if self.audit {
                    info!(
                        target: "audit",
                        operation = "listTables",
                        include_row_counts = input.include_row_counts,
                        table_count = lookup.value.len(),
                        cached = lookup.cached,
                        elapsed_ms = elapsed_ms(started),
                        "Listed tables"
                    );
                }
                let response = ToolResponse::ok(lookup.value).with_cached(lookup.cached);
                if input.include_row_counts {
                    response.with_note(ROW_COUNT_NOTE)
                } else {
                    response
                }
            }
            Err(e) => self.failure("listTables", "", started, &e),
        };
        Ok(response)
    }

    pub async fn describe_table(
        &self,
        input: DescribeTableInput,
    ) -> DbResult<ToolResponse<TableDescription>> {
        let table = normalize_table_name(&input.table_name)?;
        let started = Instant::now();
        let response = match self
            .discovery
            .describe_table(&table, input.include_constraints)
            .await
        {
            Ok(lookup) => {
                if self.audit {
                    info!(
                        target: "audit",
                        operation = "describeTable",
                        table = %table,
                        column_count = lookup.value.columns.len(),
                        constraint_count = lookup.value.constraints.as_ref().map_or(0, Vec::len),
                        cached = lookup.cached,
                        elapsed_ms = elapsed_ms(started),
                        "Described table"
                    );
                }
                ToolResponse::ok(lookup.value).with_cached(lookup.cached)
            }
            Err(e) => self.failure("describeTable", &table, started, &e),
        };
        Ok(response)
    }

    pub async fn table_relations(
        &self,
        input: TableNameInput,
    ) -> DbResult<ToolResponse<TableRelations>> {
        let table = normalize_table_name(&input.table_name)?;
        let started = Instant::now();
        let response = match self.discovery.table_relations(&table).await {
            Ok(lookup) => {
                if self.audit {
                    info!(
                        target: "audit",
                        operation = "getTableRelations",
                        table = %table,
                        outgoing = lookup.value.foreign_keys.len(),
                        incoming = lookup.value.referenced_by.len(),
                        cached = lookup.cached,
                        elapsed_ms = elapsed_ms(started),
                        "Extracted relations"
                    );
                }
                ToolResponse::ok(lookup.value).with_cached(lookup.cached)
            }
            Err(e) => self.failure("getTableRelations", &table, started, &e),
        };
        Ok(response)
    }

    pub async fn sample_values(
        &self,
        input: SampleValuesInput,
    ) -> DbResult<ToolResponse<Vec<ColumnSample>>> {
        let table = normalize_table_name(&input.table_name)?;
        let sample_size =
            effective_sample_size(positive_option(input.sample_size, "sampleSize")?);
        let started = Instant::now();
        let response = match self
            .discovery
            .sample_values(&table, input.column_names.as_deref(), sample_size)
            .await
        {
            Ok(samples) => {
                if self.audit {
                    info!(
                        target: "audit",
                        operation = "getSampleValues",
                        table = %table,
                        column_count = samples.len(),
                        failed_columns = samples.iter().filter(|s| s.is_error()).count(),
                        sample_size = sample_size,
                        elapsed_ms = elapsed_ms(started),
                        "Sampled values"
                    );
                }
                ToolResponse::ok(samples)
            }
            Err(e) => self.failure("getSampleValues", &table, started, &e),
        };
        Ok(response)
    }

    pub async fn suggest_related_tables(
        &self,
        input: SuggestRelatedInput,
    ) -> DbResult<ToolResponse<Vec<RelatedTableSuggestion>>> {
        let table = normalize_table_name(&input.table_name)?;
        let max_suggestions =
            effective_max_suggestions(positive_option(input.max_suggestions, "maxSuggestions")?);
        let started = Instant::now();
        let response = match self
            .discovery
            .suggest_related_tables(&table, max_suggestions)
            .await
        {
            Ok(suggestions) => {
                if self.audit {
                    info!(
                        target: "audit",
                        operation = "suggestRelatedTables",
                        table = %table,
                        suggestion_count = suggestions.len(),
                        max_suggestions = max_suggestions,
                        elapsed_ms = elapsed_ms(started),
                        "Suggested related tables"
                    );
                }
                ToolResponse::ok(suggestions)
            }
            Err(e) => self.failure("suggestRelatedTables", &table, started, &e),
        };
        Ok(response)
    }

    fn failure<T>(
        &self,
        operation: &str,
        input: &str,
        started: Instant,
        err: &DbError,
    ) -> ToolResponse<T> {
        error!(
            operation = operation,
            input = %truncate_for_log(input, LOG_INPUT_CHARS),
            elapsed_ms = elapsed_ms(started),
            error = %err,
            "Discovery operation failed"
        );
        ToolResponse::failure(err, self.redact_errors)
    }
}

pub(crate) fn elapsed_ms(started: Instant) -> u64 {
    started.elapsed().as_millis() as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MetadataCache;
    use crate::db::schema::catalog_sql;
    use crate::discovery::testing::*;
    use crate::models::DatabaseType;
    use std::time::Duration;

    fn handler(provider: StubProvider) -> SchemaToolHandler<StubProvider> {
        let discovery = SchemaDiscovery::new(provider, MetadataCache::new(Duration::from_secs(300), 100));
        SchemaToolHandler::new(Arc::new(discovery)).with_audit(true)
    }

    fn orders_provider() -> StubProvider {
        let sql = catalog_sql(DatabaseType::PostgreSQL);
        StubProvider::new(DatabaseType::PostgreSQL)
            .on(sql.tables_with_stats, vec![table_row("customers"), table_row("orders")])
            .on(sql.tables, vec![table_row("customers"), table_row("orders")])
            .on_bind(
                sql.columns,
                "ORDERS",
                vec![
                    column_row("orders", "customer_id", "integer", 2),
                    column_row("orders", "order_id", "integer", 1),
                ],
            )
    }

    #[test]
    fn test_input_defaults() {
        let input: DescribeTableInput = serde_json::from_str(r#"{"tableName": "orders"}"#).unwrap();
        assert!(input.include_constraints);

        let input: ListTablesInput = serde_json::from_str("{}").unwrap();
        assert!(!input.include_row_counts);

        let input: SampleValuesInput =
            serde_json::from_str(r#"{"tableName": "customers", "sampleSize": 3}"#).unwrap();
        assert_eq!(input.sample_size, Some(3));
        assert!(input.column_names.is_none());
    }

    #[test]
    fn test_input_schema_states_lower_bounds() {
        let schema = serde_json::to_value(schemars::schema_for!(SampleValuesInput)).unwrap();
        let sample_size = schema["properties"]["sampleSize"].to_string();
        assert!(sample_size.contains(r#""minimum":1"#), "{sample_size}");

        let schema = serde_json::to_value(schemars::schema_for!(SuggestRelatedInput)).unwrap();
        let max_suggestions = schema["properties"]["maxSuggestions"].to_string();
        assert!(max_suggestions.contains(r#""minimum":1"#), "{max_suggestions}");
    }

    #[test]
    fn test_positive_option() {
        assert_eq!(positive_option(None, "sampleSize").unwrap(), None);
        assert_eq!(positive_option(Some(50), "sampleSize").unwrap(), Some(50));
        assert!(positive_option(Some(0), "sampleSize").is_err());
        assert!(positive_option(Some(-4), "maxSuggestions").is_err());
    }

    #[tokio::test]
    async fn test_list_tables_envelope() {
        let handler = handler(orders_provider());

        let first = handler.list_tables(ListTablesInput::default()).await.unwrap();
        assert!(first.success);
        assert_eq!(first.cached, Some(false));
        assert!(first.note.is_none());
        assert_eq!(first.data.as_ref().unwrap().len(), 2);

        let second = handler.list_tables(ListTablesInput::default()).await.unwrap();
        assert_eq!(second.cached, Some(true));
        assert_eq!(second.data, first.data);
    }

    #[tokio::test]
    async fn test_row_counts_carry_note() {
        let handler = handler(orders_provider());
        let response = handler
            .list_tables(ListTablesInput {
                include_row_counts: true,
            })
            .await
            .unwrap();
        assert_eq!(response.note.as_deref(), Some(ROW_COUNT_NOTE));
    }

    #[tokio::test]
    async fn test_empty_table_name_rejected() {
        let handler = handler(orders_provider());
        let err = handler
            .describe_table(DescribeTableInput {
                table_name: "  ".into(),
                include_constraints: true,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::InvalidInput { .. }));
    }

    #[tokio::test]
    async fn test_sample_size_zero_rejected_before_sampling() {
        let provider = orders_provider();
        let handler = handler(provider.clone());
        let err = handler
            .sample_values(SampleValuesInput {
                table_name: "orders".into(),
                column_names: None,
                sample_size: Some(0),
            })
            .await
            .unwrap_err();
        assert!(err.to_string().contains("sampleSize"));
        assert_eq!(provider.executed_count(), 0);
    }

    #[tokio::test]
    async fn test_max_suggestions_negative_rejected() {
        let handler = handler(orders_provider());
        let result = handler
            .suggest_related_tables(SuggestRelatedInput {
                table_name: "orders".into(),
                max_suggestions: Some(-1),
            })
            .await;
        assert!(matches!(result, Err(DbError::InvalidInput { .. })));
    }

    #[tokio::test]
    async fn test_describe_lowercase_input() {
        let handler = handler(orders_provider());
        let response = handler
            .describe_table(DescribeTableInput {
                table_name: "orders".into(),
                include_constraints: false,
            })
            .await
            .unwrap();
        let description = response.data.unwrap();
        assert_eq!(description.table_name, "ORDERS");
        let names: Vec<_> = description.columns.iter().map(|c| c.column_name.as_str()).collect();
        assert_eq!(names, vec!["ORDER_ID", "CUSTOMER_ID"]);
    }

    #[tokio::test]
    async fn test_not_found_is_failure_envelope() {
        let handler = handler(orders_provider());
        let response = handler
            .describe_table(DescribeTableInput {
                table_name: "NONEXISTENT".into(),
                include_constraints: true,
            })
            .await
            .unwrap();
        assert!(!response.success);
        assert!(response.data.is_none());
        assert!(response.error.unwrap().contains("NONEXISTENT"));
    }

    #[tokio::test]
    async fn test_upstream_failure_is_redacted() {
        let sql = catalog_sql(DatabaseType::PostgreSQL);
        let provider = StubProvider::new(DatabaseType::PostgreSQL)
            .fail(sql.outgoing_edges, "permission denied for schema secret_stuff");
        let discovery =
            SchemaDiscovery::new(provider, MetadataCache::new(Duration::from_secs(60), 10));
        let handler = SchemaToolHandler::new(Arc::new(discovery)).with_redacted_errors(true);

        let response = handler
            .table_relations(TableNameInput {
                table_name: "orders".into(),
            })
            .await
            .unwrap();
        assert!(!response.success);
        assert!(response.cached.is_none());
        let message = response.error.unwrap();
        assert!(!message.contains("secret_stuff"));
    }
}
