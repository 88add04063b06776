//! MCP service implementation using rmcp.
//!
//! `CatalogService` exposes the discovery tools and the read-only `query`
//! tool. Tool names are camelCase, matching their input fields.

use crate::db::SqlxProvider;
use crate::discovery::SchemaDiscovery;
use crate::models::{
    ColumnSample, RelatedTableSuggestion, TableDescription, TableRelations, TableSummary,
};
use crate::tools::query::{QueryInput, QueryOutput, QueryToolHandler};
use crate::tools::response::ToolResponse;
use crate::tools::schema::{
    DescribeTableInput, ListTablesInput, SampleValuesInput, SchemaToolHandler,
    SuggestRelatedInput, TableNameInput,
};
use rmcp::Json;
use rmcp::{
    ErrorData as McpError, ServerHandler,
    handler::server::tool::ToolRouter,
    handler::server::wrapper::Parameters,
    model::{Implementation, ProtocolVersion, ServerCapabilities, ServerInfo},
    tool, tool_handler, tool_router,
};
use std::sync::Arc;

#[derive(Clone)]
pub struct CatalogService {
    discovery: Arc<SchemaDiscovery<SqlxProvider>>,
    /// Emit audit records for successful discovery calls
    audit: bool,
    /// Reduce upstream error text to its category in responses
    redact_errors: bool,
    tool_router: ToolRouter<Self>,
}

impl CatalogService {
    pub fn new(discovery: Arc<SchemaDiscovery<SqlxProvider>>) -> Self {
        Self {
            discovery,
            audit: false,
            redact_errors: false,
            tool_router: Self::tool_router(),
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

    fn schema_handler(&self) -> SchemaToolHandler<SqlxProvider> {
        SchemaToolHandler::new(self.discovery.clone())
            .with_audit(self.audit)
            .with_redacted_errors(self.redact_errors)
    }

    fn query_handler(&self) -> QueryToolHandler<SqlxProvider> {
        QueryToolHandler::new(self.discovery.provider().clone())
            .with_redacted_errors(self.redact_errors)
    }
}

#[tool_router]
impl CatalogService {
    #[tool(
        name = "listTables",
        description = "List the tables of the connected schema.\nSet includeRowCounts to add approximate row counts and last-analyzed times from optimizer statistics.\nResults are cached; `cached: true` marks a cache hit."
    )]
    async fn list_tables(
        &self,
        Parameters(input): Parameters<ListTablesInput>,
    ) -> Result<Json<ToolResponse<Vec<TableSummary>>>, McpError> {
        self.schema_handler()
            .list_tables(input)
            .await
            .map(Json)
            .map_err(McpError::from)
    }

    #[tool(
        name = "describeTable",
        description = "Describe a table's columns in declared order, with types, nullability and defaults.\nConstraints (primary key, foreign keys with their referenced table, unique, check) are included unless includeConstraints is false.\nTable names are case-insensitive."
    )]
    async fn describe_table(
        &self,
        Parameters(input): Parameters<DescribeTableInput>,
    ) -> Result<Json<ToolResponse<TableDescription>>, McpError> {
        self.schema_handler()
            .describe_table(input)
            .await
            .map(Json)
            .map_err(McpError::from)
    }

    #[tool(
        name = "getTableRelations",
        description = "Foreign keys of a table in both directions.\nforeignKeys lists the tables this table references; referencedBy lists the tables that reference it, with their delete rules."
    )]
    async fn get_table_relations(
        &self,
        Parameters(input): Parameters<TableNameInput>,
    ) -> Result<Json<ToolResponse<TableRelations>>, McpError> {
        self.schema_handler()
            .table_relations(input)
            .await
            .map(Json)
            .map_err(McpError::from)
    }

    #[tool(
        name = "getSampleValues",
        description = "Sample a few non-null values per column, with approximate distinct and null counts taken from the first 1000 rows.\nsampleSize is 1 to 10 (default 3). A column that cannot be sampled is reported with an `error` field instead of failing the call."
    )]
    async fn get_sample_values(
        &self,
        Parameters(input): Parameters<SampleValuesInput>,
    ) -> Result<Json<ToolResponse<Vec<ColumnSample>>>, McpError> {
        self.schema_handler()
            .sample_values(input)
            .await
            .map(Json)
            .map_err(McpError::from)
    }

    #[tool(
        name = "suggestRelatedTables",
        description = "Suggest tables likely to join with the given table, ranked by confidence.\nSignals: declared foreign keys (1.0), naming patterns such as ORDERS/ORDER_ITEMS (0.7), and shared non-generic column names (0.5 to 0.9).\nmaxSuggestions is 1 to 20 (default 10)."
    )]
    async fn suggest_related_tables(
        &self,
        Parameters(input): Parameters<SuggestRelatedInput>,
    ) -> Result<Json<ToolResponse<Vec<RelatedTableSuggestion>>>, McpError> {
        self.schema_handler()
            .suggest_related_tables(input)
            .await
            .map(Json)
            .map_err(McpError::from)
    }

    #[tool(
        name = "query",
        description = "Run a read-only SQL statement (SELECT, SHOW, DESCRIBE, EXPLAIN) and return rows.\nSupports positional parameters. limit defaults to 100 (max 10000); `truncated` reports whether more rows were available."
    )]
    async fn query(
        &self,
        Parameters(input): Parameters<QueryInput>,
    ) -> Result<Json<ToolResponse<QueryOutput>>, McpError> {
        self.query_handler()
            .query(input)
            .await
            .map(Json)
            .map_err(McpError::from)
    }
}

#[tool_handler]
impl ServerHandler for CatalogService {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2025_03_26,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "catalog-mcp-server".to_owned(),
                title: Some("Catalog MCP Server".to_owned()),
                version: env!("CARGO_PKG_VERSION").to_owned(),
                icons: None,
                website_url: None,
            },
            instructions: Some(format!(
                "Schema discovery tools for a {} database.\n\
                \n\
                ## Workflow\n\
                1. Call `listTables` to see what exists\n\
                2. Call `describeTable` and `getTableRelations` on the tables that look relevant\n\
                3. Use `getSampleValues` to see what the data looks like\n\
                4. Use `suggestRelatedTables` to find join candidates before writing SQL\n\
                5. Run read-only SQL with `query`\n\
                \n\
                ## Notes\n\
                - Table and column names are case-insensitive and returned in uppercase\n\
                - Every tool answers `{{success, data, error}}`; check `success` before reading `data`\n\
                - Row counts and distinct counts are approximate",
                self.discovery.dialect()
            )),
        }
    }
}
