//! Read-only enforcement for the `query` tool.
//!
//! Statements are parsed with [sqlparser](https://docs.rs/sqlparser/) under
//! the connected database's dialect and checked against an allow-list:
//! queries, SHOW/DESCRIBE variants and EXPLAIN of a query. Anything else,
//! including statements the parser cannot classify, is refused.

use crate::error::{DbError, DbResult};
use crate::models::DatabaseType;
use sqlparser::ast::{Query, SetExpr, Statement, TableFactor, TableWithJoins};
use sqlparser::dialect::{Dialect, MySqlDialect, PostgreSqlDialect, SQLiteDialect};
use sqlparser::parser::Parser;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementClass {
    ReadOnly,
    Write,
    Ddl,
    Transaction,
    Procedure,
    Administrative,
    Unknown,
}

impl StatementClass {
    fn refusal(self) -> &'static str {
        match self {
            Self::ReadOnly => "",
            Self::Write => "This server is read-only; data modification is not available.",
            Self::Ddl => "This server is read-only; schema changes are not available.",
            Self::Transaction => "Transaction control is not available; each query runs on its own.",
            Self::Procedure => "Procedure calls are refused because their effects cannot be checked.",
            Self::Administrative => "Administrative statements are not available.",
            Self::Unknown => "Only SELECT, SHOW, DESCRIBE and EXPLAIN statements are allowed.",
        }
    }
}

fn dialect_for(db_type: DatabaseType) -> Box<dyn Dialect> {
    match db_type {
        DatabaseType::PostgreSQL => Box::new(PostgreSqlDialect {}),
        DatabaseType::MySQL => Box::new(MySqlDialect {}),
        DatabaseType::SQLite => Box::new(SQLiteDialect {}),
    }
}

/// Check that every statement in `sql` is read-only.
///
/// ```
/// use catalog_mcp_server::models::DatabaseType;
/// use catalog_mcp_server::tools::sql_validator::validate_readonly;
///
/// assert!(validate_readonly("SELECT * FROM orders", DatabaseType::PostgreSQL).is_ok());
/// assert!(validate_readonly("DELETE FROM orders", DatabaseType::PostgreSQL).is_err());
/// ```
pub fn validate_readonly(sql: &str, db_type: DatabaseType) -> DbResult<()> {
    let dialect = dialect_for(db_type);
    let statements = Parser::parse_sql(dialect.as_ref(), sql)
        .map_err(|e| DbError::invalid_input(format!("Failed to parse SQL statement: {}", e)))?;

    if statements.is_empty() {
        return Err(DbError::invalid_input("Empty SQL statement"));
    }

    for statement in &statements {
        let (class, operation) = classify(statement);
        if class != StatementClass::ReadOnly {
            return Err(DbError::permission(operation, class.refusal()));
        }
    }
    Ok(())
}

fn classify(statement: &Statement) -> (StatementClass, &'static str) {
    use StatementClass::*;

    match statement {
        Statement::Query(query) => match query_write(query) {
            Some(found) => found,
            None => (ReadOnly, "SELECT"),
        },
        Statement::ShowTables { .. } => (ReadOnly, "SHOW TABLES"),
        Statement::ShowColumns { .. } => (ReadOnly, "SHOW COLUMNS"),
        Statement::ShowDatabases { .. } => (ReadOnly, "SHOW DATABASES"),
        Statement::ShowSchemas { .. } => (ReadOnly, "SHOW SCHEMAS"),
        Statement::ShowCreate { .. } => (ReadOnly, "SHOW CREATE"),
        Statement::ShowVariable { .. } => (ReadOnly, "SHOW"),
        Statement::ShowVariables { .. } => (ReadOnly, "SHOW VARIABLES"),
        Statement::ShowStatus { .. } => (ReadOnly, "SHOW STATUS"),
        Statement::ExplainTable { .. } => (ReadOnly, "DESCRIBE"),

        // EXPLAIN ANALYZE executes its statement, so the inner one decides
        Statement::Explain { statement, .. } => match classify(statement) {
            (ReadOnly, _) => (ReadOnly, "EXPLAIN"),
            other => other,
        },

        Statement::Insert(_) => (Write, "INSERT"),
        Statement::Update { .. } => (Write, "UPDATE"),
        Statement::Delete(_) => (Write, "DELETE"),
        Statement::Merge { .. } => (Write, "MERGE"),
        Statement::Copy { .. } => (Write, "COPY"),

        Statement::CreateTable { .. } => (Ddl, "CREATE TABLE"),
        Statement::CreateView { .. } => (Ddl, "CREATE VIEW"),
        Statement::CreateIndex(_) => (Ddl, "CREATE INDEX"),
        Statement::CreateSchema { .. } => (Ddl, "CREATE SCHEMA"),
        Statement::CreateDatabase { .. } => (Ddl, "CREATE DATABASE"),
        Statement::CreateFunction { .. } => (Ddl, "CREATE FUNCTION"),
        Statement::CreateTrigger { .. } => (Ddl, "CREATE TRIGGER"),
        Statement::AlterTable { .. } => (Ddl, "ALTER TABLE"),
        Statement::AlterView { .. } => (Ddl, "ALTER VIEW"),
        Statement::AlterIndex { .. } => (Ddl, "ALTER INDEX"),
        Statement::Drop { .. } => (Ddl, "DROP"),
        Statement::Truncate { .. } => (Ddl, "TRUNCATE"),
        Statement::Comment { .. } => (Ddl, "COMMENT"),

        Statement::StartTransaction { .. } => (Transaction, "BEGIN"),
        Statement::Commit { .. } => (Transaction, "COMMIT"),
        Statement::Rollback { .. } => (Transaction, "ROLLBACK"),
        Statement::Savepoint { .. } => (Transaction, "SAVEPOINT"),

        Statement::Call { .. } => (Procedure, "CALL"),
        Statement::Execute { .. } => (Procedure, "EXECUTE"),
        Statement::Prepare { .. } => (Procedure, "PREPARE"),

        Statement::Grant { .. } => (Administrative, "GRANT"),
        Statement::Revoke { .. } => (Administrative, "REVOKE"),
        Statement::Set(_) => (Administrative, "SET"),
        Statement::Use(_) => (Administrative, "USE"),
        Statement::Kill { .. } => (Administrative, "KILL"),
        Statement::Vacuum { .. } => (Administrative, "VACUUM"),
        Statement::Analyze { .. } => (Administrative, "ANALYZE"),
        Statement::LockTables { .. } => (Administrative, "LOCK"),
        Statement::Pragma { .. } => (Administrative, "PRAGMA"),
        Statement::AttachDatabase { .. } => (Administrative, "ATTACH"),

        _ => (Unknown, "Unknown"),
    }
}

/// Find a write hidden inside a query: a data-modifying CTE, `SELECT INTO`,
/// or DML nested in a set operation or derived table.
fn query_write(query: &Query) -> Option<(StatementClass, &'static str)> {
    if let Some(with) = &query.with {
        for cte in &with.cte_tables {
            if let Some(found) = query_write(&cte.query) {
                return Some(found);
            }
        }
    }
    set_expr_write(&query.body)
}

fn set_expr_write(body: &SetExpr) -> Option<(StatementClass, &'static str)> {
    use StatementClass::*;

    match body {
        SetExpr::Select(select) => {
            if select.into.is_some() {
                return Some((Ddl, "SELECT INTO"));
            }
            select.from.iter().find_map(from_write)
        }
        SetExpr::Query(query) => query_write(query),
        SetExpr::SetOperation { left, right, .. } => {
            set_expr_write(left).or_else(|| set_expr_write(right))
        }
        SetExpr::Insert(_) => Some((Write, "INSERT")),
        SetExpr::Update(_) => Some((Write, "UPDATE")),
        SetExpr::Delete(_) => Some((Write, "DELETE")),
        SetExpr::Merge(_) => Some((Write, "MERGE")),
        SetExpr::Values(_) | SetExpr::Table(_) => None,
    }
}

fn from_write(from: &TableWithJoins) -> Option<(StatementClass, &'static str)> {
    factor_write(&from.relation)
        .or_else(|| from.joins.iter().find_map(|join| factor_write(&join.relation)))
}

fn factor_write(factor: &TableFactor) -> Option<(StatementClass, &'static str)> {
    match factor {
        TableFactor::Derived { subquery, .. } => query_write(subquery),
        TableFactor::NestedJoin { table_with_joins, .. } => from_write(table_with_joins),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PG: DatabaseType = DatabaseType::PostgreSQL;

    fn refused(sql: &str, db: DatabaseType) -> DbError {
        validate_readonly(sql, db).unwrap_err()
    }

    #[test]
    fn test_queries_allowed() {
        assert!(validate_readonly("SELECT * FROM orders", PG).is_ok());
        assert!(validate_readonly("SELECT a FROM t1 UNION ALL SELECT b FROM t2", PG).is_ok());
        assert!(
            validate_readonly(
                "WITH recent AS (SELECT * FROM orders WHERE order_date > '2026-01-01') \
                 SELECT customer_id, COUNT(*) FROM recent GROUP BY customer_id",
                PG
            )
            .is_ok()
        );
        assert!(validate_readonly("SELECT * FROM orders WHERE id = $1", PG).is_ok());
        assert!(validate_readonly("SELECT * FROM orders WHERE id = ?", DatabaseType::SQLite).is_ok());
    }

    #[test]
    fn test_show_and_explain_allowed() {
        assert!(validate_readonly("SHOW TABLES", DatabaseType::MySQL).is_ok());
        assert!(validate_readonly("EXPLAIN SELECT * FROM orders", PG).is_ok());
    }

    #[test]
    fn test_writes_refused() {
        for sql in [
            "INSERT INTO orders VALUES (1)",
            "UPDATE orders SET total_amount = 0",
            "DELETE FROM orders",
            "INSERT INTO archive SELECT * FROM orders",
        ] {
            assert!(matches!(refused(sql, PG), DbError::Permission { .. }), "{sql}");
        }
    }

    #[test]
    fn test_writes_inside_queries_refused() {
        let err = refused("WITH d AS (DELETE FROM orders RETURNING *) SELECT * FROM d", PG);
        assert!(matches!(err, DbError::Permission { .. }));
        assert!(err.to_string().contains("DELETE"));

        let err = refused(
            "WITH u AS (UPDATE orders SET total_amount = 0 RETURNING order_id) \
             SELECT order_id FROM u",
            PG,
        );
        assert!(err.to_string().contains("UPDATE"));

        let err = refused("SELECT * INTO orders_backup FROM orders", PG);
        assert!(err.to_string().contains("SELECT INTO"));

        assert!(validate_readonly(
            "SELECT 1 UNION SELECT * FROM (WITH i AS (INSERT INTO t VALUES (1) RETURNING id) SELECT id FROM i) x",
            PG
        )
        .is_err());
    }

    #[test]
    fn test_explain_of_write_refused() {
        let err = refused("EXPLAIN ANALYZE DELETE FROM orders", PG);
        assert!(err.to_string().contains("DELETE"));
    }

    #[test]
    fn test_ddl_and_transactions_refused() {
        assert!(refused("DROP TABLE orders", PG).to_string().contains("schema changes"));
        assert!(refused("CREATE TABLE t (id INT)", PG).to_string().contains("read-only"));
        assert!(refused("COMMIT", PG).to_string().contains("Transaction"));
    }

    #[test]
    fn test_stacked_statements_refused() {
        assert!(validate_readonly("SELECT 1; DELETE FROM orders", PG).is_err());
    }

    #[test]
    fn test_parse_error_is_invalid_input() {
        assert!(matches!(
            refused("SELEC FROM", PG),
            DbError::InvalidInput { .. }
        ));
        assert!(matches!(refused("", PG), DbError::InvalidInput { .. }));
    }
}
