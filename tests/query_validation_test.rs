//! Integration tests for query validation.
//!
//! The query tool accepts only read-only statements, parsed under the
//! connected database's dialect.

use catalog_mcp_server::error::DbError;
use catalog_mcp_server::models::DatabaseType;
use catalog_mcp_server::tools::sql_validator::validate_readonly;
use tokio_test::{assert_err, assert_ok};

const ALL: [DatabaseType; 3] = [
    DatabaseType::PostgreSQL,
    DatabaseType::MySQL,
    DatabaseType::SQLite,
];

/// Test that data modification is rejected with Permission error.
#[test]
fn test_query_rejects_writes() {
    for db in ALL {
        for sql in [
            "INSERT INTO customers (name) VALUES ('test')",
            "UPDATE customers SET name = 'changed' WHERE customer_id = 1",
            "DELETE FROM customers WHERE customer_id = 1",
        ] {
            let err = assert_err!(validate_readonly(sql, db));
            assert!(
                matches!(err, DbError::Permission { .. }),
                "{db}: {sql} should be Permission error, got: {:?}",
                err
            );
        }
    }
}

/// Test that schema changes are rejected.
#[test]
fn test_query_rejects_ddl() {
    for db in ALL {
        assert_err!(validate_readonly("CREATE TABLE t (id INT PRIMARY KEY)", db));
        assert_err!(validate_readonly("DROP TABLE customers", db));
        assert_err!(validate_readonly("ALTER TABLE customers ADD COLUMN x INT", db));
    }
}

#[test]
fn test_query_allows_select() {
    for db in ALL {
        assert_ok!(validate_readonly("SELECT * FROM customers WHERE customer_id = 1", db));
    }
}

#[test]
fn test_query_allows_complex_select() {
    let sql = r#"
        SELECT c.name, SUM(o.total_amount) AS spent
        FROM customers c
        JOIN orders o ON c.customer_id = o.customer_id
        WHERE o.order_date > '2026-01-01'
        GROUP BY c.name
        ORDER BY spent DESC
        LIMIT 10
    "#;
    for db in ALL {
        assert_ok!(validate_readonly(sql, db));
    }
}

#[test]
fn test_query_allows_cte_and_subquery() {
    let sql = "WITH big AS (SELECT order_id FROM order_items WHERE quantity > 3) \
               SELECT * FROM orders WHERE order_id IN (SELECT order_id FROM big)";
    assert_ok!(validate_readonly(sql, DatabaseType::PostgreSQL));
}

#[test]
fn test_mysql_show_and_describe() {
    assert_ok!(validate_readonly("SHOW TABLES", DatabaseType::MySQL));
    assert_ok!(validate_readonly("SHOW COLUMNS FROM orders", DatabaseType::MySQL));
    assert_ok!(validate_readonly("DESCRIBE orders", DatabaseType::MySQL));
}

#[test]
fn test_explain_follows_inner_statement() {
    assert_ok!(validate_readonly(
        "EXPLAIN SELECT * FROM orders",
        DatabaseType::PostgreSQL
    ));
    assert_err!(validate_readonly(
        "EXPLAIN ANALYZE UPDATE orders SET total_amount = 0",
        DatabaseType::PostgreSQL
    ));
}

/// A read followed by a write is refused as a whole.
#[test]
fn test_multi_statement_with_write_rejected() {
    let err = assert_err!(validate_readonly(
        "SELECT 1; DROP TABLE customers",
        DatabaseType::SQLite
    ));
    assert!(matches!(err, DbError::Permission { .. }));
}

#[test]
fn test_sqlite_pragma_and_attach_rejected() {
    assert_err!(validate_readonly("PRAGMA foreign_keys = OFF", DatabaseType::SQLite));
    assert_err!(validate_readonly(
        "ATTACH DATABASE 'other.db' AS other",
        DatabaseType::SQLite
    ));
}

#[test]
fn test_transaction_control_rejected() {
    for sql in ["BEGIN", "COMMIT", "ROLLBACK"] {
        assert_err!(validate_readonly(sql, DatabaseType::PostgreSQL));
    }
}

#[test]
fn test_unparseable_is_invalid_input() {
    let err = assert_err!(validate_readonly("SELEC * FORM x", DatabaseType::MySQL));
    assert!(matches!(err, DbError::InvalidInput { .. }));
}

/// A data-modifying CTE is a write even though the statement is a query.
#[test]
fn test_data_modifying_cte_rejected() {
    let err = assert_err!(validate_readonly(
        "WITH d AS (DELETE FROM orders RETURNING *) SELECT * FROM d",
        DatabaseType::PostgreSQL
    ));
    assert!(matches!(err, DbError::Permission { .. }), "{err:?}");

    let err = assert_err!(validate_readonly(
        "WITH moved AS (INSERT INTO archive SELECT * FROM orders RETURNING order_id) \
         SELECT COUNT(*) FROM moved",
        DatabaseType::PostgreSQL
    ));
    assert!(matches!(err, DbError::Permission { .. }), "{err:?}");
}

/// SELECT INTO creates a table.
#[test]
fn test_select_into_rejected() {
    let err = assert_err!(validate_readonly(
        "SELECT * INTO orders_backup FROM orders",
        DatabaseType::PostgreSQL
    ));
    assert!(matches!(err, DbError::Permission { .. }), "{err:?}");
}

#[test]
fn test_write_behind_union_rejected() {
    assert_err!(validate_readonly(
        "SELECT order_id FROM orders UNION ALL \
         (WITH d AS (DELETE FROM order_items RETURNING order_id) SELECT order_id FROM d)",
        DatabaseType::PostgreSQL
    ));
}
