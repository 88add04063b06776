//! Statement execution on a single pooled connection.
//!
//! Rows are streamed and only `max_rows` are pulled from the driver, so a
//! catalog view with millions of entries never materializes in memory. Each
//! statement runs under its own timeout.

use crate::db::catalog::CatalogRow;
use crate::db::types::ToCatalogRow;
use crate::error::{DbError, DbResult};
use crate::models::QueryParam;
use futures_util::StreamExt;
use std::time::Duration;
use tokio::time::timeout;

fn collect_rows<R: ToCatalogRow>(results: Vec<Result<R, sqlx::Error>>) -> DbResult<Vec<CatalogRow>> {
    let mut rows = Vec::with_capacity(results.len());
    for result in results {
        rows.push(result.map_err(DbError::from)?.to_catalog_row());
    }
    Ok(rows)
}

fn timeout_error(operation: &str, timeout: Duration) -> DbError {
    DbError::timeout(operation, timeout.as_secs() as u32)
}

// The three dialect modules are kept parallel on purpose; differences are
// only in the connection type.

pub(crate) mod mysql {
    use super::*;
    use crate::db::params::bind_all;
    use sqlx::MySqlConnection;

    pub async fn fetch_rows(
        conn: &mut MySqlConnection,
        sql: &str,
        params: &[QueryParam],
        max_rows: usize,
        query_timeout: Duration,
    ) -> DbResult<Vec<CatalogRow>> {
        // Unparameterized statements go through the simple protocol
        let rows_future = if params.is_empty() {
            use sqlx::Executor;
            conn.fetch(sql).take(max_rows).collect::<Vec<_>>()
        } else {
            bind_all::<sqlx::MySql>(sql, params)
                .fetch(conn)
                .take(max_rows)
                .collect::<Vec<_>>()
        };

        match timeout(query_timeout, rows_future).await {
            Ok(results) => collect_rows(results),
            Err(_) => Err(timeout_error("query execution", query_timeout)),
        }
    }
}

pub(crate) mod postgres {
    use super::*;
    use crate::db::params::bind_all;
    use sqlx::PgConnection;

    pub async fn fetch_rows(
        conn: &mut PgConnection,
        sql: &str,
        params: &[QueryParam],
        max_rows: usize,
        query_timeout: Duration,
    ) -> DbResult<Vec<CatalogRow>> {
        let rows_future = if params.is_empty() {
            use sqlx::Executor;
            conn.fetch(sql).take(max_rows).collect::<Vec<_>>()
        } else {
            bind_all::<sqlx::Postgres>(sql, params)
                .fetch(conn)
                .take(max_rows)
                .collect::<Vec<_>>()
        };

        match timeout(query_timeout, rows_future).await {
            Ok(results) => collect_rows(results),
            Err(_) => Err(timeout_error("query execution", query_timeout)),
        }
    }
}

pub(crate) mod sqlite {
    use super::*;
    use crate::db::params::bind_all;
    use sqlx::SqliteConnection;

    pub async fn fetch_rows(
        conn: &mut SqliteConnection,
        sql: &str,
        params: &[QueryParam],
        max_rows: usize,
        query_timeout: Duration,
    ) -> DbResult<Vec<CatalogRow>> {
        let rows_future = if params.is_empty() {
            use sqlx::Executor;
            conn.fetch(sql).take(max_rows).collect::<Vec<_>>()
        } else {
            bind_all::<sqlx::Sqlite>(sql, params)
                .fetch(conn)
                .take(max_rows)
                .collect::<Vec<_>>()
        };

        match timeout(query_timeout, rows_future).await {
            Ok(results) => collect_rows(results),
            Err(_) => Err(timeout_error("query execution", query_timeout)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::Connection;
    use sqlx::SqliteConnection;

    async fn memory() -> SqliteConnection {
        let mut conn = SqliteConnection::connect("sqlite::memory:").await.unwrap();
        {
            use sqlx::Executor;
            conn.execute(
                "CREATE TABLE t (id INTEGER PRIMARY KEY, name TEXT);
                 INSERT INTO t (name) VALUES ('a'), ('b'), ('c'), ('d');",
            )
            .await
            .unwrap();
        }
        conn
    }

    #[tokio::test]
    async fn test_fetch_stops_at_max_rows() {
        let mut conn = memory().await;
        let rows = sqlite::fetch_rows(
            &mut conn,
            "SELECT name FROM t ORDER BY id",
            &[],
            2,
            Duration::from_secs(5),
        )
        .await
        .unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].string("name").as_deref(), Some("a"));
    }

    #[tokio::test]
    async fn test_fetch_with_params() {
        let mut conn = memory().await;
        let rows = sqlite::fetch_rows(
            &mut conn,
            "SELECT id FROM t WHERE UPPER(name) = ?1",
            &[QueryParam::text("C")],
            10,
            Duration::from_secs(5),
        )
        .await
        .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].i64("id"), Some(3));
    }

    #[tokio::test]
    async fn test_fetch_maps_sql_errors() {
        let mut conn = memory().await;
        let err = sqlite::fetch_rows(
            &mut conn,
            "SELECT * FROM missing_table",
            &[],
            10,
            Duration::from_secs(5),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, DbError::Database { .. }));
    }

    #[test]
    fn test_timeout_error_reports_seconds() {
        let err = timeout_error("query execution", Duration::from_secs(30));
        assert!(matches!(err, DbError::Timeout { elapsed_secs: 30, .. }));
    }
}
