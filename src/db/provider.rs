//! Connection provider abstraction.
//!
//! Discovery code asks for a connection, runs catalog SQL on it, and
//! releases it. It never sees a pool or a driver row. Tests substitute a
//! provider that answers from canned rows.

use crate::db::catalog::CatalogRow;
use crate::db::executor;
use crate::db::pool::DbPool;
use crate::error::DbResult;
use crate::models::{DatabaseType, QueryParam};
use sqlx::pool::PoolConnection;
use sqlx::{MySql, Postgres, Sqlite};
use std::future::Future;
use std::time::Duration;
use tracing::debug;

/// A connection held for the duration of one operation.
pub trait CatalogConnection: Send {
    /// Run one statement, returning at most `max_rows` decoded rows.
    fn fetch(
        &mut self,
        sql: &str,
        binds: &[QueryParam],
        max_rows: usize,
    ) -> impl Future<Output = DbResult<Vec<CatalogRow>>> + Send;

    /// Return the connection to wherever it came from.
    fn release(self) -> impl Future<Output = ()> + Send
    where
        Self: Sized;
}

pub trait ConnectionProvider: Send + Sync {
    type Connection: CatalogConnection;

    fn dialect(&self) -> DatabaseType;

    fn acquire(&self) -> impl Future<Output = DbResult<Self::Connection>> + Send;
}

/// Provider backed by a sqlx pool. Every statement runs under `query_timeout`.
#[derive(Debug, Clone)]
pub struct SqlxProvider {
    pool: DbPool,
    query_timeout: Duration,
}

impl SqlxProvider {
    pub fn new(pool: DbPool, query_timeout: Duration) -> Self {
        Self {
            pool,
            query_timeout,
        }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    pub fn query_timeout(&self) -> Duration {
        self.query_timeout
    }
}

impl ConnectionProvider for SqlxProvider {
    type Connection = SqlxConnection;

    fn dialect(&self) -> DatabaseType {
        self.pool.db_type()
    }

    async fn acquire(&self) -> DbResult<SqlxConnection> {
        let conn = match &self.pool {
            DbPool::MySql(pool) => PooledConn::MySql(pool.acquire().await?),
            DbPool::Postgres(pool) => PooledConn::Postgres(pool.acquire().await?),
            DbPool::SQLite(pool) => PooledConn::SQLite(pool.acquire().await?),
        };
        Ok(SqlxConnection {
            conn,
            query_timeout: self.query_timeout,
        })
    }
}

enum PooledConn {
    MySql(PoolConnection<MySql>),
    Postgres(PoolConnection<Postgres>),
    SQLite(PoolConnection<Sqlite>),
}

pub struct SqlxConnection {
    conn: PooledConn,
    query_timeout: Duration,
}

impl CatalogConnection for SqlxConnection {
    async fn fetch(
        &mut self,
        sql: &str,
        binds: &[QueryParam],
        max_rows: usize,
    ) -> DbResult<Vec<CatalogRow>> {
        debug!(binds = binds.len(), max_rows, "Running catalog statement");
        let timeout = self.query_timeout;
        match &mut self.conn {
            PooledConn::MySql(conn) => {
                executor::mysql::fetch_rows(conn, sql, binds, max_rows, timeout).await
            }
            PooledConn::Postgres(conn) => {
                executor::postgres::fetch_rows(conn, sql, binds, max_rows, timeout).await
            }
            PooledConn::SQLite(conn) => {
                executor::sqlite::fetch_rows(conn, sql, binds, max_rows, timeout).await
            }
        }
    }

    async fn release(self) {
        // Dropping a PoolConnection hands it back to the pool
        drop(self.conn);
    }
}
