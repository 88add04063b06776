//! Database access layer.
//!
//! - `pool`: per-dialect connection pools
//! - `provider`: the connection capability the discovery engine consumes
//! - `executor`: streaming, time-bounded statement execution
//! - `catalog`: the dialect-neutral row type
//! - `schema`: catalog SQL per dialect
//! - `types`: driver value decoding

pub mod catalog;
pub mod executor;
pub mod params;
pub mod pool;
pub mod provider;
pub mod schema;
pub mod types;

pub use catalog::CatalogRow;
pub use pool::DbPool;
pub use provider::{CatalogConnection, ConnectionProvider, SqlxConnection, SqlxProvider};
pub use schema::{CatalogSql, catalog_sql, quote_ident};
