//! Catalog MCP Server Library
//!
//! MCP (Model Context Protocol) tools that let AI assistants discover the
//! schema of a SQL database (SQLite, PostgreSQL, MySQL): tables, columns,
//! constraints, foreign key relations, sample values and likely join
//! partners.

pub mod cache;
pub mod config;
pub mod db;
pub mod discovery;
pub mod error;
pub mod mcp;
pub mod models;
pub mod tools;
pub mod transport;

pub use config::Config;
pub use error::DbError;
pub use mcp::CatalogService;
