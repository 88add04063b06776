//! MCP server integration module.
//!
//! Binds the discovery and query tool handlers to the rmcp framework.

pub mod service;

pub use service::CatalogService;
