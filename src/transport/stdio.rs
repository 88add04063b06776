//! Stdio transport for the MCP server.
//!
//! Reads JSON-RPC messages from stdin and writes responses to stdout. Logs
//! go to stderr so they never interleave with protocol frames.

use crate::db::DbPool;
use crate::error::{DbError, DbResult};
use crate::mcp::CatalogService;
use crate::transport::Transport;
use rmcp::{ServiceExt, transport::stdio};
use tokio::signal;
use tracing::{info, warn};

pub struct StdioTransport {
    service: CatalogService,
    /// Closed once the service stops
    pool: DbPool,
}

impl StdioTransport {
    pub fn new(service: CatalogService, pool: DbPool) -> Self {
        Self { service, pool }
    }
}

impl Transport for StdioTransport {
    async fn run(&self) -> DbResult<()> {
        info!("Starting MCP server with stdio transport");

        let running_service = self
            .service
            .clone()
            .serve(stdio())
            .await
            .map_err(|e| DbError::internal(format!("Failed to start stdio transport: {}", e)))?;

        let shutdown_requested = tokio::select! {
            result = running_service.waiting() => {
                match result {
                    Ok(quit_reason) => {
                        info!(reason = ?quit_reason, "Client disconnected");
                    }
                    Err(e) => {
                        warn!(error = %e, "Stdio transport error");
                        self.pool.close().await;
                        return Err(DbError::internal(format!("Stdio transport error: {}", e)));
                    }
                }
                false
            }
            _ = wait_for_signal() => {
                info!("Shutdown signal received (send again to force exit)");
                true
            }
        };

        if shutdown_requested {
            tokio::spawn(async {
                wait_for_signal().await;
                warn!("Received second signal, forcing immediate exit");
                std::process::exit(1);
            });
        }

        info!("Closing database pool");
        self.pool.close().await;

        if shutdown_requested {
            // A blocked stdin read cannot be cancelled from here
            info!("Exiting process");
            std::process::exit(0);
        }

        Ok(())
    }

    fn name(&self) -> &'static str {
        "stdio"
    }
}

/// Wait for SIGINT or SIGTERM. A handler that cannot be installed never fires.
async fn wait_for_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Could not listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Could not listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received SIGINT");
        }
        _ = terminate => {
            info!("Received SIGTERM");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MetadataCache;
    use crate::config::DatabaseConfig;
    use crate::db::SqlxProvider;
    use crate::discovery::SchemaDiscovery;
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test]
    async fn test_stdio_transport_creation() {
        let config = DatabaseConfig::parse("sqlite::memory:").unwrap();
        let pool = DbPool::connect(&config).await.unwrap();
        let provider = SqlxProvider::new(pool.clone(), Duration::from_secs(5));
        let discovery =
            SchemaDiscovery::new(provider, MetadataCache::new(Duration::from_secs(60), 10));
        let service = CatalogService::new(Arc::new(discovery));

        let transport = StdioTransport::new(service, pool);
        assert_eq!(transport.name(), "stdio");
    }
}
