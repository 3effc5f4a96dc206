//! memquery: attribute query MCP server for memory images.
//!
//! Answers questions such as "what is the pid of explorer.exe" or "when was
//! this Run key last written" against snapshots of Windows memory images.
//! It communicates via stdio transport.

mod backend;
mod config;
mod query;
mod server;
#[cfg(test)]
mod testing;

use backend::snapshot::SnapshotBackend;
use config::ServerConfig;
use query::session::SessionCache;
use query::QueryEngine;
use rmcp::transport::stdio;
use rmcp::ServiceExt;
use server::tools::MemQueryServer;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ServerConfig::from_env()?;

    // Logs go to stderr so stdout stays clean for MCP
    let filter = match config.log_filter.as_deref() {
        Some(directives) => EnvFilter::try_new(directives)?,
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    tracing::info!(
        "memquery MCP server starting (default timeout: {:?})",
        config.default_timeout
    );

    let sessions = Arc::new(SessionCache::new(Arc::new(SnapshotBackend)));
    let engine = Arc::new(QueryEngine::new(sessions));

    let service = MemQueryServer::new(engine, config)
        .serve(stdio())
        .await
        .inspect_err(|e| tracing::error!("Server error: {}", e))?;

    tracing::info!("memquery MCP server running on stdio");
    service.waiting().await?;

    tracing::info!("memquery MCP server shutting down");
    Ok(())
}
