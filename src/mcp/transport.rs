//! Serving [`MonitorMcpServer`] over stdio or streamable HTTP.

use std::sync::Arc;

use rmcp::ServiceExt;
use rmcp::transport::io::stdio;
use rmcp::transport::streamable_http_server::{
    StreamableHttpServerConfig, StreamableHttpService, session::local::LocalSessionManager,
};
use tracing::info;

use super::server::MonitorMcpServer;

/// Serves one agent over stdin/stdout until it disconnects.
///
/// Stdout carries JSON-RPC; logs go to stderr.
///
/// # Errors
///
/// Fails if the handshake or the session loop fails.
pub async fn serve_stdio(server: MonitorMcpServer) -> anyhow::Result<()> {
    info!("serving MCP over stdio");
    let service = server.serve(stdio()).await?;
    service.waiting().await?;
    Ok(())
}

/// Builds the axum router exposing `server` at `/mcp`.
///
/// Every session gets a clone of `server`, sharing its HTTP pool and
/// embedder. Cancelling `ct` closes open sessions.
pub fn router(server: MonitorMcpServer, ct: &tokio_util::sync::CancellationToken) -> axum::Router {
    let service = StreamableHttpService::new(
        move || Ok(server.clone()),
        Arc::new(LocalSessionManager::default()),
        StreamableHttpServerConfig {
            cancellation_token: ct.child_token(),
            ..Default::default()
        },
    );
    axum::Router::new().nest_service("/mcp", service)
}

/// Serves `/mcp` on `host:port` until ctrl-c.
///
/// # Errors
///
/// Fails if the address cannot be bound or the listener dies.
pub async fn serve_http(server: MonitorMcpServer, host: &str, port: u16) -> anyhow::Result<()> {
    let ct = tokio_util::sync::CancellationToken::new();
    let router = router(server, &ct);

    let addr = format!("{host}:{port}");
    let tcp_listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(%addr, "MCP server listening on http://{addr}/mcp");

    axum::serve(tcp_listener, router)
        .with_graceful_shutdown(async move {
            let _ = tokio::signal::ctrl_c().await;
            ct.cancel();
        })
        .await?;

    Ok(())
}
