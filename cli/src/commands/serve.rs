//! `additions serve` — loopback JSON endpoint over the extension host.
//!
//! Routes mirror the host operations one to one. Every response carries
//! `Access-Control-Allow-Origin: *` so a page opened from a bundle can call
//! back into the host. View requests are queued to a dispatcher task.

use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::process::ExitCode;
use std::sync::Arc;

use additions_common::{ExtensionInfo, LogTail, OperationReply, RemoteEntry, ServerConfig};
use anyhow::{Context, Result};
use axum::extract::{Path, Query, State};
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use clap::Args;
use serde::Deserialize;

use crate::app::AppContext;
use crate::application::services::host::DEFAULT_LOG_LINES;
use crate::infra::LocalHost;
use crate::infra::views::{ChannelOpener, SystemOpener, dispatch_views};
use crate::output::TracingReporter;

type SharedHost = Arc<LocalHost<ChannelOpener>>;

/// Arguments for the serve command.
#[derive(Args)]
pub struct ServeArgs {
    /// Address to listen on (loopback only). Defaults to the configured `listen`.
    #[arg(long)]
    pub listen: Option<SocketAddr>,
}

#[derive(Debug, Deserialize)]
struct InstallQuery {
    #[serde(default)]
    url: String,
}

#[derive(Debug, Deserialize)]
struct LogsQuery {
    lines: Option<usize>,
}

/// Run `additions serve` until Ctrl-C, then stop every running extension.
///
/// # Errors
///
/// Returns an error if the address is not loopback or cannot be bound.
pub async fn run(app: &AppContext, args: &ServeArgs) -> Result<ExitCode> {
    let server = ServerConfig::new(args.listen.unwrap_or(app.config.listen))?;

    let (views, rx) = ChannelOpener::channel();
    let dispatcher = tokio::spawn(dispatch_views(rx, SystemOpener::default()));
    let host: SharedHost = Arc::new(app.host(views));

    let listener = tokio::net::TcpListener::bind(server.listen_addr)
        .await
        .with_context(|| format!("failed to bind {}", server.listen_addr))?;
    tracing::info!(root = %app.root.display(), "extension host ready on http://{}", server.listen_addr);
    app.output
        .info(&format!("Listening on http://{}", server.listen_addr));

    axum::serve(listener, router(Arc::clone(&host)))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;

    host.shutdown().await;
    drop(host);
    dispatcher.abort();
    tracing::info!("extension host shut down");
    Ok(ExitCode::SUCCESS)
}

/// Build the endpoint's router over `host`.
pub fn router(host: SharedHost) -> Router {
    Router::new()
        .route("/api/extensions", get(list))
        .route("/api/remote", get(remote))
        .route("/api/info/{name}", get(info))
        .route("/api/install/{name}", get(install))
        .route("/api/delete/{name}", get(delete))
        .route("/api/start/{name}", get(start))
        .route("/api/stop/{name}", get(stop))
        .route("/api/dismiss/{name}", get(dismiss))
        .route("/api/logs/{name}", get(logs))
        .route("/health", get(health))
        .layer(axum::middleware::map_response(allow_any_origin))
        .with_state(host)
}

async fn allow_any_origin(mut response: Response) -> Response {
    response.headers_mut().insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static("*"),
    );
    response
}

async fn health() -> StatusCode {
    StatusCode::OK
}

async fn list(State(host): State<SharedHost>) -> Json<Vec<ExtensionInfo>> {
    Json(host.list().await)
}

async fn remote(State(host): State<SharedHost>) -> Json<BTreeMap<String, RemoteEntry>> {
    Json(host.remote().clone())
}

async fn info(State(host): State<SharedHost>, Path(name): Path<String>) -> Response {
    match host.info(&name).await {
        Some(info) => Json(info).into_response(),
        None => not_found(&name),
    }
}

async fn install(
    State(host): State<SharedHost>,
    Path(name): Path<String>,
    Query(query): Query<InstallQuery>,
) -> Json<OperationReply> {
    Json(host.install(&name, &query.url, &TracingReporter).await)
}

async fn delete(State(host): State<SharedHost>, Path(name): Path<String>) -> Json<OperationReply> {
    Json(host.remove(&name).await)
}

async fn start(State(host): State<SharedHost>, Path(name): Path<String>) -> Json<OperationReply> {
    Json(host.start(&name).await)
}

async fn stop(State(host): State<SharedHost>, Path(name): Path<String>) -> Json<OperationReply> {
    Json(host.stop(&name).await)
}

async fn dismiss(State(host): State<SharedHost>, Path(name): Path<String>) -> Json<OperationReply> {
    Json(host.dismiss(&name).await)
}

async fn logs(
    State(host): State<SharedHost>,
    Path(name): Path<String>,
    Query(query): Query<LogsQuery>,
) -> Response {
    let lines = query.lines.unwrap_or(DEFAULT_LOG_LINES);
    match host.logs(&name, lines).await {
        Some(tail) => Json::<LogTail>(tail).into_response(),
        None => not_found(&name),
    }
}

fn not_found(name: &str) -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(OperationReply::failed(format!("Extension '{name}' not found."))),
    )
        .into_response()
}

/// Wait for Ctrl-C. If the handler cannot be installed, serve until killed.
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to install Ctrl-C handler");
        std::future::pending::<()>().await;
    }
    tracing::info!("received shutdown signal");
}
