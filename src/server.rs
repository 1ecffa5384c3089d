//! HTTP transport
//!
//! Exposes the function over HTTP with JSON bodies:
//!
//! - `POST /run-function` takes a `RunFunctionRequest`, returns a `RunFunctionResponse`
//! - `GET /health` returns `{"status": "ok"}`
//!
//! Function failures are reported inside the response body as fatal results,
//! so the status code is 200 whenever the request body parsed.

use crate::function::Function;
use crate::resource::{RunFunctionRequest, RunFunctionResponse};
use anyhow::{Context, Result};
use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::net::TcpListener;

/// Build the router with all endpoints
pub fn router(function: Arc<Function>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/run-function", post(run_function))
        .with_state(function)
}

/// Serve on an already bound listener until the process is stopped
pub async fn serve(listener: TcpListener, function: Arc<Function>) -> Result<()> {
    let addr = listener.local_addr().context("cannot read listener address")?;
    tracing::info!("Listening on http://{addr}");

    axum::serve(listener, router(function))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")
}

/// Bind `addr` and serve
pub async fn start(addr: &str, function: Arc<Function>) -> Result<()> {
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("cannot bind {addr}"))?;
    serve(listener, function).await
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

async fn run_function(
    State(function): State<Arc<Function>>,
    Json(req): Json<RunFunctionRequest>,
) -> Json<RunFunctionResponse> {
    Json(function.run_function(&req).await)
}
