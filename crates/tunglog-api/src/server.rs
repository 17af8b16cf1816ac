//! Demo log API: an in-memory list behind a handful of REST routes.
//!
//! The list is independent of any SQLite store; it only shares the record
//! shape with the rest of the workspace.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::signal;
use tokio::sync::RwLock;

use crate::model::ApiLog;

pub const DEFAULT_ADDR: &str = "127.0.0.1:8000";

#[derive(Clone, Default)]
pub struct AppState {
    logs: Arc<RwLock<Vec<ApiLog>>>,
}

impl AppState {
    /// State holding the single startup entry the demo server begins with.
    pub fn seeded() -> Self {
        let startup = ApiLog {
            log_type: "INFO".to_string(),
            log_message: "API server started".to_string(),
            hostname: Some("local-api".to_string()),
            created_at: Some(Utc::now()),
        };
        Self::with_logs(vec![startup])
    }

    pub fn with_logs(logs: Vec<ApiLog>) -> Self {
        Self {
            logs: Arc::new(RwLock::new(logs)),
        }
    }

    pub async fn snapshot(&self) -> Vec<ApiLog> {
        self.logs.read().await.clone()
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handle_root))
        .route("/api/health", get(handle_health))
        .route("/api/logs", get(handle_list_logs).post(handle_post_logs))
        .route("/api/logs_wrapped", get(handle_list_logs_wrapped))
        .with_state(state)
}

/// Serve the demo API on `addr` until Ctrl+C.
pub async fn serve(addr: SocketAddr) -> std::io::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    tracing::info!("Starting demo log API on {}", listener.local_addr()?);
    serve_on(listener, router(AppState::seeded())).await
}

/// Serve `app` on an already bound listener until Ctrl+C.
pub async fn serve_on(listener: TcpListener, app: Router) -> std::io::Result<()> {
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    tracing::info!("Demo log API shut down");
    Ok(())
}

async fn shutdown_signal() {
    match signal::ctrl_c().await {
        Ok(()) => tracing::info!("Received Ctrl+C, shutting down"),
        Err(error) => {
            tracing::warn!("failed to listen for Ctrl+C: {error}");
            std::future::pending::<()>().await;
        }
    }
}

async fn handle_root() -> Json<Value> {
    Json(json!({ "message": "Server API is running now!" }))
}

async fn handle_health() -> Json<Value> {
    Json(json!({ "status": "ok", "time": Utc::now() }))
}

async fn handle_list_logs(State(state): State<AppState>) -> Json<Vec<ApiLog>> {
    Json(state.snapshot().await)
}

async fn handle_list_logs_wrapped(State(state): State<AppState>) -> Json<Value> {
    Json(json!({ "data": state.snapshot().await }))
}

/// Append posted entries, stamping a missing `created_at` with the current time.
async fn handle_post_logs(
    State(state): State<AppState>,
    Json(items): Json<Vec<ApiLog>>,
) -> Json<Value> {
    let inserted = items.len();
    let now = Utc::now();
    {
        let mut logs = state.logs.write().await;
        logs.extend(items.into_iter().map(|mut item| {
            item.created_at.get_or_insert(now);
            item
        }));
    }
    tracing::info!(inserted, "accepted posted logs");
    Json(json!({ "inserted": inserted }))
}
