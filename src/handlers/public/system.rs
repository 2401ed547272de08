// handlers/public/system.rs - GET / and GET /health

use axum::{extract::State, http::StatusCode};
use serde_json::{json, Value};

use crate::middleware::ApiResponse;
use crate::state::AppState;

pub async fn root_get() -> ApiResponse<Value> {
    let version = env!("CARGO_PKG_VERSION");

    ApiResponse::bare(json!({
        "name": "Donation Server",
        "version": version,
        "endpoints": {
            "donate": "POST /donate (public)",
            "donations": "GET /donations (admin token)",
            "upload": "POST /upload (admin token, multipart: file + description)",
            "media": "GET /media (public)",
            "login": "POST /admin/login (public - token acquisition)",
            "uploads": "GET /uploads/:filename (public, static)",
        }
    }))
}

/// Liveness plus a check that both storage directories are usable.
pub async fn health_get(State(state): State<AppState>) -> ApiResponse<Value> {
    let now = chrono::Utc::now();

    let data_ok = is_dir(state.store.root()).await;
    let uploads_ok = is_dir(state.media.uploads_dir()).await;

    if data_ok && uploads_ok {
        ApiResponse::bare(json!({
            "status": "ok",
            "timestamp": now,
        }))
    } else {
        tracing::warn!(data_ok, uploads_ok, "health check failed");
        ApiResponse::bare(json!({
            "status": "degraded",
            "timestamp": now,
            "storage": {
                "data": data_ok,
                "uploads": uploads_ok,
            }
        }))
        .with_status(StatusCode::SERVICE_UNAVAILABLE)
    }
}

async fn is_dir(path: &std::path::Path) -> bool {
    tokio::fs::metadata(path)
        .await
        .map(|m| m.is_dir())
        .unwrap_or(false)
}
