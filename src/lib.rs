pub mod auth;
pub mod cli;
pub mod config;
pub mod error;
pub mod handlers;
pub mod media;
pub mod middleware;
pub mod models;
pub mod state;
pub mod store;

use axum::{
    extract::DefaultBodyLimit,
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};

use crate::error::ApiError;
use crate::state::AppState;

/// Build the full router for `state`.
pub fn app(state: AppState) -> Router {
    let mut router = Router::new()
        // Public
        .route("/", get(handlers::root_get))
        .route("/health", get(handlers::health_get))
        .merge(public_routes())
        // Admin token required
        .merge(protected_routes(state.clone()))
        // Static uploads
        .nest_service(
            &format!("/{}", media::UPLOADS_ROUTE),
            ServeDir::new(state.config.storage.uploads_dir.clone()),
        )
        .fallback(not_found);

    router = match state.config.server.max_upload_bytes {
        Some(limit) => router.layer(DefaultBodyLimit::max(limit)),
        None => router.layer(DefaultBodyLimit::disable()),
    };

    if state.config.server.enable_cors {
        router = router.layer(CorsLayer::permissive());
    }

    router.layer(TraceLayer::new_for_http()).with_state(state)
}

fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/donate", post(handlers::donate_post))
        .route("/media", get(handlers::media_get))
        .route("/admin/login", post(handlers::login_post))
}

fn protected_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/donations", get(handlers::donations_get))
        .route("/upload", post(handlers::upload_post))
        .route_layer(from_fn_with_state(state, middleware::require_admin))
}

async fn not_found() -> ApiError {
    ApiError::not_found("Not found")
}

/// Serve `state` on `listener` until `shutdown` resolves.
pub async fn serve<F>(state: AppState, listener: TcpListener, shutdown: F) -> anyhow::Result<()>
where
    F: std::future::Future<Output = ()> + Send + 'static,
{
    state.prepare_storage().await?;

    let addr = listener.local_addr()?;
    tracing::info!(
        %addr,
        public_url = %state.config.public_url(),
        data_dir = %state.config.storage.data_dir.display(),
        uploads_dir = %state.config.storage.uploads_dir.display(),
        "donation server listening"
    );

    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown)
        .await?;

    tracing::info!("server stopped");
    Ok(())
}

/// Resolves on Ctrl-C, or SIGTERM on unix.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("shutdown signal received");
}
