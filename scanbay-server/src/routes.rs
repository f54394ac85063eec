use axum::{
    Router,
    routing::{get, post},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::handlers;
use crate::state::AppState;

/// Create the application router with all routes and middleware.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/api/scans", post(handlers::submit_scan_handler))
        .route("/api/scans/{task_id}", get(handlers::scan_status_handler))
        .route(
            "/api/results/{domain}",
            get(handlers::scan_results_handler),
        )
        .route(
            "/scan_results/{filename}",
            get(handlers::download_artifact_handler),
        )
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
