//! Axum router construction.
//!
//! Assembles the `WebSocket` endpoint, the REST endpoints and the static
//! asset fallback into a single [`Router`] with CORS enabled.

use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;
use crate::ws;

/// Build the complete Axum router.
///
/// The router includes:
/// - `GET /ws` -- one `WebSocket` session per client
/// - `GET /api/status` -- population and brick counters
/// - `GET /api/bricks` -- full wall snapshot
/// - `GET /api/bricks/{id}` -- single brick
/// - everything else -- files from the configured static directory
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let assets = ServeDir::new(&state.static_dir);

    Router::new()
        // WebSocket
        .route("/ws", get(ws::ws_wall))
        // REST API
        .route("/api/status", get(handlers::get_status))
        .route("/api/bricks", get(handlers::list_bricks))
        .route("/api/bricks/{id}", get(handlers::get_brick))
        // Presentation client
        .fallback_service(assets)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
