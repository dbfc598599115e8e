//! Read-only REST endpoint handlers.
//!
//! Every handler asks the hub for a fresh copy of what it needs; nothing is
//! cached on the HTTP side.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET` | `/api/status` | Population and brick counters |
//! | `GET` | `/api/bricks` | Every brick's state (same shape as `init-state`) |
//! | `GET` | `/api/bricks/{id}` | One brick |

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::response::IntoResponse;
use brickwall_types::{BrickId, BrickView, WallStatus};
use serde::Serialize;

use crate::error::ApiError;
use crate::state::AppState;

/// Body of `GET /api/status`.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    /// Counters reported by the hub.
    #[serde(flatten)]
    pub wall: WallStatus,
    /// Seconds since the server started.
    pub uptime_seconds: u64,
}

/// Report population and brick counters.
pub async fn get_status(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let wall = state.hub.status().await?;
    Ok(Json(StatusResponse {
        wall,
        uptime_seconds: state.uptime_seconds(),
    }))
}

/// Return every brick's state keyed by id.
pub async fn list_bricks(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let snapshot = state.hub.snapshot().await?;
    Ok(Json(snapshot))
}

/// Return a single brick.
pub async fn get_brick(
    State(state): State<Arc<AppState>>,
    Path(raw_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = BrickId::parse(&raw_id).map_err(|e| ApiError::InvalidId(e.to_string()))?;
    let snapshot = state.hub.snapshot().await?;
    let brick = snapshot
        .get(&id)
        .ok_or_else(|| ApiError::NotFound(format!("brick {id}")))?;

    Ok(Json(BrickView {
        fallen: brick.fallen,
        id,
    }))
}
