//! Shared application state for the Brick Wall server.
//!
//! [`AppState`] holds nothing authoritative: the wall lives inside the hub
//! task and every handler talks to it through a [`HubHandle`].

use std::path::PathBuf;

use brickwall_core::HubHandle;
use chrono::{DateTime, Utc};

/// Shared state for the Axum application.
///
/// Wrapped in [`Arc`](std::sync::Arc) and injected via Axum's `State`
/// extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Entry point into the hub that owns the wall.
    pub hub: HubHandle,
    /// Directory of presentation assets served as the fallback route.
    pub static_dir: PathBuf,
    /// Wall-clock time the server state was created.
    pub started_at: DateTime<Utc>,
}

impl AppState {
    /// Create application state around a running hub.
    pub fn new(hub: HubHandle, static_dir: impl Into<PathBuf>) -> Self {
        Self {
            hub,
            static_dir: static_dir.into(),
            started_at: Utc::now(),
        }
    }

    /// Whole seconds since the state was created.
    pub fn uptime_seconds(&self) -> u64 {
        let elapsed = Utc::now()
            .signed_duration_since(self.started_at)
            .num_seconds();
        // Negative if the wall clock stepped backwards; treat as 0.
        u64::try_from(elapsed.max(0)).unwrap_or(0)
    }
}
