//! HTTP and `WebSocket` transport for the Brick Wall.
//!
//! This crate provides an Axum server that exposes:
//!
//! - **`WebSocket` endpoint** (`/ws`) -- one session per viewer; carries
//!   `user-count`, `init-state`, `brick-fall` and `brick-return` out and
//!   `brick-click` in
//! - **REST endpoints** (`/api/...`) for read-only inspection of the wall
//! - **Static fallback** serving the presentation client's assets
//!
//! # Architecture
//!
//! The server holds no wall state of its own. Each session task registers
//! an outbox with the hub in `brickwall-core` and forwards frames both
//! ways; REST handlers request copies from the hub.

pub mod error;
pub mod handlers;
pub mod router;
pub mod server;
pub mod state;
pub mod ws;

// Re-export primary types for convenience.
pub use router::build_router;
pub use server::{ServerConfig, ServerError, start_server};
pub use state::AppState;
