//! Shared type definitions for the Brick Wall sync service.
//!
//! Wire types flow downstream to `TypeScript` via `ts-rs` for the
//! presentation client.
//!
//! # Modules
//!
//! - [`ids`] -- brick and session identifiers
//! - [`events`] -- server/client events and REST payloads

pub mod events;
pub mod ids;

pub use events::{BrickState, BrickView, ClientEvent, ServerEvent, WallSnapshot, WallStatus};
pub use ids::{BrickId, BrickIdError, SessionId};
