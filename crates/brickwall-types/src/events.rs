//! Wire events exchanged over a session's `WebSocket`.
//!
//! Every frame is a JSON text message of the form
//! `{"event": "<name>", "data": <payload>}`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::ids::BrickId;

/// Publicly visible state of a single brick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct BrickState {
    /// Whether the brick is currently knocked down.
    pub fallen: bool,
}

/// Point-in-time copy of every brick's state, keyed by id.
pub type WallSnapshot = BTreeMap<BrickId, BrickState>;

/// Events pushed from the server to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(tag = "event", content = "data")]
#[ts(export, export_to = "bindings/")]
pub enum ServerEvent {
    /// Number of currently connected sessions. Sent to everyone on every
    /// connect and disconnect.
    #[serde(rename = "user-count")]
    UserCount(u32),
    /// Full wall state, sent once to a newly connected session.
    #[serde(rename = "init-state")]
    InitState(WallSnapshot),
    /// A brick went down.
    #[serde(rename = "brick-fall")]
    BrickFall(BrickId),
    /// A brick came back up.
    #[serde(rename = "brick-return")]
    BrickReturn(BrickId),
}

impl ServerEvent {
    /// The wire name of this event.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::UserCount(_) => "user-count",
            Self::InitState(_) => "init-state",
            Self::BrickFall(_) => "brick-fall",
            Self::BrickReturn(_) => "brick-return",
        }
    }
}

/// Events sent from clients to the server.
///
/// The click payload is kept as a raw string: deciding whether it names a
/// real brick belongs to the arbiter, not to the decoder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(tag = "event", content = "data")]
#[ts(export, export_to = "bindings/")]
pub enum ClientEvent {
    /// Request to knock down the brick with this id.
    #[serde(rename = "brick-click")]
    BrickClick(String),
}

/// Summary served by `GET /api/status`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct WallStatus {
    /// Current population counter.
    pub population: u32,
    /// Number of sessions with a live outbox.
    pub sessions: u32,
    /// Total number of bricks in the wall.
    pub bricks: u32,
    /// Number of bricks currently down.
    pub fallen: u32,
    /// Grid width.
    pub columns: u16,
    /// Grid height.
    pub rows: u16,
}

/// One brick together with its id, served by `GET /api/bricks/{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct BrickView {
    /// The brick's id.
    pub id: BrickId,
    /// Whether the brick is currently knocked down.
    pub fallen: bool,
}
