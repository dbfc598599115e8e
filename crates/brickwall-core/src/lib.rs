//! Authoritative state synchronization for the Brick Wall.
//!
//! Many viewers share one grid of bricks. A click knocks a brick down for
//! everyone and a randomized timer brings it back. This crate owns that
//! state and decides every transition.
//!
//! # Modules
//!
//! - [`config`] -- Configuration loading from `brickwall.yaml` into
//!   strongly-typed structs.
//! - [`registry`] -- The fixed table of bricks and their `fallen` flags.
//! - [`timer`] -- [`ResetScheduler`] seam, reset handles and the delay window.
//! - [`arbiter`] -- Click validation and the per-brick state machine.
//! - [`sessions`] -- Connected sessions, population counter and fan-out.
//! - [`hub`] -- The single task that owns all of the above.
//!
//! [`ResetScheduler`]: timer::ResetScheduler

pub mod arbiter;
pub mod config;
pub mod hub;
pub mod registry;
pub mod sessions;
pub mod timer;

pub use hub::{Hub, HubError, HubHandle, spawn_hub};
