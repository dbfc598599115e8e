//! Interaction arbiter: accepts or rejects clicks and drives auto-reset.
//!
//! Per brick the state machine is
//!
//! ```text
//! UP --(accepted click)--> DOWN --(reset fires)--> UP
//! DOWN --(click)--> DOWN   (rejected, nothing queued)
//! ```
//!
//! The arbiter must only be driven from one thread of control. Under that
//! condition the fallen check in [`Arbiter::handle_click`] is race-free and
//! every brick has at most one reset outstanding.

use brickwall_types::{BrickId, ServerEvent};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{debug, info};

use crate::registry::Registry;
use crate::timer::{ResetScheduler, ResetWindow};

/// Decides whether interactions change the wall and owns the registry.
#[derive(Debug)]
pub struct Arbiter<S> {
    registry: Registry,
    scheduler: S,
    window: ResetWindow,
    rng: StdRng,
}

impl<S: ResetScheduler> Arbiter<S> {
    /// Create an arbiter over `registry`.
    ///
    /// With `seed` set the sequence of reset delays is reproducible;
    /// otherwise the RNG is seeded from the operating system.
    pub fn new(registry: Registry, scheduler: S, window: ResetWindow, seed: Option<u64>) -> Self {
        let rng = seed.map_or_else(StdRng::from_os_rng, StdRng::seed_from_u64);
        Self {
            registry,
            scheduler,
            window,
            rng,
        }
    }

    /// Read access to the authoritative state.
    pub const fn registry(&self) -> &Registry {
        &self.registry
    }

    /// The delay window resets are drawn from.
    pub const fn window(&self) -> ResetWindow {
        self.window
    }

    /// Handle a click on `raw_id` from any session.
    ///
    /// Returns the `brick-fall` event to broadcast when the click knocks a
    /// brick down. Malformed ids, unknown ids and clicks on bricks that are
    /// already down return `None` and leave the wall untouched.
    pub fn handle_click(&mut self, raw_id: &str) -> Option<ServerEvent> {
        let id = match BrickId::parse(raw_id) {
            Ok(id) => id,
            Err(e) => {
                debug!(error = %e, "Ignoring click with malformed id");
                return None;
            }
        };

        match self.registry.get(&id) {
            None => {
                debug!(brick = %id, "Ignoring click on unknown brick");
                return None;
            }
            Some(element) if element.is_fallen() => {
                debug!(brick = %id, "Ignoring click on fallen brick");
                return None;
            }
            Some(_) => {}
        }

        self.registry.set_fallen(&id, true);
        let delay = self.window.draw(&mut self.rng);
        let handle = self.scheduler.schedule(id.clone(), delay);
        if let Err(orphan) = self.registry.attach_reset(&id, handle) {
            // Unreachable while the fallen check above holds; never leave a
            // timer without an owner.
            orphan.cancel();
        }

        info!(brick = %id, delay_ms = delay.as_millis(), "Brick fell");
        Some(ServerEvent::BrickFall(id))
    }

    /// Apply a scheduled reset of `id`.
    ///
    /// Returns the `brick-return` event to broadcast, or `None` when the
    /// brick is unknown or already upright (a stale fire).
    pub fn on_reset_fire(&mut self, id: &BrickId) -> Option<ServerEvent> {
        if !self.registry.get(id).is_some_and(|e| e.is_fallen()) {
            debug!(brick = %id, "Ignoring stale reset");
            return None;
        }

        self.registry.set_fallen(id, false);
        info!(brick = %id, "Brick returned");
        Some(ServerEvent::BrickReturn(id.clone()))
    }

    /// Cancel every outstanding reset timer. Returns how many were pending.
    ///
    /// Bricks stay down; this is only used when the owning hub stops.
    pub fn cancel_pending(&mut self) -> usize {
        let pending = self.registry.drain_resets();
        let count = pending.len();
        for handle in pending {
            handle.cancel();
        }
        count
    }
}
