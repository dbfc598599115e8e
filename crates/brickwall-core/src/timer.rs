//! Scheduled auto-reset of fallen bricks.
//!
//! The arbiter never touches a runtime timer directly. It asks a
//! [`ResetScheduler`] to arrange for a reset of one brick after a delay and
//! stores the returned [`ResetHandle`] on that brick until the reset fires.

use std::time::Duration;

use brickwall_types::BrickId;
use rand::Rng;
use tokio::task::AbortHandle;

use crate::config::ResetConfig;

/// Ownership token for one outstanding scheduled reset.
#[derive(Debug)]
pub struct ResetHandle {
    task: Option<AbortHandle>,
}

impl ResetHandle {
    /// Wrap a spawned timer task.
    pub const fn new(task: AbortHandle) -> Self {
        Self { task: Some(task) }
    }

    /// A handle with no runtime task behind it, for schedulers that drive
    /// resets by other means.
    pub const fn detached() -> Self {
        Self { task: None }
    }

    /// Stop the timer task if it has not fired yet.
    pub fn cancel(self) {
        if let Some(task) = self.task {
            task.abort();
        }
    }
}

/// Arranges for a brick to be reset after a delay.
///
/// Implementations must eventually deliver the fire back to whoever owns the
/// arbiter so that [`Arbiter::on_reset_fire`] runs on the same thread of
/// control as clicks.
///
/// [`Arbiter::on_reset_fire`]: crate::arbiter::Arbiter::on_reset_fire
pub trait ResetScheduler: Send {
    /// Schedule a one-shot reset of `id` after `delay`.
    fn schedule(&mut self, id: BrickId, delay: Duration) -> ResetHandle;
}

/// Closed interval of possible reset delays, in whole milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResetWindow {
    min_ms: u64,
    max_ms: u64,
}

impl ResetWindow {
    /// Build a window; the bounds are swapped if given in the wrong order.
    pub const fn new(min_ms: u64, max_ms: u64) -> Self {
        if min_ms <= max_ms {
            Self { min_ms, max_ms }
        } else {
            Self {
                min_ms: max_ms,
                max_ms: min_ms,
            }
        }
    }

    /// Lower bound.
    pub const fn min(&self) -> Duration {
        Duration::from_millis(self.min_ms)
    }

    /// Upper bound.
    pub const fn max(&self) -> Duration {
        Duration::from_millis(self.max_ms)
    }

    /// Whether `delay` falls inside the window.
    pub fn contains(&self, delay: Duration) -> bool {
        (self.min()..=self.max()).contains(&delay)
    }

    /// Draw a delay uniformly from the window.
    pub fn draw<R: Rng + ?Sized>(&self, rng: &mut R) -> Duration {
        Duration::from_millis(rng.random_range(self.min_ms..=self.max_ms))
    }
}

impl Default for ResetWindow {
    fn default() -> Self {
        Self::from(&ResetConfig::default())
    }
}

impl From<&ResetConfig> for ResetWindow {
    fn from(config: &ResetConfig) -> Self {
        Self::new(config.min_delay_ms, config.max_delay_ms)
    }
}
