//! The hub: single owner of all mutable wall state.
//!
//! One task owns the [`Arbiter`] (and through it the registry) together with
//! the [`Sessions`]. Connects, disconnects, clicks and reset fires all arrive
//! as [`HubCommand`]s on one queue and each runs to completion before the
//! next is taken, so no lock guards the registry.
//!
//! Reset timers are tokio tasks holding a weak sender into the same queue.
//! They never keep the hub alive; on [`HubHandle::shutdown`], or once every
//! handle is dropped, the hub stops and aborts whatever timers are still
//! pending.

use std::time::Duration;

use brickwall_types::{BrickId, SessionId, WallSnapshot, WallStatus};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::arbiter::Arbiter;
use crate::config::{GridConfig, WallConfig};
use crate::registry::Registry;
use crate::sessions::{Outbox, Sessions};
use crate::timer::{ResetHandle, ResetScheduler, ResetWindow};

/// Errors returned by [`HubHandle`] calls.
#[derive(Debug, thiserror::Error)]
pub enum HubError {
    /// The hub task has stopped and no longer accepts commands.
    #[error("hub is not running")]
    Stopped,
}

/// Commands processed by the hub, one at a time, in arrival order.
#[derive(Debug)]
pub enum HubCommand {
    /// A session opened.
    Connect {
        /// Where to deliver the session's events.
        outbox: Outbox,
        /// Receives the id assigned to the session.
        reply: oneshot::Sender<SessionId>,
    },
    /// A session closed.
    Disconnect(SessionId),
    /// A client clicked a brick. The id is untrusted.
    Click(String),
    /// A scheduled reset elapsed.
    ResetFired(BrickId),
    /// Report counters.
    Status(oneshot::Sender<WallStatus>),
    /// Report every brick's state.
    Snapshot(oneshot::Sender<WallSnapshot>),
    /// Stop processing commands and drop every session outbox.
    Shutdown,
}

/// Schedules resets as tokio sleep tasks that post back into the hub.
#[derive(Debug)]
pub struct TokioResetScheduler {
    commands: mpsc::WeakUnboundedSender<HubCommand>,
}

impl ResetScheduler for TokioResetScheduler {
    fn schedule(&mut self, id: BrickId, delay: Duration) -> ResetHandle {
        let commands = self.commands.clone();
        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            match commands.upgrade() {
                Some(tx) => {
                    let _ = tx.send(HubCommand::ResetFired(id));
                }
                None => debug!(brick = %id, "Hub gone before reset fired"),
            }
        });
        ResetHandle::new(task.abort_handle())
    }
}

/// Cloneable entry point into a running hub.
#[derive(Debug, Clone)]
pub struct HubHandle {
    commands: mpsc::UnboundedSender<HubCommand>,
}

impl HubHandle {
    fn send(&self, command: HubCommand) -> Result<(), HubError> {
        self.commands.send(command).map_err(|_closed| HubError::Stopped)
    }

    /// Register a session whose events go to `outbox`.
    ///
    /// By the time this returns, the outbox already holds the session's
    /// `user-count` and `init-state` events.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::Stopped`] if the hub is not running.
    pub async fn connect(&self, outbox: Outbox) -> Result<SessionId, HubError> {
        let (reply, rx) = oneshot::channel();
        self.send(HubCommand::Connect { outbox, reply })?;
        rx.await.map_err(|_dropped| HubError::Stopped)
    }

    /// Report that a session closed.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::Stopped`] if the hub is not running.
    pub fn disconnect(&self, session: SessionId) -> Result<(), HubError> {
        self.send(HubCommand::Disconnect(session))
    }

    /// Forward a client's click.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::Stopped`] if the hub is not running.
    pub fn click(&self, raw_id: impl Into<String>) -> Result<(), HubError> {
        self.send(HubCommand::Click(raw_id.into()))
    }

    /// Fetch the current counters.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::Stopped`] if the hub is not running.
    pub async fn status(&self) -> Result<WallStatus, HubError> {
        let (reply, rx) = oneshot::channel();
        self.send(HubCommand::Status(reply))?;
        rx.await.map_err(|_dropped| HubError::Stopped)
    }

    /// Fetch a copy of every brick's state.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::Stopped`] if the hub is not running.
    pub async fn snapshot(&self) -> Result<WallSnapshot, HubError> {
        let (reply, rx) = oneshot::channel();
        self.send(HubCommand::Snapshot(reply))?;
        rx.await.map_err(|_dropped| HubError::Stopped)
    }

    /// Ask the hub to stop. Commands queued before this one are still
    /// processed; session outboxes close once the hub exits.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::Stopped`] if the hub is not running.
    pub fn shutdown(&self) -> Result<(), HubError> {
        self.send(HubCommand::Shutdown)
    }
}

/// The task-owned state machine behind a [`HubHandle`].
#[derive(Debug)]
pub struct Hub {
    arbiter: Arbiter<TokioResetScheduler>,
    sessions: Sessions,
    grid: GridConfig,
    commands: mpsc::UnboundedReceiver<HubCommand>,
}

impl Hub {
    /// Build a hub and the handle that drives it.
    pub fn new(config: &WallConfig) -> (Self, HubHandle) {
        let (tx, rx) = mpsc::unbounded_channel();
        let scheduler = TokioResetScheduler {
            commands: tx.downgrade(),
        };
        let arbiter = Arbiter::new(
            Registry::new(config.grid),
            scheduler,
            ResetWindow::from(&config.reset),
            config.reset.seed,
        );
        let hub = Self {
            arbiter,
            sessions: Sessions::new(),
            grid: config.grid,
            commands: rx,
        };
        (hub, HubHandle { commands: tx })
    }

    /// Process commands until [`HubHandle::shutdown`] is called or every
    /// handle has been dropped.
    pub async fn run(mut self) {
        info!(
            bricks = self.arbiter.registry().len(),
            min_delay_ms = self.arbiter.window().min().as_millis(),
            max_delay_ms = self.arbiter.window().max().as_millis(),
            "Hub started"
        );

        while let Some(command) = self.commands.recv().await {
            if matches!(command, HubCommand::Shutdown) {
                break;
            }
            self.dispatch(command);
        }

        let cancelled = self.arbiter.cancel_pending();
        info!(cancelled_resets = cancelled, "Hub stopped");
    }

    fn dispatch(&mut self, command: HubCommand) {
        match command {
            HubCommand::Connect { outbox, reply } => {
                let id = self.sessions.connect(outbox, self.arbiter.registry());
                if reply.send(id).is_err() {
                    debug!(session = %id, "Connect caller went away, dropping session");
                    self.sessions.disconnect(id);
                }
            }
            HubCommand::Disconnect(id) => self.sessions.disconnect(id),
            HubCommand::Click(raw_id) => {
                if let Some(event) = self.arbiter.handle_click(&raw_id) {
                    self.sessions.broadcast(&event);
                }
            }
            HubCommand::ResetFired(id) => {
                if let Some(event) = self.arbiter.on_reset_fire(&id) {
                    self.sessions.broadcast(&event);
                }
            }
            HubCommand::Status(reply) => {
                if reply.send(self.status()).is_err() {
                    debug!("Status caller went away");
                }
            }
            HubCommand::Snapshot(reply) => {
                if reply.send(self.arbiter.registry().snapshot()).is_err() {
                    debug!("Snapshot caller went away");
                }
            }
            HubCommand::Shutdown => {}
        }
    }

    fn status(&self) -> WallStatus {
        let registry = self.arbiter.registry();
        WallStatus {
            population: self.sessions.population(),
            sessions: u32::try_from(self.sessions.session_count()).unwrap_or(u32::MAX),
            bricks: u32::try_from(registry.len()).unwrap_or(u32::MAX),
            fallen: u32::try_from(registry.fallen_count()).unwrap_or(u32::MAX),
            columns: self.grid.columns,
            rows: self.grid.rows,
        }
    }
}

/// Build a hub from `config` and run it on a background task.
pub fn spawn_hub(config: &WallConfig) -> (HubHandle, JoinHandle<()>) {
    let (hub, handle) = Hub::new(config);
    let task = tokio::spawn(hub.run());
    (handle, task)
}
