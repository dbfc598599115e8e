//! Session broadcaster: connected clients and the population counter.
//!
//! Each session is represented only by the sending half of its outbox. The
//! transport task that owns the receiving half turns events into frames.

use std::collections::HashMap;

use brickwall_types::{ServerEvent, SessionId};
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::registry::Registry;

/// Sending half of one session's outbound event queue.
pub type Outbox = mpsc::UnboundedSender<ServerEvent>;

/// The set of live sessions.
#[derive(Debug, Default)]
pub struct Sessions {
    outboxes: HashMap<SessionId, Outbox>,
    population: u32,
}

impl Sessions {
    /// Create an empty session set with a population of zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current population counter.
    pub const fn population(&self) -> u32 {
        self.population
    }

    /// Number of sessions with a registered outbox.
    pub fn session_count(&self) -> usize {
        self.outboxes.len()
    }

    /// Register a new session.
    ///
    /// Everyone, the newcomer included, receives the updated `user-count`;
    /// then the newcomer alone receives an `init-state` snapshot.
    pub fn connect(&mut self, outbox: Outbox, registry: &Registry) -> SessionId {
        let id = SessionId::new();
        self.outboxes.insert(id, outbox);
        self.population = self.population.saturating_add(1);
        info!(session = %id, population = self.population, "Session connected");

        self.broadcast(&ServerEvent::UserCount(self.population));
        self.send_to(id, ServerEvent::InitState(registry.snapshot()));
        id
    }

    /// Remove a session and announce the new population.
    ///
    /// The counter is decremented even for ids that were never registered,
    /// but never below zero.
    pub fn disconnect(&mut self, id: SessionId) {
        if self.outboxes.remove(&id).is_none() {
            debug!(session = %id, "Disconnect for unregistered session");
        }
        self.population = self.population.saturating_sub(1);
        info!(session = %id, population = self.population, "Session disconnected");

        self.broadcast(&ServerEvent::UserCount(self.population));
    }

    /// Send `event` to every session.
    ///
    /// Sessions whose outbox is closed are pruned from the set; their
    /// transport task reports the disconnect separately.
    pub fn broadcast(&mut self, event: &ServerEvent) -> usize {
        self.outboxes.retain(|id, outbox| {
            let delivered = outbox.send(event.clone()).is_ok();
            if !delivered {
                debug!(session = %id, "Pruning session with closed outbox");
            }
            delivered
        });
        self.outboxes.len()
    }

    /// Send `event` to one session. Returns whether it was delivered.
    pub fn send_to(&mut self, id: SessionId, event: ServerEvent) -> bool {
        let Some(outbox) = self.outboxes.get(&id) else {
            return false;
        };
        if outbox.send(event).is_ok() {
            return true;
        }
        self.outboxes.remove(&id);
        false
    }
}

#[cfg(test)]
mod tests {
    use brickwall_types::BrickId;
    use tokio::sync::mpsc::UnboundedReceiver;

    use super::*;
    use crate::config::GridConfig;

    fn registry() -> Registry {
        Registry::new(GridConfig {
            columns: 3,
            rows: 2,
        })
    }

    fn drain(rx: &mut UnboundedReceiver<ServerEvent>) -> Vec<ServerEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    #[test]
    fn population_starts_at_zero() {
        let sessions = Sessions::new();
        assert_eq!(sessions.population(), 0);
        assert_eq!(sessions.session_count(), 0);
    }

    #[test]
    fn newcomer_gets_count_then_snapshot() {
        let registry = registry();
        let mut sessions = Sessions::new();
        let (tx, mut rx) = mpsc::unbounded_channel();

        sessions.connect(tx, &registry);

        let events = drain(&mut rx);
        assert_eq!(events.len(), 2);
        assert_eq!(events.first(), Some(&ServerEvent::UserCount(1)));
        assert_eq!(events.get(1), Some(&ServerEvent::InitState(registry.snapshot())));
    }

    #[test]
    fn existing_sessions_get_count_but_no_snapshot() {
        let registry = registry();
        let mut sessions = Sessions::new();
        let (tx_a, mut rx_a) = mpsc::unbounded_channel();
        let (tx_b, _rx_b) = mpsc::unbounded_channel();

        sessions.connect(tx_a, &registry);
        let _ = drain(&mut rx_a);
        sessions.connect(tx_b, &registry);

        assert_eq!(drain(&mut rx_a), vec![ServerEvent::UserCount(2)]);
    }

    #[test]
    fn snapshot_reflects_current_truth() {
        let mut registry = registry();
        registry.set_fallen(&BrickId::new(2, 1), true);
        let mut sessions = Sessions::new();
        let (tx, mut rx) = mpsc::unbounded_channel();

        sessions.connect(tx, &registry);

        let snapshot = drain(&mut rx).into_iter().find_map(|e| match e {
            ServerEvent::InitState(s) => Some(s),
            _ => None,
        });
        let fallen: Vec<BrickId> = snapshot
            .unwrap_or_default()
            .into_iter()
            .filter(|(_, s)| s.fallen)
            .map(|(id, _)| id)
            .collect();
        assert_eq!(fallen, vec![BrickId::new(2, 1)]);
    }

    #[test]
    fn disconnect_broadcasts_new_count() {
        let registry = registry();
        let mut sessions = Sessions::new();
        let (tx_a, mut rx_a) = mpsc::unbounded_channel();
        let (tx_b, _rx_b) = mpsc::unbounded_channel();

        sessions.connect(tx_a, &registry);
        let b = sessions.connect(tx_b, &registry);
        let _ = drain(&mut rx_a);

        sessions.disconnect(b);

        assert_eq!(sessions.population(), 1);
        assert_eq!(sessions.session_count(), 1);
        assert_eq!(drain(&mut rx_a), vec![ServerEvent::UserCount(1)]);
    }

    #[test]
    fn population_never_goes_negative() {
        let mut sessions = Sessions::new();
        sessions.disconnect(SessionId::new());
        sessions.disconnect(SessionId::new());
        assert_eq!(sessions.population(), 0);
    }

    #[test]
    fn population_tracks_open_sessions() {
        let registry = registry();
        let mut sessions = Sessions::new();
        let mut ids = Vec::new();
        let mut receivers = Vec::new();
        for _ in 0..5 {
            let (tx, rx) = mpsc::unbounded_channel();
            receivers.push(rx);
            ids.push(sessions.connect(tx, &registry));
        }
        for id in ids.drain(..2) {
            sessions.disconnect(id);
        }
        assert_eq!(sessions.population(), 3);
        assert_eq!(sessions.session_count(), 3);
    }

    #[test]
    fn broadcast_prunes_closed_outboxes() {
        let registry = registry();
        let mut sessions = Sessions::new();
        let (tx_a, rx_a) = mpsc::unbounded_channel();
        let (tx_b, mut rx_b) = mpsc::unbounded_channel();
        sessions.connect(tx_a, &registry);
        sessions.connect(tx_b, &registry);
        drop(rx_a);
        let _ = drain(&mut rx_b);

        let delivered = sessions.broadcast(&ServerEvent::BrickFall(BrickId::new(0, 0)));

        assert_eq!(delivered, 1);
        assert_eq!(sessions.session_count(), 1);
        assert_eq!(sessions.population(), 2);
        assert_eq!(
            drain(&mut rx_b),
            vec![ServerEvent::BrickFall(BrickId::new(0, 0))]
        );
    }
}
