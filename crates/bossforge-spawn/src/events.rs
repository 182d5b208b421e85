//! Boss lifecycle events and the fire-and-forget event bus.

use bossforge_common::{ActorHandle, BossId, CellPos, WorldId};
use crossbeam_channel::{bounded, Receiver, Sender};
use serde::{Deserialize, Serialize};

/// Events emitted by the spawn core.
///
/// Consumed by reward, persistence, and announcement collaborators. The core
/// never blocks on or inspects the outcome of publication.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum BossEvent {
    /// A boss was materialized into the world
    Spawned {
        /// Record ID
        boss: BossId,
        /// Owning spawn point
        spawn_point: String,
        /// Host actor handle
        handle: ActorHandle,
        /// Template the actor was built from
        template: String,
        /// Difficulty tier (1-4)
        tier: u8,
        /// World the boss spawned in
        world: WorldId,
        /// Cell the boss spawned on
        pos: CellPos,
    },
    /// A boss was killed by a participant
    Killed {
        /// Record ID
        boss: BossId,
        /// Owning spawn point
        spawn_point: String,
        /// Killer description supplied by the host (name or ID)
        killed_by: String,
        /// Difficulty tier
        tier: u8,
    },
    /// A boss despawned naturally or was evicted by the health monitor
    Despawned {
        /// Record ID
        boss: BossId,
        /// Owning spawn point
        spawn_point: String,
        /// Why the boss went away ("despawned", "invalid", "shutdown")
        reason: String,
    },
}

/// Sink for boss lifecycle events.
pub trait EventSink: Send + Sync {
    /// Publishes one event. Must not block.
    fn publish(&self, event: BossEvent);
}

/// Bounded, non-blocking event bus backed by a crossbeam channel.
///
/// If the channel is full the event is dropped; slow consumers must not be
/// able to stall a scheduler tick.
#[derive(Debug)]
pub struct EventBus {
    sender: Sender<BossEvent>,
    receiver: Receiver<BossEvent>,
    capacity: usize,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(1024)
    }
}

impl EventBus {
    /// Creates a new event bus with the given capacity.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, receiver) = bounded(capacity);
        Self {
            sender,
            receiver,
            capacity,
        }
    }

    /// Drains all pending events.
    pub fn drain(&self) -> Vec<BossEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.receiver.try_recv() {
            events.push(event);
        }
        events
    }

    /// Number of events waiting to be drained.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.receiver.len()
    }

    /// Channel capacity.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns a cloneable receiver for a consumer task.
    #[must_use]
    pub fn subscribe(&self) -> Receiver<BossEvent> {
        self.receiver.clone()
    }
}

impl EventSink for EventBus {
    fn publish(&self, event: BossEvent) {
        // Non-blocking send; if full, the event is dropped.
        let _ = self.sender.try_send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn despawn_event(n: u64) -> BossEvent {
        BossEvent::Despawned {
            boss: BossId::from_raw(n),
            spawn_point: "p1".into(),
            reason: "despawned".into(),
        }
    }

    #[test]
    fn test_publish_and_drain() {
        let bus = EventBus::new(8);
        bus.publish(despawn_event(1));
        bus.publish(despawn_event(2));

        let events = bus.drain();
        assert_eq!(events.len(), 2);
        assert_eq!(bus.pending(), 0);
    }

    #[test]
    fn test_full_bus_drops_instead_of_blocking() {
        let bus = EventBus::new(2);
        for n in 0..10 {
            bus.publish(despawn_event(n));
        }
        // Only the first two fit; the rest were dropped silently.
        assert_eq!(bus.drain().len(), 2);
    }
}
