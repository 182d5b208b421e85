//! Health monitoring: reclaiming capacity from silently vanished actors.

use crate::ports::ActorSpawner;
use crate::tracker::BossLifecycleTracker;
use bossforge_common::BossId;
use std::time::{Duration, Instant};
use tracing::warn;

/// Seconds a fresh boss is exempt from health checks, so an actor still
/// initializing in the host is not mistaken for a dead one.
pub const HEALTH_GRACE_SECS: u64 = 5;
/// Default seconds between health sweeps.
pub const DEFAULT_HEALTH_INTERVAL_SECS: u64 = 5;

/// Checks tracked bosses for validity against the actor port.
#[derive(Debug, Clone, Copy)]
pub struct HealthMonitor {
    grace: Duration,
}

impl Default for HealthMonitor {
    fn default() -> Self {
        Self::new()
    }
}

impl HealthMonitor {
    /// Monitor with the default grace period.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            grace: Duration::from_secs(HEALTH_GRACE_SECS),
        }
    }

    /// Monitor with a custom grace period.
    #[must_use]
    pub const fn with_grace(grace: Duration) -> Self {
        Self { grace }
    }

    /// The configured grace period.
    #[must_use]
    pub const fn grace(&self) -> Duration {
        self.grace
    }

    /// IDs of bosses past their grace period whose actor handle is no
    /// longer valid. The caller despawns them.
    #[must_use]
    pub fn sweep(
        &self,
        tracker: &BossLifecycleTracker,
        spawner: &dyn ActorSpawner,
        now: Instant,
    ) -> Vec<BossId> {
        let mut invalid = Vec::new();
        for record in tracker.records_older_than(self.grace, now) {
            if !spawner.is_valid(record.handle) {
                warn!(boss = %record.id, point = %record.spawn_point, "boss actor no longer valid");
                invalid.push(record.id);
            }
        }
        invalid
    }
}
