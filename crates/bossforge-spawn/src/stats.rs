//! Operator-facing counters for the spawn system.

use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// Monotonic counters updated by the orchestrator and its periodic tasks.
#[derive(Debug, Default)]
pub struct StatCounters {
    spawned: AtomicU64,
    killed: AtomicU64,
    despawned: AtomicU64,
    refresh_ticks: AtomicU64,
    health_ticks: AtomicU64,
    last_refresh: Mutex<Option<Instant>>,
}

impl StatCounters {
    /// Creates zeroed counters.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a successful spawn.
    pub fn record_spawn(&self) {
        self.spawned.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a kill.
    pub fn record_kill(&self) {
        self.killed.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a despawn (natural, health-evicted, or shutdown).
    pub fn record_despawn(&self) {
        self.despawned.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a completed refresh tick.
    pub fn record_refresh_tick(&self, now: Instant) {
        self.refresh_ticks.fetch_add(1, Ordering::Relaxed);
        *self.last_refresh.lock() = Some(now);
    }

    /// Records a completed health tick.
    pub fn record_health_tick(&self) {
        self.health_ticks.fetch_add(1, Ordering::Relaxed);
    }

    /// Total bosses spawned.
    #[must_use]
    pub fn spawned(&self) -> u64 {
        self.spawned.load(Ordering::Relaxed)
    }

    /// Total bosses killed by participants.
    #[must_use]
    pub fn killed(&self) -> u64 {
        self.killed.load(Ordering::Relaxed)
    }

    /// Total bosses despawned.
    #[must_use]
    pub fn despawned(&self) -> u64 {
        self.despawned.load(Ordering::Relaxed)
    }

    /// Completed refresh ticks.
    #[must_use]
    pub fn refresh_ticks(&self) -> u64 {
        self.refresh_ticks.load(Ordering::Relaxed)
    }

    /// Completed health ticks.
    #[must_use]
    pub fn health_ticks(&self) -> u64 {
        self.health_ticks.load(Ordering::Relaxed)
    }

    /// When the last refresh tick completed.
    #[must_use]
    pub fn last_refresh(&self) -> Option<Instant> {
        *self.last_refresh.lock()
    }
}

/// Point-in-time snapshot for operator tooling.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpawnStats {
    /// Total bosses spawned since startup
    pub total_spawned: u64,
    /// Total bosses killed
    pub total_killed: u64,
    /// Total bosses despawned
    pub total_despawned: u64,
    /// Bosses currently live
    pub active: usize,
    /// Completed refresh ticks
    pub refresh_ticks: u64,
    /// Completed health ticks
    pub health_ticks: u64,
    /// Selection cache hit rate in `[0, 1]`
    pub cache_hit_rate: f64,
    /// Bookkeeping invariant violations observed (counter clamps)
    pub invariant_violations: u64,
}
