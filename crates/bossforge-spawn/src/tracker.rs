//! Bookkeeping for currently-live bosses.
//!
//! One record per live actor, indexed forward by boss ID and in reverse by
//! actor handle. Removal is idempotent so the refresh scheduler, the health
//! monitor, and externally reported deaths can race without double-counting.

use bossforge_common::{ActorHandle, BossId, WorldId};
use dashmap::DashMap;
use glam::DVec3;
use std::time::{Duration, Instant};
use tracing::debug;

/// Lifecycle of a tracked boss.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BossState {
    /// Created but not yet registered
    Spawning,
    /// Live in the world
    Active,
    /// Terminal: killed by a participant
    Killed,
    /// Terminal: removed for any other reason
    Despawned,
}

/// A live boss and where it came from.
#[derive(Debug, Clone)]
pub struct ActiveBossRecord {
    /// Unique boss ID
    pub id: BossId,
    /// Owning spawn point
    pub spawn_point: String,
    /// External actor handle
    pub handle: ActorHandle,
    /// Actor template it was materialized from
    pub template: String,
    /// Difficulty tier
    pub tier: u8,
    /// World it lives in
    pub world: WorldId,
    /// Where it was placed
    pub pos: DVec3,
    /// When it was spawned
    pub spawned_at: Instant,
    /// Current lifecycle state
    pub state: BossState,
}

impl ActiveBossRecord {
    /// Creates a record in the `Spawning` state.
    #[must_use]
    pub fn new(
        spawn_point: impl Into<String>,
        handle: ActorHandle,
        template: impl Into<String>,
        tier: u8,
        world: WorldId,
        pos: DVec3,
        now: Instant,
    ) -> Self {
        Self {
            id: BossId::new(),
            spawn_point: spawn_point.into(),
            handle,
            template: template.into(),
            tier,
            world,
            pos,
            spawned_at: now,
            state: BossState::Spawning,
        }
    }

    /// Age of this boss at `now`.
    #[must_use]
    pub fn age(&self, now: Instant) -> Duration {
        now.duration_since(self.spawned_at)
    }
}

/// Concurrent map of live bosses with a reverse handle index.
#[derive(Debug, Default)]
pub struct BossLifecycleTracker {
    records: DashMap<BossId, ActiveBossRecord>,
    by_handle: DashMap<ActorHandle, BossId>,
}

impl BossLifecycleTracker {
    /// Creates an empty tracker.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a freshly spawned boss, transitioning it to `Active` and
    /// inserting it into both indices.
    pub fn register(&self, mut record: ActiveBossRecord) -> BossId {
        record.state = BossState::Active;
        let id = record.id;
        self.by_handle.insert(record.handle, id);
        debug!(boss = %id, point = %record.spawn_point, "tracking boss");
        self.records.insert(id, record);
        id
    }

    /// Snapshot of one record.
    #[must_use]
    pub fn get(&self, id: BossId) -> Option<ActiveBossRecord> {
        self.records.get(&id).map(|r| r.clone())
    }

    /// Resolves an actor handle to its boss ID.
    #[must_use]
    pub fn id_for_handle(&self, handle: ActorHandle) -> Option<BossId> {
        self.by_handle.get(&handle).map(|id| *id)
    }

    /// Marks a boss killed and removes it from both indices.
    ///
    /// Returns the final record, or `None` when the boss was already gone
    /// (idempotent; the second caller must not decrement anything).
    pub fn mark_killed(&self, id: BossId) -> Option<ActiveBossRecord> {
        let mut record = self.remove(id)?;
        record.state = BossState::Killed;
        debug!(boss = %id, "boss killed");
        Some(record)
    }

    /// Marks a boss despawned and removes it from both indices. Idempotent
    /// in the same way as [`Self::mark_killed`].
    pub fn mark_despawned(&self, id: BossId) -> Option<ActiveBossRecord> {
        let mut record = self.remove(id)?;
        record.state = BossState::Despawned;
        debug!(boss = %id, "boss despawned");
        Some(record)
    }

    fn remove(&self, id: BossId) -> Option<ActiveBossRecord> {
        let (_, record) = self.records.remove(&id)?;
        self.by_handle.remove(&record.handle);
        Some(record)
    }

    /// Number of live bosses.
    #[must_use]
    pub fn active_count(&self) -> usize {
        self.records.len()
    }

    /// Live bosses owned by one spawn point.
    #[must_use]
    pub fn count_for_point(&self, spawn_point: &str) -> usize {
        self.records
            .iter()
            .filter(|r| r.spawn_point == spawn_point)
            .count()
    }

    /// Snapshot of every live record.
    #[must_use]
    pub fn all_records(&self) -> Vec<ActiveBossRecord> {
        self.records.iter().map(|r| r.clone()).collect()
    }

    /// Live records older than `grace` at `now`. Used by the health monitor
    /// so freshly spawned actors are not checked mid-initialization.
    #[must_use]
    pub fn records_older_than(&self, grace: Duration, now: Instant) -> Vec<ActiveBossRecord> {
        self.records
            .iter()
            .filter(|r| r.age(now) >= grace)
            .map(|r| r.clone())
            .collect()
    }

    /// Removes and returns every record, marked despawned. Used on shutdown.
    pub fn drain(&self) -> Vec<ActiveBossRecord> {
        let ids: Vec<BossId> = self.records.iter().map(|r| r.id).collect();
        ids.into_iter()
            .filter_map(|id| self.mark_despawned(id))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(point: &str, handle: u64) -> ActiveBossRecord {
        ActiveBossRecord::new(
            point,
            ActorHandle::from_raw(handle),
            "king",
            2,
            WorldId::from("overworld"),
            DVec3::new(0.5, 65.0, 0.5),
            Instant::now(),
        )
    }

    #[test]
    fn test_register_activates_and_indexes_both_ways() {
        let tracker = BossLifecycleTracker::new();
        let id = tracker.register(record("p1", 7));

        let got = tracker.get(id).unwrap();
        assert_eq!(got.state, BossState::Active);
        assert_eq!(tracker.id_for_handle(ActorHandle::from_raw(7)), Some(id));
        assert_eq!(tracker.active_count(), 1);
    }

    #[test]
    fn test_mark_killed_removes_from_both_indices() {
        let tracker = BossLifecycleTracker::new();
        let id = tracker.register(record("p1", 7));

        let dead = tracker.mark_killed(id).unwrap();
        assert_eq!(dead.state, BossState::Killed);
        assert!(tracker.get(id).is_none());
        assert!(tracker.id_for_handle(ActorHandle::from_raw(7)).is_none());
    }

    #[test]
    fn test_double_removal_is_noop() {
        let tracker = BossLifecycleTracker::new();
        let id = tracker.register(record("p1", 7));

        assert!(tracker.mark_despawned(id).is_some());
        assert!(tracker.mark_despawned(id).is_none());
        assert!(tracker.mark_killed(id).is_none());
    }

    #[test]
    fn test_count_for_point() {
        let tracker = BossLifecycleTracker::new();
        tracker.register(record("p1", 1));
        tracker.register(record("p1", 2));
        tracker.register(record("p2", 3));

        assert_eq!(tracker.count_for_point("p1"), 2);
        assert_eq!(tracker.count_for_point("p2"), 1);
        assert_eq!(tracker.count_for_point("p3"), 0);
    }

    #[test]
    fn test_grace_period_filter() {
        let tracker = BossLifecycleTracker::new();
        let now = Instant::now();
        let mut old = record("p1", 1);
        old.spawned_at = now - Duration::from_secs(60);
        tracker.register(old);
        tracker.register(record("p1", 2));

        let due = tracker.records_older_than(Duration::from_secs(5), now);
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].handle, ActorHandle::from_raw(1));
    }

    #[test]
    fn test_drain_marks_everything_despawned() {
        let tracker = BossLifecycleTracker::new();
        tracker.register(record("p1", 1));
        tracker.register(record("p2", 2));

        let drained = tracker.drain();
        assert_eq!(drained.len(), 2);
        assert!(drained.iter().all(|r| r.state == BossState::Despawned));
        assert_eq!(tracker.active_count(), 0);
    }
}
