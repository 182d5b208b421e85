//! Registry of configured spawn points and their live counters.
//!
//! Points are kept in a concurrent map with a separate registration-order
//! list, so eligibility scans are deterministic. Counter updates go through
//! the map's per-entry locking, which makes concurrent spawn/removal
//! bookkeeping lose no updates.

use crate::config::SpawnPoint;
use bossforge_common::{BossError, BossResult};
use dashmap::DashMap;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Concurrent registry of spawn points.
#[derive(Debug, Default)]
pub struct SpawnPointRegistry {
    points: DashMap<String, SpawnPoint>,
    /// IDs in registration order; also the single synchronization point
    /// between config reloads and counter mutations.
    order: RwLock<Vec<String>>,
    invariant_violations: AtomicU64,
}

impl SpawnPointRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a point. Fails without state change when the ID is taken.
    pub fn register(&self, point: SpawnPoint) -> BossResult<()> {
        let mut order = self.order.write();
        if self.points.contains_key(&point.id) {
            return Err(BossError::DuplicateSpawnPoint(point.id));
        }
        order.push(point.id.clone());
        debug!(point = %point.id, mode = point.mode.tag(), "registered spawn point");
        self.points.insert(point.id.clone(), point);
        Ok(())
    }

    /// Unregisters a point. Unknown IDs are a no-op. Actors already spawned
    /// from the point stay tracked until they terminate.
    pub fn unregister(&self, id: &str) {
        let mut order = self.order.write();
        if self.points.remove(id).is_some() {
            order.retain(|o| o != id);
            debug!(point = id, "unregistered spawn point");
        }
    }

    /// Snapshot of one point.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<SpawnPoint> {
        self.points.get(id).map(|p| p.clone())
    }

    /// Points that may attempt a spawn at `now` (enabled, below capacity,
    /// past cooldown), in registration order.
    #[must_use]
    pub fn eligible_points(&self, now: Instant) -> Vec<SpawnPoint> {
        let order = self.order.read();
        order
            .iter()
            .filter_map(|id| self.points.get(id))
            .filter(|p| p.is_ready(now))
            .map(|p| p.clone())
            .collect()
    }

    /// Snapshot of every point in registration order.
    #[must_use]
    pub fn all_points(&self) -> Vec<SpawnPoint> {
        let order = self.order.read();
        order
            .iter()
            .filter_map(|id| self.points.get(id))
            .map(|p| p.clone())
            .collect()
    }

    /// Increments a point's live counter and stamps its last-spawn time.
    pub fn record_spawn(&self, id: &str, now: Instant) -> BossResult<()> {
        let _order = self.order.read();
        match self.points.get_mut(id) {
            Some(mut point) => {
                point.current_count += 1;
                point.last_spawn = Some(now);
                Ok(())
            }
            None => Err(BossError::SpawnPointNotFound(id.to_owned())),
        }
    }

    /// Decrements a point's live counter, clamping at zero.
    ///
    /// A decrement that would go negative indicates an upstream bookkeeping
    /// bug; it is clamped, logged, and counted rather than propagated.
    /// Unknown IDs are a no-op (the point may have been removed by a reload
    /// while its boss was still alive).
    pub fn record_removal(&self, id: &str) {
        let _order = self.order.read();
        match self.points.get_mut(id) {
            Some(mut point) => {
                if point.current_count == 0 {
                    warn!(point = id, "removal recorded for a point already at zero");
                    self.invariant_violations.fetch_add(1, Ordering::Relaxed);
                } else {
                    point.current_count -= 1;
                }
            }
            None => debug!(point = id, "removal recorded for unregistered point"),
        }
    }

    /// Replaces the configured set of points, preserving runtime state.
    ///
    /// Three-way merge: points absent from `new_points` are dropped, points
    /// present in both take every configured field from `new_points` but
    /// keep their live counter and cooldown stamp, and new points start at
    /// zero. Registration order becomes the order of `new_points`.
    pub fn apply_reload(&self, new_points: Vec<SpawnPoint>) {
        let mut order = self.order.write();

        let mut kept = 0usize;
        let mut added = 0usize;
        let mut new_order = Vec::with_capacity(new_points.len());
        let new_ids: std::collections::HashSet<String> =
            new_points.iter().map(|p| p.id.clone()).collect();

        for mut point in new_points {
            if let Some(existing) = self.points.get(&point.id) {
                point.current_count = existing.current_count;
                point.last_spawn = existing.last_spawn;
                kept += 1;
            } else {
                point.current_count = 0;
                point.last_spawn = None;
                added += 1;
            }
            new_order.push(point.id.clone());
            self.points.insert(point.id.clone(), point);
        }

        let before = self.points.len();
        self.points.retain(|id, _| new_ids.contains(id));
        let removed = before - self.points.len();

        *order = new_order;
        info!(kept, added, removed, "applied spawn point reload");
    }

    /// Sum of live counters across all points.
    #[must_use]
    pub fn active_total(&self) -> u32 {
        self.points.iter().map(|p| p.current_count).sum()
    }

    /// Number of registered points.
    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Whether no points are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Times a counter decrement was clamped at zero.
    #[must_use]
    pub fn invariant_violations(&self) -> u64 {
        self.invariant_violations.load(Ordering::Relaxed)
    }

    /// Drops every point.
    pub fn clear(&self) {
        let mut order = self.order.write();
        self.points.clear();
        order.clear();
    }
}
