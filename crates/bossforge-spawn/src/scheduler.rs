//! The spawn orchestrator: admission control, per-point spawn attempts, and
//! lifecycle callbacks.
//!
//! One instance owns the registry, tracker, cache, strategies, and scorer,
//! and is shared by reference with the two periodic tasks. Per-point failures
//! are isolated: a point that finds no candidate this tick is skipped and
//! retried next tick, never aborting the rest of the scan.

use crate::cache::{CacheKey, SelectionCache};
use crate::config::{RefreshConfig, SpawnPoint};
use crate::criteria::SelectionCriteria;
use crate::events::{BossEvent, EventSink};
use crate::monitor::HealthMonitor;
use crate::ports::{ActorSpawner, WorldQuery};
use crate::registry::SpawnPointRegistry;
use crate::safety::SafetyAnalyzer;
use crate::scorer::{LocationScorer, ScoredCandidate};
use crate::stats::{SpawnStats, StatCounters};
use crate::strategy::{CandidateBatch, StrategyRegistry};
use crate::tracker::{ActiveBossRecord, BossLifecycleTracker};
use bossforge_common::{ActorHandle, BossError, BossResult};
use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Candidates requested from a strategy per attempt.
const MAX_CANDIDATES: usize = 5;

/// Global scalars that gate every tick. Swapped atomically on reload.
#[derive(Debug, Clone, Copy)]
pub struct RefreshSettings {
    /// Whole system on/off switch
    pub enabled: bool,
    /// Seconds between refresh ticks
    pub check_interval_secs: u64,
    /// Global cap on concurrently active bosses
    pub max_active: u32,
    /// Minimum online participants before any spawn attempt
    pub min_participants: u32,
}

impl From<&RefreshConfig> for RefreshSettings {
    fn from(config: &RefreshConfig) -> Self {
        Self {
            enabled: config.enabled,
            check_interval_secs: config.check_interval_secs,
            max_active: config.max_active,
            min_participants: config.min_participants,
        }
    }
}

/// Owns all spawn state and drives it from the periodic tasks.
pub struct SpawnOrchestrator {
    world: Arc<dyn WorldQuery>,
    spawner: Arc<dyn ActorSpawner>,
    events: Arc<dyn EventSink>,
    registry: SpawnPointRegistry,
    tracker: BossLifecycleTracker,
    strategies: StrategyRegistry,
    safety: SafetyAnalyzer,
    scorer: LocationScorer,
    monitor: HealthMonitor,
    cache: SelectionCache,
    criteria: SelectionCriteria,
    settings: RwLock<RefreshSettings>,
    stats: StatCounters,
    accepting: AtomicBool,
}

impl SpawnOrchestrator {
    /// Builds an orchestrator from a loaded config and the collaborator
    /// ports. Invalid points in the config are skipped with a log line.
    #[must_use]
    pub fn new(
        config: &RefreshConfig,
        criteria: SelectionCriteria,
        world: Arc<dyn WorldQuery>,
        spawner: Arc<dyn ActorSpawner>,
        events: Arc<dyn EventSink>,
    ) -> Self {
        let registry = SpawnPointRegistry::new();
        for point in config.valid_points() {
            // IDs are deduplicated by config validation; a clash here only
            // happens with a hand-built config and is safe to skip.
            if let Err(e) = registry.register(point) {
                warn!("skipping point at startup: {e}");
            }
        }
        let cache = SelectionCache::new(criteria.cache_ttl(), criteria.max_cache_size);
        Self {
            world,
            spawner,
            events,
            registry,
            tracker: BossLifecycleTracker::new(),
            strategies: StrategyRegistry::with_defaults(),
            safety: SafetyAnalyzer::new(),
            scorer: LocationScorer::new(),
            monitor: HealthMonitor::new(),
            cache,
            criteria,
            settings: RwLock::new(RefreshSettings::from(config)),
            stats: StatCounters::new(),
            accepting: AtomicBool::new(true),
        }
    }

    /// One refresh pass: admission control, then one spawn attempt per
    /// eligible point in registration order, stopping once the global cap
    /// is reached.
    pub fn refresh_tick(&self) {
        if !self.accepting.load(Ordering::Acquire) {
            return;
        }
        let settings = *self.settings.read();
        if !settings.enabled {
            return;
        }
        let now = Instant::now();
        self.stats.record_refresh_tick(now);

        let online = self.world.participant_count() as u32;
        if online < settings.min_participants {
            debug!(online, required = settings.min_participants, "not enough participants, skipping tick");
            return;
        }
        if self.tracker.active_count() as u32 >= settings.max_active {
            debug!(active = self.tracker.active_count(), "global boss cap reached, skipping tick");
            return;
        }

        for point in self.registry.eligible_points(now) {
            if self.tracker.active_count() as u32 >= settings.max_active {
                debug!("global boss cap reached mid-tick, stopping early");
                break;
            }
            match self.attempt_spawn(&point, now) {
                Ok(handle) => {
                    info!(point = %point.id, %handle, template = %point.template, "spawned boss");
                }
                Err(
                    e @ (BossError::NoCandidateFound(_) | BossError::CandidateRejected { .. }),
                ) => {
                    // normal outcome, retried next tick
                    debug!(point = %point.id, "no spawn this tick: {e}");
                }
                Err(e) => {
                    warn!(point = %point.id, "spawn attempt failed: {e}");
                }
            }
        }
    }

    /// Attempts one spawn for a point. Every failure mode maps to an error
    /// so the caller can log and move on.
    fn attempt_spawn(&self, point: &SpawnPoint, now: Instant) -> BossResult<ActorHandle> {
        let strategy = self
            .strategies
            .for_mode(point.mode)
            .ok_or_else(|| BossError::NoCandidateFound(point.id.clone()))?;

        let batch = strategy.generate(self.world.as_ref(), point, MAX_CANDIDATES);
        if batch.positions.is_empty() {
            return Err(BossError::NoCandidateFound(point.id.clone()));
        }

        let selected = self.select(strategy.tag(), point, &batch, now).ok_or(
            BossError::CandidateRejected {
                point: point.id.clone(),
                min_score: point.min_score,
            },
        )?;

        // the candidate carries its own world; for near-participant and
        // region points it can differ from the anchor world
        let wid = selected.world.clone();
        // place the actor standing on the ground cell beneath the selection
        let spawn_pos = selected.pos.below(1).stand_position();
        let handle = self
            .spawner
            .spawn(&point.template, &wid, spawn_pos, point.tier)
            .ok_or_else(|| BossError::ActorSpawnFailed(point.template.clone()))?;

        let record = ActiveBossRecord::new(
            &point.id, handle, &point.template, point.tier, wid.clone(), spawn_pos, now,
        );
        let boss = self.tracker.register(record);
        if let Err(e) = self.registry.record_spawn(&point.id, now) {
            // a concurrent reload dropped the point between the eligibility
            // scan and here; unwind the tracker entry instead of leaking it
            self.tracker.mark_despawned(boss);
            return Err(e);
        }
        self.stats.record_spawn();
        self.events.publish(BossEvent::Spawned {
            boss,
            spawn_point: point.id.clone(),
            handle,
            template: point.template.clone(),
            tier: point.tier,
            world: wid,
            pos: selected.pos,
        });
        Ok(handle)
    }

    /// Safety-filter then score a candidate batch, going through the cache
    /// when it is enabled.
    fn select(
        &self,
        strategy_tag: &str,
        point: &SpawnPoint,
        batch: &CandidateBatch,
        now: Instant,
    ) -> Option<ScoredCandidate> {
        if !self.criteria.cache_enabled {
            return self.score_batch(point, batch);
        }
        let key = CacheKey::new(strategy_tag, batch.positions.len());
        if let Some(cached) = self.cache.get(&key, now) {
            debug!(point = %point.id, "selection cache hit");
            return Some(cached);
        }
        let selected = self.score_batch(point, batch)?;
        self.cache.put(key, selected.clone(), now);
        Some(selected)
    }

    fn score_batch(&self, point: &SpawnPoint, batch: &CandidateBatch) -> Option<ScoredCandidate> {
        let safe = self
            .safety
            .filter_unsafe(self.world.as_ref(), &batch.world, &batch.positions);
        // nothing "safe enough" still beats no attempt at all
        let pool: &[bossforge_common::CellPos] =
            if safe.is_empty() { &batch.positions } else { &safe };
        self.scorer
            .select_best(self.world.as_ref(), point, &batch.world, pool)
    }

    /// Reports an externally observed kill (e.g. combat). Idempotent: a
    /// handle that is unknown or already removed does nothing.
    pub fn handle_kill(&self, handle: ActorHandle, killed_by: &str) {
        let Some(id) = self.tracker.id_for_handle(handle) else {
            return;
        };
        let Some(record) = self.tracker.mark_killed(id) else {
            return;
        };
        self.registry.record_removal(&record.spawn_point);
        self.stats.record_kill();
        self.events.publish(BossEvent::Killed {
            boss: record.id,
            spawn_point: record.spawn_point,
            killed_by: killed_by.to_owned(),
            tier: record.tier,
        });
    }

    /// Reports an externally observed despawn. Idempotent like
    /// [`Self::handle_kill`].
    pub fn handle_despawn(&self, handle: ActorHandle) {
        let Some(id) = self.tracker.id_for_handle(handle) else {
            return;
        };
        self.remove_despawned(id, "despawned");
    }

    /// One health pass: check every boss past its grace period and treat
    /// invalid ones as despawned.
    pub fn health_tick(&self) {
        if !self.accepting.load(Ordering::Acquire) {
            return;
        }
        let now = Instant::now();
        self.stats.record_health_tick();
        for id in self.monitor.sweep(&self.tracker, self.spawner.as_ref(), now) {
            self.remove_despawned(id, "invalid");
        }
    }

    fn remove_despawned(&self, id: bossforge_common::BossId, reason: &str) {
        let Some(record) = self.tracker.mark_despawned(id) else {
            return;
        };
        self.registry.record_removal(&record.spawn_point);
        self.stats.record_despawn();
        self.events.publish(BossEvent::Despawned {
            boss: record.id,
            spawn_point: record.spawn_point,
            reason: reason.to_owned(),
        });
    }

    /// Swaps global scalars and merges the new point list, preserving live
    /// counters. Called by the hot reloader with an already-validated config.
    pub fn apply_config(&self, config: &RefreshConfig) {
        *self.settings.write() = RefreshSettings::from(config);
        self.registry.apply_reload(config.valid_points());
        self.cache.clear();
        info!(points = self.registry.len(), "applied new spawn configuration");
    }

    /// Stops accepting ticks, despawns every tracked boss, and clears the
    /// cache. Remaining records are published as `Despawned`.
    pub fn shutdown(&self) {
        self.accepting.store(false, Ordering::Release);
        let drained = self.tracker.drain();
        info!(count = drained.len(), "shutting down spawn orchestrator");
        for record in drained {
            self.registry.record_removal(&record.spawn_point);
            self.stats.record_despawn();
            self.events.publish(BossEvent::Despawned {
                boss: record.id,
                spawn_point: record.spawn_point,
                reason: "shutdown".to_owned(),
            });
        }
        self.cache.clear();
    }

    /// Current global scalars.
    #[must_use]
    pub fn settings(&self) -> RefreshSettings {
        *self.settings.read()
    }

    /// Seconds between refresh ticks under the current settings.
    #[must_use]
    pub fn check_interval(&self) -> Duration {
        Duration::from_secs(self.settings.read().check_interval_secs)
    }

    /// Point-in-time statistics snapshot.
    #[must_use]
    pub fn stats(&self) -> SpawnStats {
        SpawnStats {
            total_spawned: self.stats.spawned(),
            total_killed: self.stats.killed(),
            total_despawned: self.stats.despawned(),
            active: self.tracker.active_count(),
            refresh_ticks: self.stats.refresh_ticks(),
            health_ticks: self.stats.health_ticks(),
            cache_hit_rate: self.cache.hit_rate(),
            invariant_violations: self.registry.invariant_violations(),
        }
    }

    /// The spawn point registry.
    #[must_use]
    pub fn registry(&self) -> &SpawnPointRegistry {
        &self.registry
    }

    /// The lifecycle tracker.
    #[must_use]
    pub fn tracker(&self) -> &BossLifecycleTracker {
        &self.tracker
    }

    /// The selection criteria the orchestrator was built with.
    #[must_use]
    pub fn criteria(&self) -> &SelectionCriteria {
        &self.criteria
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::monitor::HEALTH_GRACE_SECS;
    use crate::ports::CellInfo;
    use crate::testing::{CollectingSink, GridWorld, StubSpawner};
    use bossforge_common::{CellPos, WorldId};

    struct Fixture {
        world: Arc<GridWorld>,
        spawner: Arc<StubSpawner>,
        events: Arc<CollectingSink>,
        orchestrator: SpawnOrchestrator,
    }

    fn fixture(config: RefreshConfig) -> Fixture {
        let world = Arc::new(GridWorld::flat("overworld", 64));
        // enough participants to pass the default admission gate
        for i in 0..3 {
            world.add_participant("overworld", CellPos::new(i, 65, i));
        }
        let spawner = Arc::new(StubSpawner::new());
        let events = Arc::new(CollectingSink::new());
        let orchestrator = SpawnOrchestrator::new(
            &config,
            SelectionCriteria::balanced(),
            Arc::clone(&world) as Arc<dyn WorldQuery>,
            Arc::clone(&spawner) as Arc<dyn ActorSpawner>,
            Arc::clone(&events) as Arc<dyn EventSink>,
        );
        Fixture {
            world,
            spawner,
            events,
            orchestrator,
        }
    }

    fn grounded_point(id: &str) -> SpawnPoint {
        let mut p = SpawnPoint::new(id, "overworld", 0, 100, 0, "king");
        p.auto_find_ground = true;
        p
    }

    fn config_with(points: Vec<SpawnPoint>) -> RefreshConfig {
        RefreshConfig {
            points,
            ..RefreshConfig::default()
        }
    }

    #[test]
    fn test_tick_spawns_once_then_point_saturates() {
        let f = fixture(config_with(vec![grounded_point("p1")]));

        f.orchestrator.refresh_tick();
        assert_eq!(f.spawner.spawn_count(), 1);
        assert_eq!(f.orchestrator.registry().get("p1").unwrap().current_count, 1);
        assert_eq!(f.orchestrator.tracker().active_count(), 1);

        // second tick: point at capacity, nothing more happens
        f.orchestrator.refresh_tick();
        assert_eq!(f.spawner.spawn_count(), 1);

        let events = f.events.events();
        assert_eq!(events.len(), 1);
        assert!(matches!(
            &events[0],
            BossEvent::Spawned { spawn_point, pos, .. }
                if spawn_point == "p1" && *pos == CellPos::new(0, 65, 0)
        ));
    }

    #[test]
    fn test_min_participants_gate_blocks_tick() {
        let f = fixture(config_with(vec![grounded_point("p1")]));
        f.world.clear_participants();

        f.orchestrator.refresh_tick();
        assert_eq!(f.spawner.spawn_count(), 0);
        assert_eq!(f.orchestrator.registry().get("p1").unwrap().current_count, 0);
    }

    #[test]
    fn test_global_cap_stops_tick_early() {
        let mut config = config_with(
            (0..5)
                .map(|i| {
                    let mut p = grounded_point(&format!("p{i}"));
                    p.x = i * 20;
                    p
                })
                .collect(),
        );
        config.max_active = 2;
        let f = fixture(config);

        f.orchestrator.refresh_tick();
        assert_eq!(f.spawner.spawn_count(), 2);
        assert_eq!(f.orchestrator.tracker().active_count(), 2);
    }

    #[test]
    fn test_spawn_failure_skips_point_without_counting() {
        let f = fixture(config_with(vec![grounded_point("p1")]));
        f.spawner.refuse();

        f.orchestrator.refresh_tick();
        assert_eq!(f.orchestrator.registry().get("p1").unwrap().current_count, 0);
        assert_eq!(f.orchestrator.tracker().active_count(), 0);
        assert!(f.events.events().is_empty());
    }

    #[test]
    fn test_one_bad_point_does_not_block_others() {
        // first point is region mode over a world that does not exist, so
        // ground projection never succeeds; second is a plain fixed point
        let mut bad = grounded_point("bad");
        bad.mode = crate::config::SpawnMode::Region;
        bad.regions = vec!["void,0,0,10,10".into()];
        let good = grounded_point("good");

        let f = fixture(config_with(vec![bad, good]));
        f.orchestrator.refresh_tick();
        assert_eq!(f.orchestrator.registry().get("bad").unwrap().current_count, 0);
        assert_eq!(f.orchestrator.registry().get("good").unwrap().current_count, 1);
    }

    #[test]
    fn test_near_participant_spawn_lands_in_participant_world() {
        // Point anchored in the overworld, but every participant is in the
        // nether: candidates are grounded against nether terrain and the
        // actor must be placed there, not at nether altitudes in the
        // overworld's rock.
        let world = Arc::new(GridWorld::flat("overworld", 64));
        world.add_world("nether", 30);
        for i in 0..3 {
            world.add_participant("nether", CellPos::new(i, 31, i));
        }
        let spawner = Arc::new(StubSpawner::new());
        let events = Arc::new(CollectingSink::new());
        let mut point = grounded_point("p1");
        point.mode = crate::config::SpawnMode::NearParticipant;
        let orchestrator = SpawnOrchestrator::new(
            &config_with(vec![point]),
            SelectionCriteria::balanced(),
            Arc::clone(&world) as Arc<dyn WorldQuery>,
            Arc::clone(&spawner) as Arc<dyn ActorSpawner>,
            events as Arc<dyn EventSink>,
        );

        orchestrator.refresh_tick();
        assert_eq!(spawner.spawn_count(), 1);
        let (_, spawn_world, pos, _) = spawner.spawned()[0].clone();
        assert_eq!(spawn_world, WorldId::from("nether"));
        assert_eq!(pos.y, 31.0);
        assert_eq!(orchestrator.tracker().all_records()[0].world, WorldId::from("nether"));
    }

    #[test]
    fn test_no_safe_candidate_falls_back_to_best_scored() {
        // Hazard under the anchor plus a blocked cell overhead pushes the
        // only candidate to 0.4: below the safety threshold, above the
        // acceptance minimum. The unfiltered pool must still produce a spawn.
        let f = fixture(config_with(vec![SpawnPoint::new(
            "p1", "overworld", 0, 65, 0, "king",
        )]));
        f.world.set_hazard("overworld", CellPos::new(0, 64, 0));
        f.world.set_cell(
            "overworld",
            CellPos::new(0, 66, 0),
            CellInfo { solid: true, hazardous: false },
        );

        f.orchestrator.refresh_tick();
        assert_eq!(f.spawner.spawn_count(), 1);
        assert_eq!(f.orchestrator.registry().get("p1").unwrap().current_count, 1);
    }

    #[test]
    fn test_point_removed_mid_attempt_leaves_no_tracked_boss() {
        let f = fixture(config_with(vec![grounded_point("p1")]));
        let point = f.orchestrator.registry().get("p1").unwrap();
        // reload drops the point between the eligibility scan and the attempt
        f.orchestrator.registry().unregister("p1");

        let err = f.orchestrator.attempt_spawn(&point, Instant::now()).unwrap_err();
        assert!(matches!(err, BossError::SpawnPointNotFound(_)));
        assert_eq!(f.orchestrator.tracker().active_count(), 0);
        assert!(f.events.events().is_empty());
    }

    #[test]
    fn test_kill_reclaims_capacity_exactly_once() {
        let f = fixture(config_with(vec![grounded_point("p1")]));
        f.orchestrator.refresh_tick();
        let handle = f.orchestrator.tracker().all_records()[0].handle;

        f.orchestrator.handle_kill(handle, "slayer");
        assert_eq!(f.orchestrator.registry().get("p1").unwrap().current_count, 0);
        assert_eq!(f.orchestrator.tracker().active_count(), 0);

        // double report: no-op, no extra decrement
        f.orchestrator.handle_kill(handle, "slayer");
        let stats = f.orchestrator.stats();
        assert_eq!(stats.total_killed, 1);
        assert_eq!(stats.invariant_violations, 0);
    }

    #[test]
    fn test_health_tick_evicts_invalid_boss() {
        let f = fixture(config_with(vec![grounded_point("p1")]));
        f.orchestrator.refresh_tick();
        let record = &f.orchestrator.tracker().all_records()[0];
        let handle = record.handle;

        // too young: exempt even when invalid
        f.spawner.kill(handle);
        f.orchestrator.health_tick();
        assert_eq!(f.orchestrator.tracker().active_count(), 1);

        // age the record past the grace period, then evict
        let id = record.id;
        let mut aged = f.orchestrator.tracker().mark_despawned(id).unwrap();
        aged.spawned_at = Instant::now() - Duration::from_secs(HEALTH_GRACE_SECS + 1);
        f.orchestrator.tracker().register(aged);

        f.orchestrator.health_tick();
        assert_eq!(f.orchestrator.tracker().active_count(), 0);
        assert_eq!(f.orchestrator.registry().get("p1").unwrap().current_count, 0);
        assert!(f
            .events
            .events()
            .iter()
            .any(|e| matches!(e, BossEvent::Despawned { reason, .. } if reason == "invalid")));
    }

    #[test]
    fn test_shutdown_drains_and_stops_ticks() {
        let f = fixture(config_with(vec![grounded_point("p1")]));
        f.orchestrator.refresh_tick();
        assert_eq!(f.orchestrator.tracker().active_count(), 1);

        f.orchestrator.shutdown();
        assert_eq!(f.orchestrator.tracker().active_count(), 0);
        assert!(f
            .events
            .events()
            .iter()
            .any(|e| matches!(e, BossEvent::Despawned { reason, .. } if reason == "shutdown")));

        f.orchestrator.refresh_tick();
        assert_eq!(f.spawner.spawn_count(), 1);
    }

    #[test]
    fn test_apply_config_swaps_scalars_and_merges_points() {
        let f = fixture(config_with(vec![grounded_point("p1")]));
        f.orchestrator.refresh_tick();

        let mut new_config = config_with(vec![grounded_point("p1"), grounded_point("p2")]);
        new_config.max_active = 42;
        f.orchestrator.apply_config(&new_config);

        assert_eq!(f.orchestrator.settings().max_active, 42);
        assert_eq!(f.orchestrator.registry().len(), 2);
        // live counter survived the reload
        assert_eq!(f.orchestrator.registry().get("p1").unwrap().current_count, 1);
    }

    #[test]
    fn test_counter_matches_tracked_records_at_quiescence() {
        let mut points = Vec::new();
        for i in 0..3 {
            let mut p = grounded_point(&format!("p{i}"));
            p.x = i * 30;
            p.max_count = 2;
            points.push(p);
        }
        let f = fixture(config_with(points));

        f.orchestrator.refresh_tick();
        for point in f.orchestrator.registry().all_points() {
            assert_eq!(
                point.current_count as usize,
                f.orchestrator.tracker().count_for_point(&point.id),
            );
        }
    }
}
