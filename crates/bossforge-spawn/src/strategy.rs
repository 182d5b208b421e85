//! Candidate generation strategies and their tag-based registry.
//!
//! A strategy turns a spawn point into a bounded list of raw standing
//! positions. Returning an empty list is a normal outcome (nowhere viable
//! this tick), never an error.

use crate::config::{RegionBounds, SpawnMode, SpawnPoint};
use crate::ports::WorldQuery;
use crate::safety::find_ground;
use crate::scorer::{LocationScorer, EARLY_STOP_SCORE};
use bossforge_common::{CellPos, WorldId};
use std::collections::HashMap;
use std::f64::consts::TAU;
use std::sync::Arc;
use tracing::{debug, warn};

/// Attempts made by the region strategy before giving up.
const REGION_ATTEMPTS: usize = 5;
/// Altitude the region strategy starts its ground scan from, high enough to
/// avoid starting inside caves.
const REGION_SCAN_START_Y: i32 = 128;

/// A batch of raw candidates, all belonging to one world.
///
/// Carrying the world with the positions matters: the near-participant and
/// region strategies may produce positions in a different world than the
/// point's anchor, and scoring or spawning against the wrong terrain would
/// silently misplace the boss.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateBatch {
    /// World every position in this batch belongs to
    pub world: WorldId,
    /// Raw standing positions
    pub positions: Vec<CellPos>,
}

impl CandidateBatch {
    /// An empty batch for a world.
    #[must_use]
    pub const fn empty(world: WorldId) -> Self {
        Self {
            world,
            positions: Vec::new(),
        }
    }
}

/// A source of raw spawn position candidates.
pub trait CandidateStrategy: Send + Sync {
    /// Tag this strategy is registered under.
    fn tag(&self) -> &'static str;

    /// Generates up to `max_candidates` positions for a point.
    fn generate(
        &self,
        world: &dyn WorldQuery,
        point: &SpawnPoint,
        max_candidates: usize,
    ) -> CandidateBatch;
}

/// Anchor coordinate, optionally jittered within `random_radius`.
#[derive(Debug, Default)]
pub struct FixedStrategy;

impl CandidateStrategy for FixedStrategy {
    fn tag(&self) -> &'static str {
        SpawnMode::Fixed.tag()
    }

    fn generate(
        &self,
        world: &dyn WorldQuery,
        point: &SpawnPoint,
        max_candidates: usize,
    ) -> CandidateBatch {
        let wid = point.world_id();
        let anchor = point.anchor();
        world.ensure_loaded(&wid, anchor);

        if point.random_radius <= 0 {
            // One candidate. A failed ground scan falls back to the raw
            // anchor; the safety filter downstream has the final say.
            let pos = if point.auto_find_ground {
                find_ground(world, &wid, anchor.x, anchor.z, anchor.y).unwrap_or(anchor)
            } else {
                anchor
            };
            return CandidateBatch {
                world: wid,
                positions: vec![pos],
            };
        }

        let r = point.random_radius;
        let mut positions = Vec::with_capacity(max_candidates);
        for _ in 0..max_candidates {
            let pos = anchor.offset(fastrand::i32(-r..=r), 0, fastrand::i32(-r..=r));
            world.ensure_loaded(&wid, pos);
            if point.auto_find_ground {
                if let Some(ground) = find_ground(world, &wid, pos.x, pos.z, pos.y) {
                    positions.push(ground);
                }
            } else {
                positions.push(pos);
            }
        }
        debug!(point = %point.id, count = positions.len(), "fixed strategy candidates");
        CandidateBatch {
            world: wid,
            positions,
        }
    }
}

/// Ring around one randomly chosen online participant.
#[derive(Debug, Default)]
pub struct NearParticipantStrategy;

impl CandidateStrategy for NearParticipantStrategy {
    fn tag(&self) -> &'static str {
        SpawnMode::NearParticipant.tag()
    }

    fn generate(
        &self,
        world: &dyn WorldQuery,
        point: &SpawnPoint,
        max_candidates: usize,
    ) -> CandidateBatch {
        let participants = world.all_participants();
        if participants.is_empty() {
            debug!(point = %point.id, "no participants online, skipping");
            return CandidateBatch::empty(point.world_id());
        }
        let chosen = &participants[fastrand::usize(..participants.len())];
        let wid = &chosen.world;
        let base = chosen.pos;

        let span = f64::from((point.max_distance - point.min_distance).max(0));
        let mut positions = Vec::with_capacity(max_candidates);
        for _ in 0..max_candidates {
            let distance = f64::from(point.min_distance) + fastrand::f64() * span;
            let angle = fastrand::f64() * TAU;
            let pos = base.offset(
                (distance * angle.cos()) as i32,
                0,
                (distance * angle.sin()) as i32,
            );
            world.ensure_loaded(wid, pos);
            if point.auto_find_ground {
                if let Some(ground) = find_ground(world, wid, pos.x, pos.z, pos.y) {
                    positions.push(ground);
                }
            } else {
                positions.push(pos);
            }
        }
        debug!(point = %point.id, count = positions.len(), "near-participant candidates");
        CandidateBatch {
            world: wid.clone(),
            positions,
        }
    }
}

/// Uniform random position inside one randomly chosen configured sub-region.
///
/// Unlike the other strategies this one scores as it goes: it stops after at
/// most [`REGION_ATTEMPTS`] draws, or as soon as a draw clears both the
/// point's minimum and the early-stop floor.
#[derive(Debug, Default)]
pub struct RegionStrategy {
    scorer: LocationScorer,
}

impl CandidateStrategy for RegionStrategy {
    fn tag(&self) -> &'static str {
        SpawnMode::Region.tag()
    }

    fn generate(
        &self,
        world: &dyn WorldQuery,
        point: &SpawnPoint,
        _max_candidates: usize,
    ) -> CandidateBatch {
        if point.regions.is_empty() {
            warn!(point = %point.id, "region mode with no regions configured");
            return CandidateBatch::empty(point.world_id());
        }
        let raw = &point.regions[fastrand::usize(..point.regions.len())];
        let bounds: RegionBounds = match raw.parse() {
            Ok(b) => b,
            Err(e) => {
                warn!(point = %point.id, region = %raw, "unparseable region: {e}");
                return CandidateBatch::empty(point.world_id());
            }
        };

        let wid = &bounds.world;
        let mut positions = Vec::new();
        for _ in 0..REGION_ATTEMPTS {
            let x = fastrand::i32(bounds.min_x..=bounds.max_x);
            let z = fastrand::i32(bounds.min_z..=bounds.max_z);
            let raw_pos = CellPos::new(x, REGION_SCAN_START_Y, z);
            world.ensure_loaded(wid, raw_pos);

            let pos = if point.auto_find_ground {
                match find_ground(world, wid, x, z, REGION_SCAN_START_Y) {
                    Some(ground) => ground,
                    None => continue,
                }
            } else {
                raw_pos
            };
            positions.push(pos);

            let score = self.scorer.score(world, point, wid, pos);
            if score >= point.min_score && score >= EARLY_STOP_SCORE {
                debug!(point = %point.id, %pos, score, "region draw good enough, stopping early");
                break;
            }
        }
        debug!(point = %point.id, count = positions.len(), "region strategy candidates");
        CandidateBatch {
            world: bounds.world.clone(),
            positions,
        }
    }
}

/// Tag-indexed lookup of the known strategies.
pub struct StrategyRegistry {
    strategies: HashMap<&'static str, Arc<dyn CandidateStrategy>>,
}

impl StrategyRegistry {
    /// Registry with the three built-in strategies.
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut registry = Self {
            strategies: HashMap::new(),
        };
        registry.register(Arc::new(FixedStrategy));
        registry.register(Arc::new(NearParticipantStrategy));
        registry.register(Arc::new(RegionStrategy::default()));
        registry
    }

    /// Registers (or replaces) a strategy under its own tag.
    pub fn register(&mut self, strategy: Arc<dyn CandidateStrategy>) {
        self.strategies.insert(strategy.tag(), strategy);
    }

    /// Looks a strategy up by tag.
    #[must_use]
    pub fn get(&self, tag: &str) -> Option<Arc<dyn CandidateStrategy>> {
        self.strategies.get(tag).cloned()
    }

    /// Strategy for a spawn mode. Present for all built-in modes as long as
    /// the defaults have not been removed.
    #[must_use]
    pub fn for_mode(&self, mode: SpawnMode) -> Option<Arc<dyn CandidateStrategy>> {
        self.get(mode.tag())
    }

    /// All registered tags.
    #[must_use]
    pub fn tags(&self) -> Vec<&'static str> {
        self.strategies.keys().copied().collect()
    }
}

impl Default for StrategyRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::GridWorld;

    fn grounded_point() -> SpawnPoint {
        let mut p = SpawnPoint::new("p1", "overworld", 0, 100, 0, "king");
        p.auto_find_ground = true;
        p
    }

    #[test]
    fn test_fixed_without_radius_projects_to_ground() {
        let grid = GridWorld::flat("overworld", 64);
        let batch = FixedStrategy.generate(&grid, &grounded_point(), 5);
        assert_eq!(batch.world, WorldId::from("overworld"));
        assert_eq!(batch.positions, vec![CellPos::new(0, 65, 0)]);
    }

    #[test]
    fn test_fixed_without_ground_search_returns_anchor() {
        let grid = GridWorld::flat("overworld", 64);
        let p = SpawnPoint::new("p1", "overworld", 3, 80, -2, "king");
        let batch = FixedStrategy.generate(&grid, &p, 5);
        assert_eq!(batch.positions, vec![CellPos::new(3, 80, -2)]);
    }

    #[test]
    fn test_fixed_with_radius_stays_in_bounds() {
        let grid = GridWorld::flat("overworld", 64);
        let mut p = grounded_point();
        p.random_radius = 8;
        let batch = FixedStrategy.generate(&grid, &p, 10);
        assert_eq!(batch.positions.len(), 10);
        for c in batch.positions {
            assert!((c.x - p.x).abs() <= 8);
            assert!((c.z - p.z).abs() <= 8);
            assert_eq!(c.y, 65);
        }
    }

    #[test]
    fn test_near_participant_with_nobody_online() {
        let grid = GridWorld::flat("overworld", 64);
        let mut p = grounded_point();
        p.mode = SpawnMode::NearParticipant;
        let batch = NearParticipantStrategy.generate(&grid, &p, 5);
        assert!(batch.positions.is_empty());
        // bails out before touching world terrain
        assert_eq!(grid.cell_query_count(), 0);
    }

    #[test]
    fn test_near_participant_respects_distance_band() {
        let grid = GridWorld::flat("overworld", 64);
        grid.add_participant("overworld", CellPos::new(0, 65, 0));
        let mut p = grounded_point();
        p.mode = SpawnMode::NearParticipant;
        p.min_distance = 20;
        p.max_distance = 40;
        let batch = NearParticipantStrategy.generate(&grid, &p, 8);
        assert_eq!(batch.world, WorldId::from("overworld"));
        assert_eq!(batch.positions.len(), 8);
        for c in batch.positions {
            let d = c.horizontal_distance(CellPos::new(0, 65, 0));
            // integer truncation of the offsets can pull a draw slightly
            // inside the band
            assert!(d <= 41.0, "candidate at distance {d}");
        }
    }

    #[test]
    fn test_near_participant_batch_follows_participant_world() {
        // The point anchors in the overworld but the only participant is in
        // another world; the batch must be grounded against that world.
        let grid = GridWorld::flat("overworld", 64);
        grid.add_world("nether", 30);
        grid.add_participant("nether", CellPos::new(0, 31, 0));
        let mut p = grounded_point();
        p.mode = SpawnMode::NearParticipant;
        let batch = NearParticipantStrategy.generate(&grid, &p, 5);
        assert_eq!(batch.world, WorldId::from("nether"));
        assert!(!batch.positions.is_empty());
        for c in batch.positions {
            assert_eq!(c.y, 31);
        }
    }

    #[test]
    fn test_region_draws_inside_bounds() {
        let grid = GridWorld::flat("overworld", 64);
        let mut p = grounded_point();
        p.mode = SpawnMode::Region;
        p.regions = vec!["overworld,0,0,10,10".into()];
        let batch = RegionStrategy::default().generate(&grid, &p, 5);
        assert_eq!(batch.world, WorldId::from("overworld"));
        assert!(!batch.positions.is_empty());
        for c in &batch.positions {
            assert!((0..=10).contains(&c.x));
            assert!((0..=10).contains(&c.z));
            assert_eq!(c.y, 65);
        }
    }

    #[test]
    fn test_region_in_solid_rock_returns_empty() {
        let grid = GridWorld::solid_rock("overworld");
        let mut p = grounded_point();
        p.mode = SpawnMode::Region;
        p.regions = vec!["overworld,0,0,10,10".into()];
        let batch = RegionStrategy::default().generate(&grid, &p, 5);
        assert!(batch.positions.is_empty());
    }

    #[test]
    fn test_region_stops_early_on_good_draw() {
        // Flat open ground scores 1.0 unweighted, so the very first draw
        // should end the search.
        let grid = GridWorld::flat("overworld", 64);
        let mut p = grounded_point();
        p.mode = SpawnMode::Region;
        p.regions = vec!["overworld,0,0,50,50".into()];
        let batch = RegionStrategy::default().generate(&grid, &p, 5);
        assert_eq!(batch.positions.len(), 1);
    }

    #[test]
    fn test_registry_resolves_all_modes() {
        let registry = StrategyRegistry::with_defaults();
        for mode in [SpawnMode::Fixed, SpawnMode::NearParticipant, SpawnMode::Region] {
            let strategy = registry.for_mode(mode).unwrap();
            assert_eq!(strategy.tag(), mode.tag());
        }
        assert!(registry.get("nonsense").is_none());
    }
}
