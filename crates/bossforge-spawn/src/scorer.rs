//! Multi-criteria location scoring and greedy best-candidate selection.
//!
//! Four independent sub-scores (openness, environment match, ambient energy,
//! crowding) are combined with the spawn point's weights, normalized to sum
//! to 1.0. Points that opt out of weighted scoring fall back to the plain
//! terrain safety score.

use crate::config::SpawnPoint;
use crate::ports::WorldQuery;
use crate::safety::SafetyAnalyzer;
use bossforge_common::{CellPos, WorldId, HORIZONTAL_NEIGHBORS};
use tracing::debug;

/// Early-stop floor: a candidate at or above this (and the point's own
/// minimum) ends the search immediately.
pub const EARLY_STOP_SCORE: f64 = 0.7;
/// Minimum acceptable score when the point disables weighted scoring.
pub const DEFAULT_MIN_SCORE: f64 = 0.3;
/// Radius used for the crowding sub-score.
const CROWDING_RADIUS: f64 = 100.0;
/// Horizontal distance checked per direction for openness.
const OPENNESS_RADIUS: i32 = 5;

/// Per-candidate score breakdown.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreBreakdown {
    /// Terrain safety in `[0, 1]`
    pub safety: f64,
    /// Sky visibility and horizontal clearance in `[0, 1]`
    pub openness: f64,
    /// Biome preference match in `[0, 1]`
    pub environment: f64,
    /// Ambient energy of the surrounding biome in `[0, 1]`
    pub energy: f64,
    /// Nearby participant density in `[0, 1]`
    pub crowding: f64,
    /// Final combined score in `[0, 1]`
    pub total: f64,
}

/// A candidate position together with its evaluated scores.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredCandidate {
    /// World the position belongs to (may differ from the point's anchor
    /// world for near-participant and region candidates)
    pub world: WorldId,
    /// The standing position being proposed
    pub pos: CellPos,
    /// How it scored
    pub breakdown: ScoreBreakdown,
}

/// Evaluates candidate positions against a spawn point's preferences.
#[derive(Debug, Default, Clone, Copy)]
pub struct LocationScorer {
    safety: SafetyAnalyzer,
}

impl LocationScorer {
    /// Creates a new scorer.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            safety: SafetyAnalyzer::new(),
        }
    }

    /// Full evaluation of one candidate in `wid` (the world the candidate
    /// was generated in, not necessarily the point's anchor world).
    pub fn evaluate(
        &self,
        world: &dyn WorldQuery,
        point: &SpawnPoint,
        wid: &WorldId,
        pos: CellPos,
    ) -> ScoredCandidate {
        let safety = self.safety.score(world, wid, pos);

        if !point.weighted_scoring {
            return ScoredCandidate {
                world: wid.clone(),
                pos,
                breakdown: ScoreBreakdown {
                    safety,
                    openness: 0.0,
                    environment: 0.0,
                    energy: 0.0,
                    crowding: 0.0,
                    total: safety,
                },
            };
        }

        let openness = self.openness_score(world, wid, pos);
        let environment = self.environment_score(world, wid, pos, point);
        let energy = self.energy_score(world, wid, pos);
        let crowding = self.crowding_score(world, wid, pos);

        let [w_open, w_env, w_energy, w_crowd] = normalized_point_weights(point);
        let total = openness * w_open + environment * w_env + energy * w_energy + crowding * w_crowd;

        ScoredCandidate {
            world: wid.clone(),
            pos,
            breakdown: ScoreBreakdown {
                safety,
                openness,
                environment,
                energy,
                crowding,
                total,
            },
        }
    }

    /// Combined score of one candidate.
    pub fn score(
        &self,
        world: &dyn WorldQuery,
        point: &SpawnPoint,
        wid: &WorldId,
        pos: CellPos,
    ) -> f64 {
        self.evaluate(world, point, wid, pos).breakdown.total
    }

    /// Picks the best candidate, greedily.
    ///
    /// Stops at the first candidate whose score reaches both the point's
    /// minimum and [`EARLY_STOP_SCORE`]. Otherwise returns the running best
    /// if it reaches the point's minimum, or `None` when nothing does.
    pub fn select_best(
        &self,
        world: &dyn WorldQuery,
        point: &SpawnPoint,
        wid: &WorldId,
        candidates: &[CellPos],
    ) -> Option<ScoredCandidate> {
        let mut best: Option<ScoredCandidate> = None;

        let early_stop_min = if point.weighted_scoring {
            point.min_score
        } else {
            EARLY_STOP_SCORE
        };

        for &pos in candidates {
            let scored = self.evaluate(world, point, wid, pos);
            let total = scored.breakdown.total;
            debug!(point = %point.id, %pos, score = total, "evaluated candidate");

            if total >= early_stop_min && total >= EARLY_STOP_SCORE {
                return Some(scored);
            }
            if best.as_ref().map_or(true, |b| total > b.breakdown.total) {
                best = Some(scored);
            }
        }

        let min_acceptable = if point.weighted_scoring {
            point.min_score
        } else {
            DEFAULT_MIN_SCORE
        };
        match best {
            Some(b) if b.breakdown.total >= min_acceptable => Some(b),
            Some(b) => {
                debug!(
                    point = %point.id,
                    best = b.breakdown.total,
                    min = min_acceptable,
                    "all candidates below minimum score"
                );
                None
            }
            None => None,
        }
    }

    /// Sky visibility plus 8-direction horizontal clearance.
    ///
    /// Sky visibility counts for 5 of 13 points; each of the 8 horizontal
    /// directions counts 1 point when it stays clear (3 cells of headroom)
    /// out to [`OPENNESS_RADIUS`].
    pub fn openness_score(&self, world: &dyn WorldQuery, wid: &WorldId, pos: CellPos) -> f64 {
        let mut open = 0u32;
        let total = 5 + HORIZONTAL_NEIGHBORS.len() as u32;

        let sky = world
            .highest_cell_y(wid, pos.x, pos.z)
            .is_some_and(|top| top <= pos.y);
        if sky {
            open += 5;
        }

        for &(dx, dz) in &HORIZONTAL_NEIGHBORS {
            let clear = (1..=OPENNESS_RADIUS).all(|dist| {
                let column = pos.offset(dx * dist, 0, dz * dist);
                (0..3).all(|dy| world.is_clear(wid, column.above(dy)))
            });
            if clear {
                open += 1;
            }
        }

        f64::from(open) / f64::from(total)
    }

    /// Match against the point's preferred biomes: exact 1.0, substring 0.7,
    /// no match 0.3, and a neutral 0.5 when the point has no preference.
    pub fn environment_score(
        &self,
        world: &dyn WorldQuery,
        wid: &WorldId,
        pos: CellPos,
        point: &SpawnPoint,
    ) -> f64 {
        if point.preferred_biomes.is_empty() {
            return 0.5;
        }
        let Some(biome) = world.biome(wid, pos) else {
            return 0.3;
        };
        let biome = biome.to_ascii_lowercase();

        for preferred in &point.preferred_biomes {
            if biome == preferred.to_ascii_lowercase() {
                return 1.0;
            }
        }
        for preferred in &point.preferred_biomes {
            let preferred = preferred.to_ascii_lowercase();
            if biome.contains(&preferred) || preferred.contains(&biome) {
                return 0.7;
            }
        }
        0.3
    }

    /// Fixed lookup by biome keyword, with a small altitude adjustment.
    pub fn energy_score(&self, world: &dyn WorldQuery, wid: &WorldId, pos: CellPos) -> f64 {
        let base = match world.biome(wid, pos) {
            Some(biome) => biome_energy(&biome),
            None => 0.5,
        };
        let adjusted = if pos.y > 120 {
            base + 0.05
        } else if pos.y < 40 {
            base - 0.05
        } else {
            base
        };
        adjusted.clamp(0.0, 1.0)
    }

    /// Piecewise function of nearby participant count. A moderate crowd is
    /// best; deserted or packed areas score low.
    pub fn crowding_score(&self, world: &dyn WorldQuery, wid: &WorldId, pos: CellPos) -> f64 {
        match world.participants_near(wid, pos, CROWDING_RADIUS).len() {
            0 => 0.3,
            1..=2 => 0.8,
            3..=5 => 1.0,
            6..=10 => 0.7,
            _ => 0.4,
        }
    }
}

/// The point's four weights scaled so they sum to 1.0. Falls back to equal
/// weights when all four are zero.
fn normalized_point_weights(point: &SpawnPoint) -> [f64; 4] {
    let raw = [
        point.openness_weight,
        point.environment_weight,
        point.energy_weight,
        point.crowding_weight,
    ];
    let sum: f64 = raw.iter().sum();
    if sum > 0.0 {
        raw.map(|w| w / sum)
    } else {
        [0.25; 4]
    }
}

/// Ambient energy by biome keyword.
fn biome_energy(biome: &str) -> f64 {
    let b = biome.to_ascii_lowercase();
    if b.contains("mushroom") {
        0.95
    } else if b.contains("jungle") {
        0.85
    } else if b.contains("bamboo") {
        0.80
    } else if b.contains("dark_forest") || b.contains("dark_oak") {
        0.75
    } else if b.contains("forest") {
        0.70
    } else if b.contains("mountain") || b.contains("peaks") {
        0.75
    } else if b.contains("taiga") {
        0.65
    } else if b.contains("swamp") {
        0.60
    } else if b.contains("river") || b.contains("ocean") {
        0.55
    } else if b.contains("plains") {
        0.50
    } else if b.contains("desert") {
        0.45
    } else if b.contains("savanna") {
        0.40
    } else if b.contains("badlands") || b.contains("mesa") {
        0.35
    } else if b.contains("nether") {
        0.80
    } else if b.contains("end") {
        0.90
    } else {
        0.5
    }
}
