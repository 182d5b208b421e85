//! Terrain safety scoring for candidate spawn positions.
//!
//! A candidate starts at a score of 1.0 and loses a fixed penalty for each
//! hazard class it exhibits. The penalties are independent, so a position can
//! accumulate several and bottom out at 0.0.

use crate::ports::WorldQuery;
use bossforge_common::{CellPos, WorldId, HORIZONTAL_NEIGHBORS};
use tracing::trace;

/// Score below which a position is considered unsafe.
pub const SAFE_THRESHOLD: f64 = 0.5;

/// Lowest altitude of the acceptable band.
pub const MIN_SAFE_ALTITUDE: i32 = 10;
/// Highest altitude of the acceptable band.
pub const MAX_SAFE_ALTITUDE: i32 = 250;

/// Penalty for standing outside the acceptable altitude band.
const ALTITUDE_PENALTY: f64 = 0.3;
/// Penalty for a hazardous cell at the position or up to two cells below.
const HAZARD_PENALTY: f64 = 0.4;
/// Penalty for less than two cells of headroom.
const HEADROOM_PENALTY: f64 = 0.2;
/// Penalty for an adjacent drop-off.
const LEDGE_PENALTY: f64 = 0.1;

/// Stateless analyzer that grades standing positions for hazards.
#[derive(Debug, Default, Clone, Copy)]
pub struct SafetyAnalyzer;

impl SafetyAnalyzer {
    /// Creates a new analyzer.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Scores a standing position in `[0.0, 1.0]`.
    ///
    /// `pos` is the cell the actor would occupy, i.e. the cell directly above
    /// the ground cell it stands on.
    pub fn score(&self, world: &dyn WorldQuery, wid: &WorldId, pos: CellPos) -> f64 {
        let mut score = 1.0;

        if !(MIN_SAFE_ALTITUDE..=MAX_SAFE_ALTITUDE).contains(&pos.y) {
            score -= ALTITUDE_PENALTY;
        }
        if self.has_nearby_hazard(world, wid, pos) {
            score -= HAZARD_PENALTY;
        }
        if !self.has_headroom(world, wid, pos) {
            score -= HEADROOM_PENALTY;
        }
        if self.is_on_ledge(world, wid, pos) {
            score -= LEDGE_PENALTY;
        }

        let score = score.max(0.0);
        trace!(world = %wid, %pos, score, "scored position safety");
        score
    }

    /// Whether a position is safe enough to spawn at.
    pub fn is_safe(&self, world: &dyn WorldQuery, wid: &WorldId, pos: CellPos) -> bool {
        self.score(world, wid, pos) >= SAFE_THRESHOLD
    }

    /// Keeps only the safe candidates, preserving order.
    ///
    /// May return an empty vector even for non-empty input; callers that need
    /// a position regardless fall back to the unfiltered list.
    pub fn filter_unsafe(
        &self,
        world: &dyn WorldQuery,
        wid: &WorldId,
        candidates: &[CellPos],
    ) -> Vec<CellPos> {
        candidates
            .iter()
            .copied()
            .filter(|&pos| self.is_safe(world, wid, pos))
            .collect()
    }

    /// Hazardous cell at the position itself or within two cells below it.
    fn has_nearby_hazard(&self, world: &dyn WorldQuery, wid: &WorldId, pos: CellPos) -> bool {
        (0..=2).any(|d| world.is_hazard(wid, pos.below(d)))
    }

    /// At least two clear cells starting at the position.
    fn has_headroom(&self, world: &dyn WorldQuery, wid: &WorldId, pos: CellPos) -> bool {
        (0..2).all(|d| world.is_clear(wid, pos.above(d)))
    }

    /// Any horizontally adjacent column dropping away under the position.
    fn is_on_ledge(&self, world: &dyn WorldQuery, wid: &WorldId, pos: CellPos) -> bool {
        HORIZONTAL_NEIGHBORS.iter().any(|&(dx, dz)| {
            let side = pos.offset(dx, 0, dz);
            world.is_clear(wid, side) && world.is_clear(wid, side.below(1))
        })
    }
}

/// Projects a column onto the ground and returns the standing cell.
///
/// Scans downward from `start_y` to the world's minimum altitude and returns
/// the cell above the first solid cell that has three clear cells over it.
/// Returns `None` when the column has no such surface, e.g. solid rock to the
/// top or a bottomless void.
pub fn find_ground(
    world: &dyn WorldQuery,
    wid: &WorldId,
    x: i32,
    z: i32,
    start_y: i32,
) -> Option<CellPos> {
    let (min_y, max_y) = world.altitude_range(wid);
    let start = start_y.min(max_y);
    for y in (min_y..=start).rev() {
        let cell = CellPos::new(x, y, z);
        if world.is_solid(wid, cell) && (1..=3).all(|d| world.is_clear(wid, cell.above(d))) {
            return Some(cell.above(1));
        }
    }
    None
}
