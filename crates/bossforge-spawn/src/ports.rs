//! Collaborator ports consumed by the spawn core.
//!
//! The orchestrator is a library embedded in a host process; it never talks
//! to the world or to actors directly. The host supplies these traits. All
//! of them report failure as absence ("unknown cell", "no handle") rather
//! than as errors, because unloaded regions and refused spawns are routine.

use bossforge_common::{ActorHandle, CellPos, ParticipantId, WorldId};
use glam::DVec3;

/// What the world reports about a single cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CellInfo {
    /// Cell is solid (can be stood on, blocks movement)
    pub solid: bool,
    /// Cell is hazardous to stand in or on (lava, fire, void...)
    pub hazardous: bool,
}

/// A participant (player) present in the world.
#[derive(Debug, Clone, PartialEq)]
pub struct Participant {
    /// Host-assigned participant ID
    pub id: ParticipantId,
    /// World the participant is in
    pub world: WorldId,
    /// Cell the participant occupies
    pub pos: CellPos,
}

/// Read-only spatial queries against the host world.
///
/// Implementations must be cheap to call repeatedly; the scorer reads
/// dozens of cells per candidate.
pub trait WorldQuery: Send + Sync {
    /// Reports the contents of a cell, or `None` if the world is unknown or
    /// the region is not loaded.
    fn cell(&self, world: &WorldId, pos: CellPos) -> Option<CellInfo>;

    /// Biome name at a column, lowercase (e.g. `"dark_forest"`), or `None`
    /// when unknown.
    fn biome(&self, world: &WorldId, pos: CellPos) -> Option<String>;

    /// Altitude of the highest non-air cell in the column, or `None` when
    /// the column is unknown.
    fn highest_cell_y(&self, world: &WorldId, x: i32, z: i32) -> Option<i32>;

    /// Inclusive (min, max) buildable altitude of a world.
    fn altitude_range(&self, world: &WorldId) -> (i32, i32);

    /// Participants within `radius` cells (horizontal distance) of `pos`.
    fn participants_near(&self, world: &WorldId, pos: CellPos, radius: f64) -> Vec<Participant>;

    /// Every participant currently online, across all worlds.
    fn all_participants(&self) -> Vec<Participant>;

    /// Asks the host to load the world partition containing `pos`. Best
    /// effort; a failure just means later cell queries return `None`.
    fn ensure_loaded(&self, world: &WorldId, pos: CellPos);

    /// Number of participants currently online.
    fn participant_count(&self) -> usize {
        self.all_participants().len()
    }

    /// Whether the cell is solid. Unknown cells count as not solid.
    fn is_solid(&self, world: &WorldId, pos: CellPos) -> bool {
        self.cell(world, pos).is_some_and(|c| c.solid)
    }

    /// Whether the cell is passable (air or unloaded-unknown).
    fn is_clear(&self, world: &WorldId, pos: CellPos) -> bool {
        !self.is_solid(world, pos)
    }

    /// Whether the cell is hazardous. Unknown cells count as safe.
    fn is_hazard(&self, world: &WorldId, pos: CellPos) -> bool {
        self.cell(world, pos).is_some_and(|c| c.hazardous)
    }
}

/// Actor lifecycle port: materializes and checks host-owned actors.
pub trait ActorSpawner: Send + Sync {
    /// Materializes an actor from a template at a position. Returns `None`
    /// when the host refuses (unknown template, full world, plugin error).
    /// Refusal is expected and never fatal.
    fn spawn(&self, template: &str, world: &WorldId, pos: DVec3, tier: u8) -> Option<ActorHandle>;

    /// Whether the actor behind the handle still exists and is alive.
    fn is_valid(&self, handle: ActorHandle) -> bool;
}
