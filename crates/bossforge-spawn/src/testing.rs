//! In-memory test doubles for the collaborator ports.
//!
//! Only compiled for unit tests. `GridWorld` models worlds as a flat ground
//! plane plus sparse per-cell overrides, which is enough to stage every
//! terrain shape the strategies and the safety analyzer care about.

use crate::events::{BossEvent, EventSink};
use crate::ports::{ActorSpawner, CellInfo, Participant, WorldQuery};
use bossforge_common::{ActorHandle, CellPos, ParticipantId, WorldId};
use glam::DVec3;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};

/// One test world: flat ground with sparse overrides.
struct Terrain {
    /// Cells at or below this altitude are solid
    ground_y: i32,
    /// Per-cell overrides
    cells: HashMap<CellPos, CellInfo>,
    /// Per-column biome overrides, keyed by (x, z)
    biomes: HashMap<(i32, i32), String>,
    /// Default biome for unlisted columns
    default_biome: String,
}

/// In-memory [`WorldQuery`] implementation.
pub struct GridWorld {
    worlds: Mutex<HashMap<String, Terrain>>,
    participants: Mutex<Vec<Participant>>,
    min_y: i32,
    max_y: i32,
    cell_queries: AtomicUsize,
}

impl GridWorld {
    /// A single world with flat solid ground at `ground_y` and air above.
    pub fn flat(name: &str, ground_y: i32) -> Self {
        let grid = Self::empty();
        grid.add_world(name, ground_y);
        grid
    }

    /// A single world that is solid rock everywhere within bounds.
    pub fn solid_rock(name: &str) -> Self {
        let grid = Self::empty();
        grid.add_world(name, 255);
        grid
    }

    /// No worlds at all.
    pub fn empty() -> Self {
        Self {
            worlds: Mutex::new(HashMap::new()),
            participants: Mutex::new(Vec::new()),
            min_y: 0,
            max_y: 255,
            cell_queries: AtomicUsize::new(0),
        }
    }

    /// Adds another flat world.
    pub fn add_world(&self, name: &str, ground_y: i32) {
        self.worlds.lock().insert(
            name.to_owned(),
            Terrain {
                ground_y,
                cells: HashMap::new(),
                biomes: HashMap::new(),
                default_biome: "plains".to_owned(),
            },
        );
    }

    /// Overrides one cell.
    pub fn set_cell(&self, world: &str, pos: CellPos, info: CellInfo) {
        if let Some(t) = self.worlds.lock().get_mut(world) {
            t.cells.insert(pos, info);
        }
    }

    /// Marks one cell hazardous (and keeps its solidity).
    pub fn set_hazard(&self, world: &str, pos: CellPos) {
        let solid = self.is_solid(&WorldId::from(world), pos);
        self.set_cell(world, pos, CellInfo { solid, hazardous: true });
    }

    /// Carves an air pocket at a cell.
    pub fn carve(&self, world: &str, pos: CellPos) {
        self.set_cell(world, pos, CellInfo { solid: false, hazardous: false });
    }

    /// Sets the default biome of a world.
    pub fn set_default_biome(&self, world: &str, biome: &str) {
        if let Some(t) = self.worlds.lock().get_mut(world) {
            t.default_biome = biome.to_owned();
        }
    }

    /// Sets the biome of one column.
    pub fn set_biome_at(&self, world: &str, x: i32, z: i32, biome: &str) {
        if let Some(t) = self.worlds.lock().get_mut(world) {
            t.biomes.insert((x, z), biome.to_owned());
        }
    }

    /// Adds a participant and returns its ID.
    pub fn add_participant(&self, world: &str, pos: CellPos) -> ParticipantId {
        let id = ParticipantId::new();
        self.participants.lock().push(Participant {
            id,
            world: WorldId::from(world),
            pos,
        });
        id
    }

    /// Removes all participants.
    pub fn clear_participants(&self) {
        self.participants.lock().clear();
    }

    /// Number of `cell` queries issued so far.
    pub fn cell_query_count(&self) -> usize {
        self.cell_queries.load(Ordering::Relaxed)
    }
}

impl WorldQuery for GridWorld {
    fn cell(&self, world: &WorldId, pos: CellPos) -> Option<CellInfo> {
        self.cell_queries.fetch_add(1, Ordering::Relaxed);
        if pos.y < self.min_y || pos.y > self.max_y {
            return None;
        }
        let worlds = self.worlds.lock();
        let terrain = worlds.get(world.name())?;
        Some(match terrain.cells.get(&pos) {
            Some(info) => *info,
            None => CellInfo {
                solid: pos.y <= terrain.ground_y,
                hazardous: false,
            },
        })
    }

    fn biome(&self, world: &WorldId, pos: CellPos) -> Option<String> {
        let worlds = self.worlds.lock();
        let terrain = worlds.get(world.name())?;
        Some(
            terrain
                .biomes
                .get(&(pos.x, pos.z))
                .cloned()
                .unwrap_or_else(|| terrain.default_biome.clone()),
        )
    }

    fn highest_cell_y(&self, world: &WorldId, x: i32, z: i32) -> Option<i32> {
        let worlds = self.worlds.lock();
        let terrain = worlds.get(world.name())?;
        for y in (self.min_y..=self.max_y).rev() {
            let pos = CellPos::new(x, y, z);
            let solid = match terrain.cells.get(&pos) {
                Some(info) => info.solid,
                None => y <= terrain.ground_y,
            };
            if solid {
                return Some(y);
            }
        }
        Some(self.min_y)
    }

    fn altitude_range(&self, _world: &WorldId) -> (i32, i32) {
        (self.min_y, self.max_y)
    }

    fn participants_near(&self, world: &WorldId, pos: CellPos, radius: f64) -> Vec<Participant> {
        self.participants
            .lock()
            .iter()
            .filter(|p| p.world == *world && p.pos.horizontal_distance(pos) <= radius)
            .cloned()
            .collect()
    }

    fn all_participants(&self) -> Vec<Participant> {
        self.participants.lock().clone()
    }

    fn ensure_loaded(&self, _world: &WorldId, _pos: CellPos) {}
}

/// Scripted [`ActorSpawner`].
pub struct StubSpawner {
    accepting: AtomicBool,
    next_handle: AtomicU64,
    spawned: Mutex<Vec<(String, WorldId, DVec3, u8)>>,
    dead: Mutex<HashSet<ActorHandle>>,
}

impl StubSpawner {
    /// A spawner that accepts every request.
    pub fn new() -> Self {
        Self {
            accepting: AtomicBool::new(true),
            next_handle: AtomicU64::new(1),
            spawned: Mutex::new(Vec::new()),
            dead: Mutex::new(HashSet::new()),
        }
    }

    /// Makes every subsequent spawn request fail.
    pub fn refuse(&self) {
        self.accepting.store(false, Ordering::Relaxed);
    }

    /// Marks an actor as no longer valid.
    pub fn kill(&self, handle: ActorHandle) {
        self.dead.lock().insert(handle);
    }

    /// Every spawn request that was accepted.
    pub fn spawned(&self) -> Vec<(String, WorldId, DVec3, u8)> {
        self.spawned.lock().clone()
    }

    /// Number of accepted spawn requests.
    pub fn spawn_count(&self) -> usize {
        self.spawned.lock().len()
    }
}

impl ActorSpawner for StubSpawner {
    fn spawn(&self, template: &str, world: &WorldId, pos: DVec3, tier: u8) -> Option<ActorHandle> {
        if !self.accepting.load(Ordering::Relaxed) {
            return None;
        }
        self.spawned
            .lock()
            .push((template.to_owned(), world.clone(), pos, tier));
        Some(ActorHandle::from_raw(
            self.next_handle.fetch_add(1, Ordering::Relaxed),
        ))
    }

    fn is_valid(&self, handle: ActorHandle) -> bool {
        !self.dead.lock().contains(&handle)
    }
}

/// Event sink that remembers everything it saw.
#[derive(Default)]
pub struct CollectingSink {
    events: Mutex<Vec<BossEvent>>,
}

impl CollectingSink {
    /// New empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all published events.
    pub fn events(&self) -> Vec<BossEvent> {
        self.events.lock().clone()
    }

    /// Number of published events.
    pub fn len(&self) -> usize {
        self.events.lock().len()
    }
}

impl EventSink for CollectingSink {
    fn publish(&self, event: BossEvent) {
        self.events.lock().push(event);
    }
}
