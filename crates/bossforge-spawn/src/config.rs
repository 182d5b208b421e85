//! Spawn-point and refresh-system configuration.
//!
//! The config document is TOML: global scalars plus a list of spawn points.
//! Loading never crashes startup; a bad document falls back to the previous
//! config (hot reload) or to hardcoded defaults (initial load).

use bossforge_common::{CellPos, ConfigError, WorldId};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Default refresh-check interval in seconds.
pub const DEFAULT_CHECK_INTERVAL_SECS: u64 = 30;
/// Default global cap on concurrently active bosses.
pub const DEFAULT_MAX_ACTIVE: u32 = 10;
/// Default minimum number of online participants before any spawn attempt.
pub const DEFAULT_MIN_PARTICIPANTS: u32 = 3;
/// Default per-point respawn cooldown in seconds.
pub const DEFAULT_COOLDOWN_SECS: u64 = 7200;
/// Minimum allowed per-point cooldown in seconds.
pub const MIN_COOLDOWN_SECS: u64 = 60;

/// How a spawn point generates location candidates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SpawnMode {
    /// Anchor coordinate, optionally with a uniform random offset
    #[default]
    Fixed,
    /// Near a randomly chosen online participant
    NearParticipant,
    /// Uniformly random inside one of the configured sub-regions
    Region,
}

impl SpawnMode {
    /// Strategy tag used for registry lookup and cache keys.
    #[must_use]
    pub const fn tag(self) -> &'static str {
        match self {
            Self::Fixed => "fixed",
            Self::NearParticipant => "near-participant",
            Self::Region => "region",
        }
    }
}

/// An axis-aligned sub-region, configured as `"world,x1,z1,x2,z2"`.
///
/// Corner order does not matter; bounds are normalized on parse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionBounds {
    /// World the region lives in
    pub world: WorldId,
    /// Minimum X (inclusive)
    pub min_x: i32,
    /// Maximum X (inclusive)
    pub max_x: i32,
    /// Minimum Z (inclusive)
    pub min_z: i32,
    /// Maximum Z (inclusive)
    pub max_z: i32,
}

impl FromStr for RegionBounds {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(',').map(str::trim).collect();
        if parts.len() != 5 {
            return Err(ConfigError::Parse(format!(
                "region '{s}' must be 'world,x1,z1,x2,z2'"
            )));
        }
        let coord = |i: usize| -> Result<i32, ConfigError> {
            parts[i]
                .parse()
                .map_err(|_| ConfigError::Parse(format!("region '{s}': bad coordinate '{}'", parts[i])))
        };
        let (x1, z1, x2, z2) = (coord(1)?, coord(2)?, coord(3)?, coord(4)?);
        Ok(Self {
            world: WorldId::from(parts[0]),
            min_x: x1.min(x2),
            max_x: x1.max(x2),
            min_z: z1.min(z2),
            max_z: z1.max(z2),
        })
    }
}

/// A configured source of boss spawns.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnPoint {
    /// Unique spawn point ID
    pub id: String,
    /// World the anchor lives in
    pub world: String,
    /// Anchor X coordinate
    pub x: i32,
    /// Anchor Y coordinate
    pub y: i32,
    /// Anchor Z coordinate
    pub z: i32,
    /// Candidate generation mode
    pub mode: SpawnMode,
    /// Actor template to materialize
    pub template: String,
    /// Difficulty tier (1-4)
    pub tier: u8,
    /// Maximum concurrently live bosses from this point
    pub max_count: u32,
    /// Point participates in refresh ticks
    pub enabled: bool,
    /// Respawn cooldown in seconds
    pub cooldown_secs: u64,
    /// Uniform random offset radius around the anchor (fixed mode; 0 = none)
    pub random_radius: i32,
    /// Project candidates down to the first safe ground cell
    pub auto_find_ground: bool,
    /// Sub-regions for region mode, each `"world,x1,z1,x2,z2"`
    pub regions: Vec<String>,
    /// Minimum distance from the chosen participant (near-participant mode)
    pub min_distance: i32,
    /// Maximum distance from the chosen participant (near-participant mode)
    pub max_distance: i32,
    /// Enable the full weighted scorer (otherwise safety/openness only)
    pub weighted_scoring: bool,
    /// Preferred biome names for environment matching
    pub preferred_biomes: Vec<String>,
    /// Weight of the openness sub-score
    pub openness_weight: f64,
    /// Weight of the environment-match sub-score
    pub environment_weight: f64,
    /// Weight of the ambient-energy sub-score
    pub energy_weight: f64,
    /// Weight of the crowding sub-score
    pub crowding_weight: f64,
    /// Minimum acceptable combined score; below this the point spawns nothing
    pub min_score: f64,

    /// Live count of bosses spawned from this point. Runtime state, not
    /// part of the config document; preserved across hot reloads.
    #[serde(skip)]
    pub current_count: u32,
    /// When this point last spawned successfully. Runtime state.
    #[serde(skip)]
    pub last_spawn: Option<Instant>,
}

impl Default for SpawnPoint {
    fn default() -> Self {
        Self {
            id: String::new(),
            world: String::new(),
            x: 0,
            y: 64,
            z: 0,
            mode: SpawnMode::Fixed,
            template: String::new(),
            tier: 1,
            max_count: 1,
            enabled: true,
            cooldown_secs: DEFAULT_COOLDOWN_SECS,
            random_radius: 0,
            auto_find_ground: false,
            regions: Vec::new(),
            min_distance: 50,
            max_distance: 200,
            weighted_scoring: false,
            preferred_biomes: Vec::new(),
            openness_weight: 0.3,
            environment_weight: 0.2,
            energy_weight: 0.3,
            crowding_weight: 0.2,
            min_score: 0.4,
            current_count: 0,
            last_spawn: None,
        }
    }
}

impl SpawnPoint {
    /// Creates a minimal valid point for the given anchor and template.
    #[must_use]
    pub fn new(id: impl Into<String>, world: impl Into<String>, x: i32, y: i32, z: i32, template: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            world: world.into(),
            x,
            y,
            z,
            template: template.into(),
            ..Default::default()
        }
    }

    /// Anchor cell of this point.
    #[must_use]
    pub const fn anchor(&self) -> CellPos {
        CellPos::new(self.x, self.y, self.z)
    }

    /// World ID of the anchor.
    #[must_use]
    pub fn world_id(&self) -> WorldId {
        WorldId::from(self.world.as_str())
    }

    /// Whether this point may attempt a spawn right now: enabled, below
    /// capacity, and past its cooldown.
    #[must_use]
    pub fn is_ready(&self, now: Instant) -> bool {
        if !self.enabled || self.current_count >= self.max_count {
            return false;
        }
        match self.last_spawn {
            Some(t) => now.duration_since(t) >= Duration::from_secs(self.cooldown_secs),
            None => true,
        }
    }

    /// Remaining cooldown at `now`; zero when ready.
    #[must_use]
    pub fn remaining_cooldown(&self, now: Instant) -> Duration {
        match self.last_spawn {
            Some(t) => Duration::from_secs(self.cooldown_secs)
                .saturating_sub(now.duration_since(t)),
            None => Duration::ZERO,
        }
    }

    /// All validation problems with this point; empty when valid.
    #[must_use]
    pub fn validation_errors(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if self.id.is_empty() {
            errors.push("id must not be empty".into());
        }
        if self.world.is_empty() {
            errors.push(format!("point '{}': world must not be empty", self.id));
        }
        if self.template.is_empty() {
            errors.push(format!("point '{}': template must not be empty", self.id));
        }
        if !(1..=4).contains(&self.tier) {
            errors.push(format!("point '{}': tier must be 1-4, got {}", self.id, self.tier));
        }
        if self.max_count == 0 {
            errors.push(format!("point '{}': max_count must be at least 1", self.id));
        }
        if self.cooldown_secs < MIN_COOLDOWN_SECS {
            errors.push(format!(
                "point '{}': cooldown_secs must be at least {MIN_COOLDOWN_SECS}",
                self.id
            ));
        }
        if !(0.0..=1.0).contains(&self.min_score) {
            errors.push(format!("point '{}': min_score must be in 0.0-1.0", self.id));
        }
        if self.mode == SpawnMode::Region {
            if self.regions.is_empty() {
                errors.push(format!("point '{}': region mode needs at least one region", self.id));
            }
            for region in &self.regions {
                if let Err(e) = region.parse::<RegionBounds>() {
                    errors.push(format!("point '{}': {e}", self.id));
                }
            }
        }
        if self.mode == SpawnMode::NearParticipant {
            if self.min_distance < 0 {
                errors.push(format!("point '{}': min_distance must not be negative", self.id));
            }
            if self.min_distance > self.max_distance {
                errors.push(format!(
                    "point '{}': min_distance {} exceeds max_distance {}",
                    self.id, self.min_distance, self.max_distance
                ));
            }
        }
        for (name, w) in [
            ("openness_weight", self.openness_weight),
            ("environment_weight", self.environment_weight),
            ("energy_weight", self.energy_weight),
            ("crowding_weight", self.crowding_weight),
        ] {
            if w < 0.0 {
                errors.push(format!("point '{}': {name} must not be negative", self.id));
            }
        }
        errors
    }
}

/// Global refresh-system configuration: scalars plus the spawn point list.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RefreshConfig {
    /// Whole system on/off switch
    pub enabled: bool,
    /// Seconds between refresh-scheduler ticks
    pub check_interval_secs: u64,
    /// Global cap on concurrently active bosses
    pub max_active: u32,
    /// Minimum online participants before any spawn attempt
    pub min_participants: u32,
    /// All configured spawn points
    #[serde(rename = "point")]
    pub points: Vec<SpawnPoint>,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            check_interval_secs: DEFAULT_CHECK_INTERVAL_SECS,
            max_active: DEFAULT_MAX_ACTIVE,
            min_participants: DEFAULT_MIN_PARTICIPANTS,
            points: Vec::new(),
        }
    }
}

impl RefreshConfig {
    /// All validation problems; empty when valid. Points that fail validate
    /// individually are reported but do not invalidate the whole document;
    /// the loader skips them.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if !(5..=3600).contains(&self.check_interval_secs) {
            errors.push(format!(
                "check_interval_secs must be 5-3600, got {}",
                self.check_interval_secs
            ));
        }
        if !(1..=100).contains(&self.max_active) {
            errors.push(format!("max_active must be 1-100, got {}", self.max_active));
        }
        if self.min_participants > 1000 {
            errors.push(format!(
                "min_participants must be at most 1000, got {}",
                self.min_participants
            ));
        }
        let mut seen = std::collections::HashSet::new();
        for point in &self.points {
            if !point.id.is_empty() && !seen.insert(point.id.as_str()) {
                errors.push(format!("duplicate spawn point id '{}'", point.id));
            }
        }
        errors
    }

    /// Loads and validates a config document.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let config: Self =
            toml::from_str(&text).map_err(|e| ConfigError::Parse(e.to_string()))?;
        let problems = config.validate();
        if problems.is_empty() {
            Ok(config)
        } else {
            Err(ConfigError::Invalid { problems })
        }
    }

    /// Loads a config document, falling back to defaults when the file is
    /// missing or invalid. Used at startup; never fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match Self::load_from(path) {
            Ok(config) => {
                info!(
                    points = config.points.len(),
                    interval = config.check_interval_secs,
                    "loaded spawn config from {}",
                    path.display()
                );
                config
            }
            Err(e) => {
                warn!("failed to load spawn config from {}: {e}; using defaults", path.display());
                Self::default()
            }
        }
    }

    /// Saves this config as a TOML document (admin-driven edits).
    pub fn save_to(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let text = toml::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))?;
        std::fs::write(path.as_ref(), text)?;
        Ok(())
    }

    /// Points that pass individual validation, with problems logged.
    #[must_use]
    pub fn valid_points(&self) -> Vec<SpawnPoint> {
        let mut valid = Vec::new();
        for point in &self.points {
            let errors = point.validation_errors();
            if errors.is_empty() {
                valid.push(point.clone());
            } else {
                warn!("skipping spawn point '{}': {}", point.id, errors.join("; "));
            }
        }
        valid
    }
}
