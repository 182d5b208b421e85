//! ID types for bosses and externally-owned actors.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// Global counter for boss record IDs.
static BOSS_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Unique identifier for a tracked boss record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BossId(u64);

impl BossId {
    /// Creates a new unique boss ID.
    #[must_use]
    pub fn new() -> Self {
        Self(BOSS_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Creates a boss ID from a raw value (for deserialization).
    #[must_use]
    pub const fn from_raw(value: u64) -> Self {
        Self(value)
    }

    /// Returns the raw ID value.
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }

    /// Null/invalid boss ID.
    pub const NULL: Self = Self(0);

    /// Checks if this is a valid (non-null) boss ID.
    #[must_use]
    pub const fn is_valid(self) -> bool {
        self.0 != 0
    }
}

impl Default for BossId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for BossId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "boss#{}", self.0)
    }
}

/// Opaque handle to an actor owned by the host process.
///
/// The spawn orchestrator never dereferences the handle; it only passes it
/// back to the actor port for validity checks and uses it as a lookup key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ActorHandle(u64);

impl ActorHandle {
    /// Creates an actor handle from a raw host value.
    #[must_use]
    pub const fn from_raw(value: u64) -> Self {
        Self(value)
    }

    /// Returns the raw handle value.
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for ActorHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "actor#{}", self.0)
    }
}

/// Global counter for participant IDs (used by test worlds and hosts that
/// do not bring their own identifier scheme).
static PARTICIPANT_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Unique identifier for a participant (player) in the world.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ParticipantId(u64);

impl ParticipantId {
    /// Creates a new unique participant ID.
    #[must_use]
    pub fn new() -> Self {
        Self(PARTICIPANT_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Creates a participant ID from a raw value.
    #[must_use]
    pub const fn from_raw(value: u64) -> Self {
        Self(value)
    }

    /// Returns the raw ID value.
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl Default for ParticipantId {
    fn default() -> Self {
        Self::new()
    }
}
