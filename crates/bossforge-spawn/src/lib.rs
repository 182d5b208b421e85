//! # Bossforge Spawn
//!
//! World-boss spawn orchestration for a host simulation process.
//!
//! This crate decides *whether*, *where*, and *what* bosses to materialize,
//! tracks their lifecycle, and reclaims capacity when they go away:
//! - Spawn point registry with live per-point counters
//! - Three candidate strategies (fixed, near-participant, region)
//! - Terrain safety analysis and multi-criteria location scoring
//! - TTL selection cache
//! - Periodic refresh scheduler and health monitor (tokio tasks)
//! - Config hot reload that preserves live counters
//! - Lifecycle event bus for reward/persistence/announcement consumers
//!
//! The host supplies three ports: a world query, an actor spawner, and an
//! event sink. Everything else is owned by [`scheduler::SpawnOrchestrator`].

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod cache;
pub mod config;
pub mod criteria;
pub mod events;
pub mod monitor;
pub mod ports;
pub mod registry;
pub mod reload;
pub mod runtime;
pub mod safety;
pub mod scheduler;
pub mod scorer;
pub mod stats;
pub mod strategy;
pub mod tracker;

#[cfg(test)]
pub mod testing;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::cache::*;
    pub use crate::config::*;
    pub use crate::criteria::*;
    pub use crate::events::*;
    pub use crate::monitor::*;
    pub use crate::ports::*;
    pub use crate::registry::*;
    pub use crate::reload::*;
    pub use crate::runtime::*;
    pub use crate::safety::*;
    pub use crate::scheduler::*;
    pub use crate::scorer::*;
    pub use crate::stats::*;
    pub use crate::strategy::*;
    pub use crate::tracker::*;
}

pub use prelude::*;
