//! # Bossforge Common
//!
//! Common types and shared abstractions for the Bossforge spawn system:
//! - Coordinate types (worlds, cells, spawn positions)
//! - ID types (`BossId`, `ActorHandle`, `ParticipantId`)
//! - Common error types

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod coords;
pub mod error;
pub mod ids;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::coords::*;
    pub use crate::error::*;
    pub use crate::ids::*;
}

pub use prelude::*;
