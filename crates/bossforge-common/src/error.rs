//! Error types for the Bossforge spawn core.

use thiserror::Error;

/// Top-level error type for spawn-system operations.
///
/// Per-point failures (`NoCandidateFound`, `CandidateRejected`,
/// `ActorSpawnFailed`) are recoverable: the scheduler logs them and moves on
/// to the next point. They are modeled as errors so call sites are forced to
/// decide that explicitly.
#[derive(Debug, Error)]
pub enum BossError {
    /// Configuration load or validation errors
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// A spawn point with the same ID is already registered
    #[error("Spawn point '{0}' already registered")]
    DuplicateSpawnPoint(String),

    /// The referenced spawn point does not exist
    #[error("Spawn point '{0}' not found")]
    SpawnPointNotFound(String),

    /// A strategy produced no usable candidate for this tick
    #[error("No spawn candidate found for point '{0}'")]
    NoCandidateFound(String),

    /// All candidates scored below the acceptance threshold
    #[error("All candidates for point '{point}' scored below {min_score:.2}")]
    CandidateRejected {
        /// Spawn point ID
        point: String,
        /// Minimum acceptable score
        min_score: f64,
    },

    /// The external actor port declined to materialize the actor
    #[error("Actor spawn failed for template '{0}'")]
    ActorSpawnFailed(String),
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// IO error while reading or writing the config document
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The document could not be parsed
    #[error("Parse error: {0}")]
    Parse(String),

    /// The document parsed but failed validation
    #[error("Invalid config: {}", problems.join("; "))]
    Invalid {
        /// All validation problems found, not just the first
        problems: Vec<String>,
    },

    /// The file watcher for hot reload could not be set up
    #[error("Watch error: {0}")]
    Watch(String),
}

/// Result type alias for spawn-system operations.
pub type BossResult<T> = Result<T, BossError>;
