//! Selection criteria: scoring weights, thresholds, and cache parameters.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Weights and thresholds steering candidate selection.
///
/// The four weights are normalized to sum to 1.0 before use; callers may
/// configure any non-negative values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectionCriteria {
    /// Weight of the safety sub-score
    pub safety_weight: f64,
    /// Weight of spreading spawns away from participant clusters
    pub distribution_weight: f64,
    /// Weight of distance-based separation from other bosses
    pub distance_weight: f64,
    /// Weight of pure randomness (keeps selection from being predictable)
    pub random_weight: f64,

    /// Minimum safety score a candidate must reach
    pub min_safety_score: f64,

    /// Whether the selection cache is consulted
    pub cache_enabled: bool,
    /// How long a cached selection stays valid, in milliseconds
    pub cache_ttl_millis: u64,
    /// Maximum cached entries before a full clear
    pub max_cache_size: usize,
}

impl Default for SelectionCriteria {
    fn default() -> Self {
        Self::balanced()
    }
}

impl SelectionCriteria {
    /// Balanced preset: 0.30 / 0.30 / 0.20 / 0.20.
    #[must_use]
    pub fn balanced() -> Self {
        Self {
            safety_weight: 0.30,
            distribution_weight: 0.30,
            distance_weight: 0.20,
            random_weight: 0.20,
            min_safety_score: 0.50,
            cache_enabled: true,
            cache_ttl_millis: 30_000,
            max_cache_size: 100,
        }
    }

    /// Safety-first preset: heavier safety weight, higher safety floor.
    #[must_use]
    pub fn safety_first() -> Self {
        Self {
            safety_weight: 0.50,
            distribution_weight: 0.20,
            distance_weight: 0.20,
            random_weight: 0.10,
            min_safety_score: 0.70,
            ..Self::balanced()
        }
    }

    /// Distribution-first preset: spreads bosses away from clusters.
    #[must_use]
    pub fn distributed() -> Self {
        Self {
            safety_weight: 0.20,
            distribution_weight: 0.50,
            distance_weight: 0.20,
            random_weight: 0.10,
            ..Self::balanced()
        }
    }

    /// Randomness-first preset: unpredictable placements.
    #[must_use]
    pub fn random() -> Self {
        Self {
            safety_weight: 0.10,
            distribution_weight: 0.10,
            distance_weight: 0.20,
            random_weight: 0.60,
            min_safety_score: 0.30,
            ..Self::balanced()
        }
    }

    /// The four weights normalized to sum to 1.0.
    ///
    /// If all weights are zero (or negative, which validation rejects), the
    /// balanced preset's weights are returned instead.
    #[must_use]
    pub fn normalized_weights(&self) -> [f64; 4] {
        let raw = [
            self.safety_weight,
            self.distribution_weight,
            self.distance_weight,
            self.random_weight,
        ];
        let sum: f64 = raw.iter().sum();
        if sum <= 0.0 {
            return [0.30, 0.30, 0.20, 0.20];
        }
        raw.map(|w| w / sum)
    }

    /// Whether the configured weights already sum to 1.0 (within epsilon).
    #[must_use]
    pub fn weights_valid(&self) -> bool {
        let sum = self.safety_weight
            + self.distribution_weight
            + self.distance_weight
            + self.random_weight;
        (sum - 1.0).abs() < 0.01
    }

    /// Cache TTL as a duration.
    #[must_use]
    pub const fn cache_ttl(&self) -> Duration {
        Duration::from_millis(self.cache_ttl_millis)
    }
}
