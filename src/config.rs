use serde::{Deserialize, Serialize};

use crate::error::MatchError;

const WEIGHT_TOLERANCE: f64 = 1e-6;

/// Weights for the emission model's three components. Must sum to 1.
///
/// Defaults are the ones the weighting scheme was originally tuned with:
/// distance dominates, orientation is a strong secondary signal, speed limit
/// is a minor tie-breaker.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EmissionWeights {
    pub distance: f64,
    pub orientation: f64,
    pub speed_limit: f64,
}

impl Default for EmissionWeights {
    fn default() -> Self {
        EmissionWeights {
            distance: 0.60,
            orientation: 0.35,
            speed_limit: 0.05,
        }
    }
}

impl EmissionWeights {
    fn sum(&self) -> f64 {
        self.distance + self.orientation + self.speed_limit
    }
}

/// Weights for the transition model's two components. Must sum to 1.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TransitionWeights {
    pub distance_diff: f64,
    pub backtrack: f64,
}

impl Default for TransitionWeights {
    fn default() -> Self {
        TransitionWeights {
            distance_diff: 0.8,
            backtrack: 0.2,
        }
    }
}

impl TransitionWeights {
    fn sum(&self) -> f64 {
        self.distance_diff + self.backtrack
    }
}

/// Options for a single map-matching run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchOptions {
    /// Initial candidate search radius, in meters.
    pub radius_m: f64,
    /// Cap on candidates retained per observation.
    pub max_states: usize,
    /// Reserved for future beam-search pruning; unused.
    pub beam_window: Option<usize>,
    pub emission_weights: EmissionWeights,
    pub transition_weights: TransitionWeights,
    /// Index of the first observation to process (inclusive).
    pub start: usize,
    /// Index one past the last observation to process, or `None` for "to the end".
    pub end: Option<usize>,
}

impl Default for MatchOptions {
    fn default() -> Self {
        MatchOptions {
            radius_m: 20.0,
            max_states: 10,
            beam_window: None,
            emission_weights: EmissionWeights::default(),
            transition_weights: TransitionWeights::default(),
            start: 0,
            end: None,
        }
    }
}

impl MatchOptions {
    /// Checks that weights sum to 1 (within tolerance) and the radius is
    /// positive. Called once at startup, never on the hot path.
    pub fn validate(&self) -> Result<(), MatchError> {
        if self.radius_m <= 0.0 {
            return Err(MatchError::InvalidConfiguration(format!(
                "radius_m must be positive, got {}",
                self.radius_m
            )));
        }
        if self.max_states == 0 {
            return Err(MatchError::InvalidConfiguration(
                "max_states must be at least 1".to_string(),
            ));
        }

        let e_sum = self.emission_weights.sum();
        if (e_sum - 1.0).abs() > WEIGHT_TOLERANCE {
            return Err(MatchError::InvalidConfiguration(format!(
                "emission_weights must sum to 1.0, got {e_sum}"
            )));
        }

        let t_sum = self.transition_weights.sum();
        if (t_sum - 1.0).abs() > WEIGHT_TOLERANCE {
            return Err(MatchError::InvalidConfiguration(format!(
                "transition_weights must sum to 1.0, got {t_sum}"
            )));
        }

        Ok(())
    }
}
