//! Emission scoring: how well does a candidate segment explain an
//! observation?

use crate::candidates::Candidate;
use crate::config::EmissionWeights;
use crate::geo;
use crate::ingest::Observation;

/// Default scale (meters) for the distance decay. Chosen so that a
/// candidate at the search radius (20 m) still scores a meaningful amount;
/// callers can tune this alongside `MatchOptions::radius_m`.
pub const DEFAULT_SIGMA_D: f64 = 10.0;

/// Source of speed-limit data for a candidate segment. No production source
/// is wired in yet; [`NoSpeedLimitData`] is the only implementation and
/// always returns a neutral score.
pub trait SpeedLimitSource {
    fn speed_compatibility(&self, candidate: &Candidate, observation: &Observation) -> f64;
}

/// The only currently-available speed-limit source: no data, so every
/// candidate is equally compatible.
pub struct NoSpeedLimitData;

impl SpeedLimitSource for NoSpeedLimitData {
    fn speed_compatibility(&self, _candidate: &Candidate, _observation: &Observation) -> f64 {
        1.0
    }
}

/// `exp(-d / sigma_d)`. Monotonically decreasing in `d`; 1.0 at `d == 0`.
pub fn s_distance(distance: f64, sigma_d: f64) -> f64 {
    (-distance / sigma_d).exp()
}

/// Orientation compatibility in [0, 1]. For oneway segments, compares the
/// segment's bearing directly against the observed heading; for two-way
/// segments, takes the better of the two possible travel directions.
pub fn s_orientation(candidate: &Candidate, observation: &Observation) -> f64 {
    let forward = half_cosine_score(candidate.bearing, observation.heading);
    if candidate.oneway {
        forward
    } else {
        let reverse = half_cosine_score((candidate.bearing + 180.0) % 360.0, observation.heading);
        forward.max(reverse)
    }
}

fn half_cosine_score(bearing: f64, heading: f64) -> f64 {
    let diff = geo::angle_diff(bearing, heading);
    (1.0 + (diff * std::f64::consts::PI / 180.0).cos()) / 2.0
}

/// Speed-limit compatibility, delegated to `source`. Defaults to 1.0 with
/// [`NoSpeedLimitData`].
pub fn s_speed(candidate: &Candidate, observation: &Observation, source: &dyn SpeedLimitSource) -> f64 {
    source.speed_compatibility(candidate, observation)
}

/// Weighted linear combination of the three components, clamped to [0, 1].
pub fn emission_probability(
    candidate: &Candidate,
    observation: &Observation,
    weights: &EmissionWeights,
    sigma_d: f64,
    speed_source: &dyn SpeedLimitSource,
) -> f64 {
    let d = s_distance(candidate.distance, sigma_d);
    let o = s_orientation(candidate, observation);
    let s = s_speed(candidate, observation, speed_source);

    let value = weights.distance * d + weights.orientation * o + weights.speed_limit * s;
    value.clamp(0.0, 1.0)
}
