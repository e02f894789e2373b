//! Transition scoring: how plausible is it to move from a previous
//! candidate to a current one, given the observed displacement?

use crate::candidates::Candidate;
use crate::config::TransitionWeights;
use crate::geo::{self, ProjectedPoint};

/// Default scale (meters) for the distance-difference decay.
pub const DEFAULT_SIGMA_T: f64 = 10.0;

/// Factor applied when movement runs against a oneway segment's declared
/// direction. Kept small (<= 0.1) so it suppresses rather than forbids.
const BACKTRACK_PENALTY: f64 = 0.05;

/// `exp(-|d_obs - d_seg| / sigma_t)`, where `d_seg` approximates the
/// along-network distance with the Euclidean distance between the two
/// candidates' projections (no routing graph is available, a documented
/// limitation rather than a bug).
pub fn s_distance_diff(p_prev: ProjectedPoint, p_curr: ProjectedPoint, prev: &Candidate, curr: &Candidate, sigma_t: f64) -> f64 {
    let d_obs = geo::distance(p_prev, p_curr);
    let d_seg = geo::distance(prev.projection, curr.projection);
    (-(d_obs - d_seg).abs() / sigma_t).exp()
}

/// Penalizes movement against a oneway segment's declared direction.
/// Returns [`BACKTRACK_PENALTY`] if the displacement vector from the
/// previous to the current projection is more than 90 degrees off either
/// endpoint's bearing and that endpoint is `oneway`; otherwise 1.0.
pub fn s_backtrack(prev: &Candidate, curr: &Candidate) -> f64 {
    if !prev.oneway && !curr.oneway {
        return 1.0;
    }
    let movement_bearing = geo::bearing(prev.projection, curr.projection);
    if !geo::bearing_defined(prev.projection, curr.projection) {
        return 1.0;
    }

    let against_prev = prev.oneway && geo::angle_diff(movement_bearing, prev.bearing) > 90.0;
    let against_curr = curr.oneway && geo::angle_diff(movement_bearing, curr.bearing) > 90.0;

    if against_prev || against_curr {
        BACKTRACK_PENALTY
    } else {
        1.0
    }
}

/// Builds the full `T[j][i]` transition matrix between the previous
/// column's candidates (`prev`) and the current column's candidates
/// (`curr`), given the observed displacement from `p_prev` to `p_curr`.
pub fn transition_matrix(
    p_prev: ProjectedPoint,
    p_curr: ProjectedPoint,
    prev: &[Candidate],
    curr: &[Candidate],
    weights: &TransitionWeights,
    sigma_t: f64,
) -> Vec<Vec<f64>> {
    prev.iter()
        .map(|p| {
            curr.iter()
                .map(|c| {
                    let dd = s_distance_diff(p_prev, p_curr, p, c, sigma_t);
                    let bt = s_backtrack(p, c);
                    let value = weights.distance_diff * dd + weights.backtrack * bt;
                    value.clamp(0.0, 1.0)
                })
                .collect()
        })
        .collect()
}
