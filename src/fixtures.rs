//! Synthetic road-network and observation generators for tests and local
//! experimentation. Not part of the matching core; grounded in the same
//! deterministic-seed approach the teacher used for its dummy-node
//! generator.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::ingest::Observation;
use crate::store::RoadSegmentInput;

/// Builds a short chain of connected road segments running east from
/// `(center_lon, center_lat)`, each `step_deg` degrees long, plus a set of
/// GPS observations sampled close to the chain with a small jitter. Useful
/// for exercising "straight drive" and "turn" scenarios without a real map
/// extract.
pub fn straight_chain(center_lon: f64, center_lat: f64, segments: usize, step_deg: f64) -> Vec<RoadSegmentInput> {
    (0..segments)
        .map(|i| RoadSegmentInput {
            segment_id: (i + 1) as i64,
            oneway: false,
            geometry: vec![
                (center_lon + step_deg * i as f64, center_lat),
                (center_lon + step_deg * (i as f64 + 1.0), center_lat),
            ],
        })
        .collect()
}

/// Generates `count` observations jittered around the given chain of
/// (lon, lat) waypoints, with a fixed seed for reproducibility.
pub fn jittered_observations(waypoints: &[(f64, f64)], heading: f64, jitter_deg: f64, seed: u64) -> Vec<Observation> {
    let mut rng = StdRng::seed_from_u64(seed);
    waypoints
        .iter()
        .map(|&(lon, lat)| Observation {
            lon: lon + rng.random_range(-jitter_deg..jitter_deg),
            lat: lat + rng.random_range(-jitter_deg..jitter_deg),
            speed: 12.0,
            heading,
        })
        .collect()
}
