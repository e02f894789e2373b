//! Candidate selection: given an observation and a search radius, find
//! nearby road segments and project the observation onto each.

use anyhow::Result;

use crate::geo::{self, ProjectedPoint};
use crate::ingest::Observation;
use crate::store::SegmentStore;

/// A road segment considered for one specific observation, with the
/// per-observation projection cached. Immutable once constructed; never
/// shared or mutated across DP columns.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub segment_id: i64,
    pub oneway: bool,
    pub polyline: Vec<ProjectedPoint>,
    /// Closest point on `polyline` to the observation.
    pub projection: ProjectedPoint,
    /// Tangent bearing at `projection`, degrees.
    pub bearing: f64,
    /// Perpendicular distance from the observation's projected point.
    pub distance: f64,
    /// Index of the sub-segment (into `polyline`) the projection falls on.
    pub segment_index: usize,
}

/// Projects the observation onto every vertex-to-vertex sub-segment of
/// `polyline` and returns the globally closest projection.
fn project_onto_polyline(point: ProjectedPoint, polyline: &[ProjectedPoint]) -> (ProjectedPoint, f64, usize) {
    let mut best = (polyline[0], f64::INFINITY, 0);
    for (i, pair) in polyline.windows(2).enumerate() {
        let (closest, _t, dist) = geo::point_to_segment(point, pair[0], pair[1]);
        if dist < best.1 {
            best = (closest, dist, i);
        }
    }
    best
}

/// Tangent bearing of the polyline at sub-segment `segment_index`.
fn polyline_bearing(polyline: &[ProjectedPoint], segment_index: usize) -> f64 {
    let a = polyline[segment_index];
    let b = polyline[segment_index + 1];
    geo::bearing(a, b)
}

/// Queries `store` for candidates near `observation` within `radius_m`,
/// sorted ascending by `(distance, segment_id)` and truncated to
/// `max_states`.
///
/// An empty result is not an error; it signals the caller (the DP driver)
/// to retry at a larger radius or skip the observation.
pub fn query(
    store: &dyn SegmentStore,
    observation: &Observation,
    radius_m: f64,
    max_states: usize,
) -> Result<(ProjectedPoint, Vec<Candidate>)> {
    let point = geo::project(observation.lon, observation.lat);
    let min = ProjectedPoint::new(point.x - radius_m, point.y - radius_m);
    let max = ProjectedPoint::new(point.x + radius_m, point.y + radius_m);

    let segments = store.segments_in_bbox(min, max)?;

    let mut candidates: Vec<Candidate> = segments
        .into_iter()
        .filter(|s| s.segment_id > 0 && s.polyline.len() >= 2)
        .filter_map(|s| {
            let (projection, distance, segment_index) = project_onto_polyline(point, &s.polyline);
            if distance > radius_m {
                return None;
            }
            let bearing = polyline_bearing(&s.polyline, segment_index);
            Some(Candidate {
                segment_id: s.segment_id,
                oneway: s.oneway,
                polyline: s.polyline,
                projection,
                bearing,
                distance,
                segment_index,
            })
        })
        .collect();

    candidates.sort_by(|a, b| {
        a.distance
            .partial_cmp(&b.distance)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.segment_id.cmp(&b.segment_id))
    });
    candidates.truncate(max_states);

    Ok((point, candidates))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{InMemorySegmentStore, RoadSegmentInput};

    fn make_store() -> InMemorySegmentStore {
        InMemorySegmentStore::from_geodesic(vec![
            RoadSegmentInput {
                segment_id: 1,
                oneway: false,
                geometry: vec![(-0.001, 0.0), (0.001, 0.0)],
            },
            RoadSegmentInput {
                segment_id: 2,
                oneway: false,
                geometry: vec![(10.0, 10.0), (10.001, 10.0)],
            },
        ])
    }

    fn obs(lon: f64, lat: f64) -> Observation {
        Observation {
            lon,
            lat,
            speed: 10.0,
            heading: 90.0,
        }
    }

    #[test]
    fn finds_nearby_segment_within_radius() {
        let store = make_store();
        let (_, candidates) = query(&store, &obs(0.0, 0.0), 50.0, 10).unwrap();
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].segment_id, 1);
    }

    #[test]
    fn excludes_segment_outside_radius() {
        let store = make_store();
        let (_, candidates) = query(&store, &obs(0.0, 0.0), 1.0, 10).unwrap();
        assert!(candidates.is_empty());
    }

    #[test]
    fn monotone_radius_subset_property() {
        let store = make_store();
        let (_, small) = query(&store, &obs(0.0, 0.0), 10.0, 100).unwrap();
        let (_, large) = query(&store, &obs(0.0, 0.0), 10_000_000.0, 100).unwrap();
        let large_ids: Vec<i64> = large.iter().map(|c| c.segment_id).collect();
        for c in &small {
            assert!(large_ids.contains(&c.segment_id));
        }
    }

    #[test]
    fn truncates_to_max_states() {
        let segments: Vec<RoadSegmentInput> = (1..=20)
            .map(|i| RoadSegmentInput {
                segment_id: i,
                oneway: false,
                geometry: vec![(0.0001 * i as f64, 0.0), (0.0001 * i as f64, 0.0001)],
            })
            .collect();
        let store = InMemorySegmentStore::from_geodesic(segments);
        let (_, candidates) = query(&store, &obs(0.0, 0.0), 10_000.0, 5).unwrap();
        assert_eq!(candidates.len(), 5);
    }

    #[test]
    fn zero_distance_candidate_has_zero_perpendicular_distance() {
        let store = InMemorySegmentStore::from_geodesic(vec![RoadSegmentInput {
            segment_id: 1,
            oneway: false,
            geometry: vec![(-0.01, 0.0), (0.01, 0.0)],
        }]);
        let (point, candidates) = query(&store, &obs(0.0, 0.0), 50.0, 10).unwrap();
        assert_eq!(candidates.len(), 1);
        assert!((candidates[0].distance).abs() < 1e-6);
        assert_eq!(candidates[0].projection, point);
    }
}
