use mapmatch::config::MatchOptions;
use mapmatch::error::MatchError;
use mapmatch::ingest::Observation;
use mapmatch::store::{InMemorySegmentStore, RoadSegmentInput};
use mapmatch::viterbi::match_trace;

fn obs(lon: f64, lat: f64, heading: f64) -> Observation {
    Observation {
        lon,
        lat,
        speed: 10.0,
        heading,
    }
}

fn segment(id: i64, oneway: bool, coords: &[(f64, f64)]) -> RoadSegmentInput {
    RoadSegmentInput {
        segment_id: id,
        oneway,
        geometry: coords.to_vec(),
    }
}

/// Scenario 1: five observations along a known straight road, all within 5m
/// of it, heading aligned with the road's bearing. The matched path should
/// be the road's single segment id, with consecutive duplicates collapsed.
#[test]
fn scenario_straight_drive() {
    let store = InMemorySegmentStore::from_geodesic(vec![segment(
        100,
        false,
        &[(-0.01, 51.5), (0.01, 51.5)],
    )]);
    let options = MatchOptions::default();

    // Heading east along the road, sampled every ~1.5km, well within radius.
    let observations: Vec<Observation> = (0..5)
        .map(|i| obs(-0.004 + 0.002 * i as f64, 51.5, 90.0))
        .collect();

    let path = match_trace(&observations, &options, &store, None).unwrap();
    assert_eq!(path, vec![100]);
}

/// Scenario 2: observation 3 of 5 is ~200m off-road, missing even at 2x the
/// default 20m radius. It should be skipped without altering the rest of
/// the path, and the matcher should still recover using the remaining
/// observations.
#[test]
fn scenario_gps_outlier_is_skipped() {
    let store = InMemorySegmentStore::from_geodesic(vec![segment(
        200,
        false,
        &[(-0.01, 51.5), (0.01, 51.5)],
    )]);
    let options = MatchOptions::default();

    let mut observations: Vec<Observation> = vec![
        obs(-0.004, 51.5, 90.0),
        obs(-0.002, 51.5, 90.0),
        obs(-0.001, 51.503, 90.0), // ~330m north of the road: well outside 2x radius.
        obs(0.002, 51.5, 90.0),
        obs(0.004, 51.5, 90.0),
    ];

    let with_outlier = match_trace(&observations, &options, &store, None).unwrap();
    assert_eq!(with_outlier, vec![200]);

    observations.remove(2);
    let without_outlier = match_trace(&observations, &options, &store, None).unwrap();
    assert_eq!(with_outlier, without_outlier);
}

/// Scenario 3: observations travel against a oneway segment's declared
/// direction while a two-way alternative exists alongside it. The matcher
/// should prefer the two-way alternative because the oneway transition is
/// penalized by the backtrack factor.
#[test]
fn scenario_oneway_backtrack_prefers_twoway_alternative() {
    let store = InMemorySegmentStore::from_geodesic(vec![
        // Oneway road declared eastbound (from west end to east end).
        segment(301, true, &[(-0.01, 51.5000), (0.01, 51.5000)]),
        // Parallel two-way alternative a few meters north.
        segment(302, false, &[(-0.01, 51.50006), (0.01, 51.50006)]),
    ]);
    let options = MatchOptions::default();

    // Observations travel westbound (against segment 301's declared direction).
    let observations: Vec<Observation> = vec![
        obs(0.004, 51.50003, 270.0),
        obs(0.002, 51.50003, 270.0),
        obs(-0.002, 51.50003, 270.0),
        obs(-0.004, 51.50003, 270.0),
    ];

    let path = match_trace(&observations, &options, &store, None).unwrap();
    // The two-way segment tolerates westbound travel with no penalty; the
    // oneway segment's transition score is suppressed, so it should not
    // dominate the path.
    assert!(path.contains(&302));
    assert!(!path.contains(&301) || path.len() > 1);
}

/// Scenario 4: an L-shaped route spanning two connected roads. The path
/// should contain both segment ids, in the order they were traversed.
#[test]
fn scenario_turn_preserves_segment_order() {
    let store = InMemorySegmentStore::from_geodesic(vec![
        segment(401, false, &[(-0.01, 51.5), (0.0, 51.5)]),
        segment(402, false, &[(0.0, 51.5), (0.0, 51.51)]),
    ]);
    let options = MatchOptions::default();

    let observations = vec![
        obs(-0.006, 51.5, 90.0),
        obs(-0.002, 51.5, 90.0),
        obs(0.0, 51.502, 0.0),
        obs(0.0, 51.506, 0.0),
    ];

    let path = match_trace(&observations, &options, &store, None).unwrap();
    assert_eq!(path, vec![401, 402]);
}

/// Scenario 5: no observations at all returns an empty path without error.
#[test]
fn scenario_empty_input() {
    let store = InMemorySegmentStore::from_geodesic(vec![segment(
        500,
        false,
        &[(-0.01, 51.5), (0.01, 51.5)],
    )]);
    let options = MatchOptions::default();

    let path = match_trace(&[], &options, &store, None).unwrap();
    assert!(path.is_empty());
}

/// Scenario 6: the first observation has no candidates within 2x the
/// radius. This is fatal: `NoStartingCandidates`.
#[test]
fn scenario_unmatched_start_is_fatal() {
    let store = InMemorySegmentStore::from_geodesic(vec![segment(
        600,
        false,
        &[(-0.01, 51.5), (0.01, 51.5)],
    )]);
    let options = MatchOptions::default();

    // 60 degrees away: nowhere near the road at any reasonable radius.
    let observations = vec![obs(60.0, 10.0, 90.0)];

    let result = match_trace(&observations, &options, &store, None);
    assert!(matches!(result, Err(MatchError::NoStartingCandidates)));
}
