//! Provisioning a real R-tree-indexed geometry table in a relational
//! database is out of scope here; this module defines the interface the
//! matching core needs from that store, plus one concrete in-memory
//! implementation (backed by `rstar`, the same crate the original
//! road-network R-tree used) so the core is runnable and testable without a
//! live database.

use anyhow::Result;
use rstar::{AABB, RTree, RTreeObject};
use serde::{Deserialize, Serialize};

use crate::geo::ProjectedPoint;

/// A road polyline as the store hands it back: already projected, with the
/// attributes the emission/transition scorers need.
#[derive(Debug, Clone, PartialEq)]
pub struct RoadSegment {
    pub segment_id: i64,
    pub oneway: bool,
    pub polyline: Vec<ProjectedPoint>,
}

/// What the candidate provider needs from a spatial store: a bounding-box
/// intersection query. A SpatiaLite/PostGIS-backed implementation would run
/// the equivalent of the `rtree_<table>_geometry` query the original Python
/// tool issued; this trait is the interface such an implementation would
/// satisfy.
pub trait SegmentStore {
    /// Returns every segment whose bounding box intersects the box spanned
    /// by `min`/`max` (in the same projected frame as `min`/`max`).
    fn segments_in_bbox(&self, min: ProjectedPoint, max: ProjectedPoint) -> Result<Vec<RoadSegment>>;
}

/// A raw segment as loaded from, e.g., a GeoJSON/CSV export, before the
/// geodesic-to-projected transform has been applied.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoadSegmentInput {
    pub segment_id: i64,
    pub oneway: bool,
    /// (lon, lat) pairs, geodesic WGS84.
    pub geometry: Vec<(f64, f64)>,
}

struct IndexedSegment {
    index: usize,
    envelope: AABB<[f64; 2]>,
}

impl RTreeObject for IndexedSegment {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

/// In-memory `SegmentStore` backed by an `rstar::RTree` of segment bounding
/// boxes, bulk-loaded once at construction. Read-only thereafter, safe to
/// share across parallel scorers.
pub struct InMemorySegmentStore {
    segments: Vec<RoadSegment>,
    index: RTree<IndexedSegment>,
}

impl InMemorySegmentStore {
    /// Builds the store from geodesic input segments, projecting every
    /// vertex and filtering `segment_id <= 0` at the source.
    pub fn from_geodesic(inputs: Vec<RoadSegmentInput>) -> Self {
        let segments: Vec<RoadSegment> = inputs
            .into_iter()
            .filter(|s| s.segment_id > 0 && s.geometry.len() >= 2)
            .map(|s| RoadSegment {
                segment_id: s.segment_id,
                oneway: s.oneway,
                polyline: s
                    .geometry
                    .iter()
                    .map(|&(lon, lat)| crate::geo::project(lon, lat))
                    .collect(),
            })
            .collect();
        Self::from_projected(segments)
    }

    /// Builds the store from already-projected segments.
    pub fn from_projected(segments: Vec<RoadSegment>) -> Self {
        let indexed: Vec<IndexedSegment> = segments
            .iter()
            .enumerate()
            .map(|(index, seg)| IndexedSegment {
                index,
                envelope: bounding_envelope(&seg.polyline),
            })
            .collect();
        let index = RTree::bulk_load(indexed);
        InMemorySegmentStore { segments, index }
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

fn bounding_envelope(polyline: &[ProjectedPoint]) -> AABB<[f64; 2]> {
    let mut min_x = f64::INFINITY;
    let mut min_y = f64::INFINITY;
    let mut max_x = f64::NEG_INFINITY;
    let mut max_y = f64::NEG_INFINITY;
    for p in polyline {
        min_x = min_x.min(p.x);
        min_y = min_y.min(p.y);
        max_x = max_x.max(p.x);
        max_y = max_y.max(p.y);
    }
    AABB::from_corners([min_x, min_y], [max_x, max_y])
}

impl SegmentStore for InMemorySegmentStore {
    fn segments_in_bbox(&self, min: ProjectedPoint, max: ProjectedPoint) -> Result<Vec<RoadSegment>> {
        let query = AABB::from_corners([min.x, min.y], [max.x, max.y]);
        let hits = self
            .index
            .locate_in_envelope_intersecting(&query)
            .map(|indexed| self.segments[indexed.index].clone())
            .collect();
        Ok(hits)
    }
}
