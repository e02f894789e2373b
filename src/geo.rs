//! Pure geometry helpers: geodesic/projected conversion, segment projection,
//! bearing and angular difference. Everything here is stateless.

const EARTH_RADIUS_M: f64 = 6_371_000.0;
/// Web Mercator clamps latitude near the poles; beyond this the projection diverges.
const MAX_MERCATOR_LAT: f64 = 85.051_128_78;

/// A point in the planar Web-Mercator-equivalent projection (EPSG:3857 semantics).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectedPoint {
    pub x: f64,
    pub y: f64,
}

impl ProjectedPoint {
    pub fn new(x: f64, y: f64) -> Self {
        ProjectedPoint { x, y }
    }
}

/// Converts a WGS84 geodesic coordinate (lon, lat in degrees) to a planar
/// Web-Mercator-equivalent point in meters.
pub fn project(lon: f64, lat: f64) -> ProjectedPoint {
    let lat = lat.clamp(-MAX_MERCATOR_LAT, MAX_MERCATOR_LAT);
    let x = EARTH_RADIUS_M * lon.to_radians();
    let y = EARTH_RADIUS_M * ((std::f64::consts::FRAC_PI_4 + lat.to_radians() / 2.0).tan()).ln();
    ProjectedPoint::new(x, y)
}

/// Inverse of [`project`]: planar meters back to (lon, lat) in degrees.
pub fn unproject(p: ProjectedPoint) -> (f64, f64) {
    let lon = (p.x / EARTH_RADIUS_M).to_degrees();
    let lat = (2.0 * (p.y / EARTH_RADIUS_M).exp().atan() - std::f64::consts::FRAC_PI_2).to_degrees();
    (lon, lat)
}

/// Euclidean distance between two projected points, in meters.
pub fn distance(p: ProjectedPoint, q: ProjectedPoint) -> f64 {
    let dx = p.x - q.x;
    let dy = p.y - q.y;
    (dx * dx + dy * dy).sqrt()
}

/// Finds the point on segment `a`-`b` closest to `p`.
///
/// Returns (closest point, parametric t in [0,1], perpendicular distance).
/// Degenerate segments (`a == b`) return `a` itself with distance to `p`
/// (a finite sentinel, never a panic).
pub fn point_to_segment(
    p: ProjectedPoint,
    a: ProjectedPoint,
    b: ProjectedPoint,
) -> (ProjectedPoint, f64, f64) {
    let abx = b.x - a.x;
    let aby = b.y - a.y;
    let len_sq = abx * abx + aby * aby;

    if len_sq == 0.0 {
        return (a, 0.0, distance(p, a));
    }

    let t = ((p.x - a.x) * abx + (p.y - a.y) * aby) / len_sq;
    let t_clamped = t.clamp(0.0, 1.0);
    let closest = ProjectedPoint::new(a.x + t_clamped * abx, a.y + t_clamped * aby);
    (closest, t_clamped, distance(p, closest))
}

/// Tangent bearing from `a` to `b`, in degrees clockwise from north, [0, 360).
/// Undefined for coincident points; callers should check [`bearing_defined`]
/// first if the distinction matters.
pub fn bearing(a: ProjectedPoint, b: ProjectedPoint) -> f64 {
    if !bearing_defined(a, b) {
        return 0.0;
    }
    // In projected (x east, y north) coordinates, bearing is the angle from
    // north (+y) rotating clockwise towards east (+x).
    let angle = (b.x - a.x).atan2(b.y - a.y).to_degrees();
    (angle + 360.0) % 360.0
}

/// True unless `a` and `b` are coincident, in which case [`bearing`] has no
/// well-defined answer and returns the 0.0 sentinel.
pub fn bearing_defined(a: ProjectedPoint, b: ProjectedPoint) -> bool {
    a != b
}

/// Smallest unsigned angular difference between two headings, in [0, 180].
pub fn angle_diff(h1: f64, h2: f64) -> f64 {
    let diff = (h1 - h2).rem_euclid(360.0);
    if diff > 180.0 { 360.0 - diff } else { diff }
}
