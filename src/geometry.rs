//! Geometry primitives for boundary containment and distance.
//!
//! The engine never touches `geo` types directly for its predicates; it
//! goes through the narrow [`BoundaryShape`] capability so query logic can
//! be exercised against synthetic fixtures and the geometry library stays
//! swappable behind one file.

use geo::{BoundingRect, ChamberlainDuquetteArea, Coord, Intersects, Point, Polygon, Rect, coord};

/// Earth radius in kilometers for haversine distance calculations.
pub(crate) const EARTH_RADIUS_KM: f64 = 6_371.0;

/// Great-circle distance between two lon/lat points in kilometers.
pub fn haversine_km(p1: &Point, p2: &Point) -> f64 {
    let lat1_rad = p1.y().to_radians();
    let lat2_rad = p2.y().to_radians();
    let delta_lat = (p2.y() - p1.y()).to_radians();
    let delta_lon = (p2.x() - p1.x()).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_KM * c
}

/// Closest point to `p` on the segment `a`-`b`, computed in planar degree
/// space. MPA boundaries span fractions of a degree, so the planar
/// projection error is negligible next to the haversine distance that is
/// measured afterwards.
pub(crate) fn closest_point_on_segment(p: Coord, a: Coord, b: Coord) -> Coord {
    let ab = coord! { x: b.x - a.x, y: b.y - a.y };
    let len_sq = ab.x * ab.x + ab.y * ab.y;
    if len_sq == 0.0 {
        return a;
    }

    let ap = coord! { x: p.x - a.x, y: p.y - a.y };
    let t = ((ap.x * ab.x + ap.y * ab.y) / len_sq).clamp(0.0, 1.0);
    coord! { x: a.x + t * ab.x, y: a.y + t * ab.y }
}

/// The spatial predicates the engine needs from a boundary. Containment is
/// boundary-inclusive: a point exactly on the ring counts as contained.
pub trait BoundaryShape {
    fn contains_point(&self, point: &Point) -> bool;

    /// Nearest point on the boundary rings and its haversine distance in
    /// kilometers. Defined for points inside and outside alike.
    fn nearest_boundary_point(&self, point: &Point) -> (Point, f64);

    /// Axis-aligned bounding box in lon/lat degrees.
    fn bounding_rect(&self) -> Rect;
}

impl<T: BoundaryShape + ?Sized> BoundaryShape for &T {
    fn contains_point(&self, point: &Point) -> bool {
        (**self).contains_point(point)
    }

    fn nearest_boundary_point(&self, point: &Point) -> (Point, f64) {
        (**self).nearest_boundary_point(point)
    }

    fn bounding_rect(&self) -> Rect {
        (**self).bounding_rect()
    }
}

/// A boundary polygon prepared for repeated predicate evaluation: the
/// bounding box and surface area are computed once at build time so hot
/// query paths only run the exact tests.
#[derive(Debug, Clone)]
pub struct PreparedBoundary {
    polygon: Polygon,
    bbox: Rect,
    surface_m2: f64,
}

impl PreparedBoundary {
    /// Prepare a validated polygon. Returns `None` for a degenerate
    /// polygon with no bounding box (empty exterior ring); callers
    /// validate first, so this is not reachable from warm-up.
    pub fn new(polygon: Polygon) -> Option<Self> {
        let bbox = polygon.bounding_rect()?;
        let surface_m2 = polygon.chamberlain_duquette_unsigned_area();
        Some(Self {
            polygon,
            bbox,
            surface_m2,
        })
    }

    /// Spherical surface area in square meters; the smallest-area
    /// tie-break for overlapping containment uses this.
    pub fn surface_m2(&self) -> f64 {
        self.surface_m2
    }

    pub fn polygon(&self) -> &Polygon {
        &self.polygon
    }

    /// Lower bound on the distance from `point` to anywhere in this
    /// boundary's bounding box, in kilometers. Zero when the point lies
    /// inside the box. Used to prune nearest-area scans; scaled down so
    /// the planar clamp can never overestimate.
    pub(crate) fn bbox_distance_lower_bound_km(&self, point: &Point) -> f64 {
        let clamped = coord! {
            x: point.x().clamp(self.bbox.min().x, self.bbox.max().x),
            y: point.y().clamp(self.bbox.min().y, self.bbox.max().y),
        };
        if clamped == point.0 {
            return 0.0;
        }
        haversine_km(point, &Point::from(clamped)) * 0.9
    }
}

impl BoundaryShape for PreparedBoundary {
    fn contains_point(&self, point: &Point) -> bool {
        // Intersects rather than Contains: the glossary definition of
        // containment includes points on the boundary itself.
        self.polygon.intersects(point)
    }

    fn nearest_boundary_point(&self, point: &Point) -> (Point, f64) {
        let mut best: Option<(Point, f64)> = None;

        let rings =
            std::iter::once(self.polygon.exterior()).chain(self.polygon.interiors().iter());
        for ring in rings {
            for segment in ring.lines() {
                let candidate =
                    Point::from(closest_point_on_segment(point.0, segment.start, segment.end));
                let dist = haversine_km(point, &candidate);
                match best {
                    Some((_, best_dist)) if dist >= best_dist => {}
                    _ => best = Some((candidate, dist)),
                }
            }
        }

        best.unwrap_or((*point, f64::INFINITY))
    }

    fn bounding_rect(&self) -> Rect {
        self.bbox
    }
}
