//! Bounding-box pre-filter over prepared boundaries.
//!
//! An R-tree of axis-aligned bounding boxes narrows the candidate set
//! before any exact geometry test runs. The filter may over-select (a bbox
//! hit is not a polygon hit) but never excludes a true match, so the exact
//! predicates downstream see every relevant boundary.

use crate::geometry::{BoundaryShape, EARTH_RADIUS_KM};
use geo::Point;
use rstar::{AABB, RTree, RTreeObject};
use smallvec::SmallVec;

/// Degrees of latitude per kilometer is essentially constant; longitude
/// shrinks with cos(latitude).
const KM_PER_DEG_LAT: f64 = 110.574;

/// Safety factor applied when converting a radius to a degree envelope,
/// so the coarse box always covers the true great-circle disc.
const ENVELOPE_MARGIN: f64 = 1.05;

#[derive(Debug, Clone)]
struct IndexedBoundary {
    env: AABB<[f64; 2]>,
    /// Position of the boundary in the owning `BoundarySet`.
    ordinal: usize,
}

impl RTreeObject for IndexedBoundary {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.env
    }
}

/// R-tree of boundary bounding boxes, keyed by ordinal into the snapshot's
/// boundary list. Immutable once built; rebuilt wholesale with the
/// boundary cache.
#[derive(Debug)]
pub(crate) struct BoundaryIndex {
    tree: RTree<IndexedBoundary>,
}

impl BoundaryIndex {
    pub(crate) fn build<S: BoundaryShape>(shapes: &[S]) -> Self {
        let entries = shapes
            .iter()
            .enumerate()
            .map(|(ordinal, shape)| {
                let rect = shape.bounding_rect();
                IndexedBoundary {
                    env: AABB::from_corners(
                        [rect.min().x, rect.min().y],
                        [rect.max().x, rect.max().y],
                    ),
                    ordinal,
                }
            })
            .collect();

        Self {
            tree: RTree::bulk_load(entries),
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.tree.size()
    }

    /// Ordinals of boundaries whose bbox contains the point. Over-selects;
    /// the caller runs the exact containment test.
    pub(crate) fn candidates_for_point(&self, point: &Point) -> SmallVec<[usize; 8]> {
        let probe = AABB::from_point([point.x(), point.y()]);
        self.tree
            .locate_in_envelope_intersecting(&probe)
            .map(|entry| entry.ordinal)
            .collect()
    }

    /// Ordinals of boundaries whose bbox intersects the query envelope.
    pub(crate) fn candidates_in_envelope(&self, env: &AABB<[f64; 2]>) -> Vec<usize> {
        self.tree
            .locate_in_envelope_intersecting(env)
            .map(|entry| entry.ordinal)
            .collect()
    }
}

/// Degree-space envelope guaranteed to cover the great-circle disc of
/// `radius_km` around `point`, via the spherical-cap bounding box. A cap
/// that reaches a pole spans every longitude, so the envelope widens to
/// the full longitude range rather than excluding true matches.
pub(crate) fn radius_envelope(point: &Point, radius_km: f64) -> AABB<[f64; 2]> {
    let lat_offset = radius_km / KM_PER_DEG_LAT * ENVELOPE_MARGIN;
    let lat_min = (point.y() - lat_offset).max(-90.0);
    let lat_max = (point.y() + lat_offset).min(90.0);

    let angular = radius_km / EARTH_RADIUS_KM * ENVELOPE_MARGIN;
    if point.y() + lat_offset >= 90.0
        || point.y() - lat_offset <= -90.0
        || angular >= std::f64::consts::FRAC_PI_2
    {
        return AABB::from_corners([-180.0, lat_min], [180.0, lat_max]);
    }

    // Widest longitude extent of the cap: asin(sin(r) / cos(lat)).
    let ratio = angular.sin() / point.y().to_radians().cos();
    if ratio >= 1.0 {
        return AABB::from_corners([-180.0, lat_min], [180.0, lat_max]);
    }
    let lon_offset = ratio.asin().to_degrees();

    AABB::from_corners(
        [point.x() - lon_offset, lat_min],
        [point.x() + lon_offset, lat_max],
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{Rect, coord};
    use rstar::Envelope;

    /// Synthetic fixture: a bare rectangle standing in for a boundary.
    struct RectShape(Rect);

    impl BoundaryShape for RectShape {
        fn contains_point(&self, point: &Point) -> bool {
            use geo::Contains;
            self.0.contains(point)
        }

        fn nearest_boundary_point(&self, point: &Point) -> (Point, f64) {
            (*point, 0.0)
        }

        fn bounding_rect(&self) -> Rect {
            self.0
        }
    }

    fn rect(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> RectShape {
        RectShape(Rect::new(
            coord! { x: min_x, y: min_y },
            coord! { x: max_x, y: max_y },
        ))
    }

    #[test]
    fn test_candidates_for_point() {
        let shapes = vec![
            rect(-77.0, 23.7, -76.0, 24.7),
            rect(-76.2, 24.5, -75.2, 25.5), // overlaps the first
            rect(-60.0, 10.0, -59.0, 11.0), // far away
        ];
        let index = BoundaryIndex::build(&shapes);
        assert_eq!(index.len(), 3);

        let hits = index.candidates_for_point(&Point::new(-76.1, 24.6));
        let mut hits: Vec<usize> = hits.into_iter().collect();
        hits.sort_unstable();
        assert_eq!(hits, vec![0, 1]);

        let misses = index.candidates_for_point(&Point::new(0.0, 0.0));
        assert!(misses.is_empty());
    }

    #[test]
    fn test_point_on_bbox_edge_is_candidate() {
        let shapes = vec![rect(-77.0, 23.7, -76.0, 24.7)];
        let index = BoundaryIndex::build(&shapes);
        assert_eq!(index.candidates_for_point(&Point::new(-77.0, 24.0)).len(), 1);
    }

    #[test]
    fn test_candidates_in_envelope() {
        let shapes = vec![
            rect(-77.0, 23.7, -76.0, 24.7),
            rect(-60.0, 10.0, -59.0, 11.0),
        ];
        let index = BoundaryIndex::build(&shapes);

        let env = AABB::from_corners([-78.0, 23.0], [-76.5, 25.0]);
        assert_eq!(index.candidates_in_envelope(&env), vec![0]);
    }

    #[test]
    fn test_radius_envelope_covers_disc() {
        let center = Point::new(-76.5, 24.2);
        let env = radius_envelope(&center, 100.0);

        // A point 100 km due north must fall inside the envelope.
        let north = [center.x(), center.y() + 100.0 / KM_PER_DEG_LAT];
        assert!(env.contains_point(&north));

        // And 100 km due east.
        let east = [
            center.x() + 100.0 / (111.32 * center.y().to_radians().cos()),
            center.y(),
        ];
        assert!(env.contains_point(&east));
    }

    #[test]
    fn test_radius_envelope_near_pole_spans_all_longitudes() {
        // A 50 km disc at 89.9N contains the pole; every longitude can
        // intersect it.
        let env = radius_envelope(&Point::new(0.0, 89.9), 50.0);
        assert_eq!(env.lower()[0], -180.0);
        assert_eq!(env.upper()[0], 180.0);

        // A boundary on the far side of the pole must stay a candidate.
        let env = radius_envelope(&Point::new(0.0, 89.9), 40.0);
        assert!(env.contains_point(&[150.0, 89.6]));
    }

    #[test]
    fn test_empty_index() {
        let shapes: Vec<RectShape> = Vec::new();
        let index = BoundaryIndex::build(&shapes);
        assert_eq!(index.len(), 0);
        assert!(index.candidates_for_point(&Point::new(0.0, 0.0)).is_empty());
    }
}
