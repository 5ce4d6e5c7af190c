//! Validation for geographic coordinates and boundary polygons.

use crate::error::{ProximityError, Result};
use crate::types::AreaId;
use geo::{Intersects, Line, Point, Polygon};

/// Validates a point has finite, in-range longitude and latitude.
///
/// Longitude: [-180.0, 180.0], Latitude: [-90.0, 90.0]
///
/// # Examples
///
/// ```
/// use mpa_proximity::validation::validate_geographic_point;
/// use geo::Point;
///
/// let nassau = Point::new(-77.3554, 25.0443);
/// assert!(validate_geographic_point(&nassau).is_ok());
///
/// let invalid = Point::new(200.0, 40.0);
/// assert!(validate_geographic_point(&invalid).is_err());
/// ```
pub fn validate_geographic_point(point: &Point) -> Result<()> {
    let (x, y) = (point.x(), point.y());

    if !x.is_finite() {
        return Err(ProximityError::InvalidInput(format!(
            "Longitude must be finite, got: {}",
            x
        )));
    }

    if !y.is_finite() {
        return Err(ProximityError::InvalidInput(format!(
            "Latitude must be finite, got: {}",
            y
        )));
    }

    if !(-180.0..=180.0).contains(&x) {
        return Err(ProximityError::InvalidInput(format!(
            "Longitude out of range [-180.0, 180.0]: {}",
            x
        )));
    }

    if !(-90.0..=90.0).contains(&y) {
        return Err(ProximityError::InvalidInput(format!(
            "Latitude out of range [-90.0, 90.0]: {}",
            y
        )));
    }

    Ok(())
}

/// Validates a boundary polygon is usable for containment and distance
/// tests: a closed exterior ring of at least three distinct vertices, all
/// coordinates in range, and no self-intersection of the exterior ring.
/// Failures are reported as [`ProximityError::InvalidGeometry`] carrying
/// the owning area's id.
///
/// Interior rings (holes) are checked for coordinate validity only;
/// no-take boundaries with lagoon cut-outs are legitimate.
pub fn validate_boundary(id: AreaId, polygon: &Polygon) -> Result<()> {
    let invalid = |reason: String| ProximityError::InvalidGeometry { id, reason };

    let exterior = polygon.exterior();
    // geo closes rings on construction, so 4 coords = triangle.
    if exterior.0.len() < 4 {
        return Err(invalid(format!(
            "exterior ring has {} coordinates, need at least 4",
            exterior.0.len()
        )));
    }

    for (idx, coord) in exterior.coords().enumerate() {
        validate_geographic_point(&Point::from(*coord))
            .map_err(|e| invalid(format!("exterior ring point at index {}: {}", idx, e)))?;
    }

    for (ring_idx, interior) in polygon.interiors().iter().enumerate() {
        for (idx, coord) in interior.coords().enumerate() {
            validate_geographic_point(&Point::from(*coord)).map_err(|e| {
                invalid(format!(
                    "interior ring {} point at index {}: {}",
                    ring_idx, idx, e
                ))
            })?;
        }
    }

    if let Some((i, j)) = find_self_intersection(polygon) {
        return Err(invalid(format!(
            "self-intersecting exterior ring (segments {} and {})",
            i, j
        )));
    }

    Ok(())
}

/// Pairwise segment test over the exterior ring. Boundary polygons are
/// small (tens to low hundreds of vertices), so O(n^2) at warm-up time is
/// acceptable; queries never re-validate.
fn find_self_intersection(polygon: &Polygon) -> Option<(usize, usize)> {
    let segments: Vec<Line> = polygon.exterior().lines().collect();
    let n = segments.len();

    for i in 0..n {
        for j in (i + 2)..n {
            // The first and last segments of a closed ring are adjacent.
            if i == 0 && j == n - 1 {
                continue;
            }
            if segments[i].intersects(&segments[j]) {
                return Some((i, j));
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::polygon;

    #[test]
    fn test_valid_geographic_point() {
        assert!(validate_geographic_point(&Point::new(-76.5, 24.2)).is_ok());
        assert!(validate_geographic_point(&Point::new(180.0, 0.0)).is_ok());
        assert!(validate_geographic_point(&Point::new(-180.0, 0.0)).is_ok());
        assert!(validate_geographic_point(&Point::new(0.0, 90.0)).is_ok());
        assert!(validate_geographic_point(&Point::new(0.0, -90.0)).is_ok());
    }

    #[test]
    fn test_invalid_coordinates() {
        assert!(validate_geographic_point(&Point::new(200.0, 40.0)).is_err());
        assert!(validate_geographic_point(&Point::new(-74.0, 95.0)).is_err());
        assert!(validate_geographic_point(&Point::new(f64::NAN, 40.0)).is_err());
        assert!(validate_geographic_point(&Point::new(-74.0, f64::INFINITY)).is_err());
    }

    #[test]
    fn test_valid_boundary() {
        let poly: Polygon = polygon![
            (x: -77.0, y: 23.7),
            (x: -76.0, y: 23.7),
            (x: -76.0, y: 24.7),
            (x: -77.0, y: 24.7),
            (x: -77.0, y: 23.7),
        ];
        assert!(validate_boundary(AreaId(1), &poly).is_ok());
    }

    #[test]
    fn test_degenerate_boundary() {
        let poly = Polygon::new(geo::LineString::new(vec![]), vec![]);
        assert!(matches!(
            validate_boundary(AreaId(1), &poly),
            Err(ProximityError::InvalidGeometry { id: AreaId(1), .. })
        ));

        let line = Polygon::new(
            geo::LineString::from(vec![(-77.0, 23.7), (-76.0, 23.7)]),
            vec![],
        );
        assert!(validate_boundary(AreaId(2), &line).is_err());
    }

    #[test]
    fn test_out_of_range_boundary() {
        let poly: Polygon = polygon![
            (x: -77.0, y: 23.7),
            (x: 999.0, y: 23.7),
            (x: -76.0, y: 24.7),
            (x: -77.0, y: 23.7),
        ];
        assert!(matches!(
            validate_boundary(AreaId(3), &poly),
            Err(ProximityError::InvalidGeometry { id: AreaId(3), .. })
        ));
    }

    #[test]
    fn test_self_intersecting_boundary() {
        // Bowtie: edges cross in the middle.
        let poly: Polygon = polygon![
            (x: -77.0, y: 23.7),
            (x: -76.0, y: 24.7),
            (x: -76.0, y: 23.7),
            (x: -77.0, y: 24.7),
            (x: -77.0, y: 23.7),
        ];
        let err = validate_boundary(AreaId(7), &poly).unwrap_err();
        assert!(err.to_string().contains("self-intersecting"));
        assert!(err.to_string().contains("area 7"));
    }

    #[test]
    fn test_boundary_with_hole_is_valid() {
        let poly = Polygon::new(
            geo::LineString::from(vec![
                (-77.0, 23.7),
                (-76.0, 23.7),
                (-76.0, 24.7),
                (-77.0, 24.7),
                (-77.0, 23.7),
            ]),
            vec![geo::LineString::from(vec![
                (-76.6, 24.0),
                (-76.4, 24.0),
                (-76.4, 24.2),
                (-76.6, 24.2),
                (-76.6, 24.0),
            ])],
        );
        assert!(validate_boundary(AreaId(1), &poly).is_ok());
    }
}
