//! Domain model for marine protected area proximity queries.
//!
//! `ProtectedArea` and `Reef` are the stored records loaded from a
//! [`BoundaryStore`](crate::store::BoundaryStore); the remaining types are
//! transient per-query values produced by the engine and never persisted
//! (except as short-TTL entries in the result cache).

use geo::{Point, Polygon};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Opaque identifier of a protected area.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(transparent)]
pub struct AreaId(pub u64);

impl fmt::Display for AreaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Opaque identifier of a reef.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(transparent)]
pub struct ReefId(pub u64);

impl fmt::Display for ReefId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Legal protection level of a marine protected area.
///
/// The discriminant order encodes restrictiveness: `NoTake` is the most
/// restrictive level, `Unprotected` the least. Overlap tie-breaks rely on
/// this ordering.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum ProtectionLevel {
    #[default]
    Unprotected,
    LightlyProtected,
    HighlyProtected,
    NoTake,
}

impl FromStr for ProtectionLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "unprotected" => Ok(Self::Unprotected),
            "lightly_protected" => Ok(Self::LightlyProtected),
            "highly_protected" => Ok(Self::HighlyProtected),
            "no_take" => Ok(Self::NoTake),
            other => Err(format!("unknown protection level: {other:?}")),
        }
    }
}

impl fmt::Display for ProtectionLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Unprotected => "unprotected",
            Self::LightlyProtected => "lightly_protected",
            Self::HighlyProtected => "highly_protected",
            Self::NoTake => "no_take",
        };
        f.write_str(name)
    }
}

/// A marine protected area record as loaded from the backing store.
///
/// The boundary is a polygon in geographic WGS84 coordinates (lon/lat
/// degrees). Records are read-only to the engine; the administrative
/// boundary-sync job owns their lifecycle and triggers a cache rebuild
/// after changing them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProtectedArea {
    pub id: AreaId,
    pub name: String,
    pub protection: ProtectionLevel,
    /// Whether any extraction (fishing, collecting) is forbidden.
    pub no_take: bool,
    pub boundary: Polygon,
}

/// A reef record. The owning area reference is a weak back-reference used
/// only to enrich containment results with nearest-reef context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reef {
    pub id: ReefId,
    pub name: String,
    pub location: Point,
    pub area_id: Option<AreaId>,
}

/// Nearest-area answer for a query point. Transient, produced per query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProximityResult {
    pub area_id: AreaId,
    pub name: String,
    pub protection: ProtectionLevel,
    /// Distance to the nearest boundary point in kilometers; 0 when the
    /// query point lies inside (or on) the boundary.
    pub distance_km: f64,
    /// Nearest point on the area boundary.
    pub nearest_point: Point,
    pub is_within: bool,
}

/// Nearest-reef enrichment attached to containment and context results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReefProximity {
    pub reef_id: ReefId,
    pub name: String,
    pub distance_km: f64,
}

/// Containment answer for a query point that lies inside an area.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContainmentResult {
    pub area_id: AreaId,
    pub name: String,
    pub protection: ProtectionLevel,
    pub is_no_take: bool,
    /// Distance from the query point to the containing area's own
    /// boundary, in kilometers.
    pub boundary_distance_km: f64,
    /// Nearest reef belonging to the containing area, if any.
    pub nearest_reef: Option<ReefProximity>,
}

/// Aggregated per-point answer combining containment, nearest-area and
/// nearest-reef information. Always produced (never "null"): a point far
/// from every area yields all-`None`/`false` fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct MpaContext {
    /// Set when the point lies inside an area.
    pub containment: Option<ContainmentResult>,
    /// Nearest area, inside or out; `None` only when the store is empty.
    pub nearest: Option<ProximityResult>,
    /// Nearest reef of the containing area when inside, otherwise the
    /// globally nearest reef.
    pub nearest_reef: Option<ReefProximity>,
    /// Inside a no-take zone or an area at the most restrictive level.
    pub requires_alert: bool,
    /// Within the configured near-threshold of the nearest area.
    pub is_near: bool,
}

/// Summary of a completed cache warm-up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct WarmStats {
    /// Boundaries loaded and prepared.
    pub areas: usize,
    /// Boundaries skipped because their geometry failed validation.
    pub skipped: usize,
    /// Reefs loaded.
    pub reefs: usize,
}
