//! Proximity and containment queries over prepared boundaries.
//!
//! Every query runs in three stages: the result cache is consulted first
//! (context queries only), the bbox pre-filter narrows the candidate set,
//! and the prepared boundaries run the exact containment/distance tests.
//! All operations take a WGS84 lon/lat point and report distances in
//! kilometers.

use crate::batch::{self, CancelToken};
use crate::boundary_cache::{BoundaryCache, BoundarySet, PreparedArea};
use crate::builder::EngineBuilder;
use crate::config::Config;
use crate::error::{ProximityError, Result};
use crate::geometry::BoundaryShape;
use crate::result_cache::{ResultCache, cache_key};
use crate::spatial_index::radius_envelope;
use crate::store::BoundaryStore;
use crate::types::{
    ContainmentResult, MpaContext, ProtectionLevel, ProximityResult, WarmStats,
};
use crate::validation::validate_geographic_point;
use bytes::Bytes;
use geo::Point;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;

/// Snapshot counters for observability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EngineStats {
    /// Whether a boundary snapshot is currently installed.
    pub warmed: bool,
    pub areas: usize,
    pub reefs: usize,
}

/// The proximity/containment engine.
///
/// Cheap to share behind an `Arc`; all operations take `&self` and may run
/// concurrently. A `warm_cache` rebuild installs its snapshot atomically,
/// so in-flight queries finish against the old snapshot or the new one but
/// never a half-built one.
///
/// # Example
///
/// ```rust
/// use geo::{polygon, Point};
/// use mpa_proximity::{
///     AreaId, EngineBuilder, MemoryStore, ProtectedArea, ProtectionLevel,
/// };
/// use std::sync::Arc;
///
/// let store = Arc::new(MemoryStore::new());
/// store.push_area(ProtectedArea {
///     id: AreaId(1),
///     name: "Exuma Cays Land and Sea Park".to_string(),
///     protection: ProtectionLevel::NoTake,
///     no_take: true,
///     boundary: polygon![
///         (x: -77.0, y: 23.7),
///         (x: -76.0, y: 23.7),
///         (x: -76.0, y: 24.7),
///         (x: -77.0, y: 24.7),
///         (x: -77.0, y: 23.7),
///     ],
/// });
///
/// let engine = EngineBuilder::new().store(store).build()?;
/// engine.warm_cache()?;
///
/// let hit = engine.check_containment(&Point::new(-76.5, 24.2))?.unwrap();
/// assert!(hit.is_no_take);
///
/// let ctx = engine.mpa_context(&Point::new(-76.5, 24.2))?;
/// assert!(ctx.requires_alert);
/// # Ok::<(), mpa_proximity::ProximityError>(())
/// ```
pub struct ProximityEngine {
    config: Config,
    boundaries: BoundaryCache,
    results: Arc<dyn ResultCache>,
}

impl ProximityEngine {
    pub fn builder() -> EngineBuilder {
        EngineBuilder::new()
    }

    pub(crate) fn new(
        store: Arc<dyn BoundaryStore>,
        results: Arc<dyn ResultCache>,
        config: Config,
    ) -> Self {
        Self {
            config,
            boundaries: BoundaryCache::new(store),
            results,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Load all boundaries from the backing store and install a fresh
    /// prepared snapshot. Invalid boundaries are skipped with a warning
    /// and counted; a store failure propagates and leaves any previous
    /// snapshot serving reads.
    pub fn warm_cache(&self) -> Result<WarmStats> {
        let (_, stats) = self.boundaries.warm()?;
        Ok(stats)
    }

    /// Drop the prepared snapshot. The next query rebuilds lazily, or
    /// fails with `NotWarmed` when `rebuild_on_miss` is disabled.
    pub fn clear_cache(&self) {
        self.boundaries.clear();
    }

    pub fn stats(&self) -> EngineStats {
        match self.boundaries.peek() {
            Some(set) => EngineStats {
                warmed: true,
                areas: set.areas().len(),
                reefs: set.reef_count(),
            },
            None => EngineStats::default(),
        }
    }

    /// Nearest protected area to the point: the containing area with
    /// distance 0 when inside (smallest surface area wins across
    /// overlaps, then smallest id), otherwise the area with minimum
    /// boundary distance (equidistant ties broken by smallest id).
    /// `None` only when no boundaries exist.
    pub fn find_nearest_mpa(&self, point: &Point) -> Result<Option<ProximityResult>> {
        validate_geographic_point(point)?;
        let set = self.snapshot()?;
        Ok(nearest_in_set(&set, point))
    }

    /// Containment lookup. `None` means the point is outside every
    /// boundary, the expected outcome for most of the ocean. Overlapping
    /// containment resolves to the most restrictive protection level,
    /// then the smallest id.
    pub fn check_containment(&self, point: &Point) -> Result<Option<ContainmentResult>> {
        validate_geographic_point(point)?;
        let set = self.snapshot()?;
        Ok(containment_in_set(&set, point))
    }

    /// All areas within `radius_km` of the point (distance 0 when
    /// inside), ascending by distance with ties broken by id. A zero
    /// radius returns exactly the containing area(s).
    pub fn mpas_within_radius(
        &self,
        point: &Point,
        radius_km: f64,
    ) -> Result<Vec<ProximityResult>> {
        validate_geographic_point(point)?;
        if !radius_km.is_finite() || radius_km < 0.0 {
            return Err(ProximityError::InvalidInput(format!(
                "Radius must be finite and non-negative, got: {}",
                radius_km
            )));
        }
        let set = self.snapshot()?;
        Ok(radius_in_set(&set, point, radius_km))
    }

    /// Aggregated context for one point. Always succeeds: a point far
    /// from everything yields all-`None`/`false` fields. Consults the
    /// result cache first and writes the computed context back with the
    /// configured TTL; any cache failure falls through to direct
    /// computation.
    pub fn mpa_context(&self, point: &Point) -> Result<MpaContext> {
        validate_geographic_point(point)?;
        let set = self.snapshot()?;
        self.context_with_snapshot(&set, point)
    }

    /// Batch form of [`mpa_context`](Self::mpa_context): identical per
    /// point to individual calls, evaluated against a single snapshot and
    /// parallelized over a bounded worker pool. Populates the same cache
    /// keys, so later single-point queries can hit. Empty input yields an
    /// empty map.
    pub fn mpa_context_batch<K>(&self, items: &[(K, Point)]) -> Result<HashMap<K, MpaContext>>
    where
        K: Eq + Hash + Clone + Send + Sync,
    {
        self.batch_inner(items, None)
    }

    /// Like [`mpa_context_batch`](Self::mpa_context_batch) but abortable:
    /// cancelling the token makes the batch return `Cancelled` promptly.
    pub fn mpa_context_batch_with_cancel<K>(
        &self,
        items: &[(K, Point)],
        cancel: &CancelToken,
    ) -> Result<HashMap<K, MpaContext>>
    where
        K: Eq + Hash + Clone + Send + Sync,
    {
        self.batch_inner(items, Some(cancel))
    }

    fn batch_inner<K>(
        &self,
        items: &[(K, Point)],
        cancel: Option<&CancelToken>,
    ) -> Result<HashMap<K, MpaContext>>
    where
        K: Eq + Hash + Clone + Send + Sync,
    {
        if items.is_empty() {
            return Ok(HashMap::new());
        }
        for (idx, (_, point)) in items.iter().enumerate() {
            validate_geographic_point(point).map_err(|e| {
                ProximityError::InvalidInput(format!("batch item {}: {}", idx, e))
            })?;
        }
        let set = self.snapshot()?;
        batch::evaluate(self, &set, items, cancel)
    }

    pub(crate) fn context_with_snapshot(
        &self,
        set: &Arc<BoundarySet>,
        point: &Point,
    ) -> Result<MpaContext> {
        let key = cache_key(point, self.config.cache_precision);

        match self.results.get(&key) {
            Ok(Some(bytes)) => match serde_json::from_slice::<MpaContext>(&bytes) {
                Ok(ctx) => return Ok(ctx),
                Err(e) => log::debug!("discarding undecodable cached context for {key}: {e}"),
            },
            Ok(None) => {}
            Err(e) => log::debug!("result cache read failed, computing directly: {e}"),
        }

        let ctx = context_in_set(set, point, &self.config);

        let bytes = Bytes::from(serde_json::to_vec(&ctx)?);
        if let Err(e) = self.results.set(&key, bytes, self.config.result_ttl()) {
            log::debug!("result cache write failed: {e}");
        }
        Ok(ctx)
    }

    fn snapshot(&self) -> Result<Arc<BoundarySet>> {
        self.boundaries.snapshot(self.config.rebuild_on_miss)
    }
}

fn proximity_result(area: &PreparedArea, point: &Point) -> ProximityResult {
    let contained = area.shape.contains_point(point);
    let (nearest_point, boundary_km) = area.shape.nearest_boundary_point(point);
    ProximityResult {
        area_id: area.id,
        name: area.name.clone(),
        protection: area.protection,
        distance_km: if contained { 0.0 } else { boundary_km },
        nearest_point,
        is_within: contained,
    }
}

/// Ordinals of areas whose boundary actually contains the point, after
/// the bbox pre-filter.
fn containing_ordinals(set: &BoundarySet, point: &Point) -> Vec<usize> {
    set.index()
        .candidates_for_point(point)
        .into_iter()
        .filter(|&ordinal| set.area(ordinal).shape.contains_point(point))
        .collect()
}

fn nearest_in_set(set: &BoundarySet, point: &Point) -> Option<ProximityResult> {
    if set.is_empty() {
        return None;
    }

    // Smallest containing area first, then smallest id.
    let containing = containing_ordinals(set, point).into_iter().min_by(|&a, &b| {
        let (a, b) = (set.area(a), set.area(b));
        a.shape
            .surface_m2()
            .partial_cmp(&b.shape.surface_m2())
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.id.cmp(&b.id))
    });
    if let Some(best) = containing {
        return Some(proximity_result(set.area(best), point));
    }

    // Outside everything: exact scan with bbox lower-bound pruning.
    // Candidates are visited in ascending lower-bound order so the scan
    // stops as soon as no remaining bbox can beat the best exact match.
    let mut order: Vec<(usize, f64)> = set
        .areas()
        .iter()
        .enumerate()
        .map(|(ordinal, area)| (ordinal, area.shape.bbox_distance_lower_bound_km(point)))
        .collect();
    order.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(Ordering::Equal));

    let mut best: Option<(usize, f64)> = None;
    for (ordinal, lower_bound) in order {
        if let Some((_, best_km)) = best {
            if lower_bound > best_km {
                break;
            }
        }
        let (_, dist_km) = set.area(ordinal).shape.nearest_boundary_point(point);
        if !dist_km.is_finite() {
            continue;
        }
        let better = match best {
            Some((best_ordinal, best_km)) => {
                dist_km < best_km
                    || (dist_km == best_km && set.area(ordinal).id < set.area(best_ordinal).id)
            }
            None => true,
        };
        if better {
            best = Some((ordinal, dist_km));
        }
    }

    best.map(|(ordinal, _)| proximity_result(set.area(ordinal), point))
}

fn containment_in_set(set: &BoundarySet, point: &Point) -> Option<ContainmentResult> {
    let containing = containing_ordinals(set, point);
    // Most restrictive protection level wins across overlaps, then the
    // smallest id keeps repeated calls deterministic.
    let best = containing.into_iter().min_by(|&a, &b| {
        let (a, b) = (set.area(a), set.area(b));
        b.protection
            .cmp(&a.protection)
            .then_with(|| a.id.cmp(&b.id))
    })?;

    let area = set.area(best);
    let (_, boundary_km) = area.shape.nearest_boundary_point(point);
    Some(ContainmentResult {
        area_id: area.id,
        name: area.name.clone(),
        protection: area.protection,
        is_no_take: area.no_take,
        boundary_distance_km: boundary_km,
        nearest_reef: set.nearest_reef_of_area(area.id, point),
    })
}

fn radius_in_set(set: &BoundarySet, point: &Point, radius_km: f64) -> Vec<ProximityResult> {
    let envelope = radius_envelope(point, radius_km);
    let mut results: Vec<ProximityResult> = set
        .index()
        .candidates_in_envelope(&envelope)
        .into_iter()
        .filter_map(|ordinal| {
            let result = proximity_result(set.area(ordinal), point);
            (result.distance_km <= radius_km).then_some(result)
        })
        .collect();

    results.sort_by(|a, b| {
        a.distance_km
            .partial_cmp(&b.distance_km)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.area_id.cmp(&b.area_id))
    });
    results
}

fn context_in_set(set: &BoundarySet, point: &Point, config: &Config) -> MpaContext {
    let containment = containment_in_set(set, point);
    let nearest = nearest_in_set(set, point);

    let nearest_reef = match &containment {
        Some(hit) => hit.nearest_reef.clone(),
        None => set.nearest_reef_global(point),
    };

    let requires_alert = containment
        .as_ref()
        .map(|hit| hit.is_no_take || hit.protection >= ProtectionLevel::NoTake)
        .unwrap_or(false);
    let is_near = nearest
        .as_ref()
        .map(|n| n.distance_km <= config.near_threshold_km)
        .unwrap_or(false);

    MpaContext {
        containment,
        nearest,
        nearest_reef,
        requires_alert,
        is_near,
    }
}
