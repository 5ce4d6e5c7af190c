//! Prepared-boundary snapshot and its lifecycle.
//!
//! `BoundarySet` is an immutable snapshot of every prepared boundary plus
//! the bbox index and reef lookup tables. `BoundaryCache` owns the live
//! snapshot behind an `RwLock<Option<Arc<..>>>`: readers clone the `Arc`
//! and run the whole query against one consistent snapshot, a rebuild
//! installs its replacement with a single swap, and in-flight queries
//! finish against whichever snapshot they started with.

use crate::error::Result;
use crate::geometry::{PreparedBoundary, haversine_km};
use crate::spatial_index::BoundaryIndex;
use crate::store::BoundaryStore;
use crate::types::{AreaId, ProtectedArea, ProtectionLevel, Reef, ReefProximity, WarmStats};
use crate::validation::validate_boundary;
use geo::Point;
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use std::sync::Arc;

/// A protected area with its boundary prepared for repeated predicates.
#[derive(Debug, Clone)]
pub(crate) struct PreparedArea {
    pub id: AreaId,
    pub name: String,
    pub protection: ProtectionLevel,
    pub no_take: bool,
    pub shape: PreparedBoundary,
}

/// Immutable snapshot of the boundary world at warm-up time.
#[derive(Debug)]
pub(crate) struct BoundarySet {
    areas: Vec<PreparedArea>,
    index: BoundaryIndex,
    reefs: Vec<Reef>,
    reefs_by_area: FxHashMap<AreaId, Vec<usize>>,
}

impl BoundarySet {
    /// Prepare all boundaries, skipping invalid ones with a warning.
    /// Returns the snapshot and how many boundaries were skipped.
    pub(crate) fn build(mut raw_areas: Vec<ProtectedArea>, reefs: Vec<Reef>) -> (Self, usize) {
        // Stable ordinal order keeps scans deterministic across rebuilds.
        raw_areas.sort_by_key(|area| area.id);

        let mut areas = Vec::with_capacity(raw_areas.len());
        let mut skipped = 0usize;

        for raw in raw_areas {
            if let Err(err) = validate_boundary(raw.id, &raw.boundary) {
                log::warn!("skipping {}: {}", raw.name, err);
                skipped += 1;
                continue;
            }
            let Some(shape) = PreparedBoundary::new(raw.boundary) else {
                log::warn!("skipping boundary of area {}: no bounding box", raw.id);
                skipped += 1;
                continue;
            };
            areas.push(PreparedArea {
                id: raw.id,
                name: raw.name,
                protection: raw.protection,
                no_take: raw.no_take,
                shape,
            });
        }

        let shapes: Vec<&PreparedBoundary> = areas.iter().map(|a| &a.shape).collect();
        let index = BoundaryIndex::build(&shapes);

        let mut reefs_by_area: FxHashMap<AreaId, Vec<usize>> = FxHashMap::default();
        for (idx, reef) in reefs.iter().enumerate() {
            if let Some(area_id) = reef.area_id {
                reefs_by_area.entry(area_id).or_default().push(idx);
            }
        }

        (
            Self {
                areas,
                index,
                reefs,
                reefs_by_area,
            },
            skipped,
        )
    }

    pub(crate) fn areas(&self) -> &[PreparedArea] {
        &self.areas
    }

    pub(crate) fn area(&self, ordinal: usize) -> &PreparedArea {
        &self.areas[ordinal]
    }

    pub(crate) fn index(&self) -> &BoundaryIndex {
        &self.index
    }

    pub(crate) fn reef_count(&self) -> usize {
        self.reefs.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.areas.is_empty()
    }

    /// Nearest reef belonging to the given area, if it has any.
    pub(crate) fn nearest_reef_of_area(
        &self,
        area_id: AreaId,
        point: &Point,
    ) -> Option<ReefProximity> {
        let indices = self.reefs_by_area.get(&area_id)?;
        self.nearest_reef_among(indices.iter().map(|&i| &self.reefs[i]), point)
    }

    /// Nearest reef across all reefs, regardless of owning area.
    pub(crate) fn nearest_reef_global(&self, point: &Point) -> Option<ReefProximity> {
        self.nearest_reef_among(self.reefs.iter(), point)
    }

    fn nearest_reef_among<'a>(
        &self,
        reefs: impl Iterator<Item = &'a Reef>,
        point: &Point,
    ) -> Option<ReefProximity> {
        let mut best: Option<(&Reef, f64)> = None;
        for reef in reefs {
            let dist = haversine_km(point, &reef.location);
            if !dist.is_finite() {
                continue;
            }
            let closer = match best {
                Some((best_reef, best_dist)) => {
                    dist < best_dist || (dist == best_dist && reef.id < best_reef.id)
                }
                None => true,
            };
            if closer {
                best = Some((reef, dist));
            }
        }
        best.map(|(reef, dist)| ReefProximity {
            reef_id: reef.id,
            name: reef.name.clone(),
            distance_km: dist,
        })
    }
}

/// Owner of the live snapshot. Shared, read-mostly: queries take the read
/// lock just long enough to clone the `Arc`; warm-up builds the new set
/// entirely outside the lock and swaps it in.
pub(crate) struct BoundaryCache {
    store: Arc<dyn BoundaryStore>,
    current: RwLock<Option<Arc<BoundarySet>>>,
}

impl BoundaryCache {
    pub(crate) fn new(store: Arc<dyn BoundaryStore>) -> Self {
        Self {
            store,
            current: RwLock::new(None),
        }
    }

    /// Load all boundaries and reefs and install a fresh snapshot.
    /// Idempotent. On store failure the previous snapshot (if any) stays
    /// live and keeps serving reads.
    pub(crate) fn warm(&self) -> Result<(Arc<BoundarySet>, WarmStats)> {
        let raw_areas = self.store.load_protected_areas()?;
        let reefs = self.store.load_reefs()?;

        let (set, skipped) = BoundarySet::build(raw_areas, reefs);
        let stats = WarmStats {
            areas: set.areas().len(),
            skipped,
            reefs: set.reef_count(),
        };
        let set = Arc::new(set);

        *self.current.write() = Some(Arc::clone(&set));
        log::info!(
            "boundary cache warmed: {} areas, {} reefs, {} skipped",
            stats.areas,
            stats.reefs,
            stats.skipped
        );
        Ok((set, stats))
    }

    /// Drop the snapshot. The next query rebuilds lazily or fails with
    /// `NotWarmed` depending on configuration.
    pub(crate) fn clear(&self) {
        *self.current.write() = None;
        log::info!("boundary cache cleared");
    }

    /// Current snapshot, warming lazily when allowed.
    pub(crate) fn snapshot(&self, rebuild_on_miss: bool) -> Result<Arc<BoundarySet>> {
        if let Some(set) = self.current.read().as_ref() {
            return Ok(Arc::clone(set));
        }
        if !rebuild_on_miss {
            return Err(crate::error::ProximityError::NotWarmed);
        }
        // Concurrent callers may race to rebuild; the build is idempotent
        // and last-write-wins on the swap.
        let (set, _) = self.warm()?;
        Ok(set)
    }

    /// Snapshot without triggering a rebuild.
    pub(crate) fn peek(&self) -> Option<Arc<BoundarySet>> {
        self.current.read().clone()
    }
}
