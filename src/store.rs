//! Backing stores for protected-area boundaries and reefs.
//!
//! The engine treats the store as the sole source of truth during a cache
//! warm-up and never writes to it. `MemoryStore` backs tests and embedded
//! use; `GeoJsonStore` loads the boundary files an administrative sync job
//! produces.

use crate::error::{ProximityError, Result};
use crate::types::{ProtectedArea, Reef};
use parking_lot::RwLock;

/// Read access to the current set of protected areas and reefs.
///
/// Implementations doing real I/O should map transport failures to
/// [`ProximityError::DataAccess`]; warm-up propagates that error and keeps
/// serving the previous boundary snapshot.
pub trait BoundaryStore: Send + Sync {
    fn load_protected_areas(&self) -> Result<Vec<ProtectedArea>>;
    fn load_reefs(&self) -> Result<Vec<Reef>>;
}

/// In-memory store. Mutable so tests and embedded callers can play the
/// role of the boundary-sync job: replace records, then re-warm the engine.
#[derive(Debug, Default)]
pub struct MemoryStore {
    areas: RwLock<Vec<ProtectedArea>>,
    reefs: RwLock<Vec<Reef>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_data(areas: Vec<ProtectedArea>, reefs: Vec<Reef>) -> Self {
        Self {
            areas: RwLock::new(areas),
            reefs: RwLock::new(reefs),
        }
    }

    /// Replace all areas, as a boundary sync would.
    pub fn replace_areas(&self, areas: Vec<ProtectedArea>) {
        *self.areas.write() = areas;
    }

    pub fn replace_reefs(&self, reefs: Vec<Reef>) {
        *self.reefs.write() = reefs;
    }

    pub fn push_area(&self, area: ProtectedArea) {
        self.areas.write().push(area);
    }

    pub fn push_reef(&self, reef: Reef) {
        self.reefs.write().push(reef);
    }
}

impl BoundaryStore for MemoryStore {
    fn load_protected_areas(&self) -> Result<Vec<ProtectedArea>> {
        Ok(self.areas.read().clone())
    }

    fn load_reefs(&self) -> Result<Vec<Reef>> {
        Ok(self.reefs.read().clone())
    }
}

#[cfg(feature = "geojson")]
pub use self::geojson_store::GeoJsonStore;

#[cfg(feature = "geojson")]
mod geojson_store {
    use super::*;
    use crate::types::{AreaId, ProtectionLevel, ReefId};
    use geo::{Point, Polygon};
    use geojson::GeoJson;
    use std::path::{Path, PathBuf};

    /// File-backed store reading GeoJSON FeatureCollections.
    ///
    /// Area features carry a `Polygon` geometry and the properties `id`,
    /// `name`, `protection` and optionally `no_take`. Reef features carry
    /// a `Point` geometry and `id`, `name` and optionally `area_id`.
    /// Features missing required properties or carrying unsupported
    /// geometry are skipped with a warning; unreadable or unparsable files
    /// fail the whole load with a data-access error.
    #[derive(Debug, Clone)]
    pub struct GeoJsonStore {
        areas_path: PathBuf,
        reefs_path: Option<PathBuf>,
    }

    impl GeoJsonStore {
        pub fn new<P: Into<PathBuf>>(areas_path: P) -> Self {
            Self {
                areas_path: areas_path.into(),
                reefs_path: None,
            }
        }

        pub fn with_reefs<P: Into<PathBuf>>(mut self, reefs_path: P) -> Self {
            self.reefs_path = Some(reefs_path.into());
            self
        }

        fn parse_collection(path: &Path) -> Result<geojson::FeatureCollection> {
            let raw = std::fs::read_to_string(path).map_err(|e| {
                ProximityError::DataAccess(format!("reading {}: {}", path.display(), e))
            })?;
            let geojson: GeoJson = raw.parse().map_err(|e: geojson::Error| {
                ProximityError::DataAccess(format!("parsing {}: {}", path.display(), e))
            })?;
            match geojson {
                GeoJson::FeatureCollection(collection) => Ok(collection),
                _ => Err(ProximityError::DataAccess(format!(
                    "{} is not a FeatureCollection",
                    path.display()
                ))),
            }
        }

        fn property_u64(feature: &geojson::Feature, key: &str) -> Option<u64> {
            feature.property(key).and_then(|v| v.as_u64())
        }

        fn property_str(feature: &geojson::Feature, key: &str) -> Option<String> {
            feature
                .property(key)
                .and_then(|v| v.as_str())
                .map(str::to_string)
        }
    }

    impl BoundaryStore for GeoJsonStore {
        fn load_protected_areas(&self) -> Result<Vec<ProtectedArea>> {
            let collection = Self::parse_collection(&self.areas_path)?;
            let mut areas = Vec::new();

            for feature in collection.features {
                let Some(id) = Self::property_u64(&feature, "id") else {
                    log::warn!("skipping area feature without numeric 'id' property");
                    continue;
                };
                let Some(name) = Self::property_str(&feature, "name") else {
                    log::warn!("skipping area feature {id} without 'name' property");
                    continue;
                };

                let protection = Self::property_str(&feature, "protection")
                    .and_then(|s| s.parse::<ProtectionLevel>().ok())
                    .unwrap_or_default();
                let no_take = feature
                    .property("no_take")
                    .and_then(|v| v.as_bool())
                    .unwrap_or(protection == ProtectionLevel::NoTake);

                let Some(geometry) = feature.geometry else {
                    log::warn!("skipping area feature {id} without geometry");
                    continue;
                };
                let boundary: Polygon = match geometry.value.try_into() {
                    Ok(polygon) => polygon,
                    Err(_) => {
                        log::warn!("skipping area feature {id}: geometry is not a Polygon");
                        continue;
                    }
                };

                areas.push(ProtectedArea {
                    id: AreaId(id),
                    name,
                    protection,
                    no_take,
                    boundary,
                });
            }

            Ok(areas)
        }

        fn load_reefs(&self) -> Result<Vec<Reef>> {
            let Some(path) = &self.reefs_path else {
                return Ok(Vec::new());
            };
            let collection = Self::parse_collection(path)?;
            let mut reefs = Vec::new();

            for feature in collection.features {
                let Some(id) = Self::property_u64(&feature, "id") else {
                    log::warn!("skipping reef feature without numeric 'id' property");
                    continue;
                };
                let Some(name) = Self::property_str(&feature, "name") else {
                    log::warn!("skipping reef feature {id} without 'name' property");
                    continue;
                };

                let area_id = Self::property_u64(&feature, "area_id").map(AreaId);

                let Some(geometry) = feature.geometry else {
                    log::warn!("skipping reef feature {id} without geometry");
                    continue;
                };
                let location: Point = match geometry.value.try_into() {
                    Ok(point) => point,
                    Err(_) => {
                        log::warn!("skipping reef feature {id}: geometry is not a Point");
                        continue;
                    }
                };

                reefs.push(Reef {
                    id: ReefId(id),
                    name,
                    location,
                    area_id,
                });
            }

            Ok(reefs)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AreaId, ProtectionLevel};
    use geo::polygon;

    fn sample_area(id: u64) -> ProtectedArea {
        ProtectedArea {
            id: AreaId(id),
            name: format!("Area {id}"),
            protection: ProtectionLevel::HighlyProtected,
            no_take: false,
            boundary: polygon![
                (x: -77.0, y: 23.7),
                (x: -76.0, y: 23.7),
                (x: -76.0, y: 24.7),
                (x: -77.0, y: 24.7),
                (x: -77.0, y: 23.7),
            ],
        }
    }

    #[test]
    fn test_memory_store_round_trip() {
        let store = MemoryStore::new();
        assert!(store.load_protected_areas().unwrap().is_empty());
        assert!(store.load_reefs().unwrap().is_empty());

        store.push_area(sample_area(1));
        store.push_area(sample_area(2));
        assert_eq!(store.load_protected_areas().unwrap().len(), 2);
    }

    #[test]
    fn test_memory_store_replace() {
        let store = MemoryStore::with_data(vec![sample_area(1)], Vec::new());
        store.replace_areas(vec![sample_area(7), sample_area(8)]);

        let areas = store.load_protected_areas().unwrap();
        assert_eq!(areas.len(), 2);
        assert_eq!(areas[0].id, AreaId(7));
    }
}
