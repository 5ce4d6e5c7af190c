//! Spatial proximity and containment engine for marine protected areas.
//!
//! ```rust
//! use geo::{polygon, Point};
//! use mpa_proximity::{
//!     AreaId, EngineBuilder, MemoryStore, ProtectedArea, ProtectionLevel,
//! };
//! use std::sync::Arc;
//!
//! let store = Arc::new(MemoryStore::new());
//! store.push_area(ProtectedArea {
//!     id: AreaId(1),
//!     name: "Exuma Cays Land and Sea Park".to_string(),
//!     protection: ProtectionLevel::NoTake,
//!     no_take: true,
//!     boundary: polygon![
//!         (x: -77.0, y: 23.7),
//!         (x: -76.0, y: 23.7),
//!         (x: -76.0, y: 24.7),
//!         (x: -77.0, y: 24.7),
//!         (x: -77.0, y: 23.7),
//!     ],
//! });
//!
//! let engine = EngineBuilder::new().store(store).build()?;
//! engine.warm_cache()?;
//!
//! let context = engine.mpa_context(&Point::new(-76.5, 24.2))?;
//! assert!(context.requires_alert);
//! # Ok::<(), mpa_proximity::ProximityError>(())
//! ```

pub mod batch;
mod boundary_cache;
pub mod builder;
pub mod config;
pub mod engine;
pub mod error;
pub mod geometry;
pub mod result_cache;
mod spatial_index;
pub mod store;
pub mod types;
pub mod validation;

pub use builder::EngineBuilder;
pub use engine::{EngineStats, ProximityEngine};
pub use error::{ProximityError, Result};

pub use geo::{Point, Polygon, Rect};

pub use batch::CancelToken;
pub use config::Config;
pub use geometry::{BoundaryShape, PreparedBoundary, haversine_km};
pub use result_cache::{MemoryResultCache, ResultCache, UnavailableCache, cache_key};
pub use store::{BoundaryStore, MemoryStore};
pub use types::{
    AreaId, ContainmentResult, MpaContext, ProtectedArea, ProtectionLevel, ProximityResult,
    Reef, ReefId, ReefProximity, WarmStats,
};
pub use validation::validate_geographic_point;

#[cfg(feature = "geojson")]
pub use store::GeoJsonStore;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Common imports
pub mod prelude {

    pub use crate::{EngineBuilder, ProximityEngine, ProximityError, Result};

    pub use geo::{Point, Polygon, Rect};

    pub use crate::{
        AreaId, CancelToken, Config, ContainmentResult, MpaContext, ProtectedArea,
        ProtectionLevel, ProximityResult, Reef, ReefId, ReefProximity, WarmStats,
    };

    pub use crate::{BoundaryStore, MemoryStore};

    pub use crate::{MemoryResultCache, ResultCache};

    #[cfg(feature = "geojson")]
    pub use crate::GeoJsonStore;

    pub use std::time::Duration;
}
