//! Fluent construction of a [`ProximityEngine`].

use crate::config::Config;
use crate::engine::ProximityEngine;
use crate::error::{ProximityError, Result};
use crate::result_cache::{MemoryResultCache, ResultCache};
use crate::store::BoundaryStore;
use std::sync::Arc;

/// Builder for [`ProximityEngine`]. A boundary store is required; the
/// result cache defaults to an in-process [`MemoryResultCache`] and the
/// configuration to [`Config::default`].
///
/// ```rust
/// use mpa_proximity::{Config, EngineBuilder, MemoryStore};
/// use std::sync::Arc;
///
/// let engine = EngineBuilder::new()
///     .store(Arc::new(MemoryStore::new()))
///     .config(Config::default().with_near_threshold_km(10.0))
///     .warm_on_build(true)
///     .build()?;
/// assert!(engine.stats().warmed);
/// # Ok::<(), mpa_proximity::ProximityError>(())
/// ```
#[derive(Default)]
pub struct EngineBuilder {
    store: Option<Arc<dyn BoundaryStore>>,
    cache: Option<Arc<dyn ResultCache>>,
    config: Config,
    warm_on_build: bool,
}

impl EngineBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Source of protected area boundaries and reef positions. Required.
    pub fn store(mut self, store: Arc<dyn BoundaryStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Result cache backend. Defaults to [`MemoryResultCache`].
    pub fn cache(mut self, cache: Arc<dyn ResultCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    /// Warm the boundary cache eagerly during `build`, so the first query
    /// pays no load cost. A store failure then fails `build` itself.
    pub fn warm_on_build(mut self, warm: bool) -> Self {
        self.warm_on_build = warm;
        self
    }

    pub fn build(self) -> Result<ProximityEngine> {
        let store = self.store.ok_or_else(|| {
            ProximityError::InvalidInput("a boundary store is required".to_string())
        })?;
        self.config.validate().map_err(ProximityError::InvalidInput)?;

        let cache = self
            .cache
            .unwrap_or_else(|| Arc::new(MemoryResultCache::new()));

        let engine = ProximityEngine::new(store, cache, self.config);
        if self.warm_on_build {
            engine.warm_cache()?;
        }
        Ok(engine)
    }
}
