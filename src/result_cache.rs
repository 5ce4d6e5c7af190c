//! Short-TTL cache of computed MPA contexts.
//!
//! Absorbs repeated queries for the same or nearby points (a vessel
//! reporting its position every few seconds) without re-running geometry
//! tests. The cache is not authoritative: clearing it at any time only
//! costs recomputation, never correctness, and any backend failure is
//! treated as a miss by the engine.

use crate::error::{ProximityError, Result};
use bytes::Bytes;
use dashmap::DashMap;
use geo::Point;
use std::time::{Duration, SystemTime};

/// Distributed/short-TTL cache seam. Values are opaque bytes so networked
/// backends (Redis and friends) can implement this without knowing the
/// engine's types; the engine serializes contexts as JSON.
///
/// Read/write races resolve as last-write-wins; entries are idempotently
/// recomputable so no stronger guarantee is needed.
pub trait ResultCache: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<Bytes>>;
    fn set(&self, key: &str, value: Bytes, ttl: Duration) -> Result<()>;
}

/// Deterministic cache key from coordinates rounded to `precision` decimal
/// places, so nearby points share entries. Negative zero is normalized so
/// `-0.00004` and `0.0` agree at four decimals.
pub fn cache_key(point: &Point, precision: usize) -> String {
    let scale = 10f64.powi(precision as i32);
    let mut lon = (point.x() * scale).round() / scale;
    let mut lat = (point.y() * scale).round() / scale;
    if lon == 0.0 {
        lon = 0.0;
    }
    if lat == 0.0 {
        lat = 0.0;
    }
    format!("mpa:context:{lon:.precision$}:{lat:.precision$}")
}

#[derive(Debug, Clone)]
struct CacheEntry {
    value: Bytes,
    /// `None` when the TTL overflows representable time; such entries
    /// never expire.
    expires_at: Option<SystemTime>,
}

impl CacheEntry {
    fn is_expired_at(&self, now: SystemTime) -> bool {
        match self.expires_at {
            Some(at) => now >= at,
            None => false,
        }
    }
}

/// In-process `ResultCache` with lazy TTL: expired entries are dropped on
/// read and otherwise linger until [`purge_expired`](Self::purge_expired)
/// runs. Infallible apart from the trait signature.
#[derive(Debug, Default)]
pub struct MemoryResultCache {
    entries: DashMap<String, CacheEntry>,
}

impl MemoryResultCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries currently held, expired ones included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&self) {
        self.entries.clear();
    }

    /// Drop all expired entries. Returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = SystemTime::now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_expired_at(now));
        before - self.entries.len()
    }
}

impl ResultCache for MemoryResultCache {
    fn get(&self, key: &str) -> Result<Option<Bytes>> {
        let Some(entry) = self.entries.get(key) else {
            return Ok(None);
        };
        if entry.is_expired_at(SystemTime::now()) {
            drop(entry);
            self.entries.remove(key);
            return Ok(None);
        }
        Ok(Some(entry.value.clone()))
    }

    fn set(&self, key: &str, value: Bytes, ttl: Duration) -> Result<()> {
        self.entries.insert(
            key.to_string(),
            CacheEntry {
                value,
                expires_at: SystemTime::now().checked_add(ttl),
            },
        );
        Ok(())
    }
}

/// Cache that fails every operation. Exercises the degrade-to-computation
/// path in tests.
#[derive(Debug, Default)]
pub struct UnavailableCache;

impl ResultCache for UnavailableCache {
    fn get(&self, _key: &str) -> Result<Option<Bytes>> {
        Err(ProximityError::CacheUnavailable("cache offline".to_string()))
    }

    fn set(&self, _key: &str, _value: Bytes, _ttl: Duration) -> Result<()> {
        Err(ProximityError::CacheUnavailable("cache offline".to_string()))
    }
}
