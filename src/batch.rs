//! Batch context evaluation.
//!
//! The batch path exists purely for throughput: every point is evaluated
//! against one warmed snapshot with the exact same logic as a single
//! `mpa_context` call, so batching can never change a per-point answer.
//! Points are independent once the snapshot is cloned, so the batch fans
//! out over a bounded pool of scoped worker threads.

use crate::boundary_cache::BoundarySet;
use crate::engine::ProximityEngine;
use crate::error::{ProximityError, Result};
use crate::types::MpaContext;
use geo::Point;
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Cooperative cancellation signal for batch operations. Cloning shares
/// the flag; cancelling from any clone aborts the batch promptly with
/// [`ProximityError::Cancelled`] and leaves the boundary cache untouched.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }
}

/// Evaluate contexts for all items against one snapshot, bounded by the
/// configured worker count.
pub(crate) fn evaluate<K>(
    engine: &ProximityEngine,
    set: &Arc<BoundarySet>,
    items: &[(K, Point)],
    cancel: Option<&CancelToken>,
) -> Result<HashMap<K, MpaContext>>
where
    K: Eq + Hash + Clone + Send + Sync,
{
    if items.is_empty() {
        return Ok(HashMap::new());
    }

    let workers = engine.config().batch_workers.min(items.len());
    if workers <= 1 {
        let mut out = HashMap::with_capacity(items.len());
        for (key, point) in items {
            check_cancelled(cancel)?;
            out.insert(key.clone(), engine.context_with_snapshot(set, point)?);
        }
        return Ok(out);
    }

    let chunk_size = items.len().div_ceil(workers);
    let mut out = HashMap::with_capacity(items.len());

    let results: Vec<Result<Vec<(K, MpaContext)>>> = std::thread::scope(|scope| {
        let handles: Vec<_> = items
            .chunks(chunk_size)
            .map(|chunk| {
                scope.spawn(move || {
                    let mut partial = Vec::with_capacity(chunk.len());
                    for (key, point) in chunk {
                        check_cancelled(cancel)?;
                        partial.push((key.clone(), engine.context_with_snapshot(set, point)?));
                    }
                    Ok(partial)
                })
            })
            .collect();

        handles
            .into_iter()
            .map(|handle| match handle.join() {
                Ok(result) => result,
                Err(panic) => std::panic::resume_unwind(panic),
            })
            .collect()
    });

    for partial in results {
        for (key, ctx) in partial? {
            out.insert(key, ctx);
        }
    }
    Ok(out)
}

fn check_cancelled(cancel: Option<&CancelToken>) -> Result<()> {
    match cancel {
        Some(token) if token.is_cancelled() => Err(ProximityError::Cancelled),
        _ => Ok(()),
    }
}
