//! # Result Cache Module
//!
//! Time-bounded memoization of resolution outcomes, keyed by the normalized
//! ingredient set, the filter and the clamped result count.
//!
//! The cache is an optimization only. Entries are returned verbatim while
//! unexpired, failed computations are never stored, and a cache that cannot
//! be trusted behaves like an empty one.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use crate::ingredient_normalizer::IngredientSet;
use crate::recipe_model::FilterKind;
use crate::resolution_pipeline::ResolutionOutcome;
use crate::search_errors::ResolutionError;

/// Source of the current instant
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// A clock that only moves when told to
#[derive(Debug)]
pub struct ManualClock {
    start: Instant,
    offset: Mutex<Duration>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
            offset: Mutex::new(Duration::ZERO),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut offset = self.offset.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        *offset += by;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        let offset = *self.offset.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        self.start + offset
    }
}

/// Order-insensitive cache key
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    tokens: String,
    filter: Option<FilterKind>,
    count: usize,
}

impl CacheKey {
    pub fn new(ingredients: &IngredientSet, filter: Option<FilterKind>, count: usize) -> Self {
        Self {
            tokens: ingredients.key(),
            filter,
            count,
        }
    }
}

#[derive(Debug, Clone)]
struct CacheEntry {
    outcome: ResolutionOutcome,
    expires_at: Instant,
}

/// TTL cache of resolution outcomes
///
/// The lock is only taken for map reads and writes, never across the
/// computation itself, so concurrent misses on one key may both compute and
/// the last writer wins.
pub struct ResultCache {
    ttl: Option<Duration>,
    clock: Arc<dyn Clock>,
    entries: Mutex<HashMap<CacheKey, CacheEntry>>,
}

impl ResultCache {
    /// A cache whose entries live for `ttl`; `None` disables caching
    pub fn new(ttl: Option<Duration>, clock: Arc<dyn Clock>) -> Self {
        Self {
            ttl,
            clock,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.ttl.is_some()
    }

    /// Lock the map, or report a poisoned lock
    ///
    /// A poisoned map is emptied and the poison cleared before the error is
    /// returned, so only the current call loses the cache.
    fn lock_entries(&self) -> Result<MutexGuard<'_, HashMap<CacheKey, CacheEntry>>, ResolutionError> {
        match self.entries.lock() {
            Ok(entries) => Ok(entries),
            Err(poisoned) => {
                poisoned.into_inner().clear();
                self.entries.clear_poison();
                Err(ResolutionError::InternalInconsistency(
                    "result cache lock poisoned".to_string(),
                ))
            }
        }
    }

    /// Return the cached outcome for `key`, or compute, store and return it
    pub async fn get_or_compute<F, Fut>(
        &self,
        key: CacheKey,
        compute: F,
    ) -> Result<ResolutionOutcome, ResolutionError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<ResolutionOutcome, ResolutionError>>,
    {
        let Some(ttl) = self.ttl else {
            return compute().await;
        };

        match self.lookup(&key) {
            Ok(Some(outcome)) => {
                debug!(key = %key.tokens, "Result cache hit");
                return Ok(outcome);
            }
            Ok(None) => debug!(key = %key.tokens, "Result cache miss"),
            Err(e) => warn!(error = %e, "Result cache unusable, treating as a miss"),
        }

        let outcome = compute().await?;

        let expires_at = self.clock.now() + ttl;
        match self.lock_entries() {
            Ok(mut entries) => {
                entries.insert(
                    key,
                    CacheEntry {
                        outcome: outcome.clone(),
                        expires_at,
                    },
                );
            }
            Err(e) => warn!(error = %e, "Could not store outcome in result cache"),
        }
        Ok(outcome)
    }

    /// Unexpired outcome for `key`, evicting it if it has expired
    fn lookup(&self, key: &CacheKey) -> Result<Option<ResolutionOutcome>, ResolutionError> {
        let now = self.clock.now();
        let mut entries = self.lock_entries()?;

        match entries.get(key) {
            Some(entry) if entry.expires_at > now => Ok(Some(entry.outcome.clone())),
            Some(_) => {
                entries.remove(key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    /// Drop every expired entry, returning how many were removed
    pub fn sweep_expired(&self) -> usize {
        let now = self.clock.now();
        match self.lock_entries() {
            Ok(mut entries) => {
                let before = entries.len();
                entries.retain(|_, entry| entry.expires_at > now);
                before - entries.len()
            }
            Err(e) => {
                warn!(error = %e, "Skipping result cache sweep");
                0
            }
        }
    }

    pub fn len(&self) -> usize {
        self.lock_entries().map(|entries| entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
