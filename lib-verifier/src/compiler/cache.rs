//! Compiler handle cache
//!
//! Loading a compiler is expensive (download plus initialization), so handles
//! are memoized per version label. Concurrent requests for the same uncached
//! label share one in-flight load. Failed loads are not cached.
//!
//! In-flight loads live in a pending table that is never evicted; a handle
//! enters the LRU only once its load has finished. Loaded handles are evicted
//! least-recently-used once `capacity` of them are held. Eviction only drops
//! the cache's reference; handles already handed out keep working.

use super::{CompilerHandle, CompilerLoader};
use crate::error::VerifyResult;
use lru::LruCache;
use serde::Serialize;
use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

/// Default number of compiler handles kept
pub const DEFAULT_CACHE_CAPACITY: usize = 16;

type Handle = Arc<dyn CompilerHandle>;
type HandleCell = Arc<OnceCell<Handle>>;

/// Cache statistics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    /// Loader invocations
    pub loads: u64,
    pub load_failures: u64,
    pub evictions: u64,
    pub entry_count: usize,
}

impl CacheStats {
    /// Hit rate as a percentage
    pub fn hit_rate(&self) -> f64 {
        let total = (self.hits + self.misses) as f64;
        if total == 0.0 {
            0.0
        } else {
            (self.hits as f64 / total) * 100.0
        }
    }
}

/// Memoizing, single-flight compiler cache
///
/// Lock order: `entries`, then `pending`, then `stats`.
pub struct CompilerCache {
    loader: Arc<dyn CompilerLoader>,
    entries: Mutex<LruCache<String, Handle>>,
    pending: Mutex<HashMap<String, HandleCell>>,
    stats: Mutex<CacheStats>,
}

impl CompilerCache {
    /// Create a cache holding up to [`DEFAULT_CACHE_CAPACITY`] handles
    pub fn new(loader: Arc<dyn CompilerLoader>) -> Self {
        let capacity = NonZeroUsize::new(DEFAULT_CACHE_CAPACITY).unwrap_or(NonZeroUsize::MIN);
        Self::with_capacity(loader, capacity)
    }

    pub fn with_capacity(loader: Arc<dyn CompilerLoader>, capacity: NonZeroUsize) -> Self {
        Self {
            loader,
            entries: Mutex::new(LruCache::new(capacity)),
            pending: Mutex::new(HashMap::new()),
            stats: Mutex::new(CacheStats::default()),
        }
    }

    /// Return the cached handle for `version`, loading it on first use.
    pub async fn get_or_load(&self, version: &str) -> VerifyResult<Handle> {
        let cell = match self.lookup(version) {
            Ok(handle) => {
                debug!("Compiler cache hit for {}", version);
                lock(&self.stats).hits += 1;
                return Ok(handle);
            }
            Err(cell) => cell,
        };

        debug!("Compiler cache miss for {}", version);
        lock(&self.stats).misses += 1;

        let loader = Arc::clone(&self.loader);
        let stats = &self.stats;
        let result = cell
            .get_or_try_init(|| async move {
                info!("Loading compiler {}", version);
                lock(stats).loads += 1;
                loader.load(version).await
            })
            .await;

        match result {
            Ok(handle) => {
                let handle = Arc::clone(handle);
                self.promote(version, &cell, &handle);
                Ok(handle)
            }
            Err(e) => {
                warn!("Compiler {} failed to load: {}", version, e);
                lock(&self.stats).load_failures += 1;
                self.release_failed(version, &cell);
                Err(e)
            }
        }
    }

    /// True when a loaded handle for `version` is cached
    pub fn contains(&self, version: &str) -> bool {
        lock(&self.entries).contains(version)
    }

    /// Number of loaded handles held
    pub fn len(&self) -> usize {
        lock(&self.entries).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of loads currently in flight
    pub fn pending_loads(&self) -> usize {
        lock(&self.pending).len()
    }

    pub fn stats(&self) -> CacheStats {
        let mut stats = lock(&self.stats).clone();
        stats.entry_count = self.len();
        stats
    }

    /// A loaded handle (marked most recently used), or the pending slot to
    /// wait on. Both tables are checked under the `entries` lock, so a label
    /// is never loaded while another load for it is outstanding.
    fn lookup(&self, version: &str) -> Result<Handle, HandleCell> {
        let mut entries = lock(&self.entries);
        if let Some(handle) = entries.get(version) {
            return Ok(Arc::clone(handle));
        }

        let mut pending = lock(&self.pending);
        let cell = pending
            .entry(version.to_string())
            .or_insert_with(|| Arc::new(OnceCell::new()));
        match cell.get() {
            Some(handle) => Ok(Arc::clone(handle)),
            None => Err(Arc::clone(cell)),
        }
    }

    /// Move a finished load from the pending table into the LRU.
    fn promote(&self, version: &str, cell: &HandleCell, handle: &Handle) {
        let mut entries = lock(&self.entries);
        let mut pending = lock(&self.pending);

        let owns_slot = pending
            .get(version)
            .map(|current| Arc::ptr_eq(current, cell))
            .unwrap_or(false);
        if !owns_slot {
            // Another waiter on the same slot already promoted it.
            return;
        }
        pending.remove(version);

        if let Some((evicted, _)) = entries.push(version.to_string(), Arc::clone(handle)) {
            if evicted != version {
                debug!("Evicted compiler {} from cache", evicted);
                lock(&self.stats).evictions += 1;
            }
        }
    }

    /// Forget a failed slot once no other caller is waiting on it. While
    /// waiters remain, one of them retries the load in the same slot.
    fn release_failed(&self, version: &str, cell: &HandleCell) {
        let mut pending = lock(&self.pending);
        let unused = pending
            .get(version)
            .map(|current| {
                Arc::ptr_eq(current, cell) && !current.initialized() && Arc::strong_count(cell) == 2
            })
            .unwrap_or(false);
        if unused {
            pending.remove(version);
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
