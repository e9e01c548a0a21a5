//! Read-through cache with bounded staleness.
//!
//! Holds a value derived from a backing store. The value is rebuilt when it
//! is older than the TTL, when the store reports a different revision stamp,
//! or after an explicit [`TtlCache::invalidate`].

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime};

use parking_lot::{Mutex, RwLock};

use crate::error::Result;

/// Default TTL: 5 minutes
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(5 * 60);

struct Slot<T> {
    value: Arc<T>,
    built_at: Instant,
    revision: Option<SystemTime>,
}

impl<T> Slot<T> {
    fn is_fresh(&self, ttl: Duration, revision: Option<SystemTime>) -> bool {
        if self.built_at.elapsed() >= ttl {
            return false;
        }
        // Unknown revision (store can't tell): rely on the TTL alone
        match revision {
            Some(current) => self.revision == Some(current),
            None => true,
        }
    }
}

/// TTL cache for a single derived value
pub struct TtlCache<T> {
    ttl: Duration,
    slot: RwLock<Option<Slot<T>>>,
    rebuild_lock: Mutex<()>,
    /// Bumped by every invalidate
    generation: AtomicU64,
}

impl<T> TtlCache<T> {
    /// Create an empty cache
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            slot: RwLock::new(None),
            rebuild_lock: Mutex::new(()),
            generation: AtomicU64::new(0),
        }
    }

    /// Configured TTL
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Current value if it is still fresh for `revision`
    pub fn get(&self, revision: Option<SystemTime>) -> Option<Arc<T>> {
        let guard = self.slot.read();
        guard
            .as_ref()
            .filter(|slot| slot.is_fresh(self.ttl, revision))
            .map(|slot| slot.value.clone())
    }

    /// Return the cached value, rebuilding it first if stale.
    ///
    /// Errors from `rebuild` propagate and leave the previous value in place.
    /// A value whose rebuild overlapped an [`invalidate`](Self::invalidate)
    /// is returned to the caller but not cached.
    pub fn get_or_rebuild<F>(&self, revision: Option<SystemTime>, rebuild: F) -> Result<Arc<T>>
    where
        F: FnOnce() -> Result<T>,
    {
        if let Some(value) = self.get(revision) {
            return Ok(value);
        }

        let _lock = self.rebuild_lock.lock();

        // Double-check after acquiring lock
        if let Some(value) = self.get(revision) {
            return Ok(value);
        }

        let generation = self.generation.load(Ordering::Acquire);
        let value = Arc::new(rebuild()?);

        let mut slot = self.slot.write();
        if self.generation.load(Ordering::Acquire) == generation {
            *slot = Some(Slot {
                value: value.clone(),
                built_at: Instant::now(),
                revision,
            });
        }
        Ok(value)
    }

    /// Drop the cached value; the next read rebuilds it
    pub fn invalidate(&self) {
        let mut slot = self.slot.write();
        self.generation.fetch_add(1, Ordering::AcqRel);
        *slot = None;
    }

    /// Check whether a value is currently held (fresh or not)
    pub fn is_populated(&self) -> bool {
        self.slot.read().is_some()
    }
}
