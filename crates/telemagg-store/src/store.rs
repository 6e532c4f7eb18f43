//! SnapshotStore — the single "current snapshot" slot.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

use arc_swap::ArcSwapOption;
use tracing::debug;

use telemagg_core::{Snapshot, SnapshotRef};

use crate::error::{StoreError, StoreResult};

/// Thread-safe snapshot store. Cloning yields another handle to the same slot.
#[derive(Clone, Default)]
pub struct SnapshotStore {
    inner: Arc<Inner>,
}

#[derive(Default)]
struct Inner {
    current: ArcSwapOption<Snapshot>,
    /// Serializes publishers; readers never touch it.
    writer: Mutex<()>,
    generation: AtomicU64,
    published_at_ms: AtomicU64,
}

impl SnapshotStore {
    /// Create an empty, not-yet-published store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current snapshot, or [`StoreError::Unavailable`] before the first publish.
    ///
    /// Never blocks and never copies snapshot contents.
    pub fn read(&self) -> StoreResult<SnapshotRef> {
        self.inner.current.load_full().ok_or(StoreError::Unavailable)
    }

    /// Atomically replace the current snapshot. Returns the new generation.
    ///
    /// Accepts either an owned [`Snapshot`] or an existing [`SnapshotRef`].
    pub fn publish(&self, snapshot: impl Into<SnapshotRef>) -> u64 {
        // Allocation happens before the critical section so its cost does
        // not depend on snapshot size.
        let next: SnapshotRef = snapshot.into();
        let entities = next.len();

        let guard = self
            .inner
            .writer
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        self.inner.current.store(Some(next));
        self.inner
            .published_at_ms
            .store(epoch_millis(), Ordering::Release);
        let generation = self.inner.generation.fetch_add(1, Ordering::AcqRel) + 1;
        drop(guard);

        debug!(generation, entities, "snapshot published");
        generation
    }

    /// Number of publishes since creation.
    pub fn generation(&self) -> u64 {
        self.inner.generation.load(Ordering::Acquire)
    }

    /// Wall-clock time of the latest publish in epoch milliseconds, if any.
    pub fn published_at_ms(&self) -> Option<u64> {
        match self.inner.published_at_ms.load(Ordering::Acquire) {
            0 => None,
            ms => Some(ms),
        }
    }
}

fn epoch_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
