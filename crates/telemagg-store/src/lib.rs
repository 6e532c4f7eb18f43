//! telemagg-store — read-copy-update store for metric snapshots.
//!
//! One writer (the ingestion worker) publishes whole [`Snapshot`]s; any
//! number of readers load the current one without locking.
//!
//! # Architecture
//!
//! ```text
//! publish(snapshot) ──► writer mutex ──► ArcSwapOption::store(Arc<Snapshot>)
//!                                               │
//! read() ◄──────────── ArcSwapOption::load_full ┘  (lock-free, no copy)
//! ```
//!
//! Readers receive an `Arc<Snapshot>`. A reader that loaded a snapshot
//! before a publish keeps that complete snapshot alive until it drops the
//! handle; the old value is released by refcount, never torn down in place.

pub mod error;
pub mod store;

pub use error::{StoreError, StoreResult};
pub use store::SnapshotStore;

pub use telemagg_core::{Snapshot, SnapshotRef};
