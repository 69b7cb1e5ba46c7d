//! Reconciliation engine for fontsync
//!
//! Reconciles a scanned source folder against the persisted manifest:
//! classifies every candidate into install/update/up-to-date, applies the
//! safe-copy protocol, updates the manifest, and aggregates results and
//! errors. Fingerprinting runs sequentially in small batches or through
//! the bounded parallel executor, chosen by candidate count; either path
//! produces identical classifications.

#![deny(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod cleanup;
pub mod diff;
pub mod engine;
pub mod parallel;
pub mod progress;

pub use cleanup::{CleanupCandidate, CleanupSummary};
pub use diff::{classify, SkipReason, SyncCandidate, SyncPlan};
pub use engine::{SyncEngine, PARALLEL_THRESHOLD, SEQUENTIAL_BATCH_SIZE};
pub use parallel::{default_worker_count, ParallelConfig, ParallelExecutor};
pub use progress::{NullSink, ProgressSink, ProgressUpdate, SyncPhase};
