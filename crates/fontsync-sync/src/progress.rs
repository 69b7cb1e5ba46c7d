//! Progress reporting data types
//!
//! The engine emits plain data; rendering (spinners, bars, tables) is the
//! presentation layer's concern.

/// Phase of a reconciliation run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncPhase {
    /// Walking the source folder
    Scanning,
    /// Computing content fingerprints
    Fingerprinting,
    /// Copying fonts and updating the manifest
    Applying,
    /// Removing stale fonts and manifest entries
    Cleaning,
}

impl std::fmt::Display for SyncPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Scanning => write!(f, "scanning"),
            Self::Fingerprinting => write!(f, "fingerprinting"),
            Self::Applying => write!(f, "applying"),
            Self::Cleaning => write!(f, "cleaning"),
        }
    }
}

/// One progress tick: (completed, total, description) as plain data
#[derive(Debug, Clone)]
pub struct ProgressUpdate {
    /// Current phase
    pub phase: SyncPhase,
    /// Items completed so far
    pub completed: usize,
    /// Fixed total for the phase (0 when indeterminate)
    pub total: usize,
    /// Human-oriented detail, e.g. the current file name
    pub detail: Option<String>,
}

/// Receiver for progress updates
///
/// `Send + Sync` so a sink reference can ride along with executor
/// callbacks; updates are still delivered from the orchestrating task.
pub trait ProgressSink: Send + Sync {
    /// Called once per completed unit of work
    fn update(&self, update: ProgressUpdate);
}

/// Sink that discards everything; useful in tests
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl ProgressSink for NullSink {
    fn update(&self, _update: ProgressUpdate) {}
}
