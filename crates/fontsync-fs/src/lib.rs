//! Filesystem layer for fontsync
//!
//! Everything that touches the disk directly lives here:
//!
//! - **Guards**: lock detection, cloud-sync heuristics, disk-space queries,
//!   filename sanitization, and font-file validation
//! - **Fingerprinting**: chunked SHA-256 content hashes with lock waiting
//!   and transient-failure retry
//! - **Scanning**: recursive discovery of font files, eager or in lazy
//!   batches
//! - **Installation**: the safe copy/remove protocol for the per-machine
//!   font directory

pub mod cloud;
pub mod fingerprint;
pub mod install;
pub mod locks;
pub mod name;
pub mod scanner;
pub mod space;
pub mod validate;

pub use cloud::is_cloud_syncing;
pub use fingerprint::{Fingerprinter, FINGERPRINT_CHUNK_SIZE};
pub use install::{FontInstaller, COPY_LOCK_TIMEOUT, DISK_SPACE_MARGIN, REMOVE_LOCK_TIMEOUT};
pub use locks::{is_locked, wait_for_unlock, LOCK_POLL_INTERVAL};
pub use name::{safe_file_name, INVALID_FILENAME_CHARS};
pub use scanner::{probe_font_file, FontScanner, ScanBatches, FONT_EXTENSIONS, SCAN_BATCH_SIZE};
pub use space::check_disk_space;
pub use validate::{validate_font, MAX_FONT_SIZE_MB};
