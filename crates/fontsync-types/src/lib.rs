//! Core type system and error handling for fontsync
//!
//! This crate provides the foundational types shared by every fontsync
//! crate:
//!
//! - **Error handling**: a closed error taxonomy with per-variant
//!   remediation hints
//! - **Core types**: scanned font files, sync classifications, summaries,
//!   disk-space and validation reports
//! - **Configuration**: retry policies and the injected settings struct
//!
//! # Examples
//!
//! ```rust
//! use fontsync_types::{Error, Result, SyncSummary};
//!
//! fn example_operation() -> Result<SyncSummary> {
//!     let mut summary = SyncSummary::new();
//!     summary.added = 3;
//!     summary.skipped = 12;
//!     Ok(summary)
//! }
//! ```

#![deny(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod error;
pub mod result;
pub mod types;

// Re-export commonly used types
pub use config::{RetryConfig, SyncSettings};
pub use error::{Error, ErrorKind};
pub use result::Result;
pub use types::*;
