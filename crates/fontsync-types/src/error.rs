//! Error types and handling for fontsync
//!
//! Every failure mode in the workspace maps to one variant of [`Error`].
//! Callers match on [`Error::kind`] rather than message content, and the
//! optional remediation hint travels separately from the display message so
//! presentation layers can render it on its own line.

use std::path::{Path, PathBuf};

/// Main error type for fontsync operations
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// A file or folder does not exist
    #[error("not found: {path}")]
    NotFound {
        /// Path that was not found
        path: PathBuf,
    },

    /// A path exists but is not a directory
    #[error("not a directory: {path}")]
    NotADirectory {
        /// Path that is not a directory
        path: PathBuf,
    },

    /// A file is held by another process
    #[error("file is locked: {path}")]
    FileLocked {
        /// Path to the locked file
        path: PathBuf,
        /// Remediation hint for the user
        hint: Option<String>,
    },

    /// A font file failed validation
    #[error("font validation failed: {message}")]
    FontValidation {
        /// Description of the validation failure
        message: String,
        /// Remediation hint for the user
        hint: Option<String>,
    },

    /// Permission was denied by the operating system
    #[error("permission denied: {path}")]
    PermissionDenied {
        /// Path the operation was denied on
        path: PathBuf,
        /// Remediation hint for the user
        hint: Option<String>,
    },

    /// The destination volume does not have enough free space
    #[error("insufficient disk space: required {required_mb:.1} MB, free {free_mb:.1} MB")]
    DiskSpace {
        /// Space the operation needs, in megabytes
        required_mb: f64,
        /// Space currently free, in megabytes
        free_mb: f64,
    },

    /// Configuration or manifest precondition failure
    #[error("configuration error: {message}")]
    Config {
        /// Description of the configuration problem
        message: String,
    },

    /// Wrapped lower-level I/O failure
    #[error("I/O error: {message}")]
    Io {
        /// Error message from the underlying operation
        message: String,
    },
}

/// Error kind for categorizing errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Missing file or folder
    NotFound,
    /// Path exists but is not a directory
    NotADirectory,
    /// File held by another process
    FileLocked,
    /// Font validation failure
    FontValidation,
    /// OS permission failure
    Permission,
    /// Insufficient disk space
    DiskSpace,
    /// Configuration failure
    Config,
    /// Other I/O failure
    Io,
}

impl Error {
    /// Get the error kind
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::NotADirectory { .. } => ErrorKind::NotADirectory,
            Self::FileLocked { .. } => ErrorKind::FileLocked,
            Self::FontValidation { .. } => ErrorKind::FontValidation,
            Self::PermissionDenied { .. } => ErrorKind::Permission,
            Self::DiskSpace { .. } => ErrorKind::DiskSpace,
            Self::Config { .. } => ErrorKind::Config,
            Self::Io { .. } => ErrorKind::Io,
        }
    }

    /// Get the remediation hint, if this error carries one
    pub fn hint(&self) -> Option<&str> {
        match self {
            Self::FileLocked { hint, .. }
            | Self::FontValidation { hint, .. }
            | Self::PermissionDenied { hint, .. } => hint.as_deref(),
            _ => None,
        }
    }

    /// Check if this error is transient and worth retrying
    ///
    /// Only I/O-class failures and lock contention qualify; missing files,
    /// validation failures, and precondition errors never resolve on their
    /// own.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Io { .. } | Self::FileLocked { .. })
    }

    /// Create a new I/O error
    pub fn io<S: Into<String>>(message: S) -> Self {
        Self::Io {
            message: message.into(),
        }
    }

    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a new font validation error
    pub fn validation<S: Into<String>>(message: S, hint: Option<&str>) -> Self {
        Self::FontValidation {
            message: message.into(),
            hint: hint.map(String::from),
        }
    }

    /// Create a new file-locked error
    pub fn locked<P: AsRef<Path>>(path: P, hint: Option<&str>) -> Self {
        Self::FileLocked {
            path: path.as_ref().to_path_buf(),
            hint: hint.map(String::from),
        }
    }

    /// Create a new permission error
    pub fn permission<P: AsRef<Path>>(path: P, hint: Option<&str>) -> Self {
        Self::PermissionDenied {
            path: path.as_ref().to_path_buf(),
            hint: hint.map(String::from),
        }
    }

    /// Convert an [`std::io::Error`] for an operation on a known path
    ///
    /// Maps the missing-file and permission kinds onto their taxonomy
    /// variants; everything else becomes a generic I/O error.
    pub fn from_io<P: AsRef<Path>>(path: P, error: std::io::Error) -> Self {
        let path = path.as_ref();
        match error.kind() {
            std::io::ErrorKind::NotFound => Self::NotFound {
                path: path.to_path_buf(),
            },
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied {
                path: path.to_path_buf(),
                hint: None,
            },
            _ => Self::Io {
                message: format!("{}: {}", path.display(), error),
            },
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(error: std::io::Error) -> Self {
        Self::Io {
            message: error.to_string(),
        }
    }
}
