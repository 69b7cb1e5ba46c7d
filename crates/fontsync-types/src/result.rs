//! Result type alias for fontsync operations

/// Result type used throughout fontsync
pub type Result<T> = std::result::Result<T, crate::error::Error>;
