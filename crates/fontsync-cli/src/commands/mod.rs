//! Subcommand implementations

pub mod cache;
pub mod clean;
pub mod import;
pub mod init;
pub mod list;
pub mod sync;
