// Library module for munkey
// Re-exports modules for use in integration tests and the CLI

pub mod config;
pub mod error;
pub mod fs;
pub mod sync;

pub use error::{Result, SyncError};
