//! Sync & Reconciliation Module
//!
//! Recursive pull with per-level reconciliation, idempotent push,
//! explicit file-list transfers, and the ignore rules a pull consults.

pub mod engine;
pub mod exclude;
pub mod files;
pub mod incremental;
pub mod removal;

pub use engine::{SyncOptions, SyncStats, Syncer};
pub use exclude::{IgnoreMatcher, IgnorePolicy, IgnoreRule, NoIgnore, RootedMatcher};
pub use incremental::{IncrementalFilter, LocalFileState, Since};
pub use removal::{DeleteStrategy, RemoveLocal};
