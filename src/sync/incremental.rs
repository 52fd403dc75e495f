//! "Only if changed" policy for pulls.

use chrono::{DateTime, Utc};
use std::fs;
use std::path::Path;

use crate::fs::local::modified_time;
use crate::fs::RemoteEntry;

/// Reference point for incremental pulls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Since {
    /// Copy everything.
    #[default]
    Disabled,
    /// Skip files the local copy is already newer than.
    LocalMtime,
    /// Skip files last modified before a fixed time.
    Timestamp(DateTime<Utc>),
}

/// What the filter needs to know about the local copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocalFileState {
    pub size: u64,
    pub modified: Option<DateTime<Utc>>,
}

impl LocalFileState {
    /// `None` when nothing, or something other than a file, is at `path`.
    pub fn probe(path: &Path) -> Option<Self> {
        let metadata = fs::metadata(path).ok()?;
        if !metadata.is_file() {
            return None;
        }
        Some(Self {
            size: metadata.len(),
            modified: modified_time(&metadata),
        })
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct IncrementalFilter {
    since: Since,
}

impl IncrementalFilter {
    pub fn new(since: Since) -> Self {
        Self { since }
    }

    /// Decide whether `entry` has to be transferred over `local`.
    ///
    /// A size mismatch always forces a copy. So does a remote entry without
    /// a modification time.
    pub fn should_copy(&self, entry: &RemoteEntry, local: Option<&LocalFileState>) -> bool {
        let reference = match self.since {
            Since::Disabled => return true,
            Since::LocalMtime => match local.and_then(|l| l.modified) {
                Some(local_mtime) => local_mtime,
                None => return true,
            },
            Since::Timestamp(t) => t,
        };

        let (Some(remote_mtime), Some(local)) = (entry.modified, local) else {
            return true;
        };

        !(remote_mtime < reference && local.size == entry.size)
    }
}
