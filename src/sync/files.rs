//! Transfers for explicit lists of root-relative paths.

use std::collections::BTreeSet;
use std::path::{Component, Path};

use tracing::{debug, info};

use crate::error::{Result, SyncError};
use crate::fs::{join_remote, remote_rel, LocalFs, Session};
use crate::sync::engine::{mkdir_idempotent, SyncStats, Syncer};

impl Syncer<'_> {
    /// Download each path, creating local parent directories as needed.
    /// A path missing on the remote side fails the whole call.
    pub fn pull_files<I, S>(&self, local_root: &Path, remote_root: &str, paths: I) -> Result<SyncStats>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let paths = collect_relative(paths)?;
        let mut session = self.open()?;
        let mut stats = SyncStats::default();

        for rel in &paths {
            let local = local_root.join(rel);
            if let Some(parent) = local.parent() {
                if !parent.exists() {
                    LocalFs::create_dir(parent)?;
                    stats.dirs_created += 1;
                }
            }
            let remote = join_remote(remote_root, rel);
            session.get(&remote, &local)?;
            info!("Pulled file {}", remote);
            stats.files_copied += 1;
            stats.bytes_transferred += std::fs::metadata(&local).map(|m| m.len()).unwrap_or(0);
        }

        session.finish();
        Ok(stats)
    }

    /// Upload each path after creating every remote parent directory.
    pub fn push_files<I, S>(&self, local_root: &Path, remote_root: &str, paths: I) -> Result<SyncStats>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let paths = collect_relative(paths)?;
        let mut session = self.open()?;
        let mut stats = SyncStats::default();

        let parents: BTreeSet<String> = paths
            .iter()
            .filter_map(|rel| Path::new(rel).parent().map(remote_rel))
            .filter(|parent| !parent.is_empty())
            .collect();
        for parent in &parents {
            create_remote_chain(&mut *session, remote_root, parent, &mut stats)?;
        }

        for rel in &paths {
            let local = local_root.join(rel);
            let remote = join_remote(remote_root, rel);
            session.put(&local, &remote)?;
            info!("Pushed file {}", remote);
            stats.files_copied += 1;
            stats.bytes_transferred += std::fs::metadata(&local).map(|m| m.len()).unwrap_or(0);
        }

        session.finish();
        Ok(stats)
    }

    /// Delete each remote path. Paths already gone are skipped; any other
    /// failure stops the remaining deletions.
    pub fn remove_files<I, S>(&self, remote_root: &str, paths: I) -> Result<SyncStats>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let paths = collect_relative(paths)?;
        let mut session = self.open()?;
        let mut stats = SyncStats::default();

        for rel in &paths {
            let remote = join_remote(remote_root, rel);
            match session.delete(&remote) {
                Ok(()) => {
                    info!("Removed remote file {}", remote);
                    stats.files_deleted += 1;
                }
                Err(SyncError::RemoteNotFound { .. }) => {
                    debug!("Remote file {} already absent", remote);
                }
                Err(err) => return Err(err),
            }
        }

        session.finish();
        Ok(stats)
    }
}

/// Create `base/rel` one segment at a time.
fn create_remote_chain<S: Session + ?Sized>(
    session: &mut S,
    base: &str,
    rel: &str,
    stats: &mut SyncStats,
) -> Result<()> {
    let mut current = base.to_string();
    for segment in rel.split('/').filter(|s| !s.is_empty()) {
        current = join_remote(&current, segment);
        mkdir_idempotent(session, &current, stats)?;
    }
    Ok(())
}

/// Paths must stay below the root they are joined onto.
fn collect_relative<I, S>(paths: I) -> Result<Vec<String>>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    paths
        .into_iter()
        .map(|p| {
            let p = p.as_ref();
            let escapes = Path::new(p)
                .components()
                .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
            if p.is_empty() || escapes {
                return Err(SyncError::InvalidInput {
                    message: format!("Expected a path relative to the sync root, got '{}'", p),
                });
            }
            Ok(p.to_string())
        })
        .collect()
}
