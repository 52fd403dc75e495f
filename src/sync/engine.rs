//! Sync engine for pulling and pushing directory trees.
//!
//! A pull walks the remote tree depth-first. Each directory level is
//! reconciled in three phases: its files are transferred, then its
//! subdirectories are recursed into, and only then are local entries without
//! a remote counterpart removed. A push walks the local tree and mirrors it
//! with idempotent directory creation.

use std::collections::BTreeSet;
use std::io;
use std::path::{Path, PathBuf};

use jwalk::{Parallelism, WalkDir};
use tracing::{debug, info, warn};

use crate::error::{Result, SyncError};
use crate::fs::{join_remote, remote_rel, EntryKind, LocalFs, RemoteEntry, RemoteStore, ScopedSession, Session};
use crate::sync::exclude::{IgnorePolicy, NoIgnore};
use crate::sync::incremental::{IncrementalFilter, LocalFileState, Since};
use crate::sync::removal::{DeleteStrategy, RemoveLocal};

/// Pull options.
#[derive(Debug, Clone, Copy, Default)]
pub struct SyncOptions {
    /// Incremental policy.
    pub since: Since,
    /// Remove local entries that are gone from the remote side.
    pub delete: bool,
    /// Step over per-file permission and not-found errors.
    pub skip_errors: bool,
}

/// Sync statistics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncStats {
    /// Remote files considered for transfer.
    pub files_scanned: usize,
    /// Files transferred.
    pub files_copied: usize,
    /// Files left alone by the incremental policy.
    pub files_skipped: usize,
    /// Files matched by an ignore rule.
    pub files_ignored: usize,
    /// Files whose transfer failed and was skipped.
    pub files_failed: usize,
    /// Paths deleted.
    pub files_deleted: usize,
    /// Directories created (local on pull, remote on push).
    pub dirs_created: usize,
    /// Bytes transferred.
    pub bytes_transferred: u64,
}

/// Sync engine bound to one remote store.
pub struct Syncer<'a> {
    store: &'a dyn RemoteStore,
    ignore: &'a dyn IgnorePolicy,
}

impl<'a> Syncer<'a> {
    pub fn new(store: &'a dyn RemoteStore) -> Self {
        Self {
            store,
            ignore: &NoIgnore,
        }
    }

    /// Consult `ignore` for every file a pull would transfer.
    pub fn with_ignore(mut self, ignore: &'a dyn IgnorePolicy) -> Self {
        self.ignore = ignore;
        self
    }

    pub(crate) fn open(&self) -> Result<ScopedSession<'a>> {
        ScopedSession::open(self.store)
    }

    /// Recursively pull `remote_root` into `local_root`.
    pub fn pull_dir(&self, local_root: &Path, remote_root: &str, options: &SyncOptions) -> Result<SyncStats> {
        self.pull_dir_with(local_root, remote_root, options, &mut RemoveLocal)
    }

    /// Like [`Syncer::pull_dir`], handing deletions to `deleter`.
    pub fn pull_dir_with(
        &self,
        local_root: &Path,
        remote_root: &str,
        options: &SyncOptions,
        deleter: &mut dyn DeleteStrategy,
    ) -> Result<SyncStats> {
        let mut session = self.open()?;
        LocalFs::create_dir(local_root)?;
        // Levels chdir as they go, so relative roots would drift
        let remote_root = join_remote("/", remote_root);

        let mut pull = Pull {
            session: &mut session,
            ignore: self.ignore,
            filter: IncrementalFilter::new(options.since),
            options,
            deleter,
            stats: SyncStats::default(),
        };
        pull.reconcile(local_root, &remote_root, "")?;
        let stats = pull.stats;

        session.finish();
        Ok(stats)
    }

    /// Recursively push `local_root` to `remote_root`.
    ///
    /// Hidden entries are skipped. Directories that already exist remotely
    /// are left alone, so pushing the same tree twice is safe.
    pub fn push_dir(&self, local_root: &Path, remote_root: &str) -> Result<SyncStats> {
        let mut session = self.open()?;
        let mut stats = SyncStats::default();

        let walker = WalkDir::new(local_root)
            .sort(true)
            .skip_hidden(true)
            .min_depth(1)
            .parallelism(Parallelism::Serial);

        for entry in walker {
            let entry = entry.map_err(|e| {
                SyncError::local_io(io::Error::other(e.to_string()), "walking", local_root)
            })?;
            let local = entry.path();
            let rel = local.strip_prefix(local_root).map(remote_rel).unwrap_or_default();
            let remote = join_remote(remote_root, &rel);

            let file_type = entry.file_type();
            if file_type.is_dir() {
                mkdir_idempotent(&mut *session, &remote, &mut stats)?;
            } else if file_type.is_file() {
                stats.files_scanned += 1;
                session.put(&local, &remote)?;
                info!("Pushed file {}", remote);
                stats.files_copied += 1;
                stats.bytes_transferred += entry.metadata().map(|m| m.len()).unwrap_or(0);
            }
        }

        session.finish();
        Ok(stats)
    }
}

/// Create a remote directory, treating "already there" as success.
pub(crate) fn mkdir_idempotent<S: Session + ?Sized>(
    session: &mut S,
    path: &str,
    stats: &mut SyncStats,
) -> Result<()> {
    match session.mkdir(path) {
        Ok(()) => {
            info!("Created remote directory {}", path);
            stats.dirs_created += 1;
            Ok(())
        }
        Err(err) if err.is_existing_dir() => {
            debug!("Keeping remote directory {}: {}", path, err);
            Ok(())
        }
        Err(err) => Err(err),
    }
}

/// One remote entry paired with where it lands locally.
#[derive(Debug)]
struct Planned {
    entry: RemoteEntry,
    local: PathBuf,
    remote: String,
    rel: String,
}

/// State of one pull walk.
struct Pull<'s, 'a, 'o, 'd> {
    session: &'s mut ScopedSession<'a>,
    ignore: &'a dyn IgnorePolicy,
    filter: IncrementalFilter,
    options: &'o SyncOptions,
    deleter: &'o mut (dyn DeleteStrategy + 'd),
    stats: SyncStats,
}

impl Pull<'_, '_, '_, '_> {
    fn reconcile(&mut self, local_dir: &Path, remote_dir: &str, rel_dir: &str) -> Result<()> {
        self.session.chdir(remote_dir)?;

        let mut to_delete: BTreeSet<PathBuf> = LocalFs::list_dir(local_dir)?.into_iter().collect();
        let mut to_copy = Vec::new();
        let mut to_recurse = Vec::new();

        for line in self.session.list(remote_dir)? {
            // Anything the remote lists keeps its local namesake, even
            // entries that are never transferred
            let Some(entry) = RemoteEntry::parse(&line) else {
                if let Some(name) = RemoteEntry::listed_name(&line) {
                    to_delete.remove(&local_dir.join(name));
                }
                debug!("Skipping listing line {:?}", line);
                continue;
            };
            let local = local_dir.join(&entry.name);
            to_delete.remove(&local);

            if entry.name.contains('/') {
                warn!("Skipping remote entry with a path separator: {:?}", entry.name);
                continue;
            }

            let planned = Planned {
                remote: join_remote(remote_dir, &entry.name),
                rel: if rel_dir.is_empty() {
                    entry.name.clone()
                } else {
                    format!("{}/{}", rel_dir, entry.name)
                },
                local,
                entry,
            };
            match planned.entry.kind {
                EntryKind::Directory => to_recurse.push(planned),
                EntryKind::File => to_copy.push(planned),
                EntryKind::Symlink => debug!("Not following remote link {}", planned.remote),
                EntryKind::Other => debug!("Skipping special file {}", planned.remote),
            }
        }

        for planned in &to_copy {
            self.copy(planned)?;
        }

        for planned in &to_recurse {
            if !planned.local.exists() {
                LocalFs::create_dir(&planned.local)?;
                self.stats.dirs_created += 1;
            }
            self.reconcile(&planned.local, &planned.remote, &planned.rel)?;
        }

        if self.options.delete {
            for path in to_delete {
                self.deleter.remove(&path)?;
                info!("Removed path {}", path.display());
                self.stats.files_deleted += 1;
            }
        }

        Ok(())
    }

    fn copy(&mut self, planned: &Planned) -> Result<()> {
        self.stats.files_scanned += 1;

        let local_state = LocalFileState::probe(&planned.local);
        if !self.filter.should_copy(&planned.entry, local_state.as_ref()) {
            debug!("Unchanged {}", planned.rel);
            self.stats.files_skipped += 1;
            return Ok(());
        }
        if self.ignore.ignore(&planned.rel) {
            debug!("Ignored {}", planned.rel);
            self.stats.files_ignored += 1;
            return Ok(());
        }

        match self.session.get(&planned.remote, &planned.local) {
            Ok(()) => {
                info!("Pulled file {}", planned.remote);
                self.stats.files_copied += 1;
                self.stats.bytes_transferred += planned.entry.size;
                Ok(())
            }
            Err(err) if self.options.skip_errors && err.is_per_file() => {
                warn!("Skipping {}: {}", planned.remote, err);
                self.stats.files_failed += 1;
                Ok(())
            }
            Err(err) => Err(err),
        }
    }
}
