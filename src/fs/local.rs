use chrono::{DateTime, Utc};
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

use tracing::debug;

use crate::error::{Result, SyncError};
use crate::fs::store::{RemoteStore, Session};
use crate::fs::types::{EntryKind, RemoteEntry};

pub struct LocalFs;

impl LocalFs {
    /// Visible entries of `path`, sorted by name. Dot-entries are skipped so
    /// repository metadata such as `.git` never takes part in reconciliation.
    pub fn list_dir(path: &Path) -> Result<Vec<PathBuf>> {
        let read_dir =
            fs::read_dir(path).map_err(|e| SyncError::local_io(e, "reading directory", path))?;

        let mut entries = Vec::new();
        for entry in read_dir {
            let entry = entry.map_err(|e| SyncError::local_io(e, "reading directory", path))?;
            let name = entry.file_name();
            if name.to_string_lossy().starts_with('.') {
                continue;
            }
            entries.push(entry.path());
        }

        entries.sort();
        Ok(entries)
    }

    pub fn delete(path: &Path) -> Result<()> {
        let metadata = fs::symlink_metadata(path)
            .map_err(|e| SyncError::local_io(e, "inspecting", path))?;
        if metadata.is_dir() {
            fs::remove_dir_all(path)
                .map_err(|e| SyncError::local_io(e, "deleting directory", path))?;
        } else {
            fs::remove_file(path).map_err(|e| SyncError::local_io(e, "deleting file", path))?;
        }
        Ok(())
    }

    pub fn create_dir(path: &Path) -> Result<()> {
        fs::create_dir_all(path).map_err(|e| SyncError::local_io(e, "creating directory", path))
    }

    /// Resolve `.` and `..` lexically; `..` never climbs above the start.
    pub fn normalize_path(path: &Path) -> PathBuf {
        let mut normalized = PathBuf::new();

        for component in path.components() {
            match component {
                Component::ParentDir => {
                    normalized.pop();
                }
                Component::CurDir | Component::RootDir | Component::Prefix(_) => {}
                Component::Normal(part) => normalized.push(part),
            }
        }

        normalized
    }
}

pub fn modified_time(metadata: &fs::Metadata) -> Option<DateTime<Utc>> {
    metadata.modified().ok().map(DateTime::<Utc>::from)
}

/// Map a filesystem error on the store side onto the remote taxonomy.
fn remote_err(err: io::Error, path: &str) -> SyncError {
    match err.kind() {
        io::ErrorKind::NotFound => SyncError::RemoteNotFound {
            path: path.to_string(),
        },
        io::ErrorKind::AlreadyExists => SyncError::RemoteExists {
            path: path.to_string(),
        },
        _ => SyncError::RemotePermission {
            path: path.to_string(),
            reason: err.to_string(),
        },
    }
}

/// A remote store backed by a local directory tree.
///
/// Serves `file://` remotes and doubles as a deterministic store in tests.
pub struct LocalStore {
    root: PathBuf,
}

impl LocalStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl RemoteStore for LocalStore {
    fn connect(&self) -> Result<Box<dyn Session + '_>> {
        if !self.root.is_dir() {
            return Err(SyncError::ConnectFailure {
                host: self.root.display().to_string(),
                reason: "no such directory".to_string(),
            });
        }
        Ok(Box::new(LocalSession {
            root: &self.root,
            cwd: "/".to_string(),
        }))
    }

    fn describe(&self) -> String {
        format!("file://{}", self.root.display())
    }
}

struct LocalSession<'a> {
    root: &'a Path,
    cwd: String,
}

impl LocalSession<'_> {
    fn resolve(&self, path: &str) -> PathBuf {
        let joined = if path.starts_with('/') {
            PathBuf::from(path)
        } else {
            Path::new(&self.cwd).join(path)
        };
        self.root.join(LocalFs::normalize_path(&joined))
    }
}

impl Session for LocalSession<'_> {
    fn list(&mut self, path: &str) -> Result<Vec<String>> {
        let dir = self.resolve(path);
        let read_dir = fs::read_dir(&dir).map_err(|e| remote_err(e, path))?;

        let mut entries = Vec::new();
        for entry in read_dir {
            let entry = entry.map_err(|e| remote_err(e, path))?;
            let metadata = entry.metadata().map_err(|e| remote_err(e, path))?;
            let file_type = metadata.file_type();
            let kind = if file_type.is_dir() {
                EntryKind::Directory
            } else if file_type.is_symlink() {
                EntryKind::Symlink
            } else {
                EntryKind::File
            };

            entries.push(RemoteEntry {
                name: entry.file_name().to_string_lossy().to_string(),
                kind,
                size: if kind == EntryKind::File { metadata.len() } else { 0 },
                modified: modified_time(&metadata),
            });
        }

        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries.iter().map(RemoteEntry::list_line).collect())
    }

    fn chdir(&mut self, path: &str) -> Result<()> {
        if !self.resolve(path).is_dir() {
            return Err(SyncError::RemoteNotFound {
                path: path.to_string(),
            });
        }
        let joined = Path::new(&self.cwd).join(path);
        self.cwd = format!("/{}", LocalFs::normalize_path(&joined).to_string_lossy());
        Ok(())
    }

    fn get(&mut self, remote_path: &str, local_path: &Path) -> Result<()> {
        let source = self.resolve(remote_path);
        let metadata = fs::metadata(&source).map_err(|e| remote_err(e, remote_path))?;
        if metadata.is_dir() {
            return Err(SyncError::RemotePermission {
                path: remote_path.to_string(),
                reason: "is a directory".to_string(),
            });
        }

        let mut src = fs::File::open(&source).map_err(|e| remote_err(e, remote_path))?;
        let mut dst = fs::File::create(local_path)
            .map_err(|e| SyncError::local_io(e, "creating", local_path))?;
        io::copy(&mut src, &mut dst).map_err(|e| SyncError::local_io(e, "writing", local_path))?;
        debug!("get {} -> {}", remote_path, local_path.display());
        Ok(())
    }

    fn put(&mut self, local_path: &Path, remote_path: &str) -> Result<()> {
        let mut src = fs::File::open(local_path)
            .map_err(|e| SyncError::local_io(e, "reading", local_path))?;
        let target = self.resolve(remote_path);
        let mut dst = fs::File::create(&target).map_err(|e| remote_err(e, remote_path))?;
        io::copy(&mut src, &mut dst).map_err(|e| remote_err(e, remote_path))?;
        debug!("put {} -> {}", local_path.display(), remote_path);
        Ok(())
    }

    fn mkdir(&mut self, path: &str) -> Result<()> {
        fs::create_dir(self.resolve(path)).map_err(|e| remote_err(e, path))
    }

    fn delete(&mut self, path: &str) -> Result<()> {
        let target = self.resolve(path);
        let metadata = fs::symlink_metadata(&target).map_err(|e| remote_err(e, path))?;
        if metadata.is_dir() {
            return Err(SyncError::RemotePermission {
                path: path.to_string(),
                reason: "is a directory".to_string(),
            });
        }
        fs::remove_file(&target).map_err(|e| remote_err(e, path))
    }

    fn close(&mut self) {}
}
