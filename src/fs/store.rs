use std::path::Path;

use tracing::info;

use crate::error::Result;

/// A remote, listing-based file store.
///
/// Connecting yields a [`Session`]; everything else happens through it.
pub trait RemoteStore {
    /// Open and authenticate a session.
    fn connect(&self) -> Result<Box<dyn Session + '_>>;

    /// Short description for log lines (host or root).
    fn describe(&self) -> String;
}

/// One open connection to a [`RemoteStore`].
///
/// Every call blocks until the remote answers. Paths are `/`-separated.
pub trait Session {
    // ========== Listing ==========

    /// Raw long-format listing lines for `path`.
    fn list(&mut self, path: &str) -> Result<Vec<String>>;

    /// Change into `path`; used to verify a directory exists.
    fn chdir(&mut self, path: &str) -> Result<()>;

    // ========== File Transfer ==========

    /// Download `remote_path` into `local_path`.
    fn get(&mut self, remote_path: &str, local_path: &Path) -> Result<()>;

    /// Upload `local_path` to `remote_path`.
    fn put(&mut self, local_path: &Path, remote_path: &str) -> Result<()>;

    // ========== Tree Changes ==========

    fn mkdir(&mut self, path: &str) -> Result<()>;

    fn delete(&mut self, path: &str) -> Result<()>;

    fn close(&mut self);
}

/// Owns a session for the duration of one top-level operation and closes it
/// exactly once, either via [`ScopedSession::finish`] or on drop.
pub struct ScopedSession<'a> {
    session: Box<dyn Session + 'a>,
    label: String,
    closed: bool,
}

impl<'a> ScopedSession<'a> {
    pub fn open(store: &'a dyn RemoteStore) -> Result<Self> {
        let session = store.connect()?;
        let label = store.describe();
        info!("Opened connection to {}", label);
        Ok(Self {
            session,
            label,
            closed: false,
        })
    }

    /// Close now instead of at drop.
    pub fn finish(mut self) {
        self.close();
    }

    fn close(&mut self) {
        if !self.closed {
            self.closed = true;
            self.session.close();
            info!("Closed connection to {}", self.label);
        }
    }
}

impl<'a> std::ops::Deref for ScopedSession<'a> {
    type Target = dyn Session + 'a;

    fn deref(&self) -> &Self::Target {
        self.session.as_ref()
    }
}

impl<'a> std::ops::DerefMut for ScopedSession<'a> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.session.as_mut()
    }
}

impl Drop for ScopedSession<'_> {
    fn drop(&mut self) {
        self.close();
    }
}

/// Join a relative path onto a remote directory without doubling slashes.
pub fn join_remote(base: &str, rel: &str) -> String {
    let rel = rel.trim_start_matches('/');
    let base = base.trim_end_matches('/');
    if rel.is_empty() {
        if base.is_empty() {
            "/".to_string()
        } else {
            base.to_string()
        }
    } else {
        format!("{}/{}", base, rel)
    }
}

/// Render a relative local path with `/` separators for remote use.
pub fn remote_rel(path: &Path) -> String {
    path.components()
        .filter_map(|c| match c {
            std::path::Component::Normal(part) => Some(part.to_string_lossy()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}
