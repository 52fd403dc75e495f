//! Local deletion strategies used when a pull mirrors remote removals.

use std::path::Path;

use crate::error::Result;
use crate::fs::LocalFs;

/// Removes a local path that no longer exists on the remote side.
pub trait DeleteStrategy {
    fn remove(&mut self, path: &Path) -> Result<()>;
}

/// Default strategy: delete files and whole directory trees.
#[derive(Debug, Clone, Copy, Default)]
pub struct RemoveLocal;

impl DeleteStrategy for RemoveLocal {
    fn remove(&mut self, path: &Path) -> Result<()> {
        LocalFs::delete(path)
    }
}

impl<F> DeleteStrategy for F
where
    F: FnMut(&Path) -> Result<()>,
{
    fn remove(&mut self, path: &Path) -> Result<()> {
        self(path)
    }
}
