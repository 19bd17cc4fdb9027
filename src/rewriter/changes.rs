//! Per-file staleness information supplied by the build system.

use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};

use strum::Display;

/// Status of one input file since the previous successful invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum FileStatus {
    /// The file is new
    Added,
    /// The file content changed
    Changed,
    /// The file was deleted
    Removed,
    /// The file is as before
    Unchanged,
}

/// Map of input files to their [`FileStatus`].
///
/// Paths are either relative to the input root or absolute paths below it. An empty change
/// set requests a full rebuild of the input root.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeSet {
    entries: BTreeMap<PathBuf, FileStatus>,
}

impl ChangeSet {
    /// Creates an empty change set, which requests a full rebuild.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `status` for `path`, replacing an earlier status.
    pub fn insert(&mut self, path: impl Into<PathBuf>, status: FileStatus) {
        self.entries.insert(path.into(), status);
    }

    /// The recorded status of `path`.
    #[must_use]
    pub fn get(&self, path: impl AsRef<Path>) -> Option<FileStatus> {
        self.entries.get(path.as_ref()).copied()
    }

    /// Returns `true` if the change set requests a full rebuild.
    #[must_use]
    pub fn is_full_rebuild(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of recorded files.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no file is recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates the recorded files in path order.
    pub fn iter(&self) -> impl Iterator<Item = (&Path, FileStatus)> {
        self.entries
            .iter()
            .map(|(path, status)| (path.as_path(), *status))
    }
}

impl<P: Into<PathBuf>> FromIterator<(P, FileStatus)> for ChangeSet {
    fn from_iter<I: IntoIterator<Item = (P, FileStatus)>>(iter: I) -> Self {
        let mut changes = ChangeSet::new();
        for (path, status) in iter {
            changes.insert(path, status);
        }
        changes
    }
}
