//! Tracked path ledger
//!
//! The ledger is the persistent set of [`TrackedPath`] rows linking store
//! resources to files. It is persisted as TOML next to the project and is the
//! only place sync watermarks live.

mod path;

pub use path::{ResolveConflict, TrackedPath};

use crate::{Error, Result};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::fs::{self, File, OpenOptions};
use std::path::Path;

/// Row filter for [`TrackedPaths::filter`]. `None` fields match anything.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TrackedFilter {
    pub staged_for_merge: Option<bool>,
    pub staged_for_removal: Option<bool>,
    pub resolve_conflict: Option<ResolveConflict>,
}

impl TrackedFilter {
    pub fn matches(&self, row: &TrackedPath) -> bool {
        self.staged_for_merge.is_none_or(|v| row.staged_for_merge() == v)
            && self.staged_for_removal.is_none_or(|v| row.staged_for_removal() == v)
            && self
                .resolve_conflict
                .is_none_or(|v| row.resolve_conflict() == Some(v))
    }
}

/// All tracked paths of a project, kept sorted by xtle path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackedPaths {
    /// Ledger format version for forward compatibility
    version: String,
    next_id: u64,
    #[serde(default, rename = "tracked")]
    paths: Vec<TrackedPath>,
}

impl Default for TrackedPaths {
    fn default() -> Self {
        Self::new()
    }
}

impl TrackedPaths {
    pub fn new() -> Self {
        Self {
            version: "1.0".to_string(),
            next_id: 1,
            paths: Vec::new(),
        }
    }

    /// Load the ledger from a TOML file with a shared lock
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, locked or parsed, or if a
    /// row breaks the watermark or merge staging invariants.
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        file.lock_shared()?;

        // Read through the locked handle
        let mut content = String::new();
        use std::io::Read;
        (&file).read_to_string(&mut content)?;
        let mut ledger: TrackedPaths = toml::from_str(&content)?;

        for row in &ledger.paths {
            row.validate()?;
        }
        ledger.paths.sort_by(|a, b| a.xtle_path().cmp(b.xtle_path()));
        let max_id = ledger.paths.iter().map(TrackedPath::id).max().unwrap_or(0);
        ledger.next_id = ledger.next_id.max(max_id + 1);

        tracing::debug!(path = %path.display(), rows = ledger.paths.len(), "Loaded tracked paths");
        Ok(ledger)
    }

    /// Load the ledger, or start an empty one if the file does not exist
    pub fn load_or_new(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::new())
        }
    }

    /// Save the ledger atomically with an exclusive lock
    ///
    /// Writes a temp file and renames it over the target while holding the
    /// lock on the target.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let lock_file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)?;
        lock_file.lock_exclusive()?;

        let temp_path = path.with_extension("toml.tmp");
        fs::write(&temp_path, &content)?;
        fs::rename(&temp_path, path)?;

        tracing::debug!(path = %path.display(), rows = self.paths.len(), "Saved tracked paths");
        Ok(())
    }

    pub fn iter(&self) -> impl Iterator<Item = &TrackedPath> {
        self.paths.iter()
    }

    pub fn as_slice(&self) -> &[TrackedPath] {
        &self.paths
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn get(&self, id: u64) -> Option<&TrackedPath> {
        self.paths.iter().find(|p| p.id() == id)
    }

    pub fn get_mut(&mut self, id: u64) -> Option<&mut TrackedPath> {
        self.paths.iter_mut().find(|p| p.id() == id)
    }

    pub fn find_by_xtle_path(&self, xtle_path: &str) -> Option<&TrackedPath> {
        self.paths.iter().find(|p| p.xtle_path() == xtle_path)
    }

    pub fn find_by_xtle_path_mut(&mut self, xtle_path: &str) -> Option<&mut TrackedPath> {
        self.paths.iter_mut().find(|p| p.xtle_path() == xtle_path)
    }

    pub fn find_by_fs_path(&self, fs_path: &str) -> Option<&TrackedPath> {
        self.paths.iter().find(|p| p.fs_path() == fs_path)
    }

    pub fn filter(&self, filter: TrackedFilter) -> impl Iterator<Item = &TrackedPath> {
        self.paths.iter().filter(move |p| filter.matches(p))
    }

    /// Start tracking a new association.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateTrackedPath`] if either side is already
    /// tracked.
    pub fn track(&mut self, xtle_path: &str, fs_path: &str) -> Result<&mut TrackedPath> {
        if self
            .paths
            .iter()
            .any(|p| p.xtle_path() == xtle_path || p.fs_path() == fs_path)
        {
            return Err(Error::DuplicateTrackedPath {
                xtle_path: xtle_path.to_string(),
                fs_path: fs_path.to_string(),
            });
        }

        let row = TrackedPath::new(self.next_id, xtle_path, fs_path);
        self.next_id += 1;
        let pos = self
            .paths
            .partition_point(|p| p.xtle_path() < row.xtle_path());
        self.paths.insert(pos, row);
        tracing::debug!(xtle_path, fs_path, "Tracking path");
        Ok(&mut self.paths[pos])
    }

    /// Stop tracking a path by id.
    pub fn remove(&mut self, id: u64) -> Option<TrackedPath> {
        let pos = self.paths.iter().position(|p| p.id() == id)?;
        Some(self.paths.remove(pos))
    }
}
