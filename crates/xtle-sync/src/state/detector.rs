//! Per-path change detection

use std::collections::HashMap;

use crate::resources::ResourceProvider;
use crate::tracked::TrackedPath;

/// Which sides of a tracked path moved since its last sync.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Changes {
    pub fs_changed: bool,
    pub xtle_changed: bool,
}

impl Changes {
    /// Compute changes for one tracked path.
    ///
    /// The file side changed when its current fingerprint differs from the
    /// recorded hash; a missing file counts as changed for a synced path. The
    /// store side changed when a store resource exists and its max unit
    /// revision differs from the recorded revision.
    pub fn detect<P: ResourceProvider + ?Sized>(resources: &P, row: &TrackedPath) -> Self {
        let current_hash = resources.file_hashes().get(row.xtle_path()).map(String::as_str);
        let fs_changed = current_hash != row.last_sync_hash();

        let xtle_changed = resources.store(row.xtle_path()).is_some_and(|store| {
            Some(store.max_unit_revision.unwrap_or(0)) != row.last_sync_revision()
        });

        Self {
            fs_changed,
            xtle_changed,
        }
    }
}

/// Memo of [`Changes`] keyed by tracked path id.
///
/// Lives for one classification run so each path is examined once.
#[derive(Debug, Default)]
pub struct ChangeCache {
    entries: HashMap<u64, Changes>,
}

impl ChangeCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn changes<P: ResourceProvider + ?Sized>(&mut self, resources: &P, row: &TrackedPath) -> Changes {
        *self
            .entries
            .entry(row.id())
            .or_insert_with(|| Changes::detect(resources, row))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
