//! Resource queries feeding the state classifier
//!
//! A [`ResourceProvider`] answers every question the classifier asks about
//! tracked paths, store resources and files on disk. [`ProjectResources`]
//! answers them from a ledger, a store and a directory walk, computing each
//! answer at most once until [`ResourceProvider::reset`].

use std::cell::OnceCell;
use std::collections::{BTreeMap, BTreeSet};

use walkdir::WalkDir;
use xtle_files::{NormalizedPath, checksum, fs_relative};

use crate::mapping::PathMapping;
use crate::store::{StoreInfo, TranslationStore};
use crate::tracked::{ResolveConflict, TrackedFilter, TrackedPath, TrackedPaths};

pub trait ResourceProvider {
    /// Every tracked path, ordered by xtle path.
    fn tracked_rows(&self) -> &[TrackedPath];

    /// Tracked fs path -> xtle path.
    fn tracked_paths(&self) -> &BTreeMap<String, String>;

    /// Store resource for an xtle path, live or obsolete.
    fn store(&self, xtle_path: &str) -> Option<&StoreInfo>;

    /// Live stores with no tracked path whose xtle path maps to a file path,
    /// paired with that file path.
    fn trackable_stores(&self) -> &[(StoreInfo, String)];

    /// xtle path -> fs path for [`Self::trackable_stores`].
    fn trackable_store_paths(&self) -> &BTreeMap<String, String>;

    /// Files on disk matching the translation mapping, as
    /// `(xtle_path, fs_path)` ordered by xtle path.
    fn found_file_matches(&self) -> &[(String, String)];

    fn found_file_paths(&self) -> &BTreeSet<String>;

    /// Tracked fs paths with no file on disk.
    fn missing_file_paths(&self) -> &BTreeSet<String>;

    /// Current fingerprint of each tracked file present on disk, by xtle path.
    fn file_hashes(&self) -> &BTreeMap<String, String>;

    /// Max unit revision of each tracked path's live store, by xtle path.
    fn xtle_revisions(&self) -> &BTreeMap<String, u64>;

    /// Ids of synced tracked paths whose file changed since the last sync.
    fn fs_changed(&self) -> &BTreeSet<u64>;

    /// Ids of synced tracked paths whose live store changed since the last
    /// sync, except those staged for merge with the store winning.
    fn xtle_changed_ids(&self) -> &BTreeSet<u64>;

    /// Drop every cached answer.
    fn reset(&mut self);

    fn tracked(&self, filter: TrackedFilter) -> Vec<&TrackedPath> {
        self.tracked_rows()
            .iter()
            .filter(|row| filter.matches(row))
            .collect()
    }

    fn synced(&self) -> Vec<&TrackedPath> {
        self.tracked_rows().iter().filter(|row| row.is_synced()).collect()
    }

    fn unsynced(&self) -> Vec<&TrackedPath> {
        self.tracked_rows().iter().filter(|row| row.is_unsynced()).collect()
    }

    /// Store for an xtle path, only if it is not obsolete.
    fn live_store(&self, xtle_path: &str) -> Option<&StoreInfo> {
        self.store(xtle_path).filter(|s| s.is_live())
    }

    fn is_missing(&self, fs_path: &str) -> bool {
        self.missing_file_paths().contains(fs_path)
    }

    /// Rows of [`Self::xtle_changed_ids`], ordered by xtle path.
    fn xtle_changed(&self) -> Vec<&TrackedPath> {
        let changed = self.xtle_changed_ids();
        self.tracked_rows()
            .iter()
            .filter(|row| changed.contains(&row.id()))
            .collect()
    }
}

/// Cached answers, one cell per query. Cleared wholesale by `reset`.
#[derive(Default)]
struct ResourceCache {
    tracked_paths: OnceCell<BTreeMap<String, String>>,
    stores: OnceCell<BTreeMap<String, StoreInfo>>,
    trackable_stores: OnceCell<Vec<(StoreInfo, String)>>,
    trackable_store_paths: OnceCell<BTreeMap<String, String>>,
    found_file_matches: OnceCell<Vec<(String, String)>>,
    found_file_paths: OnceCell<BTreeSet<String>>,
    missing_file_paths: OnceCell<BTreeSet<String>>,
    file_hashes: OnceCell<BTreeMap<String, String>>,
    xtle_revisions: OnceCell<BTreeMap<String, u64>>,
    fs_changed: OnceCell<BTreeSet<u64>>,
    xtle_changed: OnceCell<BTreeSet<u64>>,
}

pub struct ProjectResources<'a> {
    tracked: &'a TrackedPaths,
    store: &'a dyn TranslationStore,
    mapping: &'a PathMapping,
    fs_root: NormalizedPath,
    cache: ResourceCache,
}

impl<'a> ProjectResources<'a> {
    pub fn new(
        tracked: &'a TrackedPaths,
        store: &'a dyn TranslationStore,
        mapping: &'a PathMapping,
        fs_root: NormalizedPath,
    ) -> Self {
        Self {
            tracked,
            store,
            mapping,
            fs_root,
            cache: ResourceCache::default(),
        }
    }

    pub fn fs_root(&self) -> &NormalizedPath {
        &self.fs_root
    }

    fn stores(&self) -> &BTreeMap<String, StoreInfo> {
        self.cache.stores.get_or_init(|| {
            self.store
                .stores()
                .into_iter()
                .map(|s| (s.xtle_path.clone(), s))
                .collect()
        })
    }

    fn walk_files(&self) -> Vec<(String, String)> {
        let root = self.fs_root.to_native();
        if !root.is_dir() {
            tracing::debug!(fs_root = %self.fs_root, "Filesystem root does not exist");
            return Vec::new();
        }

        let mut matches = Vec::new();
        let entries = WalkDir::new(&root)
            .follow_links(false)
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !e.file_name().to_string_lossy().starts_with('.'));
        for entry in entries {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!(error = %e, "Skipping unreadable entry");
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }
            let fs_path = match fs_relative(&root, entry.path()) {
                Ok(fs_path) => fs_path,
                Err(e) => {
                    tracing::warn!(error = %e, "Skipping file outside root");
                    continue;
                }
            };
            if let Some(xtle_path) = self.mapping.xtle_path_for(&fs_path) {
                matches.push((xtle_path, fs_path));
            }
        }
        matches.sort();
        tracing::trace!(files = matches.len(), "Scanned filesystem");
        matches
    }
}

impl ResourceProvider for ProjectResources<'_> {
    fn tracked_rows(&self) -> &[TrackedPath] {
        self.tracked.as_slice()
    }

    fn tracked_paths(&self) -> &BTreeMap<String, String> {
        self.cache.tracked_paths.get_or_init(|| {
            self.tracked
                .iter()
                .map(|row| (row.fs_path().to_string(), row.xtle_path().to_string()))
                .collect()
        })
    }

    fn store(&self, xtle_path: &str) -> Option<&StoreInfo> {
        self.stores().get(xtle_path)
    }

    fn trackable_stores(&self) -> &[(StoreInfo, String)] {
        self.cache.trackable_stores.get_or_init(|| {
            let tracked_fs = self.tracked_paths();
            self.stores()
                .values()
                .filter(|s| s.is_live() && self.tracked.find_by_xtle_path(&s.xtle_path).is_none())
                .filter_map(|s| {
                    let fs_path = self.mapping.fs_path_for(&s.xtle_path)?;
                    (!tracked_fs.contains_key(&fs_path)).then(|| (s.clone(), fs_path))
                })
                .collect()
        })
    }

    fn trackable_store_paths(&self) -> &BTreeMap<String, String> {
        self.cache.trackable_store_paths.get_or_init(|| {
            self.trackable_stores()
                .iter()
                .map(|(s, fs_path)| (s.xtle_path.clone(), fs_path.clone()))
                .collect()
        })
    }

    fn found_file_matches(&self) -> &[(String, String)] {
        self.cache.found_file_matches.get_or_init(|| self.walk_files())
    }

    fn found_file_paths(&self) -> &BTreeSet<String> {
        self.cache.found_file_paths.get_or_init(|| {
            self.found_file_matches()
                .iter()
                .map(|(_, fs_path)| fs_path.clone())
                .collect()
        })
    }

    fn missing_file_paths(&self) -> &BTreeSet<String> {
        self.cache.missing_file_paths.get_or_init(|| {
            self.tracked
                .iter()
                .filter(|row| !self.fs_root.join(row.fs_path()).is_file())
                .map(|row| row.fs_path().to_string())
                .collect()
        })
    }

    fn file_hashes(&self) -> &BTreeMap<String, String> {
        self.cache.file_hashes.get_or_init(|| {
            let missing = self.missing_file_paths();
            let mut hashes = BTreeMap::new();
            for row in self.tracked.iter().filter(|row| !missing.contains(row.fs_path())) {
                let path = self.fs_root.join(row.fs_path()).to_native();
                match checksum::fingerprint_file(&path) {
                    Ok(Some(hash)) => {
                        hashes.insert(row.xtle_path().to_string(), hash);
                    }
                    Ok(None) => {}
                    Err(e) => tracing::warn!(path = %path.display(), error = %e, "Cannot fingerprint file"),
                }
            }
            hashes
        })
    }

    fn xtle_revisions(&self) -> &BTreeMap<String, u64> {
        self.cache.xtle_revisions.get_or_init(|| {
            self.tracked
                .iter()
                .filter_map(|row| {
                    let store = self.live_store(row.xtle_path())?;
                    Some((row.xtle_path().to_string(), store.max_unit_revision.unwrap_or(0)))
                })
                .collect()
        })
    }

    fn fs_changed(&self) -> &BTreeSet<u64> {
        self.cache.fs_changed.get_or_init(|| {
            let hashes = self.file_hashes();
            self.synced()
                .into_iter()
                .filter(|row| {
                    hashes
                        .get(row.xtle_path())
                        .is_some_and(|hash| Some(hash.as_str()) != row.last_sync_hash())
                })
                .map(TrackedPath::id)
                .collect()
        })
    }

    fn xtle_changed_ids(&self) -> &BTreeSet<u64> {
        self.cache.xtle_changed.get_or_init(|| {
            let revisions = self.xtle_revisions();
            self.synced()
                .into_iter()
                .filter(|row| {
                    !(row.staged_for_merge()
                        && row.resolve_conflict() == Some(ResolveConflict::StoreWins))
                })
                .filter(|row| {
                    revisions
                        .get(row.xtle_path())
                        .is_some_and(|revision| Some(*revision) != row.last_sync_revision())
                })
                .map(TrackedPath::id)
                .collect()
        })
    }

    fn reset(&mut self) {
        self.cache = ResourceCache::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::{TranslationFile, Unit};
    use crate::store::{LocalStore, UpdateOptions};
    use crate::batch::Updated;
    use pretty_assertions::assert_eq;
    use std::fs;

    fn mapping() -> PathMapping {
        PathMapping::new("/<language_code>/<filename>.<ext>", "tutorial").unwrap()
    }

    fn write(root: &std::path::Path, relative: &str, content: &str) {
        let path = root.join(relative.trim_start_matches('/'));
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn discovers_matching_files_and_skips_the_rest() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "/fr/messages.json", "{}");
        write(dir.path(), "/de/messages.toml", "");
        write(dir.path(), "/fr/readme.txt", "");
        write(dir.path(), "/fr/nested/messages.json", "{}");
        write(dir.path(), "/.hidden/messages.json", "{}");
        write(dir.path(), "/fr/messages.json.lock", "");

        let tracked = TrackedPaths::new();
        let store = LocalStore::new();
        let mapping = mapping();
        let resources = ProjectResources::new(&tracked, &store, &mapping, NormalizedPath::new(dir.path()));

        assert_eq!(
            resources.found_file_matches(),
            &[
                ("/de/tutorial/messages.toml".to_string(), "/de/messages.toml".to_string()),
                ("/fr/tutorial/messages.json".to_string(), "/fr/messages.json".to_string()),
            ]
        );
    }

    #[test]
    fn trackable_stores_exclude_tracked_and_obsolete() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = LocalStore::new();
        store.create("/fr/tutorial/a.json").unwrap();
        store.create("/de/tutorial/a.json").unwrap();
        store.create("/es/tutorial/a.json").unwrap();
        store.create("/es/other/a.json").unwrap();
        store.make_obsolete("/es/tutorial/a.json").unwrap();
        let mut tracked = TrackedPaths::new();
        tracked.track("/de/tutorial/a.json", "/de/a.json").unwrap();
        let mapping = mapping();

        let resources = ProjectResources::new(&tracked, &store, &mapping, NormalizedPath::new(dir.path()));

        let trackable: Vec<_> = resources
            .trackable_stores()
            .iter()
            .map(|(s, fs_path)| (s.xtle_path.as_str(), fs_path.as_str()))
            .collect();
        assert_eq!(trackable, vec![("/fr/tutorial/a.json", "/fr/a.json")]);
    }

    #[test]
    fn change_sets_compare_against_watermark() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "/fr/a.json", "new content");
        let mut store = LocalStore::new();
        store.create("/fr/tutorial/a.json").unwrap();
        store
            .update(
                "/fr/tutorial/a.json",
                &TranslationFile::new(vec![Unit::new("hello", "Hello", "Bonjour")]),
                UpdateOptions {
                    revision: 0,
                    resolve_conflict: ResolveConflict::FsWins,
                    actor: "system",
                },
                &mut Updated::default(),
            )
            .unwrap();
        let mut tracked = TrackedPaths::new();
        let id = {
            let row = tracked.track("/fr/tutorial/a.json", "/fr/a.json").unwrap();
            row.on_sync("sha256:stale", 0);
            row.id()
        };
        let mapping = mapping();

        let resources = ProjectResources::new(&tracked, &store, &mapping, NormalizedPath::new(dir.path()));

        assert!(resources.fs_changed().contains(&id));
        assert!(resources.xtle_changed_ids().contains(&id));
        assert_eq!(resources.xtle_revisions().get("/fr/tutorial/a.json"), Some(&1));
    }

    #[test]
    fn reset_rescans_the_filesystem() {
        let dir = tempfile::tempdir().unwrap();
        let tracked = TrackedPaths::new();
        let store = LocalStore::new();
        let mapping = mapping();
        let mut resources = ProjectResources::new(&tracked, &store, &mapping, NormalizedPath::new(dir.path()));

        assert!(resources.found_file_paths().is_empty());
        write(dir.path(), "/fr/a.json", "{}");
        assert!(resources.found_file_paths().is_empty());

        resources.reset();
        assert!(resources.found_file_paths().contains("/fr/a.json"));
    }
}
