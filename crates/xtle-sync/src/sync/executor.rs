//! Pull and push for a single tracked path

use xtle_files::checksum;

use super::file::FsFile;
use super::syncer::Syncer;
use crate::batch::{BatchScope, EventQueue, SyncEvent};
use crate::conflict;
use crate::format::TranslationFile;
use crate::store::{StoreInfo, TranslationStore, UpdateOptions};
use crate::tracked::{ResolveConflict, TrackedPath};
use crate::{Error, Result};

#[derive(Debug, Clone, Copy)]
pub struct PullOptions<'a> {
    /// Compare store units against the last synced revision instead of
    /// forcing the file's content in.
    pub merge: bool,
    /// Winner to use when the tracked path has no override.
    pub forced: Option<ResolveConflict>,
    pub actor: &'a str,
}

impl<'a> PullOptions<'a> {
    pub fn new(actor: &'a str) -> Self {
        Self {
            merge: false,
            forced: None,
            actor,
        }
    }

    pub fn merge(actor: &'a str, winner: ResolveConflict) -> Self {
        Self {
            merge: true,
            forced: Some(winner),
            actor,
        }
    }
}

/// Executor binding one tracked path to its file, the store and the event
/// queue for the duration of a sync step.
pub struct SyncFile<'a> {
    tracked: &'a mut TrackedPath,
    file: FsFile,
    store: &'a mut dyn TranslationStore,
    syncer: &'a dyn Syncer,
    events: &'a mut EventQueue,
}

impl<'a> SyncFile<'a> {
    pub fn new(
        tracked: &'a mut TrackedPath,
        file: FsFile,
        store: &'a mut dyn TranslationStore,
        syncer: &'a dyn Syncer,
        events: &'a mut EventQueue,
    ) -> Self {
        Self {
            tracked,
            file,
            store,
            syncer,
            events,
        }
    }

    pub fn tracked(&self) -> &TrackedPath {
        self.tracked
    }

    pub fn file(&self) -> &FsFile {
        &self.file
    }

    /// The store resource, if one exists and is not obsolete.
    fn live_store(&self) -> Option<StoreInfo> {
        self.store
            .get(self.tracked.xtle_path())
            .filter(StoreInfo::is_live)
    }

    pub fn fs_changed(&self) -> Result<bool> {
        Ok(self.file.fingerprint()?.as_deref() != self.tracked.last_sync_hash())
    }

    pub fn xtle_changed(&self) -> bool {
        self.store
            .get(self.tracked.xtle_path())
            .is_some_and(|store| Some(store.max_unit_revision.unwrap_or(0)) != self.tracked.last_sync_revision())
    }

    /// Update the store from the file.
    ///
    /// Returns the store's resulting max unit revision, or `None` when the
    /// file has not changed since the last sync.
    ///
    /// # Errors
    ///
    /// - [`Error::PreconditionViolation`] if neither the store resource nor
    ///   the file exists.
    /// - [`Error::TransientSyncFailure`] if the file vanished or cannot be
    ///   parsed. The watermark is left untouched.
    pub fn pull(&mut self, options: &PullOptions<'_>) -> Result<Option<u64>> {
        Ok(self.update_store(options, true)?.map(|(_, revision)| revision))
    }

    /// Merge the file into the store, then rewrite the file from the store.
    ///
    /// The watermark is recorded, and the override and merge staging
    /// cleared, only once the file has been written. Returns the store
    /// revision written.
    ///
    /// # Errors
    ///
    /// Any failure leaves the tracked path as it was, still staged for the
    /// merge.
    pub fn merge(&mut self, options: &PullOptions<'_>) -> Result<u64> {
        let pulled = self.update_store(options, false)?;
        let revision = self.write_from_store()?;
        self.on_sync_current(revision)?;
        tracing::info!(
            xtle_path = %self.tracked.xtle_path(),
            revision,
            store_updated = pulled.is_some(),
            "Merged file"
        );
        Ok(revision)
    }

    /// Apply the file to the store. With `record`, the watermark is set and
    /// announced inside the batch scope.
    ///
    /// Returns the observed file hash and the store's resulting revision.
    fn update_store(&mut self, options: &PullOptions<'_>, record: bool) -> Result<Option<(String, u64)>> {
        let xtle_path = self.tracked.xtle_path().to_string();
        let store = self.store.get(&xtle_path);
        let bytes = self.file.read()?;

        if store.is_none() && bytes.is_none() {
            return Err(Error::PreconditionViolation {
                path: xtle_path,
                message: "neither a store resource nor a file exists".to_string(),
            });
        }

        let latest_hash = bytes.as_deref().map(checksum::fingerprint_bytes);
        let live = store.as_ref().is_some_and(StoreInfo::is_live);
        if live && latest_hash.as_deref() == self.tracked.last_sync_hash() {
            tracing::debug!(xtle_path = %xtle_path, "No filesystem changes to pull");
            return Ok(None);
        }

        let (Some(bytes), Some(latest_hash)) = (bytes, latest_hash) else {
            tracing::warn!(xtle_path = %xtle_path, fs_path = %self.file.fs_path(), "File has disappeared");
            return Err(Error::transient(&xtle_path, "file has disappeared"));
        };

        let parsed = self
            .file
            .format()
            .and_then(|format| format.parse(self.file.fs_path(), &bytes))
            .map_err(|e| {
                tracing::warn!(xtle_path = %xtle_path, error = %e, "Cannot parse file");
                Error::transient(&xtle_path, e.to_string())
            })?;
        let incoming = if !parsed.is_empty() {
            parsed
        } else if store.is_some() {
            // An emptied file does not wipe the store
            self.store.units(&xtle_path)?
        } else {
            tracing::warn!(xtle_path = %xtle_path, "File has no translation units");
            return Err(Error::transient(&xtle_path, "file has no translation units"));
        };

        tracing::debug!(xtle_path = %xtle_path, merge = options.merge, "Pulling file");
        let mut scope = BatchScope::open(&mut *self.events, &xtle_path);

        match &store {
            None => {
                self.store.create(&xtle_path)?;
            }
            Some(info) if info.obsolete => self.store.resurrect(&xtle_path)?,
            Some(_) => {}
        }

        let resolve_conflict = conflict::resolve(self.tracked.resolve_conflict(), options.forced);
        let revision = if options.merge {
            self.tracked.last_sync_revision().unwrap_or(0)
        } else {
            self.store.revision().next() + 1
        };

        let (new_revision, report) = self.store.update(
            &xtle_path,
            &incoming,
            UpdateOptions {
                revision,
                resolve_conflict,
                actor: options.actor,
            },
            scope.updated(),
        )?;

        if record {
            self.tracked.on_sync(latest_hash.clone(), new_revision);
            scope.emit(SyncEvent::Synced {
                xtle_path: xtle_path.clone(),
                last_sync_hash: latest_hash.clone(),
                last_sync_revision: new_revision,
            });
        }

        tracing::info!(
            xtle_path = %xtle_path,
            revision = new_revision,
            resolve_conflict = %resolve_conflict,
            added = report.added.len(),
            updated = report.updated.len(),
            obsoleted = report.obsoleted.len(),
            conflicts = report.conflicts.len(),
            "Pulled file"
        );
        Ok(Some((latest_hash, new_revision)))
    }

    /// Write the store's units to the file.
    ///
    /// Returns the store revision written, or `None` when there is nothing
    /// to push. The watermark is not touched; call [`Self::on_sync`] once
    /// the write has been observed.
    pub fn push(&mut self) -> Result<Option<u64>> {
        let xtle_path = self.tracked.xtle_path().to_string();
        if self.live_store().is_none() {
            tracing::debug!(xtle_path = %xtle_path, "No store resource to push");
            return Ok(None);
        }
        if self.file.exists() && !self.xtle_changed() {
            tracing::debug!(xtle_path = %xtle_path, "No store changes to push");
            return Ok(None);
        }

        let _scope = BatchScope::open(&mut *self.events, &xtle_path);
        write_units(&self.file, &*self.store, self.syncer, &xtle_path).map(Some)
    }

    /// Render the store's live units into the file, keeping the file's unit
    /// order where it exists. Returns the store revision written.
    pub fn write_from_store(&mut self) -> Result<u64> {
        let xtle_path = self.tracked.xtle_path().to_string();
        write_units(&self.file, &*self.store, self.syncer, &xtle_path)
    }

    /// Record a completed sync on the tracked path and announce it.
    pub fn on_sync(&mut self, last_sync_hash: String, last_sync_revision: u64) {
        self.tracked.on_sync(last_sync_hash.clone(), last_sync_revision);
        self.events.push(SyncEvent::Synced {
            xtle_path: self.tracked.xtle_path().to_string(),
            last_sync_hash,
            last_sync_revision,
        });
    }

    /// Record the file as it is on disk now as synced at `revision`.
    pub fn on_sync_current(&mut self, revision: u64) -> Result<()> {
        let hash = self.file.fingerprint()?.ok_or_else(|| {
            Error::transient(self.tracked.xtle_path(), "file has disappeared after write")
        })?;
        self.on_sync(hash, revision);
        Ok(())
    }

    /// Delete the file and mark the store resource obsolete.
    pub fn remove(&mut self) -> Result<()> {
        let xtle_path = self.tracked.xtle_path().to_string();
        let removed_file = self.file.remove()?;
        let had_store = self.live_store().is_some();
        if had_store {
            self.store.make_obsolete(&xtle_path)?;
        }
        tracing::info!(xtle_path = %xtle_path, removed_file, obsoleted_store = had_store, "Removed path");
        Ok(())
    }
}

fn write_units(file: &FsFile, store: &dyn TranslationStore, syncer: &dyn Syncer, xtle_path: &str) -> Result<u64> {
    let info = store
        .get(xtle_path)
        .ok_or_else(|| Error::StoreNotFound(xtle_path.to_string()))?;
    let revision = info.max_unit_revision.unwrap_or(0);

    let mut disk = match file.deserialize() {
        Ok(Some(disk)) => disk,
        Ok(None) => TranslationFile::default(),
        Err(Error::InvalidTranslationFile { message, .. }) => {
            tracing::warn!(xtle_path, error = %message, "Cannot parse file before push");
            return Err(Error::transient(xtle_path, message));
        }
        Err(e) => return Err(e),
    };

    let store_units = store.units(xtle_path)?;
    let outcome = syncer.sync(&mut disk, &store_units, revision);
    let content = file.serialize(&disk)?;
    file.write(&content)?;

    tracing::info!(
        xtle_path,
        fs_path = %file.fs_path(),
        revision,
        updated = outcome.updated,
        added = outcome.added,
        removed = outcome.removed,
        "Pushed file"
    );
    Ok(revision)
}
