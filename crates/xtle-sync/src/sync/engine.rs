//! FsEngine implementation
//!
//! The engine ties the tracked-path ledger, the store and the files under the
//! project's `fs_root` together. Staging operations record operator decisions
//! on tracked paths; `sync` carries out everything that is staged or
//! unambiguously ahead on one side.

use std::collections::BTreeMap;

use serde::Serialize;
use xtle_files::NormalizedPath;

use super::executor::{PullOptions, SyncFile};
use super::file::FsFile;
use super::syncer::{Syncer, UnitSyncer};
use crate::batch::{EventQueue, SyncEvent};
use crate::config::ResolvedConfig;
use crate::mapping::PathMapping;
use crate::resources::ProjectResources;
use crate::state::{PathDescriptor, ProjectState, StateCategory, StateFilter, classify};
use crate::store::TranslationStore;
use crate::tracked::{ResolveConflict, TrackedPath, TrackedPaths};
use crate::{Error, Result};

/// Categories `sync` acts on, in the order it acts on them.
const SYNC_ORDER: [StateCategory; 8] = [
    StateCategory::Remove,
    StateCategory::MergeXtleWins,
    StateCategory::MergeFsWins,
    StateCategory::FsStaged,
    StateCategory::FsAhead,
    StateCategory::XtleStaged,
    StateCategory::XtleAhead,
    StateCategory::BothRemoved,
];

/// Options for sync operations
#[derive(Debug, Clone, Copy, Default)]
pub struct SyncOptions {
    /// Report what would happen without touching files, the store or the
    /// tracked paths.
    pub dry_run: bool,
}

/// What happened to one path during a sync
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ActionOutcome {
    /// Dry run: the action that would have been taken.
    Planned,
    /// Nothing needed doing after all.
    Unchanged,
    Pulled { revision: u64 },
    Pushed { revision: u64 },
    Merged { revision: u64 },
    /// File deleted, store obsoleted and tracking dropped.
    Removed,
    /// Tracking dropped for a path gone on both sides.
    Dropped,
    Failed { error: String, transient: bool },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncAction {
    pub category: StateCategory,
    pub xtle_path: String,
    pub fs_path: String,
    #[serde(flatten)]
    pub outcome: ActionOutcome,
}

/// Report from a sync operation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub dry_run: bool,
    pub actions: Vec<SyncAction>,
}

impl SyncReport {
    /// Whether every path synced without error.
    pub fn success(&self) -> bool {
        self.failures().next().is_none()
    }

    pub fn failures(&self) -> impl Iterator<Item = &SyncAction> {
        self.actions
            .iter()
            .filter(|a| matches!(a.outcome, ActionOutcome::Failed { .. }))
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

/// Engine for reconciling translation files with the store
pub struct FsEngine<S> {
    config: ResolvedConfig,
    mapping: PathMapping,
    fs_root: NormalizedPath,
    tracked: TrackedPaths,
    store: S,
    syncer: Box<dyn Syncer>,
    events: EventQueue,
}

impl<S: TranslationStore> FsEngine<S> {
    /// Create an engine over an already loaded ledger and store.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidMapping`] if the configured translation
    /// mapping does not compile.
    pub fn new(config: ResolvedConfig, fs_root: NormalizedPath, tracked: TrackedPaths, store: S) -> Result<Self> {
        let mapping = config.mapping()?;
        Ok(Self {
            config,
            mapping,
            fs_root,
            tracked,
            store,
            syncer: Box::new(UnitSyncer),
            events: EventQueue::new(),
        })
    }

    /// Replace the syncer used when writing store units into files.
    pub fn with_syncer(mut self, syncer: impl Syncer + 'static) -> Self {
        self.syncer = Box::new(syncer);
        self
    }

    pub fn config(&self) -> &ResolvedConfig {
        &self.config
    }

    pub fn mapping(&self) -> &PathMapping {
        &self.mapping
    }

    pub fn fs_root(&self) -> &NormalizedPath {
        &self.fs_root
    }

    pub fn tracked(&self) -> &TrackedPaths {
        &self.tracked
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn into_parts(self) -> (TrackedPaths, S) {
        (self.tracked, self.store)
    }

    /// A fresh resource provider over the engine's current data.
    pub fn resources(&self) -> ProjectResources<'_> {
        ProjectResources::new(&self.tracked, &self.store, &self.mapping, self.fs_root.clone())
    }

    /// Classify every known path.
    pub fn state(&self) -> ProjectState {
        classify(&self.resources())
    }

    /// Take the events queued by sync operations so far.
    pub fn drain_events(&mut self) -> Vec<SyncEvent> {
        self.events.drain()
    }

    /// Track store resources that have no file yet, or mark missing files to
    /// be restored from the store.
    ///
    /// With `force`, conflicting paths are resolved in favour of the store.
    pub fn add(&mut self, filter: &StateFilter, force: bool) -> Result<ProjectState> {
        let mut categories = vec![StateCategory::XtleUntracked, StateCategory::FsRemoved];
        if force {
            categories.extend([StateCategory::ConflictUntracked, StateCategory::Conflict]);
        }
        self.resolve_paths(filter, &categories, ResolveConflict::StoreWins)
    }

    /// Track files that have no store resource yet, or mark resources removed
    /// from the store to be restored from their files.
    ///
    /// With `force`, conflicting paths are resolved in favour of the files.
    pub fn fetch(&mut self, filter: &StateFilter, force: bool) -> Result<ProjectState> {
        let mut categories = vec![StateCategory::FsUntracked, StateCategory::XtleRemoved];
        if force {
            categories.extend([StateCategory::ConflictUntracked, StateCategory::Conflict]);
        }
        self.resolve_paths(filter, &categories, ResolveConflict::FsWins)
    }

    /// Stage paths removed on one side for removal on both.
    ///
    /// With `force`, untracked paths are tracked and staged as well.
    pub fn rm(&mut self, filter: &StateFilter, force: bool) -> Result<ProjectState> {
        let mut categories = vec![StateCategory::XtleRemoved, StateCategory::FsRemoved];
        if force {
            categories.extend([
                StateCategory::ConflictUntracked,
                StateCategory::FsUntracked,
                StateCategory::XtleUntracked,
            ]);
        }
        let state = self.selected(filter, &categories);
        for (_, descriptors) in state.iter() {
            for descriptor in descriptors {
                self.track_or_get(descriptor)?.stage_for_removal();
                tracing::debug!(xtle_path = %descriptor.xtle_path, "Staged for removal");
            }
        }
        Ok(state)
    }

    /// Stage conflicting paths for a unit-level merge.
    ///
    /// Where units conflict, the store wins if `store_wins` is set, the file
    /// otherwise.
    pub fn merge(&mut self, filter: &StateFilter, store_wins: bool) -> Result<ProjectState> {
        let winner = ResolveConflict::from_store_wins(store_wins);
        let state = self.selected(
            filter,
            &[StateCategory::Conflict, StateCategory::ConflictUntracked],
        );
        for (_, descriptors) in state.iter() {
            for descriptor in descriptors {
                self.track_or_get(descriptor)?.stage_for_merge(winner)?;
                tracing::debug!(xtle_path = %descriptor.xtle_path, %winner, "Staged for merge");
            }
        }
        Ok(state)
    }

    /// Drop every override and staging flag. Paths that were only tracked
    /// by staging, and never synced, stop being tracked.
    pub fn unstage(&mut self, filter: &StateFilter) -> Result<ProjectState> {
        let state = self.state().filter(filter);
        let mut unstaged = BTreeMap::new();

        for (category, descriptors) in state.iter() {
            for descriptor in descriptors {
                let Some(id) = descriptor.tracked_id else {
                    continue;
                };
                let row = self
                    .tracked
                    .get_mut(id)
                    .ok_or_else(|| Error::TrackedPathNotFound(descriptor.xtle_path.clone()))?;
                if !row.is_staged() {
                    continue;
                }
                if row.is_unsynced() {
                    self.tracked.remove(id);
                    tracing::debug!(xtle_path = %descriptor.xtle_path, "Untracked unsynced path");
                } else {
                    row.unstage();
                    tracing::debug!(xtle_path = %descriptor.xtle_path, "Unstaged path");
                }
                unstaged
                    .entry(category)
                    .or_insert_with(Vec::new)
                    .push(descriptor.clone());
            }
        }
        Ok(ProjectState::from_states(unstaged))
    }

    /// Carry out every staged or one-sided change selected by `filter`.
    ///
    /// Failures are recorded per path in the report; the remaining paths
    /// are still synced.
    pub fn sync(&mut self, filter: &StateFilter, options: SyncOptions) -> SyncReport {
        let state = self.selected(filter, &SYNC_ORDER);
        let mut report = SyncReport {
            dry_run: options.dry_run,
            actions: Vec::new(),
        };

        for category in SYNC_ORDER {
            for descriptor in state.get(category) {
                let outcome = if options.dry_run {
                    ActionOutcome::Planned
                } else {
                    match self.sync_path(category, descriptor) {
                        Ok(outcome) => outcome,
                        Err(e) => {
                            tracing::warn!(
                                xtle_path = %descriptor.xtle_path,
                                %category,
                                error = %e,
                                "Failed to sync path"
                            );
                            ActionOutcome::Failed {
                                transient: e.is_transient(),
                                error: e.to_string(),
                            }
                        }
                    }
                };
                report.actions.push(SyncAction {
                    category,
                    xtle_path: descriptor.xtle_path.clone(),
                    fs_path: descriptor.fs_path.clone(),
                    outcome,
                });
            }
        }

        tracing::info!(
            actions = report.actions.len(),
            failures = report.failures().count(),
            dry_run = options.dry_run,
            "Sync finished"
        );
        report
    }

    fn sync_path(&mut self, category: StateCategory, descriptor: &PathDescriptor) -> Result<ActionOutcome> {
        let id = descriptor
            .tracked_id
            .ok_or_else(|| Error::TrackedPathNotFound(descriptor.xtle_path.clone()))?;

        if category == StateCategory::BothRemoved {
            self.tracked.remove(id);
            tracing::info!(xtle_path = %descriptor.xtle_path, "Dropped path removed on both sides");
            return Ok(ActionOutcome::Dropped);
        }

        let actor = self.config.actor.clone();
        let tracked = self
            .tracked
            .get_mut(id)
            .ok_or_else(|| Error::TrackedPathNotFound(descriptor.xtle_path.clone()))?;
        let file = FsFile::new(&self.fs_root, tracked.fs_path());
        let mut sync_file = SyncFile::new(
            tracked,
            file,
            &mut self.store,
            self.syncer.as_ref(),
            &mut self.events,
        );

        let outcome = match category {
            StateCategory::Remove => {
                sync_file.remove()?;
                ActionOutcome::Removed
            }
            StateCategory::MergeXtleWins | StateCategory::MergeFsWins => {
                let winner = ResolveConflict::from_store_wins(category == StateCategory::MergeXtleWins);
                let revision = sync_file.merge(&PullOptions::merge(&actor, winner))?;
                ActionOutcome::Merged { revision }
            }
            StateCategory::FsStaged | StateCategory::FsAhead => match sync_file.pull(&PullOptions::new(&actor))? {
                Some(revision) => ActionOutcome::Pulled { revision },
                None => ActionOutcome::Unchanged,
            },
            StateCategory::XtleStaged | StateCategory::XtleAhead => match sync_file.push()? {
                Some(revision) => {
                    sync_file.on_sync_current(revision)?;
                    ActionOutcome::Pushed { revision }
                }
                None => ActionOutcome::Unchanged,
            },
            other => {
                return Err(Error::PreconditionViolation {
                    path: descriptor.xtle_path.clone(),
                    message: format!("'{other}' paths need staging before they can be synced"),
                });
            }
        };

        if outcome == ActionOutcome::Removed {
            self.tracked.remove(id);
        }
        Ok(outcome)
    }

    /// Set `winner` as the override on every selected path, tracking
    /// untracked ones.
    fn resolve_paths(
        &mut self,
        filter: &StateFilter,
        categories: &[StateCategory],
        winner: ResolveConflict,
    ) -> Result<ProjectState> {
        let state = self.selected(filter, categories);
        for (_, descriptors) in state.iter() {
            for descriptor in descriptors {
                self.track_or_get(descriptor)?.set_resolve_conflict(Some(winner))?;
                tracing::debug!(xtle_path = %descriptor.xtle_path, %winner, "Resolved path");
            }
        }
        Ok(state)
    }

    /// The current state narrowed by `filter` to `categories`.
    ///
    /// States requested by the filter but outside `categories` are ignored;
    /// a filter asking only for such states selects nothing.
    fn selected(&self, filter: &StateFilter, categories: &[StateCategory]) -> ProjectState {
        let states: Vec<StateCategory> = if filter.states.is_empty() {
            categories.to_vec()
        } else {
            filter
                .states
                .iter()
                .copied()
                .filter(|s| categories.contains(s))
                .collect()
        };
        if states.is_empty() {
            return ProjectState::from_states(BTreeMap::new());
        }

        self.state().filter(&StateFilter {
            states,
            ..filter.clone()
        })
    }

    fn track_or_get(&mut self, descriptor: &PathDescriptor) -> Result<&mut TrackedPath> {
        match descriptor.tracked_id {
            Some(id) => self
                .tracked
                .get_mut(id)
                .ok_or_else(|| Error::TrackedPathNotFound(descriptor.xtle_path.clone())),
            None => self.tracked.track(&descriptor.xtle_path, &descriptor.fs_path),
        }
    }
}
