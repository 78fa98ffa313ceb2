//! Project state classification
//!
//! Every path the project knows about, whether tracked, found on disk or held
//! by the store, lands in at most one [`StateCategory`]. The categories say
//! what a sync would do with the path, or that it needs a decision first.

mod classify;
mod detector;

pub use classify::classify;
pub use detector::{ChangeCache, Changes};

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::resources::ResourceProvider;
use crate::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StateCategory {
    Conflict,
    ConflictUntracked,
    XtleUntracked,
    XtleAhead,
    XtleStaged,
    XtleRemoved,
    FsUntracked,
    FsAhead,
    FsStaged,
    FsRemoved,
    MergeXtleWins,
    MergeFsWins,
    Remove,
    BothRemoved,
    Unchanged,
}

impl StateCategory {
    /// All categories in reporting order.
    pub const ALL: [StateCategory; 15] = [
        Self::Conflict,
        Self::ConflictUntracked,
        Self::XtleUntracked,
        Self::XtleAhead,
        Self::XtleStaged,
        Self::XtleRemoved,
        Self::FsUntracked,
        Self::FsAhead,
        Self::FsStaged,
        Self::FsRemoved,
        Self::MergeXtleWins,
        Self::MergeFsWins,
        Self::Remove,
        Self::BothRemoved,
        Self::Unchanged,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Conflict => "conflict",
            Self::ConflictUntracked => "conflict_untracked",
            Self::XtleUntracked => "xtle_untracked",
            Self::XtleAhead => "xtle_ahead",
            Self::XtleStaged => "xtle_staged",
            Self::XtleRemoved => "xtle_removed",
            Self::FsUntracked => "fs_untracked",
            Self::FsAhead => "fs_ahead",
            Self::FsStaged => "fs_staged",
            Self::FsRemoved => "fs_removed",
            Self::MergeXtleWins => "merge_xtle_wins",
            Self::MergeFsWins => "merge_fs_wins",
            Self::Remove => "remove",
            Self::BothRemoved => "both_removed",
            Self::Unchanged => "unchanged",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Self::Conflict => "Conflicts",
            Self::ConflictUntracked => "Untracked conflicts",
            Self::XtleUntracked => "Untracked store resources",
            Self::XtleAhead => "Changed in store",
            Self::XtleStaged => "Staged for push",
            Self::XtleRemoved => "Removed from store",
            Self::FsUntracked => "Untracked files",
            Self::FsAhead => "Changed on filesystem",
            Self::FsStaged => "Staged for pull",
            Self::FsRemoved => "Removed from filesystem",
            Self::MergeXtleWins => "Staged for merge (store wins)",
            Self::MergeFsWins => "Staged for merge (filesystem wins)",
            Self::Remove => "Staged for removal",
            Self::BothRemoved => "Removed on both sides",
            Self::Unchanged => "Unchanged",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::Conflict => "Both the file and the store resource changed since the last sync",
            Self::ConflictUntracked => "An untracked file and an untracked store resource map to each other",
            Self::XtleUntracked => "A store resource with no file; use add to track it",
            Self::XtleAhead => "The store resource changed since the last sync; sync will push it",
            Self::XtleStaged => "Will be pushed from the store to the filesystem on sync",
            Self::XtleRemoved => "The store resource is gone; use fetch to restore it or rm to drop the file",
            Self::FsUntracked => "A file with no store resource; use fetch to track it",
            Self::FsAhead => "The file changed since the last sync; sync will pull it",
            Self::FsStaged => "Will be pulled from the filesystem into the store on sync",
            Self::FsRemoved => "The file is gone; use add to restore it or rm to drop the store resource",
            Self::MergeXtleWins => "Will be merged on sync, store wins unit conflicts",
            Self::MergeFsWins => "Will be merged on sync, filesystem wins unit conflicts",
            Self::Remove => "Both the file and the store resource will be removed on sync",
            Self::BothRemoved => "Both sides are gone; sync drops the tracked path",
            Self::Unchanged => "In sync",
        }
    }

    /// Categories that require a staging decision before sync acts.
    pub fn needs_action(&self) -> bool {
        matches!(
            self,
            Self::Conflict
                | Self::ConflictUntracked
                | Self::XtleUntracked
                | Self::XtleRemoved
                | Self::FsUntracked
                | Self::FsRemoved
        )
    }
}

impl fmt::Display for StateCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StateCategory {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| Error::Config {
                message: format!("unknown state '{s}'"),
            })
    }
}

/// One classified path. Untracked paths carry no tracked path id.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct PathDescriptor {
    pub xtle_path: String,
    pub fs_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tracked_id: Option<u64>,
}

impl PathDescriptor {
    pub fn new(xtle_path: impl Into<String>, fs_path: impl Into<String>, tracked_id: Option<u64>) -> Self {
        Self {
            xtle_path: xtle_path.into(),
            fs_path: fs_path.into(),
            tracked_id,
        }
    }
}

/// Subset selection for [`ProjectState::filter`]. Empty lists select all.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StateFilter {
    pub fs_paths: Vec<String>,
    pub xtle_paths: Vec<String>,
    pub states: Vec<StateCategory>,
}

impl StateFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn states(states: impl IntoIterator<Item = StateCategory>) -> Self {
        Self {
            states: states.into_iter().collect(),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.fs_paths.is_empty() && self.xtle_paths.is_empty() && self.states.is_empty()
    }

    fn matches(&self, category: StateCategory, descriptor: &PathDescriptor) -> bool {
        (self.states.is_empty() || self.states.contains(&category))
            && (self.fs_paths.is_empty() || self.fs_paths.contains(&descriptor.fs_path))
            && (self.xtle_paths.is_empty() || self.xtle_paths.contains(&descriptor.xtle_path))
    }
}

/// A partition of the project's paths into state categories.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ProjectState {
    states: BTreeMap<StateCategory, Vec<PathDescriptor>>,
}

impl ProjectState {
    pub(crate) fn from_states(mut states: BTreeMap<StateCategory, Vec<PathDescriptor>>) -> Self {
        for category in StateCategory::ALL {
            states.entry(category).or_default();
        }
        Self { states }
    }

    pub fn get(&self, category: StateCategory) -> &[PathDescriptor] {
        self.states.get(&category).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Non-empty categories in reporting order.
    pub fn iter(&self) -> impl Iterator<Item = (StateCategory, &[PathDescriptor])> {
        self.states
            .iter()
            .filter(|(_, items)| !items.is_empty())
            .map(|(category, items)| (*category, items.as_slice()))
    }

    /// Which category a path landed in.
    pub fn category_of(&self, xtle_path: &str) -> Option<StateCategory> {
        self.states
            .iter()
            .find(|(_, items)| items.iter().any(|d| d.xtle_path == xtle_path))
            .map(|(category, _)| *category)
    }

    /// Whether anything other than unchanged paths is present.
    pub fn has_changes(&self) -> bool {
        self.iter().any(|(category, _)| category != StateCategory::Unchanged)
    }

    pub fn len(&self) -> usize {
        self.states.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// An independent copy narrowed to the requested paths and categories.
    pub fn filter(&self, filter: &StateFilter) -> ProjectState {
        let states = self
            .states
            .iter()
            .map(|(category, items)| {
                let kept = items
                    .iter()
                    .filter(|d| filter.matches(*category, d))
                    .cloned()
                    .collect();
                (*category, kept)
            })
            .collect();
        Self::from_states(states)
    }
}

/// Classifier that memoizes its partition until explicitly reset.
pub struct StateClassifier<P> {
    resources: P,
    state: Option<ProjectState>,
}

impl<P: ResourceProvider> StateClassifier<P> {
    pub fn new(resources: P) -> Self {
        Self {
            resources,
            state: None,
        }
    }

    pub fn resources(&self) -> &P {
        &self.resources
    }

    /// The partition, computed on first use.
    pub fn state(&mut self) -> &ProjectState {
        let resources = &self.resources;
        self.state.get_or_insert_with(|| classify(resources))
    }

    /// Forget the partition and every cached resource answer.
    pub fn clear_cache(&mut self) {
        self.state = None;
        self.resources.reset();
    }

    pub fn into_state(self) -> ProjectState {
        match self.state {
            Some(state) => state,
            None => classify(&self.resources),
        }
    }
}
