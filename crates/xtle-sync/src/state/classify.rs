//! Category predicates
//!
//! Each predicate yields the candidates for one category. Some candidate
//! sets overlap by construction (a changed path with an override can satisfy
//! both an "ahead" and a "staged" predicate), so [`classify`] evaluates them
//! in [`CLAIM_ORDER`] and a path belongs to the first category that claims
//! it. Paths no category claims are unchanged if synced.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use super::detector::ChangeCache;
use super::{PathDescriptor, ProjectState, StateCategory};
use crate::resources::ResourceProvider;
use crate::tracked::{ResolveConflict, TrackedFilter, TrackedPath};

/// Evaluation order: explicit stagings first, then reporting order.
const CLAIM_ORDER: [StateCategory; 14] = [
    StateCategory::Remove,
    StateCategory::MergeXtleWins,
    StateCategory::MergeFsWins,
    StateCategory::Conflict,
    StateCategory::ConflictUntracked,
    StateCategory::XtleUntracked,
    StateCategory::XtleAhead,
    StateCategory::XtleStaged,
    StateCategory::XtleRemoved,
    StateCategory::FsUntracked,
    StateCategory::FsAhead,
    StateCategory::FsStaged,
    StateCategory::FsRemoved,
    StateCategory::BothRemoved,
];

/// Partition every known path into state categories.
pub fn classify<P: ResourceProvider + ?Sized>(resources: &P) -> ProjectState {
    let mut cache = ChangeCache::new();
    let mut claimed: HashSet<String> = HashSet::new();
    let mut states = BTreeMap::new();

    for category in CLAIM_ORDER {
        let accepted: Vec<PathDescriptor> = candidates(category, resources, &mut cache)
            .into_iter()
            .filter(|d| claimed.insert(d.xtle_path.clone()))
            .collect();
        states.insert(category, accepted);
    }

    let unchanged = resources
        .synced()
        .into_iter()
        .filter(|row| !claimed.contains(row.xtle_path()))
        .map(descriptor)
        .collect();
    states.insert(StateCategory::Unchanged, unchanged);

    let state = ProjectState::from_states(states);
    tracing::debug!(paths = state.len(), checked = cache.len(), "Classified project state");
    state
}

fn candidates<P: ResourceProvider + ?Sized>(
    category: StateCategory,
    resources: &P,
    cache: &mut ChangeCache,
) -> Vec<PathDescriptor> {
    match category {
        StateCategory::Conflict => conflict(resources, cache),
        StateCategory::ConflictUntracked => conflict_untracked(resources),
        StateCategory::XtleUntracked => xtle_untracked(resources),
        StateCategory::XtleAhead => xtle_ahead(resources, cache),
        StateCategory::XtleStaged => xtle_staged(resources),
        StateCategory::XtleRemoved => xtle_removed(resources),
        StateCategory::FsUntracked => fs_untracked(resources),
        StateCategory::FsAhead => fs_ahead(resources),
        StateCategory::FsStaged => fs_staged(resources),
        StateCategory::FsRemoved => fs_removed(resources),
        StateCategory::MergeXtleWins => merge(resources, ResolveConflict::StoreWins),
        StateCategory::MergeFsWins => merge(resources, ResolveConflict::FsWins),
        StateCategory::Remove => remove(resources),
        StateCategory::BothRemoved => both_removed(resources),
        StateCategory::Unchanged => Vec::new(),
    }
}

fn descriptor(row: &TrackedPath) -> PathDescriptor {
    PathDescriptor::new(row.xtle_path(), row.fs_path(), Some(row.id()))
}

fn descriptors<'r>(rows: impl IntoIterator<Item = &'r TrackedPath>) -> Vec<PathDescriptor> {
    rows.into_iter().map(descriptor).collect()
}

/// Sorted, de-duplicated union of two row sets.
fn union<'r>(a: Vec<&'r TrackedPath>, b: Vec<&'r TrackedPath>) -> Vec<PathDescriptor> {
    let mut seen = BTreeSet::new();
    let mut rows: Vec<&TrackedPath> = a
        .into_iter()
        .chain(b)
        .filter(|row| seen.insert(row.id()))
        .collect();
    rows.sort_by(|x, y| x.xtle_path().cmp(y.xtle_path()));
    descriptors(rows)
}

fn store_gone<P: ResourceProvider + ?Sized>(resources: &P, row: &TrackedPath) -> bool {
    resources.live_store(row.xtle_path()).is_none()
}

fn conflict<P: ResourceProvider + ?Sized>(resources: &P, cache: &mut ChangeCache) -> Vec<PathDescriptor> {
    resources.xtle_changed()
        .into_iter()
        .filter(|row| row.resolve_conflict().is_none())
        .filter(|row| cache.changes(resources, row).fs_changed)
        .map(descriptor)
        .collect()
}

fn conflict_untracked<P: ResourceProvider + ?Sized>(resources: &P) -> Vec<PathDescriptor> {
    let found = resources.found_file_paths();
    resources
        .trackable_stores()
        .iter()
        .filter(|(_, fs_path)| found.contains(fs_path))
        .map(|(store, fs_path)| PathDescriptor::new(&store.xtle_path, fs_path, None))
        .collect()
}

fn xtle_untracked<P: ResourceProvider + ?Sized>(resources: &P) -> Vec<PathDescriptor> {
    let found = resources.found_file_paths();
    resources
        .trackable_stores()
        .iter()
        .filter(|(_, fs_path)| !found.contains(fs_path))
        .map(|(store, fs_path)| PathDescriptor::new(&store.xtle_path, fs_path, None))
        .collect()
}

fn fs_untracked<P: ResourceProvider + ?Sized>(resources: &P) -> Vec<PathDescriptor> {
    let tracked = resources.tracked_paths();
    let tracked_xtle: HashSet<&str> = tracked.values().map(String::as_str).collect();
    let trackable = resources.trackable_store_paths();
    let trackable_fs: HashSet<&str> = trackable.values().map(String::as_str).collect();

    resources
        .found_file_matches()
        .iter()
        .filter(|(xtle_path, fs_path)| {
            !tracked.contains_key(fs_path)
                && !tracked_xtle.contains(xtle_path.as_str())
                && !trackable_fs.contains(fs_path.as_str())
                && !trackable.contains_key(xtle_path)
        })
        .map(|(xtle_path, fs_path)| PathDescriptor::new(xtle_path, fs_path, None))
        .collect()
}

fn remove<P: ResourceProvider + ?Sized>(resources: &P) -> Vec<PathDescriptor> {
    descriptors(resources.tracked(TrackedFilter {
        staged_for_removal: Some(true),
        ..TrackedFilter::default()
    }))
}

fn merge<P: ResourceProvider + ?Sized>(resources: &P, winner: ResolveConflict) -> Vec<PathDescriptor> {
    descriptors(resources.tracked(TrackedFilter {
        staged_for_merge: Some(true),
        resolve_conflict: Some(winner),
        ..TrackedFilter::default()
    }))
}

fn fs_staged<P: ResourceProvider + ?Sized>(resources: &P) -> Vec<PathDescriptor> {
    let new_files = resources
        .unsynced()
        .into_iter()
        .filter(|row| !resources.is_missing(row.fs_path()))
        .filter(|row| row.resolve_conflict() != Some(ResolveConflict::StoreWins))
        .collect();
    let restored = resources
        .synced()
        .into_iter()
        .filter(|row| store_gone(resources, row))
        .filter(|row| !resources.is_missing(row.fs_path()))
        .filter(|row| row.resolve_conflict() == Some(ResolveConflict::FsWins))
        .collect();
    union(new_files, restored)
}

fn xtle_staged<P: ResourceProvider + ?Sized>(resources: &P) -> Vec<PathDescriptor> {
    let new_stores = resources
        .unsynced()
        .into_iter()
        .filter(|row| row.resolve_conflict() != Some(ResolveConflict::FsWins))
        .filter(|row| resources.live_store(row.xtle_path()).is_some())
        .collect();
    let restored = resources
        .synced()
        .into_iter()
        .filter(|row| resources.live_store(row.xtle_path()).is_some())
        .filter(|row| resources.is_missing(row.fs_path()))
        .filter(|row| row.resolve_conflict() == Some(ResolveConflict::StoreWins))
        .collect();
    let mut staged = union(new_stores, restored);

    // Without an explicit store win, an existing file is not overwritten
    let missing = resources.missing_file_paths();
    let store_wins: HashSet<u64> = resources
        .tracked_rows()
        .iter()
        .filter(|row| row.resolve_conflict() == Some(ResolveConflict::StoreWins))
        .map(TrackedPath::id)
        .collect();
    staged.retain(|d| {
        d.tracked_id.is_some_and(|id| store_wins.contains(&id)) || missing.contains(&d.fs_path)
    });
    staged
}

fn fs_ahead<P: ResourceProvider + ?Sized>(resources: &P) -> Vec<PathDescriptor> {
    let fs_changed = resources.fs_changed();
    let xtle_changed = resources.xtle_changed_ids();
    let hashes = resources.file_hashes();
    let revisions = resources.xtle_revisions();

    resources
        .synced()
        .into_iter()
        .filter(|row| fs_changed.contains(&row.id()))
        .filter(|row| {
            !xtle_changed.contains(&row.id())
                || row.resolve_conflict() == Some(ResolveConflict::FsWins)
        })
        .filter(|row| !resources.store(row.xtle_path()).is_some_and(|s| s.obsolete))
        .filter(|row| hashes.contains_key(row.xtle_path()) && revisions.contains_key(row.xtle_path()))
        .map(descriptor)
        .collect()
}

fn xtle_ahead<P: ResourceProvider + ?Sized>(resources: &P, cache: &mut ChangeCache) -> Vec<PathDescriptor> {
    resources.xtle_changed()
        .into_iter()
        .filter(|row| {
            !cache.changes(resources, row).fs_changed
                || row.resolve_conflict() == Some(ResolveConflict::StoreWins)
        })
        .map(descriptor)
        .collect()
}

fn fs_removed<P: ResourceProvider + ?Sized>(resources: &P) -> Vec<PathDescriptor> {
    let xtle_changed = resources.xtle_changed_ids();
    resources
        .synced()
        .into_iter()
        .filter(|row| resources.is_missing(row.fs_path()))
        .filter(|row| row.resolve_conflict() != Some(ResolveConflict::StoreWins))
        .filter(|row| resources.live_store(row.xtle_path()).is_some())
        .filter(|row| !xtle_changed.contains(&row.id()))
        .map(descriptor)
        .collect()
}

fn xtle_removed<P: ResourceProvider + ?Sized>(resources: &P) -> Vec<PathDescriptor> {
    resources
        .synced()
        .into_iter()
        .filter(|row| row.resolve_conflict() != Some(ResolveConflict::FsWins))
        .filter(|row| !resources.is_missing(row.fs_path()))
        .filter(|row| store_gone(resources, row))
        .map(descriptor)
        .collect()
}

fn both_removed<P: ResourceProvider + ?Sized>(resources: &P) -> Vec<PathDescriptor> {
    resources
        .synced()
        .into_iter()
        .filter(|row| store_gone(resources, row))
        .filter(|row| resources.is_missing(row.fs_path()))
        .map(descriptor)
        .collect()
}
