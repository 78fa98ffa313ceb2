//! Writing store units into a file representation

use std::collections::HashMap;

use crate::format::{TranslationFile, Unit};

/// Counts of what a [`Syncer`] changed in the disk representation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncOutcome {
    pub updated: usize,
    pub added: usize,
    pub removed: usize,
}

impl SyncOutcome {
    pub fn is_empty(&self) -> bool {
        self.updated == 0 && self.added == 0 && self.removed == 0
    }
}

pub trait Syncer {
    /// Bring `disk` in line with the store's live units as of `last_revision`.
    fn sync(&self, disk: &mut TranslationFile, store_units: &TranslationFile, last_revision: u64) -> SyncOutcome;
}

/// Makes the file mirror the store.
///
/// Units already in the file keep their position; units the store dropped are
/// removed and new store units are appended in store order.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnitSyncer;

impl Syncer for UnitSyncer {
    fn sync(&self, disk: &mut TranslationFile, store_units: &TranslationFile, last_revision: u64) -> SyncOutcome {
        let mut outcome = SyncOutcome::default();
        let mut pending: HashMap<&str, &Unit> =
            store_units.units.iter().map(|u| (u.id.as_str(), u)).collect();

        disk.units.retain_mut(|unit| match pending.remove(unit.id.as_str()) {
            Some(store_unit) => {
                if *unit != *store_unit {
                    *unit = store_unit.clone();
                    outcome.updated += 1;
                }
                true
            }
            None => {
                outcome.removed += 1;
                false
            }
        });

        for unit in &store_units.units {
            if pending.remove(unit.id.as_str()).is_some() {
                disk.units.push(unit.clone());
                outcome.added += 1;
            }
        }

        tracing::trace!(
            last_revision,
            updated = outcome.updated,
            added = outcome.added,
            removed = outcome.removed,
            "Synced units to file"
        );
        outcome
    }
}
