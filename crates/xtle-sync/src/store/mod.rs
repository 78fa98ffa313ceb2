//! Translation store interface
//!
//! The store is the authoritative side of a sync: a set of resources keyed by
//! xtle path, each holding units stamped with revisions from a shared
//! [`RevisionCounter`].

mod local;

pub use local::{LocalStore, StoreUnit};

use serde::Serialize;

use crate::batch::Updated;
use crate::format::TranslationFile;
use crate::revision::RevisionCounter;
use crate::tracked::ResolveConflict;
use crate::Result;

/// Snapshot of one store resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoreInfo {
    pub id: u64,
    pub xtle_path: String,
    pub obsolete: bool,
    /// Highest revision of any unit, `None` for a resource with no units.
    pub max_unit_revision: Option<u64>,
}

impl StoreInfo {
    pub fn is_live(&self) -> bool {
        !self.obsolete
    }
}

/// How an incoming file is merged into a store resource.
#[derive(Debug, Clone, Copy)]
pub struct UpdateOptions<'a> {
    /// Units whose revision is above this changed in the store since the
    /// file's content was last synced.
    pub revision: u64,
    pub resolve_conflict: ResolveConflict,
    /// Recorded as the author of every unit change.
    pub actor: &'a str,
}

/// What a store update did, by unit id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UpdateReport {
    pub added: Vec<String>,
    pub updated: Vec<String>,
    pub obsoleted: Vec<String>,
    /// Changed on both sides; resolved by the update's winner.
    pub conflicts: Vec<String>,
}

impl UpdateReport {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.updated.is_empty() && self.obsoleted.is_empty()
    }
}

pub trait TranslationStore {
    /// All resources, live and obsolete, ordered by xtle path.
    fn stores(&self) -> Vec<StoreInfo>;

    fn get(&self, xtle_path: &str) -> Option<StoreInfo>;

    fn create(&mut self, xtle_path: &str) -> Result<StoreInfo>;

    /// Bring an obsolete resource back to life.
    fn resurrect(&mut self, xtle_path: &str) -> Result<()>;

    fn make_obsolete(&mut self, xtle_path: &str) -> Result<()>;

    /// Live units of a resource, in store order.
    fn units(&self, xtle_path: &str) -> Result<TranslationFile>;

    /// Merge `file` into the resource and return its new max unit revision.
    ///
    /// Units touched by the update are recorded in `updated`.
    fn update(
        &mut self,
        xtle_path: &str,
        file: &TranslationFile,
        options: UpdateOptions<'_>,
        updated: &mut Updated,
    ) -> Result<(u64, UpdateReport)>;

    fn revision(&mut self) -> &mut dyn RevisionCounter;
}
