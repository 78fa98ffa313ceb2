//! File-backed translation store

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};
use xtle_files::{ConfigStore, NormalizedPath};

use super::{StoreInfo, TranslationStore, UpdateOptions, UpdateReport};
use crate::batch::Updated;
use crate::format::{TranslationFile, Unit};
use crate::revision::{Revision, RevisionCounter};
use crate::tracked::ResolveConflict;
use crate::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreUnit {
    pub pk: u64,
    pub id: String,
    pub source: String,
    pub target: String,
    pub revision: u64,
    #[serde(default)]
    pub obsolete: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub changed_by: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoreRecord {
    id: u64,
    obsolete: bool,
    units: Vec<StoreUnit>,
}

impl StoreRecord {
    fn max_unit_revision(&self) -> Option<u64> {
        self.units.iter().map(|u| u.revision).max()
    }

    fn info(&self, xtle_path: &str) -> StoreInfo {
        StoreInfo {
            id: self.id,
            xtle_path: xtle_path.to_string(),
            obsolete: self.obsolete,
            max_unit_revision: self.max_unit_revision(),
        }
    }
}

/// Store kept in a single JSON document under the project's `.xtle`
/// directory.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LocalStore {
    revision: Revision,
    #[serde(default)]
    next_store_id: u64,
    #[serde(default)]
    next_unit_pk: u64,
    #[serde(default)]
    stores: BTreeMap<String, StoreRecord>,
}

impl LocalStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the store, or start empty if the file does not exist yet.
    pub fn load(path: &NormalizedPath) -> Result<Self> {
        let store: Self = ConfigStore::new().load_or_default(path)?;
        tracing::debug!(path = %path, stores = store.stores.len(), "Loaded local store");
        Ok(store)
    }

    pub fn save(&self, path: &NormalizedPath) -> Result<()> {
        ConfigStore::new().save(path, self)?;
        Ok(())
    }

    /// All units of a resource, obsolete ones included.
    pub fn all_units(&self, xtle_path: &str) -> Result<&[StoreUnit]> {
        self.stores
            .get(xtle_path)
            .map(|r| r.units.as_slice())
            .ok_or_else(|| Error::StoreNotFound(xtle_path.to_string()))
    }

    pub fn unit(&self, xtle_path: &str, id: &str) -> Option<&StoreUnit> {
        self.stores
            .get(xtle_path)?
            .units
            .iter()
            .find(|u| u.id == id && !u.obsolete)
    }

    /// Edit one unit in the store, as a translator would.
    ///
    /// Creates the unit if it does not exist and stamps it with a fresh
    /// revision. Returns that revision.
    pub fn translate(&mut self, xtle_path: &str, id: &str, source: &str, target: &str, actor: &str) -> Result<u64> {
        let Self {
            revision,
            next_unit_pk,
            stores,
            ..
        } = self;
        let record = stores
            .get_mut(xtle_path)
            .ok_or_else(|| Error::StoreNotFound(xtle_path.to_string()))?;
        let stamp = revision.next();

        match record.units.iter_mut().find(|u| u.id == id) {
            Some(unit) => {
                unit.source = source.to_string();
                unit.target = target.to_string();
                unit.obsolete = false;
                unit.revision = stamp;
                unit.changed_by = Some(actor.to_string());
            }
            None => {
                *next_unit_pk += 1;
                record.units.push(StoreUnit {
                    pk: *next_unit_pk,
                    id: id.to_string(),
                    source: source.to_string(),
                    target: target.to_string(),
                    revision: stamp,
                    obsolete: false,
                    changed_by: Some(actor.to_string()),
                });
            }
        }
        Ok(stamp)
    }

    fn record_mut(&mut self, xtle_path: &str) -> Result<&mut StoreRecord> {
        self.stores
            .get_mut(xtle_path)
            .ok_or_else(|| Error::StoreNotFound(xtle_path.to_string()))
    }
}

impl TranslationStore for LocalStore {
    fn stores(&self) -> Vec<StoreInfo> {
        self.stores
            .iter()
            .map(|(xtle_path, record)| record.info(xtle_path))
            .collect()
    }

    fn get(&self, xtle_path: &str) -> Option<StoreInfo> {
        self.stores.get(xtle_path).map(|r| r.info(xtle_path))
    }

    fn create(&mut self, xtle_path: &str) -> Result<StoreInfo> {
        if let Some(existing) = self.stores.get(xtle_path) {
            return Ok(existing.info(xtle_path));
        }
        self.next_store_id += 1;
        let record = StoreRecord {
            id: self.next_store_id,
            obsolete: false,
            units: Vec::new(),
        };
        let info = record.info(xtle_path);
        self.stores.insert(xtle_path.to_string(), record);
        tracing::debug!(xtle_path, "Created store");
        Ok(info)
    }

    fn resurrect(&mut self, xtle_path: &str) -> Result<()> {
        let record = self.record_mut(xtle_path)?;
        if record.obsolete {
            record.obsolete = false;
            tracing::debug!(xtle_path, "Resurrected store");
        }
        Ok(())
    }

    fn make_obsolete(&mut self, xtle_path: &str) -> Result<()> {
        let record = self.record_mut(xtle_path)?;
        record.obsolete = true;
        tracing::debug!(xtle_path, "Marked store obsolete");
        Ok(())
    }

    fn units(&self, xtle_path: &str) -> Result<TranslationFile> {
        let units = self
            .all_units(xtle_path)?
            .iter()
            .filter(|u| !u.obsolete)
            .map(|u| Unit::new(&u.id, &u.source, &u.target))
            .collect();
        Ok(TranslationFile::new(units))
    }

    fn update(
        &mut self,
        xtle_path: &str,
        file: &TranslationFile,
        options: UpdateOptions<'_>,
        updated: &mut Updated,
    ) -> Result<(u64, UpdateReport)> {
        let Self {
            revision,
            next_unit_pk,
            stores,
            ..
        } = self;
        let record = stores
            .get_mut(xtle_path)
            .ok_or_else(|| Error::StoreNotFound(xtle_path.to_string()))?;
        let mut report = UpdateReport::default();
        let mut seen = HashSet::new();

        for incoming in &file.units {
            seen.insert(incoming.id.as_str());
            let Some(pos) = record.units.iter().position(|u| u.id == incoming.id) else {
                *next_unit_pk += 1;
                record.units.push(StoreUnit {
                    pk: *next_unit_pk,
                    id: incoming.id.clone(),
                    source: incoming.source.clone(),
                    target: incoming.target.clone(),
                    revision: revision.next(),
                    obsolete: false,
                    changed_by: Some(options.actor.to_string()),
                });
                updated.check_unit(*next_unit_pk);
                updated.score_user(options.actor);
                report.added.push(incoming.id.clone());
                continue;
            };
            let unit = &mut record.units[pos];

            if !unit.obsolete && unit.source == incoming.source && unit.target == incoming.target {
                continue;
            }
            if !unit.obsolete && unit.revision > options.revision {
                report.conflicts.push(incoming.id.clone());
                if options.resolve_conflict == ResolveConflict::StoreWins {
                    continue;
                }
            }

            unit.source = incoming.source.clone();
            unit.target = incoming.target.clone();
            unit.obsolete = false;
            unit.revision = revision.next();
            unit.changed_by = Some(options.actor.to_string());
            updated.check_unit(unit.pk);
            updated.score_user(options.actor);
            report.updated.push(incoming.id.clone());
        }

        for unit in record.units.iter_mut() {
            if unit.obsolete || seen.contains(unit.id.as_str()) {
                continue;
            }
            // Keep units the store changed since the file was last synced
            if unit.revision > options.revision {
                continue;
            }
            unit.obsolete = true;
            unit.revision = revision.next();
            updated.check_unit(unit.pk);
            report.obsoleted.push(unit.id.clone());
        }

        if !report.is_empty() {
            updated.mark_data();
        }
        let max_unit_revision = record.max_unit_revision().unwrap_or(0);
        tracing::debug!(
            xtle_path,
            added = report.added.len(),
            updated = report.updated.len(),
            obsoleted = report.obsoleted.len(),
            conflicts = report.conflicts.len(),
            "Updated store"
        );
        Ok((max_unit_revision, report))
    }

    fn revision(&mut self) -> &mut dyn RevisionCounter {
        &mut self.revision
    }
}
