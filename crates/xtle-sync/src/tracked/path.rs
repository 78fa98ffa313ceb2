//! A single tracked association between a store resource and a file

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::{Error, Result};

/// Which side wins when both sides changed since the last sync.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolveConflict {
    FsWins,
    StoreWins,
}

impl ResolveConflict {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FsWins => "fs_wins",
            Self::StoreWins => "store_wins",
        }
    }

    /// The winner for a `--xtle-wins` style flag.
    pub fn from_store_wins(store_wins: bool) -> Self {
        if store_wins {
            Self::StoreWins
        } else {
            Self::FsWins
        }
    }
}

impl fmt::Display for ResolveConflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResolveConflict {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "fs_wins" => Ok(Self::FsWins),
            "store_wins" => Ok(Self::StoreWins),
            other => Err(Error::integrity(format!(
                "unknown conflict resolution '{other}'"
            ))),
        }
    }
}

/// Legacy numeric codes: 1 = store wins, 2 = filesystem wins.
impl TryFrom<i64> for ResolveConflict {
    type Error = Error;

    fn try_from(value: i64) -> Result<Self> {
        match value {
            1 => Ok(Self::StoreWins),
            2 => Ok(Self::FsWins),
            other => Err(Error::integrity(format!(
                "conflict resolution code {other} is out of range"
            ))),
        }
    }
}

/// Read a winner stored either by name or by its legacy numeric code.
fn deserialize_resolve_conflict<'de, D>(
    deserializer: D,
) -> std::result::Result<Option<ResolveConflict>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Code(i64),
        Name(String),
    }

    Option::<Raw>::deserialize(deserializer)?
        .map(|raw| match raw {
            Raw::Code(code) => ResolveConflict::try_from(code),
            Raw::Name(name) => name.parse(),
        })
        .transpose()
        .map_err(serde::de::Error::custom)
}

/// Persistent link between a store resource and a file on disk.
///
/// The sync watermark (`last_sync_hash`, `last_sync_revision`) is either fully
/// absent (never synced) or fully present; [`TrackedPath::on_sync`] is the
/// only way to set it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackedPath {
    id: u64,
    xtle_path: String,
    fs_path: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    last_sync_hash: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    last_sync_revision: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    last_synced_at: Option<DateTime<Utc>>,

    #[serde(
        default,
        deserialize_with = "deserialize_resolve_conflict",
        skip_serializing_if = "Option::is_none"
    )]
    resolve_conflict: Option<ResolveConflict>,

    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    staged_for_merge: bool,

    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    staged_for_removal: bool,
}

impl TrackedPath {
    pub(crate) fn new(id: u64, xtle_path: impl Into<String>, fs_path: impl Into<String>) -> Self {
        Self {
            id,
            xtle_path: xtle_path.into(),
            fs_path: fs_path.into(),
            last_sync_hash: None,
            last_sync_revision: None,
            last_synced_at: None,
            resolve_conflict: None,
            staged_for_merge: false,
            staged_for_removal: false,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn xtle_path(&self) -> &str {
        &self.xtle_path
    }

    pub fn fs_path(&self) -> &str {
        &self.fs_path
    }

    pub fn last_sync_hash(&self) -> Option<&str> {
        self.last_sync_hash.as_deref()
    }

    pub fn last_sync_revision(&self) -> Option<u64> {
        self.last_sync_revision
    }

    pub fn last_synced_at(&self) -> Option<DateTime<Utc>> {
        self.last_synced_at
    }

    pub fn resolve_conflict(&self) -> Option<ResolveConflict> {
        self.resolve_conflict
    }

    pub fn staged_for_merge(&self) -> bool {
        self.staged_for_merge
    }

    pub fn staged_for_removal(&self) -> bool {
        self.staged_for_removal
    }

    /// Both halves of the watermark are set.
    pub fn is_synced(&self) -> bool {
        self.last_sync_hash.is_some() && self.last_sync_revision.is_some()
    }

    /// Neither half of the watermark is set.
    pub fn is_unsynced(&self) -> bool {
        self.last_sync_hash.is_none() && self.last_sync_revision.is_none()
    }

    /// Whether any override or staging flag is set.
    pub fn is_staged(&self) -> bool {
        self.resolve_conflict.is_some() || self.staged_for_merge || self.staged_for_removal
    }

    /// Record a completed sync.
    ///
    /// Sets both watermark halves together and clears the conflict override
    /// and merge staging, which only apply to the sync that just finished.
    pub fn on_sync(&mut self, last_sync_hash: impl Into<String>, last_sync_revision: u64) {
        self.last_sync_hash = Some(last_sync_hash.into());
        self.last_sync_revision = Some(last_sync_revision);
        self.last_synced_at = Some(Utc::now());
        self.resolve_conflict = None;
        self.staged_for_merge = false;
    }

    /// Set or clear the explicit conflict override.
    ///
    /// Rejected when it would contradict a pending merge.
    pub fn set_resolve_conflict(&mut self, resolve_conflict: Option<ResolveConflict>) -> Result<()> {
        if self.staged_for_merge && resolve_conflict != self.resolve_conflict {
            return Err(Error::integrity(format!(
                "{} is staged for merge; unstage it before changing the winner",
                self.xtle_path
            )));
        }
        self.resolve_conflict = resolve_conflict;
        Ok(())
    }

    /// Stage a merge with the given winner.
    pub fn stage_for_merge(&mut self, winner: ResolveConflict) -> Result<()> {
        if self.staged_for_merge && self.resolve_conflict != Some(winner) {
            return Err(Error::integrity(format!(
                "{} is already staged for merge with {}",
                self.xtle_path,
                self.resolve_conflict.map(|r| r.as_str()).unwrap_or("no winner")
            )));
        }
        self.resolve_conflict = Some(winner);
        self.staged_for_merge = true;
        Ok(())
    }

    pub fn stage_for_removal(&mut self) {
        self.staged_for_removal = true;
    }

    /// Drop any override and staging flags.
    pub fn unstage(&mut self) {
        self.resolve_conflict = None;
        self.staged_for_merge = false;
        self.staged_for_removal = false;
    }

    /// Check the invariants a deserialized row may have broken.
    pub(crate) fn validate(&self) -> Result<()> {
        if self.last_sync_hash.is_some() != self.last_sync_revision.is_some() {
            return Err(Error::integrity(format!(
                "{} has a partial sync watermark",
                self.xtle_path
            )));
        }
        if self.staged_for_merge && self.resolve_conflict.is_none() {
            return Err(Error::integrity(format!(
                "{} is staged for merge without a winner",
                self.xtle_path
            )));
        }
        Ok(())
    }
}
