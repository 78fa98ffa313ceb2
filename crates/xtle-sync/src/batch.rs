//! Coalesced store-update notifications
//!
//! Pulling one file can touch many units. Instead of announcing every unit
//! change, the executor opens a [`BatchScope`] per invocation; unit changes
//! accumulate in an [`Updated`] and a single [`SyncEvent::StoreUpdated`] is
//! queued when the scope ends, whether the invocation finished or bailed out
//! with an error.

use std::collections::BTreeSet;

use serde::Serialize;

/// Downstream work accumulated during one executor invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Updated {
    pub data: bool,
    /// Unit pks whose quality checks must be recomputed.
    pub checks: Option<BTreeSet<u64>>,
    /// Actors whose scores must be recomputed.
    pub scores: Option<BTreeSet<String>>,
    pub revisions: bool,
}

impl Updated {
    pub fn check_unit(&mut self, pk: u64) {
        self.checks.get_or_insert_with(BTreeSet::new).insert(pk);
        self.revisions = true;
    }

    pub fn score_user(&mut self, actor: &str) {
        self.scores
            .get_or_insert_with(BTreeSet::new)
            .insert(actor.to_string());
    }

    pub fn mark_data(&mut self) {
        self.data = true;
    }

    pub fn is_empty(&self) -> bool {
        !self.data && self.checks.is_none() && self.scores.is_none() && !self.revisions
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SyncEvent {
    /// A tracked path recorded a new watermark.
    Synced {
        xtle_path: String,
        last_sync_hash: String,
        last_sync_revision: u64,
    },
    /// Units of a store changed during one executor invocation.
    StoreUpdated {
        xtle_path: String,
        data: bool,
        checks: Vec<u64>,
        scores: Vec<String>,
        revisions: bool,
    },
}

/// Events waiting for downstream consumers.
#[derive(Debug, Default)]
pub struct EventQueue {
    events: Vec<SyncEvent>,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: SyncEvent) {
        self.events.push(event);
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SyncEvent> {
        self.events.iter()
    }

    /// Hand all queued events to the caller.
    pub fn drain(&mut self) -> Vec<SyncEvent> {
        std::mem::take(&mut self.events)
    }
}

/// Scope that flushes one coalesced `StoreUpdated` event on drop.
pub struct BatchScope<'q> {
    queue: &'q mut EventQueue,
    xtle_path: String,
    updated: Updated,
}

impl<'q> BatchScope<'q> {
    pub fn open(queue: &'q mut EventQueue, xtle_path: impl Into<String>) -> Self {
        Self {
            queue,
            xtle_path: xtle_path.into(),
            updated: Updated::default(),
        }
    }

    pub fn updated(&mut self) -> &mut Updated {
        &mut self.updated
    }

    /// Queue an event immediately, ahead of the flushed update.
    pub fn emit(&mut self, event: SyncEvent) {
        self.queue.push(event);
    }
}

impl Drop for BatchScope<'_> {
    fn drop(&mut self) {
        let updated = std::mem::take(&mut self.updated);
        if updated.is_empty() {
            return;
        }
        tracing::trace!(
            xtle_path = %self.xtle_path,
            checks = updated.checks.as_ref().map_or(0, |c| c.len()),
            "Flushing store update"
        );
        self.queue.push(SyncEvent::StoreUpdated {
            xtle_path: std::mem::take(&mut self.xtle_path),
            data: updated.data,
            checks: updated.checks.unwrap_or_default().into_iter().collect(),
            scores: updated.scores.unwrap_or_default().into_iter().collect(),
            revisions: updated.revisions,
        });
    }
}
