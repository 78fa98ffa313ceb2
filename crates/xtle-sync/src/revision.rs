//! Global revision counter
//!
//! Every unit change in the store is stamped with a value from the counter.
//! Values only ever increase, which is what lets a sync watermark compare
//! "store revision now" against "store revision at last sync".

use serde::{Deserialize, Serialize};

pub trait RevisionCounter {
    /// The most recently issued value (0 before anything was issued).
    fn get(&self) -> u64;

    /// Issue the next value.
    fn next(&mut self) -> u64;
}

/// Counter persisted as part of the local store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Revision {
    value: u64,
}

impl RevisionCounter for Revision {
    fn get(&self) -> u64 {
        self.value
    }

    fn next(&mut self) -> u64 {
        self.value += 1;
        self.value
    }
}
