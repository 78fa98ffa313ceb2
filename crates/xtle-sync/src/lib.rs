//! Reconciliation between translation files and the xtle store
//!
//! This crate decides, for every path a project knows about, whether the
//! translation file on disk and the store resource agree, and carries out
//! the sync when they do not:
//!
//! - **Tracked paths**: persistent associations with a sync watermark
//!   (`last_sync_hash`, `last_sync_revision`) and operator stagings
//! - **State classification**: a disjoint partition of all paths into
//!   [`StateCategory`] buckets
//! - **Sync execution**: pull (store from file) and push (file from store)
//!   for one path, plus a project-wide driver with staging operations
//!
//! # Architecture
//!
//! ```text
//!                      xtle-cli
//!                          |
//!      Project -----> FsEngine ------> SyncFile (pull / push)
//!                          |                |
//!                   StateClassifier    TranslationStore, FsFile
//!                          |
//!                  ResourceProvider
//!                          |
//!                      xtle-files
//! ```

pub mod batch;
pub mod config;
pub mod conflict;
pub mod error;
pub mod format;
pub mod mapping;
pub mod project;
pub mod resources;
pub mod revision;
pub mod state;
pub mod store;
pub mod sync;
pub mod tracked;

pub use batch::{BatchScope, EventQueue, SyncEvent, Updated};
pub use config::{ConfigResolver, Manifest, ResolvedConfig};
pub use error::{Error, Result};
pub use format::{TranslationFile, TranslationFormat, Unit};
pub use mapping::PathMapping;
pub use project::Project;
pub use resources::{ProjectResources, ResourceProvider};
pub use revision::{Revision, RevisionCounter};
pub use state::{PathDescriptor, ProjectState, StateCategory, StateClassifier, StateFilter};
pub use store::{LocalStore, StoreInfo, TranslationStore, UpdateOptions, UpdateReport};
pub use sync::{
    ActionOutcome, FsEngine, FsFile, PullOptions, SyncAction, SyncFile, SyncOptions, SyncReport,
    Syncer, UnitSyncer,
};
pub use tracked::{ResolveConflict, TrackedFilter, TrackedPath, TrackedPaths};
