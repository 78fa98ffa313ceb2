//! Sync execution
//!
//! - [`file`]: a translation file on disk
//! - [`syncer`]: writing store units into a file representation
//! - [`executor`]: pull and push for one tracked path
//! - [`engine`]: staging operations and the project-wide sync driver

pub mod engine;
pub mod executor;
pub mod file;
pub mod syncer;

pub use engine::{ActionOutcome, FsEngine, SyncAction, SyncOptions, SyncReport};
pub use executor::{PullOptions, SyncFile};
pub use file::FsFile;
pub use syncer::{SyncOutcome, Syncer, UnitSyncer};
