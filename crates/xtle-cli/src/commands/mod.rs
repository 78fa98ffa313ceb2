//! Command implementations for xtle-cli

pub mod init;
pub mod stage;
pub mod state;
pub mod sync;

pub use init::run_init;
pub use stage::{run_add, run_fetch, run_merge, run_rm, run_unstage};
pub use state::run_state;
pub use sync::run_sync;

use std::path::Path;

use colored::{ColoredString, Colorize};
use xtle_files::NormalizedPath;
use xtle_sync::{PathDescriptor, Project, StateCategory};

use crate::error::Result;

/// Open the project rooted at `path`.
pub(crate) fn open_project(path: &Path) -> Result<Project> {
    Ok(Project::open(NormalizedPath::canonical(path))?)
}

/// Marker printed before each path in a category listing.
pub(crate) fn marker(category: StateCategory) -> ColoredString {
    match category {
        StateCategory::Conflict | StateCategory::ConflictUntracked => "!".red().bold(),
        StateCategory::XtleRemoved | StateCategory::FsRemoved | StateCategory::BothRemoved => {
            "-".yellow()
        }
        StateCategory::XtleUntracked | StateCategory::FsUntracked => "?".yellow(),
        StateCategory::Remove => "x".red(),
        StateCategory::Unchanged => "=".dimmed(),
        _ => "+".green(),
    }
}

pub(crate) fn print_path(category: StateCategory, descriptor: &PathDescriptor) {
    println!(
        "   {} {} {} {}",
        marker(category),
        descriptor.fs_path.cyan(),
        "<->".dimmed(),
        descriptor.xtle_path
    );
}
