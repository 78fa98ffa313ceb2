//! Sync command implementation

use std::path::Path;

use colored::Colorize;
use xtle_sync::{ActionOutcome, SyncAction, SyncOptions};

use super::{marker, open_project};
use crate::cli::PathFilter;
use crate::error::{CliError, Result};

/// Run the sync command
///
/// Applies staged and one-sided changes, saves the project, and fails if any
/// path could not be synced.
pub fn run_sync(path: &Path, filter: &PathFilter, dry_run: bool, json: bool) -> Result<()> {
    let mut project = open_project(path)?;
    let report = project
        .engine_mut()
        .sync(&filter.to_state_filter(), SyncOptions { dry_run });

    if !dry_run {
        project.save()?;
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else if report.is_empty() {
        println!("{} Nothing to sync.", "OK".green().bold());
    } else {
        let heading = if dry_run { "Would sync" } else { "Syncing" };
        println!("{} {}:", "=>".blue().bold(), heading);
        for action in &report.actions {
            print_action(action);
        }
    }

    let failed = report.failures().count();
    if failed > 0 {
        return Err(CliError::user(format!(
            "{failed} path(s) failed to sync"
        )));
    }
    if !json && !report.is_empty() && !dry_run {
        println!("{} Synced {} path(s).", "OK".green().bold(), report.actions.len());
    }
    Ok(())
}

fn print_action(action: &SyncAction) {
    let outcome = match &action.outcome {
        ActionOutcome::Planned => action.category.as_str().dimmed().to_string(),
        ActionOutcome::Unchanged => "unchanged".dimmed().to_string(),
        ActionOutcome::Pulled { revision } => format!("pulled (revision {revision})"),
        ActionOutcome::Pushed { revision } => format!("pushed (revision {revision})"),
        ActionOutcome::Merged { revision } => format!("merged (revision {revision})"),
        ActionOutcome::Removed => "removed".to_string(),
        ActionOutcome::Dropped => "dropped".to_string(),
        ActionOutcome::Failed { error, transient } => {
            let kind = if *transient { "failed, retry later" } else { "failed" };
            format!("{}: {}", kind.red().bold(), error)
        }
    };
    println!(
        "   {} {} {} {}",
        marker(action.category),
        action.fs_path.cyan(),
        action.xtle_path.dimmed(),
        outcome
    );
}
