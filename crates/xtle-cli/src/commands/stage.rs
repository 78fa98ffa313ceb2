//! Staging commands: add, fetch, rm, merge and unstage
//!
//! Each command records its decision in the tracked-path ledger and saves
//! the project. Nothing is synced until `xtle-fs sync`.

use std::path::Path;

use colored::Colorize;
use xtle_sync::{Project, ProjectState};

use super::{open_project, print_path};
use crate::cli::PathFilter;
use crate::error::Result;

pub fn run_add(path: &Path, filter: &PathFilter, force: bool) -> Result<()> {
    stage(path, "Staged to add", |project| {
        project.engine_mut().add(&filter.to_state_filter(), force)
    })
}

pub fn run_fetch(path: &Path, filter: &PathFilter, force: bool) -> Result<()> {
    stage(path, "Staged to fetch", |project| {
        project.engine_mut().fetch(&filter.to_state_filter(), force)
    })
}

pub fn run_rm(path: &Path, filter: &PathFilter, force: bool) -> Result<()> {
    stage(path, "Staged for removal", |project| {
        project.engine_mut().rm(&filter.to_state_filter(), force)
    })
}

pub fn run_merge(path: &Path, filter: &PathFilter, store_wins: bool) -> Result<()> {
    let label = if store_wins {
        "Staged for merge, store wins"
    } else {
        "Staged for merge, files win"
    };
    stage(path, label, |project| {
        project.engine_mut().merge(&filter.to_state_filter(), store_wins)
    })
}

pub fn run_unstage(path: &Path, filter: &PathFilter) -> Result<()> {
    stage(path, "Unstaged", |project| {
        project.engine_mut().unstage(&filter.to_state_filter())
    })
}

fn stage<F>(path: &Path, label: &str, op: F) -> Result<()>
where
    F: FnOnce(&mut Project) -> xtle_sync::Result<ProjectState>,
{
    let mut project = open_project(path)?;
    let staged = op(&mut project)?;

    if staged.is_empty() {
        println!("{} Nothing to stage.", "=>".blue().bold());
        return Ok(());
    }

    project.save()?;
    println!(
        "{} {} {} path(s):",
        "OK".green().bold(),
        label,
        staged.len()
    );
    for (category, descriptors) in staged.iter() {
        for descriptor in descriptors {
            print_path(category, descriptor);
        }
    }
    Ok(())
}
