//! State command implementation

use std::path::Path;

use colored::Colorize;
use xtle_sync::{ProjectState, StateCategory};

use super::{open_project, print_path};
use crate::cli::PathFilter;
use crate::error::Result;

/// Run the state command
///
/// Lists every path that differs between the files and the store. Unchanged
/// paths are only counted unless explicitly selected with `--state`.
pub fn run_state(path: &Path, filter: &PathFilter, json: bool) -> Result<()> {
    let project = open_project(path)?;
    let state = project.engine().state().filter(&filter.to_state_filter());

    if json {
        println!("{}", serde_json::to_string_pretty(&state)?);
        return Ok(());
    }

    print_state(&state, filter.states.contains(&StateCategory::Unchanged));
    Ok(())
}

fn print_state(state: &ProjectState, list_unchanged: bool) {
    if !state.has_changes() {
        println!("{} Everything is in sync.", "OK".green().bold());
    }

    for (category, descriptors) in state.iter() {
        if category == StateCategory::Unchanged && !list_unchanged {
            continue;
        }
        println!(
            "{} ({})",
            category.title().bold(),
            descriptors.len().to_string().cyan()
        );
        println!("   {}", category.description().dimmed());
        for descriptor in descriptors {
            print_path(category, descriptor);
        }
        println!();
    }

    let unchanged = state.get(StateCategory::Unchanged).len();
    if unchanged > 0 && !list_unchanged {
        println!("{} path(s) unchanged", unchanged.to_string().dimmed());
    }

    let pending = state
        .iter()
        .filter(|(category, _)| category.needs_action())
        .count();
    if pending > 0 {
        println!(
            "Use {}, {}, {} or {} to decide, then {}.",
            "add".cyan(),
            "fetch".cyan(),
            "rm".cyan(),
            "merge".cyan(),
            "sync".cyan()
        );
    }
}
