//! CLI argument parsing using clap derive

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use xtle_sync::{StateCategory, StateFilter};

/// xtle-fs - Keep translation files and the xtle store in sync
#[derive(Parser, Debug)]
#[command(name = "xtle-fs")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Project root directory
    #[arg(short = 'C', long, global = true, env = "XTLE_PROJECT", default_value = ".")]
    pub project: PathBuf,

    /// The command to run
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Path and state selection shared by the state and staging commands
#[derive(Args, Debug, Clone, Default, PartialEq, Eq)]
pub struct PathFilter {
    /// Only paths with this file path (repeatable)
    #[arg(short = 'p', long = "fs-path")]
    pub fs_paths: Vec<String>,

    /// Only paths with this xtle path (repeatable)
    #[arg(short = 'P', long = "xtle-path")]
    pub xtle_paths: Vec<String>,

    /// Only paths in this state, e.g. fs_ahead (repeatable)
    #[arg(short, long = "state", value_parser = parse_state)]
    pub states: Vec<StateCategory>,
}

impl PathFilter {
    pub fn to_state_filter(&self) -> StateFilter {
        StateFilter {
            fs_paths: self.fs_paths.clone(),
            xtle_paths: self.xtle_paths.clone(),
            states: self.states.clone(),
        }
    }
}

fn parse_state(value: &str) -> Result<StateCategory, String> {
    value.parse().map_err(|e: xtle_sync::Error| e.to_string())
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Initialize a project
    ///
    /// Creates a .xtle/ directory with config.toml.
    ///
    /// Examples:
    ///   xtle-fs init tutorial
    ///   xtle-fs init tutorial --mapping "/<language_code>/<dir_path>/<filename>.<ext>"
    Init {
        /// Project code used in xtle paths
        code: String,

        /// Translation mapping template
        #[arg(short, long)]
        mapping: Option<String>,

        /// Directory holding the translation files, relative to the project
        #[arg(long)]
        fs_root: Option<String>,
    },

    /// Show how files and store resources differ
    State {
        /// Output as JSON for scripting
        #[arg(long)]
        json: bool,

        #[command(flatten)]
        filter: PathFilter,
    },

    /// Stage store resources to be written to the filesystem
    Add {
        /// Also resolve conflicts in favour of the store
        #[arg(short, long)]
        force: bool,

        #[command(flatten)]
        filter: PathFilter,
    },

    /// Stage files to be loaded into the store
    Fetch {
        /// Also resolve conflicts in favour of the files
        #[arg(short, long)]
        force: bool,

        #[command(flatten)]
        filter: PathFilter,
    },

    /// Stage paths for removal from both the filesystem and the store
    Rm {
        /// Also stage untracked paths
        #[arg(short, long)]
        force: bool,

        #[command(flatten)]
        filter: PathFilter,
    },

    /// Stage conflicting paths for a unit-level merge
    Merge {
        /// Store units win where both sides changed (default: files win)
        #[arg(long, visible_alias = "xtle-wins")]
        store_wins: bool,

        #[command(flatten)]
        filter: PathFilter,
    },

    /// Clear staging decisions
    Unstage {
        #[command(flatten)]
        filter: PathFilter,
    },

    /// Carry out staged and one-sided changes
    Sync {
        /// Preview changes without applying them
        #[arg(long)]
        dry_run: bool,

        /// Output as JSON for CI/CD integration
        #[arg(long)]
        json: bool,

        #[command(flatten)]
        filter: PathFilter,
    },
}
