//! xtle-fs CLI
//!
//! Stage and sync translation files against the xtle store.

mod cli;
mod commands;
mod error;

use clap::Parser;
use colored::Colorize;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use cli::{Cli, Commands};
use error::Result;

fn main() {
    if let Err(e) = run() {
        eprintln!("{}: {}", "error".red().bold(), e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Some(cmd) => execute_command(&cli.project, cmd),
        None => {
            println!("{} xtle filesystem sync", "xtle-fs".green().bold());
            println!();
            println!("Run {} for available commands.", "xtle-fs --help".cyan());
            Ok(())
        }
    }
}

/// Log to stderr, filtered by `XTLE_LOG` or `debug` when verbose.
fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_env("XTLE_LOG").unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(verbose)
        .with_writer(std::io::stderr)
        .finish();
    if tracing::subscriber::set_global_default(subscriber).is_ok() {
        tracing::debug!("Verbose mode enabled");
    }
}

fn execute_command(project: &std::path::Path, cmd: Commands) -> Result<()> {
    match cmd {
        Commands::Init {
            code,
            mapping,
            fs_root,
        } => commands::run_init(project, &code, mapping.as_deref(), fs_root.as_deref()),
        Commands::State { json, filter } => commands::run_state(project, &filter, json),
        Commands::Add { force, filter } => commands::run_add(project, &filter, force),
        Commands::Fetch { force, filter } => commands::run_fetch(project, &filter, force),
        Commands::Rm { force, filter } => commands::run_rm(project, &filter, force),
        Commands::Merge { store_wins, filter } => commands::run_merge(project, &filter, store_wins),
        Commands::Unstage { filter } => commands::run_unstage(project, &filter),
        Commands::Sync {
            dry_run,
            json,
            filter,
        } => commands::run_sync(project, &filter, dry_run, json),
    }
}
