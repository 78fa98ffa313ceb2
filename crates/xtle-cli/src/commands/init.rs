//! Init command implementation

use std::path::Path;

use colored::Colorize;
use xtle_files::NormalizedPath;
use xtle_sync::Project;

use crate::error::Result;

/// Run the init command
///
/// Writes `.xtle/config.toml` and creates the translation directory.
pub fn run_init(
    path: &Path,
    code: &str,
    mapping: Option<&str>,
    fs_root: Option<&str>,
) -> Result<()> {
    println!(
        "{} Initializing project {}...",
        "=>".blue().bold(),
        code.cyan()
    );

    let project = Project::init(NormalizedPath::canonical(path), code, mapping, fs_root)?;
    let config = project.engine().config();
    println!("   Translations: {}", config.fs_root.yellow());
    println!("   Mapping: {}", config.translation_mapping.yellow());

    println!("{} Project initialized!", "OK".green().bold());
    Ok(())
}
