//! Project configuration
//!
//! Configuration is loaded and merged from these sources (later sources
//! override earlier):
//!
//! 1. **Global defaults** - `<config_dir>/xtle/config.toml`
//! 2. **Project config** - `.xtle/config.toml`
//! 3. **Local overrides** - `.xtle/config.local.toml` (not committed)
//!
//! ```toml
//! [project]
//! code = "tutorial"
//! fs_root = "translations"
//! translation_mapping = "/<language_code>/<dir_path>/<filename>.<ext>"
//!
//! [sync]
//! actor = "system"
//! ```

mod manifest;
mod resolver;

pub use manifest::{Manifest, ProjectSection, SyncSection};
pub use resolver::{ConfigResolver, ResolvedConfig};

/// Directory holding project state and config, relative to the project root
pub const CONFIG_DIR: &str = ".xtle";
