//! Filesystem primitives for xtle-fs
//!
//! Everything that touches the translation tree on disk goes through this
//! crate: path normalization, content fingerprints, atomic writes and
//! format-aware loading of the small state files kept next to a project.

pub mod checksum;
pub mod config;
pub mod error;
pub mod io;
pub mod path;

pub use config::{ConfigStore, Format};
pub use error::{Error, Result};
pub use io::RobustnessConfig;
pub use path::{NormalizedPath, fs_relative, normalize_fs_path};
