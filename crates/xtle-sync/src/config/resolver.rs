//! Configuration resolution with layered merge

use crate::mapping::PathMapping;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use xtle_files::NormalizedPath;

use super::CONFIG_DIR;
use super::manifest::Manifest;

const DEFAULT_FS_ROOT: &str = "translations";
const DEFAULT_MAPPING: &str = "/<language_code>/<filename>.<ext>";
const DEFAULT_ACTOR: &str = "system";

/// The effective configuration of a project after merging all layers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedConfig {
    pub project_code: String,
    pub fs_root: String,
    pub translation_mapping: String,
    pub actor: String,
}

impl ResolvedConfig {
    /// The compiled translation mapping.
    pub fn mapping(&self) -> Result<PathMapping> {
        PathMapping::new(&self.translation_mapping, &self.project_code)
    }
}

impl TryFrom<Manifest> for ResolvedConfig {
    type Error = Error;

    fn try_from(manifest: Manifest) -> Result<Self> {
        let project_code = manifest.project.code.ok_or_else(|| Error::Config {
            message: "project.code is not set".to_string(),
        })?;

        let translation_mapping = manifest
            .project
            .translation_mapping
            .unwrap_or_else(|| DEFAULT_MAPPING.to_string());
        PathMapping::new(&translation_mapping, &project_code)?;

        Ok(Self {
            project_code,
            fs_root: manifest
                .project
                .fs_root
                .unwrap_or_else(|| DEFAULT_FS_ROOT.to_string()),
            translation_mapping,
            actor: manifest
                .sync
                .actor
                .unwrap_or_else(|| DEFAULT_ACTOR.to_string()),
        })
    }
}

/// Resolves configuration by merging the global, project and local layers
pub struct ConfigResolver {
    root: NormalizedPath,

    /// Override for the global config directory (used for testing).
    /// When `None`, `dirs::config_dir()/xtle` is used.
    global_config_dir_override: Option<PathBuf>,
}

impl ConfigResolver {
    pub fn new(root: NormalizedPath) -> Self {
        Self {
            root,
            global_config_dir_override: None,
        }
    }

    /// Create a resolver with a custom global config directory.
    pub fn with_global_config_dir(root: NormalizedPath, global_config_dir: PathBuf) -> Self {
        Self {
            root,
            global_config_dir_override: Some(global_config_dir),
        }
    }

    fn global_config_dir(&self) -> Option<PathBuf> {
        if let Some(ref override_dir) = self.global_config_dir_override {
            return Some(override_dir.clone());
        }
        dirs::config_dir().map(|d| d.join("xtle"))
    }

    /// Merge every layer that exists into one manifest.
    ///
    /// Missing layers are skipped. Invalid TOML in any layer is an error.
    pub fn manifest(&self) -> Result<Manifest> {
        let mut manifest = Manifest::empty();

        if let Some(global_dir) = self.global_config_dir() {
            let global_config_path = global_dir.join("config.toml");
            if global_config_path.is_file() {
                tracing::debug!(?global_config_path, "Loading global config");
                let content = fs::read_to_string(&global_config_path)?;
                manifest.merge(&Manifest::parse(&content)?);
            }
        }

        for name in ["config.toml", "config.local.toml"] {
            let path = self.config_path(name);
            if path.is_file() {
                tracing::debug!(path = %path, "Loading project config");
                let content = fs::read_to_string(path.to_native())?;
                manifest.merge(&Manifest::parse(&content)?);
            }
        }

        Ok(manifest)
    }

    /// Resolve the configuration, filling defaults for unset keys.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if no layer sets `project.code`.
    pub fn resolve(&self) -> Result<ResolvedConfig> {
        ResolvedConfig::try_from(self.manifest()?)
    }

    pub fn root(&self) -> &NormalizedPath {
        &self.root
    }

    pub fn has_config(&self) -> bool {
        self.config_path("config.toml").is_file()
    }

    pub fn has_local_overrides(&self) -> bool {
        self.config_path("config.local.toml").is_file()
    }

    fn config_path(&self, name: &str) -> NormalizedPath {
        self.root.join(CONFIG_DIR).join(name)
    }
}
