//! A project on disk
//!
//! Ties the resolved configuration, the tracked-path ledger
//! (`.xtle/tracked.toml`) and the local store (`.xtle/store.json`) to an
//! [`FsEngine`]. Nothing is written back until [`Project::save`].

use std::fs;

use xtle_files::{NormalizedPath, io};

use crate::config::{CONFIG_DIR, ConfigResolver, Manifest, ProjectSection};
use crate::mapping::PathMapping;
use crate::store::LocalStore;
use crate::sync::FsEngine;
use crate::tracked::TrackedPaths;
use crate::{Error, Result};

const TRACKED_FILE: &str = "tracked.toml";
const STORE_FILE: &str = "store.json";

pub struct Project {
    root: NormalizedPath,
    engine: FsEngine<LocalStore>,
}

impl Project {
    /// Open the project rooted at `root`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the project has no configuration or the
    /// configuration is incomplete.
    pub fn open(root: NormalizedPath) -> Result<Self> {
        Self::open_with(ConfigResolver::new(root))
    }

    /// Open a project through an explicit resolver.
    pub fn open_with(resolver: ConfigResolver) -> Result<Self> {
        let root = resolver.root().clone();
        if !resolver.has_config() {
            return Err(Error::Config {
                message: format!("no {CONFIG_DIR}/config.toml under {root}; run init first"),
            });
        }

        let config = resolver.resolve()?;
        let fs_root = root.join(&config.fs_root);
        let tracked = TrackedPaths::load_or_new(&Self::tracked_path(&root).to_native())?;
        let store = LocalStore::load(&Self::store_path(&root))?;

        tracing::debug!(
            root = %root,
            project = %config.project_code,
            tracked = tracked.len(),
            "Opened project"
        );
        let engine = FsEngine::new(config, fs_root, tracked, store)?;
        Ok(Self { root, engine })
    }

    /// Write a project config under `root` and open the project.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the project is already initialized and
    /// [`Error::InvalidMapping`] if `translation_mapping` is invalid.
    pub fn init(
        root: NormalizedPath,
        project_code: &str,
        translation_mapping: Option<&str>,
        fs_root: Option<&str>,
    ) -> Result<Self> {
        let resolver = ConfigResolver::new(root.clone());
        if resolver.has_config() {
            return Err(Error::Config {
                message: format!("{root} is already an xtle project"),
            });
        }
        if let Some(mapping) = translation_mapping {
            PathMapping::new(mapping, project_code)?;
        }

        let manifest = Manifest {
            project: ProjectSection {
                code: Some(project_code.to_string()),
                fs_root: fs_root.map(str::to_string),
                translation_mapping: translation_mapping.map(str::to_string),
            },
            ..Manifest::empty()
        };

        let config_dir = root.join(CONFIG_DIR);
        io::ensure_dir(&config_dir)?;
        fs::write(config_dir.join("config.toml").to_native(), manifest.to_toml()?)?;
        tracing::info!(root = %root, project = project_code, "Initialized project");

        let project = Self::open_with(resolver)?;
        io::ensure_dir(project.engine.fs_root())?;
        Ok(project)
    }

    pub fn tracked_path(root: &NormalizedPath) -> NormalizedPath {
        root.join(CONFIG_DIR).join(TRACKED_FILE)
    }

    pub fn store_path(root: &NormalizedPath) -> NormalizedPath {
        root.join(CONFIG_DIR).join(STORE_FILE)
    }

    pub fn root(&self) -> &NormalizedPath {
        &self.root
    }

    pub fn engine(&self) -> &FsEngine<LocalStore> {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut FsEngine<LocalStore> {
        &mut self.engine
    }

    /// Persist the ledger and the store.
    pub fn save(&self) -> Result<()> {
        self.engine
            .tracked()
            .save(&Self::tracked_path(&self.root).to_native())?;
        self.engine.store().save(&Self::store_path(&self.root))?;
        tracing::debug!(root = %self.root, "Saved project");
        Ok(())
    }
}
