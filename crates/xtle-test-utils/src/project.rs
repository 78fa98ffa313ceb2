//! [`TestProject`] builder for xtle-fs test scenarios.

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use walkdir::WalkDir;

use crate::translation::{json_units, parse_json_units};

/// A temporary project directory with helpers for writing config and
/// translation files and asserting on them.
///
/// Translation paths are given the way the sync crates report them: relative
/// to the translation root with a leading `/` (for example `/fr/app.json`).
///
/// # Example
///
/// ```rust,no_run
/// use xtle_test_utils::project::TestProject;
///
/// let project = TestProject::new();
/// project.write_config("tutorial", None);
/// project.write_translation("/fr/messages.json", &[("hello", "Hello", "Bonjour")]);
/// project.assert_file_exists("translations/fr/messages.json");
/// ```
pub struct TestProject {
    temp_dir: TempDir,
    fs_root: String,
}

impl Default for TestProject {
    fn default() -> Self {
        Self::new()
    }
}

impl TestProject {
    /// Create an empty temporary project using the default `translations`
    /// directory as translation root.
    pub fn new() -> Self {
        Self {
            temp_dir: TempDir::new().unwrap(),
            fs_root: "translations".to_string(),
        }
    }

    /// Copy a fixture project from `test-fixtures/projects/<name>` into a
    /// fresh temporary directory.
    ///
    /// The fixture's config is expected to use the default `translations`
    /// root.
    ///
    /// # Panics
    /// Panics if the fixture does not exist.
    pub fn from_fixture(name: &str) -> Self {
        let source = fixtures_dir().join(name);
        assert!(source.is_dir(), "No such fixture: {}", source.display());

        let project = Self::new();
        for entry in WalkDir::new(&source) {
            let entry = entry.unwrap();
            let relative = entry.path().strip_prefix(&source).unwrap();
            let target = project.root().join(relative);
            if entry.file_type().is_dir() {
                fs::create_dir_all(&target).unwrap();
            } else {
                fs::copy(entry.path(), &target).unwrap();
            }
        }
        project
    }

    /// Use a different translation root, relative to the project root.
    pub fn with_fs_root(mut self, fs_root: &str) -> Self {
        self.fs_root = fs_root.to_string();
        self
    }

    /// Return the root path of the temporary directory.
    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Return the translation root.
    pub fn fs_root(&self) -> PathBuf {
        self.root().join(&self.fs_root)
    }

    /// Write `.xtle/config.toml` with the project code, the translation
    /// root and, when given, a translation mapping.
    pub fn write_config(&self, project_code: &str, translation_mapping: Option<&str>) {
        let config_dir = self.root().join(".xtle");
        fs::create_dir_all(&config_dir).unwrap();

        let mut config = format!(
            "[project]\ncode = \"{project_code}\"\nfs_root = \"{}\"\n",
            self.fs_root
        );
        if let Some(mapping) = translation_mapping {
            config.push_str(&format!("translation_mapping = \"{mapping}\"\n"));
        }
        fs::write(config_dir.join("config.toml"), config).unwrap();
        fs::create_dir_all(self.fs_root()).unwrap();
    }

    /// Read a translation file as raw text.
    pub fn read_raw(&self, fs_path: &str) -> String {
        let path = self.translation_path(fs_path);
        fs::read_to_string(&path)
            .unwrap_or_else(|_| panic!("Could not read file: {}", path.display()))
    }

    /// Full path of a translation file.
    pub fn translation_path(&self, fs_path: &str) -> PathBuf {
        self.fs_root().join(fs_path.trim_start_matches('/'))
    }

    /// Write a JSON translation file with the given `(id, source, target)`
    /// units.
    pub fn write_translation(&self, fs_path: &str, units: &[(&str, &str, &str)]) {
        self.write_raw(fs_path, &json_units(units));
    }

    /// Write a translation file with arbitrary content.
    pub fn write_raw(&self, fs_path: &str, content: &str) {
        let path = self.translation_path(fs_path);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    /// Delete a translation file.
    ///
    /// # Panics
    /// Panics if the file does not exist.
    pub fn remove_translation(&self, fs_path: &str) {
        let path = self.translation_path(fs_path);
        fs::remove_file(&path)
            .unwrap_or_else(|e| panic!("Could not remove {}: {e}", path.display()));
    }

    /// Read a JSON translation file back as `(id, source, target)` triples.
    ///
    /// # Panics
    /// Panics if the file cannot be read or parsed.
    pub fn read_translation(&self, fs_path: &str) -> Vec<(String, String, String)> {
        let path = self.translation_path(fs_path);
        let content = fs::read_to_string(&path)
            .unwrap_or_else(|_| panic!("Could not read file: {}", path.display()));
        parse_json_units(&content)
    }

    /// Whether a translation file exists.
    pub fn has_translation(&self, fs_path: &str) -> bool {
        self.translation_path(fs_path).is_file()
    }

    /// Assert that `path` (relative to the project root) exists.
    ///
    /// # Panics
    /// Panics with a descriptive message if the path does not exist.
    pub fn assert_file_exists(&self, path: &str) {
        let full_path = self.root().join(path);
        assert!(
            full_path.exists(),
            "Expected file to exist: {}",
            full_path.display()
        );
    }

    /// Assert that `path` (relative to the project root) does **not** exist.
    ///
    /// # Panics
    /// Panics with a descriptive message if the path exists.
    pub fn assert_file_not_exists(&self, path: &str) {
        let full_path = self.root().join(path);
        assert!(
            !full_path.exists(),
            "Expected file NOT to exist: {}",
            full_path.display()
        );
    }
}

/// `test-fixtures/projects` at the workspace root.
fn fixtures_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../../test-fixtures/projects")
}
