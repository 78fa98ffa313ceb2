//! Manifest parsing for config.toml files

use crate::Result;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,

    /// Directory holding the translation files, relative to the project root
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fs_root: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub translation_mapping: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncSection {
    /// Recorded as the author of store changes made by a pull
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actor: Option<String>,
}

/// One parsed config.toml layer. Unset keys fall through to earlier layers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    #[serde(default)]
    pub project: ProjectSection,

    #[serde(default)]
    pub sync: SyncSection,
}

impl Manifest {
    /// Parse a manifest from TOML content
    ///
    /// # Example
    ///
    /// ```
    /// use xtle_sync::config::Manifest;
    ///
    /// let manifest = Manifest::parse(r#"
    /// [project]
    /// code = "tutorial"
    /// "#).unwrap();
    ///
    /// assert_eq!(manifest.project.code.as_deref(), Some("tutorial"));
    /// ```
    pub fn parse(content: &str) -> Result<Self> {
        let manifest: Manifest = toml::from_str(content)?;
        Ok(manifest)
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Merge another manifest into this one; set keys in `other` win.
    pub fn merge(&mut self, other: &Manifest) {
        fn overlay(base: &mut Option<String>, other: &Option<String>) {
            if other.is_some() {
                base.clone_from(other);
            }
        }

        overlay(&mut self.project.code, &other.project.code);
        overlay(&mut self.project.fs_root, &other.project.fs_root);
        overlay(
            &mut self.project.translation_mapping,
            &other.project.translation_mapping,
        );
        overlay(&mut self.sync.actor, &other.sync.actor);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn empty_toml_parses() {
        assert_eq!(Manifest::parse("").unwrap(), Manifest::empty());
    }

    #[test]
    fn merge_overrides_only_set_keys() {
        let mut base = Manifest::parse(
            r#"
[project]
code = "tutorial"
fs_root = "translations"

[sync]
actor = "bot"
"#,
        )
        .unwrap();
        let local = Manifest::parse(
            r#"
[project]
fs_root = "locale"
"#,
        )
        .unwrap();

        base.merge(&local);

        assert_eq!(base.project.code.as_deref(), Some("tutorial"));
        assert_eq!(base.project.fs_root.as_deref(), Some("locale"));
        assert_eq!(base.sync.actor.as_deref(), Some("bot"));
    }

    #[test]
    fn unknown_sections_are_ignored() {
        let manifest = Manifest::parse("[unrelated]\nkey = 1\n").unwrap();
        assert_eq!(manifest, Manifest::empty());
    }

    #[test]
    fn serializes_without_unset_keys() {
        let mut manifest = Manifest::empty();
        manifest.project.code = Some("tutorial".into());
        let text = manifest.to_toml().unwrap();
        assert!(text.contains("code = \"tutorial\""));
        assert!(!text.contains("fs_root"));
    }
}
