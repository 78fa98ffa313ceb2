//! Translation mapping between file paths and xtle paths
//!
//! A mapping is a template such as `/<language_code>/<dir_path>/<filename>.<ext>`
//! relative to the project's filesystem root. Every file matching the
//! template corresponds to exactly one xtle path of the form
//! `/<language_code>/<project_code>/<dir_path>/<filename>.<ext>`.

use regex::Regex;

use crate::format::SUPPORTED_EXTENSIONS;
use crate::{Error, Result};

const LANGUAGE_CODE: &str = "<language_code>";
const DIR_PATH: &str = "<dir_path>";
const FILENAME: &str = "<filename>";
const EXT: &str = "<ext>";

#[derive(Debug, Clone)]
pub struct PathMapping {
    template: String,
    project_code: String,
    regex: Regex,
}

impl PathMapping {
    /// Compile a mapping template for a project.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidMapping`] if the template is not absolute, lacks
    /// `<language_code>` or does not end in `<filename>.<ext>`.
    pub fn new(template: &str, project_code: &str) -> Result<Self> {
        let invalid = |reason: &str| Error::InvalidMapping {
            mapping: template.to_string(),
            reason: reason.to_string(),
        };

        if !template.starts_with('/') {
            return Err(invalid("must start with '/'"));
        }
        if !template.contains(LANGUAGE_CODE) {
            return Err(invalid("must contain <language_code>"));
        }
        if !template.ends_with(&format!("{FILENAME}.{EXT}")) {
            return Err(invalid("must end with <filename>.<ext>"));
        }
        if template.contains(DIR_PATH) && !template.contains(&format!("{DIR_PATH}/")) {
            return Err(invalid("<dir_path> must be followed by '/'"));
        }
        if project_code.is_empty() || project_code.contains('/') {
            return Err(invalid("project code must be a single path segment"));
        }

        let pattern = regex::escape(template)
            .replace(&format!("{DIR_PATH}/"), "(?:(?P<dir_path>.+)/)?")
            .replace(LANGUAGE_CODE, "(?P<language_code>[^/]+)")
            .replace(FILENAME, "(?P<filename>[^/]+?)")
            .replace(EXT, &format!("(?P<ext>{})", SUPPORTED_EXTENSIONS.join("|")));
        let regex = Regex::new(&format!("^{pattern}$")).map_err(|e| invalid(&e.to_string()))?;

        Ok(Self {
            template: template.to_string(),
            project_code: project_code.to_string(),
            regex,
        })
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    pub fn project_code(&self) -> &str {
        &self.project_code
    }

    /// The xtle path for a file, or `None` if the file does not match.
    pub fn xtle_path_for(&self, fs_path: &str) -> Option<String> {
        let caps = self.regex.captures(fs_path)?;
        let language_code = caps.name("language_code")?.as_str();
        let filename = caps.name("filename")?.as_str();
        let ext = caps.name("ext")?.as_str();
        let dir_path = caps
            .name("dir_path")
            .map(|m| format!("{}/", m.as_str()))
            .unwrap_or_default();

        Some(format!(
            "/{language_code}/{}/{dir_path}{filename}.{ext}",
            self.project_code
        ))
    }

    /// The file path for an xtle path, or `None` if it belongs to another
    /// project or cannot be expressed by the template.
    pub fn fs_path_for(&self, xtle_path: &str) -> Option<String> {
        let rest = xtle_path.strip_prefix('/')?;
        let (language_code, rest) = rest.split_once('/')?;
        let (project_code, rest) = rest.split_once('/')?;
        if project_code != self.project_code || language_code.is_empty() {
            return None;
        }

        let (dir_path, file_name) = match rest.rsplit_once('/') {
            Some((dir, name)) => (dir, name),
            None => ("", rest),
        };
        let (filename, ext) = file_name.rsplit_once('.')?;
        if filename.is_empty() || !SUPPORTED_EXTENSIONS.contains(&ext) {
            return None;
        }
        if !dir_path.is_empty() && !self.template.contains(DIR_PATH) {
            return None;
        }

        let dir_segment = if dir_path.is_empty() {
            String::new()
        } else {
            format!("{dir_path}/")
        };
        let fs_path = self
            .template
            .replace(&format!("{DIR_PATH}/"), &dir_segment)
            .replace(LANGUAGE_CODE, language_code)
            .replace(FILENAME, filename)
            .replace(EXT, ext);

        // Round-trip guard: the rendered path must map back to the same
        // xtle path.
        (self.xtle_path_for(&fs_path).as_deref() == Some(xtle_path)).then_some(fs_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case("/<language_code>/<filename>.<ext>", "/fr/messages.json", Some("/fr/tutorial/messages.json"))]
    #[case("/<language_code>/<filename>.<ext>", "/fr/app/messages.json", None)]
    #[case("/<language_code>/<filename>.<ext>", "/fr/messages.po", None)]
    #[case("/<language_code>/<dir_path>/<filename>.<ext>", "/fr/app/ui/messages.toml", Some("/fr/tutorial/app/ui/messages.toml"))]
    #[case("/<language_code>/<dir_path>/<filename>.<ext>", "/fr/messages.json", Some("/fr/tutorial/messages.json"))]
    #[case("/locale/<language_code>/<filename>.<ext>", "/locale/pt_BR/messages.en.json", Some("/pt_BR/tutorial/messages.en.json"))]
    #[case("/locale/<language_code>/<filename>.<ext>", "/other/pt_BR/messages.json", None)]
    fn maps_fs_paths(#[case] template: &str, #[case] fs_path: &str, #[case] expected: Option<&str>) {
        let mapping = PathMapping::new(template, "tutorial").unwrap();
        assert_eq!(mapping.xtle_path_for(fs_path).as_deref(), expected);
    }

    #[rstest]
    #[case("/<language_code>/<filename>.<ext>", "/fr/tutorial/messages.json", Some("/fr/messages.json"))]
    #[case("/<language_code>/<filename>.<ext>", "/fr/tutorial/app/messages.json", None)]
    #[case("/<language_code>/<filename>.<ext>", "/fr/other/messages.json", None)]
    #[case("/<language_code>/<dir_path>/<filename>.<ext>", "/fr/tutorial/app/messages.json", Some("/fr/app/messages.json"))]
    #[case("/<language_code>/<dir_path>/<filename>.<ext>", "/fr/tutorial/messages.json", Some("/fr/messages.json"))]
    #[case("/<language_code>/<filename>.<ext>", "/fr/tutorial/messages.po", None)]
    fn maps_xtle_paths(#[case] template: &str, #[case] xtle_path: &str, #[case] expected: Option<&str>) {
        let mapping = PathMapping::new(template, "tutorial").unwrap();
        assert_eq!(mapping.fs_path_for(xtle_path).as_deref(), expected);
    }

    #[rstest]
    #[case("<language_code>/<filename>.<ext>")]
    #[case("/<filename>.<ext>")]
    #[case("/<language_code>/<filename>.po")]
    #[case("/<language_code>/<dir_path><filename>.<ext>")]
    fn rejects_bad_templates(#[case] template: &str) {
        assert!(matches!(
            PathMapping::new(template, "tutorial"),
            Err(Error::InvalidMapping { .. })
        ));
    }

    #[test]
    fn literal_dots_are_not_wildcards() {
        let mapping = PathMapping::new("/l10n.d/<language_code>/<filename>.<ext>", "tutorial").unwrap();
        assert!(mapping.xtle_path_for("/l10nXd/fr/messages.json").is_none());
        assert!(mapping.xtle_path_for("/l10n.d/fr/messages.json").is_some());
    }
}
