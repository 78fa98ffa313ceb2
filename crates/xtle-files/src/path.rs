//! Normalized path handling for the translation tree
//!
//! Filesystem paths of tracked translation files are stored relative to the
//! project's translation root, always with forward slashes and a leading `/`
//! (for example `/fr/app/messages.json`). Native paths only appear at the I/O
//! boundary.

use std::path::{Path, PathBuf};

use crate::{Error, Result};

/// A path normalized to use forward slashes internally.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NormalizedPath {
    inner: String,
}

impl NormalizedPath {
    /// Create a new NormalizedPath from any path-like input.
    pub fn new(path: impl AsRef<Path>) -> Self {
        let path_str = path.as_ref().to_string_lossy();
        Self {
            inner: path_str.replace('\\', "/"),
        }
    }

    /// Canonicalize an existing directory, falling back to the path as given.
    ///
    /// Uses `dunce` so Windows paths don't pick up the `\\?\` prefix.
    pub fn canonical(path: impl AsRef<Path>) -> Self {
        match dunce::canonicalize(path.as_ref()) {
            Ok(resolved) => Self::new(resolved),
            Err(_) => Self::new(path),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.inner
    }

    /// Convert to a platform-native PathBuf for I/O operations.
    pub fn to_native(&self) -> PathBuf {
        PathBuf::from(&self.inner)
    }

    /// Join this path with a segment. Leading slashes on the segment are
    /// ignored so project-relative fs paths can be joined onto a root.
    pub fn join(&self, segment: &str) -> Self {
        let segment = segment.replace('\\', "/");
        let segment = segment.trim_start_matches('/');
        let joined = if self.inner.ends_with('/') {
            format!("{}{}", self.inner, segment)
        } else {
            format!("{}/{}", self.inner, segment)
        };
        Self { inner: joined }
    }

    /// Get the parent directory.
    pub fn parent(&self) -> Option<Self> {
        let trimmed = self.inner.trim_end_matches('/');
        match trimmed.rfind('/') {
            Some(idx) if idx > 0 => Some(Self {
                inner: trimmed[..idx].to_string(),
            }),
            Some(0) => Some(Self {
                inner: "/".to_string(),
            }),
            _ => None,
        }
    }

    pub fn file_name(&self) -> Option<&str> {
        let trimmed = self.inner.trim_end_matches('/');
        trimmed.rsplit('/').next()
    }

    pub fn exists(&self) -> bool {
        self.to_native().exists()
    }

    pub fn is_file(&self) -> bool {
        self.to_native().is_file()
    }

    pub fn extension(&self) -> Option<&str> {
        self.file_name().and_then(|name| {
            let idx = name.rfind('.')?;
            if idx == 0 { None } else { Some(&name[idx + 1..]) }
        })
    }
}

impl AsRef<Path> for NormalizedPath {
    fn as_ref(&self) -> &Path {
        Path::new(&self.inner)
    }
}

impl std::fmt::Display for NormalizedPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.inner)
    }
}

impl From<&str> for NormalizedPath {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for NormalizedPath {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<PathBuf> for NormalizedPath {
    fn from(p: PathBuf) -> Self {
        Self::new(p)
    }
}

impl From<&Path> for NormalizedPath {
    fn from(p: &Path) -> Self {
        Self::new(p)
    }
}

/// Normalize a project-relative fs path to the `/a/b.json` form.
pub fn normalize_fs_path(path: &str) -> String {
    let cleaned = path.replace('\\', "/");
    let parts: Vec<&str> = cleaned
        .split('/')
        .filter(|part| !part.is_empty() && *part != ".")
        .collect();
    format!("/{}", parts.join("/"))
}

/// Express `path` relative to `root` in normalized fs path form.
///
/// # Errors
///
/// Returns [`Error::OutsideRoot`] when `path` does not live under `root`.
pub fn fs_relative(root: &Path, path: &Path) -> Result<String> {
    let relative = path.strip_prefix(root).map_err(|_| Error::OutsideRoot {
        path: path.to_path_buf(),
        root: root.to_path_buf(),
    })?;
    Ok(normalize_fs_path(&relative.to_string_lossy()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_ignores_leading_slash_of_fs_path() {
        let root = NormalizedPath::new("/srv/project/translations");
        let joined = root.join("/fr/messages.json");
        assert_eq!(joined.as_str(), "/srv/project/translations/fr/messages.json");
    }

    #[test]
    fn normalize_collapses_separators() {
        assert_eq!(normalize_fs_path("fr//app\\messages.json"), "/fr/app/messages.json");
        assert_eq!(normalize_fs_path("./fr/messages.json"), "/fr/messages.json");
    }

    #[test]
    fn fs_relative_rejects_foreign_paths() {
        let result = fs_relative(Path::new("/a/b"), Path::new("/c/d.json"));
        assert!(matches!(result, Err(Error::OutsideRoot { .. })));
    }

    #[test]
    fn fs_relative_strips_root() {
        let rel = fs_relative(Path::new("/a/b"), Path::new("/a/b/fr/x.json")).unwrap();
        assert_eq!(rel, "/fr/x.json");
    }
}
