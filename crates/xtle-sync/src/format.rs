//! On-disk translation file formats
//!
//! A translation file is a flat list of units keyed by id. Two encodings are
//! supported, chosen by extension:
//!
//! ```json
//! {"units": [{"id": "hello", "source": "Hello", "target": "Bonjour"}]}
//! ```
//!
//! ```toml
//! [[units]]
//! id = "hello"
//! source = "Hello"
//! target = "Bonjour"
//! ```

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Extensions a translation mapping may match.
pub const SUPPORTED_EXTENSIONS: &[&str] = &["json", "toml"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Unit {
    pub id: String,
    pub source: String,
    #[serde(default)]
    pub target: String,
}

impl Unit {
    pub fn new(id: impl Into<String>, source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            source: source.into(),
            target: target.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslationFile {
    #[serde(default)]
    pub units: Vec<Unit>,
}

impl TranslationFile {
    pub fn new(units: Vec<Unit>) -> Self {
        Self { units }
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Unit> {
        self.units.iter().find(|u| u.id == id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TranslationFormat {
    Json,
    Toml,
}

impl TranslationFormat {
    /// Pick the format for a file path by its extension.
    pub fn from_path(fs_path: &str) -> Result<Self> {
        let extension = fs_path.rsplit_once('.').map(|(_, ext)| ext).unwrap_or("");
        match extension {
            "json" => Ok(Self::Json),
            "toml" => Ok(Self::Toml),
            _ => Err(Error::InvalidTranslationFile {
                path: fs_path.to_string(),
                message: format!("unsupported extension '{extension}'"),
            }),
        }
    }

    pub fn parse(&self, fs_path: &str, bytes: &[u8]) -> Result<TranslationFile> {
        let invalid = |message: String| Error::InvalidTranslationFile {
            path: fs_path.to_string(),
            message,
        };

        let text = std::str::from_utf8(bytes).map_err(|e| invalid(e.to_string()))?;
        if text.trim().is_empty() {
            return Ok(TranslationFile::default());
        }
        match self {
            Self::Json => serde_json::from_str(text).map_err(|e| invalid(e.to_string())),
            Self::Toml => toml::from_str(text).map_err(|e| invalid(e.to_string())),
        }
    }

    pub fn serialize(&self, file: &TranslationFile) -> Result<Vec<u8>> {
        let mut text = match self {
            Self::Json => serde_json::to_string_pretty(file)?,
            Self::Toml => toml::to_string_pretty(file)?,
        };
        if !text.ends_with('\n') {
            text.push('\n');
        }
        Ok(text.into_bytes())
    }
}
