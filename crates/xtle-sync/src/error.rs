//! Error types for xtle-sync

/// Result type for xtle-sync operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while classifying or syncing tracked paths
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The file vanished or could not be parsed between classification and
    /// execution. The path stays unsynced and is picked up again next run.
    #[error("Transient sync failure for {path}: {reason}")]
    TransientSyncFailure { path: String, reason: String },

    /// Pull/push was invoked on a path that cannot be synced in that shape
    #[error("Precondition violated for {path}: {message}")]
    PreconditionViolation { path: String, message: String },

    /// Invalid override value or contradictory merge staging
    #[error("Conflict integrity error: {message}")]
    ConflictIntegrity { message: String },

    /// A tracked path already claims the xtle path or the fs path
    #[error("Already tracked: {xtle_path} <-> {fs_path}")]
    DuplicateTrackedPath { xtle_path: String, fs_path: String },

    #[error("Tracked path not found: {0}")]
    TrackedPathNotFound(String),

    #[error("Store not found: {0}")]
    StoreNotFound(String),

    #[error("Invalid translation mapping {mapping}: {reason}")]
    InvalidMapping { mapping: String, reason: String },

    #[error("Invalid translation file {path}: {message}")]
    InvalidTranslationFile { path: String, message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Filesystem error from xtle-files
    #[error(transparent)]
    Files(#[from] xtle_files::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    TomlDe(#[from] toml::de::Error),

    #[error(transparent)]
    TomlSer(#[from] toml::ser::Error),
}

impl Error {
    pub(crate) fn integrity(message: impl Into<String>) -> Self {
        Self::ConflictIntegrity {
            message: message.into(),
        }
    }

    pub(crate) fn transient(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::TransientSyncFailure {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Whether retrying on the next run may succeed without operator action.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::TransientSyncFailure { .. })
    }
}
