//! Version store error types.

use crate::FileId;
use thiserror::Error;

/// Result type for version store operations.
pub type VersionResult<T> = Result<T, VersionError>;

/// Errors that can occur while tracking file versions.
///
/// None of these are fatal: callers log them and leave the UI as it was.
#[derive(Debug, Error)]
pub enum VersionError {
    /// Update message carried no filename.
    #[error("Update message has no filename")]
    MissingIdentifier,

    /// No record or live content for the file.
    #[error("File not found: {0}")]
    FileNotFound(FileId),

    /// The file exists but the version is not retained.
    #[error("Version {version} not found for file {file}")]
    VersionNotFound { file: FileId, version: u32 },

    /// There is no retained version below the current one to compare with.
    #[error("No version before {version} for file {file}")]
    NoPreviousVersion { file: FileId, version: u32 },

    /// The update arrived out of order.
    #[error("Stale update for file {file}: sequence {sequence} <= last accepted {last}")]
    StaleUpdate { file: FileId, sequence: u64, last: u64 },

    /// Raw message could not be interpreted.
    #[error("Invalid update message: {0}")]
    InvalidMessage(String),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl VersionError {
    /// Create a file not found error.
    pub fn file_not_found(file: &FileId) -> Self {
        Self::FileNotFound(file.clone())
    }

    /// Create a version not found error.
    pub fn version_not_found(file: &FileId, version: u32) -> Self {
        Self::VersionNotFound {
            file: file.clone(),
            version,
        }
    }

    /// Whether this error is one of the "not found" family.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::FileNotFound(_) | Self::VersionNotFound { .. } | Self::NoPreviousVersion { .. }
        )
    }
}
