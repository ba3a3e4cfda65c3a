use std::path::PathBuf;

use thiserror::Error;

/// Fatal failures of an update run.
///
/// Expected outcomes such as "nothing to do" or "declined because of local
/// edits" are not errors; they surface as `Ok(false)` from the updater.
#[derive(Debug, Error)]
pub enum RootUpdateError {
    #[error("root updates cannot run without a valid target package: {reason}")]
    NoValidTarget { reason: String },

    #[error("failed to read {}: {message}", path.display())]
    ManifestRead { path: PathBuf, message: String },

    #[error("failed to write updated root values to {}: {message}", path.display())]
    ManifestWrite { path: PathBuf, message: String },
}

impl RootUpdateError {
    pub fn no_valid_target(reason: impl Into<String>) -> Self {
        Self::NoValidTarget {
            reason: reason.into(),
        }
    }

    pub fn manifest_read(path: impl Into<PathBuf>, message: impl ToString) -> Self {
        Self::ManifestRead {
            path: path.into(),
            message: message.to_string(),
        }
    }

    pub fn manifest_write(path: impl Into<PathBuf>, message: impl ToString) -> Self {
        Self::ManifestWrite {
            path: path.into(),
            message: message.to_string(),
        }
    }
}
