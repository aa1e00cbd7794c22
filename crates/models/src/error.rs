use std::path::PathBuf;

use thiserror::Error;

/// Errors from model construction and artifact loading.
#[derive(Debug, Error)]
pub enum ModelError {
    /// Invalid model configuration, detected before any weights are touched.
    #[error("model configuration error: {0}")]
    Configuration(String),

    /// A weight record or saved model failed to load (missing file, corrupt
    /// bytes, or a schema that does not match the module being restored).
    #[error("failed to load model artifact '{path}': {reason}")]
    ArtifactLoad { path: PathBuf, reason: String },
}

impl ModelError {
    pub(crate) fn artifact(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::ArtifactLoad {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}
