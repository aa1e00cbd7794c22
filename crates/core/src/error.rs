// crates/core/src/error.rs
//
// Error taxonomy for the dataset pipeline. Configuration problems surface
// eagerly at plan/dataset construction; I/O and decode problems surface
// lazily, at iteration time.

use std::path::PathBuf;

use thiserror::Error;
use vision_harness_formats::FormatError;

#[derive(Debug, Error)]
pub enum PipelineError {
    /// Invalid configuration detected eagerly at construction.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A file or directory could not be read during iteration.
    #[error("failed to read '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Unsupported extension or undecodable bytes.
    #[error(transparent)]
    Format(#[from] FormatError),

    /// A decode worker task was cancelled or panicked.
    #[error("decode worker failed: {0}")]
    Worker(String),
}

impl PipelineError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
