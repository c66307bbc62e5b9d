use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DualCryptError {
    #[error("Failed to read source {path}: {source}")]
    InputRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write output {path}: {source}")]
    OutputWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Encoding error in {path}: {reason}")]
    Encoding { path: PathBuf, reason: String },

    #[error("Source directory not found: {0}")]
    SourceDirMissing(PathBuf),

    #[error("Invalid glob pattern '{pattern}': {reason}")]
    InvalidGlob { pattern: String, reason: String },

    #[error("Log export failed: {0}")]
    LogExport(String),
}

impl DualCryptError {
    /// Encoding failure that is not tied to a file on disk (in-memory decode).
    pub fn encoding(reason: impl Into<String>) -> Self {
        DualCryptError::Encoding {
            path: PathBuf::from("<memory>"),
            reason: reason.into(),
        }
    }

    /// Whether the error concerns a single file and the batch should go on.
    pub fn is_per_file(&self) -> bool {
        matches!(
            self,
            DualCryptError::InputRead { .. }
                | DualCryptError::OutputWrite { .. }
                | DualCryptError::Encoding { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, DualCryptError>;
