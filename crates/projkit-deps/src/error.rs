use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ManifestError>;

/// A manifest exists on disk but could not be turned into dependencies.
///
/// A missing manifest is never an error; parsers return an empty set for it.
#[derive(Error, Debug)]
pub enum ManifestError {
    #[error("Failed to read manifest {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to decode manifest {}: {reason}", path.display())]
    Decode { path: PathBuf, reason: String },
}

impl ManifestError {
    pub fn path(&self) -> &std::path::Path {
        match self {
            ManifestError::Read { path, .. } | ManifestError::Decode { path, .. } => path,
        }
    }
}
