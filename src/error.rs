use crate::remappings::RemappingError;
use std::{
    io,
    path::{Path, PathBuf},
};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, PreprocessError>;

/// Various error types
#[derive(Debug, Error)]
pub enum PreprocessError {
    /// The remappings file does not exist
    #[error("Remappings file not found at \"{}\"", .0.display())]
    ResourceNotFound(PathBuf),
    #[error(transparent)]
    Remapping(#[from] RemappingError),
    #[error(transparent)]
    SemverError(#[from] semver::Error),
    /// Deserialization error
    #[error(transparent)]
    SerdeJson(#[from] serde_json::Error),
    /// Filesystem IO error
    #[error(transparent)]
    Io(#[from] PreprocessIoError),
    /// General purpose message
    #[error("{0}")]
    Message(String),
}

impl PreprocessError {
    pub(crate) fn io(err: io::Error, path: impl Into<PathBuf>) -> Self {
        PreprocessIoError::new(err, path).into()
    }

    /// Same as [`Self::io`] but maps a missing file to [`PreprocessError::ResourceNotFound`]
    pub(crate) fn resource(err: io::Error, path: impl Into<PathBuf>) -> Self {
        if err.kind() == io::ErrorKind::NotFound {
            PreprocessError::ResourceNotFound(path.into())
        } else {
            Self::io(err, path)
        }
    }

    pub(crate) fn msg(msg: impl Into<String>) -> Self {
        PreprocessError::Message(msg.into())
    }
}

#[derive(Debug, Error)]
#[error("\"{}\": {io}", self.path.display())]
pub struct PreprocessIoError {
    io: io::Error,
    path: PathBuf,
}

impl PreprocessIoError {
    pub fn new(io: io::Error, path: impl Into<PathBuf>) -> Self {
        Self { io, path: path.into() }
    }

    /// The path at which the error occurred
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The underlying io error
    pub fn io_error(&self) -> &io::Error {
        &self.io
    }
}

impl From<PreprocessIoError> for io::Error {
    fn from(err: PreprocessIoError) -> Self {
        err.io
    }
}
