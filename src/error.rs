//! Error types for a single build invocation.
//!
//! Fatal for a build: a response that yields no files at all, I/O errors
//! while materializing the project, and a scaffolder that cannot create the
//! base project. Parse failures of the structured payload, misbehaving repair
//! rules and failed installs are handled where they occur and never surface
//! here.

use crate::collaborators::CollaboratorError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BuildError {
    /// The unwrapped response contained nothing the extractor could turn into a file.
    #[error("no extractable files found in the generator response")]
    NoFilesExtracted,

    /// Creating a directory or writing a file failed.
    #[error("failed to write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The configuration file exists but could not be read or parsed.
    #[error("invalid configuration {}: {message}", path.display())]
    Config { path: PathBuf, message: String },

    #[error("failed to serialize project manifest: {0}")]
    Manifest(#[from] serde_json::Error),

    /// The scaffolder could not create the base project.
    #[error("project scaffolding failed: {0}")]
    Scaffold(#[source] CollaboratorError),
}

impl BuildError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        BuildError::Io {
            path: path.into(),
            source,
        }
    }

    /// True when the build stopped before anything was written.
    pub fn is_input_error(&self) -> bool {
        matches!(self, BuildError::NoFilesExtracted | BuildError::Config { .. })
    }
}

pub type Result<T> = std::result::Result<T, BuildError>;
