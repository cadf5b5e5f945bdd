//! Interfaces to the tools around the core: the generation service, the
//! project scaffolder and the package installer. The binary provides the
//! real implementations; the core only sees success, failure and output.

use std::future::Future;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CollaboratorError {
    #[error("could not run {tool}: {source}")]
    Spawn {
        tool: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{tool} failed: {message}")]
    Failed { tool: String, message: String },

    #[error("missing credential: {0}")]
    MissingCredential(String),
}

/// Result of an install request. A failed install is reported, never fatal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallOutcome {
    pub packages: Vec<String>,
    pub success: bool,
    pub output: String,
}

pub trait GenerationClient {
    /// Sends `prompt` and returns the raw response text.
    fn generate(&self, prompt: &str) -> impl Future<Output = Result<String, CollaboratorError>> + Send;
}

pub trait Scaffolder {
    /// Creates an empty framework project at `root`.
    fn scaffold(&self, root: &Path, project_name: &str) -> Result<(), CollaboratorError>;
}

pub trait PackageInstaller {
    fn install(&self, root: &Path, packages: &[String]) -> Result<InstallOutcome, CollaboratorError>;
}
