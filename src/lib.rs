//! Turns the raw response of a UI code generator into a runnable project.
//!
//! The stages live in their own modules and are driven in order by
//! [`pipeline::build`]: unwrap the transport envelope, extract files,
//! repair them, scan dependencies, write them out and record a manifest.

pub mod collaborators;
pub mod config;
pub mod deps;
pub mod envelope;
pub mod error;
pub mod extract;
pub mod fences;
pub mod files;
pub mod lexer;
pub mod manifest;
pub mod materialize;
pub mod naming;
pub mod pipeline;
pub mod repair;

pub use config::BuildConfig;
pub use error::{BuildError, Result};
pub use files::{ExtractedFile, FileSet, Language, SourcePattern};
pub use pipeline::{BuildOptions, BuildOutcome, Collaborators, build};
pub use repair::{RepairPipeline, RepairReport};
