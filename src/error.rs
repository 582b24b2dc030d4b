// src/error.rs

//! Error types for the recipe workflow
//!
//! Every step of an invocation fails with exactly one of these variants and
//! the failure aborts the whole invocation; nothing inside the workflow
//! catches and recovers. Retry policy, if any, belongs to the package
//! manager driving the recipe.

use thiserror::Error;

/// Convenience result type used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;

/// Workflow errors
#[derive(Error, Debug)]
pub enum Error {
    /// The requested platform/option combination is not supported
    #[error("unsupported configuration: {0}")]
    UnsupportedConfiguration(String),

    /// The requested version has no entry in the recipe's locator tables
    #[error("no version locator for {0}")]
    MissingVersionLocator(String),

    /// Fetching an artifact failed (network, checksum mismatch, missing object)
    #[error("retrieval failed: {0}")]
    RetrievalFailed(String),

    /// The external build tool returned a non-zero status
    #[error("{phase} phase failed: {detail}")]
    BuildFailed { phase: String, detail: String },

    /// An expected artifact was missing while staging the package
    #[error("install failed: {0}")]
    InstallFailed(String),

    /// An option value violated its declared domain
    #[error("invalid option {name}: {reason}")]
    InvalidOption { name: String, reason: String },

    /// The recipe manifest could not be parsed or is structurally invalid
    #[error("invalid recipe: {0}")]
    ParseError(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
