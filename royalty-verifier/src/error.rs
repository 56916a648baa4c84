//! Verifier Error Types
//!
//! Fatal conditions only. Integrity findings (tampered digests, trailing
//! entries, missing artifacts) are not errors: they are collected into the
//! verification results so a single run reports every problem it can find.

use thiserror::Error;

/// Verifier result type
pub type VerifierResult<T> = Result<T, VerifierError>;

/// Verifier error
#[derive(Error, Debug)]
pub enum VerifierError {
    /// A file the verification run needs could not be read at all
    #[error("[VER-INPUT-001] Cannot read {path}: {reason}")]
    Unreadable { path: String, reason: String },

    /// Bundle directory missing or not a directory
    #[error("[VER-BUNDLE-001] Bundle directory not found: {path}")]
    BundleNotFound { path: String },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Core error (configuration, serialization)
    #[error(transparent)]
    Core(#[from] royalty_core::CoreError),
}

impl From<serde_json::Error> for VerifierError {
    fn from(err: serde_json::Error) -> Self {
        VerifierError::Core(royalty_core::CoreError::Serialization(err.to_string()))
    }
}
