//! CLI Error Types
//!
//! Two fatal classes with distinct exit codes: configuration problems
//! (bad arguments, missing inputs) exit 2 before any output is written,
//! integrity failures (a verification that found tampering) exit 3.

use thiserror::Error;

/// CLI-specific errors
#[derive(Error, Debug)]
pub enum CliError {
    /// Configuration or argument error
    #[error("{message}")]
    Config { message: String },

    /// Verification found integrity violations
    #[error("verification failed with {findings} finding(s)")]
    Integrity { findings: usize },

    /// Core error (period, budget, chunk, input)
    #[error(transparent)]
    Core(#[from] royalty_core::CoreError),

    /// Verifier error (unreadable inputs, missing bundle)
    #[error(transparent)]
    Verifier(#[from] royalty_verifier::VerifierError),

    /// File I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// CLI result type
pub type CliResult<T> = Result<T, CliError>;

impl CliError {
    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        CliError::Config {
            message: message.into(),
        }
    }

    /// Create an integrity error
    pub fn integrity(findings: usize) -> Self {
        CliError::Integrity { findings }
    }

    /// Get exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Integrity { .. } => 3,
            _ => 2,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_exits_2() {
        let err = CliError::config("budget must be positive");
        assert_eq!(err.exit_code(), 2);
        assert!(err.to_string().contains("budget"));
    }

    #[test]
    fn test_integrity_error_exits_3() {
        let err = CliError::integrity(4);
        assert_eq!(err.exit_code(), 3);
        assert!(err.to_string().contains("4 finding(s)"));
    }

    #[test]
    fn test_core_error_exits_2() {
        let err: CliError = royalty_core::CoreError::InvalidChunkSize { value: 0 }.into();
        assert_eq!(err.exit_code(), 2);
        assert!(err.to_string().contains("CHAIN-CONFIG-001"));
    }
}
