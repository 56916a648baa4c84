//! Royalty Settlement Verifier
//!
//! Third-party verification library for royalty settlement artifacts.
//! Any holder of a period bundle can independently verify:
//! - Hash-chain integrity of line-oriented artifacts (edits, reordering,
//!   truncation, and appended entries are all detected)
//! - CRC-1 bundle conformance (manifest shape, required artifacts, path
//!   containment, trust-bundle consistency)
//!
//! Verification never stops at the first problem: results carry every
//! finding so a single run gives a complete damage report. Only unusable
//! inputs (a missing bundle directory, an unreadable file) are errors.

pub mod verify_bundle;
pub mod verify_chain;

mod error;

pub use error::{VerifierError, VerifierResult};

pub use verify_bundle::{BundleVerificationError, BundleVerificationResult, BundleVerifier};
pub use verify_chain::{ChainVerificationError, ChainVerificationResult, ChainVerifier};
