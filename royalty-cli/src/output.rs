//! Output Formatting
//!
//! Verdicts and summaries go to stdout; warnings and fatals go to stderr
//! with `[WARN]` / `[FATAL]` prefixes (the `[FATAL]` line is printed by
//! `main` from the returned error).

use royalty_verifier::{BundleVerificationResult, ChainVerificationResult};

/// Print a non-blocking warning to stderr.
pub fn warn(message: impl AsRef<str>) {
    eprintln!("[WARN] {}", message.as_ref());
}

/// Print a chain verification verdict. Findings precede the summary so the
/// last stdout line is always the verdict.
pub fn print_chain_result(result: &ChainVerificationResult) {
    for finding in &result.errors {
        println!("FAIL {finding}");
    }
    println!("{}", result.summary());
}

/// Print a bundle verification verdict.
pub fn print_bundle_result(result: &BundleVerificationResult) {
    for warning in &result.warnings {
        warn(warning);
    }
    for finding in &result.errors {
        println!("FAIL {finding}");
    }
    println!("{}", result.summary());
}
