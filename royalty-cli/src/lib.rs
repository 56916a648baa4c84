//! Royalty CLI - Command Line Interface
//!
//! The `royalty` binary drives the settlement pipeline end to end.
//!
//! # Usage
//!
//! ```text
//! royalty [OPTIONS] <COMMAND>
//!
//! Commands:
//!   payout  Compute a payout statement for one settlement period
//!   chain   Write or verify a custody hash chain
//!   verify  Verify a period settlement bundle directory
//!   run     Build a complete period settlement bundle
//!
//! Options:
//!   -v, --verbose  Enable verbose output
//!   -h, --help     Print help
//!   -V, --version  Print version
//! ```
//!
//! # Examples
//!
//! ## Compute a monthly payout
//! ```text
//! royalty payout --input receipts.ndjson --period 2025-11 \
//!   --budget 10000.00 --cap-top1 0.5 --out payouts.ndjson
//! ```
//!
//! ## Build and verify a bundle
//! ```text
//! royalty run --receipts receipts.ndjson --period 2025-11 --out out/2025-11
//! royalty verify out/2025-11
//! ```
//!
//! # Exit codes
//!
//! - `0` success (including a clean `VERIFIED`)
//! - `2` fatal configuration error, nothing written
//! - `3` verification found integrity violations

pub mod commands;
pub mod error;
pub mod handler;
pub mod output;
pub mod pipeline;

pub use commands::{Cli, Commands};
pub use error::{CliError, CliResult};

/// CLI version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
