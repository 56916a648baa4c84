//! Royalty CLI Entry Point
//!
//! Usage:
//!   royalty payout  - Compute a payout statement for one settlement period
//!   royalty chain   - Write or verify a custody hash chain
//!   royalty verify  - Verify a period settlement bundle directory
//!   royalty run     - Build a complete period settlement bundle

use clap::Parser;
use royalty_cli::{handler, Cli};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() {
    let cli = Cli::parse();

    if cli.verbose {
        init_logging();
    }

    if let Err(e) = handler::run(cli) {
        eprintln!("[FATAL] {}", e);
        std::process::exit(e.exit_code());
    }
}

/// Initialize logging with tracing
fn init_logging() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "royalty_cli=debug,royalty_core=debug,royalty_verifier=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
