//! CLI Commands Module
//!
//! Command definitions for the `royalty` CLI.

pub mod chain;
pub mod payout;
pub mod run;
pub mod verify;

use clap::{Parser, Subcommand};

/// Royalty settlement CLI
#[derive(Parser, Debug)]
#[command(name = "royalty")]
#[command(version)]
#[command(about = "Royalty attribution settlement: payouts, custody chains, bundle verification")]
#[command(long_about = "A command-line tool for turning attribution receipts into \
    payout statements and wrapping every artifact in a verifiable custody trail.\n\n\
    All operations are offline and deterministic: the same inputs always produce \
    byte-identical outputs.")]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Compute a payout statement for one settlement period
    Payout(payout::PayoutArgs),

    /// Write or verify a custody hash chain
    #[command(subcommand)]
    Chain(chain::ChainCommands),

    /// Verify a period settlement bundle directory
    Verify(verify::VerifyArgs),

    /// Build a complete period settlement bundle
    Run(run::RunArgs),
}
