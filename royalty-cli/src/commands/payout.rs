//! Payout Command
//!
//! Arguments for computing a period payout statement from a receipts file.

use clap::Args;
use rust_decimal::Decimal;
use std::path::PathBuf;

/// Compute a payout statement for one settlement period
#[derive(Args, Debug)]
pub struct PayoutArgs {
    /// Receipts NDJSON file
    #[arg(long)]
    pub input: PathBuf,

    /// Settlement period (YYYY-MM, zero-padded month)
    #[arg(long)]
    pub period: String,

    /// Gross revenue to distribute
    #[arg(long)]
    pub budget: Decimal,

    /// Payout currency code
    #[arg(long, default_value = "EUR")]
    pub currency: String,

    /// Minimum payable amount; positive amounts below it roll over
    #[arg(long)]
    pub min_amount: Option<Decimal>,

    /// Cap on the single highest provider share (0..1)
    #[arg(long)]
    pub cap_top1: Option<f64>,

    /// Cap on the combined share of the three highest providers (0..1)
    #[arg(long)]
    pub cap_top3: Option<f64>,

    /// Single-column CSV of provider ids to exclude
    #[arg(long)]
    pub exclusions: Option<PathBuf>,

    /// Redistribute rolled-over amounts pro-rata to keep conservation
    #[arg(long)]
    pub reconcile_after_min: bool,

    /// Output payouts NDJSON file
    #[arg(long)]
    pub out: PathBuf,

    /// Optional rollover CSV (providers zeroed by --min-amount)
    #[arg(long)]
    pub out_rollover: Option<PathBuf>,

    /// Optional JSON dump of the run's inputs and policy
    #[arg(long)]
    pub out_assumptions: Option<PathBuf>,
}
