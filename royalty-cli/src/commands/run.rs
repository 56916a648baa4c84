//! Run Command
//!
//! Arguments for the full bundle-build pipeline.

use clap::Args;
use royalty_core::hashchain::DEFAULT_CHUNK_SIZE;
use std::path::PathBuf;

/// Build a complete period settlement bundle
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Receipts NDJSON file
    #[arg(long)]
    pub receipts: PathBuf,

    /// Settlement period (YYYY-MM, zero-padded month)
    #[arg(long)]
    pub period: String,

    /// Output bundle directory
    #[arg(long)]
    pub out: PathBuf,

    /// Lines per block for the custody chain
    #[arg(long, default_value_t = DEFAULT_CHUNK_SIZE)]
    pub chunk: i64,
}
