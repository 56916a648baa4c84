//! Bundle Verify Command

use clap::Args;
use royalty_core::hashchain::DEFAULT_CHUNK_SIZE;
use std::path::PathBuf;

/// Verify a period settlement bundle directory
#[derive(Args, Debug)]
pub struct VerifyArgs {
    /// Bundle directory containing MANIFEST.json
    pub bundle_dir: PathBuf,

    /// Lines per block used when the bundle's chain was written
    #[arg(long, default_value_t = DEFAULT_CHUNK_SIZE)]
    pub chunk: i64,
}
