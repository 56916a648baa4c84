//! Chain Commands
//!
//! Arguments for writing and verifying custody hash chains.

use clap::{Args, Subcommand};
use royalty_core::hashchain::DEFAULT_CHUNK_SIZE;
use std::path::PathBuf;

/// Write or verify a custody hash chain
#[derive(Subcommand, Debug)]
pub enum ChainCommands {
    /// Write the hash chain for a line-oriented source file
    Write(ChainWriteArgs),

    /// Verify a hash chain against its source file
    Verify(ChainVerifyArgs),
}

/// Write the hash chain for a source file
#[derive(Args, Debug)]
pub struct ChainWriteArgs {
    /// Source file to chain
    #[arg(long)]
    pub source: PathBuf,

    /// Output chain file (default: proofs/hashchain_<basename>.txt)
    #[arg(long)]
    pub out: Option<PathBuf>,

    /// Lines per block
    #[arg(long, default_value_t = DEFAULT_CHUNK_SIZE)]
    pub chunk: i64,
}

/// Verify a hash chain against its source
#[derive(Args, Debug)]
pub struct ChainVerifyArgs {
    /// Source file the chain was written over
    #[arg(long)]
    pub source: PathBuf,

    /// Chain file to verify
    #[arg(long)]
    pub chain: PathBuf,

    /// Lines per block used at write time
    #[arg(long, default_value_t = DEFAULT_CHUNK_SIZE)]
    pub chunk: i64,
}
