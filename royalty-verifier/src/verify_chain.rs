//! Hash-Chain Verification
//!
//! Recomputes the chunked SHA-256 chain from the source artifact and compares
//! it entry-by-entry against the recorded chain file. Verification is
//! exhaustive: every discrepancy becomes a finding, and the trailing-entries
//! check runs unconditionally after the main pass so an appended entry is
//! caught even when the source ends exactly on a chunk boundary.

use crate::error::{VerifierError, VerifierResult};
use chrono::{DateTime, Utc};
use royalty_core::hashchain::{ChunkSize, HashChainEntry, HashChainWriter};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// One integrity finding
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChainVerificationError {
    pub code: String,
    pub message: String,
}

impl ChainVerificationError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ChainVerificationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

/// Chain verification result
#[derive(Clone, Debug)]
pub struct ChainVerificationResult {
    /// Overall validity
    pub is_valid: bool,
    /// Findings, in block order
    pub errors: Vec<ChainVerificationError>,
    /// Blocks recomputed from the source
    pub blocks_recomputed: u64,
    /// Entries present in the chain file
    pub entries_recorded: u64,
    /// Non-empty source lines hashed
    pub lines_hashed: u64,
    /// Verification timestamp
    pub verified_at: DateTime<Utc>,
}

impl ChainVerificationResult {
    /// One-line PASS/FAIL summary.
    pub fn summary(&self) -> String {
        if self.is_valid {
            format!(
                "VERIFIED: {} blocks, {} lines",
                self.blocks_recomputed, self.lines_hashed
            )
        } else {
            format!(
                "FAIL: {} finding(s) over {} recorded entries",
                self.errors.len(),
                self.entries_recorded
            )
        }
    }
}

/// Hash-chain verifier
pub struct ChainVerifier {
    chunk: ChunkSize,
}

impl ChainVerifier {
    /// The chunk size must match the one used at write time; a mismatch
    /// surfaces as line-count findings, not as a configuration error.
    pub fn new(chunk: ChunkSize) -> Self {
        Self { chunk }
    }

    /// Verify a chain file against its source stream.
    pub fn verify<R: BufRead>(
        &self,
        source: R,
        chain_text: &str,
    ) -> VerifierResult<ChainVerificationResult> {
        let mut errors = Vec::new();

        // Parse the recorded chain; a malformed line is a finding, and its
        // position still counts so trailing/truncation math stays honest.
        let mut recorded: Vec<Option<HashChainEntry>> = Vec::new();
        for (i, line) in chain_text.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            match HashChainEntry::parse_line(line) {
                Some(entry) => recorded.push(Some(entry)),
                None => {
                    errors.push(ChainVerificationError::new(
                        "MALFORMED_CHAIN_LINE",
                        format!("chain line {} is not <index>\\t<count>\\t<digest>", i + 1),
                    ));
                    recorded.push(None);
                }
            }
        }

        let recomputed = HashChainWriter::new(self.chunk).build(source)?;
        let lines_hashed = recomputed.last().map(|e| e.line_count_upto).unwrap_or(0);

        for (i, slot) in recorded.iter().enumerate() {
            let Some(entry) = slot else { continue };
            let Some(expected) = recomputed.get(i) else {
                // Handled below as trailing entries.
                break;
            };

            if !entry.digest_is_wellformed() {
                errors.push(ChainVerificationError::new(
                    "MALFORMED_DIGEST",
                    format!(
                        "block {}: digest is not 64 lowercase hex chars: {:?}",
                        i, entry.digest
                    ),
                ));
            }
            if entry.block_index != expected.block_index {
                errors.push(ChainVerificationError::new(
                    "BLOCK_INDEX_MISMATCH",
                    format!(
                        "block {}: recorded index {} != expected {}",
                        i, entry.block_index, expected.block_index
                    ),
                ));
            }
            if entry.line_count_upto != expected.line_count_upto {
                errors.push(ChainVerificationError::new(
                    "LINE_COUNT_MISMATCH",
                    format!(
                        "block {}: recorded line count {} != expected {}",
                        i, entry.line_count_upto, expected.line_count_upto
                    ),
                ));
            }
            if entry.digest_is_wellformed() && entry.digest != expected.digest {
                errors.push(ChainVerificationError::new(
                    "DIGEST_MISMATCH",
                    format!(
                        "block {}: recorded digest {} != recomputed {}",
                        i, entry.digest, expected.digest
                    ),
                ));
            }
        }

        if recorded.len() < recomputed.len() {
            errors.push(ChainVerificationError::new(
                "CHAIN_TRUNCATED",
                format!(
                    "chain has {} entries but the source produces {} blocks",
                    recorded.len(),
                    recomputed.len()
                ),
            ));
        }

        // Unconditional trailing check: runs whether or not the source ends
        // on a chunk boundary, and covers the empty-source case.
        if recorded.len() > recomputed.len() {
            if recomputed.is_empty() {
                errors.push(ChainVerificationError::new(
                    "EMPTY_SOURCE_NONEMPTY_CHAIN",
                    format!(
                        "source has no hashable lines but the chain records {} entries",
                        recorded.len()
                    ),
                ));
            } else {
                errors.push(ChainVerificationError::new(
                    "TRAILING_ENTRIES",
                    format!(
                        "chain has {} entries beyond the {} blocks the source produces",
                        recorded.len() - recomputed.len(),
                        recomputed.len()
                    ),
                ));
            }
        }

        Ok(ChainVerificationResult {
            is_valid: errors.is_empty(),
            errors,
            blocks_recomputed: recomputed.len() as u64,
            entries_recorded: recorded.len() as u64,
            lines_hashed,
            verified_at: Utc::now(),
        })
    }

    /// Verify a chain file on disk against its source file.
    pub fn verify_files(
        &self,
        source: &Path,
        chain: &Path,
    ) -> VerifierResult<ChainVerificationResult> {
        let file = File::open(source).map_err(|e| VerifierError::Unreadable {
            path: source.display().to_string(),
            reason: e.to_string(),
        })?;
        let chain_text =
            std::fs::read_to_string(chain).map_err(|e| VerifierError::Unreadable {
                path: chain.display().to_string(),
                reason: e.to_string(),
            })?;

        let result = self.verify(BufReader::new(file), &chain_text)?;
        tracing::info!(
            source = %source.display(),
            chain = %chain.display(),
            valid = result.is_valid,
            findings = result.errors.len(),
            "chain verification complete"
        );
        Ok(result)
    }
}
