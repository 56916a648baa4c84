//! Bundle Build Pipeline
//!
//! Composes a complete period settlement bundle in one pass: receipts
//! snapshot, validation report, custody chain, trust bundle and manifest.
//! All inputs are validated before the output directory is touched, so a
//! fatal configuration error leaves no partial bundle behind.

use crate::error::CliResult;
use royalty_core::aggregate::{AggregateStats, PeriodAggregator};
use royalty_core::hashchain::{ChunkSize, HashChainWriter};
use royalty_core::reader::ReceiptReader;
use royalty_core::types::{Manifest, Period, TrustBundle, MANIFEST_FILE};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// Artifact file names inside the bundle directory
pub const RECEIPTS_FILE: &str = "receipts.ndjson";
pub const REPORT_FILE: &str = "validate_report.md";
pub const HASHCHAIN_FILE: &str = "hashchain.txt";
pub const TRUST_BUNDLE_FILE: &str = "trust_bundle.json";

/// What one bundle build produced
#[derive(Clone, Debug)]
pub struct BundleSummary {
    pub period: String,
    pub bundle_dir: PathBuf,
    pub stats: AggregateStats,
    pub chain_blocks: usize,
}

/// Build a bundle for `period` from `receipts` into `out_dir`.
pub fn build_bundle(
    receipts: &Path,
    period: Period,
    out_dir: &Path,
    chunk: ChunkSize,
) -> CliResult<BundleSummary> {
    // Validation pass first: a missing input must fail before any output
    // directory exists.
    let reader = ReceiptReader::open(receipts)?;
    let mut aggregator = PeriodAggregator::new(period);
    aggregator.consume(reader);
    let (_, stats) = aggregator.finish();

    fs::create_dir_all(out_dir)?;

    let receipts_out = out_dir.join(RECEIPTS_FILE);
    fs::copy(receipts, &receipts_out)?;

    fs::write(
        out_dir.join(REPORT_FILE),
        format!("# validation report {period}\n\n{}\n", stats.summary_line()),
    )?;

    let entries =
        HashChainWriter::new(chunk).write_file(&receipts_out, &out_dir.join(HASHCHAIN_FILE))?;

    let mut artifacts = BTreeMap::new();
    artifacts.insert("receipts".to_string(), RECEIPTS_FILE.to_string());
    artifacts.insert("validate_report".to_string(), REPORT_FILE.to_string());
    artifacts.insert("hashchain".to_string(), HASHCHAIN_FILE.to_string());
    artifacts.insert("trust_bundle".to_string(), TRUST_BUNDLE_FILE.to_string());

    let trust = TrustBundle::for_period(period.to_string(), artifacts.clone());
    fs::write(
        out_dir.join(TRUST_BUNDLE_FILE),
        serde_json::to_string_pretty(&trust)?,
    )?;

    let manifest = Manifest::for_period(period.to_string(), artifacts);
    fs::write(
        out_dir.join(MANIFEST_FILE),
        serde_json::to_string_pretty(&manifest)?,
    )?;

    info!(
        period = %period,
        bundle = %out_dir.display(),
        accepted = stats.accepted,
        blocks = entries.len(),
        "bundle built"
    );

    Ok(BundleSummary {
        period: period.to_string(),
        bundle_dir: out_dir.to_path_buf(),
        stats,
        chain_blocks: entries.len(),
    })
}
