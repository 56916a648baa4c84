//! Command Handlers
//!
//! One handler per subcommand. Handlers validate configuration before
//! touching any output path, print the human summary on stdout, and map
//! integrity findings to [`CliError::Integrity`].

use crate::commands::{
    chain::{ChainCommands, ChainVerifyArgs, ChainWriteArgs},
    payout::PayoutArgs,
    run::RunArgs,
    verify::VerifyArgs,
    Cli, Commands,
};
use crate::error::{CliError, CliResult};
use crate::{output, pipeline};
use royalty_core::aggregate::PeriodAggregator;
use royalty_core::allocation::AllocationEngine;
use royalty_core::hashchain::{default_chain_path, ChunkSize, HashChainWriter};
use royalty_core::reader::ReceiptReader;
use royalty_core::types::{Period, PolicySet, ProviderId};
use royalty_verifier::{BundleVerifier, ChainVerifier};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeSet;
use std::fs;
use std::io::Write;
use std::path::Path;

/// Run the CLI with parsed arguments
pub fn run(cli: Cli) -> CliResult<()> {
    match cli.command {
        Commands::Payout(args) => handle_payout(&args),
        Commands::Chain(ChainCommands::Write(args)) => handle_chain_write(&args),
        Commands::Chain(ChainCommands::Verify(args)) => handle_chain_verify(&args),
        Commands::Verify(args) => handle_verify(&args),
        Commands::Run(args) => handle_run(&args),
    }
}

/// JSON dump of the inputs that produced a payout artifact
#[derive(Serialize)]
struct AssumptionsDump<'a> {
    period: String,
    #[serde(with = "rust_decimal::serde::float")]
    budget: Decimal,
    currency: &'a str,
    input: String,
    policy: &'a PolicySet,
    accepted: u64,
    rejected: u64,
}

pub(crate) fn handle_payout(args: &PayoutArgs) -> CliResult<()> {
    let period = Period::parse(&args.period)?;
    let exclusions = match &args.exclusions {
        Some(path) => load_exclusions(path)?,
        None => BTreeSet::new(),
    };
    let policy = PolicySet {
        exclusions,
        cap_top1: args.cap_top1,
        cap_top3: args.cap_top3,
        min_amount: args.min_amount.unwrap_or(Decimal::ZERO),
        reconcile_after_min: args.reconcile_after_min,
    };

    // Input must be readable before any output path is created.
    let reader = ReceiptReader::open(&args.input)?;
    let mut aggregator = PeriodAggregator::new(period);
    aggregator.consume(reader);
    let (weights, stats) = aggregator.finish();
    if stats.rejected() > 0 {
        output::warn(format!(
            "excluded {} record(s): {}",
            stats.rejected(),
            stats.summary_line()
        ));
    }

    let outcome = AllocationEngine::new().allocate(&weights, args.budget, &policy)?;
    let records = outcome.payout_records(&period.to_string(), &args.currency, args.budget);

    ensure_parent(&args.out)?;
    let mut out = fs::File::create(&args.out)?;
    for record in &records {
        writeln!(out, "{}", serde_json::to_string(record)?)?;
    }

    if let Some(path) = &args.out_rollover {
        ensure_parent(path)?;
        let mut rollover = String::from("provider_id,amount\n");
        for entry in &outcome.rollover {
            rollover.push_str(&format!("{},{}\n", entry.provider_id, entry.amount));
        }
        fs::write(path, rollover)?;
    }

    if let Some(path) = &args.out_assumptions {
        ensure_parent(path)?;
        let dump = AssumptionsDump {
            period: period.to_string(),
            budget: args.budget,
            currency: &args.currency,
            input: args.input.display().to_string(),
            policy: &policy,
            accepted: stats.accepted,
            rejected: stats.rejected(),
        };
        fs::write(path, serde_json::to_string_pretty(&dump)?)?;
    }

    let total = outcome.total();
    let conservation = if total == args.budget {
        "conservation=ok".to_string()
    } else {
        // min_amount without reconciliation legitimately pays out less.
        format!("conservation=short_by_{}", args.budget - total)
    };
    println!(
        "payout {}: {} provider(s), total {} {} of budget {}, {}, {}",
        period,
        records.len(),
        total,
        args.currency,
        args.budget,
        conservation,
        stats.summary_line()
    );
    Ok(())
}

pub(crate) fn handle_chain_write(args: &ChainWriteArgs) -> CliResult<()> {
    // Chunk validation is fatal before any I/O.
    let chunk = ChunkSize::new(args.chunk)?;
    let out = args
        .out
        .clone()
        .unwrap_or_else(|| default_chain_path(&args.source));

    let entries = HashChainWriter::new(chunk).write_file(&args.source, &out)?;
    println!(
        "chain write: {} block(s) over {} line(s) -> {}",
        entries.len(),
        entries.last().map(|e| e.line_count_upto).unwrap_or(0),
        out.display()
    );
    Ok(())
}

pub(crate) fn handle_chain_verify(args: &ChainVerifyArgs) -> CliResult<()> {
    let chunk = ChunkSize::new(args.chunk)?;
    let result = ChainVerifier::new(chunk).verify_files(&args.source, &args.chain)?;
    output::print_chain_result(&result);
    if result.is_valid {
        Ok(())
    } else {
        Err(CliError::integrity(result.errors.len()))
    }
}

pub(crate) fn handle_verify(args: &VerifyArgs) -> CliResult<()> {
    let chunk = ChunkSize::new(args.chunk)?;
    let result = BundleVerifier::new()
        .with_chunk(chunk)
        .verify(&args.bundle_dir)?;
    output::print_bundle_result(&result);
    if result.is_valid {
        Ok(())
    } else {
        Err(CliError::integrity(result.errors.len()))
    }
}

pub(crate) fn handle_run(args: &RunArgs) -> CliResult<()> {
    let period = Period::parse(&args.period)?;
    let chunk = ChunkSize::new(args.chunk)?;
    let summary = pipeline::build_bundle(&args.receipts, period, &args.out, chunk)?;
    println!(
        "bundle {}: {} -> {} ({} chain block(s), {})",
        summary.period,
        args.receipts.display(),
        summary.bundle_dir.display(),
        summary.chain_blocks,
        summary.stats.summary_line()
    );
    Ok(())
}

/// Load a single-column CSV of provider ids; blank lines are skipped.
fn load_exclusions(path: &Path) -> CliResult<BTreeSet<ProviderId>> {
    let text = fs::read_to_string(path).map_err(|e| {
        CliError::config(format!("cannot read exclusions {}: {e}", path.display()))
    })?;
    Ok(text
        .lines()
        .filter_map(|line| {
            let id = line.split(',').next().unwrap_or("").trim();
            (!id.is_empty()).then(|| ProviderId::new(id))
        })
        .collect())
}

fn ensure_parent(path: &Path) -> CliResult<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}
