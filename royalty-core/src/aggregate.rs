//! Period Aggregation
//!
//! Filters receipts to a target settlement period, enforces the per-record
//! share-sum tolerance, and accumulates normalized provider weight across
//! the period. The counters are diagnostic only; they are not structurally
//! part of the allocation algorithm.

use crate::reader::{LineIssueKind, ReadItem};
use crate::types::common::{Period, ProviderId};
use crate::types::receipt::Receipt;
use std::collections::BTreeMap;
use tracing::debug;

/// Diagnostic counters for one aggregation pass
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AggregateStats {
    /// Records accepted into the weight map
    pub accepted: u64,
    /// Lines that were not valid JSON
    pub parse_errors: u64,
    /// Valid JSON with a foreign schema tag
    pub schema_mismatch: u64,
    /// Structurally invalid receipts
    pub invalid_record: u64,
    /// Receipts outside the target period (or with unparseable timestamps)
    pub out_of_period: u64,
    /// Receipts whose share sum is outside tolerance
    pub bad_share_sum: u64,
    /// Distribution of accepted top_k lengths
    pub top_k_dist: BTreeMap<usize, u64>,
}

impl AggregateStats {
    /// Total excluded records, all reasons combined.
    pub fn rejected(&self) -> u64 {
        self.parse_errors
            + self.schema_mismatch
            + self.invalid_record
            + self.out_of_period
            + self.bad_share_sum
    }

    /// One-line human-readable summary for run logs.
    pub fn summary_line(&self) -> String {
        format!(
            "accepted={} parse_errors={} schema_mismatch={} invalid={} out_of_period={} bad_share_sum={}",
            self.accepted,
            self.parse_errors,
            self.schema_mismatch,
            self.invalid_record,
            self.out_of_period,
            self.bad_share_sum,
        )
    }
}

/// Accumulates per-provider weight for one settlement period
pub struct PeriodAggregator {
    period: Period,
    weights: BTreeMap<ProviderId, f64>,
    stats: AggregateStats,
}

impl PeriodAggregator {
    pub fn new(period: Period) -> Self {
        Self {
            period,
            weights: BTreeMap::new(),
            stats: AggregateStats::default(),
        }
    }

    pub fn period(&self) -> Period {
        self.period
    }

    pub fn weights(&self) -> &BTreeMap<ProviderId, f64> {
        &self.weights
    }

    pub fn stats(&self) -> &AggregateStats {
        &self.stats
    }

    /// Feed one reader item (valid receipt or excluded line).
    pub fn observe(&mut self, item: &ReadItem) {
        match &item.1 {
            Ok(receipt) => self.observe_receipt(receipt),
            Err(issue) => {
                match issue.kind {
                    LineIssueKind::Parse(_) => self.stats.parse_errors += 1,
                    LineIssueKind::SchemaMismatch { .. } => self.stats.schema_mismatch += 1,
                    LineIssueKind::Invalid(_) => self.stats.invalid_record += 1,
                }
                debug!(line = item.0, %issue, "excluded line");
            }
        }
    }

    /// Feed one structurally valid receipt.
    pub fn observe_receipt(&mut self, receipt: &Receipt) {
        if !self.period.contains_timestamp(&receipt.timestamp) {
            self.stats.out_of_period += 1;
            return;
        }

        let sum = receipt.share_sum();
        if !receipt.share_sum_in_tolerance() {
            self.stats.bad_share_sum += 1;
            return;
        }

        // Soft-normalize the record to exactly 1.0 before accumulating.
        for alloc in &receipt.top_k {
            *self
                .weights
                .entry(ProviderId::new(&alloc.provider_id))
                .or_insert(0.0) += alloc.share / sum;
        }
        self.stats.accepted += 1;
        *self.stats.top_k_dist.entry(receipt.top_k.len()).or_insert(0) += 1;
    }

    /// Drain an entire reader into the aggregator.
    pub fn consume<I: IntoIterator<Item = ReadItem>>(&mut self, items: I) {
        for item in items {
            self.observe(&item);
        }
    }

    /// True if the period produced no usable weight (a legitimate
    /// "no activity" outcome, not an error).
    pub fn is_empty(&self) -> bool {
        self.stats.accepted == 0 || self.weights.values().sum::<f64>() <= 0.0
    }

    pub fn finish(self) -> (BTreeMap<ProviderId, f64>, AggregateStats) {
        (self.weights, self.stats)
    }
}
