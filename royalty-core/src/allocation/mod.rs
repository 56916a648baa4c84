//! Allocation Engine
//!
//! Turns the aggregated period weight map into a conservation-exact monetary
//! allocation: sum of payout amounts equals the declared budget to the cent.

mod engine;

pub use engine::AllocationEngine;

use crate::types::common::ProviderId;
use crate::types::payout::PayoutRecord;
use rust_decimal::Decimal;
use std::collections::BTreeMap;

/// A provider zeroed by the minimum-amount policy, with its removed amount
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RolloverEntry {
    pub provider_id: ProviderId,
    pub amount: Decimal,
}

/// Result of one allocation run; immutable once produced
#[derive(Clone, Debug, Default)]
pub struct AllocationOutcome {
    /// Final per-provider amounts (2-decimal precision, sums to the budget)
    pub amounts: BTreeMap<ProviderId, Decimal>,
    /// Normalized period weights before policy application
    pub share_agg: BTreeMap<ProviderId, f64>,
    /// Ordered policy tags per touched provider
    pub policies_applied: BTreeMap<ProviderId, Vec<String>>,
    /// Providers removed by the minimum-amount policy
    pub rollover: Vec<RolloverEntry>,
}

impl AllocationOutcome {
    /// Sum of all allocated amounts.
    pub fn total(&self) -> Decimal {
        self.amounts.values().copied().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.amounts.is_empty()
    }

    /// Payout records ordered by descending amount, then provider id.
    pub fn payout_records(
        &self,
        period: &str,
        currency: &str,
        gross_revenue: Decimal,
    ) -> Vec<PayoutRecord> {
        let mut providers: Vec<&ProviderId> = self.amounts.keys().collect();
        providers.sort_by(|a, b| {
            let aa = self.amounts[*a];
            let bb = self.amounts[*b];
            bb.cmp(&aa).then_with(|| a.cmp(b))
        });

        providers
            .into_iter()
            .map(|p| {
                let share = self.share_agg.get(p).copied().unwrap_or(0.0);
                PayoutRecord::new(
                    p.clone(),
                    period,
                    currency,
                    self.amounts[p],
                    round8(share),
                    gross_revenue,
                    self.policies_applied.get(p).cloned().unwrap_or_default(),
                )
            })
            .collect()
    }
}

fn round8(v: f64) -> f64 {
    (v * 1e8).round() / 1e8
}
