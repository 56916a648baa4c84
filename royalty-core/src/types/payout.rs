//! Payout Types and Settlement Policy
//!
//! A `PayoutRecord` is created once per provider per allocation run and is
//! immutable afterwards; the NDJSON serialization of the full set is the
//! payout artifact (`payouts.v1`).

use super::common::{ProviderId, PAYOUTS_SCHEMA};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Immutable policy configuration for one settlement run
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct PolicySet {
    /// Providers excluded from the distribution (weight zeroed, tagged "excluded")
    pub exclusions: BTreeSet<ProviderId>,
    /// Cap on the single highest provider share
    pub cap_top1: Option<f64>,
    /// Cap on the combined share of the three highest providers
    pub cap_top3: Option<f64>,
    /// Minimum payable amount; positive rounded amounts below it roll over
    pub min_amount: Decimal,
    /// Redistribute rolled-over amounts pro-rata to re-establish conservation
    pub reconcile_after_min: bool,
}

impl PolicySet {
    pub fn has_caps(&self) -> bool {
        self.cap_top1.is_some() || self.cap_top3.is_some()
    }
}

/// One provider's payout for a settlement period
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PayoutRecord {
    pub schema: String,
    pub provider_id: ProviderId,
    pub period: String,
    pub currency: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    /// Aggregated, normalized period weight that produced the amount
    pub share_agg: f64,
    #[serde(with = "rust_decimal::serde::float")]
    pub gross_revenue: Decimal,
    /// Ordered tags of the policies that touched this provider
    pub policies_applied: Vec<String>,
}

impl PayoutRecord {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        provider_id: ProviderId,
        period: impl Into<String>,
        currency: impl Into<String>,
        amount: Decimal,
        share_agg: f64,
        gross_revenue: Decimal,
        policies_applied: Vec<String>,
    ) -> Self {
        Self {
            schema: PAYOUTS_SCHEMA.to_string(),
            provider_id,
            period: period.into(),
            currency: currency.into(),
            amount,
            share_agg,
            gross_revenue,
            policies_applied,
        }
    }
}
