//! Allocation algorithm
//!
//! Order of operations: normalize -> exclusions -> bounded cap
//! redistribution -> round and reconcile -> minimum-amount policy.
//! All amount arithmetic after rounding happens in integer cents, so the
//! conservation check is exact, not approximate.

use super::{AllocationOutcome, RolloverEntry};
use crate::error::{CoreError, CoreResult};
use crate::types::common::ProviderId;
use crate::types::payout::PolicySet;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// Numerical slack when comparing weights against caps
const EPS: f64 = 1e-12;

/// Hard bound on cap-redistribution rounds; guarantees termination
const MAX_CAP_ROUNDS: u32 = 10;

/// Allocation engine
pub struct AllocationEngine {
    max_cap_rounds: u32,
}

impl AllocationEngine {
    pub fn new() -> Self {
        Self {
            max_cap_rounds: MAX_CAP_ROUNDS,
        }
    }

    /// Allocate `budget` across `weights` under `policy`.
    ///
    /// An empty weight map is a legitimate no-activity outcome and yields an
    /// empty allocation. Row-level data problems never reach this function;
    /// the only error here is a budget that cannot be expressed in cents.
    pub fn allocate(
        &self,
        weights: &BTreeMap<ProviderId, f64>,
        budget: Decimal,
        policy: &PolicySet,
    ) -> CoreResult<AllocationOutcome> {
        let budget_cents = to_cents(budget).ok_or_else(|| CoreError::InvalidBudget {
            value: budget.to_string(),
        })?;

        let share_agg = normalize(weights);
        let mut outcome = AllocationOutcome {
            share_agg: share_agg.clone(),
            ..Default::default()
        };
        if weights.is_empty() {
            return Ok(outcome);
        }

        // Step 2: exclusions, then renormalize over the remainder.
        let mut w = share_agg;
        let mut touched = false;
        for provider in &policy.exclusions {
            if let Some(v) = w.get_mut(provider) {
                if *v > 0.0 {
                    *v = 0.0;
                    tag(&mut outcome.policies_applied, provider, "excluded");
                    touched = true;
                }
            }
        }
        if touched {
            w = normalize(&w);
        }

        // Step 3: bounded cap redistribution.
        if policy.has_caps() {
            w = self.apply_caps(w, policy.cap_top1, policy.cap_top3, &mut outcome.policies_applied);
        }

        // Step 4: round to cents and reconcile the residual in one move.
        let mut cents = round_to_cents(&w, budget_cents);
        let residual = budget_cents - cents.values().sum::<i64>();
        if residual != 0 {
            if let Some(target) = largest_amount(&cents) {
                debug!(residual_cents = residual, target = %target, "reconciling rounding drift");
                if let Some(c) = cents.get_mut(&target) {
                    *c += residual;
                }
            }
        }

        // Step 5: minimum-amount policy.
        let min_cents = to_cents(policy.min_amount).unwrap_or(0);
        if min_cents > 0 {
            let mut removed: i64 = 0;
            for (provider, c) in cents.iter_mut() {
                if *c > 0 && *c < min_cents {
                    outcome.rollover.push(RolloverEntry {
                        provider_id: provider.clone(),
                        amount: Decimal::new(*c, 2),
                    });
                    removed += *c;
                    *c = 0;
                    tag(&mut outcome.policies_applied, provider, "min_amount");
                }
            }

            if policy.reconcile_after_min && removed > 0 {
                let survivors: Vec<(ProviderId, i64)> = cents
                    .iter()
                    .filter(|(_, c)| **c > 0)
                    .map(|(p, c)| (p.clone(), *c))
                    .collect();
                let total_surviving: i64 = survivors.iter().map(|(_, c)| c).sum();
                if total_surviving > 0 {
                    for (provider, c) in &survivors {
                        let add = ((*c as f64 / total_surviving as f64) * removed as f64).round()
                            as i64;
                        if let Some(v) = cents.get_mut(provider) {
                            *v += add;
                        }
                    }
                    // One more residual correction to re-establish Σ = budget.
                    let residual = budget_cents - cents.values().sum::<i64>();
                    if residual != 0 {
                        if let Some(target) = largest_amount(&cents) {
                            if let Some(c) = cents.get_mut(&target) {
                                *c += residual;
                            }
                        }
                    }
                }
            }
        }

        outcome.amounts = cents
            .into_iter()
            .map(|(p, c)| (p, Decimal::new(c, 2)))
            .collect();
        Ok(outcome)
    }

    /// Freeze providers that exceed a cap and redistribute the excess
    /// pro-rata over the non-frozen providers, up to `max_cap_rounds` times.
    fn apply_caps(
        &self,
        mut w: BTreeMap<ProviderId, f64>,
        cap_top1: Option<f64>,
        cap_top3: Option<f64>,
        policies: &mut BTreeMap<ProviderId, Vec<String>>,
    ) -> BTreeMap<ProviderId, f64> {
        if w.is_empty() {
            return w;
        }
        let mut capped: BTreeSet<ProviderId> = BTreeSet::new();

        for round in 0..self.max_cap_rounds {
            let mut changed = false;

            if let Some(cap) = cap_top1 {
                if let Some(top1) = largest_weight(&w) {
                    let weight = w[&top1];
                    if weight > cap + EPS {
                        let excess = weight - cap;
                        capped.insert(top1.clone());
                        tag(policies, &top1, &format!("cap_top1_{cap}"));
                        redistribute(&mut w, &capped, &[(top1, excess)]);
                        changed = true;
                    }
                }
            }

            if let Some(cap) = cap_top3 {
                if w.len() >= 3 {
                    let top3 = ranked_by_weight(&w, 3);
                    let sum_top3: f64 = top3.iter().map(|(_, v)| v).sum();
                    if sum_top3 > cap + EPS {
                        let excess = sum_top3 - cap;
                        for (provider, _) in &top3 {
                            capped.insert(provider.clone());
                            let marker = format!("cap_top3_{cap}");
                            let tags = policies.entry(provider.clone()).or_default();
                            if !tags.contains(&marker) {
                                tags.push(marker);
                            }
                        }
                        // Remove the excess from the three pro-rata to their weights.
                        let excess_from: Vec<(ProviderId, f64)> = top3
                            .iter()
                            .map(|(p, v)| (p.clone(), (v / sum_top3) * excess))
                            .collect();
                        redistribute(&mut w, &capped, &excess_from);
                        changed = true;
                    }
                }
            }

            if !changed {
                break;
            }
            debug!(round, "cap redistribution round applied");
            // Renormalize to correct numerical drift.
            w = normalize(&w);
        }

        w
    }
}

impl Default for AllocationEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// Rescale positive weights to sum to 1.0; non-positive weights map to 0.
fn normalize(w: &BTreeMap<ProviderId, f64>) -> BTreeMap<ProviderId, f64> {
    let total: f64 = w.values().filter(|v| **v > 0.0).sum();
    if total <= 0.0 {
        return w.keys().map(|k| (k.clone(), 0.0)).collect();
    }
    w.iter()
        .map(|(k, v)| (k.clone(), if *v > 0.0 { v / total } else { 0.0 }))
        .collect()
}

/// Subtract the listed excesses and hand their sum pro-rata to the
/// non-frozen providers with positive weight. If none remain, fall back to
/// renormalizing over all positive weights so no budget is silently dropped.
fn redistribute(
    w: &mut BTreeMap<ProviderId, f64>,
    capped: &BTreeSet<ProviderId>,
    excess_from: &[(ProviderId, f64)],
) {
    for (provider, excess) in excess_from {
        if let Some(v) = w.get_mut(provider) {
            *v -= excess;
        }
    }

    let free: Vec<(ProviderId, f64)> = w
        .iter()
        .filter(|(p, v)| !capped.contains(*p) && **v > 0.0)
        .map(|(p, v)| (p.clone(), *v))
        .collect();
    let total_free: f64 = free.iter().map(|(_, v)| v).sum();

    if total_free <= 0.0 {
        // Degenerate: everyone with weight is frozen.
        let total_pos: f64 = w.values().filter(|v| **v > 0.0).sum();
        if total_pos > 0.0 {
            for v in w.values_mut() {
                if *v > 0.0 {
                    *v /= total_pos;
                }
            }
        }
        return;
    }

    let inc_total: f64 = excess_from.iter().map(|(_, e)| e).sum();
    for (provider, weight) in free {
        if let Some(v) = w.get_mut(&provider) {
            *v += (weight / total_free) * inc_total;
        }
    }
}

/// Multiply weights by the budget and round each amount to cents with a
/// tiny positive bias, so exact halves never round down.
fn round_to_cents(w: &BTreeMap<ProviderId, f64>, budget_cents: i64) -> BTreeMap<ProviderId, i64> {
    let budget = budget_cents as f64 / 100.0;
    w.iter()
        .map(|(p, v)| {
            let raw = v * budget;
            (p.clone(), ((raw + 1e-12) * 100.0).round() as i64)
        })
        .collect()
}

/// Provider with the largest weight; ties break on the smaller id.
fn largest_weight(w: &BTreeMap<ProviderId, f64>) -> Option<ProviderId> {
    w.iter()
        .max_by(|a, b| {
            a.1.partial_cmp(b.1)
                .unwrap_or(Ordering::Equal)
                .then_with(|| b.0.cmp(a.0))
        })
        .map(|(p, _)| p.clone())
}

/// Provider with the largest rounded amount; ties break on the smaller id.
fn largest_amount(cents: &BTreeMap<ProviderId, i64>) -> Option<ProviderId> {
    cents
        .iter()
        .max_by(|a, b| a.1.cmp(b.1).then_with(|| b.0.cmp(a.0)))
        .map(|(p, _)| p.clone())
}

/// Top `n` providers by weight, descending; ties break on the smaller id.
fn ranked_by_weight(w: &BTreeMap<ProviderId, f64>, n: usize) -> Vec<(ProviderId, f64)> {
    let mut ranked: Vec<(ProviderId, f64)> = w.iter().map(|(p, v)| (p.clone(), *v)).collect();
    ranked.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.0.cmp(&b.0))
    });
    ranked.truncate(n);
    ranked
}

fn to_cents(amount: Decimal) -> Option<i64> {
    (amount * Decimal::ONE_HUNDRED).round().to_i64()
}

fn tag(policies: &mut BTreeMap<ProviderId, Vec<String>>, provider: &ProviderId, marker: &str) {
    policies
        .entry(provider.clone())
        .or_default()
        .push(marker.to_string());
}
