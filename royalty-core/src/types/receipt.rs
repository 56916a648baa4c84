//! Receipt Record Types
//!
//! One `Receipt` per model output, asserting how credit for that output is
//! distributed across providers. Invariants are enforced at construction
//! time via [`Receipt::validate`], not re-checked ad hoc on every read.

use super::common::ROYALTY_SCHEMA;
use serde::{Deserialize, Serialize};

/// Tolerance on the per-record share sum around 1.0
pub const SHARE_SUM_TOLERANCE: f64 = 0.02;

/// One attributed slice of credit inside a receipt's `top_k`
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Allocation {
    /// 1-based rank, non-decreasing within a receipt
    pub rank: u32,
    /// Provider receiving this slice
    pub provider_id: String,
    /// Content shard the slice refers to
    pub shard_id: String,
    /// Attribution fraction, >= 0
    pub share: f64,
}

/// Attribution receipt for a single model output
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Receipt {
    pub schema: String,
    pub output_id: String,
    /// ISO-8601 timestamp; parsed only when matching against a period
    pub timestamp: String,
    pub top_k: Vec<Allocation>,
}

/// Structural invariant violation inside a single receipt
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ReceiptViolation {
    EmptyOutputId,
    EmptyTopK,
    EmptyProviderId { index: usize },
    NonPositiveRank { index: usize },
    DecreasingRank { index: usize },
    InvalidShare { index: usize },
}

impl std::fmt::Display for ReceiptViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReceiptViolation::EmptyOutputId => write!(f, "output_id is empty"),
            ReceiptViolation::EmptyTopK => write!(f, "top_k is empty"),
            ReceiptViolation::EmptyProviderId { index } => {
                write!(f, "top_k[{index}].provider_id is empty")
            }
            ReceiptViolation::NonPositiveRank { index } => {
                write!(f, "top_k[{index}].rank must be positive")
            }
            ReceiptViolation::DecreasingRank { index } => {
                write!(f, "top_k[{index}].rank decreases")
            }
            ReceiptViolation::InvalidShare { index } => {
                write!(f, "top_k[{index}].share must be finite and >= 0")
            }
        }
    }
}

impl Receipt {
    /// Check the structural invariants of this record.
    ///
    /// A violation excludes the record from aggregation (a recoverable
    /// data-quality signal); it never aborts a run.
    pub fn validate(&self) -> Result<(), ReceiptViolation> {
        if self.output_id.is_empty() {
            return Err(ReceiptViolation::EmptyOutputId);
        }
        if self.top_k.is_empty() {
            return Err(ReceiptViolation::EmptyTopK);
        }

        let mut prev_rank = 0u32;
        for (index, alloc) in self.top_k.iter().enumerate() {
            if alloc.provider_id.is_empty() {
                return Err(ReceiptViolation::EmptyProviderId { index });
            }
            if alloc.rank == 0 {
                return Err(ReceiptViolation::NonPositiveRank { index });
            }
            if alloc.rank < prev_rank {
                return Err(ReceiptViolation::DecreasingRank { index });
            }
            prev_rank = alloc.rank;
            if !alloc.share.is_finite() || alloc.share < 0.0 {
                return Err(ReceiptViolation::InvalidShare { index });
            }
        }
        Ok(())
    }

    /// True if the record carries the royalty receipt schema tag.
    pub fn has_royalty_schema(&self) -> bool {
        self.schema == ROYALTY_SCHEMA
    }

    /// Sum of attribution shares across `top_k`.
    pub fn share_sum(&self) -> f64 {
        self.top_k.iter().map(|a| a.share).sum()
    }

    /// True if the share sum is within tolerance of 1.0.
    pub fn share_sum_in_tolerance(&self) -> bool {
        let s = self.share_sum();
        s.is_finite() && s > 0.0 && (s - 1.0).abs() <= SHARE_SUM_TOLERANCE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn receipt(top_k: Vec<Allocation>) -> Receipt {
        Receipt {
            schema: ROYALTY_SCHEMA.to_string(),
            output_id: "out:1".to_string(),
            timestamp: "2025-11-01T00:00:00Z".to_string(),
            top_k,
        }
    }

    fn alloc(rank: u32, provider: &str, share: f64) -> Allocation {
        Allocation {
            rank,
            provider_id: provider.to_string(),
            shard_id: "shard:0".to_string(),
            share,
        }
    }

    #[test]
    fn test_valid_receipt() {
        let r = receipt(vec![alloc(1, "prov:a", 0.6), alloc(2, "prov:b", 0.4)]);
        assert!(r.validate().is_ok());
        assert!(r.share_sum_in_tolerance());
    }

    #[test]
    fn test_empty_top_k_rejected() {
        let r = receipt(vec![]);
        assert_eq!(r.validate(), Err(ReceiptViolation::EmptyTopK));
    }

    #[test]
    fn test_decreasing_rank_rejected() {
        let r = receipt(vec![alloc(2, "prov:a", 0.5), alloc(1, "prov:b", 0.5)]);
        assert_eq!(r.validate(), Err(ReceiptViolation::DecreasingRank { index: 1 }));
    }

    #[test]
    fn test_zero_rank_rejected() {
        let r = receipt(vec![alloc(0, "prov:a", 1.0)]);
        assert_eq!(r.validate(), Err(ReceiptViolation::NonPositiveRank { index: 0 }));
    }

    #[test]
    fn test_negative_share_rejected() {
        let r = receipt(vec![alloc(1, "prov:a", -0.1)]);
        assert_eq!(r.validate(), Err(ReceiptViolation::InvalidShare { index: 0 }));
    }

    #[test]
    fn test_share_sum_tolerance() {
        let ok = receipt(vec![alloc(1, "prov:a", 0.99)]);
        assert!(ok.share_sum_in_tolerance());
        let out = receipt(vec![alloc(1, "prov:a", 0.90)]);
        assert!(!out.share_sum_in_tolerance());
    }
}
