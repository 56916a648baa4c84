//! Royalty Settlement Core - Attribution, Allocation and Chain-of-Custody
//!
//! This crate turns per-output attribution receipts into a monthly payout
//! statement and wraps every emitted artifact in a verifiable custody trail:
//! - **Ingestion**: NDJSON receipt streaming with per-line recoverable issues
//! - **Aggregation**: period filtering, share-sum tolerance, weight accumulation
//! - **Allocation**: exclusions, concentration caps, minimum-amount rollover,
//!   conservation-exact cent rounding
//! - **Custody**: chunked SHA-256 hash chains over line-oriented artifacts
//!
//! # Invariants
//!
//! | Invariant | Core Requirement |
//! |-----------|------------------|
//! | **Conservation** | Allocated amounts sum to the declared budget to the cent |
//! | **Determinism** | Same inputs produce byte-identical outputs, independent of map ordering |
//! | **Never Abort on Data** | Malformed records are counted and reported, only configuration errors are fatal |
//! | **Seeded Chaining** | Every hash-chain block folds its predecessor's digest, so order and content are both bound |
//!
//! # Core Types
//!
//! - [`Receipt`]: one attributed output with its ranked provider shares
//! - [`PeriodAggregator`]: per-period provider weight accumulation
//! - [`AllocationEngine`]: policy application and cent-exact distribution
//! - [`HashChainWriter`]: chunked custody chain over an artifact
//! - [`Manifest`]: period bundle index binding artifacts to the CRC-1 contract

pub mod aggregate;
pub mod allocation;
pub mod error;
pub mod hashchain;
pub mod reader;
pub mod types;

pub use error::{CoreError, CoreResult};

pub use types::{
    Allocation, Manifest, PayoutRecord, Period, PolicySet, ProviderId, Receipt, ReceiptViolation,
    TrustBundle, MANIFEST_CONTRACT, MANIFEST_FILE, MANIFEST_SCHEMA, PAYOUTS_SCHEMA,
    REQUIRED_ARTIFACTS, ROYALTY_SCHEMA, SHARE_SUM_TOLERANCE, TRUST_BUNDLE_SCHEMA,
};

pub use aggregate::{AggregateStats, PeriodAggregator};
pub use allocation::{AllocationEngine, AllocationOutcome, RolloverEntry};
pub use hashchain::{
    ChunkSize, HashChainEntry, HashChainWriter, SourceLines, CHAIN_SEED, DEFAULT_CHUNK_SIZE,
};
pub use reader::{LineIssue, LineIssueKind, ReadItem, ReceiptReader};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
