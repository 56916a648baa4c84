//! Settlement Data Model

pub mod common;
pub mod manifest;
pub mod payout;
pub mod receipt;

pub use common::{Period, ProviderId, PAYOUTS_SCHEMA, ROYALTY_SCHEMA};
pub use manifest::{
    Manifest, TrustBundle, MANIFEST_CONTRACT, MANIFEST_FILE, MANIFEST_SCHEMA, REQUIRED_ARTIFACTS,
    TRUST_BUNDLE_SCHEMA,
};
pub use payout::{PayoutRecord, PolicySet};
pub use receipt::{Allocation, Receipt, ReceiptViolation, SHARE_SUM_TOLERANCE};
