//! Basic Settlement Types
//!
//! Naming conventions:
//! - `_id` suffix: identifiers
//! - `_agg` suffix: period-aggregated values
//! - `schema` fields: fixed wire-format tags

use crate::error::{CoreError, CoreResult};
use chrono::{DateTime, Datelike, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Wire schema tag for receipt records
pub const ROYALTY_SCHEMA: &str = "royalty_receipt.v1";

/// Wire schema tag for payout records
pub const PAYOUTS_SCHEMA: &str = "payouts.v1";

/// Provider ID (newtype, non-interchangeable with other string ids)
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProviderId(pub String);

impl ProviderId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ProviderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Settlement period (one calendar month)
///
/// The textual form is strict: `YYYY-MM` with a zero-padded two-digit month.
/// A non-zero-padded month is a fatal configuration error, not a recoverable
/// data issue.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Period {
    pub year: i32,
    pub month: u32,
}

impl Period {
    /// Parse a strict `YYYY-MM` period string.
    pub fn parse(s: &str) -> CoreResult<Self> {
        let invalid = || CoreError::InvalidPeriod {
            value: s.to_string(),
        };

        let (y, m) = s.split_once('-').ok_or_else(invalid)?;
        if y.len() != 4
            || m.len() != 2
            || !y.bytes().all(|b| b.is_ascii_digit())
            || !m.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(invalid());
        }

        let year: i32 = y.parse().map_err(|_| invalid())?;
        let month: u32 = m.parse().map_err(|_| invalid())?;
        if !(1..=12).contains(&month) {
            return Err(invalid());
        }

        Ok(Self { year, month })
    }

    /// True if the ISO-8601 timestamp falls inside this period.
    ///
    /// Unparseable timestamps never match; the caller counts them as
    /// out-of-period, mirroring the recoverable-data policy.
    pub fn contains_timestamp(&self, ts: &str) -> bool {
        match parse_iso_year_month(ts) {
            Some((year, month)) => year == self.year && month == self.month,
            None => false,
        }
    }
}

impl std::fmt::Display for Period {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

/// Extract (year, month) from an ISO-8601 timestamp, with or without offset.
fn parse_iso_year_month(ts: &str) -> Option<(i32, u32)> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(ts) {
        return Some((dt.year(), dt.month()));
    }
    // Offset-less timestamps ("2025-11-01T00:00:00") are accepted as-is.
    if let Ok(dt) = NaiveDateTime::parse_from_str(ts, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some((dt.year(), dt.month()));
    }
    None
}
