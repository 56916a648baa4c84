//! Manifest and Trust-Bundle Types
//!
//! The manifest is the only serialized handoff contract between pipeline
//! stages: it names the artifacts of a self-contained, offline-verifiable
//! evidence bundle. Created once at bundle-build time, read-only at
//! verification time.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Fixed manifest schema tag
pub const MANIFEST_SCHEMA: &str = "royalty.manifest.v1";

/// Fixed verification-contract tag
pub const MANIFEST_CONTRACT: &str = "CRC-1";

/// Fixed trust-bundle schema tag
pub const TRUST_BUNDLE_SCHEMA: &str = "royalty.trust_bundle.v1";

/// File name of the manifest inside a bundle directory
pub const MANIFEST_FILE: &str = "MANIFEST.json";

/// Artifact keys every manifest must declare
pub const REQUIRED_ARTIFACTS: [&str; 4] =
    ["receipts", "validate_report", "hashchain", "trust_bundle"];

/// Bundle manifest (CRC-1 contract)
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Manifest {
    pub schema: String,
    pub contract: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub period: Option<String>,
    /// Logical artifact name -> path relative to the bundle directory
    pub artifacts: BTreeMap<String, String>,
}

impl Manifest {
    pub fn for_period(period: impl Into<String>, artifacts: BTreeMap<String, String>) -> Self {
        Self {
            schema: MANIFEST_SCHEMA.to_string(),
            contract: MANIFEST_CONTRACT.to_string(),
            period: Some(period.into()),
            artifacts,
        }
    }

    /// Required artifact keys missing from this manifest, in fixed order.
    pub fn missing_artifacts(&self) -> Vec<&'static str> {
        REQUIRED_ARTIFACTS
            .iter()
            .copied()
            .filter(|key| !self.artifacts.contains_key(*key))
            .collect()
    }
}

/// Minimal trust bundle referencing the period artifacts
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TrustBundle {
    pub schema: String,
    pub period: String,
    pub artifacts: BTreeMap<String, String>,
}

impl TrustBundle {
    pub fn for_period(period: impl Into<String>, artifacts: BTreeMap<String, String>) -> Self {
        Self {
            schema: TRUST_BUNDLE_SCHEMA.to_string(),
            period: period.into(),
            artifacts,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manifest_missing_artifacts() {
        let mut artifacts = BTreeMap::new();
        artifacts.insert("receipts".to_string(), "receipts.ndjson".to_string());
        artifacts.insert("hashchain".to_string(), "hashchain.txt".to_string());

        let manifest = Manifest::for_period("2025-11", artifacts);
        assert_eq!(manifest.schema, MANIFEST_SCHEMA);
        assert_eq!(manifest.contract, MANIFEST_CONTRACT);
        assert_eq!(
            manifest.missing_artifacts(),
            vec!["validate_report", "trust_bundle"]
        );
    }

    #[test]
    fn test_manifest_roundtrip() {
        let mut artifacts = BTreeMap::new();
        for key in REQUIRED_ARTIFACTS {
            artifacts.insert(key.to_string(), format!("{key}.file"));
        }
        let manifest = Manifest::for_period("2025-11", artifacts);

        let json = serde_json::to_string(&manifest).unwrap();
        let parsed: Manifest = serde_json::from_str(&json).unwrap();
        assert!(parsed.missing_artifacts().is_empty());
        assert_eq!(parsed.period.as_deref(), Some("2025-11"));
    }
}
