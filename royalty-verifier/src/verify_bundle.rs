//! Bundle Verification
//!
//! Verifies a period settlement bundle directory against the CRC-1 manifest
//! contract: manifest shape, required artifacts, path containment, trust
//! bundle consistency, and the custody chain over the receipts artifact.
//!
//! Artifact paths are resolved with `canonicalize` and checked for
//! containment in the resolved bundle root, so `..` segments and symlinks
//! pointing outside the bundle are both rejected.

use crate::error::{VerifierError, VerifierResult};
use crate::verify_chain::{ChainVerificationResult, ChainVerifier};
use chrono::{DateTime, Utc};
use royalty_core::hashchain::ChunkSize;
use royalty_core::types::{
    Manifest, TrustBundle, MANIFEST_CONTRACT, MANIFEST_FILE, MANIFEST_SCHEMA, TRUST_BUNDLE_SCHEMA,
};
use std::path::{Path, PathBuf};

/// One integrity finding against the bundle
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BundleVerificationError {
    pub code: String,
    pub message: String,
}

impl BundleVerificationError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for BundleVerificationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

/// Bundle verification result
#[derive(Clone, Debug)]
pub struct BundleVerificationResult {
    /// Overall validity
    pub is_valid: bool,
    /// Findings
    pub errors: Vec<BundleVerificationError>,
    /// Non-blocking observations
    pub warnings: Vec<String>,
    /// Chain verification detail, when the chain check could run
    pub chain: Option<ChainVerificationResult>,
    /// Verification timestamp
    pub verified_at: DateTime<Utc>,
}

impl BundleVerificationResult {
    /// One-line PASS/FAIL summary.
    pub fn summary(&self) -> String {
        if self.is_valid {
            "VERIFIED: bundle conforms to CRC-1".to_string()
        } else {
            format!("FAIL: {} finding(s)", self.errors.len())
        }
    }
}

/// CRC-1 bundle verifier
pub struct BundleVerifier {
    chunk: ChunkSize,
}

impl BundleVerifier {
    pub fn new() -> Self {
        Self {
            chunk: ChunkSize::default(),
        }
    }

    /// Use a non-default chunk size for the chain check.
    pub fn with_chunk(mut self, chunk: ChunkSize) -> Self {
        self.chunk = chunk;
        self
    }

    /// Verify a bundle directory. Only an unusable directory is fatal;
    /// everything else becomes findings in the result.
    pub fn verify(&self, bundle_dir: &Path) -> VerifierResult<BundleVerificationResult> {
        if !bundle_dir.is_dir() {
            return Err(VerifierError::BundleNotFound {
                path: bundle_dir.display().to_string(),
            });
        }

        let mut errors = Vec::new();
        let mut warnings = Vec::new();

        // 1. Manifest present and parseable. Without it nothing else can
        //    be checked.
        let manifest_path = bundle_dir.join(MANIFEST_FILE);
        let manifest: Manifest = match std::fs::read_to_string(&manifest_path) {
            Ok(text) => match serde_json::from_str(&text) {
                Ok(m) => m,
                Err(e) => {
                    errors.push(BundleVerificationError::new(
                        "MANIFEST_PARSE",
                        format!("{MANIFEST_FILE}: {e}"),
                    ));
                    return Ok(Self::failed(errors, warnings));
                }
            },
            Err(e) => {
                errors.push(BundleVerificationError::new(
                    "MANIFEST_MISSING",
                    format!("{MANIFEST_FILE}: {e}"),
                ));
                return Ok(Self::failed(errors, warnings));
            }
        };

        // 2. Contract identity.
        if manifest.schema != MANIFEST_SCHEMA {
            errors.push(BundleVerificationError::new(
                "MANIFEST_SCHEMA_MISMATCH",
                format!("expected {MANIFEST_SCHEMA:?}, got {:?}", manifest.schema),
            ));
        }
        if manifest.contract != MANIFEST_CONTRACT {
            errors.push(BundleVerificationError::new(
                "CONTRACT_MISMATCH",
                format!("expected {MANIFEST_CONTRACT:?}, got {:?}", manifest.contract),
            ));
        }
        if manifest.period.is_none() {
            warnings.push("manifest declares no period".to_string());
        }

        // 3. Required artifact keys.
        for key in manifest.missing_artifacts() {
            errors.push(BundleVerificationError::new(
                "MISSING_ARTIFACT",
                format!("manifest does not declare artifact {key:?}"),
            ));
        }

        // 4. Artifact paths resolve inside the bundle and exist.
        let mut resolved: std::collections::BTreeMap<&str, PathBuf> = Default::default();
        for (key, rel) in &manifest.artifacts {
            match self.resolve_artifact(bundle_dir, rel) {
                Ok(path) => {
                    resolved.insert(key.as_str(), path);
                }
                Err(finding) => errors.push(BundleVerificationError::new(
                    finding.0,
                    format!("artifact {key:?} ({rel}): {}", finding.1),
                )),
            }
        }

        // 5. Trust bundle shape and period consistency.
        if let Some(path) = resolved.get("trust_bundle") {
            match std::fs::read_to_string(path)
                .map_err(|e| e.to_string())
                .and_then(|text| {
                    serde_json::from_str::<TrustBundle>(&text).map_err(|e| e.to_string())
                }) {
                Ok(trust) => {
                    if trust.schema != TRUST_BUNDLE_SCHEMA {
                        errors.push(BundleVerificationError::new(
                            "TRUST_BUNDLE_SCHEMA_MISMATCH",
                            format!("expected {TRUST_BUNDLE_SCHEMA:?}, got {:?}", trust.schema),
                        ));
                    }
                    if let Some(period) = &manifest.period {
                        if &trust.period != period {
                            errors.push(BundleVerificationError::new(
                                "PERIOD_MISMATCH",
                                format!(
                                    "manifest period {period:?} != trust bundle period {:?}",
                                    trust.period
                                ),
                            ));
                        }
                    }
                }
                Err(e) => errors.push(BundleVerificationError::new(
                    "TRUST_BUNDLE_PARSE",
                    format!("trust bundle: {e}"),
                )),
            }
        }

        // 6. Custody chain over the receipts artifact.
        let mut chain_result = None;
        if let (Some(receipts), Some(chain)) =
            (resolved.get("receipts"), resolved.get("hashchain"))
        {
            let result = ChainVerifier::new(self.chunk).verify_files(receipts, chain)?;
            for finding in &result.errors {
                errors.push(BundleVerificationError::new(
                    finding.code.clone(),
                    finding.message.clone(),
                ));
            }
            chain_result = Some(result);
        }

        Ok(BundleVerificationResult {
            is_valid: errors.is_empty(),
            errors,
            warnings,
            chain: chain_result,
            verified_at: Utc::now(),
        })
    }

    fn failed(
        errors: Vec<BundleVerificationError>,
        warnings: Vec<String>,
    ) -> BundleVerificationResult {
        BundleVerificationResult {
            is_valid: false,
            errors,
            warnings,
            chain: None,
            verified_at: Utc::now(),
        }
    }

    /// Resolve one manifest path to a canonical location inside the bundle.
    ///
    /// Path safety is checked before existence: a lexical containment check
    /// rejects absolute paths and `..` escapes even when the target does not
    /// exist, then canonicalization catches symlink escapes for paths that do.
    fn resolve_artifact(
        &self,
        bundle_dir: &Path,
        rel: &str,
    ) -> Result<PathBuf, (&'static str, String)> {
        if !is_lexically_contained(Path::new(rel)) {
            return Err((
                "PATH_TRAVERSAL",
                "escapes the bundle directory".to_string(),
            ));
        }
        let root = bundle_dir
            .canonicalize()
            .map_err(|e| ("ARTIFACT_NOT_FOUND", e.to_string()))?;
        let joined = bundle_dir.join(rel);
        let path = joined
            .canonicalize()
            .map_err(|_| ("ARTIFACT_NOT_FOUND", "file does not exist".to_string()))?;
        if !path.starts_with(&root) {
            return Err((
                "PATH_TRAVERSAL",
                format!("resolves outside the bundle to {}", path.display()),
            ));
        }
        Ok(path)
    }
}

impl Default for BundleVerifier {
    fn default() -> Self {
        Self::new()
    }
}

/// Lexical containment: relative, and no `..` sequence may climb above the
/// starting directory at any point.
fn is_lexically_contained(rel: &Path) -> bool {
    use std::path::Component;

    if rel.is_absolute() {
        return false;
    }
    let mut depth: i32 = 0;
    for component in rel.components() {
        match component {
            Component::Normal(_) => depth += 1,
            Component::ParentDir => {
                depth -= 1;
                if depth < 0 {
                    return false;
                }
            }
            Component::CurDir => {}
            Component::RootDir | Component::Prefix(_) => return false,
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use royalty_core::hashchain::HashChainWriter;
    use std::collections::BTreeMap;
    use std::fs;

    fn codes(result: &BundleVerificationResult) -> Vec<&str> {
        result.errors.iter().map(|e| e.code.as_str()).collect()
    }

    /// Builds a complete, internally consistent bundle in `dir`.
    fn write_bundle(dir: &Path, receipts: &str, chunk: i64) {
        fs::write(dir.join("receipts.ndjson"), receipts).unwrap();
        fs::write(dir.join("validate_report.md"), "# validation\nok\n").unwrap();

        HashChainWriter::new(ChunkSize::new(chunk).unwrap())
            .write_file(&dir.join("receipts.ndjson"), &dir.join("hashchain.txt"))
            .unwrap();

        let mut artifacts = BTreeMap::new();
        artifacts.insert("receipts".to_string(), "receipts.ndjson".to_string());
        artifacts.insert(
            "validate_report".to_string(),
            "validate_report.md".to_string(),
        );
        artifacts.insert("hashchain".to_string(), "hashchain.txt".to_string());
        artifacts.insert("trust_bundle".to_string(), "trust_bundle.json".to_string());

        let trust = TrustBundle::for_period("2025-11", artifacts.clone());
        fs::write(
            dir.join("trust_bundle.json"),
            serde_json::to_string_pretty(&trust).unwrap(),
        )
        .unwrap();

        let manifest = Manifest::for_period("2025-11", artifacts);
        fs::write(
            dir.join(MANIFEST_FILE),
            serde_json::to_string_pretty(&manifest).unwrap(),
        )
        .unwrap();
    }

    fn verifier(chunk: i64) -> BundleVerifier {
        BundleVerifier::new().with_chunk(ChunkSize::new(chunk).unwrap())
    }

    #[test]
    fn test_complete_bundle_verifies() {
        let dir = tempfile::tempdir().unwrap();
        write_bundle(dir.path(), "a\nb\nc\n", 2);

        let result = verifier(2).verify(dir.path()).unwrap();
        assert!(result.is_valid, "{:?}", result.errors);
        assert!(result.chain.is_some());
    }

    #[test]
    fn test_missing_bundle_dir_is_fatal() {
        let err = verifier(2)
            .verify(Path::new("/nonexistent/bundle"))
            .unwrap_err();
        assert!(matches!(err, VerifierError::BundleNotFound { .. }));
    }

    #[test]
    fn test_missing_manifest_fails() {
        let dir = tempfile::tempdir().unwrap();
        let result = verifier(2).verify(dir.path()).unwrap();
        assert_eq!(codes(&result), vec!["MANIFEST_MISSING"]);
    }

    #[test]
    fn test_unparseable_manifest_fails() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(MANIFEST_FILE), "{ not json").unwrap();
        let result = verifier(2).verify(dir.path()).unwrap();
        assert_eq!(codes(&result), vec!["MANIFEST_PARSE"]);
    }

    #[test]
    fn test_wrong_contract_flagged() {
        let dir = tempfile::tempdir().unwrap();
        write_bundle(dir.path(), "a\n", 2);

        let text = fs::read_to_string(dir.path().join(MANIFEST_FILE)).unwrap();
        let mut manifest: Manifest = serde_json::from_str(&text).unwrap();
        manifest.contract = "CRC-0".to_string();
        fs::write(
            dir.path().join(MANIFEST_FILE),
            serde_json::to_string(&manifest).unwrap(),
        )
        .unwrap();

        let result = verifier(2).verify(dir.path()).unwrap();
        assert!(codes(&result).contains(&"CONTRACT_MISMATCH"));
    }

    #[test]
    fn test_missing_artifact_key_flagged() {
        let dir = tempfile::tempdir().unwrap();
        write_bundle(dir.path(), "a\n", 2);

        let text = fs::read_to_string(dir.path().join(MANIFEST_FILE)).unwrap();
        let mut manifest: Manifest = serde_json::from_str(&text).unwrap();
        manifest.artifacts.remove("validate_report");
        fs::write(
            dir.path().join(MANIFEST_FILE),
            serde_json::to_string(&manifest).unwrap(),
        )
        .unwrap();

        let result = verifier(2).verify(dir.path()).unwrap();
        assert!(codes(&result).contains(&"MISSING_ARTIFACT"));
    }

    #[test]
    fn test_missing_artifact_file_flagged() {
        let dir = tempfile::tempdir().unwrap();
        write_bundle(dir.path(), "a\n", 2);
        fs::remove_file(dir.path().join("validate_report.md")).unwrap();

        let result = verifier(2).verify(dir.path()).unwrap();
        assert!(codes(&result).contains(&"ARTIFACT_NOT_FOUND"));
    }

    #[test]
    fn test_path_traversal_rejected() {
        let outer = tempfile::tempdir().unwrap();
        let secret = outer.path().join("secret.txt");
        fs::write(&secret, "outside").unwrap();

        let bundle = outer.path().join("bundle");
        fs::create_dir(&bundle).unwrap();
        write_bundle(&bundle, "a\n", 2);

        let text = fs::read_to_string(bundle.join(MANIFEST_FILE)).unwrap();
        let mut manifest: Manifest = serde_json::from_str(&text).unwrap();
        manifest
            .artifacts
            .insert("receipts".to_string(), "../secret.txt".to_string());
        fs::write(
            bundle.join(MANIFEST_FILE),
            serde_json::to_string(&manifest).unwrap(),
        )
        .unwrap();

        let result = verifier(2).verify(&bundle).unwrap();
        assert!(codes(&result).contains(&"PATH_TRAVERSAL"));
    }

    #[test]
    fn test_path_traversal_to_nonexistent_target_rejected() {
        // The escape must be flagged as traversal even when nothing exists
        // at the target, not downgraded to a missing-artifact finding.
        let dir = tempfile::tempdir().unwrap();
        write_bundle(dir.path(), "a\n", 2);

        let text = fs::read_to_string(dir.path().join(MANIFEST_FILE)).unwrap();
        let mut manifest: Manifest = serde_json::from_str(&text).unwrap();
        manifest.artifacts.insert(
            "trust_bundle".to_string(),
            "../../../outside/nonexistent.json".to_string(),
        );
        fs::write(
            dir.path().join(MANIFEST_FILE),
            serde_json::to_string(&manifest).unwrap(),
        )
        .unwrap();

        let result = verifier(2).verify(dir.path()).unwrap();
        assert!(codes(&result).contains(&"PATH_TRAVERSAL"));
        assert!(!codes(&result).contains(&"ARTIFACT_NOT_FOUND"));
    }

    #[test]
    fn test_absolute_artifact_path_rejected() {
        let dir = tempfile::tempdir().unwrap();
        write_bundle(dir.path(), "a\n", 2);

        let text = fs::read_to_string(dir.path().join(MANIFEST_FILE)).unwrap();
        let mut manifest: Manifest = serde_json::from_str(&text).unwrap();
        manifest
            .artifacts
            .insert("receipts".to_string(), "/etc/hostname".to_string());
        fs::write(
            dir.path().join(MANIFEST_FILE),
            serde_json::to_string(&manifest).unwrap(),
        )
        .unwrap();

        let result = verifier(2).verify(dir.path()).unwrap();
        assert!(codes(&result).contains(&"PATH_TRAVERSAL"));
    }

    #[test]
    fn test_lexical_containment() {
        assert!(is_lexically_contained(Path::new("receipts.ndjson")));
        assert!(is_lexically_contained(Path::new("proofs/chain.txt")));
        assert!(is_lexically_contained(Path::new("a/../b.txt")));
        assert!(!is_lexically_contained(Path::new("../secret.txt")));
        assert!(!is_lexically_contained(Path::new("a/../../b.txt")));
        assert!(!is_lexically_contained(Path::new("/etc/hostname")));
    }

    #[test]
    fn test_tampered_receipts_break_chain() {
        let dir = tempfile::tempdir().unwrap();
        write_bundle(dir.path(), "a\nb\nc\n", 2);
        fs::write(dir.path().join("receipts.ndjson"), "a\nX\nc\n").unwrap();

        let result = verifier(2).verify(dir.path()).unwrap();
        assert!(!result.is_valid);
        assert!(codes(&result).contains(&"DIGEST_MISMATCH"));
    }

    #[test]
    fn test_trust_bundle_period_mismatch_flagged() {
        let dir = tempfile::tempdir().unwrap();
        write_bundle(dir.path(), "a\n", 2);

        let text = fs::read_to_string(dir.path().join("trust_bundle.json")).unwrap();
        let mut trust: TrustBundle = serde_json::from_str(&text).unwrap();
        trust.period = "2025-12".to_string();
        fs::write(
            dir.path().join("trust_bundle.json"),
            serde_json::to_string(&trust).unwrap(),
        )
        .unwrap();

        let result = verifier(2).verify(dir.path()).unwrap();
        assert!(codes(&result).contains(&"PERIOD_MISMATCH"));
    }

    #[test]
    fn test_trust_bundle_wrong_schema_flagged() {
        let dir = tempfile::tempdir().unwrap();
        write_bundle(dir.path(), "a\n", 2);

        let text = fs::read_to_string(dir.path().join("trust_bundle.json")).unwrap();
        let mut trust: TrustBundle = serde_json::from_str(&text).unwrap();
        trust.schema = "something.else.v9".to_string();
        fs::write(
            dir.path().join("trust_bundle.json"),
            serde_json::to_string(&trust).unwrap(),
        )
        .unwrap();

        let result = verifier(2).verify(dir.path()).unwrap();
        assert!(codes(&result).contains(&"TRUST_BUNDLE_SCHEMA_MISMATCH"));
    }
}
