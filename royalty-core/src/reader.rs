//! Receipt Reader
//!
//! Streams newline-delimited JSON receipts lazily, never aborting on a
//! malformed line. Each non-empty line yields either a validated [`Receipt`]
//! or a [`LineIssue`] carrying the line number and the raw text, so callers
//! can sample bad records without halting the scan.
//!
//! Line numbers are 1-based over non-empty lines. The reader is restartable
//! by reopening the source; it holds no state beyond the cursor.

use crate::error::{CoreError, CoreResult};
use crate::types::receipt::{Receipt, ReceiptViolation};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Why a line was excluded from aggregation
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LineIssueKind {
    /// Not valid JSON (or an unreadable line)
    Parse(String),
    /// Valid JSON but not a `royalty_receipt.v1` record
    SchemaMismatch { found: String },
    /// Structurally invalid receipt
    Invalid(ReceiptViolation),
}

/// A single excluded line, with enough context to report it
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LineIssue {
    pub line_no: u64,
    pub raw: String,
    pub kind: LineIssueKind,
}

impl std::fmt::Display for LineIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.kind {
            LineIssueKind::Parse(msg) => write!(f, "line {}: parse error: {}", self.line_no, msg),
            LineIssueKind::SchemaMismatch { found } => {
                write!(f, "line {}: unexpected schema {:?}", self.line_no, found)
            }
            LineIssueKind::Invalid(v) => write!(f, "line {}: {}", self.line_no, v),
        }
    }
}

/// Item yielded per non-empty line
pub type ReadItem = (u64, Result<Receipt, LineIssue>);

/// Lazy NDJSON receipt stream
#[derive(Debug)]
pub struct ReceiptReader<R> {
    inner: R,
    line_no: u64,
    first_line: bool,
}

impl ReceiptReader<BufReader<File>> {
    /// Open a receipts file; a missing file is a fatal input error.
    pub fn open(path: impl AsRef<Path>) -> CoreResult<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                CoreError::InputNotFound {
                    path: path.display().to_string(),
                }
            } else {
                CoreError::Io(e)
            }
        })?;
        Ok(Self::new(BufReader::new(file)))
    }
}

impl<R: BufRead> ReceiptReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            line_no: 0,
            first_line: true,
        }
    }

    fn parse_line(&self, raw: &str) -> Result<Receipt, LineIssue> {
        let issue = |kind| LineIssue {
            line_no: self.line_no,
            raw: raw.to_string(),
            kind,
        };

        let receipt: Receipt = serde_json::from_str(raw)
            .map_err(|e| issue(LineIssueKind::Parse(e.to_string())))?;
        if !receipt.has_royalty_schema() {
            return Err(issue(LineIssueKind::SchemaMismatch {
                found: receipt.schema.clone(),
            }));
        }
        receipt
            .validate()
            .map_err(|v| issue(LineIssueKind::Invalid(v)))?;
        Ok(receipt)
    }
}

impl<R: BufRead> Iterator for ReceiptReader<R> {
    type Item = ReadItem;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let mut buf = String::new();
            match self.inner.read_line(&mut buf) {
                Ok(0) => return None,
                Ok(_) => {}
                Err(e) => {
                    self.line_no += 1;
                    let issue = LineIssue {
                        line_no: self.line_no,
                        raw: String::new(),
                        kind: LineIssueKind::Parse(e.to_string()),
                    };
                    return Some((self.line_no, Err(issue)));
                }
            }

            let mut s = buf.trim();
            if self.first_line {
                s = s.trim_start_matches('\u{feff}');
                self.first_line = false;
            }
            if s.is_empty() {
                continue;
            }

            self.line_no += 1;
            return Some((self.line_no, self.parse_line(s)));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn read_all(input: &str) -> Vec<ReadItem> {
        ReceiptReader::new(Cursor::new(input.to_string())).collect()
    }

    const GOOD: &str = r#"{"schema":"royalty_receipt.v1","output_id":"out:1","timestamp":"2025-11-01T00:00:00Z","top_k":[{"rank":1,"provider_id":"prov:a","shard_id":"s0","share":1.0}]}"#;

    #[test]
    fn test_reads_valid_record() {
        let items = read_all(GOOD);
        assert_eq!(items.len(), 1);
        let (line_no, result) = &items[0];
        assert_eq!(*line_no, 1);
        assert_eq!(result.as_ref().unwrap().output_id, "out:1");
    }

    #[test]
    fn test_malformed_line_does_not_abort() {
        let input = format!("{GOOD}\nnot json at all\n{GOOD}\n");
        let items = read_all(&input);
        assert_eq!(items.len(), 3);
        assert!(items[0].1.is_ok());
        assert!(matches!(
            items[1].1.as_ref().unwrap_err().kind,
            LineIssueKind::Parse(_)
        ));
        assert!(items[2].1.is_ok());
    }

    #[test]
    fn test_empty_lines_skipped_and_not_counted() {
        let input = format!("\n\n{GOOD}\n\n");
        let items = read_all(&input);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].0, 1);
    }

    #[test]
    fn test_schema_mismatch_surfaced() {
        let input = r#"{"schema":"data_receipt.v1","output_id":"x","timestamp":"t","top_k":[{"rank":1,"provider_id":"p","shard_id":"s","share":1.0}]}"#;
        let items = read_all(input);
        assert!(matches!(
            items[0].1.as_ref().unwrap_err().kind,
            LineIssueKind::SchemaMismatch { .. }
        ));
    }

    #[test]
    fn test_bom_on_first_line_tolerated() {
        let input = format!("\u{feff}{GOOD}");
        let items = read_all(&input);
        assert!(items[0].1.is_ok());
    }

    #[test]
    fn test_open_missing_file_is_fatal() {
        let err = ReceiptReader::open("/nonexistent/receipts.ndjson").unwrap_err();
        assert!(matches!(err, CoreError::InputNotFound { .. }));
    }
}
