//! Hash-Chain Writer
//!
//! Builds a rolling SHA-256 chain over a line-oriented artifact in
//! fixed-size chunks. Each block digest folds the previous block's finished
//! digest (32 zero bytes for the first block) with the raw UTF-8 bytes of
//! every line in the block, newline stripped. The chain is intentionally
//! sequential: each block is seeded by its predecessor, so reordering or
//! truncation is detectable by the verifier.
//!
//! Blank lines are skipped entirely and count toward neither the chunk nor
//! the cumulative line counter.

use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::path::Path;

/// Default lines per block
pub const DEFAULT_CHUNK_SIZE: i64 = 10_000;

/// Anchor for the first block: 32 zero bytes
pub const CHAIN_SEED: [u8; 32] = [0u8; 32];

/// Validated chunk size; zero or negative is a fatal configuration error
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChunkSize(usize);

impl ChunkSize {
    pub fn new(value: i64) -> CoreResult<Self> {
        if value <= 0 {
            return Err(CoreError::InvalidChunkSize { value });
        }
        Ok(Self(value as usize))
    }

    pub fn get(&self) -> usize {
        self.0
    }
}

impl Default for ChunkSize {
    fn default() -> Self {
        Self(DEFAULT_CHUNK_SIZE as usize)
    }
}

/// One block of the chain; created by the writer, never mutated
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HashChainEntry {
    /// 0-based, strictly increasing, gapless
    pub block_index: u64,
    /// Cumulative non-empty line count up to and including this block
    pub line_count_upto: u64,
    /// 64 lowercase hex chars (SHA-256)
    pub digest: String,
}

impl HashChainEntry {
    /// Tab-separated wire form: `<block_index>\t<line_count_upto>\t<digest>`.
    pub fn to_line(&self) -> String {
        format!("{}\t{}\t{}", self.block_index, self.line_count_upto, self.digest)
    }

    /// Strict parse of one chain-file line. `None` means the line is
    /// structurally malformed (the verifier reports it, never skips it).
    pub fn parse_line(line: &str) -> Option<Self> {
        let mut parts = line.split('\t');
        let block_index = parts.next()?.parse().ok()?;
        let line_count_upto = parts.next()?.parse().ok()?;
        let digest = parts.next()?.to_string();
        if parts.next().is_some() {
            return None;
        }
        Some(Self {
            block_index,
            line_count_upto,
            digest,
        })
    }

    /// True if the digest is exactly 64 chars of `[0-9a-f]`.
    pub fn digest_is_wellformed(&self) -> bool {
        self.digest.len() == 64
            && self
                .digest
                .bytes()
                .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
    }
}

/// Iterator over the chained lines of a source: newline stripped, BOM
/// stripped on the first line, empty lines skipped. Shared by the writer
/// and the verifier so both fold exactly the same bytes.
pub struct SourceLines<R> {
    inner: R,
    first_line: bool,
}

impl<R: BufRead> SourceLines<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            first_line: true,
        }
    }
}

impl<R: BufRead> Iterator for SourceLines<R> {
    type Item = std::io::Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let mut buf = String::new();
            match self.inner.read_line(&mut buf) {
                Ok(0) => return None,
                Ok(_) => {}
                Err(e) => return Some(Err(e)),
            }

            let mut s = buf.as_str();
            if let Some(stripped) = s.strip_suffix('\n') {
                s = stripped;
            }
            if let Some(stripped) = s.strip_suffix('\r') {
                s = stripped;
            }
            if self.first_line {
                s = s.trim_start_matches('\u{feff}');
                self.first_line = false;
            }
            if s.is_empty() {
                continue;
            }
            return Some(Ok(s.to_string()));
        }
    }
}

/// Hash-chain writer
pub struct HashChainWriter {
    chunk: ChunkSize,
}

impl HashChainWriter {
    pub fn new(chunk: ChunkSize) -> Self {
        Self { chunk }
    }

    pub fn chunk(&self) -> ChunkSize {
        self.chunk
    }

    /// Compute the chain entries for a source stream.
    pub fn build<R: BufRead>(&self, reader: R) -> CoreResult<Vec<HashChainEntry>> {
        let chunk = self.chunk.get() as u64;
        let mut entries = Vec::new();

        let mut prev = CHAIN_SEED;
        let mut hasher = Sha256::new();
        let mut count: u64 = 0;
        let mut block_index: u64 = 0;

        for line in SourceLines::new(reader) {
            let line = line?;
            hasher.update(prev);
            hasher.update(line.as_bytes());
            count += 1;

            if count % chunk == 0 {
                let digest = std::mem::take(&mut hasher).finalize();
                entries.push(HashChainEntry {
                    block_index,
                    line_count_upto: count,
                    digest: hex::encode(digest),
                });
                prev = digest.into();
                block_index += 1;
            }
        }

        // Flush the final partial block, if any. An empty source produces
        // zero entries.
        if count % chunk != 0 {
            let digest = hasher.finalize();
            entries.push(HashChainEntry {
                block_index,
                line_count_upto: count,
                digest: hex::encode(digest),
            });
        }

        Ok(entries)
    }

    /// Build the chain for `source` and write it to `out`, one entry per
    /// line. Fails before any output I/O if the source is missing.
    pub fn write_file(&self, source: &Path, out: &Path) -> CoreResult<Vec<HashChainEntry>> {
        let file = File::open(source).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                CoreError::InputNotFound {
                    path: source.display().to_string(),
                }
            } else {
                CoreError::Io(e)
            }
        })?;
        let entries = self.build(BufReader::new(file))?;

        if let Some(parent) = out.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let mut writer = File::create(out)?;
        for entry in &entries {
            writeln!(writer, "{}", entry.to_line())?;
        }

        tracing::info!(
            source = %source.display(),
            out = %out.display(),
            blocks = entries.len(),
            "hash chain written"
        );
        Ok(entries)
    }
}

/// Default chain-file path for a source: `proofs/hashchain_<basename>.txt`.
pub fn default_chain_path(source: &Path) -> std::path::PathBuf {
    let base = source
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "source".to_string());
    Path::new("proofs").join(format!("hashchain_{base}.txt"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn build(input: &str, chunk: i64) -> Vec<HashChainEntry> {
        HashChainWriter::new(ChunkSize::new(chunk).unwrap())
            .build(Cursor::new(input.to_string()))
            .unwrap()
    }

    #[test]
    fn test_chunk_size_rejects_zero_and_negative() {
        assert!(matches!(
            ChunkSize::new(0),
            Err(CoreError::InvalidChunkSize { value: 0 })
        ));
        assert!(ChunkSize::new(-1).is_err());
        assert_eq!(ChunkSize::new(3).unwrap().get(), 3);
    }

    #[test]
    fn test_empty_source_produces_no_entries() {
        assert!(build("", 3).is_empty());
        assert!(build("\n\n\n", 3).is_empty());
    }

    #[test]
    fn test_exact_boundary_produces_no_partial_block() {
        let input = "a\nb\nc\nd\ne\nf\n";
        let entries = build(input, 3);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].block_index, 0);
        assert_eq!(entries[0].line_count_upto, 3);
        assert_eq!(entries[1].block_index, 1);
        assert_eq!(entries[1].line_count_upto, 6);
    }

    #[test]
    fn test_partial_final_block_emitted() {
        let entries = build("a\nb\nc\nd\n", 3);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].line_count_upto, 4);
    }

    #[test]
    fn test_blank_lines_do_not_count() {
        let with_blanks = "a\n\nb\n\n\nc\n";
        let without = "a\nb\nc\n";
        assert_eq!(build(with_blanks, 3), build(without, 3));
    }

    #[test]
    fn test_blocks_are_seed_chained() {
        // Same second-block content, different first block: the second
        // block's digest must differ because its seed differs.
        let a = build("x\ny\n", 1);
        let b = build("z\ny\n", 1);
        assert_ne!(a[0].digest, b[0].digest);
        assert_ne!(a[1].digest, b[1].digest);
    }

    #[test]
    fn test_first_block_digest_is_reproducible() {
        let mut hasher = Sha256::new();
        hasher.update(CHAIN_SEED);
        hasher.update(b"hello");
        let expected = hex::encode(hasher.finalize());

        let entries = build("hello\n", 10);
        assert_eq!(entries[0].digest, expected);
        assert_eq!(entries[0].block_index, 0);
        assert_eq!(entries[0].line_count_upto, 1);
    }

    #[test]
    fn test_entry_line_roundtrip() {
        let entry = HashChainEntry {
            block_index: 4,
            line_count_upto: 40_000,
            digest: "ab".repeat(32),
        };
        assert!(entry.digest_is_wellformed());
        let parsed = HashChainEntry::parse_line(&entry.to_line()).unwrap();
        assert_eq!(parsed, entry);
    }

    #[test]
    fn test_parse_rejects_malformed_lines() {
        assert!(HashChainEntry::parse_line("0\t1").is_none());
        assert!(HashChainEntry::parse_line("0\t1\tx\textra").is_none());
        assert!(HashChainEntry::parse_line("zero\t1\tdeadbeef").is_none());
    }

    #[test]
    fn test_non_hex_digest_flagged() {
        let entry = HashChainEntry {
            block_index: 0,
            line_count_upto: 1,
            digest: "Z".repeat(64),
        };
        assert!(!entry.digest_is_wellformed());
        let short = HashChainEntry {
            block_index: 0,
            line_count_upto: 1,
            digest: "abc".to_string(),
        };
        assert!(!short.digest_is_wellformed());
    }

    #[test]
    fn test_write_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("receipts.ndjson");
        std::fs::write(&source, "a\nb\nc\nd\n").unwrap();
        let out = dir.path().join("proofs").join("hashchain.txt");

        let writer = HashChainWriter::new(ChunkSize::new(3).unwrap());
        let entries = writer.write_file(&source, &out).unwrap();
        assert_eq!(entries.len(), 2);

        let written = std::fs::read_to_string(&out).unwrap();
        let parsed: Vec<HashChainEntry> = written
            .lines()
            .map(|l| HashChainEntry::parse_line(l).unwrap())
            .collect();
        assert_eq!(parsed, entries);
    }

    #[test]
    fn test_write_file_missing_source_is_fatal_before_output() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("chain.txt");
        let writer = HashChainWriter::new(ChunkSize::new(3).unwrap());
        let err = writer
            .write_file(Path::new("/nonexistent.ndjson"), &out)
            .unwrap_err();
        assert!(matches!(err, CoreError::InputNotFound { .. }));
        assert!(!out.exists());
    }

    #[test]
    fn test_default_chain_path() {
        let p = default_chain_path(Path::new("/data/payouts.ndjson"));
        assert_eq!(p, Path::new("proofs/hashchain_payouts.ndjson.txt"));
    }
}
