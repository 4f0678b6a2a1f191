//! SHA-256 of local files and remote streams.
//!
//! Inputs are fed through the digest in fixed-size chunks; nothing here ever
//! holds a whole file or response body in memory.

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use crate::storage::Storage;

const BUF_SIZE: usize = 4 * 1024;

/// Default cap on how much of a remote body is hashed for comparison (100 KiB).
pub const DEFAULT_STREAM_CAP: u64 = 100 * 1024;

/// Incremental SHA-256 with an optional cap on the number of bytes consumed.
///
/// With a cap, only the first `limit` bytes contribute to the digest. Two
/// inputs that differ only past the cap hash equal.
#[derive(Debug, Clone)]
pub struct StreamHasher {
    hasher: Sha256,
    limit: Option<u64>,
    consumed: u64,
}

impl Default for StreamHasher {
    fn default() -> Self {
        Self::new()
    }
}

impl StreamHasher {
    /// Hash everything that is fed in.
    pub fn new() -> Self {
        Self {
            hasher: Sha256::new(),
            limit: None,
            consumed: 0,
        }
    }

    /// Hash at most `limit` bytes.
    pub fn with_limit(limit: u64) -> Self {
        Self {
            limit: Some(limit),
            ..Self::new()
        }
    }

    /// Feed a chunk. Returns `false` once the cap is reached and further input would be ignored.
    pub fn update(&mut self, data: &[u8]) -> bool {
        let take = match self.limit {
            Some(limit) => {
                let room = limit.saturating_sub(self.consumed);
                data.len().min(usize::try_from(room).unwrap_or(usize::MAX))
            }
            None => data.len(),
        };
        self.hasher.update(&data[..take]);
        self.consumed += take as u64;
        !self.is_full()
    }

    pub fn is_full(&self) -> bool {
        self.limit.is_some_and(|limit| self.consumed >= limit)
    }

    /// Bytes that went into the digest so far.
    pub fn consumed(&self) -> u64 {
        self.consumed
    }

    /// Finalize and render as 64 lowercase hex characters.
    pub fn finish(self) -> String {
        hex::encode(self.hasher.finalize())
    }
}

/// SHA-256 of everything `reader` yields.
pub fn sha256_reader<R: Read + ?Sized>(reader: &mut R) -> io::Result<String> {
    let mut hasher = StreamHasher::new();
    let mut buf = [0u8; BUF_SIZE];
    loop {
        let n = match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        hasher.update(&buf[..n]);
    }
    Ok(hasher.finish())
}

/// SHA-256 of a file reached through `storage`.
pub fn sha256_file<S: Storage + ?Sized>(storage: &S, path: &Path) -> io::Result<String> {
    let mut reader = storage.open_read(path)?;
    sha256_reader(&mut reader)
}

/// Compute SHA-256 of a file on disk and return the digest as lowercase hex.
pub fn sha256_path(path: &Path) -> Result<String> {
    let mut f = File::open(path).with_context(|| format!("open {}", path.display()))?;
    sha256_reader(&mut f).with_context(|| format!("read {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemStorage;
    use std::io::Write;

    const EMPTY: &str = "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";

    #[test]
    fn empty_input_digest() {
        assert_eq!(StreamHasher::new().finish(), EMPTY);
        assert_eq!(sha256_reader(&mut io::empty()).unwrap(), EMPTY);
    }

    #[test]
    fn sha256_path_known_content() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(b"hello\n").unwrap();
        f.flush().unwrap();
        let digest = sha256_path(f.path()).unwrap();
        assert_eq!(
            digest,
            "5891b5b522d5df086d0ff0b110fbd9d21bb4fc7163af34d08286a2e846f6be03"
        );
    }

    #[test]
    fn same_bytes_same_digest_across_chunkings() {
        let data: Vec<u8> = (0u8..=255).cycle().take(10_000).collect();
        let mut whole = StreamHasher::new();
        whole.update(&data);
        let mut chunked = StreamHasher::new();
        for c in data.chunks(333) {
            chunked.update(c);
        }
        let from_reader = sha256_reader(&mut &data[..]).unwrap();
        let a = whole.finish();
        assert_eq!(a, chunked.finish());
        assert_eq!(a, from_reader);
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn capped_hash_ignores_tail() {
        let mut a = StreamHasher::with_limit(8);
        assert!(a.update(b"abcd"));
        assert!(!a.update(b"efghXXXX"));
        assert_eq!(a.consumed(), 8);
        let mut b = StreamHasher::new();
        b.update(b"abcdefgh");
        assert_eq!(a.finish(), b.finish());
    }

    #[test]
    fn zero_cap_is_immediately_full() {
        let mut h = StreamHasher::with_limit(0);
        assert!(h.is_full());
        assert!(!h.update(b"abc"));
        assert_eq!(h.finish(), EMPTY);
    }

    #[test]
    fn sha256_file_through_storage() {
        let store = MemStorage::new();
        store.insert("/f", b"hello\n");
        assert_eq!(
            sha256_file(&store, Path::new("/f")).unwrap(),
            "5891b5b522d5df086d0ff0b110fbd9d21bb4fc7163af34d08286a2e846f6be03"
        );
        assert!(sha256_file(&store, Path::new("/missing")).is_err());
    }
}
