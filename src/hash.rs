use serde::{Serialize, Serializer};
use std::collections::HashMap;
use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

const CHUNK_BYTES: usize = 64 * 1024; // 64 KB

/// BLAKE3 digest of a file's full content.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Digest([u8; 32]);

impl Digest {
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        blake3::Hash::from(self.0).to_hex().to_string()
    }
}

impl From<blake3::Hash> for Digest {
    fn from(hash: blake3::Hash) -> Self {
        Self(*hash.as_bytes())
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Digest({})", self.to_hex())
    }
}

impl Serialize for Digest {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

/// Hash the entire file content in fixed-size chunks.
/// Returns the digest and the number of bytes read.
pub fn hash_file(path: &Path) -> std::io::Result<(Digest, u64)> {
    let mut file = File::open(path)?;
    let mut hasher = blake3::Hasher::new();
    let mut buf = vec![0u8; CHUNK_BYTES];
    let mut total = 0u64;
    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
        total += n as u64;
    }
    Ok((hasher.finalize().into(), total))
}

/// Compare two files byte for byte.
pub fn same_content(a: &Path, b: &Path) -> Result<bool> {
    let mut fa = File::open(a).map_err(|source| read_error(a, source))?;
    let mut fb = File::open(b).map_err(|source| read_error(b, source))?;
    let mut buf_a = vec![0u8; CHUNK_BYTES];
    let mut buf_b = vec![0u8; CHUNK_BYTES];
    loop {
        let n = read_full(&mut fa, &mut buf_a).map_err(|source| read_error(a, source))?;
        let m = read_full(&mut fb, &mut buf_b).map_err(|source| read_error(b, source))?;
        if n != m || buf_a[..n] != buf_b[..m] {
            return Ok(false);
        }
        if n == 0 {
            return Ok(true);
        }
    }
}

// Fill `buf` unless EOF comes first, so both sides of a comparison advance in lockstep.
fn read_full(file: &mut File, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match file.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

fn read_error(path: &Path, source: std::io::Error) -> Error {
    Error::Read {
        path: path.to_path_buf(),
        source,
    }
}

/// Per-run memoizing hasher. Each distinct path is read from disk at most
/// once; the cache is never evicted and dies with the hasher.
#[derive(Debug, Default)]
pub struct ContentHasher {
    cache: HashMap<PathBuf, Digest>,
    reads: u64,
    hits: u64,
    bytes_hashed: u64,
}

impl ContentHasher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn digest(&mut self, path: &Path) -> Result<Digest> {
        if let Some(digest) = self.cache.get(path) {
            self.hits += 1;
            return Ok(*digest);
        }
        let (digest, bytes) = hash_file(path).map_err(|source| read_error(path, source))?;
        tracing::trace!(path = %path.display(), %digest, bytes, "hashed");
        self.reads += 1;
        self.bytes_hashed += bytes;
        self.cache.insert(path.to_path_buf(), digest);
        Ok(digest)
    }

    pub fn is_cached(&self, path: &Path) -> bool {
        self.cache.contains_key(path)
    }

    /// Number of files actually read from disk.
    pub fn reads(&self) -> u64 {
        self.reads
    }

    pub fn hits(&self) -> u64 {
        self.hits
    }

    pub fn bytes_hashed(&self) -> u64 {
        self.bytes_hashed
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn identical_content_gives_identical_digest() {
        let dir = TempDir::new().unwrap();
        let a = dir.path().join("a.txt");
        let b = dir.path().join("b.txt");
        fs::write(&a, b"hello").unwrap();
        fs::write(&b, b"hello").unwrap();

        let (da, na) = hash_file(&a).unwrap();
        let (db, _) = hash_file(&b).unwrap();
        assert_eq!(da, db);
        assert_eq!(na, 5);
        assert_eq!(da, Digest::from(blake3::hash(b"hello")));
    }

    #[test]
    fn content_spanning_several_chunks_is_fully_hashed() {
        let dir = TempDir::new().unwrap();
        let mut data = vec![0x5Au8; CHUNK_BYTES * 3 + 17];
        let a = dir.path().join("a.bin");
        fs::write(&a, &data).unwrap();
        let last = data.len() - 1;
        data[last] = 0;
        let b = dir.path().join("b.bin");
        fs::write(&b, &data).unwrap();

        let (da, na) = hash_file(&a).unwrap();
        let (db, _) = hash_file(&b).unwrap();
        assert_ne!(da, db);
        assert_eq!(na, (CHUNK_BYTES * 3 + 17) as u64);
    }

    #[test]
    fn repeated_lookup_reads_disk_once() {
        let dir = TempDir::new().unwrap();
        let a = dir.path().join("a.txt");
        fs::write(&a, b"same").unwrap();

        let mut hasher = ContentHasher::new();
        let first = hasher.digest(&a).unwrap();
        // Changing the file proves the second answer came from the cache.
        fs::write(&a, b"different").unwrap();
        let second = hasher.digest(&a).unwrap();

        assert_eq!(first, second);
        assert_eq!(hasher.reads(), 1);
        assert_eq!(hasher.hits(), 1);
        assert_eq!(hasher.bytes_hashed(), 4);
        assert!(hasher.is_cached(&a));
    }

    #[test]
    fn missing_file_is_a_read_error_and_not_cached() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("gone.txt");

        let mut hasher = ContentHasher::new();
        let err = hasher.digest(&missing).unwrap_err();
        assert!(matches!(err, Error::Read { ref path, .. } if path == &missing));
        assert!(!hasher.is_cached(&missing));
        assert!(hasher.is_empty());
    }

    #[test]
    fn separate_hashers_do_not_share_a_cache() {
        let dir = TempDir::new().unwrap();
        let a = dir.path().join("a.txt");
        fs::write(&a, b"one").unwrap();

        let mut first = ContentHasher::new();
        first.digest(&a).unwrap();
        let second = ContentHasher::new();
        assert!(!second.is_cached(&a));
    }

    #[test]
    fn same_content_compares_bytes() {
        let dir = TempDir::new().unwrap();
        let a = dir.path().join("a");
        let b = dir.path().join("b");
        let c = dir.path().join("c");
        fs::write(&a, b"abcdef").unwrap();
        fs::write(&b, b"abcdef").unwrap();
        fs::write(&c, b"abcdeg").unwrap();

        assert!(same_content(&a, &b).unwrap());
        assert!(!same_content(&a, &c).unwrap());
    }

    #[test]
    fn digest_displays_as_hex() {
        let digest: Digest = blake3::hash(b"").into();
        let hex = digest.to_string();
        assert_eq!(hex.len(), 64);
        assert_eq!(hex, blake3::hash(b"").to_hex().to_string());
    }
}
