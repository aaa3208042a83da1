use serde::Serialize;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::hash::{self, ContentHasher, Digest};
use crate::scan::{self, ErrorPolicy, ScanOptions};

// ── Result types ─────────────────────────────────────────────────────────────

/// Two or more paths judged to have identical content. Paths are sorted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DuplicateGroup {
    pub digest: Digest,
    pub size: u64,
    pub paths: Vec<PathBuf>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SkippedPath {
    pub path: PathBuf,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScanStats {
    pub roots: usize,
    pub files_seen: u64,
    /// Files actually read from disk to compute a digest.
    pub files_hashed: u64,
    pub cache_hits: u64,
    pub bytes_hashed: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScanReport {
    pub groups: Vec<DuplicateGroup>,
    pub skipped: Vec<SkippedPath>,
    pub stats: ScanStats,
}

// ── Grouping ─────────────────────────────────────────────────────────────────

struct PendingGroup {
    size: u64,
    paths: BTreeSet<PathBuf>,
}

/// Size-bucket / digest grouping state for a single run.
///
/// A file whose size has not been seen before is only recorded. On a size
/// collision the new file is hashed and compared against the earlier members
/// of its bucket in arrival order; the first member with an equal digest joins
/// it in the group for that digest and comparison stops.
pub struct DuplicateFinder {
    hasher: ContentHasher,
    verify: bool,
    on_error: ErrorPolicy,
    by_size: HashMap<u64, Vec<PathBuf>>,
    groups: HashMap<Digest, PendingGroup>,
    order: Vec<Digest>,
    unreadable: HashSet<PathBuf>,
    skipped: Vec<SkippedPath>,
    files_seen: u64,
}

impl DuplicateFinder {
    pub fn new(opts: &ScanOptions) -> Self {
        Self {
            hasher: ContentHasher::new(),
            verify: opts.verify,
            on_error: opts.on_error,
            by_size: HashMap::new(),
            groups: HashMap::new(),
            order: Vec::new(),
            unreadable: HashSet::new(),
            skipped: Vec::new(),
            files_seen: 0,
        }
    }

    pub fn add(&mut self, path: PathBuf, size: u64) -> Result<()> {
        self.files_seen += 1;

        let Some(mut members) = self.by_size.remove(&size) else {
            // Unique size so far; nothing to compare against and nothing to hash.
            self.by_size.insert(size, vec![path]);
            return Ok(());
        };

        // The bucket goes back in even on error so the finder stays consistent.
        let outcome = self.match_in_bucket(&path, size, &members);
        if outcome.is_ok() && !self.unreadable.contains(&path) {
            members.push(path);
        }
        self.by_size.insert(size, members);
        outcome
    }

    fn match_in_bucket(&mut self, path: &Path, size: u64, members: &[PathBuf]) -> Result<()> {
        let Some(digest) = self.digest_of(path)? else {
            return Ok(());
        };
        for other in members {
            let Some(other_digest) = self.digest_of(other)? else {
                continue;
            };
            if other_digest != digest {
                continue;
            }
            if self.verify && !self.confirm(path, other)? {
                if self.unreadable.contains(path) {
                    break;
                }
                if self.unreadable.contains(other) {
                    continue;
                }
                tracing::warn!(
                    "{} and {} share digest {} but differ in content",
                    path.display(),
                    other.display(),
                    digest
                );
                continue;
            }
            self.record(digest, size, path, other);
            break;
        }
        Ok(())
    }

    /// Apply the error policy to a per-file failure.
    pub fn handle(&mut self, err: Error) -> Result<()> {
        match self.on_error {
            ErrorPolicy::Abort => Err(err),
            ErrorPolicy::Skip => {
                self.note_skipped(err);
                Ok(())
            }
        }
    }

    /// Record an unreadable directory. These never abort a run.
    pub fn skip_dir(&mut self, err: Error) {
        self.note_skipped(err);
    }

    pub fn hasher(&self) -> &ContentHasher {
        &self.hasher
    }

    pub fn finish(mut self) -> ScanReport {
        let groups = self
            .order
            .iter()
            .filter_map(|digest| {
                let pending = self.groups.remove(digest)?;
                (pending.paths.len() >= 2).then(|| DuplicateGroup {
                    digest: *digest,
                    size: pending.size,
                    paths: pending.paths.into_iter().collect(),
                })
            })
            .collect();

        ScanReport {
            groups,
            skipped: self.skipped,
            stats: ScanStats {
                roots: 0,
                files_seen: self.files_seen,
                files_hashed: self.hasher.reads(),
                cache_hits: self.hasher.hits(),
                bytes_hashed: self.hasher.bytes_hashed(),
            },
        }
    }

    // Ok(None) means the file is unreadable and was skipped under the policy.
    fn digest_of(&mut self, path: &Path) -> Result<Option<Digest>> {
        if self.unreadable.contains(path) {
            return Ok(None);
        }
        match self.hasher.digest(path) {
            Ok(digest) => Ok(Some(digest)),
            Err(err) => {
                self.handle(err)?;
                Ok(None)
            }
        }
    }

    fn confirm(&mut self, a: &Path, b: &Path) -> Result<bool> {
        match hash::same_content(a, b) {
            Ok(same) => Ok(same),
            Err(err) => {
                self.handle(err)?;
                Ok(false)
            }
        }
    }

    fn record(&mut self, digest: Digest, size: u64, path: &Path, other: &Path) {
        if !self.groups.contains_key(&digest) {
            self.order.push(digest);
        }
        let group = self.groups.entry(digest).or_insert_with(|| PendingGroup {
            size,
            paths: BTreeSet::new(),
        });
        group.paths.insert(path.to_path_buf());
        group.paths.insert(other.to_path_buf());
    }

    fn note_skipped(&mut self, err: Error) {
        tracing::warn!("Skipping: {}", err);
        let path = err.path().map(Path::to_path_buf).unwrap_or_default();
        for group in self.groups.values_mut() {
            group.paths.remove(&path);
        }
        self.unreadable.insert(path.clone());
        self.skipped.push(SkippedPath {
            path,
            reason: err.to_string(),
        });
    }
}

/// Walk every root and group files with identical content.
pub fn find_duplicates(dirs: &[PathBuf], opts: &ScanOptions) -> Result<ScanReport> {
    let roots = scan::prepare_roots(dirs);
    let mut finder = DuplicateFinder::new(opts);
    // Only needed when symlinks can make one file reachable by two paths.
    let mut seen: HashSet<PathBuf> = HashSet::new();

    for root in &roots {
        tracing::debug!("Scanning {}", root.path.display());
        for item in scan::walk(&root.path, opts) {
            match item {
                Ok(entry) => {
                    if opts.follow_symlinks {
                        if let Ok(canonical) = entry.path.canonicalize() {
                            if !seen.insert(canonical) {
                                tracing::debug!("Already scanned {}", entry.path.display());
                                continue;
                            }
                        }
                    }
                    finder.add(entry.path, entry.size)?;
                }
                Err(err @ Error::Walk { .. }) => finder.skip_dir(err),
                Err(err) => finder.handle(err)?,
            }
        }
    }

    let mut report = finder.finish();
    report.stats.roots = roots.len();
    tracing::info!(
        roots = report.stats.roots,
        files = report.stats.files_seen,
        hashed = report.stats.files_hashed,
        groups = report.groups.len(),
        skipped = report.skipped.len(),
        "scan complete"
    );
    Ok(report)
}
