use globset::{Glob, GlobSet, GlobSetBuilder};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::cli::ScanArgs;
use crate::config::Config;
use crate::error::{Error, Result};

/// What to do when a file cannot be stat'ed or read during a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ErrorPolicy {
    /// Fail the whole run; no partial groups are produced.
    #[default]
    Abort,
    /// Leave the file out, record it in the report and keep going.
    Skip,
}

#[derive(Debug, Clone)]
pub struct ScanOptions {
    pub follow_symlinks: bool,
    /// Leave out names starting with a dot, and everything below such directories.
    pub skip_hidden: bool,
    /// Only consider file names containing a dot.
    pub require_extension: bool,
    /// Confirm every digest match byte for byte before grouping.
    pub verify: bool,
    pub min_size: u64,
    pub on_error: ErrorPolicy,
    pub include: GlobSet,
    pub exclude: GlobSet,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            follow_symlinks: false,
            skip_hidden: false,
            require_extension: false,
            verify: false,
            min_size: 0,
            on_error: ErrorPolicy::Abort,
            include: GlobSet::empty(),
            exclude: GlobSet::empty(),
        }
    }
}

impl ScanOptions {
    pub fn from_args_and_config(args: &ScanArgs, config: &Config) -> Result<Self> {
        let follow_symlinks = args.follow_symlinks || config.follow_symlinks;
        let skip_hidden = args.skip_hidden || config.skip_hidden;
        let require_extension = args.require_extension || config.require_extension;
        let verify = args.verify || config.verify;
        let min_size = args.min_size.or(config.min_size).unwrap_or(0);
        let on_error = args.on_error.or(config.on_error).unwrap_or_default();

        // CLI include/exclude take priority; fall back to config
        let include_globs: Vec<&str> = if !args.include.is_empty() {
            args.include.iter().map(|s| s.as_str()).collect()
        } else {
            config.include.iter().map(|s| s.as_str()).collect()
        };
        let exclude_globs: Vec<&str> = if !args.exclude.is_empty() {
            args.exclude.iter().map(|s| s.as_str()).collect()
        } else {
            config.exclude.iter().map(|s| s.as_str()).collect()
        };

        Ok(Self {
            follow_symlinks,
            skip_hidden,
            require_extension,
            verify,
            min_size,
            on_error,
            include: build_globset(&include_globs)?,
            exclude: build_globset(&exclude_globs)?,
        })
    }

    /// Whether a regular file with this name takes part in the scan.
    pub fn file_included(&self, name: &str) -> bool {
        if self.skip_hidden && is_hidden(name) {
            return false;
        }
        if self.require_extension && !name.contains('.') {
            return false;
        }
        if !self.include.is_empty() && !self.include.is_match(name) {
            return false;
        }
        if self.exclude.is_match(name) {
            return false;
        }
        true
    }
}

pub fn is_hidden(name: &str) -> bool {
    name.starts_with('.')
}

pub fn build_globset(patterns: &[&str]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for p in patterns {
        let glob = Glob::new(p).map_err(|source| Error::Pattern {
            pattern: p.to_string(),
            source,
        })?;
        builder.add(glob);
    }
    builder.build().map_err(|source| Error::Pattern {
        pattern: patterns.join(", "),
        source,
    })
}

// ── Roots ────────────────────────────────────────────────────────────────────

/// A root directory as the caller spelled it, plus its canonical form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Root {
    pub path: PathBuf,
    pub canonical: PathBuf,
}

/// Canonicalize roots and drop any root that repeats or lies inside another
/// one, so no file is reachable through two roots. Roots that cannot be
/// resolved (missing, unreadable) are dropped with a warning.
pub fn prepare_roots(dirs: &[PathBuf]) -> Vec<Root> {
    let mut roots: Vec<Root> = Vec::new();
    for dir in dirs {
        let canonical = match dir.canonicalize() {
            Ok(c) => c,
            Err(e) => {
                tracing::warn!("Skipping {}: {}", dir.display(), e);
                continue;
            }
        };
        if roots.iter().any(|r| r.canonical == canonical) {
            tracing::debug!("Skipping repeated root {}", dir.display());
            continue;
        }
        roots.push(Root {
            path: dir.clone(),
            canonical,
        });
    }

    let nested: Vec<bool> = roots
        .iter()
        .map(|r| {
            roots
                .iter()
                .any(|other| other.canonical != r.canonical && r.canonical.starts_with(&other.canonical))
        })
        .collect();
    let mut kept = Vec::with_capacity(roots.len());
    for (root, is_nested) in roots.into_iter().zip(nested) {
        if is_nested {
            tracing::debug!("Skipping {}: inside another root", root.path.display());
        } else {
            kept.push(root);
        }
    }
    kept
}

// ── Traversal ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    pub path: PathBuf,
    pub size: u64,
}

/// Recursively enumerate the regular files under `root` that pass the
/// options' filters. Paths are `root` joined with the relative path below it.
///
/// Directory listing failures come out as `Error::Walk` and the walker moves
/// on past that subtree; metadata failures come out as `Error::Metadata`.
pub fn walk<'a>(root: &Path, opts: &'a ScanOptions) -> impl Iterator<Item = Result<FileEntry>> + 'a {
    let root_path = root.to_path_buf();
    WalkDir::new(root)
        .follow_links(opts.follow_symlinks)
        .into_iter()
        .filter_entry(move |entry| {
            // The root itself may be "." or a dot-directory the user asked for.
            entry.depth() == 0
                || !opts.skip_hidden
                || !is_hidden(&entry.file_name().to_string_lossy())
        })
        .filter_map(move |item| {
            let entry = match item {
                Ok(entry) => entry,
                Err(source) => {
                    let path = source
                        .path()
                        .map(Path::to_path_buf)
                        .unwrap_or_else(|| root_path.clone());
                    return Some(Err(Error::Walk { path, source }));
                }
            };
            // Without follow_links a symlink is neither a file nor a dir and is skipped.
            if !entry.file_type().is_file() {
                return None;
            }
            if !opts.file_included(&entry.file_name().to_string_lossy()) {
                return None;
            }
            let size = match entry.metadata() {
                Ok(meta) => meta.len(),
                Err(source) => {
                    return Some(Err(Error::Metadata {
                        path: entry.path().to_path_buf(),
                        source: source.into(),
                    }))
                }
            };
            if size < opts.min_size {
                return None;
            }
            Some(Ok(FileEntry {
                path: entry.into_path(),
                size,
            }))
        })
}
