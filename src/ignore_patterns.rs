//! `.revwatchignore` handling
//!
//! Gitignore syntax, evaluated relative to the watched root. An ignored file
//! is never tracked or versioned; an ignored directory is never registered,
//! so nothing below it produces notifications.

use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use ignore::gitignore::{Gitignore, GitignoreBuilder};
use thiserror::Error;

/// Looked up directly in the watched root
pub const IGNORE_FILE: &str = ".revwatchignore";

const MAX_BYTES: u64 = 64 * 1024;
const MAX_PATTERNS: usize = 1000;

#[derive(Debug, Clone)]
pub struct IgnorePatterns {
    matcher: Gitignore,
    count: usize,
    source: Option<PathBuf>,
}

impl Default for IgnorePatterns {
    fn default() -> Self {
        Self::empty()
    }
}

impl IgnorePatterns {
    /// Matches nothing
    pub fn empty() -> Self {
        Self {
            matcher: Gitignore::empty(),
            count: 0,
            source: None,
        }
    }

    /// Read `<root>/.revwatchignore`. A missing file means no exclusions.
    pub fn load(root: &Path) -> Result<Self, IgnoreError> {
        let path = root.join(IGNORE_FILE);
        let file = match File::open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Self::empty()),
            Err(e) => return Err(IgnoreError::Read { path, source: e }),
        };

        // One byte past the limit is enough to know it is too big.
        let mut content = String::new();
        file.take(MAX_BYTES + 1)
            .read_to_string(&mut content)
            .map_err(|e| IgnoreError::Read {
                path: path.clone(),
                source: e,
            })?;
        if content.len() as u64 > MAX_BYTES {
            return Err(IgnoreError::TooLarge {
                path,
                limit_kib: MAX_BYTES / 1024,
            });
        }

        Self::from_content(root, &path, &content)
    }

    /// Build from `content` as if it had been read from `source`.
    pub fn from_content(root: &Path, source: &Path, content: &str) -> Result<Self, IgnoreError> {
        let patterns: Vec<(usize, &str)> = content
            .lines()
            .enumerate()
            .map(|(i, line)| (i + 1, line))
            .filter(|(_, line)| {
                let line = line.trim();
                !line.is_empty() && !line.starts_with('#')
            })
            .collect();

        if patterns.len() > MAX_PATTERNS {
            return Err(IgnoreError::TooManyPatterns {
                path: source.to_path_buf(),
                count: patterns.len(),
                limit: MAX_PATTERNS,
            });
        }

        let mut builder = GitignoreBuilder::new(root);
        for &(line, pattern) in &patterns {
            builder
                .add_line(Some(source.to_path_buf()), pattern)
                .map_err(|e| IgnoreError::Pattern {
                    path: source.to_path_buf(),
                    line,
                    source: e,
                })?;
        }
        let matcher = builder.build().map_err(|e| IgnoreError::Build {
            path: source.to_path_buf(),
            source: e,
        })?;

        Ok(Self {
            matcher,
            count: patterns.len(),
            source: Some(source.to_path_buf()),
        })
    }

    /// `rel_path` is relative to the watched root. A path is ignored when it
    /// or any of its parent directories matches.
    pub fn is_ignored(&self, rel_path: &Path, is_dir: bool) -> bool {
        if self.count == 0 || rel_path.as_os_str().is_empty() {
            return false;
        }
        self.matcher
            .matched_path_or_any_parents(rel_path, is_dir)
            .is_ignore()
    }

    pub fn pattern_count(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// The file the patterns came from, if any
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }
}

#[derive(Debug, Error)]
pub enum IgnoreError {
    #[error("cannot read {}: {source}", path.display())]
    Read { path: PathBuf, source: io::Error },

    #[error("{} is larger than {limit_kib} KiB", path.display())]
    TooLarge { path: PathBuf, limit_kib: u64 },

    #[error("{} has {count} patterns (limit {limit})", path.display())]
    TooManyPatterns {
        path: PathBuf,
        count: usize,
        limit: usize,
    },

    #[error("{}:{line}: {source}", path.display())]
    Pattern {
        path: PathBuf,
        line: usize,
        source: ignore::Error,
    },

    #[error("cannot build matcher from {}: {source}", path.display())]
    Build { path: PathBuf, source: ignore::Error },
}
