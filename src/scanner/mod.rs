//! The traversal-and-filter engine.
//!
//! One synchronous pass over the directory tree: every file in a visited
//! directory is evaluated against the criteria, matches accumulate into that
//! directory's bucket, and per-path failures are collected without aborting
//! the scan.

pub mod criteria;
pub mod types;

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Local};
use compact_str::CompactString;
use serde_json::json;

use crate::journal::{ActivityEvent, EventSink};

use self::criteria::ScanCriteria;
use self::types::{
    AccessError, DirectoryBucket, FileDescriptor, ScanOutcome, ScanProgress, ScanResult,
};

/// Running counters threaded through the traversal.
#[derive(Debug, Default)]
struct WalkStats {
    dirs_visited: u64,
    files_matched: u64,
    bytes_matched: u64,
}

/// Single-threaded traversal-and-filter engine.
///
/// Holds the validated criteria and an optional cancellation flag. Each
/// [`scan`](Scanner::scan) call is independent and owns its outcome, so
/// several scans may run concurrently from one process.
#[derive(Debug, Clone)]
pub struct Scanner {
    criteria: ScanCriteria,
    cancel: Option<Arc<AtomicBool>>,
}

impl Scanner {
    pub fn new(criteria: ScanCriteria) -> Self {
        Self {
            criteria,
            cancel: None,
        }
    }

    /// Install a flag that stops the traversal between directory visits.
    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    pub fn criteria(&self) -> &ScanCriteria {
        &self.criteria
    }

    /// Walk `root` and aggregate matches.
    ///
    /// Never fails: a missing or unreadable root becomes one [`AccessError`]
    /// and an empty result.
    pub fn scan(&self, root: &Path, sink: &dyn EventSink) -> ScanOutcome {
        self.scan_with_progress(root, sink, |_| {})
    }

    /// Like [`scan`](Scanner::scan), reporting progress after every visited
    /// directory.
    pub fn scan_with_progress<F>(
        &self,
        root: &Path,
        sink: &dyn EventSink,
        mut progress: F,
    ) -> ScanOutcome
    where
        F: FnMut(ScanProgress),
    {
        let start = Instant::now();
        progress(ScanProgress::Started {
            root: root.to_path_buf(),
        });
        sink.record(ActivityEvent::new(
            "scan_started",
            json!({
                "root": root.display().to_string(),
                "criteria": self.criteria.summary(),
            }),
        ));

        let mut outcome = ScanOutcome::default();
        let mut stats = WalkStats::default();

        if root.is_dir() {
            self.walk(root, root, 0, sink, &mut outcome, &mut stats, &mut progress);
        } else {
            let cause = match fs::metadata(root) {
                Ok(_) => "not a directory".to_string(),
                Err(e) => e.to_string(),
            };
            record_access_error(root.to_path_buf(), cause, sink, &mut outcome, &mut progress);
        }

        progress(ScanProgress::Completed {
            dirs_matched: outcome.result.len() as u64,
            files_matched: outcome.result.total_files() as u64,
            bytes_matched: outcome.result.total_size_bytes(),
            elapsed_ms: start.elapsed().as_millis() as u64,
        });
        sink.record(ActivityEvent::new(
            "scan_completed",
            json!({
                "total_folders": outcome.result.len(),
                "total_files": outcome.result.total_files(),
                "total_size": outcome.result.total_size_bytes(),
                "access_errors": outcome.errors.len(),
            }),
        ));
        tracing::info!(
            "scan of {} complete: {} folders, {} files, {} errors",
            root.display(),
            outcome.result.len(),
            outcome.result.total_files(),
            outcome.errors.len()
        );

        outcome
    }

    fn cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .map_or(false, |flag| flag.load(Ordering::Relaxed))
    }

    /// Visit one directory: evaluate its files, push a bucket if anything
    /// matched, then descend into subdirectories within the depth limit.
    fn walk<F>(
        &self,
        dir: &Path,
        root: &Path,
        depth: usize,
        sink: &dyn EventSink,
        outcome: &mut ScanOutcome,
        stats: &mut WalkStats,
        progress: &mut F,
    ) where
        F: FnMut(ScanProgress),
    {
        if self.cancelled() {
            tracing::debug!("scan cancelled before {}", dir.display());
            return;
        }

        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) => {
                record_access_error(dir.to_path_buf(), e.to_string(), sink, outcome, progress);
                return;
            }
        };

        let mut files: Vec<PathBuf> = Vec::new();
        let mut subdirs: Vec<PathBuf> = Vec::new();
        for entry in entries {
            match entry {
                Ok(entry) => {
                    // Symlinks land in `files`: file_type() does not follow
                    // them, so a linked directory is never descended into.
                    let is_dir = entry.file_type().map(|t| t.is_dir()).unwrap_or(false);
                    if is_dir {
                        subdirs.push(entry.path());
                    } else {
                        files.push(entry.path());
                    }
                }
                Err(e) => {
                    record_access_error(dir.to_path_buf(), e.to_string(), sink, outcome, progress);
                }
            }
        }

        // Lexical order keeps results reproducible across filesystems.
        files.sort();
        subdirs.sort();

        let mut matched: Vec<FileDescriptor> = Vec::new();
        for file in &files {
            match self.evaluate(file) {
                Ok(Some(descriptor)) => {
                    stats.bytes_matched += descriptor.size_bytes;
                    matched.push(descriptor);
                }
                Ok(None) => {}
                Err(cause) => {
                    record_access_error(file.clone(), cause, sink, outcome, progress);
                }
            }
        }

        stats.dirs_visited += 1;
        stats.files_matched += matched.len() as u64;
        if !matched.is_empty() {
            outcome
                .result
                .buckets
                .push(DirectoryBucket::new(relative_key(dir, root), matched));
        }
        progress(ScanProgress::Progress {
            dirs_visited: stats.dirs_visited,
            files_matched: stats.files_matched,
            bytes_matched: stats.bytes_matched,
        });

        // Subtrees past the depth limit are pruned without being read.
        let descend = self
            .criteria
            .max_depth
            .map_or(true, |max| depth + 1 <= max);
        if !descend {
            return;
        }
        for subdir in subdirs {
            self.walk(&subdir, root, depth + 1, sink, outcome, stats, progress);
        }
    }

    /// Evaluate one file against every configured predicate.
    ///
    /// `Ok(Some)` is a match, `Ok(None)` a clean miss, `Err` an access
    /// failure to record. Metadata predicates run before the content read.
    fn evaluate(&self, path: &Path) -> Result<Option<FileDescriptor>, String> {
        let criteria = &self.criteria;

        let name = match path.file_name() {
            Some(name) => name.to_string_lossy(),
            None => return Ok(None),
        };

        if !criteria.extensions.is_empty() {
            let extension = path
                .extension()
                .map(|e| e.to_string_lossy().to_ascii_lowercase())
                .unwrap_or_default();
            if !criteria.extensions.contains(&extension) {
                return Ok(None);
            }
        }

        if let Some(matcher) = &criteria.name_pattern {
            if !matcher.is_match(name.as_ref()) {
                return Ok(None);
            }
        }

        let metadata = fs::metadata(path).map_err(|e| e.to_string())?;
        if !metadata.is_file() {
            return Ok(None);
        }

        let size = metadata.len();
        if criteria.min_size.map_or(false, |min| size < min) {
            return Ok(None);
        }
        if criteria.max_size.map_or(false, |max| size > max) {
            return Ok(None);
        }

        let modified: DateTime<Local> = metadata.modified().map_err(|e| e.to_string())?.into();
        if criteria.modified_after.map_or(false, |start| modified < start) {
            return Ok(None);
        }
        if criteria.modified_before.map_or(false, |end| modified > end) {
            return Ok(None);
        }

        if criteria.require_writable && metadata.permissions().readonly() {
            return Ok(None);
        }
        if criteria.require_executable && !is_executable(&metadata) {
            return Ok(None);
        }

        if let Some(term) = &criteria.search_term {
            if !content_contains(path, term).map_err(|e| e.to_string())? {
                return Ok(None);
            }
        }

        Ok(Some(FileDescriptor {
            name: CompactString::new(name.as_ref()),
            size_bytes: size,
            last_modified: modified,
        }))
    }
}

/// Substring containment over the file content. Content that is not valid
/// UTF-8 is a miss, not an error: a binary file cannot contain a textual
/// search term.
fn content_contains(path: &Path, term: &str) -> io::Result<bool> {
    let bytes = fs::read(path)?;
    match String::from_utf8(bytes) {
        Ok(text) => Ok(text.contains(term)),
        Err(_) => Ok(false),
    }
}

#[cfg(unix)]
fn is_executable(metadata: &fs::Metadata) -> bool {
    use std::os::unix::fs::PermissionsExt;
    metadata.permissions().mode() & 0o111 != 0
}

#[cfg(not(unix))]
fn is_executable(_metadata: &fs::Metadata) -> bool {
    false
}

/// Bucket key: the directory's path relative to the scan root. The root
/// itself is keyed `"."`, which is what downstream reports expect.
fn relative_key(dir: &Path, root: &Path) -> String {
    match dir.strip_prefix(root) {
        Ok(rel) if rel.as_os_str().is_empty() => ".".to_string(),
        Ok(rel) => rel.to_string_lossy().into_owned(),
        Err(_) => dir.to_string_lossy().into_owned(),
    }
}

fn record_access_error<F>(
    path: PathBuf,
    cause: String,
    sink: &dyn EventSink,
    outcome: &mut ScanOutcome,
    progress: &mut F,
) where
    F: FnMut(ScanProgress),
{
    tracing::warn!("access error at {}: {}", path.display(), cause);
    progress(ScanProgress::Error {
        path: path.clone(),
        message: cause.clone(),
    });
    sink.record(ActivityEvent::new(
        "access_error",
        json!({
            "path": path.display().to_string(),
            "cause": cause,
        }),
    ));
    outcome.errors.push(AccessError { path, cause });
}
