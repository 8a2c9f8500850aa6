use std::path::PathBuf;

use chrono::{DateTime, Local};
use compact_str::CompactString;
use serde::Serialize;

/// Timestamp format shared by reports and the activity journal.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Descriptor for a single matched file, created once and never mutated.
#[derive(Debug, Clone, Serialize)]
pub struct FileDescriptor {
    /// File name (not full path)
    pub name: CompactString,
    /// File size in bytes
    #[serde(rename = "size")]
    pub size_bytes: u64,
    /// Last modification time
    #[serde(rename = "last_modified", serialize_with = "serialize_timestamp")]
    pub last_modified: DateTime<Local>,
}

impl FileDescriptor {
    /// Last-modified rendered the way every report format expects it.
    pub fn last_modified_display(&self) -> String {
        self.last_modified.format(TIMESTAMP_FORMAT).to_string()
    }
}

fn serialize_timestamp<S>(ts: &DateTime<Local>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.collect_str(&ts.format(TIMESTAMP_FORMAT))
}

/// Aggregated statistics for one directory with at least one match.
#[derive(Debug, Clone, Serialize)]
pub struct DirectoryBucket {
    /// Directory path relative to the scan root ("." for the root itself)
    #[serde(skip)]
    pub relative_path: String,
    /// Number of matched files in this directory
    #[serde(rename = "count")]
    pub file_count: usize,
    /// Sum of the matched file sizes
    #[serde(rename = "total_size")]
    pub total_size_bytes: u64,
    /// Matched files in traversal-encounter order
    pub files: Vec<FileDescriptor>,
}

impl DirectoryBucket {
    /// Build a bucket from its matched files. Count and total are derived
    /// from the list so they cannot drift apart.
    pub fn new(relative_path: String, files: Vec<FileDescriptor>) -> Self {
        let total_size_bytes = files.iter().map(|f| f.size_bytes).sum();
        Self {
            relative_path,
            file_count: files.len(),
            total_size_bytes,
            files,
        }
    }
}

/// Per-directory buckets in directory-visit order. Relative paths are unique
/// because the walker visits each directory exactly once.
#[derive(Debug, Clone, Default)]
pub struct ScanResult {
    pub buckets: Vec<DirectoryBucket>,
}

impl ScanResult {
    /// Number of directories with at least one match.
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// Look up a bucket by its relative path.
    pub fn get(&self, relative_path: &str) -> Option<&DirectoryBucket> {
        self.buckets.iter().find(|b| b.relative_path == relative_path)
    }

    /// Total matched files across all buckets.
    pub fn total_files(&self) -> usize {
        self.buckets.iter().map(|b| b.file_count).sum()
    }

    /// Total matched bytes across all buckets.
    pub fn total_size_bytes(&self) -> u64 {
        self.buckets.iter().map(|b| b.total_size_bytes).sum()
    }

    /// Reorder buckets by descending total size, keeping visit order for ties.
    pub fn sort_by_total_size(&mut self) {
        self.buckets
            .sort_by(|a, b| b.total_size_bytes.cmp(&a.total_size_bytes));
    }
}

/// A non-fatal failure tied to one path, collected during traversal.
#[derive(Debug, Clone, Serialize)]
pub struct AccessError {
    pub path: PathBuf,
    pub cause: String,
}

/// What one scan call returns: the aggregate plus its diagnostics. Callers
/// must inspect `errors` to know whether the result is complete.
#[derive(Debug, Clone, Default)]
pub struct ScanOutcome {
    pub result: ScanResult,
    pub errors: Vec<AccessError>,
}

/// Progress updates emitted during scanning.
#[derive(Debug, Clone)]
pub enum ScanProgress {
    /// Starting scan of a root path
    Started { root: PathBuf },
    /// Periodic update, once per visited directory
    Progress {
        dirs_visited: u64,
        files_matched: u64,
        bytes_matched: u64,
    },
    /// Scan completed
    Completed {
        dirs_matched: u64,
        files_matched: u64,
        bytes_matched: u64,
        elapsed_ms: u64,
    },
    /// Error encountered (non-fatal)
    Error { path: PathBuf, message: String },
}
