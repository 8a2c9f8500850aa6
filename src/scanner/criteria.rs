use std::collections::BTreeSet;

use chrono::{DateTime, Local};
use globset::{Glob, GlobMatcher};
use serde_json::{json, Value};
use thiserror::Error;

use super::types::TIMESTAMP_FORMAT;

/// Rejected filter combinations. The only hard failure in the scan pipeline;
/// everything after criteria construction degrades to per-path access errors.
#[derive(Debug, Error)]
pub enum CriteriaError {
    #[error("no filter criteria supplied: set at least one extension or another filter")]
    Empty,
    #[error("minimum size {min} exceeds maximum size {max}")]
    SizeRange { min: u64, max: u64 },
    #[error("start date {start} is after end date {end}")]
    DateRange {
        start: DateTime<Local>,
        end: DateTime<Local>,
    },
    #[error("invalid name pattern `{pattern}`: {reason}")]
    Pattern { pattern: String, reason: String },
}

/// Immutable filter set evaluated against every file.
///
/// Built through [`CriteriaBuilder`]; an instance existing means validation
/// passed. Extensions are stored lowercase without a leading dot.
#[derive(Debug, Clone)]
pub struct ScanCriteria {
    pub(crate) extensions: BTreeSet<String>,
    pub(crate) name_pattern: Option<GlobMatcher>,
    pub(crate) modified_after: Option<DateTime<Local>>,
    pub(crate) modified_before: Option<DateTime<Local>>,
    pub(crate) min_size: Option<u64>,
    pub(crate) max_size: Option<u64>,
    pub(crate) search_term: Option<String>,
    pub(crate) max_depth: Option<usize>,
    pub(crate) require_writable: bool,
    pub(crate) require_executable: bool,
}

impl ScanCriteria {
    pub fn builder() -> CriteriaBuilder {
        CriteriaBuilder::new()
    }

    pub fn extensions(&self) -> &BTreeSet<String> {
        &self.extensions
    }

    pub fn max_depth(&self) -> Option<usize> {
        self.max_depth
    }

    /// Field map describing the configured filters, used by the journal.
    pub fn summary(&self) -> Value {
        json!({
            "extensions": self.extensions.iter().collect::<Vec<_>>(),
            "name_pattern": self.name_pattern.as_ref().map(|m| m.glob().glob().to_string()),
            "modified_after": self.modified_after.map(|d| d.format(TIMESTAMP_FORMAT).to_string()),
            "modified_before": self.modified_before.map(|d| d.format(TIMESTAMP_FORMAT).to_string()),
            "min_size": self.min_size,
            "max_size": self.max_size,
            "search_term": self.search_term.as_deref(),
            "max_depth": self.max_depth,
            "writable": self.require_writable,
            "executable": self.require_executable,
        })
    }
}

/// Collects raw filter inputs and validates them into a [`ScanCriteria`].
#[derive(Debug, Clone, Default)]
pub struct CriteriaBuilder {
    extensions: Vec<String>,
    name_pattern: Option<String>,
    modified_after: Option<DateTime<Local>>,
    modified_before: Option<DateTime<Local>>,
    min_size: Option<u64>,
    max_size: Option<u64>,
    search_term: Option<String>,
    max_depth: Option<usize>,
    require_writable: bool,
    require_executable: bool,
}

impl CriteriaBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Extensions to match. Entries are normalized to lowercase with leading
    /// dots stripped; blank entries are dropped.
    pub fn extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.extensions
            .extend(extensions.into_iter().map(|e| e.as_ref().to_string()));
        self
    }

    /// Glob pattern the file name must match (`*`, `?`, character classes).
    pub fn name_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.name_pattern = Some(pattern.into());
        self
    }

    /// Inclusive lower bound on the modification time.
    pub fn modified_after(mut self, timestamp: DateTime<Local>) -> Self {
        self.modified_after = Some(timestamp);
        self
    }

    /// Inclusive upper bound on the modification time.
    pub fn modified_before(mut self, timestamp: DateTime<Local>) -> Self {
        self.modified_before = Some(timestamp);
        self
    }

    /// Inclusive lower bound on the file size in bytes.
    pub fn min_size(mut self, bytes: u64) -> Self {
        self.min_size = Some(bytes);
        self
    }

    /// Inclusive upper bound on the file size in bytes.
    pub fn max_size(mut self, bytes: u64) -> Self {
        self.max_size = Some(bytes);
        self
    }

    /// Substring the file content must contain.
    pub fn search_term(mut self, term: impl Into<String>) -> Self {
        self.search_term = Some(term.into());
        self
    }

    /// Maximum directory depth below the scan root (0 = root only).
    pub fn max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    /// Only match files the current process can write.
    pub fn writable_only(mut self, writable: bool) -> Self {
        self.require_writable = writable;
        self
    }

    /// Only match executable files.
    pub fn executable_only(mut self, executable: bool) -> Self {
        self.require_executable = executable;
        self
    }

    /// Validate and freeze the criteria.
    pub fn build(self) -> Result<ScanCriteria, CriteriaError> {
        let extensions: BTreeSet<String> = self
            .extensions
            .iter()
            .map(|e| e.trim().trim_start_matches('.').to_ascii_lowercase())
            .filter(|e| !e.is_empty())
            .collect();

        // The caller must filter on something; a depth limit alone would
        // match every file in range.
        let has_filter = !extensions.is_empty()
            || self.name_pattern.is_some()
            || self.modified_after.is_some()
            || self.modified_before.is_some()
            || self.min_size.is_some()
            || self.max_size.is_some()
            || self.search_term.is_some()
            || self.require_writable
            || self.require_executable;
        if !has_filter {
            return Err(CriteriaError::Empty);
        }

        if let (Some(min), Some(max)) = (self.min_size, self.max_size) {
            if min > max {
                return Err(CriteriaError::SizeRange { min, max });
            }
        }

        if let (Some(start), Some(end)) = (self.modified_after, self.modified_before) {
            if start > end {
                return Err(CriteriaError::DateRange { start, end });
            }
        }

        let name_pattern = match self.name_pattern {
            Some(pattern) => Some(
                Glob::new(&pattern)
                    .map_err(|e| CriteriaError::Pattern {
                        pattern: pattern.clone(),
                        reason: e.to_string(),
                    })?
                    .compile_matcher(),
            ),
            None => None,
        };

        Ok(ScanCriteria {
            extensions,
            name_pattern,
            modified_after: self.modified_after,
            modified_before: self.modified_before,
            min_size: self.min_size,
            max_size: self.max_size,
            search_term: self.search_term,
            max_depth: self.max_depth,
            require_writable: self.require_writable,
            require_executable: self.require_executable,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn empty_builder_is_rejected() {
        assert!(matches!(
            CriteriaBuilder::new().build(),
            Err(CriteriaError::Empty)
        ));
    }

    #[test]
    fn blank_extensions_do_not_count_as_a_filter() {
        let result = CriteriaBuilder::new().extensions(["", "  ", "."]).build();
        assert!(matches!(result, Err(CriteriaError::Empty)));
    }

    #[test]
    fn depth_alone_is_not_a_filter() {
        let result = CriteriaBuilder::new().max_depth(3).build();
        assert!(matches!(result, Err(CriteriaError::Empty)));
    }

    #[test]
    fn extensions_are_normalized() {
        let criteria = CriteriaBuilder::new()
            .extensions([".TXT", "Log", "csv"])
            .build()
            .unwrap();
        let extensions: Vec<&str> = criteria.extensions().iter().map(String::as_str).collect();
        assert_eq!(extensions, ["csv", "log", "txt"]);
    }

    #[test]
    fn inverted_size_range_is_rejected() {
        let result = CriteriaBuilder::new()
            .extensions(["txt"])
            .min_size(600)
            .max_size(500)
            .build();
        assert!(matches!(
            result,
            Err(CriteriaError::SizeRange { min: 600, max: 500 })
        ));
    }

    #[test]
    fn inverted_date_range_is_rejected() {
        let start = Local.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        let end = Local.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let result = CriteriaBuilder::new()
            .extensions(["txt"])
            .modified_after(start)
            .modified_before(end)
            .build();
        assert!(matches!(result, Err(CriteriaError::DateRange { .. })));
    }

    #[test]
    fn invalid_glob_is_rejected() {
        let result = CriteriaBuilder::new().name_pattern("[oops").build();
        assert!(matches!(result, Err(CriteriaError::Pattern { .. })));
    }

    #[test]
    fn one_sided_bounds_are_accepted() {
        assert!(CriteriaBuilder::new()
            .extensions(["txt"])
            .min_size(100)
            .build()
            .is_ok());
        assert!(CriteriaBuilder::new()
            .extensions(["txt"])
            .modified_before(Local.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap())
            .build()
            .is_ok());
    }

    #[test]
    fn non_extension_filters_are_sufficient() {
        assert!(CriteriaBuilder::new().name_pattern("*report*").build().is_ok());
        assert!(CriteriaBuilder::new().search_term("needle").build().is_ok());
        assert!(CriteriaBuilder::new().writable_only(true).build().is_ok());
    }

    #[test]
    fn summary_names_the_configured_filters() {
        let criteria = CriteriaBuilder::new()
            .extensions(["txt"])
            .name_pattern("*.txt")
            .max_depth(2)
            .build()
            .unwrap();
        let summary = criteria.summary();
        assert_eq!(summary["extensions"][0], "txt");
        assert_eq!(summary["name_pattern"], "*.txt");
        assert_eq!(summary["max_depth"], 2);
        assert_eq!(summary["search_term"], Value::Null);
    }
}
