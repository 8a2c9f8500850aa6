//! Report export for scan results.
//!
//! Three formats share one column set. Field names and the timestamp format
//! are fixed because downstream consumers key on them.

use std::fs::File;
use std::io;
use std::path::Path;

use clap::ValueEnum;
use rust_xlsxwriter::{Format, Workbook, XlsxError};
use serde_json::{json, Map, Value};
use thiserror::Error;

use crate::journal::{ActivityEvent, EventSink};
use crate::scanner::types::ScanResult;

/// Column headers shared by the CSV and XLSX writers.
pub const COLUMNS: [&str; 6] = [
    "Folder Path",
    "File Count",
    "Total Size (bytes)",
    "File Name",
    "File Size (bytes)",
    "Last Modified",
];

/// Output format selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    /// Tabular, one row per matched file
    Csv,
    /// Structured, keyed by folder path
    Json,
    /// Spreadsheet with a header row
    Xlsx,
}

impl ReportFormat {
    /// Default report file name for this format.
    pub fn default_file_name(self) -> &'static str {
        match self {
            ReportFormat::Csv => "report.csv",
            ReportFormat::Json => "report.json",
            ReportFormat::Xlsx => "report.xlsx",
        }
    }

    fn name(self) -> &'static str {
        match self {
            ReportFormat::Csv => "csv",
            ReportFormat::Json => "json",
            ReportFormat::Xlsx => "xlsx",
        }
    }
}

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("failed to write report: {0}")]
    Io(#[from] io::Error),
    #[error("failed to write CSV report: {0}")]
    Csv(#[from] csv::Error),
    #[error("failed to write spreadsheet report: {0}")]
    Spreadsheet(#[from] XlsxError),
    #[error("failed to serialize report: {0}")]
    Json(#[from] serde_json::Error),
}

/// Write `result` to `path` in the selected format and record a
/// `report_generated` event.
pub fn write_report(
    result: &ScanResult,
    path: &Path,
    format: ReportFormat,
    sink: &dyn EventSink,
) -> Result<(), ReportError> {
    match format {
        ReportFormat::Csv => write_csv(result, path)?,
        ReportFormat::Json => write_json(result, path)?,
        ReportFormat::Xlsx => write_xlsx(result, path)?,
    }
    tracing::info!("report written to {}", path.display());
    sink.record(ActivityEvent::new(
        "report_generated",
        json!({
            "report_file": path.display().to_string(),
            "format": format.name(),
        }),
    ));
    Ok(())
}

fn write_csv(result: &ScanResult, path: &Path) -> Result<(), ReportError> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(COLUMNS)?;
    for bucket in &result.buckets {
        for file in &bucket.files {
            writer.write_record(&[
                bucket.relative_path.clone(),
                bucket.file_count.to_string(),
                bucket.total_size_bytes.to_string(),
                file.name.to_string(),
                file.size_bytes.to_string(),
                file.last_modified_display(),
            ])?;
        }
    }
    writer.flush()?;
    Ok(())
}

fn write_json(result: &ScanResult, path: &Path) -> Result<(), ReportError> {
    // Bucket order carries through: the map preserves insertion order.
    let mut map = Map::new();
    for bucket in &result.buckets {
        map.insert(bucket.relative_path.clone(), serde_json::to_value(bucket)?);
    }
    let file = File::create(path)?;
    serde_json::to_writer_pretty(file, &Value::Object(map))?;
    Ok(())
}

fn write_xlsx(result: &ScanResult, path: &Path) -> Result<(), ReportError> {
    let mut workbook = Workbook::new();
    let bold = Format::new().set_bold();
    let sheet = workbook.add_worksheet();

    for (col, header) in COLUMNS.iter().enumerate() {
        sheet.write_string_with_format(0, col as u16, *header, &bold)?;
    }

    let mut row: u32 = 1;
    for bucket in &result.buckets {
        for file in &bucket.files {
            sheet.write_string(row, 0, bucket.relative_path.as_str())?;
            sheet.write_number(row, 1, bucket.file_count as f64)?;
            sheet.write_number(row, 2, bucket.total_size_bytes as f64)?;
            sheet.write_string(row, 3, file.name.as_str())?;
            sheet.write_number(row, 4, file.size_bytes as f64)?;
            sheet.write_string(row, 5, file.last_modified_display())?;
            row += 1;
        }
    }

    workbook.save(path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::journal::testing::RecordingSink;
    use crate::scanner::types::{DirectoryBucket, FileDescriptor};
    use chrono::{Local, TimeZone};
    use compact_str::CompactString;
    use std::fs;
    use tempfile::TempDir;

    fn sample_result() -> ScanResult {
        let stamp = Local.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap();
        let mut result = ScanResult::default();
        result.buckets.push(DirectoryBucket::new(
            "a".to_string(),
            vec![FileDescriptor {
                name: CompactString::new("x.txt"),
                size_bytes: 500,
                last_modified: stamp,
            }],
        ));
        result.buckets.push(DirectoryBucket::new(
            "a/b".to_string(),
            vec![FileDescriptor {
                name: CompactString::new("y.log"),
                size_bytes: 10,
                last_modified: stamp,
            }],
        ));
        result
    }

    #[test]
    fn csv_report_has_header_and_one_row_per_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("report.csv");
        let sink = RecordingSink::default();
        write_report(&sample_result(), &path, ReportFormat::Csv, &sink).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(
            lines[0],
            "Folder Path,File Count,Total Size (bytes),File Name,File Size (bytes),Last Modified"
        );
        assert_eq!(lines[1], "a,1,500,x.txt,500,2024-01-15 10:30:00");
        assert_eq!(lines[2], "a/b,1,10,y.log,10,2024-01-15 10:30:00");
        assert_eq!(lines.len(), 3);
        assert_eq!(sink.actions(), ["report_generated"]);
    }

    #[test]
    fn json_report_is_keyed_by_folder_in_bucket_order() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("report.json");
        write_report(&sample_result(), &path, ReportFormat::Json, &RecordingSink::default())
            .unwrap();

        let value: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        let keys: Vec<&String> = value.as_object().unwrap().keys().collect();
        assert_eq!(keys, ["a", "a/b"]);
        assert_eq!(value["a"]["count"], 1);
        assert_eq!(value["a"]["total_size"], 500);
        assert_eq!(value["a"]["files"][0]["name"], "x.txt");
        assert_eq!(value["a"]["files"][0]["size"], 500);
        assert_eq!(value["a"]["files"][0]["last_modified"], "2024-01-15 10:30:00");
    }

    #[test]
    fn xlsx_report_is_written_to_disk() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("report.xlsx");
        write_report(&sample_result(), &path, ReportFormat::Xlsx, &RecordingSink::default())
            .unwrap();

        let metadata = fs::metadata(&path).unwrap();
        assert!(metadata.len() > 0);
    }

    #[test]
    fn empty_result_still_produces_a_header() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("report.csv");
        write_report(
            &ScanResult::default(),
            &path,
            ReportFormat::Csv,
            &RecordingSink::default(),
        )
        .unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 1);
    }

    #[test]
    fn default_file_names_follow_the_format() {
        assert_eq!(ReportFormat::Csv.default_file_name(), "report.csv");
        assert_eq!(ReportFormat::Json.default_file_name(), "report.json");
        assert_eq!(ReportFormat::Xlsx.default_file_name(), "report.xlsx");
    }
}
