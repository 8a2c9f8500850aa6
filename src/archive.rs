//! Zip archiving for generated reports.

use std::fs::File;
use std::io;
use std::path::Path;

use serde_json::json;
use thiserror::Error;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::journal::{ActivityEvent, EventSink};

#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("failed to archive report: {0}")]
    Io(#[from] io::Error),
    #[error("failed to build zip archive: {0}")]
    Zip(#[from] zip::result::ZipError),
}

/// Compress `report` into a single-file zip at `archive`, stored under the
/// report's base name. Records a `report_compressed` event on success.
pub fn compress_report(
    report: &Path,
    archive: &Path,
    sink: &dyn EventSink,
) -> Result<(), ArchiveError> {
    let name = report
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "report".to_string());

    let mut writer = ZipWriter::new(File::create(archive)?);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    writer.start_file(name, options)?;
    let mut source = File::open(report)?;
    io::copy(&mut source, &mut writer)?;
    writer.finish()?;

    tracing::info!(
        "report {} compressed to {}",
        report.display(),
        archive.display()
    );
    sink.record(ActivityEvent::new(
        "report_compressed",
        json!({
            "report_file": report.display().to_string(),
            "zip_file": archive.display().to_string(),
        }),
    ));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::journal::testing::RecordingSink;
    use std::fs;
    use std::io::Read;
    use tempfile::TempDir;

    #[test]
    fn archive_contains_the_report_under_its_base_name() {
        let dir = TempDir::new().unwrap();
        let report = dir.path().join("report.csv");
        let archive = dir.path().join("report.zip");
        fs::write(&report, "Folder Path,File Count\na,1\n").unwrap();

        let sink = RecordingSink::default();
        compress_report(&report, &archive, &sink).unwrap();

        let mut zip = zip::ZipArchive::new(File::open(&archive).unwrap()).unwrap();
        assert_eq!(zip.len(), 1);
        let mut entry = zip.by_name("report.csv").unwrap();
        let mut content = String::new();
        entry.read_to_string(&mut content).unwrap();
        assert_eq!(content, "Folder Path,File Count\na,1\n");

        assert_eq!(sink.actions(), ["report_compressed"]);
    }

    #[test]
    fn missing_report_is_an_error() {
        let dir = TempDir::new().unwrap();
        let result = compress_report(
            &dir.path().join("absent.csv"),
            &dir.path().join("absent.zip"),
            &RecordingSink::default(),
        );
        assert!(matches!(result, Err(ArchiveError::Io(_))));
    }
}
