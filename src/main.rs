use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;

use dirscout::archive;
use dirscout::cli;
use dirscout::journal::{EventSink, JsonJournal, NullSink};
use dirscout::progress::{self, ProgressReporter};
use dirscout::report::{self, ReportFormat};
use dirscout::scanner::criteria::CriteriaBuilder;
use dirscout::scanner::Scanner;

/// Scan a directory tree for files matching a set of filters and export the
/// per-folder statistics as a report.
#[derive(Debug, Parser)]
#[command(name = "dirscout", version, about)]
struct Cli {
    /// Root folder to scan
    #[arg(default_value = ".")]
    path: PathBuf,

    /// File extensions to match, comma separated (e.g. txt,log)
    #[arg(short, long, value_delimiter = ',')]
    extensions: Vec<String>,

    /// Glob pattern the file name must match (e.g. "*report*")
    #[arg(short = 'p', long)]
    name_pattern: Option<String>,

    /// Only files modified on or after this date (YYYY-MM-DD)
    #[arg(long)]
    modified_after: Option<String>,

    /// Only files modified on or before this date (YYYY-MM-DD)
    #[arg(long)]
    modified_before: Option<String>,

    /// Minimum file size in bytes
    #[arg(long)]
    min_size: Option<u64>,

    /// Maximum file size in bytes
    #[arg(long)]
    max_size: Option<u64>,

    /// Substring the file content must contain
    #[arg(short, long)]
    search: Option<String>,

    /// Maximum directory depth below the root (0 = root only)
    #[arg(short = 'd', long)]
    max_depth: Option<usize>,

    /// Only files the current process can write
    #[arg(long)]
    writable: bool,

    /// Only executable files
    #[arg(long)]
    executable: bool,

    /// Collect all parameters through interactive prompts instead of flags
    #[arg(short, long)]
    interactive: bool,

    /// Report format
    #[arg(short, long, value_enum, default_value = "csv")]
    format: ReportFormat,

    /// Report output path (defaults to report.<format> in the working directory)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Compress the report into this zip archive after writing it
    #[arg(long)]
    archive: Option<PathBuf>,

    /// Order report folders by total matched size, largest first
    #[arg(long)]
    sort_size: bool,

    /// Activity journal path
    #[arg(long, default_value = "activity_log.json")]
    journal: PathBuf,

    /// Disable the activity journal
    #[arg(long)]
    no_journal: bool,
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_ansi(false)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("dirscout=info".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();

    let (root, criteria) = if cli.interactive {
        let collected = cli::prompt::collect()?;
        (collected.root, collected.criteria)
    } else {
        let mut builder = CriteriaBuilder::new().extensions(&cli.extensions);
        if let Some(pattern) = &cli.name_pattern {
            builder = builder.name_pattern(pattern);
        }
        if let Some(date) = &cli.modified_after {
            builder = builder.modified_after(cli::parse_day_bound(date, false)?);
        }
        if let Some(date) = &cli.modified_before {
            builder = builder.modified_before(cli::parse_day_bound(date, true)?);
        }
        if let Some(bytes) = cli.min_size {
            builder = builder.min_size(bytes);
        }
        if let Some(bytes) = cli.max_size {
            builder = builder.max_size(bytes);
        }
        if let Some(term) = &cli.search {
            builder = builder.search_term(term);
        }
        if let Some(depth) = cli.max_depth {
            builder = builder.max_depth(depth);
        }
        builder = builder
            .writable_only(cli.writable)
            .executable_only(cli.executable);
        let criteria = builder.build().context("invalid filter criteria")?;
        (cli.path.clone(), criteria)
    };

    let sink: Box<dyn EventSink> = if cli.no_journal {
        Box::new(NullSink)
    } else {
        Box::new(JsonJournal::new(&cli.journal))
    };

    tracing::info!("dirscout starting, scan path: {:?}", root);

    let scanner = Scanner::new(criteria);
    let reporter = ProgressReporter::new();
    let start = Instant::now();
    let mut outcome = scanner.scan_with_progress(&root, sink.as_ref(), |p| reporter.update(&p));
    reporter.finish_and_clear();

    progress::print_summary(&outcome, start.elapsed());

    if cli.sort_size {
        outcome.result.sort_by_total_size();
    }

    let report_path = cli
        .output
        .clone()
        .unwrap_or_else(|| PathBuf::from(cli.format.default_file_name()));
    report::write_report(&outcome.result, &report_path, cli.format, sink.as_ref())
        .with_context(|| format!("failed to write report to {}", report_path.display()))?;
    println!("Report written to {}", report_path.display());

    if let Some(archive_path) = &cli.archive {
        archive::compress_report(&report_path, archive_path, sink.as_ref())
            .with_context(|| format!("failed to archive report to {}", archive_path.display()))?;
        println!("Report archived to {}", archive_path.display());
    }

    Ok(())
}
