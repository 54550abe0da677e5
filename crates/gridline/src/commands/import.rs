//! `gridline import`: bulk create from CSV/XLSX with a progress bar.

use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

use gridline_core::{FileFormat, parse_records};

use crate::cli::{GlobalOpts, ImportArgs, OutputFormat};
use crate::config;
use crate::error::CliError;
use crate::output;

pub async fn handle(args: ImportArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let mut resolved = config::resolve(global, &args.collection)?;
    if let Some(concurrency) = args.concurrency {
        if concurrency == 0 {
            return Err(CliError::Validation {
                field: "concurrency".into(),
                reason: "must be at least 1".into(),
            });
        }
        resolved.engine.import_concurrency = concurrency;
    }
    let (session, mut notifications) = super::mount(resolved)?;

    // Parse up front so the progress bar knows its length
    let bytes = tokio::fs::read(&args.file)
        .await
        .map_err(|e| CliError::ImportParse {
            message: format!("{}: {e}", args.file.display()),
        })?;
    let records = parse_records(&bytes, FileFormat::detect(&args.file, &bytes))?;
    let total = records.len();

    let progress = progress_bar(total, global.quiet);
    let report = session
        .importer()
        .import_records_with(records, |outcome| {
            if let Some(reason) = outcome.rejection() {
                progress.println(format!("row {}: {reason}", outcome.line));
            }
            progress.inc(1);
        })
        .await;
    progress.finish_and_clear();

    output::print_notifications(&mut notifications, global.quiet);
    match global.output {
        OutputFormat::Json => output::print_output(&output::render_json(&report)?, global.quiet),
        OutputFormat::Table | OutputFormat::Csv | OutputFormat::Plain => {
            if report.rejected_count() > 0 {
                output::print_output(&output::render_rejections(&report), global.quiet);
            }
        }
    }

    if report.rejected_count() > 0 {
        return Err(CliError::PartialImport {
            created: report.created_count(),
            rejected: report.rejected_count(),
            total,
        });
    }
    Ok(())
}

fn progress_bar(total: usize, quiet: bool) -> ProgressBar {
    if quiet || total == 0 {
        return ProgressBar::hidden();
    }
    let bar = ProgressBar::new(u64::try_from(total).unwrap_or(u64::MAX));
    if let Ok(style) =
        ProgressStyle::with_template("{spinner} [{bar:30}] {pos}/{len} records {elapsed}")
    {
        bar.set_style(style.progress_chars("=> "));
    }
    bar.enable_steady_tick(Duration::from_millis(120));
    bar
}
