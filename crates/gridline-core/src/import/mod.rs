// ── Bulk import pipeline ──
//
// file → records → one create request per record → one outcome per record
// → one refresh → one summary notification.
//
// A rejected record never stops the rest. Requests run with bounded
// concurrency, but outcomes are reported in input order.

mod mapping;
mod parse;

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use futures_util::StreamExt;
use futures_util::stream;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::backend::CollectionBackend;
use crate::dispatch::{Notification, Notifier};
use crate::error::CoreError;
use crate::model::Row;
use crate::store::CollectionCache;

pub use mapping::{FieldKind, FieldMapping, ImportMapping};
pub use parse::{FileFormat, Record, parse_records};

/// Rejection reasons listed in a summary before it is truncated.
const SUMMARY_REASONS: usize = 5;

// ── Outcomes ────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ImportResult {
    Created { row: Row },
    Rejected { reason: String },
}

/// What happened to one input record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImportOutcome {
    /// 1-based row number in the source file.
    pub line: u64,
    #[serde(skip)]
    pub record: Record,
    #[serde(flatten)]
    pub result: ImportResult,
}

impl ImportOutcome {
    pub fn is_created(&self) -> bool {
        matches!(self.result, ImportResult::Created { .. })
    }

    pub fn rejection(&self) -> Option<&str> {
        match &self.result {
            ImportResult::Rejected { reason } => Some(reason),
            ImportResult::Created { .. } => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ImportReport {
    pub outcomes: Vec<ImportOutcome>,
}

impl ImportReport {
    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    pub fn created_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_created()).count()
    }

    pub fn rejected_count(&self) -> usize {
        self.outcomes.len() - self.created_count()
    }

    pub fn rejected(&self) -> impl Iterator<Item = &ImportOutcome> {
        self.outcomes.iter().filter(|o| !o.is_created())
    }

    /// One notification describing the whole import.
    pub fn summary(&self) -> Notification {
        if self.is_empty() {
            return Notification::info("Import file contained no records");
        }

        let created = self.created_count();
        let rejected = self.rejected_count();
        if rejected == 0 {
            return Notification::success(format!("Imported {created} of {created} records"));
        }

        let mut message = format!(
            "Imported {created} of {} records, {rejected} rejected",
            self.outcomes.len()
        );
        for outcome in self.rejected().take(SUMMARY_REASONS) {
            if let Some(reason) = outcome.rejection() {
                message.push_str(&format!("\n  row {}: {reason}", outcome.line));
            }
        }
        if rejected > SUMMARY_REASONS {
            message.push_str(&format!("\n  ... and {} more", rejected - SUMMARY_REASONS));
        }

        if created == 0 {
            Notification::error(message)
        } else {
            Notification::warning(message)
        }
    }
}

impl fmt::Display for ImportReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.summary())
    }
}

// ── Pipeline ────────────────────────────────────────────────────────

pub struct ImportPipeline<B> {
    cache: Arc<CollectionCache<B>>,
    mapping: ImportMapping,
    concurrency: usize,
    notifier: Notifier,
}

impl<B: CollectionBackend> ImportPipeline<B> {
    pub fn new(
        cache: Arc<CollectionCache<B>>,
        mapping: ImportMapping,
        concurrency: usize,
        notifier: Notifier,
    ) -> Self {
        Self {
            cache,
            mapping,
            concurrency: concurrency.max(1),
            notifier,
        }
    }

    pub fn mapping(&self) -> &ImportMapping {
        &self.mapping
    }

    /// Read, parse and import a file. The format comes from the extension,
    /// falling back to sniffing the content.
    pub async fn import_file(&self, path: &Path) -> Result<ImportReport, CoreError> {
        self.import_file_with(path, |_| {}).await
    }

    pub async fn import_file_with<F>(&self, path: &Path, on_outcome: F) -> Result<ImportReport, CoreError>
    where
        F: FnMut(&ImportOutcome) + Send,
    {
        let bytes = tokio::fs::read(path).await.map_err(|e| CoreError::Parse {
            message: format!("cannot read {}: {e}", path.display()),
        })?;
        let format = FileFormat::detect(path, &bytes);
        debug!(path = %path.display(), ?format, bytes = bytes.len(), "import file read");
        self.import_bytes_with(&bytes, format, on_outcome).await
    }

    pub async fn import_bytes(&self, bytes: &[u8], format: FileFormat) -> Result<ImportReport, CoreError> {
        self.import_bytes_with(bytes, format, |_| {}).await
    }

    /// Parse first; a malformed file fails here, before any request.
    pub async fn import_bytes_with<F>(
        &self,
        bytes: &[u8],
        format: FileFormat,
        on_outcome: F,
    ) -> Result<ImportReport, CoreError>
    where
        F: FnMut(&ImportOutcome) + Send,
    {
        let records = parse_records(bytes, format).inspect_err(|e| {
            warn!(error = %e, "import file rejected");
            self.notifier.send(Notification::error(e.to_string()));
        })?;
        Ok(self.import_records_with(records, on_outcome).await)
    }

    pub async fn import_records(&self, records: Vec<Record>) -> ImportReport {
        self.import_records_with(records, |_| {}).await
    }

    /// Submit every record independently and collect outcomes in input
    /// order. `on_outcome` sees each outcome as soon as it is next in order.
    pub async fn import_records_with<F>(&self, records: Vec<Record>, mut on_outcome: F) -> ImportReport
    where
        F: FnMut(&ImportOutcome) + Send,
    {
        if records.is_empty() {
            let report = ImportReport::default();
            self.notifier.send(report.summary());
            return report;
        }

        info!(records = records.len(), concurrency = self.concurrency, "importing");
        let backend = self.cache.backend();
        let mapping = &self.mapping;

        let mut outcomes = stream::iter(records)
            .map(|record| async move {
                let result = match mapping.map(&record) {
                    Ok(payload) => match backend.create(&payload).await {
                        Ok(row) => ImportResult::Created { row },
                        Err(e) => ImportResult::Rejected { reason: e.reason() },
                    },
                    Err(reason) => ImportResult::Rejected { reason },
                };
                if let ImportResult::Rejected { reason } = &result {
                    debug!(line = record.line, %reason, "record rejected");
                }
                ImportOutcome {
                    line: record.line,
                    record,
                    result,
                }
            })
            .buffered(self.concurrency);

        let mut report = ImportReport::default();
        while let Some(outcome) = outcomes.next().await {
            on_outcome(&outcome);
            report.outcomes.push(outcome);
        }

        info!(
            created = report.created_count(),
            rejected = report.rejected_count(),
            "import finished"
        );
        self.cache.refresh().await;
        self.notifier.send(report.summary());
        report
    }
}
