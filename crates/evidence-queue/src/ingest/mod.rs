//! Batch import of uploaded files into pending tasks.
//!
//! Each file is handled in isolation: a failure is logged, recorded on the
//! report and the batch moves on to the next file.

pub mod record;

use std::collections::HashSet;

use serde_json::{json, Value};
use tracing::{debug, error, info, info_span, warn};

use crate::config::IngestConfig;
use crate::diagnostics::{DiagnosticLevel, DiagnosticLog};
use crate::error::{IngestError, ProcessError};
use crate::identity::{self, IdMinter};
use crate::parse::{normalize, parse_delimited, to_records};
use crate::processor::{self, DocumentFormat, ProcessorRegistry};
use crate::store::TaskStore;
use crate::task::Task;

/// Content stored for binary documents whose text could not be read.
pub const EXTRACTION_FAILED: &str = "[Extraction failed: unreadable document]";

const LOG_TARGET: &str = "ingest";

/// A file handed to the import surface.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub name: String,
    pub bytes: Vec<u8>,
    /// Overrides the extension taken from `name`.
    pub extension: Option<String>,
}

impl UploadedFile {
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
            extension: None,
        }
    }

    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = Some(extension.into());
        self
    }
}

/// Per-file outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSummary {
    pub name: String,
    pub mime_type: String,
    pub format: Option<DocumentFormat>,
    pub tasks: usize,
}

#[derive(Debug)]
pub struct IngestFailure {
    pub file_name: String,
    pub error: IngestError,
}

#[derive(Debug, Default)]
pub struct IngestReport {
    /// New tasks, all `PENDING`, in file then record order.
    pub tasks: Vec<Task>,
    pub files: Vec<FileSummary>,
    pub failures: Vec<IngestFailure>,
    /// Records skipped because their fingerprint was already known.
    pub duplicates: usize,
}

impl IngestReport {
    /// User-facing notice when a non-empty batch produced nothing.
    pub fn notice(&self) -> Option<String> {
        if !self.tasks.is_empty() || self.files.is_empty() {
            return None;
        }
        Some(format!(
            "No documents could be extracted from {} file(s). Check the file formats and try again.",
            self.files.len()
        ))
    }
}

pub struct Ingestor {
    config: IngestConfig,
    processors: ProcessorRegistry,
    minter: IdMinter,
    diagnostics: DiagnosticLog,
    known: HashSet<String>,
    /// Ids that must not be minted again.
    taken: HashSet<String>,
}

impl Ingestor {
    pub fn new(config: IngestConfig, diagnostics: DiagnosticLog) -> Self {
        let processors = ProcessorRegistry::new(config.max_pdf_pages);
        Self {
            config,
            processors,
            minter: IdMinter::new(),
            diagnostics,
            known: HashSet::new(),
            taken: HashSet::new(),
        }
    }

    pub fn with_minter(mut self, minter: IdMinter) -> Self {
        self.minter = minter;
        self
    }

    /// Fingerprints treated as already ingested when `skip_duplicates` is on.
    pub fn with_known_fingerprints(mut self, fingerprints: HashSet<String>) -> Self {
        self.known = fingerprints;
        self
    }

    /// Converts a batch of files into pending tasks.
    pub fn ingest(&mut self, files: Vec<UploadedFile>) -> IngestReport {
        let _span = info_span!("ingest_batch", file_count = files.len()).entered();
        let mut report = IngestReport::default();

        for file in files {
            let _file_span = info_span!("ingest_file", name = %file.name).entered();
            let mime_type = processor::mime_type(&file.name, file.extension.as_deref());
            let format =
                DocumentFormat::detect(&file.name, file.extension.as_deref(), &file.bytes);

            let before = report.tasks.len();
            match self.ingest_file(&file, format, &mut report) {
                Ok(()) => {
                    let produced = report.tasks.len() - before;
                    debug!("Produced {} task(s) from {}", produced, file.name);
                    self.diagnostics.info(
                        LOG_TARGET,
                        &format!("{}: {} task(s) created", file.name, produced),
                    );
                }
                Err(error) => {
                    warn!("Skipping {}: {}", file.name, error);
                    self.diagnostics.warn(
                        LOG_TARGET,
                        &format!("{}: skipped ({})", file.name, error),
                    );
                    report.failures.push(IngestFailure {
                        file_name: file.name.clone(),
                        error,
                    });
                }
            }

            report.files.push(FileSummary {
                name: file.name,
                mime_type,
                format,
                tasks: report.tasks.len() - before,
            });
        }

        info!(
            tasks = report.tasks.len(),
            failures = report.failures.len(),
            duplicates = report.duplicates,
            "Ingestion finished"
        );
        if let Some(notice) = report.notice() {
            self.diagnostics.warn(LOG_TARGET, &notice);
        }
        report
    }

    /// Ingests `files` and inserts the resulting tasks into `store`.
    ///
    /// Ids already present in the store are never minted. Tasks the store
    /// still refuses are logged and left out of the report.
    pub fn ingest_into(&mut self, files: Vec<UploadedFile>, store: &TaskStore) -> IngestReport {
        self.taken.extend(store.ids());
        let mut report = self.ingest(files);

        let rejected = store.insert_many(report.tasks.clone());
        if !rejected.is_empty() {
            error!("{} task(s) were not stored: id already in use", rejected.len());
            for id in &rejected {
                self.diagnostics.task_event(
                    DiagnosticLevel::Error,
                    LOG_TARGET,
                    id,
                    "Task not stored: id already in use",
                );
            }
            report.tasks.retain(|t| !rejected.contains(&t.id().to_string()));
        }
        report
    }

    fn next_id(&mut self) -> String {
        let id = self.minter.mint_unused(&self.taken);
        self.taken.insert(id.clone());
        id
    }

    fn ingest_file(
        &mut self,
        file: &UploadedFile,
        format: Option<DocumentFormat>,
        report: &mut IngestReport,
    ) -> Result<(), IngestError> {
        if file.bytes.is_empty() {
            return Err(IngestError::EmptyFile {
                name: file.name.clone(),
            });
        }

        let format = format.ok_or_else(|| IngestError::Process {
            name: file.name.clone(),
            source: ProcessError::UnsupportedFormat(
                processor::declared_extension(&file.name, file.extension.as_deref())
                    .unwrap_or_else(|| "binary".to_string()),
            ),
        })?;

        if format.is_textual() {
            let text = self
                .processors
                .extract(format, &file.bytes)
                .map_err(|source| IngestError::Process {
                    name: file.name.clone(),
                    source,
                })?;
            self.ingest_text(&file.name, format, &text, report);
        } else {
            self.ingest_document(&file.name, format, &file.bytes, report);
        }
        Ok(())
    }

    fn ingest_text(
        &mut self,
        name: &str,
        format: DocumentFormat,
        text: &str,
        report: &mut IngestReport,
    ) {
        let records = match format {
            DocumentFormat::Delimited => to_records(&parse_delimited(text)),
            _ => normalize(text),
        };

        if records.is_empty() {
            if format == DocumentFormat::Delimited {
                debug!("No rows parsed from {}, treating as plain text", name);
            }
            self.push_text_task(name, text, report);
            return;
        }

        for record in records {
            self.push_record_task(name, record, report);
        }
    }

    fn ingest_document(
        &mut self,
        name: &str,
        format: DocumentFormat,
        bytes: &[u8],
        report: &mut IngestReport,
    ) {
        let extracted = self
            .processors
            .extract(format, bytes)
            .and_then(|text| {
                if text.trim().is_empty() {
                    Err(ProcessError::TextExtraction(
                        "document contains no extractable text".to_string(),
                    ))
                } else {
                    Ok(text)
                }
            });

        match extracted {
            Ok(text) => self.push_text_task(name, &text, report),
            Err(e) => {
                warn!("Text extraction failed for {}: {}", name, e);
                let id = self.next_id();
                self.diagnostics.task_event(
                    DiagnosticLevel::Warn,
                    LOG_TARGET,
                    &id,
                    &format!("{}: {}", name, e),
                );
                let task = Task::new(id, name, EXTRACTION_FAILED, self.config.max_content_chars)
                    .with_source(self.config.default_source.clone())
                    .with_payload(json!({
                        "type": "text",
                        "text": EXTRACTION_FAILED,
                        "error": e.to_string(),
                    }));
                report.tasks.push(task);
            }
        }
    }

    fn push_text_task(&mut self, name: &str, text: &str, report: &mut IngestReport) {
        if self.is_duplicate(text, report) {
            return;
        }
        let task = Task::new(self.next_id(), name, text, self.config.max_content_chars)
            .with_source(self.config.default_source.clone())
            .with_payload(json!({ "type": "text", "text": text }));
        report.tasks.push(task);
    }

    fn push_record_task(&mut self, name: &str, record: Value, report: &mut IngestReport) {
        let serialized = record::serialize_record(&record);
        if self.is_duplicate(&serialized, report) {
            return;
        }

        let source = record::record_source(&record)
            .unwrap_or_else(|| self.config.default_source.clone());
        let mut task = Task::new(
            self.next_id(),
            name,
            &serialized,
            self.config.max_content_chars,
        )
        .with_source(source);

        if let Some((raw, normalized)) = record::record_date(&record) {
            if normalized.is_known() {
                task = task.with_timestamp(normalized.to_string());
            } else {
                debug!(task_id = task.id(), "Unparseable date '{}'", raw);
                self.diagnostics.task_event(
                    DiagnosticLevel::Debug,
                    LOG_TARGET,
                    task.id(),
                    &format!("{}: date '{}' not understood, keeping ingestion time", name, raw),
                );
            }
            task = task.with_original_date(raw);
        }

        report.tasks.push(task.with_payload(record));
    }

    fn is_duplicate(&mut self, content: &str, report: &mut IngestReport) -> bool {
        if !self.config.skip_duplicates {
            return false;
        }
        if self.known.insert(identity::fingerprint(content)) {
            return false;
        }
        report.duplicates += 1;
        true
    }
}
