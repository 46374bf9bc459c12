use std::path::PathBuf;
use thiserror::Error;

use crate::task::TaskStatus;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Processing error: {0}")]
    Process(#[from] ProcessError),

    #[error("Ingestion error: {0}")]
    Ingest(#[from] IngestError),

    #[error("Invalid transition: {0}")]
    Transition(#[from] TransitionError),

    #[error("Analysis error: {0}")]
    Analysis(#[from] AnalysisError),

    #[error("Export error: {0}")]
    Export(#[from] ExportError),

    #[error("Telemetry error: {0}")]
    Telemetry(#[from] TelemetryError),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config JSON: {0}")]
    ParseJson(#[from] serde_json::Error),

    #[error("Config validation failed: {message}")]
    Validation { message: String },

    #[error("Schema validation failed: {errors}")]
    SchemaValidation { errors: String },
}

#[derive(Error, Debug)]
pub enum ProcessError {
    #[error("Unsupported document format: {0}")]
    UnsupportedFormat(String),

    #[error("Failed to process PDF: {0}")]
    PdfProcessing(String),

    #[error("Failed to process DOCX: {0}")]
    DocxProcessing(String),

    #[error("Text extraction failed: {0}")]
    TextExtraction(String),
}

#[derive(Error, Debug)]
pub enum IngestError {
    #[error("File '{name}' is empty")]
    EmptyFile { name: String },

    #[error("File '{name}' could not be processed: {source}")]
    Process {
        name: String,
        #[source]
        source: ProcessError,
    },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("task '{task_id}' cannot move from {from} to {to}")]
pub struct TransitionError {
    pub task_id: String,
    pub from: TaskStatus,
    pub to: TaskStatus,
}

#[derive(Error, Debug, Clone)]
pub enum AnalysisError {
    #[error("Analysis request failed: {0}")]
    Request(String),

    #[error("Analysis timed out after {secs}s")]
    Timeout { secs: u64 },

    #[error("Failed to parse analysis response: {0}")]
    ResponseParse(String),

    #[error("Analyzer rejected task: {0}")]
    Rejected(String),

    #[error("Analysis worker panicked: {0}")]
    Panicked(String),
}

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Failed to serialize snapshot: {0}")]
    Serialize(#[source] serde_json::Error),

    #[error("Failed to read snapshot: {0}")]
    Deserialize(#[source] serde_json::Error),

    #[error("Unsupported snapshot version: {0}")]
    UnsupportedVersion(String),
}

#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("A global tracing subscriber is already installed: {0}")]
    Subscriber(#[from] tracing::subscriber::SetGlobalDefaultError),

    #[error("Failed to bridge log records into tracing: {0}")]
    LogBridge(#[from] log::SetLoggerError),
}

pub type Result<T> = std::result::Result<T, EngineError>;
