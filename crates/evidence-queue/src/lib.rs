pub mod analysis;
pub mod config;
pub mod dates;
pub mod diagnostics;
pub mod error;
pub mod export;
pub mod identity;
pub mod ingest;
pub mod parse;
pub mod processor;
pub mod queue;
pub mod store;
pub mod task;
pub mod telemetry;

pub use analysis::{build_analyzer, Analyzer, HttpAnalyzer, KeywordAnalyzer, Verdict};
pub use config::{load_config, load_config_from_str, EngineConfig};
pub use diagnostics::{DiagnosticEvent, DiagnosticLevel, DiagnosticLog};
pub use error::{
    AnalysisError, ConfigError, EngineError, ExportError, IngestError, ProcessError, Result,
    TelemetryError, TransitionError,
};
pub use export::{to_csv, Snapshot};
pub use ingest::{IngestReport, Ingestor, UploadedFile};
pub use queue::{QueueScheduler, RunOutcome, RunSummary, SchedulerHandle};
pub use store::{StatusCounts, TaskStore};
pub use task::{ManualVerdict, Task, TaskStatus};
pub use tokio_util::sync::CancellationToken;
