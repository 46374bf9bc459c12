//! Snapshot and CSV export of the task collection.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::diagnostics::DiagnosticEvent;
use crate::error::ExportError;
use crate::parse::write_delimited;
use crate::task::Task;

pub const SNAPSHOT_VERSION: &str = "1";

/// Everything needed to restore a review session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub version: String,
    pub exported_at: DateTime<Utc>,
    pub tasks: Vec<Task>,
    #[serde(default)]
    pub logs: Vec<DiagnosticEvent>,
}

impl Snapshot {
    pub fn new(tasks: Vec<Task>, logs: Vec<DiagnosticEvent>) -> Self {
        Self {
            version: SNAPSHOT_VERSION.to_string(),
            exported_at: Utc::now(),
            tasks,
            logs,
        }
    }

    pub fn to_json(&self) -> Result<String, ExportError> {
        serde_json::to_string_pretty(self).map_err(ExportError::Serialize)
    }

    pub fn from_json(json: &str) -> Result<Self, ExportError> {
        let snapshot: Self = serde_json::from_str(json).map_err(ExportError::Deserialize)?;
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(ExportError::UnsupportedVersion(snapshot.version));
        }
        Ok(snapshot)
    }
}

const CSV_HEADERS: &[&str] = &[
    "id",
    "fingerprint",
    "file",
    "source",
    "date",
    "status",
    "relevant",
    "privileged",
    "score",
    "tags",
    "opinion",
    "quote",
    "verified",
    "pinned",
    "attempts",
];

/// One row per task. Analysis columns are empty until analysis completes;
/// a reviewer's manual verdict takes precedence over the analyzer's.
pub fn to_csv(tasks: &[Task]) -> String {
    let rows: Vec<Vec<String>> = tasks.iter().map(csv_row).collect();
    write_delimited(CSV_HEADERS, &rows)
}

fn csv_row(task: &Task) -> Vec<String> {
    let verdict = task.analysis().map(|a| &a.verdict);
    let manual = task.review.manual_verdict.as_ref();

    let relevant = manual
        .and_then(|m| m.relevant)
        .or(verdict.map(|v| v.relevant));
    let privileged = manual
        .and_then(|m| m.privileged)
        .or(verdict.map(|v| v.privileged));
    let opinion = manual
        .and_then(|m| m.opinion.clone())
        .or(verdict.map(|v| v.opinion.clone()));

    vec![
        task.id().to_string(),
        task.fingerprint().to_string(),
        task.file_name.clone(),
        task.source.clone().unwrap_or_default(),
        task.timestamp.clone(),
        task.status().to_string(),
        flag(relevant),
        flag(privileged),
        verdict.map(|v| v.score.to_string()).unwrap_or_default(),
        verdict.map(|v| v.tags.join("; ")).unwrap_or_default(),
        opinion.unwrap_or_default(),
        verdict.map(|v| v.key_quote.clone()).unwrap_or_default(),
        task.review.verified.to_string(),
        task.review.pinned.to_string(),
        task.attempts().to_string(),
    ]
}

fn flag(value: Option<bool>) -> String {
    value.map(|b| b.to_string()).unwrap_or_default()
}
