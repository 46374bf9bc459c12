//! Builders for test inputs.

#![allow(dead_code)]

use serde_json::Value;

use evidence_queue::config::SchedulerConfig;
use evidence_queue::{Task, TaskStore, UploadedFile};

/// JSON array upload holding `records`.
pub fn json_file(name: &str, records: &[Value]) -> UploadedFile {
    let body = serde_json::to_string(records).expect("records serialize");
    UploadedFile::new(name, body)
}

pub fn text_file(name: &str, text: &str) -> UploadedFile {
    UploadedFile::new(name, text)
}

/// Delimited upload built from a header and rows.
pub fn csv_file(name: &str, headers: &[&str], rows: &[Vec<&str>]) -> UploadedFile {
    let rows: Vec<Vec<String>> = rows
        .iter()
        .map(|r| r.iter().map(|v| v.to_string()).collect())
        .collect();
    UploadedFile::new(
        name,
        evidence_queue::parse::write_delimited(headers, &rows),
    )
}

/// Builder for `Task` instances.
pub struct TaskBuilder {
    id: String,
    file_name: String,
    content: String,
    source: Option<String>,
}

impl TaskBuilder {
    pub fn new(n: u32) -> Self {
        Self {
            id: format!("DOC-{:06}", n),
            file_name: "batch.json".to_string(),
            content: format!("Document number {}", n),
            source: None,
        }
    }

    pub fn content(mut self, content: &str) -> Self {
        self.content = content.to_string();
        self
    }

    pub fn file_name(mut self, name: &str) -> Self {
        self.file_name = name.to_string();
        self
    }

    pub fn source(mut self, source: &str) -> Self {
        self.source = Some(source.to_string());
        self
    }

    pub fn build(self) -> Task {
        let task = Task::new(self.id, self.file_name, &self.content, 20_000);
        match self.source {
            Some(source) => task.with_source(source),
            None => task,
        }
    }
}

/// Store holding `count` pending tasks `DOC-000001..`.
pub fn pending_store(count: u32) -> TaskStore {
    TaskStore::from_tasks((1..=count).map(|n| TaskBuilder::new(n).build()).collect())
}

/// Scheduler settings without pacing, so tests run fast.
pub fn scheduler_config(max_in_flight: usize) -> SchedulerConfig {
    SchedulerConfig {
        max_in_flight,
        claim_interval_ms: 0,
        analysis_timeout_secs: 30,
    }
}
