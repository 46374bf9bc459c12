//! Diagnostic log for ingestion and scheduling events.
//!
//! Keeps a bounded in-memory history (exported with snapshots) and fans
//! events out to live subscribers over a broadcast channel.

use std::collections::VecDeque;
use std::fmt;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DiagnosticLevel {
    Debug,
    Info,
    Warn,
    Error,
}

impl fmt::Display for DiagnosticLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DiagnosticLevel::Debug => "DEBUG",
            DiagnosticLevel::Info => "INFO",
            DiagnosticLevel::Warn => "WARN",
            DiagnosticLevel::Error => "ERROR",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosticEvent {
    pub timestamp: DateTime<Utc>,
    pub level: DiagnosticLevel,
    pub target: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_id: Option<String>,
}

impl DiagnosticEvent {
    pub fn new(level: DiagnosticLevel, target: &str, message: &str) -> Self {
        Self {
            timestamp: Utc::now(),
            level,
            target: target.to_string(),
            message: message.to_string(),
            task_id: None,
        }
    }

    pub fn for_task(mut self, task_id: &str) -> Self {
        self.task_id = Some(task_id.to_string());
        self
    }
}

#[derive(Clone)]
pub struct DiagnosticLog {
    sender: broadcast::Sender<DiagnosticEvent>,
    history: Arc<Mutex<VecDeque<DiagnosticEvent>>>,
    capacity: usize,
}

impl DiagnosticLog {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender,
            history: Arc::new(Mutex::new(VecDeque::with_capacity(capacity))),
            capacity,
        }
    }

    pub fn send(&self, event: DiagnosticEvent) {
        if let Ok(mut history) = self.history.lock() {
            if history.len() == self.capacity {
                history.pop_front();
            }
            history.push_back(event.clone());
        }
        // No active receivers is fine
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<DiagnosticEvent> {
        self.sender.subscribe()
    }

    pub fn log(&self, level: DiagnosticLevel, target: &str, message: &str) {
        self.send(DiagnosticEvent::new(level, target, message));
    }

    pub fn info(&self, target: &str, message: &str) {
        self.log(DiagnosticLevel::Info, target, message);
    }

    pub fn warn(&self, target: &str, message: &str) {
        self.log(DiagnosticLevel::Warn, target, message);
    }

    pub fn error(&self, target: &str, message: &str) {
        self.log(DiagnosticLevel::Error, target, message);
    }

    pub fn debug(&self, target: &str, message: &str) {
        self.log(DiagnosticLevel::Debug, target, message);
    }

    pub fn task_event(&self, level: DiagnosticLevel, target: &str, task_id: &str, message: &str) {
        self.send(DiagnosticEvent::new(level, target, message).for_task(task_id));
    }

    /// Retained events, oldest first.
    pub fn entries(&self) -> Vec<DiagnosticEvent> {
        self.history
            .lock()
            .map(|h| h.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Retained events mentioning `task_id`, oldest first.
    pub fn entries_for_task(&self, task_id: &str) -> Vec<DiagnosticEvent> {
        self.entries()
            .into_iter()
            .filter(|e| e.task_id.as_deref() == Some(task_id))
            .collect()
    }

    /// Replaces the history, e.g. when restoring a snapshot.
    pub fn restore(&self, events: Vec<DiagnosticEvent>) {
        if let Ok(mut history) = self.history.lock() {
            let skip = events.len().saturating_sub(self.capacity);
            *history = events.into_iter().skip(skip).collect();
        }
    }
}

impl Default for DiagnosticLog {
    fn default() -> Self {
        Self::new(1000)
    }
}
