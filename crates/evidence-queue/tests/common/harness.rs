//! Test harness for scheduler runs.
//!
//! `ScriptedAnalyzer` records every call and how many calls overlapped, and
//! can be told to fail, panic, stall or run a hook on chosen calls (numbered
//! from 1 in claim order).

#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use evidence_queue::config::{IngestConfig, SchedulerConfig};
use evidence_queue::identity::IdMinter;
use evidence_queue::{
    AnalysisError, Analyzer, CancellationToken, DiagnosticLog, IngestReport, Ingestor,
    QueueScheduler, RunOutcome, Task, TaskStatus, TaskStore, UploadedFile, Verdict,
};

type Hook = Box<dyn Fn(usize, &Task) + Send + Sync>;

pub struct ScriptedAnalyzer {
    delay: Duration,
    fail_on: HashSet<usize>,
    panic_on: HashSet<usize>,
    hook: Option<Hook>,
    calls: AtomicUsize,
    active: AtomicUsize,
    max_active: AtomicUsize,
    seen: Mutex<Vec<String>>,
}

impl ScriptedAnalyzer {
    pub fn new() -> Self {
        Self {
            delay: Duration::ZERO,
            fail_on: HashSet::new(),
            panic_on: HashSet::new(),
            hook: None,
            calls: AtomicUsize::new(0),
            active: AtomicUsize::new(0),
            max_active: AtomicUsize::new(0),
            seen: Mutex::new(Vec::new()),
        }
    }

    /// Every call takes this long before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn fail_on(mut self, call: usize) -> Self {
        self.fail_on.insert(call);
        self
    }

    pub fn panic_on(mut self, call: usize) -> Self {
        self.panic_on.insert(call);
        self
    }

    /// Runs `hook(call_number, task)` at the start of every call.
    pub fn with_hook<F>(mut self, hook: F) -> Self
    where
        F: Fn(usize, &Task) + Send + Sync + 'static,
    {
        self.hook = Some(Box::new(hook));
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn max_active(&self) -> usize {
        self.max_active.load(Ordering::SeqCst)
    }

    /// Task ids in the order the analyzer saw them.
    pub fn seen(&self) -> Vec<String> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl Analyzer for ScriptedAnalyzer {
    async fn analyze(&self, task: &Task) -> Result<Verdict, AnalysisError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        self.seen.lock().unwrap().push(task.id().to_string());

        let now_active = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_active.fetch_max(now_active, Ordering::SeqCst);

        if let Some(hook) = &self.hook {
            hook(call, task);
        }

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.active.fetch_sub(1, Ordering::SeqCst);

        if self.panic_on.contains(&call) {
            panic!("scripted panic on call {}", call);
        }
        if self.fail_on.contains(&call) {
            return Err(AnalysisError::Request(format!(
                "scripted failure on call {}",
                call
            )));
        }

        Ok(Verdict {
            relevant: true,
            score: 75,
            opinion: format!("scripted verdict for call {}", call),
            tags: vec!["scripted".to_string()],
            ..Verdict::default()
        })
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

/// Store, diagnostic log and scheduler wired the way an application would.
pub struct QueueHarness {
    pub store: TaskStore,
    pub diagnostics: DiagnosticLog,
    pub analyzer: Arc<ScriptedAnalyzer>,
    pub scheduler: QueueScheduler,
}

impl QueueHarness {
    pub fn new(analyzer: ScriptedAnalyzer, config: SchedulerConfig) -> Self {
        Self::with_store(TaskStore::new(), analyzer, config)
    }

    pub fn with_store(store: TaskStore, analyzer: ScriptedAnalyzer, config: SchedulerConfig) -> Self {
        let diagnostics = DiagnosticLog::new(500);
        let analyzer = Arc::new(analyzer);
        let scheduler = QueueScheduler::new(
            Arc::clone(&analyzer) as Arc<dyn Analyzer>,
            config,
            diagnostics.clone(),
        );
        Self {
            store,
            diagnostics,
            analyzer,
            scheduler,
        }
    }

    /// Ingests `files` with default settings and a fixed id seed.
    pub fn ingest(&self, files: Vec<UploadedFile>) -> IngestReport {
        let mut ingestor = Ingestor::new(IngestConfig::default(), self.diagnostics.clone())
            .with_minter(IdMinter::with_seed(1));
        ingestor.ingest_into(files, &self.store)
    }

    pub async fn run(&self) -> RunOutcome {
        self.scheduler.run(&self.store, &CancellationToken::new()).await
    }

    pub async fn run_with(&self, token: &CancellationToken) -> RunOutcome {
        self.scheduler.run(&self.store, token).await
    }

    /// Statuses in insertion order.
    pub fn statuses(&self) -> Vec<TaskStatus> {
        self.store.snapshot().iter().map(Task::status).collect()
    }
}
