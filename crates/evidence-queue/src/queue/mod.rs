//! The queue scheduler.
//!
//! A run walks a snapshot of the `PENDING` tasks in insertion order, claims
//! them one at a time with a minimum pause between claims, keeps at most
//! `max_in_flight` analyzer calls outstanding and writes each outcome back to
//! the store. Cancellation stops new claims only; work already in flight
//! always finishes and is recorded.

mod outcome;

pub use outcome::{RunOutcome, RunSummary, SchedulerHandle};

use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::task::{JoinError, JoinSet};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, info_span, warn, Instrument};

use crate::analysis::{build_analyzer, Analyzer, Verdict};
use crate::config::{EngineConfig, SchedulerConfig};
use crate::diagnostics::{DiagnosticLevel, DiagnosticLog};
use crate::error::AnalysisError;
use crate::store::{Settle, TaskStore};
use crate::task::TaskStatus;
use outcome::RunGuard;

const LOG_TARGET: &str = "queue";

/// How a claimed task was settled once its analysis call returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Settled {
    Completed,
    Flagged,
    Superseded,
    Missing,
}

pub struct QueueScheduler {
    analyzer: Arc<dyn Analyzer>,
    config: SchedulerConfig,
    diagnostics: DiagnosticLog,
    handle: SchedulerHandle,
}

impl QueueScheduler {
    pub fn new(
        analyzer: Arc<dyn Analyzer>,
        config: SchedulerConfig,
        diagnostics: DiagnosticLog,
    ) -> Self {
        Self {
            analyzer,
            config,
            diagnostics,
            handle: SchedulerHandle {
                running: Arc::new(AtomicBool::new(false)),
                current: Arc::new(Mutex::new(None)),
            },
        }
    }

    /// Builds the scheduler and the configured analyzer.
    pub fn from_config(
        config: &EngineConfig,
        diagnostics: DiagnosticLog,
    ) -> Result<Self, AnalysisError> {
        let analyzer = build_analyzer(&config.analysis)?;
        Ok(Self::new(analyzer, config.scheduler.clone(), diagnostics))
    }

    pub fn handle(&self) -> SchedulerHandle {
        self.handle.clone()
    }

    pub fn is_running(&self) -> bool {
        self.handle.is_running()
    }

    /// Processes the tasks that are `PENDING` when the run starts.
    pub async fn run(&self, store: &TaskStore, cancel: &CancellationToken) -> RunOutcome {
        let Some(_guard) = RunGuard::acquire(&self.handle, cancel) else {
            info!("Queue run requested while another run is active, ignoring");
            self.diagnostics
                .info(LOG_TARGET, "Run ignored: a run is already in progress");
            return RunOutcome::AlreadyRunning;
        };

        let pending = store.pending_ids();
        if pending.is_empty() {
            info!("No pending tasks");
            self.diagnostics.info(LOG_TARGET, "Run skipped: no pending tasks");
            return RunOutcome::NothingPending;
        }

        let span = info_span!(
            "queue_run",
            pending = pending.len(),
            max_in_flight = self.max_in_flight(),
            analyzer = self.analyzer.name(),
        );
        let summary = self
            .process(store, &pending, cancel)
            .instrument(span)
            .await;
        RunOutcome::Finished(summary)
    }

    fn max_in_flight(&self) -> usize {
        self.config.max_in_flight.max(1)
    }

    async fn process(
        &self,
        store: &TaskStore,
        pending: &[String],
        cancel: &CancellationToken,
    ) -> RunSummary {
        let limit = self.max_in_flight();
        let interval = self.config.claim_interval();
        let timeout = self.config.analysis_timeout();

        self.diagnostics.info(
            LOG_TARGET,
            &format!("Run started: {} pending task(s)", pending.len()),
        );

        let mut summary = RunSummary::default();
        let mut in_flight: JoinSet<Result<Settled, JoinError>> = JoinSet::new();
        let mut last_claim: Option<Instant> = None;

        for id in pending {
            if cancel.is_cancelled() {
                summary.cancelled = true;
                break;
            }

            while in_flight.len() >= limit {
                match in_flight.join_next().await {
                    Some(joined) => Self::record(joined, &mut summary),
                    None => break,
                }
            }

            if cancel.is_cancelled() {
                summary.cancelled = true;
                break;
            }

            if let Some(last) = last_claim {
                let wait = interval.saturating_sub(last.elapsed());
                if !wait.is_zero() && !pause(wait, cancel).await {
                    summary.cancelled = true;
                    break;
                }
            }

            let Some(task) = store.claim(id) else {
                debug!(task_id = %id, "Task left PENDING before it was claimed, skipping");
                continue;
            };
            last_claim = Some(Instant::now());
            summary.claimed += 1;
            debug!(task_id = %id, "Claimed");
            self.diagnostics
                .task_event(DiagnosticLevel::Debug, LOG_TARGET, id, "Claimed for analysis");

            let analyzer = Arc::clone(&self.analyzer);
            let settler = Settler {
                store: store.clone(),
                diagnostics: self.diagnostics.clone(),
            };
            // The call is detached so the outcome reaches the store even when
            // the `run` future is dropped mid-flight.
            let call = tokio::spawn(
                async move {
                    let id = task.id().to_string();
                    let analysis = tokio::spawn(async move {
                        tokio::time::timeout(timeout, analyzer.analyze(&task)).await
                    });
                    let result = match analysis.await {
                        Ok(Ok(result)) => result,
                        Ok(Err(_)) => Err(AnalysisError::Timeout {
                            secs: timeout.as_secs(),
                        }),
                        Err(e) => Err(AnalysisError::Panicked(e.to_string())),
                    };
                    settler.settle(&id, result)
                }
                .in_current_span(),
            );
            in_flight.spawn(call);
        }

        if summary.cancelled {
            info!("Run cancelled, draining {} in-flight task(s)", in_flight.len());
            self.diagnostics.warn(
                LOG_TARGET,
                &format!(
                    "Run cancelled; waiting for {} in-flight task(s)",
                    in_flight.len()
                ),
            );
        }

        while let Some(joined) = in_flight.join_next().await {
            Self::record(joined, &mut summary);
        }

        summary.left_pending = pending
            .iter()
            .filter(|id| store.status_of(id) == Some(TaskStatus::Pending))
            .count();

        info!(
            claimed = summary.claimed,
            completed = summary.completed,
            flagged = summary.flagged,
            left_pending = summary.left_pending,
            cancelled = summary.cancelled,
            "Run finished"
        );
        self.diagnostics.info(
            LOG_TARGET,
            &format!(
                "Run finished: {} completed, {} flagged, {} left pending",
                summary.completed, summary.flagged, summary.left_pending
            ),
        );
        summary
    }

    fn record(
        joined: Result<Result<Settled, JoinError>, JoinError>,
        summary: &mut RunSummary,
    ) {
        match joined.and_then(|inner| inner) {
            Ok(Settled::Completed) => summary.completed += 1,
            Ok(Settled::Flagged) => summary.flagged += 1,
            Ok(Settled::Superseded) => summary.superseded += 1,
            Ok(Settled::Missing) => {}
            // Only reachable on runtime shutdown; the task stays IN_PROGRESS
            Err(e) => error!("Analysis wrapper failed: {}", e),
        }
    }
}

/// Writes analysis outcomes back to the store.
struct Settler {
    store: TaskStore,
    diagnostics: DiagnosticLog,
}

impl Settler {
    fn settle(&self, id: &str, result: Result<Verdict, AnalysisError>) -> Settled {
        let (settle, success) = match result {
            Ok(verdict) => {
                let score = verdict.score;
                let settle = self.store.complete(id, verdict);
                if settle == Settle::Applied {
                    debug!(task_id = %id, score, "Completed");
                    self.diagnostics.task_event(
                        DiagnosticLevel::Info,
                        LOG_TARGET,
                        id,
                        &format!("Analysis completed (score {})", score),
                    );
                }
                (settle, true)
            }
            Err(e) => {
                let reason = e.to_string();
                let settle = self.store.flag(id, &reason);
                if settle == Settle::Applied {
                    warn!(task_id = %id, "Flagged: {}", reason);
                    self.diagnostics.task_event(
                        DiagnosticLevel::Error,
                        LOG_TARGET,
                        id,
                        &format!("Analysis failed: {}", reason),
                    );
                }
                (settle, false)
            }
        };

        match settle {
            Settle::Applied if success => Settled::Completed,
            Settle::Applied => Settled::Flagged,
            Settle::Superseded(status) => {
                info!(task_id = %id, %status, "Task settled elsewhere, dropping analysis outcome");
                self.diagnostics.task_event(
                    DiagnosticLevel::Info,
                    LOG_TARGET,
                    id,
                    &format!("Analysis outcome dropped: task is already {}", status),
                );
                Settled::Superseded
            }
            Settle::Missing => {
                warn!(task_id = %id, "Task disappeared from the store");
                Settled::Missing
            }
        }
    }
}

/// Sleeps for `wait` unless cancelled first. Returns `false` on cancellation.
async fn pause(wait: Duration, cancel: &CancellationToken) -> bool {
    tokio::select! {
        _ = cancel.cancelled() => false,
        _ = tokio::time::sleep(wait) => true,
    }
}
