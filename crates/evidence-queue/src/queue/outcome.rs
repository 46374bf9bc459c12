use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use serde::Serialize;
use tokio_util::sync::CancellationToken;

/// Counters for one scheduler run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunSummary {
    pub claimed: usize,
    pub completed: usize,
    pub flagged: usize,
    /// Tasks from the starting snapshot that were still `PENDING` at the end.
    pub left_pending: usize,
    /// Outcomes dropped because a reviewer settled the task first.
    pub superseded: usize,
    pub cancelled: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// Another run holds the scheduler; nothing was claimed.
    AlreadyRunning,
    /// No `PENDING` tasks at start.
    NothingPending,
    Finished(RunSummary),
}

impl RunOutcome {
    pub fn summary(&self) -> Option<&RunSummary> {
        match self {
            Self::Finished(summary) => Some(summary),
            _ => None,
        }
    }
}

/// Lets another task observe or stop the active run.
#[derive(Clone)]
pub struct SchedulerHandle {
    pub(crate) running: Arc<AtomicBool>,
    pub(crate) current: Arc<Mutex<Option<CancellationToken>>>,
}

impl SchedulerHandle {
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Cancels the active run's token. Returns `false` when idle.
    pub fn stop(&self) -> bool {
        let current = match self.current.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        };
        match current {
            Some(token) => {
                token.cancel();
                true
            }
            None => false,
        }
    }
}

/// Releases the running flag when a run ends, including by panic.
pub(crate) struct RunGuard {
    handle: SchedulerHandle,
}

impl RunGuard {
    /// Claims the running flag, or returns `None` if a run is active.
    pub(crate) fn acquire(handle: &SchedulerHandle, token: &CancellationToken) -> Option<Self> {
        handle
            .running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()?;
        set_current(&handle.current, Some(token.clone()));
        Some(Self {
            handle: handle.clone(),
        })
    }
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        set_current(&self.handle.current, None);
        self.handle.running.store(false, Ordering::SeqCst);
    }
}

fn set_current(slot: &Mutex<Option<CancellationToken>>, token: Option<CancellationToken>) {
    match slot.lock() {
        Ok(mut guard) => *guard = token,
        Err(poisoned) => *poisoned.into_inner() = token,
    }
}
