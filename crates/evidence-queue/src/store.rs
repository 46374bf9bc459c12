//! Shared task collection.
//!
//! The store is the only mutable state shared between the scheduler and
//! reviewer actions. Every operation takes the lock for a single short write
//! and never across an `.await`.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::{Deserialize, Serialize};

use crate::analysis::Verdict;
use crate::task::{ManualVerdict, Task, TaskStatus};

/// Per-status task counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusCounts {
    pub pending: usize,
    pub in_progress: usize,
    pub completed: usize,
    pub flagged: usize,
}

impl StatusCounts {
    pub fn total(&self) -> usize {
        self.pending + self.in_progress + self.completed + self.flagged
    }
}

/// Result of writing an analysis outcome back to a claimed task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Settle {
    Applied,
    /// The task left `IN_PROGRESS` in the meantime (reviewer override or
    /// requeue); the outcome was dropped.
    Superseded(TaskStatus),
    Missing,
}

#[derive(Default)]
struct Inner {
    tasks: Vec<Task>,
    index: HashMap<String, usize>,
}

impl Inner {
    fn get_mut(&mut self, id: &str) -> Option<&mut Task> {
        let idx = *self.index.get(id)?;
        self.tasks.get_mut(idx)
    }
}

#[derive(Clone, Default)]
pub struct TaskStore {
    inner: Arc<RwLock<Inner>>,
}

impl TaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_tasks(tasks: Vec<Task>) -> Self {
        let store = Self::new();
        store.insert_many(tasks);
        store
    }

    fn read(&self) -> RwLockReadGuard<'_, Inner> {
        match self.inner.read() {
            Ok(g) => g,
            Err(poisoned) => {
                log::warn!("Task store lock was poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }

    fn write(&self) -> RwLockWriteGuard<'_, Inner> {
        match self.inner.write() {
            Ok(g) => g,
            Err(poisoned) => {
                log::warn!("Task store lock was poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }

    /// Appends tasks in order. Tasks whose id is already present are skipped.
    /// Returns the ids of the skipped tasks.
    pub fn insert_many(&self, tasks: Vec<Task>) -> Vec<String> {
        let mut inner = self.write();
        let mut rejected = Vec::new();
        for task in tasks {
            if inner.index.contains_key(task.id()) {
                tracing::warn!(task_id = task.id(), "Duplicate task id, skipping");
                rejected.push(task.id().to_string());
                continue;
            }
            let idx = inner.tasks.len();
            inner.index.insert(task.id().to_string(), idx);
            inner.tasks.push(task);
        }
        rejected
    }

    /// Replaces the whole collection.
    pub fn replace_all(&self, tasks: Vec<Task>) {
        {
            let mut inner = self.write();
            inner.tasks.clear();
            inner.index.clear();
        }
        self.insert_many(tasks);
    }

    pub fn len(&self) -> usize {
        self.read().tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().tasks.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<Task> {
        let inner = self.read();
        let idx = *inner.index.get(id)?;
        inner.tasks.get(idx).cloned()
    }

    /// All tasks in insertion order.
    pub fn snapshot(&self) -> Vec<Task> {
        self.read().tasks.clone()
    }

    pub fn status_of(&self, id: &str) -> Option<TaskStatus> {
        let inner = self.read();
        let idx = *inner.index.get(id)?;
        inner.tasks.get(idx).map(Task::status)
    }

    /// Ids of `PENDING` tasks in insertion order.
    pub fn pending_ids(&self) -> Vec<String> {
        self.read()
            .tasks
            .iter()
            .filter(|t| t.status() == TaskStatus::Pending)
            .map(|t| t.id().to_string())
            .collect()
    }

    pub fn ids(&self) -> HashSet<String> {
        self.read().index.keys().cloned().collect()
    }

    pub fn known_fingerprints(&self) -> HashSet<String> {
        self.read()
            .tasks
            .iter()
            .map(|t| t.fingerprint().to_string())
            .collect()
    }

    pub fn counts(&self) -> StatusCounts {
        let inner = self.read();
        let mut counts = StatusCounts::default();
        for task in &inner.tasks {
            match task.status() {
                TaskStatus::Pending => counts.pending += 1,
                TaskStatus::InProgress => counts.in_progress += 1,
                TaskStatus::Completed => counts.completed += 1,
                TaskStatus::Flagged => counts.flagged += 1,
            }
        }
        counts
    }

    /// Atomically moves a `PENDING` task to `IN_PROGRESS` and returns a copy.
    /// Returns `None` if the task is missing or no longer pending.
    pub fn claim(&self, id: &str) -> Option<Task> {
        let mut inner = self.write();
        let task = inner.get_mut(id)?;
        task.claim().ok()?;
        Some(task.clone())
    }

    /// Settles a claimed task as `COMPLETED` with `verdict`.
    pub fn complete(&self, id: &str, verdict: Verdict) -> Settle {
        let mut inner = self.write();
        let Some(task) = inner.get_mut(id) else {
            return Settle::Missing;
        };
        let status = task.status();
        match task.complete_with(verdict) {
            Ok(()) => Settle::Applied,
            Err(_) => Settle::Superseded(status),
        }
    }

    /// Settles a claimed task as `FLAGGED`, recording `reason`.
    pub fn flag(&self, id: &str, reason: &str) -> Settle {
        let mut inner = self.write();
        let Some(task) = inner.get_mut(id) else {
            return Settle::Missing;
        };
        let status = task.status();
        match task.flag(reason) {
            Ok(()) => Settle::Applied,
            Err(_) => Settle::Superseded(status),
        }
    }

    /// Reviewer override. Never blocked by a running batch beyond the
    /// duration of the write itself. Returns `false` if the task is missing.
    pub fn apply_manual_verdict(&self, id: &str, verdict: ManualVerdict) -> bool {
        self.update(id, |t| t.apply_manual_verdict(verdict))
    }

    pub fn set_verified(&self, id: &str, verified: bool, verifier: Option<String>) -> bool {
        self.update(id, |t| t.set_verified(verified, verifier))
    }

    pub fn set_pinned(&self, id: &str, pinned: bool) -> bool {
        self.update(id, |t| t.set_pinned(pinned))
    }

    /// Resets a task to `PENDING` so a later run picks it up again.
    pub fn requeue(&self, id: &str) -> bool {
        self.update(id, Task::requeue)
    }

    /// Requeues every `FLAGGED` task. Returns how many were reset.
    pub fn requeue_flagged(&self) -> usize {
        let mut inner = self.write();
        let mut count = 0;
        for task in inner.tasks.iter_mut() {
            if task.status() == TaskStatus::Flagged {
                task.requeue();
                count += 1;
            }
        }
        count
    }

    fn update<F: FnOnce(&mut Task)>(&self, id: &str, f: F) -> bool {
        let mut inner = self.write();
        match inner.get_mut(id) {
            Some(task) => {
                f(task);
                true
            }
            None => false,
        }
    }
}
