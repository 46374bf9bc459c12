use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::analysis::Verdict;
use crate::error::TransitionError;
use crate::identity;
use crate::task::state::TaskStatus;

/// Analysis result merged into a task on `IN_PROGRESS -> COMPLETED`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisOutcome {
    #[serde(flatten)]
    pub verdict: Verdict,
    pub analyzed_at: DateTime<Utc>,
}

/// Verdict entered by a reviewer instead of (or on top of) automated analysis.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManualVerdict {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relevant: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub privileged: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opinion: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reviewer: Option<String>,
}

/// Fields owned by human reviewers. The scheduler never writes these.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewState {
    #[serde(default)]
    pub verified: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verified_by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verified_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub pinned: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manual_verdict: Option<ManualVerdict>,
}

/// One ingested document plus its workflow and analysis state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    id: String,
    fingerprint: String,
    /// Name of the uploaded file this task was extracted from.
    pub file_name: String,
    /// Archival source or provenance string.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    /// Date exactly as it appeared in the record.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_date: Option<String>,
    /// Normalized `YYYY-MM-DD` date, or the ingestion instant.
    pub timestamp: String,
    content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
    status: TaskStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    analysis: Option<AnalysisOutcome>,
    #[serde(default)]
    pub review: ReviewState,
    /// Why the last analysis attempt failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    last_error: Option<String>,
    /// Number of times the scheduler has claimed this task.
    #[serde(default)]
    attempts: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// Creates a `PENDING` task. `raw_content` is fingerprinted in full and
    /// stored truncated to `max_content_chars`.
    pub fn new(
        id: impl Into<String>,
        file_name: impl Into<String>,
        raw_content: &str,
        max_content_chars: usize,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            fingerprint: identity::fingerprint(raw_content),
            file_name: file_name.into(),
            source: None,
            original_date: None,
            timestamp: now.to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
            content: truncate_chars(raw_content, max_content_chars),
            payload: None,
            status: TaskStatus::Pending,
            analysis: None,
            review: ReviewState::default(),
            last_error: None,
            attempts: 0,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn with_original_date(mut self, date: impl Into<String>) -> Self {
        self.original_date = Some(date.into());
        self
    }

    pub fn with_timestamp(mut self, timestamp: impl Into<String>) -> Self {
        self.timestamp = timestamp.into();
        self
    }

    pub fn with_payload(mut self, payload: Value) -> Self {
        self.payload = Some(payload);
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn status(&self) -> TaskStatus {
        self.status
    }

    pub fn analysis(&self) -> Option<&AnalysisOutcome> {
        self.analysis.as_ref()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Replaces the content and recomputes the fingerprint.
    pub fn replace_content(&mut self, raw_content: &str, max_content_chars: usize) {
        self.fingerprint = identity::fingerprint(raw_content);
        self.content = truncate_chars(raw_content, max_content_chars);
        self.touch();
    }

    /// Top-level payload field, if the payload is an object.
    pub fn payload_field(&self, key: &str) -> Option<&Value> {
        self.payload.as_ref()?.as_object()?.get(key)
    }

    pub fn payload_str(&self, key: &str) -> Option<&str> {
        self.payload_field(key)?.as_str()
    }

    /// Applies a scheduler transition, rejecting anything outside the
    /// lifecycle table.
    pub fn transition(&mut self, next: TaskStatus) -> Result<(), TransitionError> {
        if !self.status.can_transition_to(next) {
            return Err(TransitionError {
                task_id: self.id.clone(),
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        self.touch();
        Ok(())
    }

    /// `PENDING -> IN_PROGRESS`, counting the attempt.
    pub fn claim(&mut self) -> Result<(), TransitionError> {
        self.transition(TaskStatus::InProgress)?;
        self.attempts += 1;
        Ok(())
    }

    /// `IN_PROGRESS -> COMPLETED`, merging the verdict into the analysis fields.
    pub fn complete_with(&mut self, verdict: Verdict) -> Result<(), TransitionError> {
        self.transition(TaskStatus::Completed)?;
        self.analysis = Some(AnalysisOutcome {
            verdict: verdict.clamped(),
            analyzed_at: Utc::now(),
        });
        self.last_error = None;
        Ok(())
    }

    /// `IN_PROGRESS -> FLAGGED`. Analysis fields are left untouched.
    pub fn flag(&mut self, reason: impl Into<String>) -> Result<(), TransitionError> {
        self.transition(TaskStatus::Flagged)?;
        self.last_error = Some(reason.into());
        Ok(())
    }

    /// Reviewer override: marks the task `COMPLETED` from any state.
    ///
    /// This is a direct write. It does not consult the lifecycle table and
    /// may race with a scheduler claim, in which case the last writer wins.
    pub fn apply_manual_verdict(&mut self, verdict: ManualVerdict) {
        self.status = TaskStatus::Completed;
        self.review.manual_verdict = Some(verdict);
        self.touch();
    }

    /// External requeue back to `PENDING`.
    pub fn requeue(&mut self) {
        self.status = TaskStatus::Pending;
        self.last_error = None;
        self.touch();
    }

    pub fn set_verified(&mut self, verified: bool, verifier: Option<String>) {
        self.review.verified = verified;
        if verified {
            self.review.verified_by = verifier;
            self.review.verified_at = Some(Utc::now());
        } else {
            self.review.verified_by = None;
            self.review.verified_at = None;
        }
        self.touch();
    }

    pub fn set_pinned(&mut self, pinned: bool) {
        self.review.pinned = pinned;
        self.touch();
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

/// Prefix of `s` holding at most `max_chars` characters.
pub fn truncate_chars(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => s[..idx].to_string(),
        None => s.to_string(),
    }
}
