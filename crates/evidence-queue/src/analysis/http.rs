//! Remote analysis over HTTP.
//!
//! The task is POSTed as JSON; the service answers with a verdict object.
//! Responses are read permissively because model-backed services often emit
//! slightly malformed JSON (trailing commas, bare keys).

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use crate::analysis::{Analyzer, Verdict, MAX_SCORE};
use crate::error::AnalysisError;
use crate::parse::structured;
use crate::task::Task;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AnalysisRequest<'a> {
    id: &'a str,
    file_name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    source: Option<&'a str>,
    timestamp: &'a str,
    content: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    payload: Option<&'a Value>,
}

impl<'a> From<&'a Task> for AnalysisRequest<'a> {
    fn from(task: &'a Task) -> Self {
        Self {
            id: task.id(),
            file_name: &task.file_name,
            source: task.source.as_deref(),
            timestamp: &task.timestamp,
            content: task.content(),
            payload: task.payload.as_ref(),
        }
    }
}

pub struct HttpAnalyzer {
    client: reqwest::Client,
    endpoint: String,
    timeout: Duration,
}

impl HttpAnalyzer {
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self, AnalysisError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AnalysisError::Request(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
            timeout,
        })
    }
}

#[async_trait]
impl Analyzer for HttpAnalyzer {
    async fn analyze(&self, task: &Task) -> Result<Verdict, AnalysisError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&AnalysisRequest::from(task))
            .send()
            .await
            .map_err(|e| self.request_error(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AnalysisError::Request(format!(
                "analysis service returned HTTP {}",
                status
            )));
        }

        let body = response.text().await.map_err(|e| self.request_error(e))?;
        parse_verdict(&body)
    }

    fn name(&self) -> &str {
        "http"
    }
}

impl HttpAnalyzer {
    fn request_error(&self, e: reqwest::Error) -> AnalysisError {
        if e.is_timeout() {
            AnalysisError::Timeout {
                secs: self.timeout.as_secs(),
            }
        } else {
            AnalysisError::Request(e.to_string())
        }
    }
}

/// Reads a verdict from a response body.
///
/// Accepts a bare verdict object or one wrapped as `{"verdict": {...}}`, and
/// fractional or out-of-range scores (rounded and clamped to 0-100).
pub fn parse_verdict(body: &str) -> Result<Verdict, AnalysisError> {
    let value = structured::normalize(body)
        .into_iter()
        .next()
        .ok_or_else(|| AnalysisError::ResponseParse("response is not JSON".to_string()))?;

    let value = match value {
        Value::Object(mut map) if map.contains_key("verdict") => map
            .remove("verdict")
            .unwrap_or(Value::Null),
        other => other,
    };

    let mut map = match value {
        Value::Object(map) => map,
        other => {
            return Err(AnalysisError::ResponseParse(format!(
                "expected a verdict object, got {}",
                other
            )))
        }
    };

    let score = map
        .remove("score")
        .and_then(|s| match s {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        })
        .map(|s| s.round().clamp(0.0, f64::from(MAX_SCORE)) as u8)
        .unwrap_or(0);

    let mut verdict: Verdict = serde_json::from_value(Value::Object(map))
        .map_err(|e| AnalysisError::ResponseParse(e.to_string()))?;
    verdict.score = score;
    Ok(verdict)
}
