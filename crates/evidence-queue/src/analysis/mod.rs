//! The analysis collaborator seam.
//!
//! The scheduler only knows the [`Analyzer`] trait. Two implementations ship
//! with the crate: an offline keyword scorer and an HTTP client for a remote
//! analysis service.

pub mod http;
pub mod keyword;

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::{AnalysisConfig, AnalysisProvider};
use crate::error::AnalysisError;
use crate::task::Task;

pub use http::HttpAnalyzer;
pub use keyword::KeywordAnalyzer;

/// Highest score an analyzer may report.
pub const MAX_SCORE: u8 = 100;

/// Named entities extracted from a document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entities {
    #[serde(default)]
    pub people: Vec<String>,
    #[serde(default)]
    pub locations: Vec<String>,
    #[serde(default)]
    pub organizations: Vec<String>,
}

impl Entities {
    pub fn is_empty(&self) -> bool {
        self.people.is_empty() && self.locations.is_empty() && self.organizations.is_empty()
    }
}

/// Structured verdict returned by an analyzer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Verdict {
    #[serde(default)]
    pub relevant: bool,
    #[serde(default)]
    pub privileged: bool,
    #[serde(default)]
    pub opinion: String,
    #[serde(default, alias = "key_quote")]
    pub key_quote: String,
    /// 0-100.
    #[serde(default)]
    pub score: u8,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, alias = "relevance_tier", skip_serializing_if = "Option::is_none")]
    pub relevance_tier: Option<String>,
    #[serde(default, alias = "breach_category", skip_serializing_if = "Option::is_none")]
    pub breach_category: Option<String>,
    #[serde(default, skip_serializing_if = "Entities::is_empty")]
    pub entities: Entities,
}

impl Verdict {
    /// Caps the score at [`MAX_SCORE`].
    pub fn clamped(mut self) -> Self {
        self.score = self.score.min(MAX_SCORE);
        self
    }
}

/// Coarse tier derived from a score.
pub fn relevance_tier(score: u8) -> &'static str {
    match score {
        80.. => "high",
        50..=79 => "medium",
        _ => "low",
    }
}

/// Inspects a task and returns a verdict, or fails with a readable error.
///
/// Implementations should settle in bounded time; the scheduler additionally
/// wraps each call in its own timeout.
#[async_trait]
pub trait Analyzer: Send + Sync {
    async fn analyze(&self, task: &Task) -> Result<Verdict, AnalysisError>;

    /// Short name used in logs.
    fn name(&self) -> &str;
}

/// Builds the analyzer selected in the configuration.
pub fn build_analyzer(config: &AnalysisConfig) -> Result<Arc<dyn Analyzer>, AnalysisError> {
    match config.provider {
        AnalysisProvider::Keyword => Ok(Arc::new(KeywordAnalyzer::new(&config.targets))),
        AnalysisProvider::Http => {
            let endpoint = config.endpoint.as_deref().ok_or_else(|| {
                AnalysisError::Request("no endpoint configured for http analyzer".to_string())
            })?;
            let analyzer = HttpAnalyzer::new(
                endpoint,
                std::time::Duration::from_secs(config.request_timeout_secs),
            )?;
            Ok(Arc::new(analyzer))
        }
    }
}
