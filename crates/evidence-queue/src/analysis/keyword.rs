//! Offline keyword scorer.
//!
//! Scores a task by the share of configured target terms found in its
//! content. Used when no remote analysis service is configured.

use async_trait::async_trait;

use crate::analysis::{relevance_tier, Analyzer, Verdict};
use crate::error::AnalysisError;
use crate::task::{truncate_chars, Task};

/// Score reported when no targets are configured.
const NEUTRAL_SCORE: u8 = 50;

const MAX_QUOTE_CHARS: usize = 300;

/// Phrases that mark a document as potentially privileged.
const PRIVILEGE_MARKERS: &[&str] = &[
    "privileged",
    "solicitor-client",
    "solicitor client",
    "attorney-client",
    "legal advice",
    "without prejudice",
];

pub struct KeywordAnalyzer {
    targets: Vec<String>,
}

impl KeywordAnalyzer {
    pub fn new<S: AsRef<str>>(targets: &[S]) -> Self {
        let targets = targets
            .iter()
            .map(|t| t.as_ref().trim().to_lowercase())
            .filter(|t| !t.is_empty())
            .collect();
        Self { targets }
    }

    /// Scores `text` without going through the async trait.
    pub fn score_text(&self, text: &str) -> Verdict {
        let lowered = text.to_lowercase();
        let privileged = PRIVILEGE_MARKERS.iter().any(|m| lowered.contains(m));

        if self.targets.is_empty() {
            return Verdict {
                relevant: false,
                privileged,
                opinion: "No targets configured; neutral score.".to_string(),
                score: NEUTRAL_SCORE,
                relevance_tier: Some(relevance_tier(NEUTRAL_SCORE).to_string()),
                ..Verdict::default()
            };
        }

        let hits: Vec<String> = self
            .targets
            .iter()
            .filter(|t| lowered.contains(t.as_str()))
            .cloned()
            .collect();

        let coverage = hits.len() as f64 / self.targets.len() as f64;
        let score = (30.0 + coverage * 70.0).clamp(10.0, 100.0) as u8;

        Verdict {
            relevant: !hits.is_empty(),
            privileged,
            opinion: format!("Matched {}/{} target terms.", hits.len(), self.targets.len()),
            key_quote: key_quote(text, &hits),
            score,
            relevance_tier: Some(relevance_tier(score).to_string()),
            tags: hits,
            ..Verdict::default()
        }
    }
}

/// First sentence mentioning any hit.
fn key_quote(text: &str, hits: &[String]) -> String {
    if hits.is_empty() {
        return String::new();
    }
    text.split(['.', '!', '?', '\n'])
        .map(str::trim)
        .find(|sentence| {
            let lowered = sentence.to_lowercase();
            hits.iter().any(|h| lowered.contains(h.as_str()))
        })
        .map(|s| truncate_chars(s, MAX_QUOTE_CHARS))
        .unwrap_or_default()
}

#[async_trait]
impl Analyzer for KeywordAnalyzer {
    async fn analyze(&self, task: &Task) -> Result<Verdict, AnalysisError> {
        if task.content().trim().is_empty() {
            return Err(AnalysisError::Rejected(format!(
                "task {} has no content to analyze",
                task.id()
            )));
        }
        Ok(self.score_text(task.content()))
    }

    fn name(&self) -> &str {
        "keyword"
    }
}
