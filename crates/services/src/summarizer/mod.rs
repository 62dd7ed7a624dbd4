use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

pub mod gemini;

pub use gemini::GeminiSummarizer;

#[derive(Debug, Error)]
pub enum SummarizeError {
    #[error("summarization provider API key is not configured")]
    NotConfigured,
    #[error("transcript text is empty")]
    EmptyInput,
    #[error("provider returned no text")]
    EmptyResponse,
    #[error("request to summarization provider failed: {0}")]
    Request(String),
    /// The provider answered but the text was not the requested JSON shape.
    /// The raw text rides along so the caller can persist it verbatim.
    #[error("provider returned malformed JSON: {error}")]
    MalformedResponse { raw: String, error: String },
}

/// The structured summary shape requested from the provider. Every field
/// is optional or defaulted: a response that is valid JSON but misses keys
/// still parses, while a top-level shape mismatch is `MalformedResponse`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SummaryResult {
    pub title: Option<String>,
    pub executive_summary: Option<String>,
    #[serde(default)]
    pub key_points: Vec<String>,
    #[serde(default)]
    pub important_numbers: Vec<String>,
    #[serde(default)]
    pub action_items: Vec<String>,
    #[serde(default)]
    pub questions_raised: Vec<String>,
    #[serde(default)]
    pub open_questions: Vec<String>,
    pub transcript_language: Option<String>,
}

/// A successful summarization: the provider's verbatim response text plus
/// its parsed form.
#[derive(Debug, Clone)]
pub struct MeetingSummary {
    pub raw: String,
    pub parsed: SummaryResult,
}

#[async_trait]
pub trait Summarizer: Send + Sync {
    /// Single attempt, no retries. Empty input short-circuits without a
    /// network call.
    async fn summarize(&self, transcript: &str) -> Result<MeetingSummary, SummarizeError>;
}
