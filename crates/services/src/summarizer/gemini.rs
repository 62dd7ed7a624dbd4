use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use capmatch_config::GeminiSettings;

use super::{MeetingSummary, SummarizeError, Summarizer, SummaryResult};

/// Summarization backend over the Gemini `generateContent` REST API.
/// The response MIME type is forced to JSON so the model answers with the
/// bare object instead of prose around a code fence.
pub struct GeminiSummarizer {
    settings: GeminiSettings,
    client: reqwest::Client,
}

impl GeminiSummarizer {
    pub fn new(settings: GeminiSettings) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .expect("failed to build HTTP client");
        Self { settings, client }
    }

    fn request_url(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.settings.endpoint.trim_end_matches('/'),
            self.settings.model,
        )
    }
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ContentPart>,
}

#[derive(Debug, Deserialize)]
struct ContentPart {
    text: Option<String>,
}

fn build_prompt(transcript: &str) -> String {
    format!(
        r#"Please create a detailed summary of this meeting transcript. The transcript is in a mix of Hindi and English (Hinglish). Please:

Title: Generate a concise, descriptive title for this meeting (3-8 words)

Executive Summary: Provide a 2-3 sentence overview of the main discussion

Key Points Discussed: Extract and organize the main topics covered

Important Numbers/Metrics: Highlight any significant figures, dates, or statistics mentioned

Action Items: If any next steps or follow-ups are mentioned, list them

Questions Raised: List any questions that were asked during the meeting by any participants.

Open Questions: If there are any unresolved questions or topics that need further discussion, list them.

Please translate any Hindi/Hinglish portions to English and provide the summary in clear, professional English.

<transcript>
{transcript}
</transcript>

Please structure your response as a JSON object with the following format:
{{
    "title": "...",
    "executive_summary": "...",
    "key_points": ["point 1", "point 2", "..."],
    "important_numbers": ["metric 1", "metric 2", "..."],
    "action_items": ["action 1", "action 2", "..."],
    "questions_raised": ["question 1", "question 2", "..."],
    "open_questions": ["open question 1", "open question 2", "..."],
    "transcript_language": "Hinglish/English/Hindi"
}}"#
    )
}

fn response_text(response: GenerateContentResponse) -> Option<String> {
    let parts = response.candidates.into_iter().next()?.content?.parts;
    let text: String = parts.into_iter().filter_map(|p| p.text).collect();
    if text.is_empty() { None } else { Some(text) }
}

fn parse_summary(raw: String) -> Result<MeetingSummary, SummarizeError> {
    match serde_json::from_str::<SummaryResult>(&raw) {
        Ok(parsed) => Ok(MeetingSummary { raw, parsed }),
        Err(e) => Err(SummarizeError::MalformedResponse {
            error: e.to_string(),
            raw,
        }),
    }
}

#[async_trait]
impl Summarizer for GeminiSummarizer {
    async fn summarize(&self, transcript: &str) -> Result<MeetingSummary, SummarizeError> {
        let Some(api_key) = self.settings.api_key.as_deref() else {
            return Err(SummarizeError::NotConfigured);
        };
        if transcript.trim().is_empty() {
            return Err(SummarizeError::EmptyInput);
        }

        debug!(chars = transcript.len(), "Requesting meeting summary");

        let body = serde_json::json!({
            "contents": [{ "parts": [{ "text": build_prompt(transcript) }] }],
            "generationConfig": { "responseMimeType": "application/json" },
        });

        let response = self
            .client
            .post(self.request_url())
            .header("x-goog-api-key", api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| SummarizeError::Request(e.to_string()))?
            .error_for_status()
            .map_err(|e| SummarizeError::Request(e.to_string()))?
            .json::<GenerateContentResponse>()
            .await
            .map_err(|e| SummarizeError::Request(e.to_string()))?;

        let raw = response_text(response).ok_or(SummarizeError::EmptyResponse)?;
        parse_summary(raw)
    }
}
