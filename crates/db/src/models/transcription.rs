use bson::{DateTime, oid::ObjectId};
use serde::{Deserialize, Serialize};

/// A per-participant transcript for one room session.
///
/// Records are created by the external transcription-capture process; this
/// service only updates them. `completed` is toggled on connect/disconnect
/// and the summary fields are written after the participant leaves.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transcription {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub participant_sid: String,
    pub room_name: String,
    pub transcript: Option<String>,
    #[serde(default)]
    pub completed: bool,
    /// Raw provider response text, persisted verbatim even when it failed
    /// to parse.
    pub summary: Option<String>,
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
    pub updated_at: Option<DateTime>,
}

impl Transcription {
    pub const COLLECTION: &'static str = "transcriptions";
}
