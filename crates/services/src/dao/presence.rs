use std::collections::BTreeMap;

use async_trait::async_trait;
use bson::{Bson, DateTime, doc};
use mongodb::Database;

use capmatch_db::models::{ActiveParticipant, RoomEvent, Transcription};

use super::base::{BaseDao, StoreResult};
use crate::summarizer::SummaryResult;

/// Persistence seam for participant presence and transcription records.
///
/// The processor only talks to this trait; production uses [`PresenceDao`]
/// and tests substitute an in-memory fake.
#[async_trait]
pub trait PresenceStore: Send + Sync {
    async fn insert_active_participant(
        &self,
        sid: &str,
        identity: &str,
        room: &str,
    ) -> StoreResult<()>;

    /// Removes every presence row for the sid, across rooms. Returns the
    /// number of rows removed; 0 is a no-op, not an error.
    async fn delete_active_participant(&self, sid: &str) -> StoreResult<u64>;

    async fn set_transcription_completed(
        &self,
        sid: &str,
        room: &str,
        completed: bool,
    ) -> StoreResult<u64>;

    async fn fetch_transcript(&self, sid: &str, room: &str) -> StoreResult<Option<String>>;

    /// Writes the summary fields for (sid, room). `raw` is the provider's
    /// verbatim response text (or `None` when no response was obtained);
    /// `parsed` carries the structured fields when parsing succeeded.
    /// Explicit nulls are written on failure so downstream consumers can
    /// tell "processed, no content" from "never processed".
    async fn update_transcription_summary(
        &self,
        sid: &str,
        room: &str,
        raw: Option<&str>,
        parsed: Option<&SummaryResult>,
    ) -> StoreResult<u64>;

    /// Appends the callback to the audit log.
    async fn record_room_event(
        &self,
        event: &str,
        room: Option<&str>,
        sid: Option<&str>,
        payload: &BTreeMap<String, String>,
    ) -> StoreResult<()>;
}

pub struct PresenceDao {
    participants: BaseDao<ActiveParticipant>,
    transcriptions: BaseDao<Transcription>,
    events: BaseDao<RoomEvent>,
}

impl PresenceDao {
    pub fn new(db: &Database) -> Self {
        Self {
            participants: BaseDao::new(db, ActiveParticipant::COLLECTION),
            transcriptions: BaseDao::new(db, Transcription::COLLECTION),
            events: BaseDao::new(db, RoomEvent::COLLECTION),
        }
    }
}

#[async_trait]
impl PresenceStore for PresenceDao {
    async fn insert_active_participant(
        &self,
        sid: &str,
        identity: &str,
        room: &str,
    ) -> StoreResult<()> {
        let participant = ActiveParticipant {
            id: None,
            participant_sid: sid.to_string(),
            participant_identity: identity.to_string(),
            room_name: room.to_string(),
            connected_at: DateTime::now(),
        };
        self.participants.insert_one(&participant).await
    }

    async fn delete_active_participant(&self, sid: &str) -> StoreResult<u64> {
        self.participants
            .hard_delete(doc! { "participant_sid": sid })
            .await
    }

    async fn set_transcription_completed(
        &self,
        sid: &str,
        room: &str,
        completed: bool,
    ) -> StoreResult<u64> {
        self.transcriptions
            .update_many(
                doc! { "participant_sid": sid, "room_name": room },
                doc! { "$set": { "completed": completed, "updated_at": DateTime::now() } },
            )
            .await
    }

    async fn fetch_transcript(&self, sid: &str, room: &str) -> StoreResult<Option<String>> {
        let record = self
            .transcriptions
            .find_one(doc! { "participant_sid": sid, "room_name": room })
            .await?;
        Ok(record.and_then(|r| r.transcript))
    }

    async fn update_transcription_summary(
        &self,
        sid: &str,
        room: &str,
        raw: Option<&str>,
        parsed: Option<&SummaryResult>,
    ) -> StoreResult<u64> {
        let mut set = doc! { "summary": raw, "updated_at": DateTime::now() };
        match parsed {
            Some(parsed) => {
                set.insert("title", parsed.title.clone());
                set.insert("executive_summary", parsed.executive_summary.clone());
                set.insert("key_points", parsed.key_points.clone());
                set.insert("important_numbers", parsed.important_numbers.clone());
                set.insert("action_items", parsed.action_items.clone());
                set.insert("questions_raised", parsed.questions_raised.clone());
                set.insert("open_questions", parsed.open_questions.clone());
                set.insert("transcript_language", parsed.transcript_language.clone());
            }
            None => {
                set.insert("title", Bson::Null);
                set.insert("executive_summary", Bson::Null);
            }
        }

        self.transcriptions
            .update_many(
                doc! { "participant_sid": sid, "room_name": room },
                doc! { "$set": set },
            )
            .await
    }

    async fn record_room_event(
        &self,
        event: &str,
        room: Option<&str>,
        sid: Option<&str>,
        payload: &BTreeMap<String, String>,
    ) -> StoreResult<()> {
        let record = RoomEvent {
            id: None,
            event: event.to_string(),
            room_name: room.map(str::to_string),
            participant_sid: sid.map(str::to_string),
            payload: bson::to_document(payload)?,
            received_at: DateTime::now(),
        };
        self.events.insert_one(&record).await
    }
}
