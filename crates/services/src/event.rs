use std::collections::BTreeMap;
use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::dao::presence::PresenceStore;
use crate::summarizer::{SummarizeError, Summarizer};

pub const PARTICIPANT_CONNECTED: &str = "participant-connected";
pub const PARTICIPANT_DISCONNECTED: &str = "participant-disconnected";

/// A decoded room status callback. Twilio posts these as form fields:
/// `StatusCallbackEvent`, `RoomName`, `ParticipantSid`, `ParticipantIdentity`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackEvent {
    ParticipantConnected {
        sid: String,
        identity: String,
        room: String,
    },
    ParticipantDisconnected {
        sid: String,
        room: String,
    },
    /// Any other room event (room-created, room-ended, track events, ...).
    /// Recorded in the audit log, no lifecycle action.
    Other(String),
}

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("callback is missing required field `{0}`")]
    MissingField(&'static str),
}

impl CallbackEvent {
    pub fn from_form(form: &BTreeMap<String, String>) -> Result<Self, DecodeError> {
        let field = |name: &'static str| -> Result<String, DecodeError> {
            form.get(name)
                .filter(|v| !v.is_empty())
                .cloned()
                .ok_or(DecodeError::MissingField(name))
        };

        let event = form
            .get("StatusCallbackEvent")
            .cloned()
            .unwrap_or_default();

        match event.as_str() {
            PARTICIPANT_CONNECTED => Ok(Self::ParticipantConnected {
                sid: field("ParticipantSid")?,
                identity: field("ParticipantIdentity")?,
                room: field("RoomName")?,
            }),
            PARTICIPANT_DISCONNECTED => Ok(Self::ParticipantDisconnected {
                sid: field("ParticipantSid")?,
                room: field("RoomName")?,
            }),
            _ => Ok(Self::Other(event)),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::ParticipantConnected { .. } => PARTICIPANT_CONNECTED,
            Self::ParticipantDisconnected { .. } => PARTICIPANT_DISCONNECTED,
            Self::Other(name) => name,
        }
    }
}

/// Drives the presence state transitions and the summarization pipeline
/// for each authenticated callback.
///
/// Every step is best-effort: a failed store or provider call is logged
/// and the remaining steps still run. The steps do not form a transaction;
/// the service keeps making forward progress under a partial store outage.
pub struct SessionEventProcessor {
    store: Arc<dyn PresenceStore>,
    summarizer: Arc<dyn Summarizer>,
}

impl SessionEventProcessor {
    pub fn new(store: Arc<dyn PresenceStore>, summarizer: Arc<dyn Summarizer>) -> Self {
        Self { store, summarizer }
    }

    /// Processes one callback. Never returns an error: internal failures
    /// become log lines at this boundary and the provider is acknowledged
    /// either way, so it does not retry.
    pub async fn process(&self, form: &BTreeMap<String, String>) {
        let event = match CallbackEvent::from_form(form) {
            Ok(event) => event,
            Err(err) => {
                warn!(error = %err, "Ignoring undecodable status callback");
                return;
            }
        };

        self.record_event(event.name(), form).await;

        match event {
            CallbackEvent::ParticipantConnected {
                sid,
                identity,
                room,
            } => self.handle_connected(&sid, &identity, &room).await,
            CallbackEvent::ParticipantDisconnected { sid, room } => {
                self.handle_disconnected(&sid, &room).await
            }
            CallbackEvent::Other(name) => {
                debug!(event = %name, "No lifecycle action for room event");
            }
        }
    }

    async fn record_event(&self, name: &str, form: &BTreeMap<String, String>) {
        let room = form.get("RoomName").map(String::as_str);
        let sid = form.get("ParticipantSid").map(String::as_str);
        if let Err(err) = self.store.record_room_event(name, room, sid, form).await {
            warn!(error = %err, event = %name, "Failed to record room event");
        }
    }

    async fn handle_connected(&self, sid: &str, identity: &str, room: &str) {
        info!(%sid, %identity, %room, "Participant connected");

        // The completed-flag reset still runs when the insert fails.
        if let Err(err) = self
            .store
            .insert_active_participant(sid, identity, room)
            .await
        {
            warn!(error = %err, %sid, %room, "Failed to insert active participant");
        }

        if let Err(err) = self
            .store
            .set_transcription_completed(sid, room, false)
            .await
        {
            warn!(error = %err, %sid, %room, "Failed to reset transcription completed flag");
        }
    }

    async fn handle_disconnected(&self, sid: &str, room: &str) {
        info!(%sid, %room, "Participant disconnected");

        match self.store.delete_active_participant(sid).await {
            Ok(removed) => debug!(%sid, removed, "Removed active participant rows"),
            Err(err) => warn!(error = %err, %sid, "Failed to delete active participant"),
        }

        if let Err(err) = self
            .store
            .set_transcription_completed(sid, room, true)
            .await
        {
            warn!(error = %err, %sid, %room, "Failed to mark transcription completed");
        }

        let transcript = match self.store.fetch_transcript(sid, room).await {
            Ok(transcript) => transcript.unwrap_or_default(),
            Err(err) => {
                warn!(error = %err, %sid, %room, "Failed to fetch transcript");
                String::new()
            }
        };

        let (raw, parsed) = if transcript.is_empty() {
            info!(%sid, %room, "No transcript captured, skipping summarization");
            (None, None)
        } else {
            match self.summarizer.summarize(&transcript).await {
                Ok(summary) => (Some(summary.raw), Some(summary.parsed)),
                Err(SummarizeError::MalformedResponse { raw, error }) => {
                    warn!(%error, %sid, %room, "Summary response did not parse, persisting raw text");
                    (Some(raw), None)
                }
                Err(err) => {
                    warn!(error = %err, %sid, %room, "Summarization failed");
                    (None, None)
                }
            }
        };

        // Written regardless of the summarization outcome.
        if let Err(err) = self
            .store
            .update_transcription_summary(sid, room, raw.as_deref(), parsed.as_ref())
            .await
        {
            warn!(error = %err, %sid, %room, "Failed to persist transcription summary");
        }
    }
}
