use bson::{DateTime, Document, oid::ObjectId};
use serde::{Deserialize, Serialize};

/// Audit row for every authenticated status callback, stored with the full
/// form payload before any state transition runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomEvent {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub event: String,
    pub room_name: Option<String>,
    pub participant_sid: Option<String>,
    pub payload: Document,
    pub received_at: DateTime,
}

impl RoomEvent {
    pub const COLLECTION: &'static str = "room_events";
}
