use bson::{DateTime, oid::ObjectId};
use serde::{Deserialize, Serialize};

/// A participant currently present in a room. Inserted on
/// `participant-connected`, removed on `participant-disconnected`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActiveParticipant {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub participant_sid: String,
    pub participant_identity: String,
    pub room_name: String,
    pub connected_at: DateTime,
}

impl ActiveParticipant {
    pub const COLLECTION: &'static str = "active_participants";
}
