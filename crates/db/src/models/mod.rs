mod active_participant;
mod room_event;
mod transcription;

pub use active_participant::ActiveParticipant;
pub use room_event::RoomEvent;
pub use transcription::Transcription;
