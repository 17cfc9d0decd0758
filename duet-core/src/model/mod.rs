mod connection;
mod session;
mod signaling;

pub use connection::{ConnectionId, IdParseError, ParticipantId};
pub use session::SessionId;
pub use signaling::{CandidateRole, ClientMessage, IceServerConfig, RtcConfiguration, ServerMessage};
