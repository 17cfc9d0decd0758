pub mod model;

pub use model::{
    CandidateRole, ClientMessage, ConnectionId, IceServerConfig, IdParseError, ParticipantId,
    RtcConfiguration, ServerMessage, SessionId,
};
