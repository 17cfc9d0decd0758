use crate::model::connection::IdParseError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Identifier of a two-party signaling session ("room" on the wire).
///
/// Travels as a decimal string; numeric JSON is accepted on input too.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, Hash, Eq, PartialEq, Ord, PartialOrd)]
#[serde(into = "String", try_from = "RawSessionId")]
pub struct SessionId(pub u64);

#[derive(Deserialize)]
#[serde(untagged)]
enum RawSessionId {
    Number(u64),
    Text(String),
}

impl TryFrom<RawSessionId> for SessionId {
    type Error = IdParseError;

    fn try_from(raw: RawSessionId) -> Result<Self, Self::Error> {
        match raw {
            RawSessionId::Number(n) => Ok(Self(n)),
            RawSessionId::Text(s) => s.parse(),
        }
    }
}

impl From<SessionId> for String {
    fn from(id: SessionId) -> Self {
        id.0.to_string()
    }
}

impl FromStr for SessionId {
    type Err = IdParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u64>()
            .map(Self)
            .map_err(|_| IdParseError::Session(s.to_owned()))
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
