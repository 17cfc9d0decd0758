mod effect;
mod lifecycle;
#[allow(clippy::module_inception)]
mod lobby;
mod lobby_command;
mod relay;

pub use effect::*;
pub use lifecycle::*;
pub use lobby::*;
pub use lobby_command::*;
pub use relay::*;
