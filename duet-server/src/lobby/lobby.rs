use crate::collaborators::{Collaborators, PersistEvent, PersistenceWorker, identity_key};
use crate::error::LobbyError;
use crate::lobby::effect::{Delivery, Effect};
use crate::lobby::lifecycle::LifecycleController;
use crate::lobby::lobby_command::LobbyCommand;
use crate::matchmaking::ParticipantProfile;
use crate::signaling::SignalingOutput;
use duet_core::{ConnectionId, ServerMessage};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

pub const NOT_VERIFIED: &str = "Please verify your college email first";
pub const VERIFICATION_UNAVAILABLE: &str = "Verification is unavailable, please try again later";
pub const BANNED: &str = "You have been banned from this service";

/// Result of screening a join against the external collaborators.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Screening {
    Admitted {
        identity_key: String,
        display_name: String,
    },
    Unverified,
    Banned,
    /// A collaborator failed; the join is refused.
    Unavailable,
}

#[derive(Debug)]
struct Admission {
    connection_id: ConnectionId,
    email: String,
    interests: Vec<String>,
    screening: Screening,
}

/// The single owner of lobby state.
///
/// Commands are handled one at a time. Identity checks for joins run in their
/// own tasks and report back on an internal channel, so a slow verifier never
/// stalls matching or relaying. [`Lobby::run`] returns once every command
/// sender is dropped, even with checks still in flight.
pub struct Lobby {
    controller: LifecycleController,
    command_rx: mpsc::Receiver<LobbyCommand>,
    admission_rx: mpsc::Receiver<Admission>,
    admission_tx: mpsc::Sender<Admission>,
    /// Joins waiting for their screening result.
    pending: HashSet<ConnectionId>,
    collaborators: Collaborators,
    signaling: Arc<dyn SignalingOutput>,
    persistence: Option<PersistenceWorker>,
    persist_tx: mpsc::UnboundedSender<PersistEvent>,
}

impl Lobby {
    pub fn new(
        controller: LifecycleController,
        command_rx: mpsc::Receiver<LobbyCommand>,
        collaborators: Collaborators,
        signaling: Arc<dyn SignalingOutput>,
    ) -> Self {
        let (admission_tx, admission_rx) = mpsc::channel(256);
        let (persistence, persist_tx) = PersistenceWorker::new(collaborators.store.clone());

        Self {
            controller,
            command_rx,
            admission_rx,
            admission_tx,
            pending: HashSet::new(),
            collaborators,
            signaling,
            persistence: Some(persistence),
            persist_tx,
        }
    }

    pub async fn run(mut self) {
        info!("Lobby event loop started");

        if let Some(persistence) = self.persistence.take() {
            tokio::spawn(persistence.run());
        }

        loop {
            tokio::select! {
                cmd = self.command_rx.recv() => {
                    match cmd {
                        Some(c) => self.handle_command(c).await,
                        None => {
                            info!("Command channel closed. Shutting down lobby.");
                            break;
                        }
                    }
                }

                // The lobby keeps a sender, so this channel never closes.
                Some(admission) = self.admission_rx.recv() => {
                    self.handle_admission(admission).await;
                }
            }
        }

        info!("Lobby event loop finished");
    }

    async fn handle_command(&mut self, cmd: LobbyCommand) {
        match cmd {
            LobbyCommand::Join {
                connection_id,
                email,
                name,
                interests,
            } => {
                self.handle_join(connection_id, email, name, interests)
                    .await;
            }

            LobbyCommand::Signal {
                connection_id,
                session_id,
                signal,
            } => {
                let effects = self.controller.relay(connection_id, session_id, signal);
                self.apply(effects).await;
            }

            LobbyCommand::Leave { connection_id } => {
                info!(%connection_id, "Participant left room");
                let effects = self.controller.leave(connection_id);
                self.apply(effects).await;
            }

            LobbyCommand::Report {
                connection_id,
                session_id,
            } => {
                let effects = self.controller.report(connection_id, session_id);
                self.apply(effects).await;
            }

            LobbyCommand::Disconnect { connection_id } => {
                info!(%connection_id, "Participant disconnected");
                self.pending.remove(&connection_id);
                let effects = self.controller.disconnect(connection_id);
                self.apply(effects).await;
            }
        }
    }

    async fn handle_join(
        &mut self,
        connection_id: ConnectionId,
        email: String,
        name: String,
        interests: Vec<String>,
    ) {
        let checked = if self.pending.contains(&connection_id) {
            Err(LobbyError::InvalidInput("You have already joined".into()))
        } else {
            self.controller.check_join(&connection_id, &email, &name)
        };
        if let Err(e) = checked {
            self.reject(connection_id, e).await;
            return;
        }

        debug!(%connection_id, "Screening join");
        self.pending.insert(connection_id);

        let collaborators = self.collaborators.clone();
        let admission_tx = self.admission_tx.clone();
        tokio::spawn(async move {
            let screening = screen(&collaborators, &email, &name).await;
            let admission = Admission {
                connection_id,
                email,
                interests,
                screening,
            };
            if admission_tx.send(admission).await.is_err() {
                debug!(%connection_id, "Lobby gone before screening finished");
            }
        });
    }

    async fn handle_admission(&mut self, admission: Admission) {
        let Admission {
            connection_id,
            email,
            interests,
            screening,
        } = admission;

        if !self.pending.remove(&connection_id) {
            let e = LobbyError::StaleReference(format!(
                "{connection_id} disconnected during verification"
            ));
            warn!(error = %e, "Discarding admission");
            return;
        }

        match screening {
            Screening::Admitted {
                identity_key,
                display_name,
            } => {
                let profile = ParticipantProfile {
                    identity_key,
                    display_name,
                    interests,
                };
                match self.controller.admit(connection_id, profile) {
                    Ok(effects) => {
                        info!(%connection_id, "Participant joined lobby");
                        self.apply(effects).await;
                    }
                    Err(e) => self.reject(connection_id, e).await,
                }
            }

            Screening::Unverified => {
                info!(%connection_id, "Join refused, e-mail not verified");
                self.reject(connection_id, LobbyError::Unauthorized(NOT_VERIFIED.into()))
                    .await;
                self.deliver(connection_id, ServerMessage::VerificationRequired { email })
                    .await;
            }

            Screening::Unavailable => {
                self.reject(
                    connection_id,
                    LobbyError::Unauthorized(VERIFICATION_UNAVAILABLE.into()),
                )
                .await;
            }

            Screening::Banned => {
                info!(%connection_id, "Join refused, participant is banned");
                self.reject(connection_id, LobbyError::Unauthorized(BANNED.into()))
                    .await;
                self.signaling.close(connection_id).await;
            }
        }
    }

    async fn reject(&mut self, connection_id: ConnectionId, e: LobbyError) {
        match e.client_message() {
            Some(message) => {
                debug!(%connection_id, error = %e, "Request rejected");
                let message = ServerMessage::error(message);
                self.deliver(connection_id, message).await;
            }
            None => match e {
                LobbyError::InvariantViolation(_) => {
                    error!(%connection_id, error = %e, "Lobby invariant violated")
                }
                _ => warn!(%connection_id, error = %e, "Request dropped"),
            },
        }
    }

    async fn apply(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::Deliver(Delivery { to, message }) => self.deliver(to, message).await,
                Effect::Persist(event) => {
                    if self.persist_tx.send(event).is_err() {
                        warn!("Persistence worker is gone, history event dropped");
                    }
                }
            }
        }
    }

    async fn deliver(&mut self, to: ConnectionId, message: ServerMessage) {
        if !self.signaling.send(to, message).await {
            warn!(connection_id = %to, "Delivery failed, marking participant offline");
            self.controller.mark_offline(&to);
        }
    }
}

/// Verifies the identity, then checks the ban list. Any collaborator error
/// refuses the join.
async fn screen(collaborators: &Collaborators, email: &str, name: &str) -> Screening {
    let verification = match collaborators.verifier.verify(email, name).await {
        Ok(v) if v.verified => v,
        Ok(_) => return Screening::Unverified,
        Err(e) => {
            warn!(error = %e, "Identity verification failed");
            return Screening::Unavailable;
        }
    };

    let identity_key = identity_key(email);
    match collaborators.ban_list.is_banned(&identity_key).await {
        Ok(false) => Screening::Admitted {
            identity_key,
            display_name: verification.display_name,
        },
        Ok(true) => Screening::Banned,
        Err(e) => {
            warn!(error = %e, "Ban check failed");
            Screening::Unavailable
        }
    }
}
