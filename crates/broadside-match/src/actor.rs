//! Match actor: an isolated Tokio task that owns one session.
//!
//! Each session runs in its own task and talks to the rest of the server
//! exclusively through channels: commands in over an mpsc channel,
//! envelopes out over one unbounded channel per member. No shared
//! mutable state, so the command loop is the serialization point for
//! everything that can touch the boards.

use std::collections::HashMap;
use std::time::Instant;

use broadside_protocol::{
    ClientMessage, Coord, Placement, PlayerId, ServerMessage, SessionId,
    Phase,
};
use tokio::sync::{mpsc, oneshot};

use crate::{MatchConfig, MatchError, MatchState};

/// Channel on which a member's connection handler receives envelopes
/// from the session.
pub type PlayerSender = mpsc::UnboundedSender<ServerMessage>;

/// Commands sent to a match actor through its channel.
pub(crate) enum MatchCommand {
    /// Bind a player into the session.
    Join {
        player_id: PlayerId,
        name: String,
        sender: PlayerSender,
        reply: oneshot::Sender<Result<(), MatchError>>,
    },

    /// Rebind a reconnected member's outbound endpoint.
    Rebind {
        player_id: PlayerId,
        sender: PlayerSender,
        reply: oneshot::Sender<Result<(), MatchError>>,
    },

    /// A member explicitly left.
    Leave {
        player_id: PlayerId,
        reply: oneshot::Sender<Result<LeaveOutcome, MatchError>>,
    },

    /// A game envelope from a member.
    Message {
        sender: PlayerId,
        msg: ClientMessage,
    },

    /// A member's connection dropped (grace period starts elsewhere).
    Disconnected { player_id: PlayerId },

    /// A member abandoned the session; the peer wins.
    Forfeit { player_id: PlayerId },

    /// Request session metadata.
    GetInfo { reply: oneshot::Sender<MatchInfo> },

    /// Stop the actor.
    Shutdown,
}

/// What happened when a member left.
#[derive(Debug, Clone)]
pub struct LeaveOutcome {
    /// The session is over (it never started); the manager should
    /// destroy it and release the remaining members.
    pub disband: bool,
    /// Members still bound after the leave.
    pub remaining: Vec<PlayerId>,
}

/// A snapshot of session metadata (not the game state itself).
#[derive(Debug, Clone)]
pub struct MatchInfo {
    pub session_id: SessionId,
    pub phase: Phase,
    pub member_count: usize,
    pub members: Vec<PlayerId>,
    /// Set once the session ended; used for reaping.
    pub ended_at: Option<Instant>,
}

impl MatchInfo {
    /// A session can accept a player while it is still forming.
    pub fn is_joinable(&self) -> bool {
        self.member_count < 2 && self.phase.is_placing()
    }
}

/// Handle to a running match actor. Cheap to clone.
#[derive(Clone)]
pub struct MatchHandle {
    session_id: SessionId,
    sender: mpsc::Sender<MatchCommand>,
}

impl MatchHandle {
    pub fn session_id(&self) -> SessionId {
        self.session_id
    }

    pub async fn join(
        &self,
        player_id: PlayerId,
        name: String,
        sender: PlayerSender,
    ) -> Result<(), MatchError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(MatchCommand::Join {
                player_id,
                name,
                sender,
                reply: reply_tx,
            })
            .await
            .map_err(|_| MatchError::Unavailable(self.session_id))?;
        reply_rx
            .await
            .map_err(|_| MatchError::Unavailable(self.session_id))?
    }

    pub async fn rebind(
        &self,
        player_id: PlayerId,
        sender: PlayerSender,
    ) -> Result<(), MatchError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(MatchCommand::Rebind {
                player_id,
                sender,
                reply: reply_tx,
            })
            .await
            .map_err(|_| MatchError::Unavailable(self.session_id))?;
        reply_rx
            .await
            .map_err(|_| MatchError::Unavailable(self.session_id))?
    }

    pub async fn leave(
        &self,
        player_id: PlayerId,
    ) -> Result<LeaveOutcome, MatchError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(MatchCommand::Leave {
                player_id,
                reply: reply_tx,
            })
            .await
            .map_err(|_| MatchError::Unavailable(self.session_id))?;
        reply_rx
            .await
            .map_err(|_| MatchError::Unavailable(self.session_id))?
    }

    /// Delivers a game envelope (fire-and-forget; rejections come back
    /// as `error` envelopes on the member's own channel).
    pub async fn send_message(
        &self,
        sender: PlayerId,
        msg: ClientMessage,
    ) -> Result<(), MatchError> {
        self.sender
            .send(MatchCommand::Message { sender, msg })
            .await
            .map_err(|_| MatchError::Unavailable(self.session_id))
    }

    pub async fn disconnected(
        &self,
        player_id: PlayerId,
    ) -> Result<(), MatchError> {
        self.sender
            .send(MatchCommand::Disconnected { player_id })
            .await
            .map_err(|_| MatchError::Unavailable(self.session_id))
    }

    pub async fn forfeit(
        &self,
        player_id: PlayerId,
    ) -> Result<(), MatchError> {
        self.sender
            .send(MatchCommand::Forfeit { player_id })
            .await
            .map_err(|_| MatchError::Unavailable(self.session_id))
    }

    pub async fn get_info(&self) -> Result<MatchInfo, MatchError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(MatchCommand::GetInfo { reply: reply_tx })
            .await
            .map_err(|_| MatchError::Unavailable(self.session_id))?;
        reply_rx
            .await
            .map_err(|_| MatchError::Unavailable(self.session_id))
    }

    pub async fn shutdown(&self) -> Result<(), MatchError> {
        self.sender
            .send(MatchCommand::Shutdown)
            .await
            .map_err(|_| MatchError::Unavailable(self.session_id))
    }
}

/// The actor's internal state: the game plus the outbound endpoints.
struct MatchActor {
    state: MatchState,
    /// Per-member outbound channels, replaced on rebind.
    senders: HashMap<PlayerId, PlayerSender>,
    receiver: mpsc::Receiver<MatchCommand>,
}

impl MatchActor {
    async fn run(mut self) {
        let session_id = self.state.session_id();
        tracing::info!(%session_id, "match actor started");

        while let Some(cmd) = self.receiver.recv().await {
            match cmd {
                MatchCommand::Join {
                    player_id,
                    name,
                    sender,
                    reply,
                } => {
                    let result =
                        match self.state.add_player(player_id, name) {
                            Ok(out) => {
                                self.senders.insert(player_id, sender);
                                self.deliver(out);
                                Ok(())
                            }
                            Err(e) => Err(e),
                        };
                    let _ = reply.send(result);
                }
                MatchCommand::Rebind {
                    player_id,
                    sender,
                    reply,
                } => {
                    let result = if self.state.is_member(player_id) {
                        self.senders.insert(player_id, sender);
                        let out = self.state.rebind(player_id);
                        self.deliver(out);
                        Ok(())
                    } else {
                        Err(MatchError::NotInSession(player_id))
                    };
                    let _ = reply.send(result);
                }
                MatchCommand::Leave { player_id, reply } => {
                    let result = self.handle_leave(player_id);
                    let _ = reply.send(result);
                }
                MatchCommand::Message { sender, msg } => {
                    let out = self.handle_message(sender, msg);
                    self.deliver(out);
                }
                MatchCommand::Disconnected { player_id } => {
                    let out = self.state.disconnect(player_id);
                    self.deliver(out);
                }
                MatchCommand::Forfeit { player_id } => {
                    let out = self.state.forfeit(player_id);
                    self.deliver(out);
                }
                MatchCommand::GetInfo { reply } => {
                    let _ = reply.send(self.info());
                }
                MatchCommand::Shutdown => {
                    tracing::info!(%session_id, "match shutting down");
                    break;
                }
            }
        }

        tracing::info!(%session_id, "match actor stopped");
    }

    /// Routes a game envelope to the right state operation. Non-game
    /// envelope types never reach the actor; the dispatcher keeps them.
    fn handle_message(
        &mut self,
        sender: PlayerId,
        msg: ClientMessage,
    ) -> Vec<(PlayerId, ServerMessage)> {
        if !self.state.is_member(sender) {
            tracing::warn!(
                session_id = %self.state.session_id(),
                %sender,
                "message from non-member, ignoring"
            );
            return Vec::new();
        }
        match msg {
            ClientMessage::PlaceShip {
                ship_id,
                row,
                col,
                vertical,
            } => self.state.place_ship(
                sender,
                &ship_id,
                Placement { row, col, vertical },
            ),
            ClientMessage::Ready => self.state.ready(sender),
            ClientMessage::Attack { row, col } => {
                self.state.attack(sender, Coord::new(row, col))
            }
            ClientMessage::Chat { text } => self.state.chat(sender, text),
            other => {
                tracing::warn!(
                    session_id = %self.state.session_id(),
                    %sender,
                    ?other,
                    "non-game envelope routed to match, ignoring"
                );
                Vec::new()
            }
        }
    }

    fn handle_leave(
        &mut self,
        player_id: PlayerId,
    ) -> Result<LeaveOutcome, MatchError> {
        if !self.state.is_member(player_id) {
            return Err(MatchError::NotInSession(player_id));
        }

        let phase = self.state.phase();
        let out = if phase.is_placing() {
            // The game never started: tell the peer and disband.
            self.state.disconnect(player_id)
        } else {
            // Leaving a live game concedes it; leaving an ended one is
            // just bookkeeping.
            self.state.forfeit(player_id)
        };
        self.senders.remove(&player_id);
        self.deliver(out);

        let remaining = self
            .state
            .members()
            .into_iter()
            .filter(|id| *id != player_id)
            .collect();
        Ok(LeaveOutcome {
            disband: phase.is_placing(),
            remaining,
        })
    }

    /// Delivers envelopes to their members. A dead receiver (the member
    /// is between connections) is silently skipped; they will get a full
    /// snapshot when they rebind.
    fn deliver(&self, out: Vec<(PlayerId, ServerMessage)>) {
        for (player_id, msg) in out {
            if let Some(sender) = self.senders.get(&player_id) {
                let _ = sender.send(msg);
            }
        }
    }

    fn info(&self) -> MatchInfo {
        MatchInfo {
            session_id: self.state.session_id(),
            phase: self.state.phase(),
            member_count: self.state.members().len(),
            members: self.state.members(),
            ended_at: self.state.ended_at(),
        }
    }
}

/// Spawns a new match actor task and returns a handle to it.
pub(crate) fn spawn_match(
    session_id: SessionId,
    config: MatchConfig,
    channel_size: usize,
) -> MatchHandle {
    let (tx, rx) = mpsc::channel(channel_size);

    let actor = MatchActor {
        state: MatchState::new(session_id, config),
        senders: HashMap::new(),
        receiver: rx,
    };

    tokio::spawn(actor.run());

    MatchHandle {
        session_id,
        sender: tx,
    }
}
