//! Match manager: pairs players into sessions and routes to them.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use broadside_protocol::{ClientMessage, PlayerId, SessionId};

use crate::actor::spawn_match;
use crate::{
    LeaveOutcome, MatchConfig, MatchError, MatchHandle, PlayerSender,
};

/// Counter for allocating session ids.
static NEXT_SESSION_ID: AtomicU64 = AtomicU64::new(1);

/// Command channel size for match actors.
const DEFAULT_CHANNEL_SIZE: usize = 64;

/// Owns every live session and the player → session index.
///
/// This is the lobby: `join_or_create` is the whole matchmaking policy
/// (pair two ready players, nothing fancier), and the index enforces
/// the one-session-per-player invariant.
pub struct MatchManager {
    config: MatchConfig,
    sessions: HashMap<SessionId, MatchHandle>,
    /// Which session each player belongs to. At most one entry per
    /// player.
    player_sessions: HashMap<PlayerId, SessionId>,
}

impl MatchManager {
    pub fn new(config: MatchConfig) -> Self {
        Self {
            config,
            sessions: HashMap::new(),
            player_sessions: HashMap::new(),
        }
    }

    /// Pairs the player into a forming session, or opens a new one.
    ///
    /// Scans existing sessions for one still waiting on a second
    /// member; joins it if found, otherwise spawns a fresh session with
    /// this player as slot 0 (and therefore the starting player once
    /// the game begins).
    ///
    /// # Errors
    /// [`MatchError::AlreadyInSession`] if the player is in a session;
    /// reconnection goes through [`rebind`](Self::rebind) instead.
    pub async fn join_or_create(
        &mut self,
        player_id: PlayerId,
        name: String,
        sender: PlayerSender,
    ) -> Result<SessionId, MatchError> {
        if let Some(existing) = self.player_sessions.get(&player_id) {
            return Err(MatchError::AlreadyInSession(
                player_id, *existing,
            ));
        }

        // A session may stop being joinable between get_info and join
        // (its lone member left); keep scanning on failure.
        for handle in self.sessions.values() {
            if let Ok(info) = handle.get_info().await {
                if info.is_joinable()
                    && handle
                        .join(player_id, name.clone(), sender.clone())
                        .await
                        .is_ok()
                {
                    self.player_sessions
                        .insert(player_id, info.session_id);
                    return Ok(info.session_id);
                }
            }
        }

        let session_id =
            SessionId(NEXT_SESSION_ID.fetch_add(1, Ordering::Relaxed));
        let handle = spawn_match(
            session_id,
            self.config.clone(),
            DEFAULT_CHANNEL_SIZE,
        );
        handle.join(player_id, name, sender).await?;
        self.sessions.insert(session_id, handle);
        self.player_sessions.insert(player_id, session_id);
        tracing::info!(%session_id, %player_id, "session created");
        Ok(session_id)
    }

    /// Rebinds a reconnected player to their in-progress session.
    ///
    /// # Errors
    /// [`MatchError::NotInSession`] if the player has no session (the
    /// caller treats that as "nothing to resume").
    pub async fn rebind(
        &mut self,
        player_id: PlayerId,
        sender: PlayerSender,
    ) -> Result<SessionId, MatchError> {
        let session_id = self
            .player_sessions
            .get(&player_id)
            .copied()
            .ok_or(MatchError::NotInSession(player_id))?;
        let handle = self
            .sessions
            .get(&session_id)
            .ok_or(MatchError::NotFound(session_id))?;
        handle.rebind(player_id, sender).await?;
        Ok(session_id)
    }

    /// Removes a player from their session.
    ///
    /// A leave before the game starts disbands the session and frees
    /// the remaining member for new matchmaking; an in-game leave
    /// concedes and the ended session stays addressable until reaped.
    pub async fn leave(
        &mut self,
        player_id: PlayerId,
    ) -> Result<(), MatchError> {
        let session_id = self
            .player_sessions
            .get(&player_id)
            .copied()
            .ok_or(MatchError::NotInSession(player_id))?;

        let outcome: LeaveOutcome = match self.sessions.get(&session_id)
        {
            Some(handle) => handle.leave(player_id).await?,
            None => LeaveOutcome {
                disband: true,
                remaining: Vec::new(),
            },
        };
        self.player_sessions.remove(&player_id);

        if outcome.disband {
            for member in &outcome.remaining {
                self.player_sessions.remove(member);
            }
            if let Some(handle) = self.sessions.remove(&session_id) {
                let _ = handle.shutdown().await;
            }
            tracing::info!(%session_id, "session disbanded");
        }
        Ok(())
    }

    /// Routes a game envelope to the sender's session.
    ///
    /// # Errors
    /// [`MatchError::NotInSession`] when the sender has no session; the
    /// dispatcher turns that into an `invalid-phase` reply.
    pub async fn route_message(
        &self,
        player_id: PlayerId,
        msg: ClientMessage,
    ) -> Result<(), MatchError> {
        let session_id = self
            .player_sessions
            .get(&player_id)
            .ok_or(MatchError::NotInSession(player_id))?;
        let handle = self
            .sessions
            .get(session_id)
            .ok_or(MatchError::NotFound(*session_id))?;
        handle.send_message(player_id, msg).await
    }

    /// Tells the player's session (if any) that their connection is
    /// gone. The session itself decides what the peer hears.
    pub async fn disconnected(&self, player_id: PlayerId) {
        if let Some(session_id) = self.player_sessions.get(&player_id) {
            if let Some(handle) = self.sessions.get(session_id) {
                let _ = handle.disconnected(player_id).await;
            }
        }
    }

    /// Forfeits an abandoned player's session (reconnect grace over).
    /// The player is released from the index; the ended session lingers
    /// until [`reap_finished`](Self::reap_finished) collects it.
    pub async fn forfeit(&mut self, player_id: PlayerId) {
        let Some(session_id) =
            self.player_sessions.remove(&player_id)
        else {
            return;
        };
        if let Some(handle) = self.sessions.get(&session_id) {
            let _ = handle.forfeit(player_id).await;
        }
        tracing::info!(%session_id, %player_id, "abandoned session forfeited");
    }

    /// Destroys sessions that ended longer than the grace period ago,
    /// releasing their members.
    pub async fn reap_finished(&mut self) {
        let mut dead = Vec::new();
        for (session_id, handle) in &self.sessions {
            match handle.get_info().await {
                Ok(info) => {
                    if let Some(ended_at) = info.ended_at {
                        if ended_at.elapsed() > self.config.end_grace {
                            dead.push((*session_id, info.members));
                        }
                    }
                }
                // Unreachable actor: collect it regardless.
                Err(_) => dead.push((*session_id, Vec::new())),
            }
        }

        for (session_id, members) in dead {
            if let Some(handle) = self.sessions.remove(&session_id) {
                let _ = handle.shutdown().await;
            }
            for member in members {
                // Only release members still pointing at this session.
                if self.player_sessions.get(&member)
                    == Some(&session_id)
                {
                    self.player_sessions.remove(&member);
                }
            }
            tracing::info!(%session_id, "finished session reaped");
        }
    }

    /// The session a player currently belongs to, if any.
    pub fn session_of(&self, player_id: &PlayerId) -> Option<SessionId> {
        self.player_sessions.get(player_id).copied()
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }
}
