//! The pure game session: two slots, two boards, one turn machine.
//!
//! `MatchState` is fully synchronous. Every operation validates phase
//! and turn preconditions, applies the mutation, and returns the
//! outbound envelopes to deliver — addressed per player because the two
//! members are never told the same thing: each gets its own board in
//! full and the opponent's through the redacted attack view. The actor
//! in [`crate::actor`] owns one of these and does nothing but feed it
//! commands and deliver its output.

use std::time::Instant;

use broadside_board::Board;
use broadside_protocol::{
    AttackReport, Coord, ErrorCode, Phase, Placement, PlayerId,
    ServerMessage, SessionId, Snapshot,
};

use crate::{MatchConfig, MatchError, TurnMachine};

/// An outbound envelope and the member it is addressed to.
pub type Outbound = (PlayerId, ServerMessage);

/// One session member.
#[derive(Debug, Clone)]
struct PlayerSlot {
    id: PlayerId,
    name: String,
    connected: bool,
}

/// The authoritative state of one two-player game.
pub struct MatchState {
    session_id: SessionId,
    config: MatchConfig,
    /// 0, 1, or 2 members, in join order. Slot 0 moves first.
    slots: Vec<PlayerSlot>,
    /// One board per slot, same order.
    boards: Vec<Board>,
    turn: TurnMachine,
    /// The most recent resolved attack, echoed in every snapshot.
    last_attack: Option<AttackReport>,
    /// Set when the session reaches `Ended`; drives reaping.
    ended_at: Option<Instant>,
}

impl MatchState {
    pub fn new(session_id: SessionId, config: MatchConfig) -> Self {
        Self {
            session_id,
            config,
            slots: Vec::with_capacity(2),
            boards: Vec::with_capacity(2),
            turn: TurnMachine::new(),
            last_attack: None,
            ended_at: None,
        }
    }

    pub fn session_id(&self) -> SessionId {
        self.session_id
    }

    pub fn phase(&self) -> Phase {
        self.turn.phase()
    }

    pub fn members(&self) -> Vec<PlayerId> {
        self.slots.iter().map(|s| s.id).collect()
    }

    pub fn is_member(&self, player_id: PlayerId) -> bool {
        self.slot_of(player_id).is_some()
    }

    pub fn is_full(&self) -> bool {
        self.slots.len() == 2
    }

    pub fn ended_at(&self) -> Option<Instant> {
        self.ended_at
    }

    fn slot_of(&self, player_id: PlayerId) -> Option<usize> {
        self.slots.iter().position(|s| s.id == player_id)
    }

    // -----------------------------------------------------------------
    // Membership
    // -----------------------------------------------------------------

    /// Binds a player into the session's next free slot.
    ///
    /// The joiner gets `joined` plus a snapshot; an existing peer gets
    /// `opponent-joined` plus a refreshed snapshot (their opponent view
    /// just came into existence).
    ///
    /// # Errors
    /// - [`MatchError::SessionFull`] — both slots taken
    /// - [`MatchError::AlreadyInSession`] — the player is a member
    pub fn add_player(
        &mut self,
        player_id: PlayerId,
        name: String,
    ) -> Result<Vec<Outbound>, MatchError> {
        if self.is_member(player_id) {
            return Err(MatchError::AlreadyInSession(
                player_id,
                self.session_id,
            ));
        }
        if self.is_full() {
            return Err(MatchError::SessionFull(self.session_id));
        }

        self.slots.push(PlayerSlot {
            id: player_id,
            name: name.clone(),
            connected: true,
        });
        self.boards.push(Board::new(self.config.ruleset.clone()));
        tracing::info!(
            session_id = %self.session_id,
            %player_id,
            members = self.slots.len(),
            "player joined session"
        );

        let joiner = self.slots.len() - 1;
        let mut out = vec![(
            player_id,
            ServerMessage::Joined {
                session_id: self.session_id,
            },
        )];
        if joiner == 1 {
            out.push((
                self.slots[0].id,
                ServerMessage::OpponentJoined { name },
            ));
        }
        out.extend(self.snapshots_for_all());
        Ok(out)
    }

    /// Marks a member disconnected. Board and phase are untouched; the
    /// peer is told so it can show the empty chair.
    pub fn disconnect(&mut self, player_id: PlayerId) -> Vec<Outbound> {
        let Some(slot) = self.slot_of(player_id) else {
            return Vec::new();
        };
        if !self.slots[slot].connected {
            return Vec::new();
        }
        self.slots[slot].connected = false;
        tracing::info!(
            session_id = %self.session_id,
            %player_id,
            "member disconnected"
        );
        self.peer_of(slot)
            .map(|peer| (self.slots[peer].id, ServerMessage::OpponentLeft))
            .into_iter()
            .collect()
    }

    /// Rebinds a reconnected member. Nothing about the session changes;
    /// the player is brought back up to date with a full snapshot and
    /// the peer is told they are back.
    pub fn rebind(&mut self, player_id: PlayerId) -> Vec<Outbound> {
        let Some(slot) = self.slot_of(player_id) else {
            return Vec::new();
        };
        self.slots[slot].connected = true;
        tracing::info!(
            session_id = %self.session_id,
            %player_id,
            "member rebound to session"
        );

        let mut out = vec![
            (
                player_id,
                ServerMessage::Joined {
                    session_id: self.session_id,
                },
            ),
            self.state_msg(slot),
        ];
        if let Some(peer) = self.peer_of(slot) {
            out.push((
                self.slots[peer].id,
                ServerMessage::OpponentJoined {
                    name: self.slots[slot].name.clone(),
                },
            ));
        }
        out
    }

    // -----------------------------------------------------------------
    // Game actions
    // -----------------------------------------------------------------

    /// Places one ship on the sender's own board.
    pub fn place_ship(
        &mut self,
        sender: PlayerId,
        ship_id: &str,
        placement: Placement,
    ) -> Vec<Outbound> {
        let Some(slot) = self.slot_of(sender) else {
            return Vec::new();
        };
        if !self.turn.phase().is_placing() || self.turn.is_ready(slot) {
            return vec![(
                sender,
                ServerMessage::error(
                    ErrorCode::InvalidPhase,
                    "ships can only be placed before readying up",
                ),
            )];
        }
        match self.boards[slot].place_ship(ship_id, placement) {
            Ok(()) => vec![self.state_msg(slot)],
            Err(e) => {
                vec![(
                    sender,
                    ServerMessage::error(e.code(), e.to_string()),
                )]
            }
        }
    }

    /// Marks the sender's placement complete.
    ///
    /// Rejected until the whole fleet is legally on the board. When this
    /// was the second `ready`, the start handoff runs to completion
    /// here: the `waiting-active` snapshots (same starter to both) and
    /// then the `active` ones, so neither client can observe a state in
    /// which the other believes someone else starts.
    pub fn ready(&mut self, sender: PlayerId) -> Vec<Outbound> {
        let Some(slot) = self.slot_of(sender) else {
            return Vec::new();
        };
        if self.turn.phase().is_placing()
            && !self.turn.is_ready(slot)
            && !self.boards[slot].is_fleet_placed()
        {
            return vec![(
                sender,
                ServerMessage::error(
                    ErrorCode::InvalidPhase,
                    "the whole fleet must be placed before ready",
                ),
            )];
        }
        let phase = match self.turn.mark_ready(slot) {
            Ok(phase) => phase,
            Err(code) => {
                return vec![(
                    sender,
                    ServerMessage::error(code, "ready is not accepted now"),
                )];
            }
        };
        tracing::info!(
            session_id = %self.session_id,
            player_id = %sender,
            %phase,
            "player ready"
        );

        let mut out = Vec::new();
        if let Some(peer) = self.peer_of(slot) {
            out.push((self.slots[peer].id, ServerMessage::OpponentReady));
        }
        match phase {
            Phase::WaitingActive => {
                // Both ready: announce the start atomically, then open
                // play. Two snapshot rounds, one per phase.
                out.extend(self.snapshots_for_all());
                self.turn.begin().expect("machine is in WaitingActive");
                out.extend(self.snapshots_for_all());
                tracing::info!(
                    session_id = %self.session_id,
                    starter = %self.slots[0].id,
                    "game started"
                );
            }
            _ => out.push(self.state_msg(slot)),
        }
        out
    }

    /// Resolves an attack by `sender` against the opponent's board.
    ///
    /// Rejections reply to the sender only and never consume the turn.
    pub fn attack(
        &mut self,
        sender: PlayerId,
        coord: Coord,
    ) -> Vec<Outbound> {
        let Some(slot) = self.slot_of(sender) else {
            return Vec::new();
        };
        if let Err(code) = self.turn.check_attack(slot) {
            let message = match code {
                ErrorCode::NotYourTurn => "it is the opponent's turn",
                _ => "attacks are not accepted in this phase",
            };
            return vec![(sender, ServerMessage::error(code, message))];
        }

        // check_attack passed, so both slots exist.
        let defender = 1 - slot;
        let outcome = match self.boards[defender].resolve_attack(coord) {
            Ok(outcome) => outcome,
            Err(e) => {
                return vec![(
                    sender,
                    ServerMessage::error(e.code(), e.to_string()),
                )];
            }
        };

        self.turn.record_attack(
            slot,
            &outcome,
            self.config.extra_turn_on_hit,
        );
        let report = AttackReport {
            by: sender,
            coord,
            outcome,
        };
        self.last_attack = Some(report.clone());

        let mut out = self.snapshots_for_all();
        if self.turn.phase().is_over() {
            self.ended_at = Some(Instant::now());
            let winner_id = self.slots[slot].id;
            tracing::info!(
                session_id = %self.session_id,
                winner = %winner_id,
                "game ended"
            );
            for member in &self.slots {
                out.push((
                    member.id,
                    ServerMessage::GameEnded {
                        winner_id,
                        last_attack: Some(report.clone()),
                    },
                ));
            }
        }
        out
    }

    /// Relays a chat line to the peer.
    pub fn chat(&self, sender: PlayerId, text: String) -> Vec<Outbound> {
        let Some(slot) = self.slot_of(sender) else {
            return Vec::new();
        };
        self.peer_of(slot)
            .map(|peer| {
                (
                    self.slots[peer].id,
                    ServerMessage::Chat { from: sender, text },
                )
            })
            .into_iter()
            .collect()
    }

    /// Ends the session in the other member's favor.
    ///
    /// Used for explicit in-game leaves and for abandonment after the
    /// reconnect grace period. A no-op once the session already ended.
    pub fn forfeit(&mut self, player_id: PlayerId) -> Vec<Outbound> {
        let Some(slot) = self.slot_of(player_id) else {
            return Vec::new();
        };
        if self.turn.phase().is_over() {
            return Vec::new();
        }
        self.turn.forfeit(slot);
        self.ended_at = Some(Instant::now());

        let Some(peer) = self.peer_of(slot) else {
            // A lone member forfeiting just closes the session.
            return Vec::new();
        };
        let winner_id = self.slots[peer].id;
        tracing::info!(
            session_id = %self.session_id,
            loser = %player_id,
            winner = %winner_id,
            "session forfeited"
        );
        let mut out = self.snapshots_for_all();
        for member in &self.slots {
            out.push((
                member.id,
                ServerMessage::GameEnded {
                    winner_id,
                    last_attack: self.last_attack.clone(),
                },
            ));
        }
        out
    }

    // -----------------------------------------------------------------
    // Snapshots
    // -----------------------------------------------------------------

    /// Builds the snapshot as seen by `slot`: own board in full, the
    /// opponent's through the redacted attack view.
    pub fn snapshot_for(&self, slot: usize) -> Snapshot {
        let your_turn = match self.turn.phase() {
            Phase::WaitingActive | Phase::Active => {
                self.turn.turn_slot().map(|t| t == slot)
            }
            _ => None,
        };
        Snapshot {
            session_id: self.session_id,
            phase: self.turn.phase(),
            your_turn,
            you: self.boards[slot].own_view(),
            opponent: self
                .peer_of(slot)
                .map(|peer| self.boards[peer].attack_view()),
            last_attack: self.last_attack.clone(),
            winner: self
                .turn
                .winner_slot()
                .map(|w| self.slots[w].id),
        }
    }

    fn state_msg(&self, slot: usize) -> Outbound {
        (
            self.slots[slot].id,
            ServerMessage::State {
                snapshot: self.snapshot_for(slot),
            },
        )
    }

    fn snapshots_for_all(&self) -> Vec<Outbound> {
        (0..self.slots.len()).map(|s| self.state_msg(s)).collect()
    }

    fn peer_of(&self, slot: usize) -> Option<usize> {
        match self.slots.len() {
            2 => Some(1 - slot),
            _ => None,
        }
    }
}

// =========================================================================
// Tests
// =========================================================================
