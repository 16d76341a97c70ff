//! The turn state machine: phase sequencing and whose move it is.
//!
//! The machine is pure bookkeeping over slot indices (0 and 1, in join
//! order); it knows nothing about boards or players. The match state
//! validates board-level preconditions (fleet placed, cell attackable)
//! and then drives this machine, which is the single authority on what
//! the session's phase is and who may act.

use broadside_protocol::{AttackOutcome, ErrorCode, Phase};

/// Phase sequencing for one session.
///
/// ```text
/// Preparing ──(first ready)──→ WaitingForOpponent
///     │                              │
///     └───────(both ready)───────────┴──→ WaitingActive ──(begin)──→ Active ──(win/forfeit)──→ Ended
/// ```
///
/// Operations that arrive in the wrong phase are rejected with
/// [`ErrorCode::InvalidPhase`] — they are logical races (a message sent
/// before the sender saw the phase change), never crashes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnMachine {
    phase: Phase,
    ready: [bool; 2],
    /// Slot on the move. Set when both players are ready; slot 0 (the
    /// first player bound to the session) always starts, which keeps
    /// starter selection deterministic and broadcast-consistent.
    turn: Option<usize>,
    winner: Option<usize>,
}

impl TurnMachine {
    pub fn new() -> Self {
        Self {
            phase: Phase::Preparing,
            ready: [false, false],
            turn: None,
            winner: None,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_ready(&self, slot: usize) -> bool {
        self.ready[slot]
    }

    /// The slot on the move, once both players are ready.
    pub fn turn_slot(&self) -> Option<usize> {
        self.turn
    }

    pub fn winner_slot(&self) -> Option<usize> {
        self.winner
    }

    /// Marks a slot's placement complete.
    ///
    /// The first ready advances the session to `WaitingForOpponent`;
    /// the second to `WaitingActive` with slot 0 to move. Returns the
    /// phase after the transition.
    ///
    /// # Errors
    /// [`ErrorCode::InvalidPhase`] if placement is over or the slot
    /// already readied up.
    pub fn mark_ready(&mut self, slot: usize) -> Result<Phase, ErrorCode> {
        if !self.phase.is_placing() || self.ready[slot] {
            return Err(ErrorCode::InvalidPhase);
        }
        self.ready[slot] = true;
        self.phase = if self.ready[0] && self.ready[1] {
            self.turn = Some(0);
            Phase::WaitingActive
        } else {
            Phase::WaitingForOpponent
        };
        Ok(self.phase)
    }

    /// Completes the start handoff: `WaitingActive → Active`.
    ///
    /// Split from [`mark_ready`](Self::mark_ready) so the caller can
    /// broadcast the "game starting" snapshot in `WaitingActive` before
    /// play opens — both peers see the same starter before the first
    /// attack is legal.
    ///
    /// # Errors
    /// [`ErrorCode::InvalidPhase`] outside `WaitingActive`.
    pub fn begin(&mut self) -> Result<(), ErrorCode> {
        if self.phase != Phase::WaitingActive {
            return Err(ErrorCode::InvalidPhase);
        }
        self.phase = Phase::Active;
        Ok(())
    }

    /// Checks that `slot` may attack right now.
    ///
    /// # Errors
    /// - [`ErrorCode::InvalidPhase`] outside `Active`
    /// - [`ErrorCode::NotYourTurn`] when the other slot is on the move
    pub fn check_attack(&self, slot: usize) -> Result<(), ErrorCode> {
        if self.phase != Phase::Active {
            return Err(ErrorCode::InvalidPhase);
        }
        if self.turn != Some(slot) {
            return Err(ErrorCode::NotYourTurn);
        }
        Ok(())
    }

    /// Applies the outcome of a resolved attack by `slot`.
    ///
    /// A win ends the session. Otherwise the turn passes on a miss and,
    /// when `extra_turn_on_hit` is false, on hits as well.
    pub fn record_attack(
        &mut self,
        slot: usize,
        outcome: &AttackOutcome,
        extra_turn_on_hit: bool,
    ) {
        debug_assert_eq!(self.turn, Some(slot));
        if let AttackOutcome::Win { .. } = outcome {
            self.phase = Phase::Ended;
            self.winner = Some(slot);
            return;
        }
        if !outcome.is_hit() || !extra_turn_on_hit {
            self.turn = Some(1 - slot);
        }
    }

    /// Ends the session in the other slot's favor (leave/abandonment).
    /// A no-op once the session already ended.
    pub fn forfeit(&mut self, loser: usize) {
        if self.phase == Phase::Ended {
            return;
        }
        self.phase = Phase::Ended;
        self.winner = Some(1 - loser);
    }
}

impl Default for TurnMachine {
    fn default() -> Self {
        Self::new()
    }
}

// =========================================================================
// Tests
// =========================================================================
