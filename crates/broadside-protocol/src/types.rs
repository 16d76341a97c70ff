//! Identity, phase, and routing types shared across the stack.

use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// A durable identifier for a player.
///
/// Minted once by the identity binder and recovered across reconnects via
/// the player's identity token, so it outlives any single connection.
///
/// `#[serde(transparent)]` keeps the wire form a plain number: a
/// `PlayerId(42)` serializes as `42`, not `{"0": 42}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub u64);

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P-{}", self.0)
    }
}

/// A unique identifier for a session (one two-player game).
///
/// Allocated when the first player is paired in; immutable for the
/// session's lifetime once both players are bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(pub u64);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "S-{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Phase — the turn state machine, as clients see it
// ---------------------------------------------------------------------------

/// The session phase broadcast to both members.
///
/// The session is the single source of truth for this value; clients are
/// replicas and never advance it locally. Transitions are driven by the
/// turn state machine in `broadside-match`:
///
/// ```text
/// Preparing → WaitingForOpponent → WaitingActive → Active → Ended
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Phase {
    /// Players are placing ships on their own boards.
    Preparing,
    /// One player is ready and waiting on the peer.
    WaitingForOpponent,
    /// Both ready; the "game starting, X moves first" broadcast is the
    /// only thing that happens in this phase.
    WaitingActive,
    /// Turns alternate; attacks are accepted from the player to move.
    Active,
    /// A winner has been declared. No further attacks are accepted.
    Ended,
}

impl Phase {
    /// Returns `true` while ship placement is still legal.
    pub fn is_placing(self) -> bool {
        matches!(self, Self::Preparing | Self::WaitingForOpponent)
    }

    /// Returns `true` once attacks are being accepted.
    pub fn is_playing(self) -> bool {
        matches!(self, Self::Active)
    }

    /// Returns `true` when the session has reached a terminal outcome.
    pub fn is_over(self) -> bool {
        matches!(self, Self::Ended)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Preparing => "preparing",
            Self::WaitingForOpponent => "waiting-for-opponent",
            Self::WaitingActive => "waiting-active",
            Self::Active => "active",
            Self::Ended => "ended",
        };
        f.write_str(s)
    }
}

// ---------------------------------------------------------------------------
// ErrorCode — the rejection taxonomy
// ---------------------------------------------------------------------------

/// Machine-readable codes carried by `error` envelopes.
///
/// Every rejection is reported to the originating client only, leaves all
/// session and board state untouched, and never terminates the
/// connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorCode {
    /// The transport is not open; the caller must wait for reconnection
    /// and re-send. Never auto-retried at this layer.
    NotConnected,
    /// The presented identity token does not resolve. The client must
    /// start fresh with a token-less `identify`.
    UnknownIdentity,
    /// A placement would fall outside the grid.
    OutOfBounds,
    /// A placement would occupy a cell another ship already holds.
    Overlap,
    /// A placement would touch another ship under a no-contact ruleset.
    AdjacencyViolation,
    /// The targeted cell was already attacked. Does not consume the turn.
    AlreadyAttacked,
    /// An attack arrived from the player not on the move.
    NotYourTurn,
    /// The operation is not legal in the session's current phase.
    InvalidPhase,
    /// The envelope type was not recognized. Dropped, logged, connection
    /// stays open.
    UnknownMessageType,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::NotConnected => "not-connected",
            Self::UnknownIdentity => "unknown-identity",
            Self::OutOfBounds => "out-of-bounds",
            Self::Overlap => "overlap",
            Self::AdjacencyViolation => "adjacency-violation",
            Self::AlreadyAttacked => "already-attacked",
            Self::NotYourTurn => "not-your-turn",
            Self::InvalidPhase => "invalid-phase",
            Self::UnknownMessageType => "unknown-message-type",
        };
        f.write_str(s)
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_player_id_serializes_as_plain_number() {
        let json = serde_json::to_string(&PlayerId(42)).unwrap();
        assert_eq!(json, "42");
    }

    #[test]
    fn test_player_id_deserializes_from_plain_number() {
        let pid: PlayerId = serde_json::from_str("42").unwrap();
        assert_eq!(pid, PlayerId(42));
    }

    #[test]
    fn test_player_id_display() {
        assert_eq!(PlayerId(7).to_string(), "P-7");
    }

    #[test]
    fn test_session_id_serializes_as_plain_number() {
        let json = serde_json::to_string(&SessionId(99)).unwrap();
        assert_eq!(json, "99");
    }

    #[test]
    fn test_session_id_display() {
        assert_eq!(SessionId(3).to_string(), "S-3");
    }

    #[test]
    fn test_phase_serializes_as_kebab_case() {
        let json = serde_json::to_string(&Phase::WaitingForOpponent).unwrap();
        assert_eq!(json, "\"waiting-for-opponent\"");
        let json = serde_json::to_string(&Phase::Active).unwrap();
        assert_eq!(json, "\"active\"");
    }

    #[test]
    fn test_phase_display_matches_wire_form() {
        assert_eq!(Phase::WaitingActive.to_string(), "waiting-active");
        assert_eq!(Phase::Ended.to_string(), "ended");
    }

    #[test]
    fn test_phase_predicates() {
        assert!(Phase::Preparing.is_placing());
        assert!(Phase::WaitingForOpponent.is_placing());
        assert!(!Phase::Active.is_placing());

        assert!(Phase::Active.is_playing());
        assert!(!Phase::WaitingActive.is_playing());

        assert!(Phase::Ended.is_over());
        assert!(!Phase::Active.is_over());
    }

    #[test]
    fn test_error_code_serializes_as_kebab_case() {
        let json = serde_json::to_string(&ErrorCode::AlreadyAttacked).unwrap();
        assert_eq!(json, "\"already-attacked\"");
        let json =
            serde_json::to_string(&ErrorCode::AdjacencyViolation).unwrap();
        assert_eq!(json, "\"adjacency-violation\"");
    }

    #[test]
    fn test_error_code_display_matches_wire_form() {
        assert_eq!(ErrorCode::NotYourTurn.to_string(), "not-your-turn");
        assert_eq!(
            ErrorCode::UnknownMessageType.to_string(),
            "unknown-message-type"
        );
    }

    #[test]
    fn test_error_code_round_trip() {
        for code in [
            ErrorCode::NotConnected,
            ErrorCode::UnknownIdentity,
            ErrorCode::OutOfBounds,
            ErrorCode::Overlap,
            ErrorCode::AdjacencyViolation,
            ErrorCode::AlreadyAttacked,
            ErrorCode::NotYourTurn,
            ErrorCode::InvalidPhase,
            ErrorCode::UnknownMessageType,
        ] {
            let json = serde_json::to_string(&code).unwrap();
            let back: ErrorCode = serde_json::from_str(&json).unwrap();
            assert_eq!(code, back);
        }
    }
}
