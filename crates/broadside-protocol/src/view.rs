//! Server-authoritative projections carried by `state` envelopes.
//!
//! A session holds two boards, and each player is entitled to a different
//! amount of information about them: the full truth about their own board
//! and a redacted "attack view" of the opponent's. Both projections are
//! expressed with the types in this module; the redaction itself happens
//! in `broadside-board` when the views are produced.

use serde::{Deserialize, Serialize};

use crate::{Phase, PlayerId, SessionId};

// ---------------------------------------------------------------------------
// Coordinates and placements
// ---------------------------------------------------------------------------

/// A single grid coordinate. Row-major, zero-based.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
pub struct Coord {
    pub row: u8,
    pub col: u8,
}

impl Coord {
    pub fn new(row: u8, col: u8) -> Self {
        Self { row, col }
    }
}

/// Where a ship sits: anchor cell plus orientation. The occupied cells
/// run rightward from the anchor when horizontal, downward when vertical.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize,
)]
pub struct Placement {
    pub row: u8,
    pub col: u8,
    pub vertical: bool,
}

// ---------------------------------------------------------------------------
// Cells
// ---------------------------------------------------------------------------

/// The visible state of one grid cell.
///
/// In an attack view, `ship` only ever appears for cells of sunk ships;
/// unsunk ship cells are presented as `empty` until they are hit. This is
/// a security invariant of the protocol, not a rendering convenience.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize,
)]
#[serde(rename_all = "kebab-case")]
pub enum CellState {
    Empty,
    Ship,
    Hit,
    Miss,
}

/// One cell as a client sees it.
///
/// `adjacency` is the number of neighboring ship cells, precomputed for
/// placement-legality hints; attack views always carry 0 here because a
/// real count would leak unsunk ship positions. `rev` is the board
/// revision at which the cell last changed, used by clients to order
/// animations.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize,
)]
pub struct CellView {
    pub state: CellState,
    pub adjacency: u8,
    pub rev: u64,
}

// ---------------------------------------------------------------------------
// Ships and boards
// ---------------------------------------------------------------------------

/// One ship as a client sees it.
///
/// In an attack view, `placement` is populated only once the ship is
/// sunk; until then the opponent learns nothing about where it sits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShipView {
    pub id: String,
    pub name: String,
    pub size: u8,
    pub hits: u8,
    pub sunk: bool,
    pub placement: Option<Placement>,
}

/// A full or redacted projection of one board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardView {
    /// Side length of the square grid.
    pub size: u8,
    /// Row-major grid of cells, `size` rows of `size` cells.
    pub grid: Vec<Vec<CellView>>,
    /// Ship inventory; see [`ShipView`] for what is redacted.
    pub ships: Vec<ShipView>,
    /// The most recent attack against this board, for UI highlighting.
    pub last_attack: Option<Coord>,
}

// ---------------------------------------------------------------------------
// Attack outcomes
// ---------------------------------------------------------------------------

/// The result of resolving one attack.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
#[serde(rename_all_fields = "camelCase")]
pub enum AttackOutcome {
    /// Water.
    Miss,
    /// A ship cell was struck but the ship survives.
    Hit,
    /// The struck ship just lost its last cell.
    Sunk { ship_id: String },
    /// The struck ship was the defender's last one; the attacker wins.
    Win { ship_id: String },
}

impl AttackOutcome {
    /// Returns `true` for any outcome that struck a ship.
    pub fn is_hit(&self) -> bool {
        !matches!(self, Self::Miss)
    }
}

/// What happened on the most recent attack, attached to `state`
/// broadcasts so both clients can animate the same event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttackReport {
    /// The attacking player.
    pub by: PlayerId,
    /// The targeted cell.
    pub coord: Coord,
    /// How it resolved.
    pub outcome: AttackOutcome,
}

// ---------------------------------------------------------------------------
// Snapshot — the payload of a `state` envelope
// ---------------------------------------------------------------------------

/// A per-viewer snapshot of the session.
///
/// The server sends one of these to each member whenever the session
/// state changes; clients discard their local view and reconcile against
/// it rather than mutating speculatively. `you` is always the viewer's
/// own full board; `opponent` is the redacted attack view and is absent
/// until a peer has joined.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub session_id: SessionId,
    pub phase: Phase,
    /// `Some(true)` when it is the viewer's move. `None` outside of
    /// `waiting-active`/`active`/`ended`.
    pub your_turn: Option<bool>,
    pub you: BoardView,
    pub opponent: Option<BoardView>,
    pub last_attack: Option<AttackReport>,
    pub winner: Option<PlayerId>,
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn empty_board(size: u8) -> BoardView {
        BoardView {
            size,
            grid: vec![
                vec![
                    CellView {
                        state: CellState::Empty,
                        adjacency: 0,
                        rev: 0,
                    };
                    size as usize
                ];
                size as usize
            ],
            ships: Vec::new(),
            last_attack: None,
        }
    }

    #[test]
    fn test_cell_state_serializes_as_kebab_case() {
        assert_eq!(
            serde_json::to_string(&CellState::Ship).unwrap(),
            "\"ship\""
        );
        assert_eq!(
            serde_json::to_string(&CellState::Miss).unwrap(),
            "\"miss\""
        );
    }

    #[test]
    fn test_attack_outcome_miss_json_shape() {
        let json = serde_json::to_value(&AttackOutcome::Miss).unwrap();
        assert_eq!(json["kind"], "miss");
    }

    #[test]
    fn test_attack_outcome_sunk_carries_ship_id() {
        let outcome = AttackOutcome::Sunk {
            ship_id: "cruiser-1".into(),
        };
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["kind"], "sunk");
        assert_eq!(json["shipId"], "cruiser-1");
    }

    #[test]
    fn test_attack_outcome_win_round_trip() {
        let outcome = AttackOutcome::Win {
            ship_id: "battleship".into(),
        };
        let json = serde_json::to_string(&outcome).unwrap();
        let back: AttackOutcome = serde_json::from_str(&json).unwrap();
        assert_eq!(outcome, back);
    }

    #[test]
    fn test_attack_outcome_is_hit() {
        assert!(!AttackOutcome::Miss.is_hit());
        assert!(AttackOutcome::Hit.is_hit());
        assert!(
            AttackOutcome::Sunk {
                ship_id: "s".into()
            }
            .is_hit()
        );
    }

    #[test]
    fn test_ship_view_round_trip() {
        let ship = ShipView {
            id: "destroyer-2".into(),
            name: "Destroyer".into(),
            size: 2,
            hits: 1,
            sunk: false,
            placement: Some(Placement {
                row: 4,
                col: 7,
                vertical: true,
            }),
        };
        let json = serde_json::to_string(&ship).unwrap();
        let back: ShipView = serde_json::from_str(&json).unwrap();
        assert_eq!(ship, back);
    }

    #[test]
    fn test_snapshot_uses_camel_case_field_names() {
        let snapshot = Snapshot {
            session_id: SessionId(5),
            phase: Phase::Preparing,
            your_turn: None,
            you: empty_board(10),
            opponent: None,
            last_attack: None,
            winner: None,
        };
        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["sessionId"], 5);
        assert_eq!(json["phase"], "preparing");
        assert!(json["yourTurn"].is_null());
        assert!(json.get("lastAttack").is_some());
        // No snake_case leftovers on the wire.
        assert!(json.get("session_id").is_none());
        assert!(json.get("your_turn").is_none());
    }

    #[test]
    fn test_snapshot_round_trip() {
        let snapshot = Snapshot {
            session_id: SessionId(9),
            phase: Phase::Active,
            your_turn: Some(true),
            you: empty_board(10),
            opponent: Some(empty_board(10)),
            last_attack: Some(AttackReport {
                by: PlayerId(2),
                coord: Coord::new(0, 1),
                outcome: AttackOutcome::Hit,
            }),
            winner: None,
        };
        let json = serde_json::to_string(&snapshot).unwrap();
        let back: Snapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(snapshot, back);
    }
}
