//! The board-state engine for Broadside.
//!
//! One [`Board`] is one player's private grid: a square of cells, a ship
//! inventory, and the attack history against it. The board enforces
//! placement legality (bounds, overlap, the no-touch rule), resolves
//! attacks to miss/hit/sunk/win outcomes, and produces the two
//! projections the protocol sends to clients:
//!
//! - [`Board::own_view`] — the full truth, for the board's owner;
//! - [`Board::attack_view`] — the redacted view the opponent sees, which
//!   never reveals an unsunk ship's position.
//!
//! The board is deliberately phase-agnostic: it doesn't know whose turn
//! it is or whether placement is still allowed. Those gates live in the
//! turn state machine one layer up, which calls in here only after an
//! operation has passed them.

mod board;
mod error;
mod ruleset;
mod ship;

pub use board::Board;
pub use error::BoardError;
pub use ruleset::{Ruleset, ShipSpec};
pub use ship::Ship;
