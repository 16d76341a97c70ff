//! Error types for board operations.

use broadside_protocol::ErrorCode;

/// A rejected board operation. The board is unchanged in every case.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum BoardError {
    /// The ship id is not part of this board's fleet.
    #[error("no ship {0:?} in the fleet")]
    UnknownShip(String),

    /// A placement or attack coordinate falls outside the grid.
    #[error("coordinate outside the board")]
    OutOfBounds,

    /// A placement cell is already occupied by another ship.
    #[error("placement overlaps another ship")]
    Overlap,

    /// A placement cell touches another ship under a no-contact ruleset.
    #[error("placement touches another ship")]
    AdjacencyViolation,

    /// The targeted cell has already been attacked.
    #[error("cell was already attacked")]
    AlreadyAttacked,
}

impl BoardError {
    /// The wire-level code for an `error` reply envelope.
    pub fn code(&self) -> ErrorCode {
        match self {
            // An unknown ship id is a malformed request, not a board
            // rule; report it as an unplaceable placement.
            Self::UnknownShip(_) => ErrorCode::OutOfBounds,
            Self::OutOfBounds => ErrorCode::OutOfBounds,
            Self::Overlap => ErrorCode::Overlap,
            Self::AdjacencyViolation => ErrorCode::AdjacencyViolation,
            Self::AlreadyAttacked => ErrorCode::AlreadyAttacked,
        }
    }
}
