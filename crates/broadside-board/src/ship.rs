//! Ships: identity, placement, and damage.

use broadside_protocol::{Coord, Placement, ShipView};

use crate::ShipSpec;

/// One ship on one board.
///
/// Position is immutable once placed; the only way to move a ship is a
/// whole-ship re-placement through [`Board::place_ship`], which lifts it,
/// re-validates every cell, and restores the old position on failure.
/// There is no partial move.
///
/// [`Board::place_ship`]: crate::Board::place_ship
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ship {
    pub(crate) spec: ShipSpec,
    pub(crate) placement: Option<Placement>,
    pub(crate) hits: u8,
}

impl Ship {
    pub(crate) fn new(spec: ShipSpec) -> Self {
        Self {
            spec,
            placement: None,
            hits: 0,
        }
    }

    pub fn id(&self) -> &str {
        &self.spec.id
    }

    pub fn size(&self) -> u8 {
        self.spec.size
    }

    pub fn is_placed(&self) -> bool {
        self.placement.is_some()
    }

    /// Sunk status is derived, never stored: a ship is sunk once it has
    /// taken as many hits as it has cells.
    pub fn is_sunk(&self) -> bool {
        self.hits >= self.spec.size
    }

    /// The cells this ship would occupy under `placement`: a straight
    /// run of `size` cells from the anchor, rightward or downward.
    ///
    /// Coordinates are produced with widening arithmetic so an anchor
    /// near the edge cannot wrap; the caller bounds-checks the results.
    pub(crate) fn cells_at(
        placement: Placement,
        size: u8,
    ) -> impl Iterator<Item = (u16, u16)> {
        (0..size as u16).map(move |i| {
            if placement.vertical {
                (placement.row as u16 + i, placement.col as u16)
            } else {
                (placement.row as u16, placement.col as u16 + i)
            }
        })
    }

    /// The cells this ship currently occupies, if placed.
    pub fn occupied_cells(&self) -> Vec<Coord> {
        match self.placement {
            Some(p) => Self::cells_at(p, self.spec.size)
                .map(|(r, c)| Coord::new(r as u8, c as u8))
                .collect(),
            None => Vec::new(),
        }
    }

    /// Full view for the owner.
    pub(crate) fn own_view(&self) -> ShipView {
        ShipView {
            id: self.spec.id.clone(),
            name: self.spec.name.clone(),
            size: self.spec.size,
            hits: self.hits,
            sunk: self.is_sunk(),
            placement: self.placement,
        }
    }
}

// =========================================================================
// Tests
// =========================================================================
