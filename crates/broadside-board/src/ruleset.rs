//! Rulesets: grid size, fleet composition, and the contact rule.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// ShipSpec
// ---------------------------------------------------------------------------

/// One entry in a ruleset's fleet: the ship that must exist on every
/// board playing under that ruleset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShipSpec {
    /// Stable identifier, referenced by `place-ship` envelopes.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Length in cells.
    pub size: u8,
}

impl ShipSpec {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        size: u8,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            size,
        }
    }
}

// ---------------------------------------------------------------------------
// Ruleset
// ---------------------------------------------------------------------------

/// Everything that varies between board configurations.
///
/// The default is the classic 10×10 layout with the ten-ship fleet
/// (one battleship, two cruisers, three destroyers, four submarines,
/// twenty ship cells) and ships forbidden from touching, diagonals
/// included. Tests and small demos swap in reduced fleets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ruleset {
    /// Side length of the square grid.
    pub board_size: u8,
    /// The fleet every board must place before readying up.
    pub fleet: Vec<ShipSpec>,
    /// When `true`, no ship cell may have another ship in any of its
    /// eight neighboring cells.
    pub forbid_touching: bool,
}

impl Ruleset {
    /// A ruleset with a custom fleet on the standard grid.
    pub fn with_fleet(fleet: Vec<ShipSpec>) -> Self {
        Self {
            fleet,
            ..Self::default()
        }
    }

    /// Total number of ship cells in the fleet.
    pub fn total_ship_cells(&self) -> usize {
        self.fleet.iter().map(|s| s.size as usize).sum()
    }

    /// Looks up a fleet entry by id.
    pub fn ship_spec(&self, id: &str) -> Option<&ShipSpec> {
        self.fleet.iter().find(|s| s.id == id)
    }
}

impl Default for Ruleset {
    fn default() -> Self {
        Self {
            board_size: 10,
            fleet: classic_fleet(),
            forbid_touching: true,
        }
    }
}

/// The classic fleet: 1×4, 2×3, 3×2, 4×1.
fn classic_fleet() -> Vec<ShipSpec> {
    vec![
        ShipSpec::new("battleship-1", "Battleship", 4),
        ShipSpec::new("cruiser-1", "Cruiser", 3),
        ShipSpec::new("cruiser-2", "Cruiser", 3),
        ShipSpec::new("destroyer-1", "Destroyer", 2),
        ShipSpec::new("destroyer-2", "Destroyer", 2),
        ShipSpec::new("destroyer-3", "Destroyer", 2),
        ShipSpec::new("submarine-1", "Submarine", 1),
        ShipSpec::new("submarine-2", "Submarine", 1),
        ShipSpec::new("submarine-3", "Submarine", 1),
        ShipSpec::new("submarine-4", "Submarine", 1),
    ]
}

// =========================================================================
// Tests
// =========================================================================
