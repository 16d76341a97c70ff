//! The board itself: grid, placement legality, attack resolution.

use broadside_protocol::{
    AttackOutcome, BoardView, CellState, CellView, Coord, Placement,
};

use crate::{BoardError, Ruleset, Ship};

/// One grid cell, as the board stores it.
///
/// Cell state on the wire (`empty`/`ship`/`hit`/`miss`) is derived from
/// `ship` + `attacked` at view time; keeping occupancy and attack
/// history as separate facts is what makes the redacted projection a
/// pure read instead of a second bookkeeping path.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Cell {
    /// Index into `Board::ships`, if a ship occupies this cell.
    ship: Option<u8>,
    /// Whether this cell has been attacked.
    attacked: bool,
    /// Number of neighboring cells (8-neighborhood) holding a ship.
    adjacency: u8,
    /// Board revision at which this cell last changed.
    rev: u64,
}

/// One player's gameboard.
///
/// Cells are mutated only through [`place_ship`](Board::place_ship) and
/// [`resolve_attack`](Board::resolve_attack); every rejected operation
/// leaves the board byte-for-byte unchanged.
#[derive(Debug, Clone)]
pub struct Board {
    ruleset: Ruleset,
    /// Row-major, `board_size * board_size` cells.
    cells: Vec<Cell>,
    ships: Vec<Ship>,
    last_attack: Option<Coord>,
    /// Monotonic mutation counter, stamped onto changed cells.
    rev: u64,
}

impl Board {
    /// Creates an empty board with the fleet of `ruleset` unplaced.
    pub fn new(ruleset: Ruleset) -> Self {
        let side = ruleset.board_size as usize;
        let ships =
            ruleset.fleet.iter().cloned().map(Ship::new).collect();
        Self {
            ruleset,
            cells: vec![Cell::default(); side * side],
            ships,
            last_attack: None,
            rev: 0,
        }
    }

    pub fn ruleset(&self) -> &Ruleset {
        &self.ruleset
    }

    pub fn ships(&self) -> &[Ship] {
        &self.ships
    }

    pub fn last_attack(&self) -> Option<Coord> {
        self.last_attack
    }

    /// Every ship of the fleet has a placement. Gates `ready`.
    pub fn is_fleet_placed(&self) -> bool {
        self.ships.iter().all(Ship::is_placed)
    }

    /// Win condition against this board.
    pub fn all_sunk(&self) -> bool {
        !self.ships.is_empty() && self.ships.iter().all(Ship::is_sunk)
    }

    /// Number of cells currently holding a ship. Used by tests to prove
    /// a rejected operation changed nothing.
    pub fn ship_cell_count(&self) -> usize {
        self.cells.iter().filter(|c| c.ship.is_some()).count()
    }

    // -----------------------------------------------------------------
    // Placement
    // -----------------------------------------------------------------

    /// Places (or re-places) the fleet ship `ship_id` at `placement`.
    ///
    /// Re-placing lifts the ship first and re-validates every cell as if
    /// it were fresh; on failure the previous placement is restored, so
    /// a ship is never left half-moved.
    ///
    /// # Errors
    /// - [`BoardError::UnknownShip`] — id not in this board's fleet
    /// - [`BoardError::OutOfBounds`] — the run leaves the grid
    /// - [`BoardError::Overlap`] — a cell is occupied by another ship
    /// - [`BoardError::AdjacencyViolation`] — a neighboring cell holds
    ///   another ship and the ruleset forbids contact
    pub fn place_ship(
        &mut self,
        ship_id: &str,
        placement: Placement,
    ) -> Result<(), BoardError> {
        let ship_idx = self
            .ships
            .iter()
            .position(|s| s.id() == ship_id)
            .ok_or_else(|| BoardError::UnknownShip(ship_id.to_string()))?;
        let size = self.ships[ship_idx].size();

        // Bounds first: the run must fit entirely on the grid.
        let side = self.ruleset.board_size as u16;
        let targets: Vec<(u16, u16)> =
            Ship::cells_at(placement, size).collect();
        if targets.iter().any(|&(r, c)| r >= side || c >= side) {
            return Err(BoardError::OutOfBounds);
        }

        // Lift the ship if it is already on the board, so re-placement
        // never collides with itself.
        let previous = self.ships[ship_idx].placement;
        if let Some(prev) = previous {
            self.clear_cells(prev, size);
        }

        let result = self.validate_free(&targets);
        match result {
            Ok(()) => {
                for &(r, c) in &targets {
                    let rev = self.rev + 1;
                    let cell = self.cell_mut(r, c);
                    cell.ship = Some(ship_idx as u8);
                    cell.rev = rev;
                }
                // The vacated cells changed too.
                if let Some(prev) = previous {
                    let rev = self.rev + 1;
                    for (r, c) in Ship::cells_at(prev, size) {
                        if self.cell(r, c).ship.is_none() {
                            self.cell_mut(r, c).rev = rev;
                        }
                    }
                }
                self.rev += 1;
                self.ships[ship_idx].placement = Some(placement);
                self.recompute_adjacency();
                tracing::debug!(
                    ship = ship_id,
                    row = placement.row,
                    col = placement.col,
                    vertical = placement.vertical,
                    "ship placed"
                );
                Ok(())
            }
            Err(e) => {
                // Put the lifted ship back exactly where it was.
                if let Some(prev) = previous {
                    for (r, c) in Ship::cells_at(prev, size) {
                        self.cell_mut(r, c).ship = Some(ship_idx as u8);
                    }
                }
                Err(e)
            }
        }
    }

    /// Checks that every target cell is free and, under a no-contact
    /// ruleset, untouched by any other ship.
    fn validate_free(
        &self,
        targets: &[(u16, u16)],
    ) -> Result<(), BoardError> {
        for &(r, c) in targets {
            if self.cell(r, c).ship.is_some() {
                return Err(BoardError::Overlap);
            }
        }
        if self.ruleset.forbid_touching {
            for &(r, c) in targets {
                for (nr, nc) in self.neighbors(r, c) {
                    // Target cells are not committed yet, so any ship
                    // found here belongs to somebody else.
                    if self.cell(nr, nc).ship.is_some() {
                        return Err(BoardError::AdjacencyViolation);
                    }
                }
            }
        }
        Ok(())
    }

    // -----------------------------------------------------------------
    // Attacks
    // -----------------------------------------------------------------

    /// Resolves an attack against this board.
    ///
    /// A hit increments the struck ship's damage; the outcome escalates
    /// to `Sunk` when that ship just lost its last cell, and to `Win`
    /// the instant it was the defender's last surviving ship.
    ///
    /// # Errors
    /// - [`BoardError::OutOfBounds`] — coordinate outside the grid
    /// - [`BoardError::AlreadyAttacked`] — cell already hit or missed;
    ///   the caller must not consume a turn for this
    pub fn resolve_attack(
        &mut self,
        coord: Coord,
    ) -> Result<AttackOutcome, BoardError> {
        if coord.row >= self.ruleset.board_size
            || coord.col >= self.ruleset.board_size
        {
            return Err(BoardError::OutOfBounds);
        }
        if self.cell(coord.row as u16, coord.col as u16).attacked {
            return Err(BoardError::AlreadyAttacked);
        }

        self.rev += 1;
        let rev = self.rev;
        let cell = self.cell_mut(coord.row as u16, coord.col as u16);
        cell.attacked = true;
        cell.rev = rev;
        let ship_idx = cell.ship;
        self.last_attack = Some(coord);

        let outcome = match ship_idx {
            None => AttackOutcome::Miss,
            Some(i) => {
                let ship = &mut self.ships[i as usize];
                ship.hits += 1;
                if !ship.is_sunk() {
                    AttackOutcome::Hit
                } else {
                    let ship_id = ship.id().to_string();
                    if self.all_sunk() {
                        AttackOutcome::Win { ship_id }
                    } else {
                        AttackOutcome::Sunk { ship_id }
                    }
                }
            }
        };
        tracing::debug!(
            row = coord.row,
            col = coord.col,
            ?outcome,
            "attack resolved"
        );
        Ok(outcome)
    }

    // -----------------------------------------------------------------
    // Projections
    // -----------------------------------------------------------------

    /// The owner's view: everything, including unrevealed ship cells and
    /// the placement hints.
    pub fn own_view(&self) -> BoardView {
        let side = self.ruleset.board_size as usize;
        let grid = (0..side)
            .map(|r| {
                (0..side)
                    .map(|c| {
                        let cell = self.cells[r * side + c];
                        CellView {
                            state: match (cell.ship, cell.attacked) {
                                (Some(_), true) => CellState::Hit,
                                (Some(_), false) => CellState::Ship,
                                (None, true) => CellState::Miss,
                                (None, false) => CellState::Empty,
                            },
                            adjacency: cell.adjacency,
                            rev: cell.rev,
                        }
                    })
                    .collect()
            })
            .collect();
        BoardView {
            size: self.ruleset.board_size,
            grid,
            ships: self.ships.iter().map(Ship::own_view).collect(),
            last_attack: self.last_attack,
        }
    }

    /// The opponent's view: attack results and sunk-ship metadata only.
    ///
    /// Unsunk ship cells render as `empty`, placement hints are zeroed,
    /// unattacked cells carry no revision, and the ship list contains
    /// sunk ships exclusively. Nothing in the returned value depends on
    /// an unsunk ship's position except through cells the attacker has
    /// already hit.
    pub fn attack_view(&self) -> BoardView {
        let side = self.ruleset.board_size as usize;
        let grid = (0..side)
            .map(|r| {
                (0..side)
                    .map(|c| {
                        let cell = self.cells[r * side + c];
                        if cell.attacked {
                            CellView {
                                state: if cell.ship.is_some() {
                                    CellState::Hit
                                } else {
                                    CellState::Miss
                                },
                                adjacency: 0,
                                rev: cell.rev,
                            }
                        } else {
                            CellView {
                                state: CellState::Empty,
                                adjacency: 0,
                                rev: 0,
                            }
                        }
                    })
                    .collect()
            })
            .collect();
        BoardView {
            size: self.ruleset.board_size,
            grid,
            ships: self
                .ships
                .iter()
                .filter(|s| s.is_sunk())
                .map(Ship::own_view)
                .collect(),
            last_attack: self.last_attack,
        }
    }

    // -----------------------------------------------------------------
    // Cell access
    // -----------------------------------------------------------------

    fn cell(&self, row: u16, col: u16) -> &Cell {
        let side = self.ruleset.board_size as usize;
        &self.cells[row as usize * side + col as usize]
    }

    fn cell_mut(&mut self, row: u16, col: u16) -> &mut Cell {
        let side = self.ruleset.board_size as usize;
        &mut self.cells[row as usize * side + col as usize]
    }

    fn clear_cells(&mut self, placement: Placement, size: u8) {
        for (r, c) in Ship::cells_at(placement, size) {
            self.cell_mut(r, c).ship = None;
        }
    }

    /// In-bounds 8-neighborhood of a cell.
    fn neighbors(
        &self,
        row: u16,
        col: u16,
    ) -> impl Iterator<Item = (u16, u16)> + '_ {
        let side = self.ruleset.board_size as i32;
        let (row, col) = (row as i32, col as i32);
        (-1..=1).flat_map(move |dr| {
            (-1..=1).filter_map(move |dc| {
                if dr == 0 && dc == 0 {
                    return None;
                }
                let (nr, nc) = (row + dr, col + dc);
                if nr < 0 || nc < 0 || nr >= side || nc >= side {
                    None
                } else {
                    Some((nr as u16, nc as u16))
                }
            })
        })
    }

    /// Recomputes every cell's neighboring-ship count after a placement
    /// change. The grid is small enough that a full pass beats tracking
    /// incremental deltas through lift-and-restore.
    fn recompute_adjacency(&mut self) {
        let side = self.ruleset.board_size as u16;
        for r in 0..side {
            for c in 0..side {
                let count = self
                    .neighbors(r, c)
                    .filter(|&(nr, nc)| self.cell(nr, nc).ship.is_some())
                    .count() as u8;
                self.cell_mut(r, c).adjacency = count;
            }
        }
    }
}

// =========================================================================
// Tests
// =========================================================================
