// Board representation and the board adapter seam
//
// The engine only reads cells directly; listing legal moves, cloning and
// applying moves all go through a `BoardAdapter`. `GridAdapter` is the
// standard implementation used by the match host, the binaries and the tests.

use serde::{Deserialize, Serialize};

use crate::types::{Cell, Coord, Move, PlayerTag, Side, FULL_MASK};

/// N×N matrix of cells, stored row-major
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct Board {
    size: usize,
    cells: Vec<Cell>,
}

impl Board {
    /// Creates an empty `size`×`size` board
    pub fn new(size: usize) -> Self {
        Board {
            size,
            cells: vec![Cell::empty(); size * size],
        }
    }

    /// Builds a board from rows of cells
    ///
    /// Shared edges are taken as given; keeping them consistent is up to the caller.
    pub fn from_rows(rows: Vec<Vec<Cell>>) -> Result<Self, String> {
        let size = rows.len();
        if let Some((index, row)) = rows.iter().enumerate().find(|(_, row)| row.len() != size) {
            return Err(format!(
                "Board must be square: row {} has {} cells, expected {}",
                index,
                row.len(),
                size
            ));
        }

        Ok(Board {
            size,
            cells: rows.into_iter().flatten().collect(),
        })
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn cell(&self, coord: Coord) -> Option<Cell> {
        self.index(coord).map(|i| self.cells[i])
    }

    pub fn cell_mut(&mut self, coord: Coord) -> Option<&mut Cell> {
        self.index(coord).map(move |i| &mut self.cells[i])
    }

    /// Line count at `coord`; out-of-range coordinates read as claimed
    pub fn lines_at(&self, coord: Coord) -> u8 {
        self.cell(coord).map_or(crate::types::CLAIMED_LINES, |cell| cell.lines())
    }

    /// Iterates over all cells with their coordinates, row-major
    pub fn iter(&self) -> impl Iterator<Item = (Coord, Cell)> + '_ {
        let size = self.size;
        self.cells
            .iter()
            .enumerate()
            .map(move |(i, cell)| (Coord::new(i / size, i % size), *cell))
    }

    /// Number of cells owned by `player`
    pub fn score(&self, player: PlayerTag) -> usize {
        self.cells
            .iter()
            .filter(|cell| cell.owner() == Some(player))
            .count()
    }

    /// Checks that the cell storage matches the declared size
    pub fn validate(&self) -> Result<(), String> {
        if self.cells.len() != self.size * self.size {
            return Err(format!(
                "Board declares size {} but holds {} cells",
                self.size,
                self.cells.len()
            ));
        }
        Ok(())
    }

    /// True once every cell has been claimed
    pub fn is_complete(&self) -> bool {
        self.cells.iter().all(|cell| !cell.is_open())
    }

    fn index(&self, coord: Coord) -> Option<usize> {
        if coord.row < self.size && coord.col < self.size {
            Some(coord.row * self.size + coord.col)
        } else {
            None
        }
    }
}

/// Operations the engine consumes from the game rules
pub trait BoardAdapter {
    /// All currently legal moves, in a stable order
    fn valid_moves(&self, board: &Board) -> Vec<Move>;

    /// Deep copy, independent of the original
    fn clone_board(&self, board: &Board) -> Board {
        board.clone()
    }

    /// Applies `mv` in place for `owner`, returning how many cells it claimed
    fn apply_move(&self, board: &mut Board, mv: Move, owner: PlayerTag) -> usize;
}

/// Standard rules: one side per move, shared edges set on both cells,
/// a cell is claimed by whoever fills its fourth side
#[derive(Debug, Clone, Copy, Default)]
pub struct GridAdapter;

impl GridAdapter {
    /// Sets `side` on the cell at `coord`; returns true if that claimed it
    fn fill_side(board: &mut Board, coord: Coord, side: Side, owner: PlayerTag) -> bool {
        let cell = match board.cell_mut(coord) {
            Some(cell) => cell,
            None => return false,
        };

        if let Cell::Open { mask } = *cell {
            let filled = mask | side.bit();
            if filled & FULL_MASK == FULL_MASK {
                *cell = Cell::Claimed { owner };
                return true;
            }
            *cell = Cell::Open { mask: filled };
        }
        false
    }
}

impl BoardAdapter for GridAdapter {
    /// Every unset side of every open cell, row-major then side order.
    /// A shared edge is listed from both of its cells; either spelling claims it.
    fn valid_moves(&self, board: &Board) -> Vec<Move> {
        board
            .iter()
            .flat_map(|(coord, cell)| {
                cell.open_sides()
                    .map(move |side| Move::at(coord, side))
                    .collect::<Vec<_>>()
            })
            .collect()
    }

    fn apply_move(&self, board: &mut Board, mv: Move, owner: PlayerTag) -> usize {
        let coord = mv.coord();
        match board.cell(coord) {
            Some(cell) if !cell.has_side(mv.side) => {}
            _ => return 0,
        }

        let mut claimed = 0;
        if Self::fill_side(board, coord, mv.side, owner) {
            claimed += 1;
        }
        if let Some(neighbour) = coord.step(mv.side, board.size()) {
            if Self::fill_side(board, neighbour, mv.side.opposite(), owner) {
                claimed += 1;
            }
        }
        claimed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_board_lists_every_side() {
        let board = Board::new(2);
        let moves = GridAdapter.valid_moves(&board);
        assert_eq!(moves.len(), 16);
        assert_eq!(moves[0], Move::new(0, 0, Side::Top));
        assert_eq!(moves[15], Move::new(1, 1, Side::Left));
    }

    #[test]
    fn test_shared_edge_is_set_on_both_cells() {
        let mut board = Board::new(2);
        let claimed =
            GridAdapter.apply_move(&mut board, Move::new(0, 0, Side::Right), PlayerTag::Red);

        assert_eq!(claimed, 0);
        assert_eq!(board.cell(Coord::new(0, 0)), Some(Cell::Open { mask: Side::Right.bit() }));
        assert_eq!(board.cell(Coord::new(0, 1)), Some(Cell::Open { mask: Side::Left.bit() }));
        assert_eq!(GridAdapter.valid_moves(&board).len(), 14);
    }

    #[test]
    fn test_boundary_edge_touches_one_cell() {
        let mut board = Board::new(2);
        GridAdapter.apply_move(&mut board, Move::new(0, 0, Side::Top), PlayerTag::Red);

        assert_eq!(board.lines_at(Coord::new(0, 0)), 1);
        assert_eq!(board.lines_at(Coord::new(0, 1)), 0);
        assert_eq!(board.lines_at(Coord::new(1, 0)), 0);
    }

    #[test]
    fn test_fourth_side_claims_cell() {
        let mut board = Board::new(1);
        for side in [Side::Top, Side::Right, Side::Bottom] {
            let mv = Move::new(0, 0, side);
            assert_eq!(GridAdapter.apply_move(&mut board, mv, PlayerTag::Blue), 0);
        }
        let claimed =
            GridAdapter.apply_move(&mut board, Move::new(0, 0, Side::Left), PlayerTag::Blue);

        assert_eq!(claimed, 1);
        assert_eq!(board.cell(Coord::new(0, 0)), Some(Cell::Claimed { owner: PlayerTag::Blue }));
        assert!(board.is_complete());
        assert!(GridAdapter.valid_moves(&board).is_empty());
    }

    #[test]
    fn test_shared_edge_can_claim_two_cells() {
        // Top row: two cells each missing only the edge between them
        let mut board = Board::from_rows(vec![
            vec![Cell::Open { mask: 0b1101 }, Cell::Open { mask: 0b0111 }],
            vec![Cell::Open { mask: 0b0001 }, Cell::Open { mask: 0b0001 }],
        ])
        .unwrap();

        let claimed =
            GridAdapter.apply_move(&mut board, Move::new(0, 0, Side::Right), PlayerTag::Red);
        assert_eq!(claimed, 2);
        assert_eq!(board.score(PlayerTag::Red), 2);
    }

    #[test]
    fn test_applying_filled_side_is_noop() {
        let mut board = Board::new(2);
        GridAdapter.apply_move(&mut board, Move::new(0, 0, Side::Right), PlayerTag::Red);
        let before = board.clone();

        let claimed =
            GridAdapter.apply_move(&mut board, Move::new(0, 1, Side::Left), PlayerTag::Blue);
        assert_eq!(claimed, 0);
        assert_eq!(board, before);
    }

    #[test]
    fn test_clone_is_independent() {
        let board = Board::new(2);
        let mut copy = GridAdapter.clone_board(&board);
        GridAdapter.apply_move(&mut copy, Move::new(1, 1, Side::Bottom), PlayerTag::Red);

        assert_eq!(board.lines_at(Coord::new(1, 1)), 0);
        assert_eq!(copy.lines_at(Coord::new(1, 1)), 1);
    }

    #[test]
    fn test_from_rows_rejects_ragged_input() {
        let result =
            Board::from_rows(vec![vec![Cell::empty(), Cell::empty()], vec![Cell::empty()]]);
        assert!(result.is_err());
    }
}
