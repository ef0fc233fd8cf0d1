// Chain and cycle detection
//
// A chain is a run of two-sided cells linked through their open sides, the
// corridors that hand a whole sequence of boxes to whoever opens them. A
// cycle is a chain whose cells have all reached three sides.

use log::debug;
use std::collections::HashSet;
use std::time::{Duration, Instant};

use crate::board::Board;
use crate::types::{Coord, Move};

/// Cells of one chain in traversal order
pub type Chain = Vec<Coord>;

/// Wall-clock budget measured from the moment it was created
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    start: Instant,
    budget: Duration,
}

impl Deadline {
    /// Budget counted from `start` rather than from now
    pub fn starting_at(start: Instant, budget_ms: u64) -> Self {
        Deadline {
            start,
            budget: Duration::from_millis(budget_ms),
        }
    }

    pub fn after_ms(budget_ms: u64) -> Self {
        Deadline::starting_at(Instant::now(), budget_ms)
    }

    pub fn expired(&self) -> bool {
        self.start.elapsed() > self.budget
    }
}

/// Outcome of one depth-first walk
#[derive(Debug)]
struct Traversal {
    completed: bool,
    chain: Chain,
}

/// Shared state for one detection pass
///
/// `stop` is polled before each row and on entry to each cell.
struct Walker<'a, F: FnMut() -> bool> {
    board: &'a Board,
    stop: F,
    visited: HashSet<Coord>,
}

impl<'a, F: FnMut() -> bool> Walker<'a, F> {
    fn new(board: &'a Board, stop: F) -> Self {
        Walker {
            board,
            stop,
            visited: HashSet::new(),
        }
    }

    fn out_of_time(&mut self) -> bool {
        (self.stop)()
    }

    fn is_seed(&self, coord: Coord) -> bool {
        self.board.lines_at(coord) == 2 && !self.visited.contains(&coord)
    }

    fn walk(&mut self, start: Coord) -> Traversal {
        let mut chain = Vec::new();
        let completed = self.visit(start, &mut chain);
        Traversal { completed, chain }
    }

    /// Returns false when the deadline cut the walk short
    fn visit(&mut self, coord: Coord, chain: &mut Chain) -> bool {
        if self.out_of_time() {
            return false;
        }

        self.visited.insert(coord);
        chain.push(coord);

        let cell = match self.board.cell(coord) {
            Some(cell) => cell,
            None => return true,
        };

        for side in cell.open_sides() {
            if let Some(next) = coord.step(side, self.board.size()) {
                if self.is_seed(next) && !self.visit(next, chain) {
                    return false;
                }
            }
        }
        true
    }

    fn run(mut self, min_len: usize) -> Vec<Chain> {
        let mut chains = Vec::new();
        let size = self.board.size();

        'rows: for row in 0..size {
            if self.out_of_time() {
                break;
            }
            for col in 0..size {
                let coord = Coord::new(row, col);
                if !self.is_seed(coord) {
                    continue;
                }

                let traversal = self.walk(coord);
                if !traversal.completed {
                    debug!(
                        "Chain detection out of time at ({}, {}); dropped {} partial cells",
                        row, col, traversal.chain.len()
                    );
                    break 'rows;
                }
                if traversal.chain.len() >= min_len {
                    chains.push(traversal.chain);
                }
            }
        }

        chains
    }
}

/// Finds every chain of at least `min_len` cells
pub fn find_chains(board: &Board, min_len: usize) -> Vec<Chain> {
    Walker::new(board, || false).run(min_len)
}

/// Like `find_chains`, but gives up once `deadline` passes.
/// Chains whose walk was interrupted are never returned.
pub fn find_chains_within(board: &Board, min_len: usize, deadline: Deadline) -> Vec<Chain> {
    Walker::new(board, move || deadline.expired()).run(min_len)
}

/// True when every cell of a non-empty chain has exactly three lines
pub fn is_cycle(chain: &[Coord], board: &Board) -> bool {
    !chain.is_empty() && chain.iter().all(|&coord| board.lines_at(coord) == 3)
}

/// The sacrifice move: first unfilled side along the chain
pub fn close_cycle(board: &Board, chain: &[Coord]) -> Option<Move> {
    chain.iter().find_map(|&coord| {
        let cell = board.cell(coord)?;
        let side = cell.open_sides().next()?;
        Some(Move::at(coord, side))
    })
}

/// A move that lengthens a chain into a cell with fewer than two lines
pub fn extend_chain(board: &Board, chains: &[Chain]) -> Option<Move> {
    let size = board.size();
    for chain in chains {
        for &coord in chain {
            let cell = match board.cell(coord) {
                Some(cell) => cell,
                None => continue,
            };
            for side in cell.open_sides() {
                if let Some(next) = coord.step(side, size) {
                    if board.lines_at(next) < 2 {
                        return Some(Move::at(coord, side));
                    }
                }
            }
        }
    }
    None
}

/// Number of cells one side away from capture
pub fn cycle_opportunity(board: &Board) -> usize {
    board.iter().filter(|(_, cell)| cell.lines() == 3).count()
}

/// Open cells with at least two lines, and all open cells
pub fn developed_cells(board: &Board) -> (usize, usize) {
    board
        .iter()
        .filter(|(_, cell)| cell.is_open())
        .fold((0, 0), |(developed, total), (_, cell)| {
            if cell.lines() >= 2 {
                (developed + 1, total + 1)
            } else {
                (developed, total + 1)
            }
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Cell, PlayerTag, Side};

    const TB: u8 = 0b0101; // top + bottom
    const LR: u8 = 0b1010; // right + left

    fn open(mask: u8) -> Cell {
        Cell::Open { mask }
    }

    /// Row 0 holds a horizontal corridor of three cells leading into a one-line cell
    fn corridor_board() -> Board {
        Board::from_rows(vec![
            vec![open(TB), open(TB), open(TB), open(0b0001)],
            vec![open(0b0001), open(0b0001), open(0b0001), open(0)],
            vec![open(0), open(0), open(0), open(0)],
            vec![open(0), open(0), open(0), open(0)],
        ])
        .unwrap()
    }

    #[test]
    fn test_empty_board_has_no_chains() {
        let board = Board::new(2);
        assert!(find_chains(&board, 3).is_empty());
        assert_eq!(cycle_opportunity(&board), 0);
    }

    #[test]
    fn test_corridor_is_one_chain_in_traversal_order() {
        let board = corridor_board();
        let chains = find_chains(&board, 3);
        assert_eq!(chains, vec![vec![Coord::new(0, 0), Coord::new(0, 1), Coord::new(0, 2)]]);
        assert!(!is_cycle(&chains[0], &board));
    }

    #[test]
    fn test_short_runs_are_discarded() {
        let board = Board::from_rows(vec![
            vec![open(TB), open(TB), open(0)],
            vec![open(0), open(0), open(0)],
            vec![open(0), open(0), open(0)],
        ])
        .unwrap();
        assert!(find_chains(&board, 3).is_empty());
        assert_eq!(find_chains(&board, 2).len(), 1);
    }

    #[test]
    fn test_chain_follows_only_open_sides() {
        // Column 0 cells are two-sided but closed off from each other vertically
        let board = Board::from_rows(vec![
            vec![open(TB), open(0), open(0)],
            vec![open(TB), open(0), open(0)],
            vec![open(TB), open(0), open(0)],
        ])
        .unwrap();
        assert!(find_chains(&board, 2).is_empty());

        let vertical = Board::from_rows(vec![
            vec![open(LR), open(0), open(0)],
            vec![open(LR), open(0), open(0)],
            vec![open(LR), open(0), open(0)],
        ])
        .unwrap();
        assert_eq!(find_chains(&vertical, 3).len(), 1);
    }

    #[test]
    fn test_extend_chain_targets_low_degree_neighbour() {
        let board = corridor_board();
        let chains = find_chains(&board, 3);
        assert_eq!(extend_chain(&board, &chains), Some(Move::new(0, 2, Side::Right)));
    }

    #[test]
    fn test_extend_chain_none_when_neighbours_developed() {
        let board = Board::from_rows(vec![
            vec![open(TB), open(TB), open(TB)],
            vec![open(0b0001), open(0b0001), open(0b0001)],
            vec![open(0), open(0), open(0)],
        ])
        .unwrap();
        let chains = find_chains(&board, 3);
        assert_eq!(chains.len(), 1);
        assert_eq!(extend_chain(&board, &chains), None);
    }

    #[test]
    fn test_cycle_detection_and_sacrifice_move() {
        // Each cell has three sides; the missing one points along the loop
        let board = Board::from_rows(vec![
            vec![open(0b1101), open(0b0111)],
            vec![open(0b1011), open(0b1110)],
        ])
        .unwrap();
        let chain = vec![Coord::new(0, 0), Coord::new(0, 1), Coord::new(1, 1), Coord::new(1, 0)];

        assert!(is_cycle(&chain, &board));
        assert_eq!(close_cycle(&board, &chain), Some(Move::new(0, 0, Side::Right)));
        assert_eq!(cycle_opportunity(&board), 4);
    }

    #[test]
    fn test_is_cycle_needs_every_cell_at_three() {
        let board = Board::from_rows(vec![
            vec![open(0b1101), open(0b0101)],
            vec![open(0b1011), open(0b1110)],
        ])
        .unwrap();
        let chain = vec![Coord::new(0, 0), Coord::new(0, 1), Coord::new(1, 1), Coord::new(1, 0)];
        assert!(!is_cycle(&chain, &board));
        assert!(!is_cycle(&[], &board));
    }

    #[test]
    fn test_close_cycle_none_when_all_full() {
        let board = Board::from_rows(vec![
            vec![Cell::Claimed { owner: PlayerTag::Red }, open(0b1111)],
            vec![open(0), open(0)],
        ])
        .unwrap();
        let chain = vec![Coord::new(0, 0), Coord::new(0, 1)];
        assert_eq!(close_cycle(&board, &chain), None);
    }

    #[test]
    fn test_expired_deadline_returns_no_partial_chains() {
        let board = corridor_board();
        let deadline = Deadline::after_ms(0);
        std::thread::sleep(Duration::from_millis(2));
        assert!(find_chains_within(&board, 3, deadline).is_empty());
    }

    /// Corridor on row 0 and a second corridor on row 3, both leading into one-line cells
    fn two_corridor_board() -> Board {
        Board::from_rows(vec![
            vec![open(TB), open(TB), open(TB), open(0b0001)],
            vec![open(0b0001), open(0b0001), open(0b0001), open(0)],
            vec![open(0b0100), open(0b0100), open(0b0100), open(0)],
            vec![open(TB), open(TB), open(TB), open(0b0100)],
        ])
        .unwrap()
    }

    #[test]
    fn test_interrupted_walk_drops_its_partial_chain() {
        let board = two_corridor_board();
        let row0 = vec![Coord::new(0, 0), Coord::new(0, 1), Coord::new(0, 2)];
        let row3 = vec![Coord::new(3, 0), Coord::new(3, 1), Coord::new(3, 2)];
        assert_eq!(find_chains(&board, 1), vec![row0.clone(), row3]);

        // Checks 1-4: row 0 and its three cells; 5-7: rows 1-3;
        // 8-9: (3,0) and (3,1); the tenth check, entering (3,2), stops the walk
        let mut checks = 0;
        let chains = Walker::new(&board, || {
            checks += 1;
            checks > 9
        })
        .run(1);

        assert_eq!(chains, vec![row0]);
    }

    #[test]
    fn test_deadline_counts_from_its_start() {
        let start = Instant::now();
        std::thread::sleep(Duration::from_millis(5));
        assert!(Deadline::starting_at(start, 2).expired());
        assert!(!Deadline::starting_at(Instant::now(), 10_000).expired());
    }

    #[test]
    fn test_generous_deadline_matches_unbounded_detection() {
        let board = corridor_board();
        let bounded = find_chains_within(&board, 3, Deadline::after_ms(10_000));
        assert_eq!(bounded, find_chains(&board, 3));
    }

    #[test]
    fn test_developed_cells_skips_claimed() {
        let board = Board::from_rows(vec![
            vec![Cell::Claimed { owner: PlayerTag::Blue }, open(TB)],
            vec![open(0b0111), open(0)],
        ])
        .unwrap();
        assert_eq!(developed_cells(&board), (2, 3));
    }
}
