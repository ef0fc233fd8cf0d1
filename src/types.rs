// Core game types: player tags, cells, sides, coordinates and moves
// Shared by the board adapter, the evaluator, the detectors and the search

use serde::{Deserialize, Serialize};
use std::fmt;

/// Line count reported for a claimed cell, so claimed boxes never look actionable
pub const CLAIMED_LINES: u8 = 4;

/// Mask with all four sides filled
pub const FULL_MASK: u8 = 0b1111;

/// The two players of a match
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum PlayerTag {
    Red,
    Blue,
}

impl PlayerTag {
    /// Returns the other player
    pub fn opponent(self) -> PlayerTag {
        match self {
            PlayerTag::Red => PlayerTag::Blue,
            PlayerTag::Blue => PlayerTag::Red,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PlayerTag::Red => "red",
            PlayerTag::Blue => "blue",
        }
    }
}

impl fmt::Display for PlayerTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One of the four sides of a cell
/// Bit `index()` of a cell mask is this side
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Top,
    Right,
    Bottom,
    Left,
}

impl Side {
    /// Returns all sides in mask-bit order
    pub fn all() -> [Side; 4] {
        [Side::Top, Side::Right, Side::Bottom, Side::Left]
    }

    pub fn index(self) -> u8 {
        match self {
            Side::Top => 0,
            Side::Right => 1,
            Side::Bottom => 2,
            Side::Left => 3,
        }
    }

    pub fn from_index(index: u8) -> Option<Side> {
        match index {
            0 => Some(Side::Top),
            1 => Some(Side::Right),
            2 => Some(Side::Bottom),
            3 => Some(Side::Left),
            _ => None,
        }
    }

    /// Mask bit for this side
    pub fn bit(self) -> u8 {
        1 << self.index()
    }

    /// The same edge seen from the neighbouring cell
    pub fn opposite(self) -> Side {
        match self {
            Side::Top => Side::Bottom,
            Side::Right => Side::Left,
            Side::Bottom => Side::Top,
            Side::Left => Side::Right,
        }
    }

    /// Row/column offset of the neighbour across this side
    pub fn offset(self) -> (isize, isize) {
        match self {
            Side::Top => (-1, 0),
            Side::Right => (0, 1),
            Side::Bottom => (1, 0),
            Side::Left => (0, -1),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Top => "top",
            Side::Right => "right",
            Side::Bottom => "bottom",
            Side::Left => "left",
        }
    }
}

/// A box of the grid: open with a filled-edge mask, or claimed by a player
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum Cell {
    Open { mask: u8 },
    Claimed { owner: PlayerTag },
}

impl Cell {
    /// An open cell with no filled sides
    pub fn empty() -> Cell {
        Cell::Open { mask: 0 }
    }

    /// Number of filled edges; claimed cells report `CLAIMED_LINES`
    pub fn lines(&self) -> u8 {
        match *self {
            Cell::Open { mask } => (mask & FULL_MASK).count_ones() as u8,
            Cell::Claimed { .. } => CLAIMED_LINES,
        }
    }

    /// Whether the given side is filled (always true once claimed)
    pub fn has_side(&self, side: Side) -> bool {
        match *self {
            Cell::Open { mask } => mask & side.bit() != 0,
            Cell::Claimed { .. } => true,
        }
    }

    pub fn is_open(&self) -> bool {
        matches!(self, Cell::Open { .. })
    }

    pub fn owner(&self) -> Option<PlayerTag> {
        match *self {
            Cell::Open { .. } => None,
            Cell::Claimed { owner } => Some(owner),
        }
    }

    /// Unfilled sides in mask-bit order
    pub fn open_sides(&self) -> impl Iterator<Item = Side> + '_ {
        Side::all().into_iter().filter(move |side| !self.has_side(*side))
    }
}

/// Grid coordinate of a cell
#[derive(Deserialize, Serialize, Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub struct Coord {
    pub row: usize,
    pub col: usize,
}

impl Coord {
    pub fn new(row: usize, col: usize) -> Self {
        Coord { row, col }
    }

    /// Neighbour across `side`, if it lies on an `size`×`size` board
    pub fn step(&self, side: Side, size: usize) -> Option<Coord> {
        let (dr, dc) = side.offset();
        let row = self.row.checked_add_signed(dr)?;
        let col = self.col.checked_add_signed(dc)?;
        if row < size && col < size {
            Some(Coord { row, col })
        } else {
            None
        }
    }
}

/// Claim of one side of one cell
#[derive(Deserialize, Serialize, Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub struct Move {
    pub row: usize,
    pub col: usize,
    pub side: Side,
}

impl Move {
    pub fn new(row: usize, col: usize, side: Side) -> Self {
        Move { row, col, side }
    }

    pub fn at(coord: Coord, side: Side) -> Self {
        Move {
            row: coord.row,
            col: coord.col,
            side,
        }
    }

    pub fn coord(&self) -> Coord {
        Coord::new(self.row, self.col)
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.row, self.col, self.side.as_str())
    }
}
