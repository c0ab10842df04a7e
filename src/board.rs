//! Board representation for a single Go match.
//!
//! The board is a typed record rather than a raw byte buffer: cell states,
//! the phase, the pass flag and prisoner counts all live in their own
//! fields. Translation to the binary wire layout happens in
//! [`crate::protocol`], nowhere else.

use serde::{Deserialize, Serialize};

/// Stone color of one of the two players.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Color {
    /// Black plays first.
    Black,
    /// White plays second.
    White,
}

impl Color {
    /// Returns the opposing color.
    pub fn opponent(self) -> Self {
        match self {
            Color::Black => Color::White,
            Color::White => Color::Black,
        }
    }

    /// Wire encoding of this color (Black = 1, White = 2).
    pub fn to_byte(self) -> u8 {
        match self {
            Color::Black => 1,
            Color::White => 2,
        }
    }

    /// Decodes a wire color byte. Zero (empty/spectator) and anything
    /// above two decode to `None`.
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            1 => Some(Color::Black),
            2 => Some(Color::White),
            _ => None,
        }
    }
}

/// Lifecycle phase of the game on the board.
///
/// "Over" is not a board phase: an expired match is deleted outright by its
/// session actor rather than lingering in a terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    /// Normal play, with the color to move next.
    Playing(Color),
    /// Two consecutive passes have ended play; players mark dead stones
    /// and territory.
    Scoring,
}

impl Phase {
    /// Wire encoding of the turn byte (Black = 1, White = 2, Scoring = 3).
    pub fn to_byte(self) -> u8 {
        match self {
            Phase::Playing(color) => color.to_byte(),
            Phase::Scoring => 3,
        }
    }
}

/// One intersection on the board.
///
/// `mark` is only ever set during the scoring phase, where it records which
/// side claims the cell: over a stone it means "dead, prisoner of the
/// marking color", over an empty cell "territory of the marking color".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    /// Stone occupying the cell, if any.
    pub stone: Option<Color>,
    /// Scoring-phase claim on the cell, if any.
    pub mark: Option<Color>,
}

impl Cell {
    fn color_byte(stone: Option<Color>) -> u8 {
        stone.map(Color::to_byte).unwrap_or(0)
    }

    /// Wire encoding: color in the low bits, mark shifted into the upper
    /// two bits.
    pub fn to_byte(self) -> u8 {
        Self::color_byte(self.stone) | (Self::color_byte(self.mark) << 2)
    }
}

/// Result of looking up a position on the board.
///
/// Out-of-board is a distinct sentinel in the lookup result, never a cell
/// state: it is not a valid move target and never belongs to a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Point {
    /// In-board cell with no stone.
    Empty,
    /// In-board cell holding a stone.
    Stone(Color),
    /// Position outside the board.
    OffBoard,
}

/// One of the four adjacency directions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Toward row zero.
    Up,
    /// Toward the end of the row.
    Right,
    /// Toward the last row.
    Down,
    /// Toward the start of the row.
    Left,
}

impl Direction {
    /// All four directions, in scan order.
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Right,
        Direction::Down,
        Direction::Left,
    ];

    /// Returns the opposite direction.
    pub fn opposite(self) -> Self {
        match self {
            Direction::Up => Direction::Down,
            Direction::Right => Direction::Left,
            Direction::Down => Direction::Up,
            Direction::Left => Direction::Right,
        }
    }
}

/// Supported board dimensions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum BoardSize {
    /// 9x9 board.
    Nine,
    /// 13x13 board.
    Thirteen,
    /// 19x19 board.
    #[default]
    Nineteen,
}

impl BoardSize {
    /// Number of lines on each side.
    pub fn lines(self) -> usize {
        match self {
            BoardSize::Nine => 9,
            BoardSize::Thirteen => 13,
            BoardSize::Nineteen => 19,
        }
    }

    /// Parses a size request from the client, e.g. the `s` query
    /// parameter. Absent or unrecognized values fall back to 19x19.
    pub fn from_request(request: Option<&str>) -> Self {
        match request {
            Some("9") => BoardSize::Nine,
            Some("13") => BoardSize::Thirteen,
            _ => BoardSize::Nineteen,
        }
    }
}

/// Prisoners credited to each side.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prisoners {
    /// Stones captured by Black.
    pub black: u16,
    /// Stones captured by White.
    pub white: u16,
}

/// The board of one match: cells in row-major order plus header metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    pub(crate) lines: usize,
    pub(crate) cells: Vec<Cell>,
    pub(crate) phase: Phase,
    pub(crate) pass_pending: bool,
    pub(crate) prisoners: Prisoners,
}

impl Board {
    /// Creates an empty board with Black to move.
    pub fn new(size: BoardSize) -> Self {
        let lines = size.lines();
        Self {
            lines,
            cells: vec![Cell::default(); lines * lines],
            phase: Phase::Playing(Color::Black),
            pass_pending: false,
            prisoners: Prisoners::default(),
        }
    }

    /// Board dimension (lines per side).
    pub fn lines(&self) -> usize {
        self.lines
    }

    /// Total number of cells.
    pub fn area(&self) -> usize {
        self.cells.len()
    }

    /// Current phase.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// True if the immediately preceding half-move was a pass.
    pub fn pass_pending(&self) -> bool {
        self.pass_pending
    }

    /// Prisoner counts.
    pub fn prisoners(&self) -> Prisoners {
        self.prisoners
    }

    /// All cells in row-major order.
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Looks up the state at `idx`, yielding the off-board sentinel for any
    /// index outside the board.
    pub fn point(&self, idx: usize) -> Point {
        match self.cells.get(idx) {
            Some(cell) => match cell.stone {
                Some(color) => Point::Stone(color),
                None => Point::Empty,
            },
            None => Point::OffBoard,
        }
    }

    /// Index of the neighbor of `idx` in `direction`, or `None` when the
    /// step would leave the board. Rows never wrap: stepping left from
    /// column zero or right from the last column is off-board.
    pub fn neighbor(&self, idx: usize, direction: Direction) -> Option<usize> {
        if idx >= self.area() {
            return None;
        }
        match direction {
            Direction::Up => idx.checked_sub(self.lines),
            Direction::Down => {
                let down = idx + self.lines;
                (down < self.area()).then_some(down)
            }
            Direction::Left => (idx % self.lines != 0).then(|| idx - 1),
            Direction::Right => (idx % self.lines != self.lines - 1).then(|| idx + 1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_board_is_empty_black_to_move() {
        let board = Board::new(BoardSize::Nine);
        assert_eq!(board.lines(), 9);
        assert_eq!(board.area(), 81);
        assert_eq!(board.phase(), Phase::Playing(Color::Black));
        assert!(!board.pass_pending());
        assert!(board.cells().iter().all(|c| *c == Cell::default()));
    }

    #[test]
    fn size_request_parsing_defaults_to_nineteen() {
        assert_eq!(BoardSize::from_request(Some("9")), BoardSize::Nine);
        assert_eq!(BoardSize::from_request(Some("13")), BoardSize::Thirteen);
        assert_eq!(BoardSize::from_request(Some("19")), BoardSize::Nineteen);
        assert_eq!(BoardSize::from_request(Some("42")), BoardSize::Nineteen);
        assert_eq!(BoardSize::from_request(None), BoardSize::Nineteen);
    }

    #[test]
    fn neighbor_never_wraps_rows() {
        let board = Board::new(BoardSize::Nine);
        // Column zero has no left neighbor, last column no right neighbor.
        assert_eq!(board.neighbor(9, Direction::Left), None);
        assert_eq!(board.neighbor(8, Direction::Right), None);
        assert_eq!(board.neighbor(0, Direction::Up), None);
        assert_eq!(board.neighbor(80, Direction::Down), None);
        assert_eq!(board.neighbor(40, Direction::Up), Some(31));
        assert_eq!(board.neighbor(40, Direction::Right), Some(41));
    }

    #[test]
    fn off_board_lookup_is_a_distinct_sentinel() {
        let board = Board::new(BoardSize::Nine);
        assert_eq!(board.point(81), Point::OffBoard);
        assert_eq!(board.point(usize::MAX), Point::OffBoard);
        assert_eq!(board.point(0), Point::Empty);
    }

    #[test]
    fn cell_byte_packs_mark_in_upper_bits() {
        let cell = Cell {
            stone: Some(Color::White),
            mark: Some(Color::Black),
        };
        assert_eq!(cell.to_byte(), 2 | (1 << 2));
        assert_eq!(Cell::default().to_byte(), 0);
    }
}
