//! Stateless rule engine: group extraction, liberties, move legality,
//! capture resolution, pass handling and scoring-phase marking.
//!
//! Every function here operates on a [`Board`] passed in by the caller and
//! performs no I/O. Rejected moves leave the board exactly as it was.

use crate::board::{Board, Color, Direction, Phase, Point};
use std::collections::HashSet;
use tracing::instrument;

/// Why a move was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum MoveError {
    /// The claimed color is not the color to move.
    #[display("not your turn")]
    NotYourTurn,
    /// The target cell already holds a stone.
    #[display("position already occupied")]
    Occupied,
    /// The move would leave the played group with no liberties while
    /// capturing nothing.
    #[display("suicide move")]
    Suicide,
}

/// What an accepted move did to the board.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayOutcome {
    /// A stone was placed; `captured` holds the opponent positions removed.
    Placed {
        /// Index the stone was placed at.
        pos: usize,
        /// Opponent positions cleared by the move.
        captured: HashSet<usize>,
    },
    /// The player passed; the turn flipped and the pass flag is now set.
    Passed,
    /// Second consecutive pass: play is over, the board entered scoring.
    ScoringStarted,
    /// The board was already in scoring, so the input toggled marks
    /// instead of placing a stone. `changed` lists the cells whose mark
    /// actually changed (possibly none).
    Marked {
        /// Cells whose mark changed, sorted ascending.
        changed: Vec<usize>,
    },
}

/// Flood fill over 4-adjacent cells sharing the stone state at `start`,
/// including empty regions. Marks never stop the traversal; only stone
/// color and the board edge do.
fn flood(board: &Board, start: usize) -> HashSet<usize> {
    let origin = match board.point(start) {
        Point::OffBoard => return HashSet::new(),
        Point::Empty => None,
        Point::Stone(color) => Some(color),
    };

    let mut visited = HashSet::new();
    let mut stack = vec![start];
    while let Some(pos) = stack.pop() {
        if !visited.insert(pos) {
            continue;
        }
        for direction in Direction::ALL {
            if let Some(next) = board.neighbor(pos, direction) {
                if board.cells[next].stone == origin && !visited.contains(&next) {
                    stack.push(next);
                }
            }
        }
    }
    visited
}

/// Maximal connected group of same-colored stones containing `start`.
/// Returns the empty set when `start` is empty or off-board.
pub fn group(board: &Board, start: usize) -> HashSet<usize> {
    match board.point(start) {
        Point::Stone(_) => flood(board, start),
        Point::Empty | Point::OffBoard => HashSet::new(),
    }
}

/// True iff no member of `group` touches an empty cell. Vacuously true for
/// the empty set; callers guard against passing a non-stone origin.
pub fn is_dead(board: &Board, group: &HashSet<usize>) -> bool {
    !group.iter().any(|&pos| {
        Direction::ALL.iter().any(|&direction| {
            board
                .neighbor(pos, direction)
                .is_some_and(|next| board.cells[next].stone.is_none())
        })
    })
}

/// Applies a move by `color` at `pos`, enforcing turn order, occupancy,
/// captures and the suicide law. A `pos` at or beyond the board area
/// encodes a pass; two consecutive passes end play.
///
/// In the scoring phase the move is reinterpreted as a mark toggle.
///
/// # Errors
///
/// [`MoveError`] on an illegal move; the board is untouched on rejection.
#[instrument(skip(board), fields(lines = board.lines()))]
pub fn play(board: &mut Board, pos: usize, color: Color) -> Result<PlayOutcome, MoveError> {
    if board.phase == Phase::Scoring {
        return Ok(PlayOutcome::Marked {
            changed: mark(board, pos, color),
        });
    }
    if board.phase != Phase::Playing(color) {
        return Err(MoveError::NotYourTurn);
    }

    if pos >= board.area() {
        if board.pass_pending {
            // Opponent passed last turn too: play is over.
            board.pass_pending = false;
            board.phase = Phase::Scoring;
            return Ok(PlayOutcome::ScoringStarted);
        }
        board.pass_pending = true;
        board.phase = Phase::Playing(color.opponent());
        return Ok(PlayOutcome::Passed);
    }

    if board.cells[pos].stone.is_some() {
        return Err(MoveError::Occupied);
    }

    // Tentative placement; reverted if the move turns out to be suicide.
    board.cells[pos].stone = Some(color);

    let opponent = color.opponent();
    let mut captured: HashSet<usize> = HashSet::new();
    let mut alive: HashSet<usize> = HashSet::new();
    for direction in Direction::ALL {
        let Some(next) = board.neighbor(pos, direction) else {
            continue;
        };
        if board.cells[next].stone != Some(opponent)
            || captured.contains(&next)
            || alive.contains(&next)
        {
            continue;
        }
        let adjacent = group(board, next);
        if is_dead(board, &adjacent) {
            captured.extend(adjacent);
        } else {
            alive.extend(adjacent);
        }
    }

    // Suicide is judged after capture resolution: removing a dead opponent
    // group can free liberties for the played stone.
    if captured.is_empty() && is_dead(board, &group(board, pos)) {
        board.cells[pos].stone = None;
        return Err(MoveError::Suicide);
    }

    for &taken in &captured {
        board.cells[taken].stone = None;
    }
    let count = captured.len() as u16;
    match color {
        Color::Black => board.prisoners.black += count,
        Color::White => board.prisoners.white += count,
    }

    board.pass_pending = false;
    board.phase = Phase::Playing(opponent);
    Ok(PlayOutcome::Placed { pos, captured })
}

/// Toggles a scoring mark across the group at `pos` on behalf of `color`.
///
/// A group already marked by the requester reverts to unmarked, as does a
/// live group of the requester's own stones (players cannot declare their
/// own stones dead; the attempt unmarks instead of erroring). Any other
/// group is stamped with the requester's claim. Returns the cells whose
/// mark changed, sorted ascending; an empty result is still an accepted
/// toggle.
#[instrument(skip(board), fields(lines = board.lines()))]
pub fn mark(board: &mut Board, pos: usize, color: Color) -> Vec<usize> {
    if pos >= board.area() {
        return Vec::new();
    }
    let cell = board.cells[pos];
    let new_mark = if cell.mark == Some(color) || cell.stone == Some(color) {
        None
    } else {
        Some(color)
    };

    let mut changed: Vec<usize> = flood(board, pos)
        .into_iter()
        .filter(|&member| board.cells[member].mark != new_mark)
        .collect();
    for &member in &changed {
        board.cells[member].mark = new_mark;
    }
    changed.sort_unstable();
    changed
}
