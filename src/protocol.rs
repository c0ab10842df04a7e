//! Binary wire framing, little-endian throughout.
//!
//! Three frame shapes cross the socket:
//!
//! - color push (server to a newly connected socket): one byte, the color
//!   bound to the caller (1 Black, 2 White); spectators receive no push.
//! - board snapshot (server to all sockets): byte 0 is the turn byte with
//!   the pass flag in the top bit, bytes 1..5 the prisoner counts as two
//!   u16s, byte 5 the board dimension, then one byte per cell in row-major
//!   order (color in the low bits, scoring mark in the upper two).
//! - move frame (client to server): claimed color byte followed by a u16
//!   target index; an index at or past the board area encodes a pass. In
//!   the scoring phase the same shape is a mark toggle.

use crate::board::{Board, Color};

/// Bytes preceding the cell data in a snapshot.
pub const SNAPSHOT_HEADER: usize = 6;

/// Length of a client move/mark frame.
pub const MOVE_FRAME_LEN: usize = 3;

/// Top bit of the turn byte: set when the previous half-move was a pass.
pub const PASS_FLAG: u8 = 0x80;

/// Single-byte push telling a socket which color it plays.
pub fn color_frame(color: Color) -> Vec<u8> {
    vec![color.to_byte()]
}

/// Serializes the canonical board snapshot.
pub fn snapshot(board: &Board) -> Vec<u8> {
    let mut out = Vec::with_capacity(SNAPSHOT_HEADER + board.area());
    let pass = if board.pass_pending() { PASS_FLAG } else { 0 };
    out.push(board.phase().to_byte() | pass);
    out.extend_from_slice(&board.prisoners().black.to_le_bytes());
    out.extend_from_slice(&board.prisoners().white.to_le_bytes());
    out.push(board.lines() as u8);
    out.extend(board.cells().iter().map(|cell| cell.to_byte()));
    out
}

/// A decoded client move or mark frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveFrame {
    /// Color byte as claimed by the client.
    pub color: u8,
    /// Target cell index; at or past the board area means pass.
    pub pos: u16,
}

/// Decodes a client frame, or `None` when the shape is wrong.
pub fn decode_move(bytes: &[u8]) -> Option<MoveFrame> {
    if bytes.len() != MOVE_FRAME_LEN {
        return None;
    }
    Some(MoveFrame {
        color: bytes[0],
        pos: u16::from_le_bytes([bytes[1], bytes[2]]),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{BoardSize, Phase};
    use crate::rules;

    #[test]
    fn snapshot_layout_matches_the_wire_contract() {
        let mut board = Board::new(BoardSize::Nine);
        rules::play(&mut board, 40, Color::Black).unwrap();
        let bytes = snapshot(&board);
        assert_eq!(bytes.len(), SNAPSHOT_HEADER + 81);
        assert_eq!(bytes[0], 2); // white to move, no pass pending
        assert_eq!(u16::from_le_bytes([bytes[1], bytes[2]]), 0);
        assert_eq!(u16::from_le_bytes([bytes[3], bytes[4]]), 0);
        assert_eq!(bytes[5], 9);
        assert_eq!(bytes[SNAPSHOT_HEADER + 40], 1);
    }

    #[test]
    fn snapshot_sets_pass_flag_and_scoring_turn() {
        let mut board = Board::new(BoardSize::Nine);
        rules::play(&mut board, 100, Color::Black).unwrap();
        assert_eq!(snapshot(&board)[0], PASS_FLAG | 2);
        rules::play(&mut board, 100, Color::White).unwrap();
        assert_eq!(board.phase(), Phase::Scoring);
        assert_eq!(snapshot(&board)[0], 3);
    }

    #[test]
    fn move_frame_roundtrip_and_shape_check() {
        assert_eq!(
            decode_move(&[1, 0x28, 0x00]),
            Some(MoveFrame { color: 1, pos: 40 })
        );
        assert_eq!(
            decode_move(&[2, 0x01, 0x02]),
            Some(MoveFrame {
                color: 2,
                pos: 0x0201
            })
        );
        assert_eq!(decode_move(&[1, 2]), None);
        assert_eq!(decode_move(&[]), None);
        assert_eq!(decode_move(&[1, 2, 3, 4]), None);
    }

    #[test]
    fn prisoner_counts_serialize_little_endian() {
        let mut board = Board::new(BoardSize::Nine);
        board.prisoners.black = 0x0102;
        board.prisoners.white = 3;
        let bytes = snapshot(&board);
        assert_eq!(bytes[1], 0x02);
        assert_eq!(bytes[2], 0x01);
        assert_eq!(bytes[3], 3);
        assert_eq!(bytes[4], 0);
    }
}
