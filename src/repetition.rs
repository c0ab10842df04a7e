//! Positional-superko detection.
//!
//! The tracker records a digest of every board position reached by an
//! accepted non-pass move and flags any move that reproduces an earlier
//! whole-board stone layout, for either side. Digests are bucketed by live
//! stone count: placements and captures change the count, so only
//! same-count positions can ever collide.

use crate::board::{Board, Cell};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Content-hash function over the live-stone bytes of a board.
pub type DigestFn = fn(&[u8]) -> u64;

/// Default digest: CRC32 over the stone bytes.
pub fn crc32_digest(bytes: &[u8]) -> u64 {
    u64::from(crc32fast::hash(bytes))
}

fn default_digest() -> DigestFn {
    crc32_digest
}

/// Per-match history of previously seen board positions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepetitionTracker {
    #[serde(skip, default = "default_digest")]
    digest: DigestFn,
    seen: HashMap<u32, Vec<u64>>,
}

impl Default for RepetitionTracker {
    fn default() -> Self {
        Self::new(crc32_digest)
    }
}

impl RepetitionTracker {
    /// Creates a tracker using the given content-hash function.
    pub fn new(digest: DigestFn) -> Self {
        Self {
            digest,
            seen: HashMap::new(),
        }
    }

    /// Records the board if its stone layout is new and returns `true`;
    /// returns `false` when the exact layout was seen before. The digest
    /// covers only stone colors: marks and header metadata are excluded.
    pub fn check(&mut self, board: &Board) -> bool {
        let mut bytes = Vec::with_capacity(board.area());
        let mut stones = 0u32;
        for cell in board.cells() {
            let byte = Cell {
                stone: cell.stone,
                mark: None,
            }
            .to_byte();
            if byte != 0 {
                stones += 1;
            }
            bytes.push(byte);
        }

        let digest = (self.digest)(&bytes);
        let bucket = self.seen.entry(stones).or_default();
        if bucket.contains(&digest) {
            return false;
        }
        bucket.push(digest);
        true
    }
}
