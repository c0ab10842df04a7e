//! go2go - two remote players playing Go over persistent connections.
//!
//! Every match gets an authoritative referee: a single-writer session
//! actor owning the board, enforcing legality (captures, suicide, turn
//! order, passing, positional superko) and running the scoring phase in
//! which dead stones and territory are marked.
//!
//! # Architecture
//!
//! - **board / rules**: typed board model and the stateless rule engine
//! - **repetition**: positional-superko history, bucketed by stone count
//! - **session**: one actor task per match, serializing moves, persisting
//!   state, broadcasting snapshots and expiring idle matches
//! - **protocol**: the little-endian binary wire framing
//! - **server**: axum WebSocket transport routing match names to actors
//! - **storage / ident**: pluggable persistence and id generation

#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod board;
pub mod cli;
pub mod ident;
pub mod protocol;
pub mod repetition;
pub mod rules;
pub mod server;
pub mod session;
pub mod storage;

pub use board::{Board, BoardSize, Cell, Color, Direction, Phase, Point, Prisoners};
pub use repetition::RepetitionTracker;
pub use rules::{MoveError, PlayOutcome};
pub use session::{MatchEvent, MatchHandle, MatchRegistry, MatchState, MoveRecord};
pub use storage::{FileStore, MemoryStore, Storage, StorageError};
