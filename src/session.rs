//! Per-match session actors.
//!
//! Each match id owns exactly one actor task fed by an ordered channel, so
//! all connects, frames and timer events for a match are processed to
//! completion one at a time, persistence included. The original hosting
//! runtime guaranteed this serialization implicitly; here it is explicit:
//! one tokio task per match, one mpsc inbox, no shared board state.
//!
//! Independent matches run fully in parallel.

use crate::board::{Board, BoardSize, Color, Phase};
use crate::protocol;
use crate::repetition::RepetitionTracker;
use crate::rules::{self, PlayOutcome};
use crate::storage::{Storage, StorageError};
use derive_getters::Getters;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, info, instrument, warn};

/// Opaque caller-chosen match identifier.
pub type MatchName = String;

/// Stable identity of a player across reconnects.
pub type PlayerId = String;

/// Identifier of one connected socket.
pub type SocketId = String;

/// One half-move in the log; `pos` at or past the board area is a pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, derive_new::new)]
pub struct MoveRecord {
    /// Color that moved.
    pub color: Color,
    /// Target cell index.
    pub pos: u16,
}

/// Everything persisted for one match.
#[derive(Debug, Clone, Serialize, Deserialize, Getters)]
pub struct MatchState {
    board: Board,
    repetition: RepetitionTracker,
    black: Option<PlayerId>,
    white: Option<PlayerId>,
    move_log: Vec<MoveRecord>,
}

impl MatchState {
    /// Creates a fresh match with an empty board of the given size.
    pub fn new(size: BoardSize) -> Self {
        Self {
            board: Board::new(size),
            repetition: RepetitionTracker::default(),
            black: None,
            white: None,
            move_log: Vec::new(),
        }
    }

    /// Resolves the color a player plays, binding a free slot first-come:
    /// the requested color if free, otherwise the other free slot,
    /// otherwise spectator (`None`). Returns the color and whether a slot
    /// was newly bound.
    fn resolve_color(&mut self, player: &str, preference: Option<Color>) -> (Option<Color>, bool) {
        if self.black.as_deref() == Some(player) {
            return (Some(Color::Black), false);
        }
        if self.white.as_deref() == Some(player) {
            return (Some(Color::White), false);
        }
        let slot = match preference {
            Some(Color::Black) if self.black.is_none() => Some(Color::Black),
            Some(Color::White) if self.white.is_none() => Some(Color::White),
            _ if self.black.is_none() => Some(Color::Black),
            _ if self.white.is_none() => Some(Color::White),
            _ => None,
        };
        match slot {
            Some(Color::Black) => self.black = Some(player.to_owned()),
            Some(Color::White) => self.white = Some(player.to_owned()),
            None => {}
        }
        (slot, slot.is_some())
    }
}

/// Inbound events delivered to a match actor, in order.
#[derive(Debug)]
pub enum MatchEvent {
    /// A socket joined the match.
    Connect {
        /// Socket identifier, unique per connection.
        socket: SocketId,
        /// Stable player identity.
        player: PlayerId,
        /// Requested color, honored when the slot is free.
        color_pref: Option<Color>,
        /// Requested board size, used only when the match is created.
        size: BoardSize,
        /// Outbound byte-frame channel for this socket.
        tx: mpsc::UnboundedSender<Vec<u8>>,
    },
    /// A binary frame arrived from a socket.
    Frame {
        /// Originating socket.
        socket: SocketId,
        /// Raw frame bytes.
        bytes: Vec<u8>,
    },
    /// A socket went away.
    Disconnect {
        /// Socket that closed.
        socket: SocketId,
    },
}

/// Cloneable sender side of a match actor's inbox.
#[derive(Debug, Clone)]
pub struct MatchHandle {
    tx: mpsc::Sender<MatchEvent>,
}

impl MatchHandle {
    /// Queues an event for the actor. Returns `false` when the actor has
    /// already expired.
    pub async fn deliver(&self, event: MatchEvent) -> bool {
        self.tx.send(event).await.is_ok()
    }

    fn is_live(&self) -> bool {
        !self.tx.is_closed()
    }
}

type HandleMap = Arc<Mutex<HashMap<MatchName, MatchHandle>>>;

fn lock_handles(map: &HandleMap) -> MutexGuard<'_, HashMap<MatchName, MatchHandle>> {
    match map.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

/// Maps match names to their running actors, spawning on first contact.
#[derive(Clone)]
pub struct MatchRegistry {
    handles: HandleMap,
    storage: Arc<dyn Storage>,
    idle_window: Duration,
}

impl MatchRegistry {
    /// Creates a registry over the given store. `idle_window` is how long a
    /// match survives without an accepted mutation before being destroyed.
    pub fn new(storage: Arc<dyn Storage>, idle_window: Duration) -> Self {
        Self {
            handles: Arc::new(Mutex::new(HashMap::new())),
            storage,
            idle_window,
        }
    }

    /// Resolves a match name to its actor, spawning one (and loading any
    /// persisted state) when none is running.
    #[instrument(skip(self))]
    pub fn resolve(&self, name: &str) -> MatchHandle {
        let mut handles = lock_handles(&self.handles);
        if let Some(handle) = handles.get(name) {
            if handle.is_live() {
                return handle.clone();
            }
        }
        info!(name, "spawning match actor");
        let (tx, rx) = mpsc::channel(32);
        let handle = MatchHandle { tx };
        handles.insert(name.to_owned(), handle.clone());
        let actor = MatchActor {
            name: name.to_owned(),
            state: None,
            sockets: HashMap::new(),
            storage: Arc::clone(&self.storage),
            registry: Arc::clone(&self.handles),
            idle_window: self.idle_window,
            deadline: Instant::now() + self.idle_window,
        };
        tokio::spawn(actor.run(rx));
        handle
    }
}

struct Subscriber {
    tx: mpsc::UnboundedSender<Vec<u8>>,
    color: Option<Color>,
}

/// Single-writer owner of one match's board, tracker and sockets.
struct MatchActor {
    name: MatchName,
    state: Option<MatchState>,
    sockets: HashMap<SocketId, Subscriber>,
    storage: Arc<dyn Storage>,
    registry: HandleMap,
    idle_window: Duration,
    deadline: Instant,
}

impl MatchActor {
    async fn run(mut self, mut rx: mpsc::Receiver<MatchEvent>) {
        self.state = self.load().await;
        loop {
            tokio::select! {
                event = rx.recv() => match event {
                    Some(event) => {
                        if let Err(err) = self.handle(event).await {
                            // A failed write is isolated to this match; the
                            // actor keeps serving the in-memory state.
                            warn!(name = %self.name, %err, "persistence failure");
                        }
                    }
                    None => break,
                },
                _ = tokio::time::sleep_until(self.deadline) => {
                    self.expire().await;
                    break;
                }
            }
        }
    }

    async fn load(&self) -> Option<MatchState> {
        match self.storage.get(&self.name).await {
            Ok(Some(bytes)) => match serde_json::from_slice(&bytes) {
                Ok(state) => {
                    info!(name = %self.name, "resumed persisted match");
                    Some(state)
                }
                Err(err) => {
                    warn!(name = %self.name, %err, "discarding unreadable match state");
                    None
                }
            },
            Ok(None) => None,
            Err(err) => {
                warn!(name = %self.name, %err, "failed to load match state");
                None
            }
        }
    }

    async fn handle(&mut self, event: MatchEvent) -> Result<(), StorageError> {
        match event {
            MatchEvent::Connect {
                socket,
                player,
                color_pref,
                size,
                tx,
            } => {
                self.handle_connect(socket, player, color_pref, size, tx)
                    .await
            }
            MatchEvent::Frame { socket, bytes } => self.handle_frame(socket, bytes).await,
            MatchEvent::Disconnect { socket } => {
                debug!(name = %self.name, socket, "socket disconnected");
                self.sockets.remove(&socket);
                Ok(())
            }
        }
    }

    #[instrument(skip(self, tx), fields(name = %self.name))]
    async fn handle_connect(
        &mut self,
        socket: SocketId,
        player: PlayerId,
        color_pref: Option<Color>,
        size: BoardSize,
        tx: mpsc::UnboundedSender<Vec<u8>>,
    ) -> Result<(), StorageError> {
        let mut dirty = self.state.is_none();
        let state = self.state.get_or_insert_with(|| MatchState::new(size));
        let (color, newly_bound) = state.resolve_color(&player, color_pref);
        dirty |= newly_bound;

        info!(?color, created = dirty, "socket joined match");

        if dirty {
            self.persist().await?;
        }
        if let Some(color) = color {
            let _ = tx.send(protocol::color_frame(color));
        }
        if let Some(state) = self.state.as_ref() {
            let _ = tx.send(protocol::snapshot(&state.board));
        }
        self.sockets.insert(socket, Subscriber { tx, color });
        Ok(())
    }

    #[instrument(skip(self, bytes), fields(name = %self.name))]
    async fn handle_frame(&mut self, socket: SocketId, bytes: Vec<u8>) -> Result<(), StorageError> {
        let Some(frame) = protocol::decode_move(&bytes) else {
            debug!(len = bytes.len(), "malformed frame dropped");
            return Ok(());
        };
        let Some(color) = self.sockets.get(&socket).and_then(|sub| sub.color) else {
            debug!("frame from spectator or unknown socket dropped");
            return Ok(());
        };
        let Some(state) = self.state.as_mut() else {
            return Ok(());
        };

        let pos = frame.pos as usize;
        match state.board.phase() {
            Phase::Scoring => {
                let changed = rules::mark(&mut state.board, pos, color);
                debug!(?changed, "mark toggled");
            }
            Phase::Playing(_) => {
                if Color::from_byte(frame.color & 3) != Some(color) {
                    debug!(claimed = frame.color, "claimed color mismatch, frame dropped");
                    return Ok(());
                }
                let before = state.board.clone();
                let outcome = match rules::play(&mut state.board, pos, color) {
                    Ok(outcome) => outcome,
                    Err(err) => {
                        debug!(%err, pos, "move rejected");
                        return Ok(());
                    }
                };
                // Passing cannot repeat a position, so only placements are
                // checked against the history.
                if matches!(outcome, PlayOutcome::Placed { .. })
                    && !state.repetition.check(&state.board)
                {
                    state.board = before;
                    debug!(pos, "positional repetition, move discarded");
                    return Ok(());
                }
                state.move_log.push(MoveRecord::new(color, frame.pos));
                info!(?color, pos, ?outcome, "move accepted");
            }
        }

        self.persist().await?;
        self.broadcast_snapshot();
        Ok(())
    }

    /// Writes the full match state, then rearms the idle timer. Every
    /// accepted mutation funnels through here.
    async fn persist(&mut self) -> Result<(), StorageError> {
        let Some(state) = self.state.as_ref() else {
            return Ok(());
        };
        let bytes = serde_json::to_vec(state)
            .map_err(|err| StorageError::new(format!("serialize match state: {}", err)))?;
        self.storage.put(&self.name, &bytes).await?;
        self.deadline = Instant::now() + self.idle_window;
        Ok(())
    }

    /// Best-effort fan-out of the canonical snapshot; dead subscribers are
    /// pruned without affecting the others.
    fn broadcast_snapshot(&mut self) {
        let Some(state) = self.state.as_ref() else {
            return;
        };
        let bytes = protocol::snapshot(&state.board);
        self.sockets.retain(|socket, sub| {
            if sub.tx.send(bytes.clone()).is_ok() {
                true
            } else {
                debug!(socket, "pruning dead subscriber");
                false
            }
        });
    }

    /// Idle timer fired: delete all persisted state and cease to exist.
    /// The next contact with this name starts a fresh match.
    async fn expire(&mut self) {
        info!(name = %self.name, "idle expiry, destroying match");
        if let Err(err) = self.storage.delete_all(&self.name).await {
            warn!(name = %self.name, %err, "failed to clear expired match");
        }
        self.sockets.clear();
        lock_handles(&self.registry).remove(&self.name);
    }
}
