//! HTTP/WebSocket transport adapter.
//!
//! Thin glue in front of the match actors: serve the client page at `/`,
//! upgrade `/play` to a WebSocket, route the connection to the actor for
//! the requested match name, and pump binary frames both ways. All game
//! semantics live behind [`MatchRegistry`].

use crate::board::{BoardSize, Color};
use crate::ident::IdGenerator;
use crate::session::{MatchEvent, MatchHandle, MatchRegistry, PlayerId, SocketId};
use axum::Router;
use axum::extract::ws::{CloseFrame, Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::sync::mpsc;
use tracing::{debug, instrument, warn};

/// Longest accepted match identifier; anything longer is not found.
pub const MAX_MATCH_NAME_LEN: usize = 32;

const INDEX_HTML: &str = include_str!("../assets/index.html");

/// Shared state handed to every request handler.
#[derive(Clone)]
pub struct AppState {
    /// Match-name to actor resolver.
    pub registry: MatchRegistry,
    /// Generator for socket ids and anonymous player ids.
    pub ids: IdGenerator,
}

/// Builds the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/play", get(play))
        .with_state(state)
}

async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

/// Query parameters of a `/play` connection, as sent by the client page.
#[derive(Debug, Deserialize)]
struct PlayParams {
    /// Match name.
    g: Option<String>,
    /// Player identity.
    p: Option<String>,
    /// Requested color (`b` or `w`).
    c: Option<String>,
    /// Requested board size (`9`, `13`, `19`).
    s: Option<String>,
}

fn match_name_ok(name: &str) -> bool {
    !name.is_empty() && name.len() <= MAX_MATCH_NAME_LEN
}

#[instrument(skip(state, ws))]
async fn play(
    State(state): State<AppState>,
    Query(params): Query<PlayParams>,
    ws: WebSocketUpgrade,
) -> Response {
    let name = params.g.unwrap_or_default();
    if !match_name_ok(&name) {
        debug!(len = name.len(), "match name rejected");
        return (StatusCode::NOT_FOUND, "Not found").into_response();
    }

    let player: PlayerId = params.p.unwrap_or_else(|| state.ids.generate());
    let color_pref = match params.c.as_deref() {
        Some("b") => Some(Color::Black),
        Some("w") => Some(Color::White),
        _ => None,
    };
    let size = BoardSize::from_request(params.s.as_deref());
    let socket_id: SocketId = state.ids.generate();
    let handle = state.registry.resolve(&name);

    ws.on_upgrade(move |socket| {
        client_session(socket, handle, socket_id, player, color_pref, size)
    })
}

/// Pumps one WebSocket: registers with the match actor, forwards its
/// broadcasts to the peer, and feeds inbound binary frames into the inbox.
async fn client_session(
    socket: WebSocket,
    handle: MatchHandle,
    socket_id: SocketId,
    player: PlayerId,
    color_pref: Option<Color>,
    size: BoardSize,
) {
    let (mut sink, mut stream) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<Vec<u8>>();

    let connected = handle
        .deliver(MatchEvent::Connect {
            socket: socket_id.clone(),
            player,
            color_pref,
            size,
            tx,
        })
        .await;
    if !connected {
        // The actor expired between resolution and delivery; the session
        // never got going, so the failure is surfaced explicitly.
        warn!(socket = %socket_id, "match actor gone during session setup");
        let _ = sink
            .send(Message::Text("{\"error\":\"session setup failed\"}".into()))
            .await;
        let _ = sink
            .send(Message::Close(Some(CloseFrame {
                code: 1011,
                reason: "session setup failure".into(),
            })))
            .await;
        return;
    }

    // Outbound: actor broadcasts end when the actor drops our sender.
    tokio::spawn(async move {
        while let Some(frame) = rx.recv().await {
            if sink.send(Message::Binary(frame.into())).await.is_err() {
                break;
            }
        }
        let _ = sink.send(Message::Close(None)).await;
    });

    while let Some(Ok(message)) = stream.next().await {
        match message {
            Message::Binary(bytes) => {
                let delivered = handle
                    .deliver(MatchEvent::Frame {
                        socket: socket_id.clone(),
                        bytes: bytes.to_vec(),
                    })
                    .await;
                if !delivered {
                    break;
                }
            }
            Message::Close(_) => break,
            // Text frames are not part of the protocol; pings are answered
            // by the library.
            _ => {}
        }
    }

    let _ = handle.deliver(MatchEvent::Disconnect { socket: socket_id }).await;
}
