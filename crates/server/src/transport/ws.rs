//! Websocket transport: `GET /ws` upgrades to a per-connection `Session`
//! (spec §6). Grounded on the teacher's accept-loop shape
//! (`transport/rpc.rs::run_server`) generalized from a raw `TcpListener`
//! loop to an axum router, since the client/server protocol here is
//! message-oriented rather than request/response RPC.

use crate::session::Session;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use futures::{SinkExt, StreamExt};
use nearby::cache::PlacesCache;
use nearby::prelude::SearchEngine;
use nearby::fetcher::UpstreamFetcher;
use nearby_protocol::{decode_payload, encode_payload, ClientMessage, ServerMessage};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

#[derive(Clone)]
struct AppState<C, F> {
    engine: Arc<SearchEngine<C, F>>,
}

/// Bind `addr` and serve the websocket transport until `shutdown` resolves.
pub async fn run_server<C, F>(
    addr: SocketAddr,
    engine: Arc<SearchEngine<C, F>>,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> anyhow::Result<()>
where
    C: PlacesCache + 'static,
    F: UpstreamFetcher + 'static,
{
    let state = AppState { engine };
    let app = Router::new()
        .route("/ws", get(ws_handler::<C, F>))
        .with_state(state);

    info!("nearby-server listening on {addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    Ok(())
}

async fn ws_handler<C, F>(
    ws: WebSocketUpgrade,
    State(state): State<AppState<C, F>>,
) -> impl IntoResponse
where
    C: PlacesCache + 'static,
    F: UpstreamFetcher + 'static,
{
    ws.on_upgrade(move |socket| handle_socket(socket, state.engine))
}

async fn handle_socket<C, F>(socket: WebSocket, engine: Arc<SearchEngine<C, F>>)
where
    C: PlacesCache + 'static,
    F: UpstreamFetcher + 'static,
{
    let (mut sink, mut stream) = socket.split();
    let (outbound_tx, mut outbound_rx) = mpsc::channel::<ServerMessage>(64);

    let writer = tokio::spawn(async move {
        while let Some(message) = outbound_rx.recv().await {
            match encode_payload(&message) {
                Ok(bytes) => {
                    if sink.send(Message::Binary(bytes)).await.is_err() {
                        break;
                    }
                }
                Err(e) => {
                    error!("failed to encode outbound message: {e}");
                }
            }
        }
    });

    let session = Session::new(engine, outbound_tx);

    while let Some(frame) = stream.next().await {
        let frame = match frame {
            Ok(frame) => frame,
            Err(e) => {
                warn!("websocket read error: {e}");
                break;
            }
        };

        match frame {
            Message::Binary(bytes) => match decode_payload::<ClientMessage>(&bytes) {
                Ok(message) => session.handle_location_update(message).await,
                Err(e) => warn!("failed to decode client message: {e}"),
            },
            Message::Text(text) => match serde_json::from_str::<ClientMessage>(&text) {
                Ok(message) => session.handle_location_update(message).await,
                Err(e) => warn!("failed to decode client message: {e}"),
            },
            Message::Close(_) => break,
            _ => {}
        }
    }

    session.disconnect().await;
    writer.abort();
}
