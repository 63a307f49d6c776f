//! Per-client session state machine (spec §4.6).
//!
//! One `Session` is created per connected client. It owns the request
//! supersession counter and the currently-running worker's cancellation
//! handle, generalizing the teacher's background-writer/reader split
//! (`crates/server/src/writer.rs`, `reader.rs`) into a push-streaming
//! session: instead of one long-lived writer thread, each `location_update`
//! spawns a fresh worker that streams results back until superseded,
//! completed, or cancelled.

use async_trait::async_trait;
use nearby::prelude::{CancellationFlag, Cancellation, SearchEngine, SearchSink};
use nearby::cache::PlacesCache;
use nearby::fetcher::UpstreamFetcher;
use nearby_protocol::{ClientMessage, ServerMessage, WirePlace};
use nearby_types::Place;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Minimum cooperative yield after each emitted `places_update` (spec
/// §4.6: "yield cooperatively for >= 10 ms").
const EMIT_YIELD: Duration = Duration::from_millis(10);

/// A `SearchSink` that forwards batches to the session's outbound channel
/// as `ServerMessage::PlacesUpdate`, then yields before the next emit.
struct SessionSink {
    outbound: mpsc::Sender<ServerMessage>,
}

#[async_trait]
impl SearchSink for SessionSink {
    async fn emit(&self, places: &[Place]) {
        if places.is_empty() {
            return;
        }
        let wire_places: Vec<WirePlace> = places.iter().map(WirePlace::from).collect();
        if self
            .outbound
            .send(ServerMessage::PlacesUpdate { places: wire_places })
            .await
            .is_err()
        {
            // Outbound channel closed: client disconnected mid-stream.
            return;
        }
        tokio::time::sleep(EMIT_YIELD).await;
    }
}

/// Per-session state: which request is currently running, and the handle
/// to cancel/join it.
pub struct Session<C, F> {
    engine: Arc<SearchEngine<C, F>>,
    active_request_id: Arc<AtomicU64>,
    active_worker: Mutex<Option<(CancellationFlag, JoinHandle<()>)>>,
    outbound: mpsc::Sender<ServerMessage>,
}

impl<C, F> Session<C, F>
where
    C: PlacesCache + 'static,
    F: UpstreamFetcher + 'static,
{
    pub fn new(engine: Arc<SearchEngine<C, F>>, outbound: mpsc::Sender<ServerMessage>) -> Self {
        Self {
            engine,
            active_request_id: Arc::new(AtomicU64::new(0)),
            active_worker: Mutex::new(None),
            outbound,
        }
    }

    /// Idle -> Running(R) / Running(R) -> Running(R+1) (spec §4.6).
    /// Cancels and replaces whatever worker was previously running.
    pub async fn handle_location_update(&self, message: ClientMessage) {
        let request_id = self.active_request_id.fetch_add(1, Ordering::SeqCst) + 1;
        let region = message.to_region();

        let mut slot = self.active_worker.lock().await;
        if let Some((cancellation, handle)) = slot.take() {
            cancellation.cancel();
            handle.abort();
        }

        let engine = self.engine.clone();
        let outbound = self.outbound.clone();
        let active_request_id = self.active_request_id.clone();
        let cancellation = CancellationFlag::new();
        let worker_cancellation = cancellation.clone();

        let handle = tokio::spawn(async move {
            run_request(
                engine,
                region,
                request_id,
                active_request_id,
                outbound,
                worker_cancellation,
            )
            .await;
        });

        *slot = Some((cancellation, handle));
    }

    /// Any -> disconnect (spec §4.6): cancel the running worker and drop
    /// all session state.
    pub async fn disconnect(&self) {
        let mut slot = self.active_worker.lock().await;
        if let Some((cancellation, handle)) = slot.take() {
            cancellation.cancel();
            handle.abort();
        }
        debug!("session disconnected, workers cancelled");
    }
}

async fn run_request<C, F>(
    engine: Arc<SearchEngine<C, F>>,
    region: nearby_types::SearchRegion,
    request_id: u64,
    active_request_id: Arc<AtomicU64>,
    outbound: mpsc::Sender<ServerMessage>,
    cancellation: CancellationFlag,
) where
    C: PlacesCache + 'static,
    F: UpstreamFetcher + 'static,
{
    let sink = SessionSink {
        outbound: outbound.clone(),
    };

    let result = engine.search_streaming(&region, &sink, &cancellation).await;

    // Running(R) -> on worker completion/exception (spec §4.6): only emit a
    // terminal message if this request hasn't been superseded.
    if active_request_id.load(Ordering::SeqCst) != request_id {
        return;
    }

    match result {
        Ok(places) => {
            info!(request_id, count = places.len(), "search completed");
            let _ = outbound
                .send(ServerMessage::PlacesComplete {
                    total: places.len() as u32,
                })
                .await;
        }
        Err(e) => {
            warn!(request_id, error = %e, "search failed");
            let _ = outbound
                .send(ServerMessage::Error {
                    message: e.to_string(),
                })
                .await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nearby::cache::MemoryPlacesCache;
    use nearby::fetcher::MockUpstreamFetcher;
    use nearby::prelude::SearchConfig;
    use nearby_types::Place;

    fn engine() -> Arc<SearchEngine<MemoryPlacesCache, MockUpstreamFetcher>> {
        let place = Place::new("Cafe", 38.826589169752516, -77.30255757609915, "VA", "22030", vec![])
            .unwrap();
        Arc::new(SearchEngine::new(
            Arc::new(MemoryPlacesCache::new()),
            Arc::new(MockUpstreamFetcher::new(vec![place])),
            SearchConfig::default().with_max_recursion_level(11),
        ))
    }

    #[tokio::test]
    async fn location_update_eventually_emits_places_complete() {
        let (tx, mut rx) = mpsc::channel(64);
        let session = Session::new(engine(), tx);

        session
            .handle_location_update(ClientMessage::LocationUpdate {
                lat: Some(38.826589169752516),
                lon: Some(-77.30255757609915),
                radius: Some(300.0),
            })
            .await;

        let mut saw_complete = false;
        for _ in 0..50 {
            match tokio::time::timeout(Duration::from_millis(200), rx.recv()).await {
                Ok(Some(ServerMessage::PlacesComplete { .. })) => {
                    saw_complete = true;
                    break;
                }
                Ok(Some(_)) => continue,
                _ => break,
            }
        }
        assert!(saw_complete, "expected a places_complete message");
    }

    #[tokio::test]
    async fn second_location_update_supersedes_the_first() {
        let (tx, mut rx) = mpsc::channel(64);
        let session = Session::new(engine(), tx);

        session
            .handle_location_update(ClientMessage::LocationUpdate {
                lat: Some(38.826589169752516),
                lon: Some(-77.30255757609915),
                radius: Some(300.0),
            })
            .await;
        session
            .handle_location_update(ClientMessage::LocationUpdate {
                lat: Some(38.826589169752516),
                lon: Some(-77.30255757609915),
                radius: Some(300.0),
            })
            .await;

        let mut completions = 0;
        while let Ok(Some(msg)) = tokio::time::timeout(Duration::from_millis(200), rx.recv()).await
        {
            if matches!(msg, ServerMessage::PlacesComplete { .. }) {
                completions += 1;
            }
        }
        // The first request was superseded before it could emit a terminal
        // message; only the second (R+1) should complete.
        assert_eq!(completions, 1);
    }
}
