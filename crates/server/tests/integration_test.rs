//! End-to-end scenarios D, E, F from the hierarchical search spec, driven
//! directly against `SearchEngine`/`Session` rather than over a live
//! socket, following the teacher's `tests/basic_test.rs` shape of spinning
//! up the real server-side pieces and asserting on what they emit.

use async_trait::async_trait;
use nearby::cache::MemoryPlacesCache;
use nearby::error::UpstreamError;
use nearby::prelude::{SearchConfig, SearchEngine};
use nearby_protocol::{ClientMessage, ServerMessage};
use nearby_server::Session;
use nearby_types::{Cell, Place, SearchRegion};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

/// Counts how many times the upstream was actually hit, to verify scenario
/// D's "call 2's upstream-invocation count = 0" claim.
#[derive(Default)]
struct CountingFetcher {
    places: Vec<Place>,
    calls: AtomicUsize,
}

impl CountingFetcher {
    fn new(places: Vec<Place>) -> Self {
        Self {
            places,
            calls: AtomicUsize::new(0),
        }
    }

    fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl nearby::fetcher::UpstreamFetcher for CountingFetcher {
    async fn fetch_places_for_cell(&self, _cell: &Cell) -> Result<Vec<Place>, UpstreamError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.places.clone())
    }
}

const GMU_LAT: f64 = 38.826589169752516;
const GMU_LON: f64 = -77.30255757609915;

/// Scenario D: two sequential searches over the same region return the
/// same places, and the second hits the upstream zero times.
#[tokio::test]
async fn caching_idempotence() {
    let place = Place::new("Cafe", GMU_LAT, GMU_LON, "VA", "22030", vec![]).unwrap();
    let cache = Arc::new(MemoryPlacesCache::new());
    let fetcher = Arc::new(CountingFetcher::new(vec![place]));
    let config = SearchConfig::default().with_max_recursion_level(11);
    let engine = SearchEngine::new(cache, fetcher.clone(), config);

    let region = SearchRegion::new(GMU_LAT, GMU_LON, 300.0);
    let first = engine.search(&region).await.unwrap();
    let calls_after_first = fetcher.call_count();
    assert!(calls_after_first > 0);

    let second = engine.search(&region).await.unwrap();
    assert_eq!(first, second);
    assert_eq!(fetcher.call_count(), calls_after_first, "second search must not touch upstream");
}

/// Scenario F: a 1000 m region with two stub places at 500 m and 1500 m
/// from center returns only the nearer one.
#[tokio::test]
async fn filter_correctness() {
    let near = Place::new("Near Cafe", 38.8311, GMU_LON, "VA", "22030", vec![]).unwrap();
    let far = Place::new("Far Diner", 38.8401, GMU_LON, "VA", "22030", vec![]).unwrap();

    let cache = Arc::new(MemoryPlacesCache::new());
    let fetcher = Arc::new(CountingFetcher::new(vec![near.clone(), far]));
    let config = SearchConfig::default().with_max_recursion_level(11);
    let engine = SearchEngine::new(cache, fetcher, config);

    let region = SearchRegion::new(GMU_LAT, GMU_LON, 1000.0);
    let results = engine.search(&region).await.unwrap();

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].name, near.name);
}

/// Scenario E: a second `location_update` 10 ms after the first supersedes
/// it. No `places_update` for the first region should arrive after the
/// first `places_update` for the second, and exactly one `places_complete`
/// should be observed, for the second region.
#[tokio::test]
async fn supersession_cancels_the_stale_request() {
    let place_a = Place::new("Old Town Spot", 38.83, -77.31, "VA", "22030", vec![]).unwrap();
    let place_b = Place::new("GMU Spot", 38.90, -77.03, "DC", "20001", vec![]).unwrap();

    let cache = Arc::new(MemoryPlacesCache::new());
    let fetcher = Arc::new(CountingFetcher::new(vec![place_a, place_b]));
    let config = SearchConfig::default().with_max_recursion_level(11);
    let engine = Arc::new(SearchEngine::new(cache, fetcher, config));

    let (tx, mut rx) = mpsc::channel(256);
    let session = Session::new(engine, tx);

    session
        .handle_location_update(ClientMessage::LocationUpdate {
            lat: Some(38.83),
            lon: Some(-77.31),
            radius: Some(300.0),
        })
        .await;

    tokio::time::sleep(Duration::from_millis(10)).await;

    session
        .handle_location_update(ClientMessage::LocationUpdate {
            lat: Some(38.90),
            lon: Some(-77.03),
            radius: Some(300.0),
        })
        .await;

    let mut completions = 0;
    let mut saw_second_update = false;
    while let Ok(Some(msg)) = tokio::time::timeout(Duration::from_millis(300), rx.recv()).await {
        match msg {
            ServerMessage::PlacesUpdate { .. } => {
                saw_second_update = true;
            }
            ServerMessage::PlacesComplete { .. } => {
                completions += 1;
            }
            ServerMessage::Error { message } => panic!("unexpected error: {message}"),
        }
    }

    assert_eq!(completions, 1, "only the superseding request should complete");
    assert!(saw_second_update, "expected at least one update from the surviving request");
}
