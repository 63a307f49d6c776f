//! The hierarchical search engine (spec §4.3).
//!
//! Ties together the covering set, the recursive cell walk, the
//! single-flight cache writes, and the upstream fetcher into the one public
//! entry point: `SearchEngine::search`. The streaming variant additionally
//! takes a `SearchSink` and a `Cancellation` handle so a caller (the
//! dispatcher, in `nearby-server`) can observe partial results and abort a
//! superseded request.

use crate::cache::{self, CacheLookup, PlacesCache};
use crate::config::{SearchConfig, LOCK_POLL_INTERVAL, LOCK_POLL_TIMEOUT};
use crate::fetcher::UpstreamFetcher;
use crate::s2geo;
use crate::{covering, error::SearchError};
use async_trait::async_trait;
use nearby_types::{Cell, Place, SearchRegion};
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use log::warn;

/// Checked before each upstream fetch and before each emit (spec §4.6).
pub trait Cancellation: Send + Sync {
    fn is_cancelled(&self) -> bool;
}

/// Never reports cancelled; used by the non-streaming `search` entry point.
#[derive(Debug, Default)]
pub struct NeverCancelled;

impl Cancellation for NeverCancelled {
    fn is_cancelled(&self) -> bool {
        false
    }
}

/// Shareable, settable cancellation handle. The dispatcher hands one of
/// these to every worker it spawns and flips it when the session's
/// `active_request_id` moves on or the client disconnects.
#[derive(Debug, Default, Clone)]
pub struct CancellationFlag(Arc<AtomicBool>);

impl CancellationFlag {
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(false)))
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

impl Cancellation for CancellationFlag {
    fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Receives partial results as the walk resolves each cell (spec §4.3,
/// §4.6: "one streaming message per child").
#[async_trait]
pub trait SearchSink: Send + Sync {
    async fn emit(&self, places: &[Place]);
}

/// A sink that discards everything, for callers who only want the final
/// aggregate from `SearchEngine::search`.
#[derive(Debug, Default)]
pub struct NullSink;

#[async_trait]
impl SearchSink for NullSink {
    async fn emit(&self, _places: &[Place]) {}
}

/// The hierarchical places search engine: a cache, an upstream fetcher, and
/// the tunables from `SearchConfig`.
pub struct SearchEngine<C, F> {
    cache: Arc<C>,
    fetcher: Arc<F>,
    config: SearchConfig,
}

impl<C, F> SearchEngine<C, F>
where
    C: PlacesCache + 'static,
    F: UpstreamFetcher + 'static,
{
    pub fn new(cache: Arc<C>, fetcher: Arc<F>, config: SearchConfig) -> Self {
        Self {
            cache,
            fetcher,
            config,
        }
    }

    /// Entry point used by plain (non-streaming) callers: run the full
    /// search and return the distance-filtered result set (spec §4.3 step
    /// 4).
    pub async fn search(&self, region: &SearchRegion) -> Result<Vec<Place>, SearchError> {
        self.search_streaming(region, &NullSink, &NeverCancelled)
            .await
    }

    /// Streaming entry point: identical result, but `sink.emit` is called
    /// once per resolved child cell as the walk progresses, and the walk
    /// aborts early once `cancellation.is_cancelled()`.
    pub async fn search_streaming(
        &self,
        region: &SearchRegion,
        sink: &dyn SearchSink,
        cancellation: &dyn Cancellation,
    ) -> Result<Vec<Place>, SearchError> {
        if !region.radius_m.is_finite() || region.radius_m < 0.0 {
            return Err(SearchError::InvalidInput(
                "radius_m must be a non-negative finite number".to_string(),
            ));
        }

        let covering_set = covering::covering_set(region);

        let resolutions = futures::future::join_all(
            covering_set
                .iter()
                .map(|cell| self.resolve_covering_cell(cell, sink, cancellation)),
        )
        .await;

        let mut all = Vec::new();
        for (cell, places) in covering_set.iter().zip(resolutions.into_iter()) {
            if let Err(e) = self
                .cache
                .set(&cell.token, &places, self.config.places_ttl())
                .await
            {
                warn!("failed to cache covering-cell result for {}: {e}", cell.token);
            }
            all.extend(places);
        }

        Ok(all
            .into_iter()
            .filter(|p| {
                s2geo::haversine(region.lat, region.lon, p.lat, p.lon) <= region.radius_m
            })
            .collect())
    }

    /// Single-flight wrapper around `walk` for one covering cell (spec
    /// §4.4): read-through on the cell's own token first (this is what
    /// makes a repeated `search` over the same region a cache hit rather
    /// than a fresh walk), then acquire the cell's lease, walk, release. On
    /// contention, poll the cache instead of walking; after
    /// `LOCK_POLL_TIMEOUT` without a hit, give up waiting and walk anyway
    /// (last-write-wins).
    async fn resolve_covering_cell(
        &self,
        cell: &Cell,
        sink: &dyn SearchSink,
        cancellation: &dyn Cancellation,
    ) -> Vec<Place> {
        if let Ok(CacheLookup::Hit(places)) = self.cache.get(&cell.token).await {
            if !cancellation.is_cancelled() {
                sink.emit(&places).await;
            }
            return places;
        }

        let lock_key = cache::lock_key(&cell.token);

        match self.cache.acquire_lock(&lock_key, self.config.lock_ttl()).await {
            Ok(Some(lease)) => {
                let places = self.walk(cell, sink, cancellation).await;
                if let Err(e) = self.cache.release_lock(&lock_key, &lease).await {
                    warn!("failed to release cache lock for {}: {e}", cell.token);
                }
                places
            }
            Ok(None) => self.wait_for_lock_holder_or_walk(cell, sink, cancellation).await,
            Err(e) => {
                warn!("lock acquisition failed for {}, walking directly: {e}", cell.token);
                self.walk(cell, sink, cancellation).await
            }
        }
    }

    async fn wait_for_lock_holder_or_walk(
        &self,
        cell: &Cell,
        sink: &dyn SearchSink,
        cancellation: &dyn Cancellation,
    ) -> Vec<Place> {
        let deadline = Instant::now() + LOCK_POLL_TIMEOUT;
        loop {
            if let Ok(CacheLookup::Hit(places)) = self.cache.get(&cell.token).await {
                return places;
            }
            if Instant::now() >= deadline || cancellation.is_cancelled() {
                break;
            }
            tokio::time::sleep(LOCK_POLL_INTERVAL).await;
        }
        self.walk(cell, sink, cancellation).await
    }

    /// Recursive descent from `cell` down to `max_recursion_level` (spec
    /// §4.3). Boxed because `async fn` cannot recurse directly.
    fn walk<'a>(
        &'a self,
        cell: &'a Cell,
        sink: &'a dyn SearchSink,
        cancellation: &'a dyn Cancellation,
    ) -> Pin<Box<dyn Future<Output = Vec<Place>> + Send + 'a>> {
        Box::pin(async move {
            if cell.level >= self.config.max_recursion_level {
                return self.walk_leaf(cell, sink, cancellation).await;
            }

            let mut aggregate = Vec::new();
            for child in s2geo::children(cell) {
                if cancellation.is_cancelled() {
                    break;
                }

                let places = self.resolve_child(&child, sink, cancellation).await;
                aggregate.extend(places);
            }
            aggregate
        })
    }

    async fn walk_leaf(
        &self,
        cell: &Cell,
        sink: &dyn SearchSink,
        cancellation: &dyn Cancellation,
    ) -> Vec<Place> {
        if cancellation.is_cancelled() {
            return Vec::new();
        }

        let places = match self.fetcher.fetch_places_for_cell(cell).await {
            Ok(places) => places,
            Err(e) => {
                warn!("upstream fetch failed for {}, treating leaf as empty: {e}", cell.token);
                Vec::new()
            }
        };

        if !cancellation.is_cancelled() {
            sink.emit(&places).await;
        }
        places
    }

    /// Resolves one child cell. Only the cache-hit arm emits here: a miss
    /// or a corrupt entry recurses into `walk`/`walk_leaf`, which own the
    /// emit for whatever they resolve, so a place is never emitted once per
    /// ancestor level on the way back up (spec §4.3: emit on cache hit, or
    /// at the leaf; never on the recurse arm).
    async fn resolve_child(
        &self,
        child: &Cell,
        sink: &dyn SearchSink,
        cancellation: &dyn Cancellation,
    ) -> Vec<Place> {
        match self.cache.get(&child.token).await {
            Ok(CacheLookup::Hit(places)) => {
                if !cancellation.is_cancelled() {
                    sink.emit(&places).await;
                }
                places
            }
            Ok(CacheLookup::Miss) => self.recurse_and_cache(child, sink, cancellation).await,
            // Corrupt: treat as miss, but do not repopulate the broken
            // entry (spec §4.3 "On corrupted value").
            Ok(CacheLookup::Corrupt) => self.walk(child, sink, cancellation).await,
            Err(e) => {
                warn!("cache read failed for {}, treating as miss: {e}", child.token);
                self.recurse_and_cache(child, sink, cancellation).await
            }
        }
    }

    async fn recurse_and_cache(
        &self,
        child: &Cell,
        sink: &dyn SearchSink,
        cancellation: &dyn Cancellation,
    ) -> Vec<Place> {
        let places = self.walk(child, sink, cancellation).await;
        if let Err(e) = self
            .cache
            .set(&child.token, &places, self.config.places_ttl())
            .await
        {
            warn!("failed to cache child result for {}: {e}", child.token);
        }
        places
    }
}
