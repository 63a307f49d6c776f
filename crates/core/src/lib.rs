//! Hierarchical S2-cell geospatial places cache and search engine.
//!
//! This crate has no transport and no session concept; it answers one
//! question: "what places are near this region, using the cache where
//! possible", and exposes the pieces (`cache`, `fetcher`, `s2geo`,
//! `covering`) so `nearby-server` can wire them into a per-client streaming
//! dispatcher.

pub mod cache;
pub mod config;
pub mod covering;
pub mod error;
pub mod fetcher;
pub mod s2geo;
pub mod search;

pub mod prelude {
    pub use crate::cache::{CacheLookup, MemoryPlacesCache, PlacesCache};
    pub use crate::config::SearchConfig;
    pub use crate::error::{CacheError, SearchError, UpstreamError};
    pub use crate::fetcher::{MockUpstreamFetcher, NullUpstreamFetcher, UpstreamFetcher};
    pub use crate::search::{
        CancellationFlag, NeverCancelled, NullSink, SearchEngine, SearchSink,
    };
    pub use crate::search::Cancellation;
    pub use nearby_types::{Cell, CellBounds, Place, SearchRegion};
}
