//! Upstream fetcher contract (spec §4.5).
//!
//! The engine never talks to a real places provider directly; it calls
//! through this trait so the provider can be swapped or mocked the way the
//! teacher's `StorageBackend` trait decouples the DB from its storage
//! engine.

use crate::error::UpstreamError;
use async_trait::async_trait;
use nearby_types::{Cell, Place};

/// A source of place records for a single S2 cell.
///
/// Implementations should treat a cell with no places as `Ok(vec![])`, not
/// an error; reserve `Err` for requests that failed outright (spec §4.5,
/// §7). The engine swallows every `Err` from this trait: it logs, emits no
/// places for that leaf, and continues the walk.
#[async_trait]
pub trait UpstreamFetcher: Send + Sync {
    async fn fetch_places_for_cell(&self, cell: &Cell) -> Result<Vec<Place>, UpstreamError>;
}

/// A fetcher with no configured upstream: every call fails with
/// `Unauthorized` (spec §6: "absent ⇒ fetcher returns an unauthorized
/// error"). This is the default wired in when no real provider is
/// configured, not a test double.
#[derive(Debug, Default)]
pub struct NullUpstreamFetcher;

#[async_trait]
impl UpstreamFetcher for NullUpstreamFetcher {
    async fn fetch_places_for_cell(&self, _cell: &Cell) -> Result<Vec<Place>, UpstreamError> {
        Err(UpstreamError::Unauthorized)
    }
}

/// A fetcher that returns a fixed set of places for every cell, used in
/// tests to drive the search engine without network I/O.
#[derive(Debug, Default, Clone)]
pub struct MockUpstreamFetcher {
    places: Vec<Place>,
}

impl MockUpstreamFetcher {
    pub fn new(places: Vec<Place>) -> Self {
        Self { places }
    }

    pub fn empty() -> Self {
        Self { places: Vec::new() }
    }
}

#[async_trait]
impl UpstreamFetcher for MockUpstreamFetcher {
    async fn fetch_places_for_cell(&self, _cell: &Cell) -> Result<Vec<Place>, UpstreamError> {
        Ok(self.places.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_cell() -> Cell {
        Cell::new(123, "abc".to_string(), 16, 38.9, -77.3)
    }

    #[tokio::test]
    async fn null_fetcher_is_always_unauthorized() {
        let fetcher = NullUpstreamFetcher;
        let err = fetcher.fetch_places_for_cell(&sample_cell()).await.unwrap_err();
        assert_eq!(err, UpstreamError::Unauthorized);
    }

    #[tokio::test]
    async fn mock_fetcher_returns_configured_places() {
        let place = Place::new("Cafe", 38.9, -77.3, "VA", "22030", vec![]).unwrap();
        let fetcher = MockUpstreamFetcher::new(vec![place.clone()]);
        let places = fetcher.fetch_places_for_cell(&sample_cell()).await.unwrap();
        assert_eq!(places, vec![place]);
    }

    #[tokio::test]
    async fn empty_mock_fetcher_returns_no_places() {
        let fetcher = MockUpstreamFetcher::empty();
        let places = fetcher.fetch_places_for_cell(&sample_cell()).await.unwrap();
        assert!(places.is_empty());
    }
}
