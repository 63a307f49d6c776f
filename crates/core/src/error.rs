//! Error types for the nearby cache and search engine.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, SearchError>;

/// Errors from the `PlacesCache` contract (spec §4.4, §7).
///
/// `Transient` and `Corrupt` are never fatal to a search: the engine treats
/// both as a cache miss and continues (spec §7). They exist as distinct
/// variants so call sites can log them differently and so tests can assert
/// on which path was taken.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CacheError {
    #[error("cache backend error for key {key}: {message}")]
    Transient { key: String, message: String },

    #[error("cache value for key {key} failed to decode")]
    Corrupt { key: String },

    #[error("lock for key {key} could not be acquired within the polling window")]
    LockContention { key: String },
}

/// Errors surfaced from the upstream fetcher (spec §4.5, §7). The engine
/// treats every variant the same way: swallow, emit no places for the leaf,
/// continue the walk.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum UpstreamError {
    #[error("upstream request failed: {0}")]
    Request(String),

    #[error("upstream response failed to decode: {0}")]
    Decode(String),

    #[error("upstream credentials missing or rejected")]
    Unauthorized,
}

/// Top-level error type for `nearby`. Most internal failures (cache,
/// upstream) never reach this type because the engine swallows them per
/// spec §7; it exists for the handful of orchestration paths that can fail
/// outright, such as invalid input reaching `search` directly (bypassing
/// the dispatcher's own validation).
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SearchError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error(transparent)]
    Cache(#[from] CacheError),

    #[error(transparent)]
    Upstream(#[from] UpstreamError),
}
