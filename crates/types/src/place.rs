//! The `Place` value type: a point of interest discovered by the upstream
//! fetcher and carried through the cache and the streaming protocol.

use crate::error::{Result, TypesError};
use serde::{Deserialize, Serialize};

/// A point of interest. Only valid, fully-decoded places exist as `Place`
/// values: a record missing `state` or `zip` is rejected at construction
/// time (spec §3, §4.5) rather than represented as a partial `Place`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Place {
    pub name: String,
    pub lat: f64,
    pub lon: f64,
    pub state: String,
    pub zip: String,
    pub types: Vec<String>,
}

impl Place {
    /// Construct a `Place`, rejecting records with an empty state or zip.
    ///
    /// This is the single gate a decoded upstream record passes through; a
    /// record missing either field is not a valid `Place` and is dropped by
    /// the caller.
    pub fn new(
        name: impl Into<String>,
        lat: f64,
        lon: f64,
        state: impl Into<String>,
        zip: impl Into<String>,
        types: Vec<String>,
    ) -> Result<Self> {
        let state = state.into();
        let zip = zip.into();

        if state.is_empty() {
            return Err(TypesError::IncompletePlace("state".to_string()));
        }
        if zip.is_empty() {
            return Err(TypesError::IncompletePlace("zip".to_string()));
        }

        Ok(Self {
            name: name.into(),
            lat,
            lon,
            state,
            zip,
            types,
        })
    }
}
