//! Core value types shared across the nearby-places workspace.
//!
//! This crate defines the data model for the hierarchical geospatial places
//! cache: the query region, the S2 cell it maps to, and the place records
//! discovered within it. Nothing here touches I/O; it is pure data plus the
//! invariant-enforcing constructors around it.

pub mod error;
pub mod place;
pub mod region;

pub use error::{Result, TypesError};
pub use place::Place;
pub use region::{Cell, CellBounds, SearchRegion};
