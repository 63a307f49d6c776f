//! Transport layer for the streaming places server.
//!
//! Only one transport: a `GET /ws` axum websocket endpoint, grounded on
//! the teacher's optional `http` feature (`transport/http.rs`, `axum` in
//! `crates/server/Cargo.toml`) but promoted to the default transport here
//! since the spec's client/server protocol (§6) is inherently
//! bidirectional and message-oriented.

pub mod ws;

pub use ws::run_server;
