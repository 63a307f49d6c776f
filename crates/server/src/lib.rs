//! Streaming places-search server.
//!
//! Wires the `nearby` search engine and `nearby-protocol` wire format into
//! a per-client session (`session`) exposed over a websocket transport
//! (`transport`).

pub mod config;
pub mod session;
pub mod transport;

pub use config::ServerConfig;
pub use session::Session;
pub use transport::run_server;
