//! HTTP server for the sequence store.
//!
//! Exposes single-address reads, batched requester-map reads, and the
//! whole, chunked and bulk write paths over JSON.

pub mod config;
pub mod error;
pub mod handler;
pub mod router;
pub mod server;

pub use config::ServerConfig;
pub use error::{ServerError, ServerResult};
pub use handler::{AppState, HealthResponse};
pub use server::SequenceServer;
