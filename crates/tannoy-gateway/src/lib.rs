//! # Tannoy Gateway
//! REST API for event ingestion, rule management, and stats.

pub mod routes;
pub mod server;

pub use server::{AppState, build_router, build_router_from_arc};
