//! hookrelay sidecar library.
//!
//! Exposes config, state, routes and the router builder so integration
//! tests and the binary entrypoint share them.

pub mod config;
pub mod router;
pub mod routes;
pub mod state;
