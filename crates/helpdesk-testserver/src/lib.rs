//! In-memory stand-in for the helpdesk REST backend.
//!
//! Implements the same routes, status codes and error bodies as the real
//! service so the client crates can be tested end to end without it.

pub mod auth;
mod routes;
pub mod state;
pub mod test_helpers;

pub use routes::build_router;
pub use state::{AppState, InnerAppState};
pub use test_helpers::{spawn_test_server, TestServer};
