//! md2office API Server module
//!
//! Provides an HTTP REST API over the document preparation core.
//! Run with `md2office-server`.

pub mod handlers;
pub mod server;

pub use server::{router, run_api_server, ApiConfig, AppState};
