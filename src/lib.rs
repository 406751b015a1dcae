//! ddg-search-api: a bearer-token gated HTTP gateway for DuckDuckGo search
//!
//! Web, image and news searches are validated, dispatched to a blocking
//! upstream backend on a bounded worker pool, and returned as uniform JSON
//! envelopes.

pub mod auth;
pub mod config;
pub mod engines;
pub mod network;
pub mod results;
pub mod search;
pub mod web;

pub use config::Settings;
pub use engines::{SearchBackend, SearchSession};
pub use search::{Dispatcher, SearchError, SearchKind, SearchQuery};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
