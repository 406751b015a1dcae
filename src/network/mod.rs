//! HTTP networking module
//!
//! Provides the blocking HTTP client that upstream sessions use.

mod client;
mod user_agent;

pub use client::{HttpClient, HttpResponse};
pub use user_agent::generate_user_agent;
