//! HTTP surface
//!
//! Routes, the token middleware, handlers and the JSON error envelope.

mod error;
mod handlers;
mod middleware;
mod routes;
mod state;

pub use error::ApiError;
pub use routes::create_router;
pub use state::AppState;
