//! Request models, validation and upstream dispatch
//!
//! Inbound requests are validated into a [`SearchQuery`], then handed to the
//! [`Dispatcher`] which makes the single blocking upstream call.

mod dispatch;
mod error;
mod models;

pub use dispatch::Dispatcher;
pub use error::*;
pub use models::*;
