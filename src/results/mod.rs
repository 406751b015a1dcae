//! Result types, mappers and response envelopes
//!
//! Upstream records arrive as [`RawResult`] maps and are reshaped into the
//! typed results here, with defaults filled for anything missing.

mod envelope;
mod types;

pub use envelope::*;
pub use types::*;
