//! Upstream search backends
//!
//! Defines the blocking backend seam and the DuckDuckGo implementation.

mod traits;

pub mod duckduckgo;

pub use duckduckgo::DuckDuckGo;
pub use traits::*;
