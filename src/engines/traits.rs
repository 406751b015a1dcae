//! Upstream backend traits
//!
//! A backend is an opaque, synchronous search provider. Each dispatch opens
//! one [`SearchSession`] through [`SearchBackend::connect`], makes exactly one
//! call on it and drops it. Implementations release whatever the session
//! holds in `Drop`, so the session is closed on every exit path, unwinding
//! included.

use crate::results::RawResult;
use crate::search::SearchQuery;
use anyhow::Result;

/// Lazily materialized upstream records, in upstream order
pub type RawResults<'a> = Box<dyn Iterator<Item = Result<RawResult>> + 'a>;

/// Factory for scoped upstream sessions
pub trait SearchBackend: Send + Sync {
    /// Backend name, used in logs and the root endpoint
    fn name(&self) -> &str;

    /// Open a fresh session. Sessions are never shared between requests.
    fn connect(&self) -> Result<Box<dyn SearchSession>>;
}

/// One open connection to the upstream backend.
///
/// All calls block the current thread. Records beyond `query.max_results`
/// must not be yielded.
pub trait SearchSession: Send {
    /// Web (text) search
    fn text<'a>(&'a mut self, query: &SearchQuery) -> Result<RawResults<'a>>;

    /// Image search, honoring `query.image_filters`
    fn images<'a>(&'a mut self, query: &SearchQuery) -> Result<RawResults<'a>>;

    /// News search
    fn news<'a>(&'a mut self, query: &SearchQuery) -> Result<RawResults<'a>>;
}
