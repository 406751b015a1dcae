//! Upstream call dispatch
//!
//! Every inbound search makes exactly one upstream call. The call is
//! synchronous, so it runs on tokio's blocking pool while the request task
//! awaits it; a semaphore bounds how many calls run at once. Whatever goes
//! wrong in there comes back as a single [`SearchError`].

use super::error::SearchError;
use super::models::{SearchKind, SearchQuery};
use crate::config::SearchSettings;
use crate::engines::SearchBackend;
use crate::results::RawResult;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tokio::time::timeout;
use tracing::{debug, error, info, info_span, Instrument, Span};
use uuid::Uuid;

/// Longest error message written to the log, in characters
const MAX_LOGGED_ERROR_CHARS: usize = 200;

/// Default bound on concurrently running upstream calls
const DEFAULT_MAX_WORKERS: usize = 16;

/// Runs upstream calls off the request-handling threads
#[derive(Clone)]
pub struct Dispatcher {
    backend: Arc<dyn SearchBackend>,
    workers: Arc<Semaphore>,
    timeout: Option<Duration>,
}

impl Dispatcher {
    /// Create a dispatcher with the default worker bound and no timeout
    pub fn new(backend: Arc<dyn SearchBackend>) -> Self {
        Self {
            backend,
            workers: Arc::new(Semaphore::new(DEFAULT_MAX_WORKERS)),
            timeout: None,
        }
    }

    /// Create a dispatcher configured from search settings
    pub fn from_settings(backend: Arc<dyn SearchBackend>, settings: &SearchSettings) -> Self {
        let dispatcher = Self::new(backend).with_max_workers(settings.max_workers);
        match settings.upstream_timeout() {
            Some(limit) => dispatcher.with_timeout(limit),
            None => dispatcher,
        }
    }

    /// Set the maximum number of concurrent upstream calls
    pub fn with_max_workers(mut self, workers: usize) -> Self {
        self.workers = Arc::new(Semaphore::new(workers.max(1)));
        self
    }

    /// Bound how long a caller waits for an upstream call
    pub fn with_timeout(mut self, limit: Duration) -> Self {
        self.timeout = Some(limit);
        self
    }

    /// Name of the backend calls are sent to
    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    /// Run a blocking task on the worker pool and await its outcome.
    ///
    /// The task keeps its worker permit until it returns, even if the caller
    /// stopped waiting because of the timeout. Panics, cancellation and
    /// timeouts all surface as [`SearchError::OperationFailed`].
    pub async fn offload<F, T>(&self, task: F) -> Result<T, SearchError>
    where
        F: FnOnce() -> anyhow::Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let permit = Arc::clone(&self.workers)
            .acquire_owned()
            .await
            .map_err(|e| SearchError::operation(format!("worker pool unavailable: {}", e)))?;

        let span = Span::current();
        let handle = tokio::task::spawn_blocking(move || {
            let _permit = permit;
            let _entered = span.enter();
            task()
        });

        let joined = match self.timeout {
            Some(limit) => match timeout(limit, handle).await {
                Ok(joined) => joined,
                Err(_) => {
                    return Err(SearchError::operation(format!(
                        "upstream call timed out after {:?}",
                        limit
                    )))
                }
            },
            None => handle.await,
        };

        match joined {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => Err(SearchError::operation(format!("{:#}", e))),
            Err(e) if e.is_panic() => Err(SearchError::operation("upstream worker panicked")),
            Err(e) => Err(SearchError::operation(format!("upstream worker cancelled: {}", e))),
        }
    }

    /// Make the one upstream call for `kind` and collect every record it yields.
    ///
    /// Records come back in upstream order, untouched. The session is opened
    /// and dropped inside the worker, so it is released on every exit path.
    pub async fn search(
        &self,
        kind: SearchKind,
        query: SearchQuery,
    ) -> Result<Vec<RawResult>, SearchError> {
        let span = info_span!("dispatch", id = %Uuid::new_v4(), kind = %kind);
        let backend = Arc::clone(&self.backend);
        let query_text = query.query.clone();

        async move {
            let start = Instant::now();
            info!(
                "Starting {} search for query: {} (max_results={})",
                kind, query_text, query.max_results
            );

            let outcome = self
                .offload(move || {
                    let mut session = backend.connect()?;
                    debug!("Upstream session acquired from {}", backend.name());
                    let records = match kind {
                        SearchKind::Web => session.text(&query)?,
                        SearchKind::Images => session.images(&query)?,
                        SearchKind::News => session.news(&query)?,
                    };
                    let collected = records.collect::<anyhow::Result<Vec<_>>>();
                    collected
                })
                .await;

            match outcome {
                Ok(records) => {
                    info!(
                        "{} search completed. Found {} results in {:?}",
                        kind,
                        records.len(),
                        start.elapsed()
                    );
                    Ok(records)
                }
                Err(e) => {
                    error!(
                        kind = %kind,
                        query = %query_text,
                        error = %truncate(&e.to_string(), MAX_LOGGED_ERROR_CHARS),
                        "Upstream search failed"
                    );
                    Err(e)
                }
            }
        }
        .instrument(span)
        .await
    }
}

/// Truncate to at most `max` characters, marking the cut
fn truncate(message: &str, max: usize) -> String {
    match message.char_indices().nth(max) {
        Some((idx, _)) => format!("{}…", &message[..idx]),
        None => message.to_string(),
    }
}
