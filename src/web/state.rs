//! Application state shared across handlers

use crate::auth::AuthGate;
use crate::config::{SearchSettings, Settings};
use crate::engines::SearchBackend;
use crate::search::Dispatcher;
use std::sync::Arc;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Settings loaded at startup
    pub settings: Arc<Settings>,
    /// Upstream call dispatcher
    pub dispatcher: Dispatcher,
    /// Bearer token gate for the search routes
    pub auth: Arc<AuthGate>,
}

impl AppState {
    /// Wire settings and a backend into the state handed to the router
    pub fn new(settings: Settings, backend: Arc<dyn SearchBackend>) -> Self {
        let dispatcher = Dispatcher::from_settings(backend, &settings.search);
        let auth = Arc::new(AuthGate::from_settings(&settings.auth));

        Self {
            settings: Arc::new(settings),
            dispatcher,
            auth,
        }
    }

    /// Defaults and limits applied during request validation
    pub fn search_settings(&self) -> &SearchSettings {
        &self.settings.search
    }
}
