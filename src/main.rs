//! ddg-search-api server entry point

use anyhow::{Context, Result};
use ddg_search_api::{
    config::{read_env_file, Settings},
    engines::DuckDuckGo,
    web::{create_router, AppState},
};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() -> Result<()> {
    let (settings, source) = load_settings()?;
    init_logging(settings.server.debug);

    info!("Starting {} v{}", settings.api.title, ddg_search_api::VERSION);
    match source.file {
        Some(path) => info!("Loaded settings from: {}", path.display()),
        None => info!("No settings file found, using defaults"),
    }
    if source.env_file {
        info!("Loaded environment overrides from {}", ENV_FILE);
    }
    if settings.auth.api_token.is_none() {
        warn!("API_TOKEN is not set; every search request will be refused");
    }

    let backend = Arc::new(DuckDuckGo::new(settings.outgoing.clone()));
    let addr = settings.bind_address();
    let state = AppState::new(settings, backend);
    info!(
        "Dispatching to {} with up to {} concurrent upstream calls",
        state.dispatcher.backend_name(),
        state.search_settings().max_workers
    );

    let app = create_router(state);

    info!("Starting server on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// `RUST_LOG` wins; otherwise info, or debug when DEBUG is on
fn init_logging(debug: bool) {
    let default = if debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

/// Dotenv file read from the working directory at startup
const ENV_FILE: &str = ".env";

/// Where the running configuration came from
struct SettingsSource {
    file: Option<PathBuf>,
    env_file: bool,
}

/// Load settings from the first YAML file found, then apply environment
/// overrides. Keys missing from the environment are taken from `.env`.
fn load_settings() -> Result<(Settings, SettingsSource)> {
    let env_file = Path::new(ENV_FILE).exists();
    let file_values = if env_file {
        read_env_file(ENV_FILE).with_context(|| format!("invalid {} file", ENV_FILE))?
    } else {
        HashMap::new()
    };

    let mut candidates = Vec::new();
    if let Some(path) = std::env::var("DDG_SEARCH_SETTINGS_PATH")
        .ok()
        .or_else(|| file_values.get("DDG_SEARCH_SETTINGS_PATH").cloned())
    {
        candidates.push(PathBuf::from(path));
    }
    candidates.push(PathBuf::from("settings.yml"));
    candidates.push(PathBuf::from("config/settings.yml"));
    if let Some(dir) = dirs::config_dir() {
        candidates.push(dir.join("ddg-search-api/settings.yml"));
    }

    let file = candidates.into_iter().find(|p| p.exists());
    let mut settings = match &file {
        Some(path) => Settings::from_file(path)
            .with_context(|| format!("invalid settings file {}", path.display()))?,
        None => Settings::default(),
    };
    if env_file {
        settings.merge_env_with_file(&file_values);
    } else {
        settings.merge_env();
    }
    Ok((settings, SettingsSource { file, env_file }))
}
