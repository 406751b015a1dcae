//! Settings structures for the search gateway

use crate::search::SafeSearch;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

/// Main settings structure, loaded once at startup
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub api: ApiSettings,
    pub server: ServerSettings,
    pub auth: AuthSettings,
    pub cors: CorsSettings,
    pub search: SearchSettings,
    pub outgoing: OutgoingSettings,
}

impl Settings {
    /// Load settings from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let settings: Settings = serde_yaml::from_str(&content)?;
        Ok(settings)
    }

    /// Merge with environment variables
    pub fn merge_env(&mut self) {
        self.merge_from(|key| std::env::var(key).ok());
    }

    /// Merge the process environment, falling back to values read from a
    /// `.env` file. Variables already set in the environment win.
    pub fn merge_env_with_file(&mut self, file: &HashMap<String, String>) {
        self.merge_layered(|key| std::env::var(key).ok(), file);
    }

    fn merge_layered<F>(&mut self, primary: F, file: &HashMap<String, String>)
    where
        F: Fn(&str) -> Option<String>,
    {
        self.merge_from(|key| primary(key).or_else(|| file.get(key).cloned()));
    }

    /// Merge overrides from an arbitrary key lookup.
    ///
    /// Unparseable numeric values are ignored and the current value is kept.
    pub fn merge_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(val) = lookup("HOST") {
            self.server.host = val;
        }
        if let Some(val) = lookup("PORT") {
            if let Ok(port) = val.trim().parse() {
                self.server.port = port;
            }
        }
        if let Some(val) = lookup("DEBUG") {
            self.server.debug = val.trim().eq_ignore_ascii_case("true");
        }
        if let Some(val) = lookup("API_TOKEN") {
            self.auth.api_token = Some(val).filter(|t| !t.is_empty());
        }
        if let Some(val) = lookup("ALLOWED_ORIGINS") {
            self.cors.allowed_origins = val
                .split(',')
                .map(|o| o.trim().to_string())
                .filter(|o| !o.is_empty())
                .collect();
        }
        if let Some(val) = lookup("UPSTREAM_TIMEOUT") {
            if let Ok(secs) = val.trim().parse::<f64>() {
                self.search.upstream_timeout = Some(secs).filter(|s| *s > 0.0);
            }
        }
        if let Some(val) = lookup("MAX_WORKERS") {
            if let Ok(workers) = val.trim().parse::<usize>() {
                self.search.max_workers = workers.max(1);
            }
        }
    }

    /// Socket address string the server binds to
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

/// Read `KEY=value` pairs from a dotenv file without touching the process environment
pub fn read_env_file<P: AsRef<Path>>(path: P) -> Result<HashMap<String, String>> {
    let mut values = HashMap::new();
    for item in dotenvy::from_path_iter(path)? {
        let (key, value) = item?;
        values.insert(key, value);
    }
    Ok(values)
}

/// Descriptive API metadata reported by the root endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiSettings {
    pub title: String,
    pub description: String,
    pub version: String,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            title: "DuckDuckGo Search API".to_string(),
            description: "HTTP gateway for DuckDuckGo web, image and news search".to_string(),
            version: crate::VERSION.to_string(),
        }
    }
}

/// Server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Bind host
    pub host: String,
    /// Server port
    pub port: u16,
    /// Enable debug logging
    pub debug: bool,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8999,
            debug: false,
        }
    }
}

/// Bearer token settings
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthSettings {
    /// Shared secret every search request must present
    pub api_token: Option<String>,
}

impl std::fmt::Debug for AuthSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthSettings")
            .field("api_token", &self.api_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// CORS settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CorsSettings {
    /// Allowed origins, `*` allows any
    pub allowed_origins: Vec<String>,
}

impl Default for CorsSettings {
    fn default() -> Self {
        Self {
            allowed_origins: vec!["*".to_string()],
        }
    }
}

/// Search defaults and dispatch bounds
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    /// Region used when a request omits one
    pub default_region: String,
    /// Safe search level used when a request omits one
    pub default_safesearch: SafeSearch,
    /// Result cap used when a request omits one
    pub default_max_results: u32,
    /// Upper bound accepted for the result cap
    pub max_results_limit: u32,
    /// Maximum number of upstream calls running at once
    pub max_workers: usize,
    /// Optional upstream call timeout in seconds
    pub upstream_timeout: Option<f64>,
}

impl SearchSettings {
    pub fn upstream_timeout(&self) -> Option<Duration> {
        self.upstream_timeout
            .filter(|secs| secs.is_finite() && *secs > 0.0)
            .map(Duration::from_secs_f64)
    }
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            default_region: "wt-wt".to_string(),
            default_safesearch: SafeSearch::Moderate,
            default_max_results: 10,
            max_results_limit: 100,
            max_workers: 16,
            upstream_timeout: None,
        }
    }
}

/// Outgoing request settings for the upstream backend
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutgoingSettings {
    /// Per-request timeout in seconds
    pub request_timeout: f64,
    /// User agent suffix appended to the generated agent
    pub useragent_suffix: Option<String>,
    /// Verify TLS certificates
    pub verify_ssl: bool,
    /// Proxy for all outgoing requests
    pub proxy: Option<String>,
}

impl Default for OutgoingSettings {
    fn default() -> Self {
        Self {
            request_timeout: 10.0,
            useragent_suffix: None,
            verify_ssl: true,
            proxy: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.server.port, 8999);
        assert_eq!(settings.server.host, "0.0.0.0");
        assert!(!settings.server.debug);
        assert!(settings.auth.api_token.is_none());
        assert_eq!(settings.cors.allowed_origins, vec!["*"]);
        assert_eq!(settings.search.default_region, "wt-wt");
        assert_eq!(settings.search.default_safesearch, SafeSearch::Moderate);
        assert_eq!(settings.search.default_max_results, 10);
        assert_eq!(settings.search.max_results_limit, 100);
        assert!(settings.search.upstream_timeout().is_none());
    }

    #[test]
    fn test_merge_env_overrides() {
        let mut settings = Settings::default();
        settings.merge_from(env(&[
            ("HOST", "127.0.0.1"),
            ("PORT", "9000"),
            ("DEBUG", "True"),
            ("API_TOKEN", "secret"),
            ("ALLOWED_ORIGINS", "https://a.example, https://b.example"),
            ("UPSTREAM_TIMEOUT", "2.5"),
            ("MAX_WORKERS", "0"),
        ]));

        assert_eq!(settings.bind_address(), "127.0.0.1:9000");
        assert!(settings.server.debug);
        assert_eq!(settings.auth.api_token.as_deref(), Some("secret"));
        assert_eq!(
            settings.cors.allowed_origins,
            vec!["https://a.example", "https://b.example"]
        );
        assert_eq!(
            settings.search.upstream_timeout(),
            Some(Duration::from_millis(2500))
        );
        assert_eq!(settings.search.max_workers, 1);
    }

    #[test]
    fn test_merge_env_ignores_garbage() {
        let mut settings = Settings::default();
        settings.merge_from(env(&[("PORT", "not-a-port"), ("API_TOKEN", "")]));
        assert_eq!(settings.server.port, 8999);
        assert!(settings.auth.api_token.is_none());
    }

    #[test]
    fn test_yaml_sections_default() {
        let settings: Settings =
            serde_yaml::from_str("server:\n  port: 8080\nsearch:\n  default_safesearch: strict\n")
                .unwrap();
        assert_eq!(settings.server.port, 8080);
        assert_eq!(settings.server.host, "0.0.0.0");
        assert_eq!(settings.search.default_safesearch, SafeSearch::Strict);
        assert_eq!(settings.search.max_results_limit, 100);
    }

    #[test]
    fn test_token_not_in_debug_output() {
        let mut settings = Settings::default();
        settings.auth.api_token = Some("hunter2".to_string());
        assert!(!format!("{:?}", settings).contains("hunter2"));
    }

    #[test]
    fn test_env_file_fills_unset_keys() {
        let path = std::env::temp_dir().join(format!("ddg-search-api-{}.env", uuid::Uuid::new_v4()));
        std::fs::write(
            &path,
            "# deployment secrets\nAPI_TOKEN=\"from-file\"\nPORT=9100\nMAX_WORKERS=4\n",
        )
        .unwrap();
        let file = read_env_file(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(file.get("API_TOKEN").map(String::as_str), Some("from-file"));
        assert_eq!(file.len(), 3);

        let mut settings = Settings::default();
        settings.merge_layered(env(&[("PORT", "9200")]), &file);
        assert_eq!(settings.server.port, 9200);
        assert_eq!(settings.auth.api_token.as_deref(), Some("from-file"));
        assert_eq!(settings.search.max_workers, 4);
    }

    #[test]
    fn test_missing_env_file_is_an_error() {
        let path = std::env::temp_dir().join(format!("ddg-search-api-{}.env", uuid::Uuid::new_v4()));
        assert!(read_env_file(path).is_err());
    }
}
