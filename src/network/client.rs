//! Blocking HTTP client used by upstream sessions
//!
//! Upstream backends are synchronous by contract, so this wraps
//! `reqwest::blocking`. It must only be driven from a blocking worker thread.

use super::user_agent::{accept_json, accept_language, generate_user_agent};
use crate::config::OutgoingSettings;
use anyhow::Result;
use reqwest::blocking::{Client, RequestBuilder};
use std::time::Duration;

/// HTTP client wrapper configured from the outgoing settings
pub struct HttpClient {
    client: Client,
    user_agent: String,
}

impl HttpClient {
    /// Create a new HTTP client with default settings
    pub fn new() -> Result<Self> {
        Self::with_settings(&OutgoingSettings::default())
    }

    /// Create a new HTTP client with custom settings
    pub fn with_settings(settings: &OutgoingSettings) -> Result<Self> {
        let mut builder = Client::builder()
            .timeout(Duration::from_secs_f64(settings.request_timeout))
            .cookie_store(true)
            .gzip(true)
            .brotli(true);

        if !settings.verify_ssl {
            builder = builder.danger_accept_invalid_certs(true);
        }

        if let Some(ref proxy_url) = settings.proxy {
            builder = builder.proxy(reqwest::Proxy::all(proxy_url)?);
        }

        Ok(Self {
            client: builder.build()?,
            user_agent: generate_user_agent(settings.useragent_suffix.as_deref()),
        })
    }

    /// GET with query parameters
    pub fn get(&self, url: &str, params: &[(String, String)]) -> Result<HttpResponse> {
        let request = self.client.get(url).query(params);
        self.send(request)
    }

    /// POST with a form-encoded body
    pub fn post_form(&self, url: &str, form: &[(String, String)]) -> Result<HttpResponse> {
        let request = self.client.post(url).form(form);
        self.send(request)
    }

    fn send(&self, request: RequestBuilder) -> Result<HttpResponse> {
        let response = request
            .header("User-Agent", &self.user_agent)
            .header("Accept", accept_json())
            .header("Accept-Language", accept_language("all"))
            .header("DNT", "1")
            .send()?;

        let status = response.status().as_u16();
        let url = response.url().to_string();
        let text = response.text()?;

        Ok(HttpResponse { status, url, text })
    }

    /// Current user agent
    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }
}

/// Response from an upstream request
#[derive(Debug)]
pub struct HttpResponse {
    /// HTTP status code
    pub status: u16,
    /// Final URL (after redirects)
    pub url: String,
    /// Response body as text
    pub text: String,
}

impl HttpResponse {
    /// Parse response as JSON
    pub fn json<T: serde::de::DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_str(&self.text)?)
    }

    /// Check if response is successful (2xx)
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Check if response indicates rate limiting
    pub fn is_rate_limited(&self) -> bool {
        self.status == 429 || self.status == 202
    }

    /// Fail on anything other than a plain success
    pub fn ensure_success(self) -> Result<Self> {
        if self.is_rate_limited() {
            anyhow::bail!("rate limited by upstream (HTTP {})", self.status);
        }
        if !self.is_success() {
            anyhow::bail!("HTTP error: {}", self.status);
        }
        Ok(self)
    }
}
