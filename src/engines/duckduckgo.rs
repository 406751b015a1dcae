//! DuckDuckGo backend
//!
//! Web results come from the HTML endpoint. Image and news results come from
//! the JSON endpoints, which need a `vqd` token scraped from the home page.

use super::traits::*;
use crate::config::OutgoingSettings;
use crate::network::HttpClient;
use crate::results::RawResult;
use crate::search::{SafeSearch, SearchQuery, TimeLimit};
use anyhow::{anyhow, Context, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;
use url::Url;

/// Upper bound on JSON pages fetched for a single call
const MAX_PAGES: usize = 5;

static VQD_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"vqd=["']?([0-9-]+)"#).expect("vqd pattern is valid"));

/// Upstream endpoint URLs
#[derive(Debug, Clone)]
pub struct Endpoints {
    /// HTML web search form target
    pub html: String,
    /// Home page, used to obtain the `vqd` token
    pub home: String,
    /// Image search JSON endpoint
    pub images: String,
    /// News search JSON endpoint
    pub news: String,
}

impl Endpoints {
    /// Endpoints rooted at a single base URL (used against local mocks)
    pub fn at(base: &str) -> Self {
        let base = base.trim_end_matches('/');
        Self {
            html: format!("{}/html/", base),
            home: format!("{}/", base),
            images: format!("{}/i.js", base),
            news: format!("{}/news.js", base),
        }
    }
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            html: "https://html.duckduckgo.com/html/".to_string(),
            home: "https://duckduckgo.com/".to_string(),
            images: "https://duckduckgo.com/i.js".to_string(),
            news: "https://duckduckgo.com/news.js".to_string(),
        }
    }
}

/// DuckDuckGo search backend
pub struct DuckDuckGo {
    endpoints: Endpoints,
    outgoing: OutgoingSettings,
}

impl DuckDuckGo {
    pub fn new(outgoing: OutgoingSettings) -> Self {
        Self {
            endpoints: Endpoints::default(),
            outgoing,
        }
    }

    pub fn with_endpoints(mut self, endpoints: Endpoints) -> Self {
        self.endpoints = endpoints;
        self
    }
}

impl Default for DuckDuckGo {
    fn default() -> Self {
        Self::new(OutgoingSettings::default())
    }
}

impl SearchBackend for DuckDuckGo {
    fn name(&self) -> &str {
        "duckduckgo"
    }

    fn connect(&self) -> Result<Box<dyn SearchSession>> {
        let client = HttpClient::with_settings(&self.outgoing)
            .context("failed to build upstream HTTP client")?;
        debug!("DuckDuckGo session opened");
        Ok(Box::new(DuckDuckGoSession {
            client,
            endpoints: self.endpoints.clone(),
        }))
    }
}

/// One open DuckDuckGo session; owns the HTTP client and its cookie jar
pub struct DuckDuckGoSession {
    client: HttpClient,
    endpoints: Endpoints,
}

impl Drop for DuckDuckGoSession {
    fn drop(&mut self) {
        debug!("DuckDuckGo session closed");
    }
}

impl DuckDuckGoSession {
    /// Fetch the per-query token the JSON endpoints require
    fn vqd(&self, keywords: &str) -> Result<String> {
        let response = self
            .client
            .get(&self.endpoints.home, &[("q".to_string(), keywords.to_string())])?
            .ensure_success()?;
        extract_vqd(&response.text).ok_or_else(|| anyhow!("vqd token not found for {:?}", keywords))
    }
}

impl SearchSession for DuckDuckGoSession {
    fn text<'a>(&'a mut self, query: &SearchQuery) -> Result<RawResults<'a>> {
        let kp = match query.safesearch {
            SafeSearch::Strict => "1",
            SafeSearch::Moderate => "-1",
            SafeSearch::Off => "-2",
        };
        let mut form = vec![
            ("q".to_string(), query.query.clone()),
            ("b".to_string(), String::new()),
            ("kl".to_string(), query.region.clone()),
            ("kp".to_string(), kp.to_string()),
        ];
        if let Some(limit) = query.time_limit {
            form.push(("df".to_string(), limit.code().to_string()));
        }

        let response = self
            .client
            .post_form(&self.endpoints.html, &form)?
            .ensure_success()?;

        let mut results = parse_html_results(&response.text)?;
        results.truncate(query.max_results as usize);
        Ok(Box::new(results.into_iter().map(Ok)))
    }

    fn images<'a>(&'a mut self, query: &SearchQuery) -> Result<RawResults<'a>> {
        let vqd = self.vqd(&query.query)?;
        let p = match query.safesearch {
            SafeSearch::Strict | SafeSearch::Moderate => "1",
            SafeSearch::Off => "-1",
        };
        let f = image_filter(query);

        let params = vec![
            ("l".to_string(), query.region.clone()),
            ("o".to_string(), "json".to_string()),
            ("q".to_string(), query.query.clone()),
            ("vqd".to_string(), vqd),
            ("f".to_string(), f),
            ("p".to_string(), p.to_string()),
        ];

        Ok(Box::new(JsonPager::new(
            &self.client,
            self.endpoints.images.clone(),
            params,
            query.max_results as usize,
            image_record,
        )))
    }

    fn news<'a>(&'a mut self, query: &SearchQuery) -> Result<RawResults<'a>> {
        let vqd = self.vqd(&query.query)?;
        let p = match query.safesearch {
            SafeSearch::Strict => "1",
            SafeSearch::Moderate => "-1",
            SafeSearch::Off => "-2",
        };
        let mut params = vec![
            ("l".to_string(), query.region.clone()),
            ("o".to_string(), "json".to_string()),
            ("noamp".to_string(), "1".to_string()),
            ("q".to_string(), query.query.clone()),
            ("vqd".to_string(), vqd),
            ("p".to_string(), p.to_string()),
        ];
        if let Some(limit) = query.time_limit {
            params.push(("df".to_string(), limit.code().to_string()));
        }

        Ok(Box::new(JsonPager::new(
            &self.client,
            self.endpoints.news.clone(),
            params,
            query.max_results as usize,
            news_record,
        )))
    }
}

/// One page of a DuckDuckGo JSON endpoint
#[derive(Debug, Deserialize)]
struct JsonPage {
    #[serde(default)]
    results: Vec<Value>,
    next: Option<String>,
}

/// Iterates records across JSON pages, fetching the next page on demand
struct JsonPager<'a> {
    client: &'a HttpClient,
    url: String,
    params: Vec<(String, String)>,
    reshape: fn(RawResult) -> RawResult,
    buffer: std::vec::IntoIter<Value>,
    next_offset: Option<String>,
    pages: usize,
    remaining: usize,
}

impl<'a> JsonPager<'a> {
    fn new(
        client: &'a HttpClient,
        url: String,
        params: Vec<(String, String)>,
        max_results: usize,
        reshape: fn(RawResult) -> RawResult,
    ) -> Self {
        Self {
            client,
            url,
            params,
            reshape,
            buffer: Vec::new().into_iter(),
            next_offset: None,
            pages: 0,
            remaining: max_results,
        }
    }

    fn fetch_page(&mut self) -> Result<()> {
        let mut params = self.params.clone();
        if let Some(offset) = self.next_offset.take() {
            params.push(("s".to_string(), offset));
        }
        self.pages += 1;

        let response = self.client.get(&self.url, &params)?.ensure_success()?;
        let page: JsonPage = response
            .json()
            .with_context(|| format!("malformed JSON page from {}", self.url))?;

        self.next_offset = page.next.as_deref().and_then(offset_from_next);
        self.buffer = page.results.into_iter();
        Ok(())
    }
}

impl Iterator for JsonPager<'_> {
    type Item = Result<RawResult>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.remaining == 0 {
                return None;
            }
            if let Some(value) = self.buffer.next() {
                if let Value::Object(record) = value {
                    self.remaining -= 1;
                    return Some(Ok((self.reshape)(record)));
                }
                continue;
            }
            let exhausted = self.pages > 0 && self.next_offset.is_none();
            if exhausted || self.pages >= MAX_PAGES {
                return None;
            }
            if let Err(e) = self.fetch_page() {
                self.remaining = 0;
                return Some(Err(e));
            }
        }
    }
}

/// Comma-joined `f` parameter; unset slots stay empty
fn image_filter(query: &SearchQuery) -> String {
    let filters = &query.image_filters;
    let time = query.time_limit.map(|t| match t {
        TimeLimit::Day => "Day",
        TimeLimit::Week => "Week",
        TimeLimit::Month => "Month",
        TimeLimit::Year => "Year",
    });
    [
        time.map(|t| format!("time:{}", t)),
        filters.size.map(|s| format!("size:{}", s.as_str())),
        filters.color.map(|c| format!("color:{}", c.as_str())),
        filters.type_image.map(|t| format!("type:{}", t.as_str())),
        filters.layout.map(|l| format!("layout:{}", l.as_str())),
        filters.license_image.map(|l| format!("license:{}", l.as_str())),
    ]
    .into_iter()
    .map(Option::unwrap_or_default)
    .collect::<Vec<_>>()
    .join(",")
}

/// Image records already carry the output keys
fn image_record(record: RawResult) -> RawResult {
    record
}

/// Rename news fields and render the unix timestamp as RFC 3339
fn news_record(mut record: RawResult) -> RawResult {
    let mut out = RawResult::new();

    let date = match record.remove("date") {
        Some(Value::Number(n)) => n
            .as_i64()
            .and_then(|secs| chrono::DateTime::<chrono::Utc>::from_timestamp(secs, 0))
            .map(|d| Value::String(d.to_rfc3339())),
        Some(Value::String(s)) => Some(Value::String(s)),
        _ => None,
    };
    if let Some(date) = date {
        out.insert("date".to_string(), date);
    }
    for key in ["title", "url", "image", "source"] {
        if let Some(value) = record.remove(key) {
            out.insert(key.to_string(), value);
        }
    }
    if let Some(excerpt) = record.remove("excerpt") {
        out.insert("body".to_string(), excerpt);
    }
    out
}

/// Pull the `s` offset out of a `next` link such as `i.js?q=x&s=100&...`
fn offset_from_next(next: &str) -> Option<String> {
    let url = Url::parse("https://duckduckgo.com/").ok()?.join(next).ok()?;
    url.query_pairs()
        .find(|(k, _)| k == "s")
        .map(|(_, v)| v.into_owned())
}

fn extract_vqd(html: &str) -> Option<String> {
    VQD_RE.captures(html).map(|cap| cap[1].to_string())
}

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| anyhow!("invalid selector {:?}: {:?}", css, e))
}

fn element_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Resolve DuckDuckGo redirect links (`//duckduckgo.com/l/?uddg=...`).
///
/// Returns `None` for internal links such as ads.
fn resolve_href(href: &str) -> Option<String> {
    let absolute = if href.starts_with("//") {
        format!("https:{}", href)
    } else {
        href.to_string()
    };
    let url = Url::parse(&absolute).ok()?;

    let internal = url
        .host_str()
        .map(|h| h == "duckduckgo.com" || h.ends_with(".duckduckgo.com"))
        .unwrap_or(false);
    if !internal {
        return Some(absolute);
    }
    if url.path().starts_with("/l/") {
        return url
            .query_pairs()
            .find(|(k, _)| k == "uddg")
            .map(|(_, v)| v.into_owned());
    }
    None
}

/// Parse the HTML results page into `{title, href, body}` records
fn parse_html_results(html: &str) -> Result<Vec<RawResult>> {
    let document = Html::parse_document(html);
    let result_selector = selector("div.result")?;
    let title_selector = selector("a.result__a")?;
    let snippet_selector = selector(".result__snippet")?;

    let mut results = Vec::new();

    for element in document.select(&result_selector) {
        if element.value().classes().any(|c| c == "result--ad") {
            continue;
        }

        let title_elem = match element.select(&title_selector).next() {
            Some(t) => t,
            None => continue,
        };

        let title = element_text(title_elem);
        if title.is_empty() {
            continue;
        }

        let href = match title_elem.value().attr("href").and_then(resolve_href) {
            Some(h) => h,
            None => continue,
        };

        let body = element
            .select(&snippet_selector)
            .next()
            .map(element_text)
            .unwrap_or_default();

        let mut record = RawResult::new();
        record.insert("title".to_string(), Value::String(title));
        record.insert("href".to_string(), Value::String(href));
        record.insert("body".to_string(), Value::String(body));
        results.push(record);
    }

    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::{ImageFilters, ImageLicense, ImageSize};
    use serde_json::json;
    use wiremock::matchers::{body_string_contains, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const HTML_PAGE: &str = r#"
        <html><body>
          <div class="result results_links result--ad">
            <a class="result__a" href="https://duckduckgo.com/y.js?ad=1">Sponsored</a>
          </div>
          <div class="result results_links">
            <a class="result__a" href="//duckduckgo.com/l/?uddg=https%3A%2F%2Fwww.rust-lang.org%2F&amp;rut=abc">
              Rust   Programming Language
            </a>
            <a class="result__snippet">A language empowering everyone.</a>
          </div>
          <div class="result results_links">
            <a class="result__a" href="https://doc.rust-lang.org/book/">The Book</a>
          </div>
          <div class="result results_links">
            <a class="result__a" href="https://example.com/third">Third</a>
            <div class="result__snippet">third body</div>
          </div>
        </body></html>
    "#;

    fn backend(server: &MockServer) -> DuckDuckGo {
        DuckDuckGo::default().with_endpoints(Endpoints::at(&server.uri()))
    }

    /// Run a blocking session call off the async test runtime
    async fn run<F, T>(f: F) -> T
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        tokio::task::spawn_blocking(f).await.unwrap()
    }

    #[test]
    fn test_parse_html_results() {
        let results = parse_html_results(HTML_PAGE).unwrap();

        assert_eq!(results.len(), 3);
        assert_eq!(results[0]["title"], "Rust Programming Language");
        assert_eq!(results[0]["href"], "https://www.rust-lang.org/");
        assert_eq!(results[0]["body"], "A language empowering everyone.");
        assert_eq!(results[1]["href"], "https://doc.rust-lang.org/book/");
        assert_eq!(results[1]["body"], "");
        assert_eq!(results[2]["body"], "third body");
    }

    #[test]
    fn test_resolve_href() {
        assert_eq!(
            resolve_href("https://example.com/a").as_deref(),
            Some("https://example.com/a")
        );
        assert_eq!(
            resolve_href("//duckduckgo.com/l/?uddg=https%3A%2F%2Fexample.com%2F").as_deref(),
            Some("https://example.com/")
        );
        assert!(resolve_href("https://duckduckgo.com/y.js?ad=1").is_none());
        assert!(resolve_href("not a url").is_none());
    }

    #[test]
    fn test_extract_vqd() {
        assert_eq!(
            extract_vqd(r#"<script>vqd="4-1234567890";</script>"#).as_deref(),
            Some("4-1234567890")
        );
        assert_eq!(
            extract_vqd("...&vqd=4-987&p=1").as_deref(),
            Some("4-987")
        );
        assert!(extract_vqd("<html></html>").is_none());
    }

    #[test]
    fn test_offset_from_next() {
        assert_eq!(
            offset_from_next("i.js?q=rust&o=json&s=100&u=bing").as_deref(),
            Some("100")
        );
        assert!(offset_from_next("i.js?q=rust").is_none());
    }

    #[test]
    fn test_news_record_reshape() {
        let record = json!({
            "date": 1704067200,
            "title": "Test News",
            "excerpt": "Test news content",
            "url": "https://example.com/news",
            "source": "example.com",
            "relative_time": "1 day ago"
        });
        let out = news_record(record.as_object().unwrap().clone());

        assert_eq!(out["date"], "2024-01-01T00:00:00+00:00");
        assert_eq!(out["body"], "Test news content");
        assert_eq!(out["title"], "Test News");
        assert!(!out.contains_key("image"));
        assert!(!out.contains_key("relative_time"));
    }

    #[tokio::test]
    async fn test_text_search_against_mock() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/html/"))
            .and(body_string_contains("q=rust"))
            .and(body_string_contains("kl=us-en"))
            .and(body_string_contains("kp=1"))
            .and(body_string_contains("df=w"))
            .respond_with(ResponseTemplate::new(200).set_body_string(HTML_PAGE))
            .expect(1)
            .mount(&server)
            .await;

        let backend = backend(&server);
        let query = SearchQuery::simple("rust")
            .with_region("us-en")
            .with_safesearch(SafeSearch::Strict)
            .with_time_limit(crate::search::TimeLimit::Week)
            .with_max_results(2);

        let results = run(move || {
            let mut session = backend.connect()?;
            let results = session.text(&query)?.collect::<Result<Vec<_>>>()?;
            Ok::<_, anyhow::Error>(results)
        })
        .await
        .unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(results[0]["href"], "https://www.rust-lang.org/");
    }

    #[test]
    fn test_image_filter_string() {
        assert_eq!(image_filter(&SearchQuery::simple("x")), ",,,,,");

        let query = SearchQuery::simple("x")
            .with_time_limit(TimeLimit::Week)
            .with_image_filters(ImageFilters {
                size: Some(ImageSize::Large),
                license_image: Some(ImageLicense::Public),
                ..ImageFilters::default()
            });
        assert_eq!(image_filter(&query), "time:Week,size:Large,,,,license:Public");
    }

    #[tokio::test]
    async fn test_image_search_pages_until_cap() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<script>vqd='4-42';</script>"))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/i.js"))
            .and(query_param("vqd", "4-42"))
            .and(query_param("f", ",size:Large,,,,"))
            .and(query_param("s", "2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "results": [{"title": "third", "image": "c.jpg", "height": 3, "width": 3}],
                "next": "i.js?q=logo&s=3"
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/i.js"))
            .and(query_param("vqd", "4-42"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "results": [
                    {"title": "first", "image": "a.jpg", "height": 1, "width": 1},
                    {"title": "second", "image": "b.jpg", "height": 2, "width": 2}
                ],
                "next": "i.js?q=logo&s=2"
            })))
            .mount(&server)
            .await;

        let backend = backend(&server);
        let query = SearchQuery::simple("logo")
            .with_max_results(3)
            .with_image_filters(crate::search::ImageFilters {
                size: Some(crate::search::ImageSize::Large),
                ..Default::default()
            });

        let results = run(move || {
            let mut session = backend.connect()?;
            let results = session.images(&query)?.collect::<Result<Vec<_>>>()?;
            Ok::<_, anyhow::Error>(results)
        })
        .await
        .unwrap();

        let titles: Vec<_> = results.iter().map(|r| r["title"].clone()).collect();
        assert_eq!(titles, vec![json!("first"), json!("second"), json!("third")]);
    }

    #[tokio::test]
    async fn test_news_search_reports_upstream_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(200).set_body_string("vqd=\"4-7\""))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/news.js"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let backend = backend(&server);
        let query = SearchQuery::simple("technology news");

        let outcome = run(move || {
            let mut session = backend.connect()?;
            let results = session.news(&query)?.collect::<Result<Vec<_>>>()?;
            Ok::<_, anyhow::Error>(results)
        })
        .await;

        let err = outcome.unwrap_err();
        assert!(err.to_string().contains("HTTP error: 500"));
    }

    #[tokio::test]
    async fn test_missing_vqd_fails_call() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html></html>"))
            .mount(&server)
            .await;

        let backend = backend(&server);
        let outcome = run(move || {
            let query = SearchQuery::simple("x");
            let mut session = backend.connect()?;
            let outcome = session.images(&query).map(|_| ());
            outcome
        })
        .await;

        assert!(outcome.unwrap_err().to_string().contains("vqd token not found"));
    }
}
