//! Result type definitions and upstream record mappers

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A loosely typed upstream record; fields may be missing or of any type
pub type RawResult = Map<String, Value>;

/// A single web search result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    pub title: String,
    pub href: String,
    pub body: String,
}

/// A single image search result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageResult {
    pub title: String,
    pub image: String,
    pub thumbnail: String,
    pub url: String,
    pub height: u64,
    pub width: u64,
    pub source: String,
}

/// A single news search result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsResult {
    pub date: String,
    pub title: String,
    pub body: String,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    pub source: String,
}

impl From<&RawResult> for SearchResult {
    fn from(raw: &RawResult) -> Self {
        Self {
            title: text_field(raw, "title"),
            href: text_field(raw, "href"),
            body: text_field(raw, "body"),
        }
    }
}

impl From<&RawResult> for ImageResult {
    fn from(raw: &RawResult) -> Self {
        Self {
            title: text_field(raw, "title"),
            image: text_field(raw, "image"),
            thumbnail: text_field(raw, "thumbnail"),
            url: text_field(raw, "url"),
            height: number_field(raw, "height"),
            width: number_field(raw, "width"),
            source: text_field(raw, "source"),
        }
    }
}

impl From<&RawResult> for NewsResult {
    fn from(raw: &RawResult) -> Self {
        Self {
            date: text_field(raw, "date"),
            title: text_field(raw, "title"),
            body: text_field(raw, "body"),
            url: text_field(raw, "url"),
            image: optional_text_field(raw, "image"),
            source: text_field(raw, "source"),
        }
    }
}

/// Map every raw record in order; mapping never fails
pub fn map_results<'a, T>(raw: &'a [RawResult]) -> Vec<T>
where
    T: From<&'a RawResult>,
{
    raw.iter().map(T::from).collect()
}

/// Text field, `""` when absent or null. Numbers and booleans are stringified.
fn text_field(raw: &RawResult, key: &str) -> String {
    optional_text_field(raw, key).unwrap_or_default()
}

fn optional_text_field(raw: &RawResult, key: &str) -> Option<String> {
    match raw.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

/// Non-negative integer field, `0` when absent or unparseable
fn number_field(raw: &RawResult, key: &str) -> u64 {
    match raw.get(key) {
        Some(Value::Number(n)) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64))
            .unwrap_or(0),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(0),
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(value: Value) -> RawResult {
        value.as_object().cloned().unwrap_or_default()
    }

    #[test]
    fn test_web_mapping() {
        let record = raw(json!({
            "title": "Test Title",
            "href": "https://example.com",
            "body": "Test body content",
            "extra": "ignored"
        }));
        assert_eq!(
            SearchResult::from(&record),
            SearchResult {
                title: "Test Title".to_string(),
                href: "https://example.com".to_string(),
                body: "Test body content".to_string(),
            }
        );
    }

    #[test]
    fn test_missing_fields_default() {
        let empty = RawResult::new();

        let web = SearchResult::from(&empty);
        assert_eq!(web.title, "");
        assert_eq!(web.href, "");
        assert_eq!(web.body, "");

        let image = ImageResult::from(&empty);
        assert_eq!(image.height, 0);
        assert_eq!(image.width, 0);
        assert_eq!(image.source, "");

        let news = NewsResult::from(&empty);
        assert_eq!(news.date, "");
        assert!(news.image.is_none());
    }

    #[test]
    fn test_required_keys_always_serialized() {
        let value = serde_json::to_value(ImageResult::from(&RawResult::new())).unwrap();
        for key in ["title", "image", "thumbnail", "url", "height", "width", "source"] {
            assert!(value.get(key).is_some(), "missing {}", key);
        }

        let news = serde_json::to_value(NewsResult::from(&RawResult::new())).unwrap();
        for key in ["date", "title", "body", "url", "source"] {
            assert!(news.get(key).is_some(), "missing {}", key);
        }
        assert!(news.get("image").is_none());
    }

    #[test]
    fn test_malformed_values_default() {
        let record = raw(json!({
            "title": null,
            "height": "480",
            "width": "wide",
            "source": ["not", "text"],
            "url": 42
        }));
        let image = ImageResult::from(&record);
        assert_eq!(image.title, "");
        assert_eq!(image.height, 480);
        assert_eq!(image.width, 0);
        assert_eq!(image.source, "");
        assert_eq!(image.url, "42");

        let negative = raw(json!({"height": -3, "width": 12.7}));
        let image = ImageResult::from(&negative);
        assert_eq!(image.height, 0);
        assert_eq!(image.width, 12);
    }

    #[test]
    fn test_news_image_present() {
        let record = raw(json!({
            "date": "2024-01-01",
            "title": "Test News",
            "body": "Test news content",
            "url": "https://example.com/news",
            "image": "https://example.com/news.jpg",
            "source": "example.com"
        }));
        let news = NewsResult::from(&record);
        assert_eq!(news.image.as_deref(), Some("https://example.com/news.jpg"));
        assert_eq!(news.date, "2024-01-01");
    }

    #[test]
    fn test_map_results_preserves_order() {
        let records: Vec<RawResult> = (0..5)
            .map(|i| raw(json!({"title": format!("r{}", i)})))
            .collect();
        let mapped: Vec<SearchResult> = map_results(&records);
        let titles: Vec<_> = mapped.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, vec!["r0", "r1", "r2", "r3", "r4"]);
    }
}
