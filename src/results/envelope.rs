//! Response envelopes wrapping mapped results

use super::types::{ImageResult, NewsResult, SearchResult};
use crate::search::{SafeSearch, SearchQuery, TimeLimit};
use serde::{Deserialize, Serialize};

/// ISO-8601 timestamp for the moment a response is built
pub fn timestamp() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Micros, true)
}

/// Web search response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse {
    pub success: bool,
    pub query: String,
    pub results: Vec<SearchResult>,
    pub total_results: usize,
    pub timestamp: String,
    pub region: String,
    pub safesearch: SafeSearch,
    pub time_limit: Option<TimeLimit>,
}

impl SearchResponse {
    pub fn new(query: &SearchQuery, results: Vec<SearchResult>) -> Self {
        Self {
            success: true,
            query: query.query.clone(),
            total_results: results.len(),
            results,
            timestamp: timestamp(),
            region: query.region.clone(),
            safesearch: query.safesearch,
            time_limit: query.time_limit,
        }
    }
}

/// Image search response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageSearchResponse {
    pub success: bool,
    pub query: String,
    pub results: Vec<ImageResult>,
    pub total_results: usize,
    pub timestamp: String,
    pub region: String,
}

impl ImageSearchResponse {
    pub fn new(query: &SearchQuery, results: Vec<ImageResult>) -> Self {
        Self {
            success: true,
            query: query.query.clone(),
            total_results: results.len(),
            results,
            timestamp: timestamp(),
            region: query.region.clone(),
        }
    }
}

/// News search response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewsSearchResponse {
    pub success: bool,
    pub query: String,
    pub results: Vec<NewsResult>,
    pub total_results: usize,
    pub timestamp: String,
    pub region: String,
}

impl NewsSearchResponse {
    pub fn new(query: &SearchQuery, results: Vec<NewsResult>) -> Self {
        Self {
            success: true,
            query: query.query.clone(),
            total_results: results.len(),
            results,
            timestamp: timestamp(),
            region: query.region.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_matches_results() {
        let query = SearchQuery::simple("rust").with_region("us-en");
        let results = vec![
            SearchResult {
                title: "a".to_string(),
                href: "https://a.example".to_string(),
                body: String::new(),
            };
            3
        ];
        let response = SearchResponse::new(&query, results);

        assert!(response.success);
        assert_eq!(response.total_results, response.results.len());
        assert_eq!(response.region, "us-en");
        assert_eq!(response.safesearch, SafeSearch::Moderate);
    }

    #[test]
    fn test_web_envelope_serializes_null_time_limit() {
        let response = SearchResponse::new(&SearchQuery::simple("rust"), vec![]);
        let value = serde_json::to_value(&response).unwrap();

        assert_eq!(value["total_results"], 0);
        assert_eq!(value["safesearch"], "moderate");
        assert!(value["time_limit"].is_null());
    }

    #[test]
    fn test_timestamp_is_rfc3339() {
        let ts = timestamp();
        assert!(chrono::DateTime::parse_from_rfc3339(&ts).is_ok());
    }
}
