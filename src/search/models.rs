//! Search request models and validation
//!
//! Wire requests carry optional fields exactly as the caller sent them.
//! [`SearchQuery`] is the validated form handed to the dispatch layer: every
//! default is applied and every bound has been checked.

use super::error::{FieldError, ValidationError};
use crate::config::SearchSettings;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Maximum accepted query length, in characters
pub const MAX_QUERY_CHARS: usize = 500;

/// Hard upper bound on `max_results`; a configured limit never raises it
pub const MAX_RESULTS_CAP: u32 = 100;

/// Kind of search, selecting which upstream call is made
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchKind {
    Web,
    Images,
    News,
}

impl SearchKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Web => "web",
            Self::Images => "images",
            Self::News => "news",
        }
    }

    /// Capitalized label used in client-facing error messages
    pub fn label(&self) -> &'static str {
        match self {
            Self::Web => "Search",
            Self::Images => "Image search",
            Self::News => "News search",
        }
    }
}

impl fmt::Display for SearchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Safe search level
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SafeSearch {
    Strict,
    #[default]
    Moderate,
    Off,
}

impl SafeSearch {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Strict => "strict",
            Self::Moderate => "moderate",
            Self::Off => "off",
        }
    }
}

/// Time window filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeLimit {
    #[serde(alias = "d")]
    Day,
    #[serde(alias = "w")]
    Week,
    #[serde(alias = "m")]
    Month,
    #[serde(alias = "y")]
    Year,
}

impl TimeLimit {
    /// Single-letter code understood by the upstream backend
    pub fn code(&self) -> &'static str {
        match self {
            Self::Day => "d",
            Self::Week => "w",
            Self::Month => "m",
            Self::Year => "y",
        }
    }
}

/// Image size filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImageSize {
    #[serde(alias = "small")]
    Small,
    #[serde(alias = "medium")]
    Medium,
    #[serde(alias = "large")]
    Large,
    #[serde(alias = "wallpaper")]
    Wallpaper,
}

impl ImageSize {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Small => "Small",
            Self::Medium => "Medium",
            Self::Large => "Large",
            Self::Wallpaper => "Wallpaper",
        }
    }
}

/// Image color filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImageColor {
    #[serde(rename = "color")]
    Color,
    #[serde(alias = "monochrome")]
    Monochrome,
    #[serde(alias = "red")]
    Red,
    #[serde(alias = "orange")]
    Orange,
    #[serde(alias = "yellow")]
    Yellow,
    #[serde(alias = "green")]
    Green,
    #[serde(alias = "blue")]
    Blue,
    #[serde(alias = "purple")]
    Purple,
    #[serde(alias = "pink")]
    Pink,
    #[serde(alias = "brown")]
    Brown,
    #[serde(alias = "black")]
    Black,
    #[serde(alias = "gray")]
    Gray,
    #[serde(alias = "teal")]
    Teal,
    #[serde(alias = "white")]
    White,
}

impl ImageColor {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Color => "color",
            Self::Monochrome => "Monochrome",
            Self::Red => "Red",
            Self::Orange => "Orange",
            Self::Yellow => "Yellow",
            Self::Green => "Green",
            Self::Blue => "Blue",
            Self::Purple => "Purple",
            Self::Pink => "Pink",
            Self::Brown => "Brown",
            Self::Black => "Black",
            Self::Gray => "Gray",
            Self::Teal => "Teal",
            Self::White => "White",
        }
    }
}

/// Image type filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageType {
    Photo,
    Clipart,
    Gif,
    Transparent,
    Line,
}

impl ImageType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Photo => "photo",
            Self::Clipart => "clipart",
            Self::Gif => "gif",
            Self::Transparent => "transparent",
            Self::Line => "line",
        }
    }
}

/// Image layout filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImageLayout {
    #[serde(alias = "square")]
    Square,
    #[serde(alias = "tall")]
    Tall,
    #[serde(alias = "wide")]
    Wide,
}

impl ImageLayout {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Square => "Square",
            Self::Tall => "Tall",
            Self::Wide => "Wide",
        }
    }
}

/// Image license filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImageLicense {
    #[serde(rename = "any")]
    Any,
    #[serde(alias = "public")]
    Public,
    #[serde(alias = "share")]
    Share,
    #[serde(alias = "sharecommercially")]
    ShareCommercially,
    #[serde(alias = "modify")]
    Modify,
}

impl ImageLicense {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Any => "any",
            Self::Public => "Public",
            Self::Share => "Share",
            Self::ShareCommercially => "ShareCommercially",
            Self::Modify => "Modify",
        }
    }
}

/// Optional filters that only apply to image searches
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageFilters {
    pub size: Option<ImageSize>,
    pub color: Option<ImageColor>,
    pub type_image: Option<ImageType>,
    pub layout: Option<ImageLayout>,
    pub license_image: Option<ImageLicense>,
}

/// Validated search parameters for one dispatch
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchQuery {
    pub query: String,
    pub region: String,
    pub safesearch: SafeSearch,
    pub time_limit: Option<TimeLimit>,
    pub max_results: u32,
    pub image_filters: ImageFilters,
}

impl SearchQuery {
    /// Create a query with the stock defaults, skipping validation
    pub fn simple(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            region: "wt-wt".to_string(),
            safesearch: SafeSearch::Moderate,
            time_limit: None,
            max_results: 10,
            image_filters: ImageFilters::default(),
        }
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = region.into();
        self
    }

    pub fn with_safesearch(mut self, safesearch: SafeSearch) -> Self {
        self.safesearch = safesearch;
        self
    }

    pub fn with_time_limit(mut self, time_limit: TimeLimit) -> Self {
        self.time_limit = Some(time_limit);
        self
    }

    pub fn with_max_results(mut self, max_results: u32) -> Self {
        self.max_results = max_results;
        self
    }

    pub fn with_image_filters(mut self, filters: ImageFilters) -> Self {
        self.image_filters = filters;
        self
    }
}

/// Fields shared by every search request, before defaults and bounds
struct CommonFields {
    query: Option<String>,
    region: Option<String>,
    safesearch: Option<SafeSearch>,
    time_limit: Option<TimeLimit>,
    max_results: Option<i64>,
}

impl CommonFields {
    fn validate(self, defaults: &SearchSettings) -> Result<SearchQuery, ValidationError> {
        let mut errors = Vec::new();

        let query = match self.query {
            None => {
                errors.push(FieldError::new("query", "field required"));
                String::new()
            }
            Some(q) => {
                let chars = q.chars().count();
                if chars == 0 {
                    errors.push(FieldError::new(
                        "query",
                        "string should have at least 1 character",
                    ));
                } else if chars > MAX_QUERY_CHARS {
                    errors.push(FieldError::new(
                        "query",
                        format!("string should have at most {} characters", MAX_QUERY_CHARS),
                    ));
                }
                q
            }
        };

        let limit = defaults.max_results_limit.clamp(1, MAX_RESULTS_CAP);
        let max_results = match self.max_results {
            None => defaults.default_max_results.clamp(1, limit),
            Some(n) if (1..=i64::from(limit)).contains(&n) => n as u32,
            Some(_) => {
                errors.push(FieldError::new(
                    "max_results",
                    format!("value should be between 1 and {}", limit),
                ));
                0
            }
        };

        if !errors.is_empty() {
            return Err(ValidationError::new(errors));
        }

        Ok(SearchQuery {
            query,
            region: self
                .region
                .unwrap_or_else(|| defaults.default_region.clone()),
            safesearch: self.safesearch.unwrap_or(defaults.default_safesearch),
            time_limit: self.time_limit,
            max_results,
            image_filters: ImageFilters::default(),
        })
    }
}

/// Web search request body
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WebSearchRequest {
    pub query: Option<String>,
    pub region: Option<String>,
    pub safesearch: Option<SafeSearch>,
    pub time_limit: Option<TimeLimit>,
    pub max_results: Option<i64>,
}

impl WebSearchRequest {
    pub fn validate(self, defaults: &SearchSettings) -> Result<SearchQuery, ValidationError> {
        CommonFields {
            query: self.query,
            region: self.region,
            safesearch: self.safesearch,
            time_limit: self.time_limit,
            max_results: self.max_results,
        }
        .validate(defaults)
    }
}

/// Web search query-string parameters (`GET /search`)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WebSearchParams {
    #[serde(alias = "query")]
    pub q: Option<String>,
    pub region: Option<String>,
    pub safesearch: Option<SafeSearch>,
    pub time_limit: Option<TimeLimit>,
    pub max_results: Option<i64>,
}

impl From<WebSearchParams> for WebSearchRequest {
    fn from(params: WebSearchParams) -> Self {
        Self {
            query: params.q,
            region: params.region,
            safesearch: params.safesearch,
            time_limit: params.time_limit,
            max_results: params.max_results,
        }
    }
}

/// Image search request body
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImageSearchRequest {
    pub query: Option<String>,
    pub region: Option<String>,
    pub safesearch: Option<SafeSearch>,
    pub size: Option<ImageSize>,
    pub color: Option<ImageColor>,
    pub type_image: Option<ImageType>,
    pub layout: Option<ImageLayout>,
    pub license_image: Option<ImageLicense>,
    pub max_results: Option<i64>,
}

impl ImageSearchRequest {
    pub fn validate(self, defaults: &SearchSettings) -> Result<SearchQuery, ValidationError> {
        let filters = ImageFilters {
            size: self.size,
            color: self.color,
            type_image: self.type_image,
            layout: self.layout,
            license_image: self.license_image,
        };
        let query = CommonFields {
            query: self.query,
            region: self.region,
            safesearch: self.safesearch,
            time_limit: None,
            max_results: self.max_results,
        }
        .validate(defaults)?;
        Ok(query.with_image_filters(filters))
    }
}

/// News search request body
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewsSearchRequest {
    pub query: Option<String>,
    pub region: Option<String>,
    pub safesearch: Option<SafeSearch>,
    pub time_limit: Option<TimeLimit>,
    pub max_results: Option<i64>,
}

impl NewsSearchRequest {
    pub fn validate(self, defaults: &SearchSettings) -> Result<SearchQuery, ValidationError> {
        CommonFields {
            query: self.query,
            region: self.region,
            safesearch: self.safesearch,
            time_limit: self.time_limit,
            max_results: self.max_results,
        }
        .validate(defaults)
    }
}
