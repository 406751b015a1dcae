//! HTTP request handlers

use super::error::ApiError;
use super::state::AppState;
use crate::results::{
    map_results, timestamp, ImageSearchResponse, NewsSearchResponse, RawResult,
    SearchResponse,
};
use crate::search::{
    ImageSearchRequest, NewsSearchRequest, SearchKind, SearchQuery, WebSearchParams,
    WebSearchRequest,
};
use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    http::Uri,
    response::IntoResponse,
    Json,
};
use serde_json::json;

/// API information
pub async fn index(State(state): State<AppState>) -> impl IntoResponse {
    let api = &state.settings.api;
    Json(json!({
        "message": api.title,
        "version": api.version,
        "endpoints": {
            "search": "/search",
            "search_images": "/search/images",
            "search_news": "/search/news",
            "health": "/health"
        },
        "powered_by": state.dispatcher.backend_name()
    }))
}

/// Health check handler
pub async fn health() -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "timestamp": timestamp()
    }))
}

/// `POST /search`
pub async fn search_web(
    State(state): State<AppState>,
    payload: Result<Json<WebSearchRequest>, JsonRejection>,
) -> Result<Json<SearchResponse>, ApiError> {
    let Json(request) = payload?;
    web(&state, request).await
}

/// `GET /search`, same semantics as the POST form
pub async fn search_web_get(
    State(state): State<AppState>,
    params: Result<Query<WebSearchParams>, QueryRejection>,
) -> Result<Json<SearchResponse>, ApiError> {
    let Query(params) = params?;
    web(&state, params.into()).await
}

/// `POST /search/images`
pub async fn search_images(
    State(state): State<AppState>,
    payload: Result<Json<ImageSearchRequest>, JsonRejection>,
) -> Result<Json<ImageSearchResponse>, ApiError> {
    let Json(request) = payload?;
    let query = request.validate(state.search_settings())?;
    let raw = dispatch(&state, SearchKind::Images, &query).await?;
    Ok(Json(ImageSearchResponse::new(&query, map_results(&raw))))
}

/// `POST /search/news`
pub async fn search_news(
    State(state): State<AppState>,
    payload: Result<Json<NewsSearchRequest>, JsonRejection>,
) -> Result<Json<NewsSearchResponse>, ApiError> {
    let Json(request) = payload?;
    let query = request.validate(state.search_settings())?;
    let raw = dispatch(&state, SearchKind::News, &query).await?;
    Ok(Json(NewsSearchResponse::new(&query, map_results(&raw))))
}

/// Unknown routes
pub async fn not_found(uri: Uri) -> ApiError {
    tracing::debug!("No route for {}", uri.path());
    ApiError::NotFound
}

async fn web(state: &AppState, request: WebSearchRequest) -> Result<Json<SearchResponse>, ApiError> {
    let query = request.validate(state.search_settings())?;
    let raw = dispatch(state, SearchKind::Web, &query).await?;
    Ok(Json(SearchResponse::new(&query, map_results(&raw))))
}

async fn dispatch(
    state: &AppState,
    kind: SearchKind,
    query: &SearchQuery,
) -> Result<Vec<RawResult>, ApiError> {
    state
        .dispatcher
        .search(kind, query.clone())
        .await
        .map_err(|e| ApiError::search(kind, e))
}
