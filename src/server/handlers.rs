use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use super::error::ApiError;
use super::AppState;
use crate::discovery::FeedResult;
use crate::util::{normalize, validate_url};

#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    #[serde(default)]
    url: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    success: bool,
    searched_url: String,
    total_found: usize,
    feeds: Vec<FeedResult>,
}

/// `POST /api/search-feeds`
///
/// Normalizes and validates the submitted URL, then runs discovery against
/// it. Input and SSRF refusals answer 400 before any outbound request is
/// made; discovery failures map to statuses per the error taxonomy.
pub async fn search_feeds(
    State(state): State<AppState>,
    payload: Result<Json<SearchRequest>, JsonRejection>,
) -> Result<Json<SearchResponse>, ApiError> {
    let Json(request) =
        payload.map_err(|rejection| ApiError::invalid_body(rejection.to_string()))?;

    let input = request
        .url
        .as_deref()
        .map(str::trim)
        .filter(|url| !url.is_empty())
        .ok_or_else(ApiError::missing_url)?;

    let searched_url = normalize(input).map_err(ApiError::validation)?;
    validate_url(&searched_url).map_err(ApiError::validation)?;

    tracing::debug!(url = %searched_url, "searching for feeds");

    let feeds = state
        .discovery
        .discover(&searched_url)
        .await
        .map_err(ApiError::discovery)?;

    tracing::info!(url = %searched_url, found = feeds.len(), "feed search finished");

    Ok(Json(SearchResponse {
        success: true,
        total_found: feeds.len(),
        searched_url,
        feeds,
    }))
}

/// `GET /api/health`
pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
