use axum::{extract::State, Json};
use serde::Deserialize;

use crate::{
    auth::AuthUser,
    error::{AppError, AppResult},
    models::ScrapeResponse,
    state::AppState,
};

#[derive(Debug, Deserialize)]
pub struct ParseUrlRequest {
    #[serde(default)]
    pub url: String,
}

/// POST /api/parse-url — best-effort product page scrape.
///
/// A missing/blank URL is the only client error here. Every scrape failure —
/// launch, navigation, timeout, parse — comes back as a 200 with empty fields
/// and an advisory message, because scraping must never block the user's
/// manual-entry path. The failure detail is logged server-side only.
pub async fn parse_url(
    State(state): State<AppState>,
    _auth: AuthUser,
    Json(req): Json<ParseUrlRequest>,
) -> AppResult<Json<ScrapeResponse>> {
    let url = req.url.trim();
    if url.is_empty() {
        return Err(AppError::Validation("URL is required".into()));
    }

    match state.scraper.scrape(url).await {
        Ok(metadata) => Ok(Json(ScrapeResponse::success(metadata))),
        Err(e) => {
            tracing::warn!(error = %e, url = %url, "Scrape failed; returning manual-entry fallback");
            Ok(Json(ScrapeResponse::unavailable()))
        }
    }
}
