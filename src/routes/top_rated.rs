use axum::{
    extract::{Path, State},
    Json,
};

use super::AppState;
use crate::{
    error::AppResult,
    models::{MediaType, Page, Title},
    views::top_rated::{parse_page, top_rated_view, TopRatedView, MAX_PROVIDER_PAGE},
};

async fn fetch_page(state: &AppState, media_type: MediaType, page_no: u32) -> AppResult<Page<Title>> {
    match state.metadata.top_rated(media_type, page_no).await {
        Ok(page) => Ok(page),
        Err(e) if e.is_degradable() => {
            tracing::warn!(media_type = %media_type, page = page_no, error = %e, "Top rated page unavailable");
            Ok(Page::empty(page_no))
        }
        Err(e) => Err(e),
    }
}

/// Pages past the last one are served as the last page, so the titles and the
/// pagination always describe the same page
async fn top_rated(state: &AppState, media_type: MediaType, pgno: &str) -> AppResult<TopRatedView> {
    let mut page_no = parse_page(pgno)?.min(MAX_PROVIDER_PAGE);
    let mut page = fetch_page(state, media_type, page_no).await?;

    let last = page.total_pages.clamp(1, MAX_PROVIDER_PAGE);
    if page_no > last {
        tracing::debug!(media_type = %media_type, requested = page_no, last, "Serving last top rated page");
        page_no = last;
        page = fetch_page(state, media_type, page_no).await?;
    }

    Ok(top_rated_view(media_type, page_no, &page))
}

pub async fn top_rated_movies(
    State(state): State<AppState>,
    Path(pgno): Path<String>,
) -> AppResult<Json<TopRatedView>> {
    Ok(Json(top_rated(&state, MediaType::Movie, &pgno).await?))
}

pub async fn top_rated_tv_shows(
    State(state): State<AppState>,
    Path(pgno): Path<String>,
) -> AppResult<Json<TopRatedView>> {
    Ok(Json(top_rated(&state, MediaType::Tv, &pgno).await?))
}
