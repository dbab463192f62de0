use axum::{extract::State, Json};

use super::{degrade, AppState};
use crate::{
    error::AppResult,
    models::MediaType,
    views::home::{home_view, HomeFeeds, HomeView},
};

/// Home feed: the five sections are fetched concurrently and degrade
/// independently
pub async fn home(State(state): State<AppState>) -> AppResult<Json<HomeView>> {
    let metadata = &state.metadata;

    let (trending_all, trending_movies, trending_tv, top_movies, top_tv) = tokio::join!(
        metadata.trending(None),
        metadata.trending(Some(MediaType::Movie)),
        metadata.trending(Some(MediaType::Tv)),
        metadata.top_rated(MediaType::Movie, 1),
        metadata.top_rated(MediaType::Tv, 1),
    );

    let feeds = HomeFeeds {
        trending_all: degrade("trending/all", trending_all)?,
        trending_movies: degrade("trending/movie", trending_movies)?,
        trending_tv: degrade("trending/tv", trending_tv)?,
        top_rated_movies: degrade("top_rated/movie", top_movies.map(|p| p.results))?,
        top_rated_tv: degrade("top_rated/tv", top_tv.map(|p| p.results))?,
    };

    Ok(Json(home_view(&feeds)))
}
