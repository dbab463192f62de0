use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Response,
    Json,
};
use serde::Deserialize;

use super::{insert_response, title_ref, AppState};
use crate::{
    auth::{CurrentSession, MaybeSession},
    error::{AppError, AppResult},
    models::{NewReview, NewWatchlistEntry, Rating},
    views::title::{title_view, TitleContext, TitleView, Viewer},
};

#[derive(Debug, Deserialize)]
pub struct ReviewRequest {
    pub rating: i32,
    pub body: String,
}

impl ReviewRequest {
    fn validate(&self) -> AppResult<(Rating, String)> {
        let body = self.body.trim();
        if body.is_empty() {
            return Err(AppError::InvalidInput("Review text is required".to_string()));
        }
        Ok((Rating::try_from(self.rating)?, body.to_string()))
    }
}

/// Detail screen: details, credits and reviews, plus the viewer's actions
pub async fn title_detail(
    State(state): State<AppState>,
    MaybeSession(session): MaybeSession,
    Path((media, id)): Path<(String, u64)>,
) -> AppResult<Json<TitleView>> {
    let title = title_ref(&media, id)?;

    let (details, credits, reviews) = tokio::join!(
        state.metadata.details(title),
        state.metadata.credits(title),
        state.store.reviews_for_title(title),
    );
    let details = details?;
    let credits = credits.map_err(|e| {
        tracing::warn!(title = %title, error = %e, "Credits unavailable");
        "Cast and crew are unavailable right now".to_string()
    });

    let viewer = match &session {
        Some(session) => Some(Viewer {
            user_id: session.user_id(),
            in_watchlist: state
                .store
                .is_in_watchlist(session.user_id(), title)
                .await?,
        }),
        None => None,
    };

    Ok(Json(title_view(&TitleContext {
        details,
        credits,
        reviews: reviews?,
        viewer,
    })))
}

pub async fn add_to_watchlist(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
    Path((media, id)): Path<(String, u64)>,
) -> AppResult<Response> {
    let title = title_ref(&media, id)?;
    let details = state.metadata.details(title).await?;

    let outcome = state
        .store
        .add_to_watchlist(NewWatchlistEntry {
            user_id: session.user_id(),
            title,
            name: details.title,
            poster_path: details.poster_path,
        })
        .await?;

    if outcome.is_created() {
        tracing::info!(user_id = %session.user_id(), title = %title, "Added to watchlist");
    }
    Ok(insert_response(outcome, "Already in your watchlist"))
}

pub async fn remove_from_watchlist(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
    Path((media, id)): Path<(String, u64)>,
) -> AppResult<StatusCode> {
    let title = title_ref(&media, id)?;

    if !state
        .store
        .remove_from_watchlist(session.user_id(), title)
        .await?
    {
        return Err(AppError::NotFound(format!("{} is not in your watchlist", title)));
    }
    tracing::info!(user_id = %session.user_id(), title = %title, "Removed from watchlist");
    Ok(StatusCode::NO_CONTENT)
}

pub async fn add_review(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
    Path((media, id)): Path<(String, u64)>,
    Json(request): Json<ReviewRequest>,
) -> AppResult<Response> {
    let title = title_ref(&media, id)?;
    let (rating, body) = request.validate()?;
    let details = state.metadata.details(title).await?;

    let outcome = state
        .store
        .add_review(NewReview {
            user_id: session.user_id(),
            title,
            name: details.title,
            poster_path: details.poster_path,
            rating,
            body,
            author_name: session.user.display_name.clone(),
        })
        .await?;

    Ok(insert_response(outcome, "You have already reviewed this title"))
}

pub async fn delete_review(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
    Path((media, id)): Path<(String, u64)>,
) -> AppResult<StatusCode> {
    let title = title_ref(&media, id)?;

    if !state.store.delete_review(session.user_id(), title).await? {
        return Err(AppError::NotFound(format!("No review of {} to delete", title)));
    }
    Ok(StatusCode::NO_CONTENT)
}
