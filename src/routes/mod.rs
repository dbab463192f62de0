use axum::{
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use serde::Serialize;
use serde_json::{json, Value};
use tower_http::trace::TraceLayer;

use crate::{
    error::AppResult,
    middleware::{make_span_with_request_context, request_context_middleware},
    models::{InsertOutcome, MediaType, TitleRef},
};

pub mod account;
pub mod ai;
pub mod auth;
pub mod home;
pub mod lists;
pub mod search;
pub mod state;
pub mod titles;
pub mod top_rated;

pub use state::AppState;

/// Creates the application router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .nest("/api/v1", api_routes())
        .nest("/auth", auth_routes())
        .with_state(state)
        .layer(TraceLayer::new_for_http().make_span_with(make_span_with_request_context))
        .layer(middleware::from_fn(request_context_middleware))
}

/// API routes under /api/v1
fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/home", get(home::home))
        .route("/search", get(search::header_search))
        .route("/top-rated-movies/:pgno", get(top_rated::top_rated_movies))
        .route("/top-rated-tv-shows/:pgno", get(top_rated::top_rated_tv_shows))
        .route("/titles/:media/:id", get(titles::title_detail))
        .route(
            "/titles/:media/:id/watchlist",
            post(titles::add_to_watchlist).delete(titles::remove_from_watchlist),
        )
        .route(
            "/titles/:media/:id/reviews",
            post(titles::add_review).delete(titles::delete_review),
        )
        .route("/account", get(account::dashboard))
        .route(
            "/account/watchlist/:media/:id",
            delete(titles::remove_from_watchlist),
        )
        .route("/account/reviews/:media/:id", delete(titles::delete_review))
        .route("/lists", get(lists::index).post(lists::create))
        .route("/lists/search", get(search::list_search))
        .route("/lists/:id", get(lists::show).delete(lists::destroy))
        .route("/lists/:id/items", post(lists::add_item))
        .route("/lists/:id/items/:item_id", delete(lists::remove_item))
        .route("/lists/:id/items/:item_id/move", post(lists::move_item))
        .route("/lists/:id/reorder", post(lists::reorder))
        .route("/lists/:id/snapshot", get(lists::snapshot))
        .route("/ai/recommendations", post(ai::recommend))
}

/// Session lifecycle routes under /auth
fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/sign-in", post(auth::sign_in))
        .route("/sign-up", post(auth::sign_up))
        .route("/callback", post(auth::callback))
        .route("/refresh", post(auth::refresh))
        .route("/sign-out", post(auth::sign_out))
        .route("/session", get(auth::session))
        .route("/oauth/:provider", get(auth::oauth))
        .route("/events", get(auth::events))
}

/// Health check endpoint
async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}

/// Parses the `:media/:id` path segments
pub(crate) fn title_ref(media: &str, tmdb_id: u64) -> AppResult<TitleRef> {
    Ok(TitleRef {
        media_type: media.parse::<MediaType>()?,
        tmdb_id,
    })
}

/// Swallows failures a feed can live without, logging them
pub(crate) fn degrade<T: Default>(feed: &str, result: AppResult<T>) -> AppResult<T> {
    match result {
        Ok(value) => Ok(value),
        Err(e) if e.is_degradable() => {
            tracing::warn!(feed = %feed, error = %e, "Feed unavailable, rendering empty");
            Ok(T::default())
        }
        Err(e) => Err(e),
    }
}

/// 201 with the record, or 200 with a notice when it already existed
pub(crate) fn insert_response<T: Serialize>(outcome: InsertOutcome<T>, notice: &str) -> Response {
    match outcome {
        created @ InsertOutcome::Created(_) => (StatusCode::CREATED, Json(created)).into_response(),
        InsertOutcome::AlreadyExists => (
            StatusCode::OK,
            Json(json!({ "status": "already_exists", "notice": notice })),
        )
            .into_response(),
    }
}
