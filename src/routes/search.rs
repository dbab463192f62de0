use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;

use super::{degrade, AppState};
use crate::{
    auth::{ClientSession, CurrentSession},
    error::AppResult,
    services::RequestKind,
    views::search::{header_search_view, list_search_view, SearchView},
};

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    q: String,
}

/// Header type-ahead. A response overtaken by a newer keystroke is dropped
/// with 204; clearing the box counts as a keystroke.
pub async fn header_search(
    State(state): State<AppState>,
    client: ClientSession,
    Query(params): Query<SearchQuery>,
) -> AppResult<Json<SearchView>> {
    let ticket = state
        .inflight
        .begin(client.client_id.0, RequestKind::HeaderSearch);
    if params.q.trim().is_empty() {
        return Ok(Json(ticket.finish(Ok(header_search_view("", &[])))?));
    }

    let results = degrade("search/multi", state.metadata.search_multi(&params.q).await);
    let view = results.map(|titles| header_search_view(&params.q, &titles));

    Ok(Json(ticket.finish(view)?))
}

/// Movie search on the list screen
pub async fn list_search(
    State(state): State<AppState>,
    client: ClientSession,
    CurrentSession(_session): CurrentSession,
    Query(params): Query<SearchQuery>,
) -> AppResult<Json<SearchView>> {
    let ticket = state
        .inflight
        .begin(client.client_id.0, RequestKind::ListSearch);
    if params.q.trim().is_empty() {
        return Ok(Json(ticket.finish(Ok(list_search_view("", &[])))?));
    }

    let results = degrade("search/movie", state.metadata.search_movies(&params.q).await);
    let view = results.map(|titles| list_search_view(&params.q, &titles));

    Ok(Json(ticket.finish(view)?))
}
