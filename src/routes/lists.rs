use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use super::{insert_response, AppState};
use crate::{
    auth::CurrentSession,
    error::{AppError, AppResult},
    models::{MediaType, TitleRef},
    services::{MoveDirection, RankedList},
    views::lists::{list_detail_view, lists_view, ListDetailView, ListsView},
};

#[derive(Debug, Deserialize)]
pub struct IndexQuery {
    /// List to open alongside the index
    pub selected: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct CreateListRequest {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct AddItemRequest {
    pub tmdb_id: u64,
    #[serde(default = "default_media_type")]
    pub media_type: MediaType,
}

fn default_media_type() -> MediaType {
    MediaType::Movie
}

#[derive(Debug, Deserialize)]
pub struct ReorderRequest {
    pub source: usize,
    pub destination: usize,
}

#[derive(Debug, Deserialize)]
pub struct MoveRequest {
    pub direction: MoveDirection,
}

pub async fn index(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
    Query(query): Query<IndexQuery>,
) -> AppResult<Json<ListsView>> {
    let owner_id = session.user_id();
    let lists = state.lists.lists(owner_id).await?;

    let selected = match query.selected {
        Some(list_id) => Some(state.lists.list_with_items(owner_id, list_id).await?),
        None => None,
    };

    Ok(Json(lists_view(
        lists,
        selected.as_ref().map(|(list, items)| (list, items)),
    )))
}

pub async fn create(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
    Json(request): Json<CreateListRequest>,
) -> AppResult<impl IntoResponse> {
    let list = state
        .lists
        .create_list(session.user_id(), &request.name)
        .await?;
    Ok((StatusCode::CREATED, Json(list)))
}

pub async fn show(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
    Path(list_id): Path<Uuid>,
) -> AppResult<Json<ListDetailView>> {
    let (list, items) = state
        .lists
        .list_with_items(session.user_id(), list_id)
        .await?;
    Ok(Json(list_detail_view(&list, &items)))
}

pub async fn destroy(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
    Path(list_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    state.lists.delete_list(session.user_id(), list_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn add_item(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
    Path(list_id): Path<Uuid>,
    Json(request): Json<AddItemRequest>,
) -> AppResult<Response> {
    let title = TitleRef {
        media_type: request.media_type,
        tmdb_id: request.tmdb_id,
    };
    let details = state.metadata.details(title).await?;

    let outcome = state
        .lists
        .add_title(
            session.user_id(),
            list_id,
            title,
            &details.title,
            details.poster_path.as_deref(),
        )
        .await?;

    Ok(insert_response(outcome, "Movie already in list"))
}

pub async fn remove_item(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
    Path((list_id, item_id)): Path<(Uuid, Uuid)>,
) -> AppResult<StatusCode> {
    state
        .lists
        .remove_item(session.user_id(), list_id, item_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn detail_after_edit(
    state: &AppState,
    owner_id: Uuid,
    items: RankedList,
) -> AppResult<Json<ListDetailView>> {
    let list_id = items.list_id();
    let list = state
        .store
        .list(owner_id, list_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("List {} not found", list_id)))?;
    Ok(Json(list_detail_view(&list, &items)))
}

/// Drag-and-drop: moves the item at `source` to `destination`
pub async fn reorder(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
    Path(list_id): Path<Uuid>,
    Json(request): Json<ReorderRequest>,
) -> AppResult<Json<ListDetailView>> {
    let owner_id = session.user_id();
    let items = state
        .lists
        .reorder(owner_id, list_id, request.source, request.destination)
        .await?;
    detail_after_edit(&state, owner_id, items).await
}

pub async fn move_item(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
    Path((list_id, item_id)): Path<(Uuid, Uuid)>,
    Json(request): Json<MoveRequest>,
) -> AppResult<Json<ListDetailView>> {
    let owner_id = session.user_id();
    let items = state
        .lists
        .move_item(owner_id, list_id, item_id, request.direction)
        .await?;
    detail_after_edit(&state, owner_id, items).await
}

/// Downloads the list as an image
pub async fn snapshot(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
    Path(list_id): Path<Uuid>,
) -> AppResult<Response> {
    let snapshot = state
        .lists
        .export_snapshot(session.user_id(), list_id)
        .await?;

    let disposition = format!("attachment; filename=\"{}\"", snapshot.file_name);
    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, snapshot.content_type.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        snapshot.body,
    )
        .into_response())
}
