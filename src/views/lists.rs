use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::title_link;
use crate::{
    models::{MediaType, MovieList},
    services::ranking::RankedList,
};

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ListItemView {
    pub id: Uuid,
    pub position: usize,
    pub rank: i32,
    pub media_type: MediaType,
    pub tmdb_id: u64,
    pub title: String,
    pub poster_url: Option<String>,
    pub link: String,
    pub can_move_left: bool,
    pub can_move_right: bool,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ListDetailView {
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub items: Vec<ListItemView>,
    /// Sharing an empty list is refused
    pub can_export: bool,
    pub snapshot_path: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ListsView {
    pub lists: Vec<MovieList>,
    pub selected: Option<ListDetailView>,
}

pub fn list_detail_view(list: &MovieList, items: &RankedList) -> ListDetailView {
    let last = items.len().saturating_sub(1);

    ListDetailView {
        id: list.id,
        name: list.name.clone(),
        created_at: list.created_at,
        items: items
            .items()
            .iter()
            .enumerate()
            .map(|(index, item)| ListItemView {
                id: item.id,
                position: index + 1,
                rank: item.rank,
                media_type: item.media_type,
                tmdb_id: item.tmdb_id,
                title: item.title.clone(),
                poster_url: item.poster_url.clone(),
                link: title_link(item.media_type, item.tmdb_id),
                can_move_left: index > 0,
                can_move_right: index < last,
            })
            .collect(),
        can_export: !items.is_empty(),
        snapshot_path: format!("/api/v1/lists/{}/snapshot", list.id),
    }
}

pub fn lists_view(lists: Vec<MovieList>, selected: Option<(&MovieList, &RankedList)>) -> ListsView {
    ListsView {
        selected: selected.map(|(list, items)| list_detail_view(list, items)),
        lists,
    }
}
