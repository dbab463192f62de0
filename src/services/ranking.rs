//! Rank bookkeeping for user lists.
//!
//! [`RankedList`] is the in-memory view of one list, always sorted by rank.
//! Ranks are an ordering key: `append` takes `max + 1`, `remove` leaves gaps,
//! and only an explicit reorder renumbers the list to `1..=N`. Every operation
//! reports the rank changes it made so the store can persist them as one batch.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{ListItem, NewListItem, RankAssignment, TitleRef},
};

/// Direction of a single-step move on the list screen
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MoveDirection {
    Left,
    Right,
}

/// A renumbering request against the rank-sorted sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RankEdit {
    Reorder { source: usize, destination: usize },
    Move { item_id: Uuid, direction: MoveDirection },
}

impl RankEdit {
    /// Applies the edit, returning the rank changes to persist
    pub fn apply(self, list: &mut RankedList) -> AppResult<Vec<RankAssignment>> {
        match self {
            RankEdit::Reorder {
                source,
                destination,
            } => list.reorder(source, destination),
            RankEdit::Move { item_id, direction } => {
                let index = list.position(item_id).ok_or_else(|| {
                    AppError::NotFound(format!("List item {} not found", item_id))
                })?;
                list.move_item(index, direction)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RankedList {
    list_id: Uuid,
    items: Vec<ListItem>,
}

impl RankedList {
    /// Builds the view from items in any order
    pub fn new(list_id: Uuid, mut items: Vec<ListItem>) -> Self {
        items.sort_by(|a, b| a.rank.cmp(&b.rank).then(a.created_at.cmp(&b.created_at)));
        Self { list_id, items }
    }

    pub fn list_id(&self) -> Uuid {
        self.list_id
    }

    /// Items in rank order
    pub fn items(&self) -> &[ListItem] {
        &self.items
    }

    pub fn into_items(self) -> Vec<ListItem> {
        self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn position(&self, item_id: Uuid) -> Option<usize> {
        self.items.iter().position(|item| item.id == item_id)
    }

    pub fn contains(&self, title: TitleRef) -> bool {
        self.items
            .iter()
            .any(|item| item.media_type == title.media_type && item.tmdb_id == title.tmdb_id)
    }

    /// Rank the next appended item receives
    pub fn next_rank(&self) -> i32 {
        self.items.iter().map(|item| item.rank).max().unwrap_or(0) + 1
    }

    /// Places a new item at the end without touching existing ranks
    pub fn append(&mut self, new_item: NewListItem) -> ListItem {
        let item = ListItem {
            id: Uuid::new_v4(),
            list_id: self.list_id,
            media_type: new_item.title.media_type,
            tmdb_id: new_item.title.tmdb_id,
            title: new_item.name,
            poster_url: new_item.poster_url,
            rank: self.next_rank(),
            created_at: Utc::now(),
        };
        self.items.push(item.clone());
        item
    }

    /// Removes an item; the remaining ranks keep their gaps
    pub fn remove(&mut self, item_id: Uuid) -> Option<ListItem> {
        let index = self.position(item_id)?;
        Some(self.items.remove(index))
    }

    /// Moves the item at `source` to `destination` and renumbers the whole
    /// list to `1..=N`, returning only the assignments that changed.
    /// `source == destination` changes nothing, gaps included.
    pub fn reorder(&mut self, source: usize, destination: usize) -> AppResult<Vec<RankAssignment>> {
        let len = self.items.len();
        if source >= len || destination >= len {
            return Err(AppError::InvalidInput(format!(
                "Reorder indexes {} -> {} out of range for a list of {} items",
                source, destination, len
            )));
        }

        if source == destination {
            return Ok(Vec::new());
        }

        let moved = self.items.remove(source);
        self.items.insert(destination, moved);

        let mut changes = Vec::new();

        for (index, item) in self.items.iter_mut().enumerate() {
            let rank = index as i32 + 1;
            if item.rank != rank {
                item.rank = rank;
                changes.push(RankAssignment {
                    item_id: item.id,
                    rank,
                });
            }
        }

        Ok(changes)
    }

    /// Swaps the item at `index` with its neighbour; a move off either end is a no-op
    pub fn move_item(
        &mut self,
        index: usize,
        direction: MoveDirection,
    ) -> AppResult<Vec<RankAssignment>> {
        if index >= self.items.len() {
            return Err(AppError::InvalidInput(format!(
                "No item at position {}",
                index
            )));
        }

        let destination = match direction {
            MoveDirection::Left if index == 0 => return Ok(Vec::new()),
            MoveDirection::Left => index - 1,
            MoveDirection::Right if index + 1 == self.items.len() => return Ok(Vec::new()),
            MoveDirection::Right => index + 1,
        };

        self.reorder(index, destination)
    }

    pub fn has_contiguous_ranks(&self) -> bool {
        self.items
            .iter()
            .enumerate()
            .all(|(index, item)| item.rank == index as i32 + 1)
    }
}
