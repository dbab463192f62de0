//! Persistence backend abstraction
//!
//! Everything the application keeps per user lives behind this trait: the
//! watchlist, reviews, and ranked lists. Each method is scoped by the owner's
//! id; a list that belongs to someone else reads as missing.

use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{
        InsertOutcome, ListItem, MovieList, NewListItem, NewReview, NewWatchlistEntry, Review,
        TitleRef, WatchlistEntry,
    },
    services::ranking::{RankEdit, RankedList},
};

#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait Store: Send + Sync {
    /// Watchlist entries, newest first
    async fn watchlist(&self, user_id: Uuid) -> AppResult<Vec<WatchlistEntry>>;

    async fn is_in_watchlist(&self, user_id: Uuid, title: TitleRef) -> AppResult<bool>;

    /// Inserts an entry; an existing (user, title) pair is reported, not failed
    async fn add_to_watchlist(
        &self,
        entry: NewWatchlistEntry,
    ) -> AppResult<InsertOutcome<WatchlistEntry>>;

    /// Returns whether an entry was removed
    async fn remove_from_watchlist(&self, user_id: Uuid, title: TitleRef) -> AppResult<bool>;

    /// Reviews of one title, newest first
    async fn reviews_for_title(&self, title: TitleRef) -> AppResult<Vec<Review>>;

    async fn reviews_by_user(&self, user_id: Uuid) -> AppResult<Vec<Review>>;

    /// Inserts a review; a second review of the same title by the same user
    /// comes back as [`InsertOutcome::AlreadyExists`]
    async fn add_review(&self, review: NewReview) -> AppResult<InsertOutcome<Review>>;

    async fn delete_review(&self, user_id: Uuid, title: TitleRef) -> AppResult<bool>;

    /// The owner's lists, newest first
    async fn lists(&self, owner_id: Uuid) -> AppResult<Vec<MovieList>>;

    async fn list(&self, owner_id: Uuid, list_id: Uuid) -> AppResult<Option<MovieList>>;

    async fn create_list(&self, owner_id: Uuid, name: String) -> AppResult<MovieList>;

    /// Deletes the list together with its items
    async fn delete_list(&self, owner_id: Uuid, list_id: Uuid) -> AppResult<bool>;

    /// Items of one list in rank order
    async fn list_items(&self, owner_id: Uuid, list_id: Uuid) -> AppResult<RankedList>;

    /// Appends at `max(rank) + 1`; a title already on the list is reported
    async fn append_list_item(
        &self,
        owner_id: Uuid,
        list_id: Uuid,
        item: NewListItem,
    ) -> AppResult<InsertOutcome<ListItem>>;

    /// Removes one item without renumbering the rest
    async fn remove_list_item(&self, owner_id: Uuid, list_id: Uuid, item_id: Uuid)
        -> AppResult<bool>;

    /// Applies a reorder and persists every changed rank atomically
    async fn reorder_list_items(
        &self,
        owner_id: Uuid,
        list_id: Uuid,
        edit: RankEdit,
    ) -> AppResult<RankedList>;
}
