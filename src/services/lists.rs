use std::sync::Arc;

use uuid::Uuid;

use crate::{
    db::Store,
    error::{AppError, AppResult},
    models::{poster_url, InsertOutcome, ListItem, MovieList, NewListItem, TitleRef},
    services::{
        ranking::{MoveDirection, RankEdit, RankedList},
        snapshot::{Snapshot, SnapshotRenderer},
    },
};

const MAX_LIST_NAME_CHARS: usize = 100;

/// Owner-scoped operations on ranked lists
#[derive(Clone)]
pub struct ListManager {
    store: Arc<dyn Store>,
    renderer: Arc<dyn SnapshotRenderer>,
}

fn list_not_found(list_id: Uuid) -> AppError {
    AppError::NotFound(format!("List {} not found", list_id))
}

/// Trims a list name, rejecting blank or overlong names
pub fn validate_list_name(name: &str) -> AppResult<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::InvalidInput("List name is required".to_string()));
    }
    if name.chars().count() > MAX_LIST_NAME_CHARS {
        return Err(AppError::InvalidInput(format!(
            "List name must be at most {} characters",
            MAX_LIST_NAME_CHARS
        )));
    }
    Ok(name.to_string())
}

impl ListManager {
    pub fn new(store: Arc<dyn Store>, renderer: Arc<dyn SnapshotRenderer>) -> Self {
        Self { store, renderer }
    }

    pub async fn lists(&self, owner_id: Uuid) -> AppResult<Vec<MovieList>> {
        self.store.lists(owner_id).await
    }

    pub async fn create_list(&self, owner_id: Uuid, name: &str) -> AppResult<MovieList> {
        let name = validate_list_name(name)?;
        let list = self.store.create_list(owner_id, name).await?;
        tracing::info!(list_id = %list.id, owner_id = %owner_id, "Created list");
        Ok(list)
    }

    pub async fn delete_list(&self, owner_id: Uuid, list_id: Uuid) -> AppResult<()> {
        if !self.store.delete_list(owner_id, list_id).await? {
            return Err(list_not_found(list_id));
        }
        tracing::info!(list_id = %list_id, "Deleted list");
        Ok(())
    }

    /// The list record and its items in rank order
    pub async fn list_with_items(
        &self,
        owner_id: Uuid,
        list_id: Uuid,
    ) -> AppResult<(MovieList, RankedList)> {
        let list = self
            .store
            .list(owner_id, list_id)
            .await?
            .ok_or_else(|| list_not_found(list_id))?;
        let items = self.store.list_items(owner_id, list_id).await?;
        Ok((list, items))
    }

    /// Appends a title to the end of the list
    pub async fn add_title(
        &self,
        owner_id: Uuid,
        list_id: Uuid,
        title: TitleRef,
        name: &str,
        poster_path: Option<&str>,
    ) -> AppResult<InsertOutcome<ListItem>> {
        let item = NewListItem {
            title,
            name: name.to_string(),
            poster_url: poster_path.map(poster_url),
        };

        let outcome = self.store.append_list_item(owner_id, list_id, item).await?;
        if !outcome.is_created() {
            tracing::info!(list_id = %list_id, title = %title, "Title already on list");
        }
        Ok(outcome)
    }

    pub async fn remove_item(&self, owner_id: Uuid, list_id: Uuid, item_id: Uuid) -> AppResult<()> {
        if !self.store.remove_list_item(owner_id, list_id, item_id).await? {
            return Err(AppError::NotFound(format!(
                "List item {} not found",
                item_id
            )));
        }
        Ok(())
    }

    pub async fn reorder(
        &self,
        owner_id: Uuid,
        list_id: Uuid,
        source: usize,
        destination: usize,
    ) -> AppResult<RankedList> {
        self.store
            .reorder_list_items(
                owner_id,
                list_id,
                RankEdit::Reorder {
                    source,
                    destination,
                },
            )
            .await
    }

    pub async fn move_item(
        &self,
        owner_id: Uuid,
        list_id: Uuid,
        item_id: Uuid,
        direction: MoveDirection,
    ) -> AppResult<RankedList> {
        self.store
            .reorder_list_items(owner_id, list_id, RankEdit::Move { item_id, direction })
            .await
    }

    /// Renders the list as a downloadable image
    pub async fn export_snapshot(&self, owner_id: Uuid, list_id: Uuid) -> AppResult<Snapshot> {
        let (list, items) = self.list_with_items(owner_id, list_id).await?;
        if items.is_empty() {
            return Err(AppError::InvalidInput(
                "No movies in list to share".to_string(),
            ));
        }

        let snapshot = self.renderer.render(&list, &items)?;
        tracing::info!(list_id = %list_id, items = items.len(), bytes = snapshot.body.len(), "Exported list snapshot");
        Ok(snapshot)
    }
}
