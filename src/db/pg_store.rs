use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use super::store::Store;
use crate::{
    error::{AppError, AppResult},
    models::{
        InsertOutcome, ListItem, MediaType, MovieList, NewListItem, NewReview, NewWatchlistEntry,
        Rating, Review, TitleRef, WatchlistEntry,
    },
    services::ranking::{RankEdit, RankedList},
};

/// SQLSTATE for unique_violation
const UNIQUE_VIOLATION: &str = "23505";

fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .and_then(|db| db.code())
        .is_some_and(|code| code == UNIQUE_VIOLATION)
}

fn tmdb_id_to_db(tmdb_id: u64) -> AppResult<i64> {
    i64::try_from(tmdb_id)
        .map_err(|_| AppError::InvalidInput(format!("TMDB id {} is out of range", tmdb_id)))
}

fn tmdb_id_from_db(tmdb_id: i64) -> AppResult<u64> {
    u64::try_from(tmdb_id)
        .map_err(|_| AppError::Internal(format!("Negative TMDB id {} in database", tmdb_id)))
}

#[derive(sqlx::FromRow)]
struct WatchlistRow {
    id: Uuid,
    user_id: Uuid,
    media_type: String,
    tmdb_id: i64,
    title: String,
    poster_path: Option<String>,
    created_at: DateTime<Utc>,
}

impl TryFrom<WatchlistRow> for WatchlistEntry {
    type Error = AppError;

    fn try_from(row: WatchlistRow) -> Result<Self, Self::Error> {
        Ok(WatchlistEntry {
            id: row.id,
            user_id: row.user_id,
            media_type: row.media_type.parse()?,
            tmdb_id: tmdb_id_from_db(row.tmdb_id)?,
            title: row.title,
            poster_path: row.poster_path,
            created_at: row.created_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct ReviewRow {
    id: Uuid,
    user_id: Uuid,
    media_type: String,
    tmdb_id: i64,
    title: String,
    poster_path: Option<String>,
    rating: i32,
    body: String,
    author_name: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<ReviewRow> for Review {
    type Error = AppError;

    fn try_from(row: ReviewRow) -> Result<Self, Self::Error> {
        Ok(Review {
            id: row.id,
            user_id: row.user_id,
            media_type: row.media_type.parse()?,
            tmdb_id: tmdb_id_from_db(row.tmdb_id)?,
            title: row.title,
            poster_path: row.poster_path,
            rating: Rating::try_from(row.rating)?,
            body: row.body,
            author_name: row.author_name,
            created_at: row.created_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct MovieListRow {
    id: Uuid,
    owner_id: Uuid,
    name: String,
    created_at: DateTime<Utc>,
}

impl From<MovieListRow> for MovieList {
    fn from(row: MovieListRow) -> Self {
        MovieList {
            id: row.id,
            owner_id: row.owner_id,
            name: row.name,
            created_at: row.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct ListItemRow {
    id: Uuid,
    list_id: Uuid,
    media_type: String,
    tmdb_id: i64,
    title: String,
    poster_url: Option<String>,
    rank: i32,
    created_at: DateTime<Utc>,
}

impl TryFrom<ListItemRow> for ListItem {
    type Error = AppError;

    fn try_from(row: ListItemRow) -> Result<Self, Self::Error> {
        Ok(ListItem {
            id: row.id,
            list_id: row.list_id,
            media_type: row.media_type.parse::<MediaType>()?,
            tmdb_id: tmdb_id_from_db(row.tmdb_id)?,
            title: row.title,
            poster_url: row.poster_url,
            rank: row.rank,
            created_at: row.created_at,
        })
    }
}

fn convert_rows<R, T>(rows: Vec<R>) -> AppResult<Vec<T>>
where
    T: TryFrom<R, Error = AppError>,
{
    rows.into_iter().map(T::try_from).collect()
}

/// PostgreSQL-backed [`Store`]
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Locks the owner's list row for the rest of the transaction
    async fn lock_list(
        tx: &mut Transaction<'_, Postgres>,
        owner_id: Uuid,
        list_id: Uuid,
    ) -> AppResult<()> {
        let locked: Option<Uuid> = sqlx::query_scalar(
            "SELECT id FROM movie_lists WHERE id = $1 AND owner_id = $2 FOR UPDATE",
        )
        .bind(list_id)
        .bind(owner_id)
        .fetch_optional(&mut **tx)
        .await?;

        locked
            .map(|_| ())
            .ok_or_else(|| AppError::NotFound(format!("List {} not found", list_id)))
    }

    async fn load_items(
        tx: &mut Transaction<'_, Postgres>,
        list_id: Uuid,
    ) -> AppResult<RankedList> {
        let rows: Vec<ListItemRow> = sqlx::query_as(
            r#"
            SELECT id, list_id, media_type, tmdb_id, title, poster_url, rank, created_at
            FROM movie_list_items
            WHERE list_id = $1
            ORDER BY rank, created_at
            "#,
        )
        .bind(list_id)
        .fetch_all(&mut **tx)
        .await?;

        Ok(RankedList::new(list_id, convert_rows(rows)?))
    }
}

#[async_trait::async_trait]
impl Store for PgStore {
    async fn watchlist(&self, user_id: Uuid) -> AppResult<Vec<WatchlistEntry>> {
        let rows: Vec<WatchlistRow> = sqlx::query_as(
            r#"
            SELECT id, user_id, media_type, tmdb_id, title, poster_path, created_at
            FROM watchlist_entries
            WHERE user_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        convert_rows(rows)
    }

    async fn is_in_watchlist(&self, user_id: Uuid, title: TitleRef) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM watchlist_entries
                WHERE user_id = $1 AND media_type = $2 AND tmdb_id = $3
            )
            "#,
        )
        .bind(user_id)
        .bind(title.media_type.as_str())
        .bind(tmdb_id_to_db(title.tmdb_id)?)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn add_to_watchlist(
        &self,
        entry: NewWatchlistEntry,
    ) -> AppResult<InsertOutcome<WatchlistEntry>> {
        let result = sqlx::query_as::<_, WatchlistRow>(
            r#"
            INSERT INTO watchlist_entries (id, user_id, media_type, tmdb_id, title, poster_path)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, user_id, media_type, tmdb_id, title, poster_path, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(entry.user_id)
        .bind(entry.title.media_type.as_str())
        .bind(tmdb_id_to_db(entry.title.tmdb_id)?)
        .bind(&entry.name)
        .bind(&entry.poster_path)
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(row) => Ok(InsertOutcome::Created(row.try_into()?)),
            Err(e) if is_unique_violation(&e) => {
                tracing::debug!(user_id = %entry.user_id, title = %entry.title, "Watchlist entry already exists");
                Ok(InsertOutcome::AlreadyExists)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn remove_from_watchlist(&self, user_id: Uuid, title: TitleRef) -> AppResult<bool> {
        let result = sqlx::query(
            "DELETE FROM watchlist_entries WHERE user_id = $1 AND media_type = $2 AND tmdb_id = $3",
        )
        .bind(user_id)
        .bind(title.media_type.as_str())
        .bind(tmdb_id_to_db(title.tmdb_id)?)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn reviews_for_title(&self, title: TitleRef) -> AppResult<Vec<Review>> {
        let rows: Vec<ReviewRow> = sqlx::query_as(
            r#"
            SELECT id, user_id, media_type, tmdb_id, title, poster_path, rating, body, author_name, created_at
            FROM reviews
            WHERE media_type = $1 AND tmdb_id = $2
            ORDER BY created_at DESC
            "#,
        )
        .bind(title.media_type.as_str())
        .bind(tmdb_id_to_db(title.tmdb_id)?)
        .fetch_all(&self.pool)
        .await?;

        convert_rows(rows)
    }

    async fn reviews_by_user(&self, user_id: Uuid) -> AppResult<Vec<Review>> {
        let rows: Vec<ReviewRow> = sqlx::query_as(
            r#"
            SELECT id, user_id, media_type, tmdb_id, title, poster_path, rating, body, author_name, created_at
            FROM reviews
            WHERE user_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        convert_rows(rows)
    }

    async fn add_review(&self, review: NewReview) -> AppResult<InsertOutcome<Review>> {
        let result = sqlx::query_as::<_, ReviewRow>(
            r#"
            INSERT INTO reviews (id, user_id, media_type, tmdb_id, title, poster_path, rating, body, author_name)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING id, user_id, media_type, tmdb_id, title, poster_path, rating, body, author_name, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(review.user_id)
        .bind(review.title.media_type.as_str())
        .bind(tmdb_id_to_db(review.title.tmdb_id)?)
        .bind(&review.name)
        .bind(&review.poster_path)
        .bind(i32::from(review.rating))
        .bind(&review.body)
        .bind(&review.author_name)
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(row) => Ok(InsertOutcome::Created(row.try_into()?)),
            Err(e) if is_unique_violation(&e) => Ok(InsertOutcome::AlreadyExists),
            Err(e) => Err(e.into()),
        }
    }

    async fn delete_review(&self, user_id: Uuid, title: TitleRef) -> AppResult<bool> {
        let result = sqlx::query(
            "DELETE FROM reviews WHERE user_id = $1 AND media_type = $2 AND tmdb_id = $3",
        )
        .bind(user_id)
        .bind(title.media_type.as_str())
        .bind(tmdb_id_to_db(title.tmdb_id)?)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn lists(&self, owner_id: Uuid) -> AppResult<Vec<MovieList>> {
        let rows: Vec<MovieListRow> = sqlx::query_as(
            r#"
            SELECT id, owner_id, name, created_at
            FROM movie_lists
            WHERE owner_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(MovieList::from).collect())
    }

    async fn list(&self, owner_id: Uuid, list_id: Uuid) -> AppResult<Option<MovieList>> {
        let row: Option<MovieListRow> = sqlx::query_as(
            "SELECT id, owner_id, name, created_at FROM movie_lists WHERE id = $1 AND owner_id = $2",
        )
        .bind(list_id)
        .bind(owner_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(MovieList::from))
    }

    async fn create_list(&self, owner_id: Uuid, name: String) -> AppResult<MovieList> {
        let row: MovieListRow = sqlx::query_as(
            r#"
            INSERT INTO movie_lists (id, owner_id, name)
            VALUES ($1, $2, $3)
            RETURNING id, owner_id, name, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(owner_id)
        .bind(&name)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }

    async fn delete_list(&self, owner_id: Uuid, list_id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM movie_lists WHERE id = $1 AND owner_id = $2")
            .bind(list_id)
            .bind(owner_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_items(&self, owner_id: Uuid, list_id: Uuid) -> AppResult<RankedList> {
        let rows: Vec<ListItemRow> = sqlx::query_as(
            r#"
            SELECT i.id, i.list_id, i.media_type, i.tmdb_id, i.title, i.poster_url, i.rank, i.created_at
            FROM movie_list_items i
            JOIN movie_lists l ON l.id = i.list_id
            WHERE i.list_id = $1 AND l.owner_id = $2
            ORDER BY i.rank, i.created_at
            "#,
        )
        .bind(list_id)
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(RankedList::new(list_id, convert_rows(rows)?))
    }

    async fn append_list_item(
        &self,
        owner_id: Uuid,
        list_id: Uuid,
        item: NewListItem,
    ) -> AppResult<InsertOutcome<ListItem>> {
        let mut tx = self.pool.begin().await?;
        Self::lock_list(&mut tx, owner_id, list_id).await?;

        let mut ranked = Self::load_items(&mut tx, list_id).await?;
        if ranked.contains(item.title) {
            return Ok(InsertOutcome::AlreadyExists);
        }
        let appended = ranked.append(item);

        let result = sqlx::query_as::<_, ListItemRow>(
            r#"
            INSERT INTO movie_list_items (id, list_id, media_type, tmdb_id, title, poster_url, rank, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id, list_id, media_type, tmdb_id, title, poster_url, rank, created_at
            "#,
        )
        .bind(appended.id)
        .bind(list_id)
        .bind(appended.media_type.as_str())
        .bind(tmdb_id_to_db(appended.tmdb_id)?)
        .bind(&appended.title)
        .bind(&appended.poster_url)
        .bind(appended.rank)
        .bind(appended.created_at)
        .fetch_one(&mut *tx)
        .await;

        let row = match result {
            Ok(row) => row,
            Err(e) if is_unique_violation(&e) => return Ok(InsertOutcome::AlreadyExists),
            Err(e) => return Err(e.into()),
        };

        tx.commit().await?;
        tracing::info!(list_id = %list_id, rank = row.rank, "Appended list item");
        Ok(InsertOutcome::Created(row.try_into()?))
    }

    async fn remove_list_item(
        &self,
        owner_id: Uuid,
        list_id: Uuid,
        item_id: Uuid,
    ) -> AppResult<bool> {
        let result = sqlx::query(
            r#"
            DELETE FROM movie_list_items i
            USING movie_lists l
            WHERE i.id = $1 AND i.list_id = $2 AND l.id = i.list_id AND l.owner_id = $3
            "#,
        )
        .bind(item_id)
        .bind(list_id)
        .bind(owner_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn reorder_list_items(
        &self,
        owner_id: Uuid,
        list_id: Uuid,
        edit: RankEdit,
    ) -> AppResult<RankedList> {
        let mut tx = self.pool.begin().await?;
        Self::lock_list(&mut tx, owner_id, list_id).await?;

        let mut ranked = Self::load_items(&mut tx, list_id).await?;
        let changes = edit.apply(&mut ranked)?;

        if !changes.is_empty() {
            let ids: Vec<Uuid> = changes.iter().map(|c| c.item_id).collect();
            let ranks: Vec<i32> = changes.iter().map(|c| c.rank).collect();

            sqlx::query(
                r#"
                UPDATE movie_list_items
                SET rank = u.rank
                FROM UNNEST($1::uuid[], $2::int[]) AS u(id, rank)
                WHERE movie_list_items.id = u.id AND movie_list_items.list_id = $3
                "#,
            )
            .bind(&ids)
            .bind(&ranks)
            .bind(list_id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        tracing::info!(list_id = %list_id, changed = changes.len(), "Reordered list");
        Ok(ranked)
    }
}
