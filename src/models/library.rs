use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{MediaType, TitleRef};
use crate::error::AppError;

/// Result of a non-idempotent insert
///
/// A uniqueness conflict is a benign condition the caller reports as a notice,
/// not a failure.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "record", rename_all = "snake_case")]
pub enum InsertOutcome<T> {
    Created(T),
    AlreadyExists,
}

impl<T> InsertOutcome<T> {
    pub fn is_created(&self) -> bool {
        matches!(self, InsertOutcome::Created(_))
    }

    pub fn created(self) -> Option<T> {
        match self {
            InsertOutcome::Created(value) => Some(value),
            InsertOutcome::AlreadyExists => None,
        }
    }
}

/// A title the user intends to watch
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WatchlistEntry {
    pub id: Uuid,
    pub user_id: Uuid,
    pub media_type: MediaType,
    pub tmdb_id: u64,
    pub title: String,
    pub poster_path: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl WatchlistEntry {
    pub fn title_ref(&self) -> TitleRef {
        TitleRef {
            media_type: self.media_type,
            tmdb_id: self.tmdb_id,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewWatchlistEntry {
    pub user_id: Uuid,
    pub title: TitleRef,
    pub name: String,
    pub poster_path: Option<String>,
}

/// Star rating from 1 to 5
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(try_from = "i32", into = "i32")]
pub struct Rating(u8);

impl Rating {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 5;

    pub fn value(&self) -> u8 {
        self.0
    }
}

impl TryFrom<i32> for Rating {
    type Error = AppError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        if (Self::MIN as i32..=Self::MAX as i32).contains(&value) {
            Ok(Rating(value as u8))
        } else {
            Err(AppError::InvalidInput(format!(
                "Rating must be between {} and {}, got {}",
                Self::MIN,
                Self::MAX,
                value
            )))
        }
    }
}

impl From<Rating> for i32 {
    fn from(rating: Rating) -> Self {
        rating.0 as i32
    }
}

/// A user's review of one title
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Review {
    pub id: Uuid,
    pub user_id: Uuid,
    pub media_type: MediaType,
    pub tmdb_id: u64,
    pub title: String,
    pub poster_path: Option<String>,
    pub rating: Rating,
    pub body: String,
    pub author_name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewReview {
    pub user_id: Uuid,
    pub title: TitleRef,
    pub name: String,
    pub poster_path: Option<String>,
    pub rating: Rating,
    pub body: String,
    pub author_name: String,
}

/// A user-curated, ranked collection of titles
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MovieList {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// One entry of a [`MovieList`]; `rank` orders entries but may have gaps
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ListItem {
    pub id: Uuid,
    pub list_id: Uuid,
    pub media_type: MediaType,
    pub tmdb_id: u64,
    pub title: String,
    pub poster_url: Option<String>,
    pub rank: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewListItem {
    pub title: TitleRef,
    pub name: String,
    pub poster_url: Option<String>,
}

/// New rank for one list item, written as part of a single batch
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct RankAssignment {
    pub item_id: Uuid,
    pub rank: i32,
}
