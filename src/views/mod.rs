//! Screen view models.
//!
//! Each screen is a pure function from fetched data and the viewer's session
//! to a serializable model that also lists the actions the viewer may take.
//! Handlers do the fetching; nothing in here performs I/O.

use serde::Serialize;

use crate::models::{poster_url, MediaType, Title};

pub mod account;
pub mod ai;
pub mod home;
pub mod lists;
pub mod search;
pub mod title;
pub mod top_rated;

/// Shown wherever a score or date is missing
pub const NOT_AVAILABLE: &str = "N/A";

/// Compact title tile used by feeds, grids and search results
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TitleCard {
    pub id: u64,
    pub media_type: MediaType,
    pub title: String,
    pub poster_url: Option<String>,
    pub year: Option<i32>,
    pub rating: String,
    /// Front-end route of the detail screen
    pub link: String,
}

impl From<&Title> for TitleCard {
    fn from(title: &Title) -> Self {
        TitleCard {
            id: title.id,
            media_type: title.media_type,
            title: title.title.clone(),
            poster_url: title.poster_path.as_deref().map(poster_url),
            year: title.release_year(),
            rating: format_vote(title.vote_average),
            link: title_link(title.media_type, title.id),
        }
    }
}

pub fn title_link(media_type: MediaType, tmdb_id: u64) -> String {
    format!("/{}/{}", media_type, tmdb_id)
}

/// Vote average with one decimal
pub fn format_vote(vote: Option<f64>) -> String {
    match vote {
        Some(v) => format!("{:.1}", v),
        None => NOT_AVAILABLE.to_string(),
    }
}

/// First `limit` titles as cards
pub fn cards(titles: &[Title], limit: usize) -> Vec<TitleCard> {
    titles.iter().take(limit).map(TitleCard::from).collect()
}
