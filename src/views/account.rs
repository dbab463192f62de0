use chrono::{DateTime, Utc};
use serde::Serialize;

use super::title_link;
use crate::models::{poster_url, MediaType, MovieList, Review, Session, WatchlistEntry};

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Profile {
    pub display_name: String,
    pub email: Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct AccountStats {
    pub watchlist_count: usize,
    pub review_count: usize,
    pub list_count: usize,
    /// Mean rating rounded to one decimal, 0 without reviews
    pub average_rating: f64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct LibraryEntryView {
    pub media_type: MediaType,
    pub tmdb_id: u64,
    pub title: String,
    pub poster_url: Option<String>,
    pub link: String,
    /// Path that removes this entry
    pub remove_path: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct AccountReviewView {
    #[serde(flatten)]
    pub entry: LibraryEntryView,
    pub rating: u8,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct AccountView {
    pub profile: Profile,
    pub stats: AccountStats,
    pub watchlist: Vec<LibraryEntryView>,
    pub reviews: Vec<AccountReviewView>,
    pub lists: Vec<MovieList>,
}

pub fn average_rating(reviews: &[Review]) -> f64 {
    if reviews.is_empty() {
        return 0.0;
    }
    let total: u32 = reviews.iter().map(|r| r.rating.value() as u32).sum();
    let mean = total as f64 / reviews.len() as f64;
    (mean * 10.0).round() / 10.0
}

fn entry(
    kind: &str,
    media_type: MediaType,
    tmdb_id: u64,
    title: &str,
    poster_path: Option<&str>,
) -> LibraryEntryView {
    LibraryEntryView {
        media_type,
        tmdb_id,
        title: title.to_string(),
        poster_url: poster_path.map(poster_url),
        link: title_link(media_type, tmdb_id),
        remove_path: format!("/api/v1/account/{}/{}/{}", kind, media_type, tmdb_id),
    }
}

pub fn account_view(
    session: &Session,
    watchlist: &[WatchlistEntry],
    reviews: &[Review],
    lists: Vec<MovieList>,
) -> AccountView {
    AccountView {
        profile: Profile {
            display_name: session.user.display_name.clone(),
            email: session.user.email.clone(),
        },
        stats: AccountStats {
            watchlist_count: watchlist.len(),
            review_count: reviews.len(),
            list_count: lists.len(),
            average_rating: average_rating(reviews),
        },
        watchlist: watchlist
            .iter()
            .map(|w| {
                entry(
                    "watchlist",
                    w.media_type,
                    w.tmdb_id,
                    &w.title,
                    w.poster_path.as_deref(),
                )
            })
            .collect(),
        reviews: reviews
            .iter()
            .map(|r| AccountReviewView {
                entry: entry(
                    "reviews",
                    r.media_type,
                    r.tmdb_id,
                    &r.title,
                    r.poster_path.as_deref(),
                ),
                rating: r.rating.value(),
                body: r.body.clone(),
                created_at: r.created_at,
            })
            .collect(),
        lists,
    }
}
