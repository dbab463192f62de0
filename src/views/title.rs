use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::{format_vote, NOT_AVAILABLE};
use crate::models::{poster_url, Credits, MediaType, Review, TitleDetails};

const TOP_CAST: usize = 8;
const PRODUCERS: usize = 3;

/// What the watchlist button does for this viewer
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum WatchlistAction {
    Add,
    Remove,
    SignIn,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ReviewAction {
    Write,
    AlreadyReviewed,
    SignIn,
}

/// The signed-in viewer's relation to the title
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewer {
    pub user_id: Uuid,
    pub in_watchlist: bool,
}

/// Everything fetched for one detail screen
#[derive(Debug, Clone)]
pub struct TitleContext {
    pub details: TitleDetails,
    /// `Err` carries the message shown in place of the credits panel
    pub credits: Result<Credits, String>,
    pub reviews: Vec<Review>,
    pub viewer: Option<Viewer>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PersonView {
    pub name: String,
    pub role: Option<String>,
    pub profile_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CreditsView {
    pub director: Option<String>,
    pub writers: Vec<String>,
    pub producers: Vec<String>,
    pub cast: Vec<PersonView>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ReviewView {
    pub author: String,
    pub rating: u8,
    pub body: String,
    pub created_at: DateTime<Utc>,
    pub mine: bool,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TitleView {
    pub id: u64,
    pub media_type: MediaType,
    pub title: String,
    pub tagline: Option<String>,
    pub overview: Option<String>,
    pub poster_url: Option<String>,
    pub release_date: String,
    pub runtime: String,
    pub rating: String,
    pub vote_count: Option<u32>,
    pub genres: Vec<String>,
    pub status: Option<String>,
    pub languages: Vec<String>,
    pub production_companies: Vec<String>,
    pub seasons: Option<u32>,
    pub episodes: Option<u32>,
    pub credits: Option<CreditsView>,
    pub credits_error: Option<String>,
    pub reviews: Vec<ReviewView>,
    pub watchlist_action: WatchlistAction,
    pub review_action: ReviewAction,
}

/// `148` becomes `2h 28m`
pub fn format_runtime(minutes: Option<u32>) -> String {
    match minutes {
        Some(m) if m > 0 => format!("{}h {}m", m / 60, m % 60),
        _ => NOT_AVAILABLE.to_string(),
    }
}

/// `2010-07-16` becomes `July 16, 2010`
pub fn format_release_date(date: Option<NaiveDate>) -> String {
    match date {
        Some(d) => d.format("%B %-d, %Y").to_string(),
        None => NOT_AVAILABLE.to_string(),
    }
}

fn credits_view(credits: &Credits) -> CreditsView {
    CreditsView {
        director: credits.director().map(|c| c.name.clone()),
        writers: credits.writers().into_iter().map(|c| c.name.clone()).collect(),
        producers: credits
            .producers(PRODUCERS)
            .into_iter()
            .map(|c| c.name.clone())
            .collect(),
        cast: credits
            .top_cast(TOP_CAST)
            .into_iter()
            .map(|c| PersonView {
                name: c.name.clone(),
                role: c.character.clone(),
                profile_url: c.profile_path.as_deref().map(poster_url),
            })
            .collect(),
    }
}

pub fn title_view(ctx: &TitleContext) -> TitleView {
    let details = &ctx.details;
    let viewer_id = ctx.viewer.map(|v| v.user_id);

    let watchlist_action = match ctx.viewer {
        None => WatchlistAction::SignIn,
        Some(Viewer {
            in_watchlist: true, ..
        }) => WatchlistAction::Remove,
        Some(_) => WatchlistAction::Add,
    };

    let review_action = match viewer_id {
        None => ReviewAction::SignIn,
        Some(id) if ctx.reviews.iter().any(|r| r.user_id == id) => ReviewAction::AlreadyReviewed,
        Some(_) => ReviewAction::Write,
    };

    let (credits, credits_error) = match &ctx.credits {
        Ok(credits) => (Some(credits_view(credits)), None),
        Err(message) => (None, Some(message.clone())),
    };

    TitleView {
        id: details.id,
        media_type: details.media_type,
        title: details.title.clone(),
        tagline: details.tagline.clone(),
        overview: details.overview.clone(),
        poster_url: details.poster_path.as_deref().map(poster_url),
        release_date: format_release_date(details.release_date),
        runtime: format_runtime(details.runtime_minutes),
        rating: format_vote(details.vote_average),
        vote_count: details.vote_count,
        genres: details.genres.clone(),
        status: details.status.clone(),
        languages: details.spoken_languages.clone(),
        production_companies: details.production_companies.clone(),
        seasons: details.number_of_seasons,
        episodes: details.number_of_episodes,
        credits,
        credits_error,
        reviews: ctx
            .reviews
            .iter()
            .map(|r| ReviewView {
                author: r.author_name.clone(),
                rating: r.rating.value(),
                body: r.body.clone(),
                created_at: r.created_at,
                mine: Some(r.user_id) == viewer_id,
            })
            .collect(),
        watchlist_action,
        review_action,
    }
}
