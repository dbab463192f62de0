pub mod library;
pub mod recommendation;
pub mod session;
pub mod title;

pub use library::{
    InsertOutcome, ListItem, MovieList, NewListItem, NewReview, NewWatchlistEntry,
    RankAssignment, Rating, Review, WatchlistEntry,
};
pub use recommendation::{RecommendationRequest, Suggestion};
pub use session::{Session, UserIdentity};
pub use title::{
    CastMember, Credits, CrewMember, MediaType, Page, Title, TitleDetails, TitleRef,
    TmdbCredits, TmdbDetails, TmdbListItem, TmdbPage,
};

/// Base URL for provider poster images
pub const POSTER_BASE_URL: &str = "https://image.tmdb.org/t/p";

/// Full poster URL at the width used for list items
pub fn poster_url(poster_path: &str) -> String {
    format!("{}/w500{}", POSTER_BASE_URL, poster_path)
}
