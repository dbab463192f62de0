//! Movie and TV metadata provider abstraction
//!
//! Screens only ever read metadata, so the provider is a read-only trait. The
//! TMDB implementation lives in [`crate::services::tmdb`]; tests substitute
//! in-memory fakes.

use crate::{
    error::AppResult,
    models::{Credits, MediaType, Page, Title, TitleDetails, TitleRef},
};

#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait MetadataProvider: Send + Sync {
    /// Searches movies, tv shows and people; people are filtered out
    async fn search_multi(&self, query: &str) -> AppResult<Vec<Title>>;

    /// Searches movies only, used when adding to a list
    async fn search_movies(&self, query: &str) -> AppResult<Vec<Title>>;

    /// Weekly trending titles; `None` mixes movies and tv
    async fn trending(&self, scope: Option<MediaType>) -> AppResult<Vec<Title>>;

    /// One page of the top-rated listing, `page >= 1`
    async fn top_rated(&self, media_type: MediaType, page: u32) -> AppResult<Page<Title>>;

    async fn details(&self, title: TitleRef) -> AppResult<TitleDetails>;

    async fn credits(&self, title: TitleRef) -> AppResult<Credits>;

    /// Provider name for logging
    fn name(&self) -> &'static str;
}
