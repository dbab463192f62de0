/// TMDB metadata provider
///
/// Read-only client for The Movie Database v3 API. Authenticates with the
/// `api_key` query parameter and caches every response in Redis:
///
/// 1. Feeds and searches: `/trending/{scope}/week`, `/{media}/top_rated`,
///    `/search/multi`, `/search/movie` (5 minutes)
/// 2. Title records: `/{media}/{id}` and `/{media}/{id}/credits` (1 hour)
use std::time::Duration;

use reqwest::Client as HttpClient;
use serde::de::DeserializeOwned;

use crate::{
    cached,
    db::{Cache, CacheKey},
    error::{AppError, AppResult},
    models::{
        Credits, MediaType, Page, Title, TitleDetails, TitleRef, TmdbCredits, TmdbDetails,
        TmdbPage,
    },
    services::metadata::MetadataProvider,
};

const FEED_CACHE_TTL: u64 = 300; // 5 minutes
const TITLE_CACHE_TTL: u64 = 3600; // 1 hour

/// Outbound request timeout shared by the HTTP clients
pub const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Clone)]
pub struct TmdbProvider {
    http_client: HttpClient,
    api_key: String,
    api_url: String,
    cache: Cache,
}

impl TmdbProvider {
    pub fn new(cache: Cache, api_key: String, api_url: String) -> AppResult<Self> {
        let http_client = HttpClient::builder().timeout(HTTP_TIMEOUT).build()?;

        Ok(Self {
            http_client,
            api_key,
            api_url: api_url.trim_end_matches('/').to_string(),
            cache,
        })
    }

    /// GETs `path` with the API key attached and decodes the JSON body
    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> AppResult<T> {
        let url = format!("{}{}", self.api_url, path);

        let response = self
            .http_client
            .get(&url)
            .query(&[("api_key", self.api_key.as_str())])
            .query(params)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(path = %path, status = %status, "TMDB request failed");
            return Err(AppError::from_upstream("TMDB", status, &body));
        }

        Ok(response.json().await?)
    }

    async fn search(&self, path: &str, query: &str, fallback: Option<MediaType>) -> AppResult<Vec<Title>> {
        let page: TmdbPage = self
            .get_json(
                path,
                &[
                    ("query", query.to_string()),
                    ("language", "en-US".to_string()),
                ],
            )
            .await?;

        let titles = page.into_page(fallback).results;
        tracing::info!(query = %query, count = titles.len(), path = %path, "TMDB search complete");
        Ok(titles)
    }
}

fn require_query(query: &str) -> AppResult<&str> {
    let query = query.trim();
    if query.is_empty() {
        return Err(AppError::InvalidInput(
            "Search query cannot be empty".to_string(),
        ));
    }
    Ok(query)
}

fn trending_path(scope: Option<MediaType>) -> String {
    let scope = scope.map(|m| m.as_str()).unwrap_or("all");
    format!("/trending/{}/week", scope)
}

fn top_rated_path(media_type: MediaType) -> String {
    format!("/{}/top_rated", media_type)
}

fn details_path(title: TitleRef) -> String {
    format!("/{}/{}", title.media_type, title.tmdb_id)
}

fn credits_path(title: TitleRef) -> String {
    format!("/{}/{}/credits", title.media_type, title.tmdb_id)
}

#[async_trait::async_trait]
impl MetadataProvider for TmdbProvider {
    async fn search_multi(&self, query: &str) -> AppResult<Vec<Title>> {
        let query = require_query(query)?;

        cached!(
            self.cache,
            CacheKey::MultiSearch(query.to_string()),
            FEED_CACHE_TTL,
            self.search("/search/multi", query, None)
        )
    }

    async fn search_movies(&self, query: &str) -> AppResult<Vec<Title>> {
        let query = require_query(query)?;

        cached!(
            self.cache,
            CacheKey::MovieSearch(query.to_string()),
            FEED_CACHE_TTL,
            self.search("/search/movie", query, Some(MediaType::Movie))
        )
    }

    async fn trending(&self, scope: Option<MediaType>) -> AppResult<Vec<Title>> {
        cached!(self.cache, CacheKey::Trending(scope), FEED_CACHE_TTL, async {
            let page: TmdbPage = self.get_json(&trending_path(scope), &[]).await?;
            Ok::<_, AppError>(page.into_page(scope).results)
        })
    }

    async fn top_rated(&self, media_type: MediaType, page: u32) -> AppResult<Page<Title>> {
        if page == 0 {
            return Err(AppError::InvalidInput("Page numbers start at 1".to_string()));
        }

        cached!(
            self.cache,
            CacheKey::TopRated(media_type, page),
            FEED_CACHE_TTL,
            async {
                let raw: TmdbPage = self
                    .get_json(
                        &top_rated_path(media_type),
                        &[
                            ("language", "en-US".to_string()),
                            ("page", page.to_string()),
                        ],
                    )
                    .await?;

                tracing::debug!(media_type = %media_type, page, total_pages = raw.total_pages, "Fetched top rated page");
                Ok::<_, AppError>(raw.into_page(Some(media_type)))
            }
        )
    }

    async fn details(&self, title: TitleRef) -> AppResult<TitleDetails> {
        cached!(self.cache, CacheKey::Details(title), TITLE_CACHE_TTL, async {
            let raw: TmdbDetails = self.get_json(&details_path(title), &[]).await?;
            Ok::<_, AppError>(raw.into_details(title.media_type))
        })
    }

    async fn credits(&self, title: TitleRef) -> AppResult<Credits> {
        cached!(self.cache, CacheKey::Credits(title), TITLE_CACHE_TTL, async {
            let raw: TmdbCredits = self.get_json(&credits_path(title), &[]).await?;
            Ok::<_, AppError>(Credits::from(raw))
        })
    }

    fn name(&self) -> &'static str {
        "TMDB"
    }
}
