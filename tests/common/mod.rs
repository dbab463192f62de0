//! In-memory collaborators for driving the router without TMDB, Supabase,
//! Gemini or Postgres.

#![allow(dead_code)]

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use axum::http::{header, HeaderName, HeaderValue};
use axum_test::TestServer;
use chrono::{Duration, Utc};
use uuid::Uuid;

use flix_finder_api::{
    auth::{AuthProvider, SessionRegistry},
    db::Store,
    error::{AppError, AppResult},
    models::{
        Credits, InsertOutcome, ListItem, MediaType, MovieList, NewListItem, NewReview,
        NewWatchlistEntry, Page, RecommendationRequest, Review, Session, Suggestion, Title,
        TitleDetails, TitleRef, UserIdentity, WatchlistEntry,
    },
    routes::{create_router, AppState},
    services::{
        AiReply, MetadataProvider, RankEdit, RankedList, Recommender, SvgSnapshotRenderer,
    },
};

pub const PASSWORD: &str = "correct-horse";

/// Header searches starting with this take a while to answer
pub const SLOW_QUERY_PREFIX: &str = "slow";

pub fn title(id: u64, media_type: MediaType, name: &str) -> Title {
    Title {
        id,
        media_type,
        title: name.to_string(),
        overview: Some(format!("About {}", name)),
        poster_path: Some(format!("/{}.jpg", id)),
        backdrop_path: None,
        release_date: None,
        vote_average: Some(7.5),
    }
}

pub fn details(title: TitleRef) -> TitleDetails {
    TitleDetails {
        id: title.tmdb_id,
        media_type: title.media_type,
        title: format!("Title {}", title.tmdb_id),
        tagline: None,
        overview: Some("A film".to_string()),
        poster_path: Some(format!("/{}.jpg", title.tmdb_id)),
        backdrop_path: None,
        release_date: None,
        runtime_minutes: Some(148),
        genres: vec!["Drama".to_string()],
        status: Some("Released".to_string()),
        original_language: Some("en".to_string()),
        spoken_languages: vec!["English".to_string()],
        production_companies: Vec::new(),
        production_countries: Vec::new(),
        vote_average: Some(8.4),
        vote_count: Some(1000),
        number_of_seasons: None,
        number_of_episodes: None,
        homepage: None,
        budget: None,
        revenue: None,
    }
}

/// Serves a fixed catalogue; ids above 900_000 are unknown
pub struct FakeMetadata {
    pub total_pages: u32,
}

impl Default for FakeMetadata {
    fn default() -> Self {
        Self { total_pages: 3 }
    }
}

#[async_trait::async_trait]
impl MetadataProvider for FakeMetadata {
    async fn search_multi(&self, query: &str) -> AppResult<Vec<Title>> {
        if query.starts_with(SLOW_QUERY_PREFIX) {
            tokio::time::sleep(std::time::Duration::from_millis(300)).await;
        }
        Ok(vec![
            title(27205, MediaType::Movie, &format!("{} the movie", query)),
            title(1396, MediaType::Tv, &format!("{} the show", query)),
        ])
    }

    async fn search_movies(&self, query: &str) -> AppResult<Vec<Title>> {
        Ok(vec![title(27205, MediaType::Movie, query)])
    }

    async fn trending(&self, scope: Option<MediaType>) -> AppResult<Vec<Title>> {
        let media = scope.unwrap_or(MediaType::Movie);
        Ok((1..=8).map(|id| title(id, media, "Trending")).collect())
    }

    async fn top_rated(&self, media_type: MediaType, page: u32) -> AppResult<Page<Title>> {
        // TMDB answers pages past the end with no results
        let results = if page <= self.total_pages {
            vec![title(238, media_type, "The Godfather")]
        } else {
            Vec::new()
        };
        Ok(Page {
            page,
            total_pages: self.total_pages,
            total_results: self.total_pages * 20,
            results,
        })
    }

    async fn details(&self, title: TitleRef) -> AppResult<TitleDetails> {
        if title.tmdb_id > 900_000 {
            return Err(AppError::NotFound("TMDB resource not found".to_string()));
        }
        Ok(details(title))
    }

    async fn credits(&self, _title: TitleRef) -> AppResult<Credits> {
        Err(AppError::RateLimited("TMDB rate limit exceeded".to_string()))
    }

    fn name(&self) -> &'static str {
        "fake"
    }
}

#[derive(Default)]
struct Library {
    watchlist: Vec<WatchlistEntry>,
    reviews: Vec<Review>,
    lists: Vec<MovieList>,
    items: HashMap<Uuid, Vec<ListItem>>,
}

/// Store backed by plain vectors, enforcing the same uniqueness rules
#[derive(Default)]
pub struct MemoryStore {
    library: Mutex<Library>,
}

impl MemoryStore {
    pub fn watchlist_len(&self) -> usize {
        self.library.lock().unwrap().watchlist.len()
    }
}

fn owns(library: &Library, owner_id: Uuid, list_id: Uuid) -> bool {
    library
        .lists
        .iter()
        .any(|l| l.id == list_id && l.owner_id == owner_id)
}

fn ranked(library: &Library, owner_id: Uuid, list_id: Uuid) -> AppResult<RankedList> {
    if !owns(library, owner_id, list_id) {
        return Err(AppError::NotFound(format!("List {} not found", list_id)));
    }
    let items = library.items.get(&list_id).cloned().unwrap_or_default();
    Ok(RankedList::new(list_id, items))
}

#[async_trait::async_trait]
impl Store for MemoryStore {
    async fn watchlist(&self, user_id: Uuid) -> AppResult<Vec<WatchlistEntry>> {
        let library = self.library.lock().unwrap();
        Ok(library
            .watchlist
            .iter()
            .rev()
            .filter(|e| e.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn is_in_watchlist(&self, user_id: Uuid, title: TitleRef) -> AppResult<bool> {
        let library = self.library.lock().unwrap();
        Ok(library
            .watchlist
            .iter()
            .any(|e| e.user_id == user_id && e.title_ref() == title))
    }

    async fn add_to_watchlist(
        &self,
        entry: NewWatchlistEntry,
    ) -> AppResult<InsertOutcome<WatchlistEntry>> {
        let mut library = self.library.lock().unwrap();
        if library
            .watchlist
            .iter()
            .any(|e| e.user_id == entry.user_id && e.title_ref() == entry.title)
        {
            return Ok(InsertOutcome::AlreadyExists);
        }
        let created = WatchlistEntry {
            id: Uuid::new_v4(),
            user_id: entry.user_id,
            media_type: entry.title.media_type,
            tmdb_id: entry.title.tmdb_id,
            title: entry.name,
            poster_path: entry.poster_path,
            created_at: Utc::now(),
        };
        library.watchlist.push(created.clone());
        Ok(InsertOutcome::Created(created))
    }

    async fn remove_from_watchlist(&self, user_id: Uuid, title: TitleRef) -> AppResult<bool> {
        let mut library = self.library.lock().unwrap();
        let before = library.watchlist.len();
        library
            .watchlist
            .retain(|e| !(e.user_id == user_id && e.title_ref() == title));
        Ok(library.watchlist.len() < before)
    }

    async fn reviews_for_title(&self, title: TitleRef) -> AppResult<Vec<Review>> {
        let library = self.library.lock().unwrap();
        Ok(library
            .reviews
            .iter()
            .rev()
            .filter(|r| r.media_type == title.media_type && r.tmdb_id == title.tmdb_id)
            .cloned()
            .collect())
    }

    async fn reviews_by_user(&self, user_id: Uuid) -> AppResult<Vec<Review>> {
        let library = self.library.lock().unwrap();
        Ok(library
            .reviews
            .iter()
            .rev()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn add_review(&self, review: NewReview) -> AppResult<InsertOutcome<Review>> {
        let mut library = self.library.lock().unwrap();
        if library.reviews.iter().any(|r| {
            r.user_id == review.user_id
                && r.media_type == review.title.media_type
                && r.tmdb_id == review.title.tmdb_id
        }) {
            return Ok(InsertOutcome::AlreadyExists);
        }
        let created = Review {
            id: Uuid::new_v4(),
            user_id: review.user_id,
            media_type: review.title.media_type,
            tmdb_id: review.title.tmdb_id,
            title: review.name,
            poster_path: review.poster_path,
            rating: review.rating,
            body: review.body,
            author_name: review.author_name,
            created_at: Utc::now(),
        };
        library.reviews.push(created.clone());
        Ok(InsertOutcome::Created(created))
    }

    async fn delete_review(&self, user_id: Uuid, title: TitleRef) -> AppResult<bool> {
        let mut library = self.library.lock().unwrap();
        let before = library.reviews.len();
        library.reviews.retain(|r| {
            !(r.user_id == user_id
                && r.media_type == title.media_type
                && r.tmdb_id == title.tmdb_id)
        });
        Ok(library.reviews.len() < before)
    }

    async fn lists(&self, owner_id: Uuid) -> AppResult<Vec<MovieList>> {
        let library = self.library.lock().unwrap();
        Ok(library
            .lists
            .iter()
            .rev()
            .filter(|l| l.owner_id == owner_id)
            .cloned()
            .collect())
    }

    async fn list(&self, owner_id: Uuid, list_id: Uuid) -> AppResult<Option<MovieList>> {
        let library = self.library.lock().unwrap();
        Ok(library
            .lists
            .iter()
            .find(|l| l.id == list_id && l.owner_id == owner_id)
            .cloned())
    }

    async fn create_list(&self, owner_id: Uuid, name: String) -> AppResult<MovieList> {
        let list = MovieList {
            id: Uuid::new_v4(),
            owner_id,
            name,
            created_at: Utc::now(),
        };
        self.library.lock().unwrap().lists.push(list.clone());
        Ok(list)
    }

    async fn delete_list(&self, owner_id: Uuid, list_id: Uuid) -> AppResult<bool> {
        let mut library = self.library.lock().unwrap();
        if !owns(&library, owner_id, list_id) {
            return Ok(false);
        }
        library.lists.retain(|l| l.id != list_id);
        library.items.remove(&list_id);
        Ok(true)
    }

    async fn list_items(&self, owner_id: Uuid, list_id: Uuid) -> AppResult<RankedList> {
        let library = self.library.lock().unwrap();
        ranked(&library, owner_id, list_id)
    }

    async fn append_list_item(
        &self,
        owner_id: Uuid,
        list_id: Uuid,
        item: NewListItem,
    ) -> AppResult<InsertOutcome<ListItem>> {
        let mut library = self.library.lock().unwrap();
        let mut list = ranked(&library, owner_id, list_id)?;
        if list.contains(item.title) {
            return Ok(InsertOutcome::AlreadyExists);
        }
        let created = list.append(item);
        library.items.insert(list_id, list.into_items());
        Ok(InsertOutcome::Created(created))
    }

    async fn remove_list_item(
        &self,
        owner_id: Uuid,
        list_id: Uuid,
        item_id: Uuid,
    ) -> AppResult<bool> {
        let mut library = self.library.lock().unwrap();
        let mut list = ranked(&library, owner_id, list_id)?;
        let removed = list.remove(item_id).is_some();
        library.items.insert(list_id, list.into_items());
        Ok(removed)
    }

    async fn reorder_list_items(
        &self,
        owner_id: Uuid,
        list_id: Uuid,
        edit: RankEdit,
    ) -> AppResult<RankedList> {
        let mut library = self.library.lock().unwrap();
        let mut list = ranked(&library, owner_id, list_id)?;
        edit.apply(&mut list)?;
        library.items.insert(list_id, list.clone().into_items());
        Ok(list)
    }
}

/// Accepts any address with [`PASSWORD`]; the user id is derived from the email
#[derive(Default)]
pub struct FakeAuth {
    users: Mutex<HashMap<String, Uuid>>,
}

impl FakeAuth {
    fn session_for(&self, email: &str) -> Session {
        let id = *self
            .users
            .lock()
            .unwrap()
            .entry(email.to_string())
            .or_insert_with(Uuid::new_v4);
        Session {
            access_token: format!("access-{}", id),
            refresh_token: format!("refresh-{}", id),
            expires_at: Utc::now() + Duration::hours(1),
            user: UserIdentity {
                id,
                email: Some(email.to_string()),
                display_name: email.split('@').next().unwrap_or("Viewer").to_string(),
            },
        }
    }
}

#[async_trait::async_trait]
impl AuthProvider for FakeAuth {
    async fn sign_in_with_password(&self, email: &str, password: &str) -> AppResult<Session> {
        if password != PASSWORD {
            return Err(AppError::Unauthorized("Invalid login credentials".to_string()));
        }
        Ok(self.session_for(email))
    }

    async fn sign_up(
        &self,
        email: &str,
        _password: &str,
        _full_name: Option<String>,
    ) -> AppResult<Option<Session>> {
        if email.ends_with("@confirm.test") {
            return Ok(None);
        }
        Ok(Some(self.session_for(email)))
    }

    async fn refresh(&self, refresh_token: &str) -> AppResult<Session> {
        Err(AppError::Unauthorized(format!(
            "Refresh token {} revoked",
            refresh_token
        )))
    }

    async fn user(&self, _access_token: &str) -> AppResult<UserIdentity> {
        Ok(self.session_for("oauth@example.com").user)
    }

    async fn sign_out(&self, _access_token: &str) -> AppResult<()> {
        Ok(())
    }

    fn authorize_url(&self, provider: &str) -> AppResult<String> {
        if provider != "google" {
            return Err(AppError::InvalidInput(format!(
                "Unsupported OAuth provider: {}",
                provider
            )));
        }
        Ok("https://auth.example.com/authorize?provider=google".to_string())
    }
}

/// Always suggests Up (2009)
pub struct FakeRecommender;

#[async_trait::async_trait]
impl Recommender for FakeRecommender {
    async fn recommend(&self, _request: &RecommendationRequest) -> AppResult<AiReply> {
        Ok(AiReply {
            text: "Movie: Up, tmdbid: 14160, type: movie".to_string(),
            suggestion: Some(Suggestion {
                title: Some("Up".to_string()),
                tmdb_id: 14160,
                media_type: MediaType::Movie,
            }),
        })
    }

    fn name(&self) -> &'static str {
        "fake"
    }
}

pub struct TestApp {
    pub server: TestServer,
    pub store: Arc<MemoryStore>,
    pub sessions: SessionRegistry,
}

pub fn create_test_app() -> TestApp {
    let store = Arc::new(MemoryStore::default());
    let state = AppState::new(
        Arc::new(FakeMetadata::default()),
        store.clone(),
        Arc::new(FakeAuth::default()),
        Arc::new(FakeRecommender),
        Arc::new(SvgSnapshotRenderer),
        None,
    );
    let sessions = state.sessions.clone();
    let server = TestServer::new(create_router(state)).unwrap();
    TestApp {
        server,
        store,
        sessions,
    }
}

/// Cookie header identifying one browser across requests
pub fn client_cookie(client_id: Uuid) -> (HeaderName, HeaderValue) {
    (
        header::COOKIE,
        HeaderValue::from_str(&format!("ff_client={}", client_id)).unwrap(),
    )
}

impl TestApp {
    /// Signs a fresh browser in and returns its client id
    pub async fn signed_in_client(&self, email: &str) -> Uuid {
        let client_id = Uuid::new_v4();
        let (name, value) = client_cookie(client_id);
        self.server
            .post("/auth/sign-in")
            .add_header(name, value)
            .json(&serde_json::json!({ "email": email, "password": PASSWORD }))
            .await
            .assert_status_ok();
        client_id
    }
}
