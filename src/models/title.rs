use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;

use crate::error::AppError;

/// Kind of title on the metadata provider
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Movie,
    Tv,
}

impl MediaType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaType::Movie => "movie",
            MediaType::Tv => "tv",
        }
    }
}

impl Display for MediaType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MediaType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "movie" => Ok(MediaType::Movie),
            "tv" => Ok(MediaType::Tv),
            other => Err(AppError::InvalidInput(format!("Unknown media type: {}", other))),
        }
    }
}

/// Reference to one title: TMDB ids are only unique within a media type
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct TitleRef {
    pub media_type: MediaType,
    pub tmdb_id: u64,
}

impl Display for TitleRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.media_type, self.tmdb_id)
    }
}

/// A movie or TV show as shown in feeds and search results
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Title {
    pub id: u64,
    pub media_type: MediaType,
    pub title: String,
    pub overview: Option<String>,
    pub poster_path: Option<String>,
    pub backdrop_path: Option<String>,
    pub release_date: Option<NaiveDate>,
    pub vote_average: Option<f64>,
}

impl Title {
    pub fn title_ref(&self) -> TitleRef {
        TitleRef {
            media_type: self.media_type,
            tmdb_id: self.id,
        }
    }

    pub fn release_year(&self) -> Option<i32> {
        use chrono::Datelike;
        self.release_date.map(|d| d.year())
    }
}

/// One page of a paginated provider listing
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Page<T> {
    pub page: u32,
    pub total_pages: u32,
    pub total_results: u32,
    pub results: Vec<T>,
}

impl<T> Page<T> {
    pub fn empty(page: u32) -> Self {
        Self {
            page,
            total_pages: 1,
            total_results: 0,
            results: Vec::new(),
        }
    }
}

/// Full record for the title detail screen
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TitleDetails {
    pub id: u64,
    pub media_type: MediaType,
    pub title: String,
    pub tagline: Option<String>,
    pub overview: Option<String>,
    pub poster_path: Option<String>,
    pub backdrop_path: Option<String>,
    pub release_date: Option<NaiveDate>,
    pub runtime_minutes: Option<u32>,
    pub genres: Vec<String>,
    pub status: Option<String>,
    pub original_language: Option<String>,
    pub spoken_languages: Vec<String>,
    pub production_companies: Vec<String>,
    pub production_countries: Vec<String>,
    pub vote_average: Option<f64>,
    pub vote_count: Option<u32>,
    pub number_of_seasons: Option<u32>,
    pub number_of_episodes: Option<u32>,
    pub homepage: Option<String>,
    pub budget: Option<u64>,
    pub revenue: Option<u64>,
}

impl TitleDetails {
    pub fn title_ref(&self) -> TitleRef {
        TitleRef {
            media_type: self.media_type,
            tmdb_id: self.id,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CastMember {
    pub id: u64,
    pub name: String,
    pub character: Option<String>,
    pub profile_path: Option<String>,
    pub order: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CrewMember {
    pub id: u64,
    pub name: String,
    pub job: String,
    pub department: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Credits {
    pub cast: Vec<CastMember>,
    pub crew: Vec<CrewMember>,
}

impl Credits {
    pub fn director(&self) -> Option<&CrewMember> {
        self.crew.iter().find(|c| c.job == "Director")
    }

    pub fn writers(&self) -> Vec<&CrewMember> {
        self.crew
            .iter()
            .filter(|c| c.job == "Writer" || c.job == "Screenplay")
            .collect()
    }

    pub fn producers(&self, limit: usize) -> Vec<&CrewMember> {
        self.crew
            .iter()
            .filter(|c| c.job == "Producer")
            .take(limit)
            .collect()
    }

    pub fn top_cast(&self, limit: usize) -> Vec<&CastMember> {
        self.cast.iter().take(limit).collect()
    }
}

// ============================================================================
// TMDB API Types
// ============================================================================

/// Parses TMDB's date strings; the API sends "" for unknown dates
fn parse_tmdb_date(raw: Option<&str>) -> Option<NaiveDate> {
    raw.filter(|s| !s.is_empty())
        .and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok())
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

/// Raw list entry from search, trending and top-rated endpoints
#[derive(Debug, Clone, Deserialize)]
pub struct TmdbListItem {
    pub id: u64,
    #[serde(default)]
    pub media_type: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub overview: Option<String>,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub backdrop_path: Option<String>,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub first_air_date: Option<String>,
    #[serde(default)]
    pub vote_average: Option<f64>,
}

impl TmdbListItem {
    /// Validates a raw entry into a [`Title`].
    ///
    /// `fallback` is the media type implied by the endpoint; entries that carry
    /// their own `media_type` (multi search, trending/all) use that instead and
    /// are dropped when it is neither movie nor tv.
    pub fn into_title(self, fallback: Option<MediaType>) -> Option<Title> {
        let media_type = match self.media_type.as_deref() {
            Some(raw) => raw.parse().ok()?,
            None => fallback?,
        };

        let title = non_empty(self.title).or(non_empty(self.name))?;
        let date = self.release_date.or(self.first_air_date);

        Some(Title {
            id: self.id,
            media_type,
            title,
            overview: non_empty(self.overview),
            poster_path: non_empty(self.poster_path),
            backdrop_path: non_empty(self.backdrop_path),
            release_date: parse_tmdb_date(date.as_deref()),
            vote_average: self.vote_average,
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TmdbPage {
    #[serde(default = "first_page")]
    pub page: u32,
    #[serde(default = "first_page")]
    pub total_pages: u32,
    #[serde(default)]
    pub total_results: u32,
    #[serde(default)]
    pub results: Vec<TmdbListItem>,
}

fn first_page() -> u32 {
    1
}

impl TmdbPage {
    pub fn into_page(self, fallback: Option<MediaType>) -> Page<Title> {
        Page {
            page: self.page,
            total_pages: self.total_pages.max(1),
            total_results: self.total_results,
            results: self
                .results
                .into_iter()
                .filter_map(|item| item.into_title(fallback))
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TmdbNamed {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TmdbLanguage {
    #[serde(default)]
    pub english_name: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

/// Raw detail response shared by /movie/{id} and /tv/{id}
#[derive(Debug, Clone, Deserialize)]
pub struct TmdbDetails {
    pub id: u64,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub tagline: Option<String>,
    #[serde(default)]
    pub overview: Option<String>,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub backdrop_path: Option<String>,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub first_air_date: Option<String>,
    #[serde(default)]
    pub runtime: Option<u32>,
    #[serde(default)]
    pub episode_run_time: Vec<u32>,
    #[serde(default)]
    pub genres: Vec<TmdbNamed>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub original_language: Option<String>,
    #[serde(default)]
    pub spoken_languages: Vec<TmdbLanguage>,
    #[serde(default)]
    pub production_companies: Vec<TmdbNamed>,
    #[serde(default)]
    pub production_countries: Vec<TmdbNamed>,
    #[serde(default)]
    pub vote_average: Option<f64>,
    #[serde(default)]
    pub vote_count: Option<u32>,
    #[serde(default)]
    pub number_of_seasons: Option<u32>,
    #[serde(default)]
    pub number_of_episodes: Option<u32>,
    #[serde(default)]
    pub homepage: Option<String>,
    #[serde(default)]
    pub budget: Option<u64>,
    #[serde(default)]
    pub revenue: Option<u64>,
}

impl TmdbDetails {
    pub fn into_details(self, media_type: MediaType) -> TitleDetails {
        let title = non_empty(self.title)
            .or(non_empty(self.name))
            .unwrap_or_else(|| "Untitled".to_string());
        let date = self.release_date.or(self.first_air_date);
        let runtime_minutes = self
            .runtime
            .filter(|m| *m > 0)
            .or_else(|| self.episode_run_time.first().copied());

        TitleDetails {
            id: self.id,
            media_type,
            title,
            tagline: non_empty(self.tagline),
            overview: non_empty(self.overview),
            poster_path: non_empty(self.poster_path),
            backdrop_path: non_empty(self.backdrop_path),
            release_date: parse_tmdb_date(date.as_deref()),
            runtime_minutes,
            genres: self.genres.into_iter().map(|g| g.name).collect(),
            status: non_empty(self.status),
            original_language: non_empty(self.original_language),
            spoken_languages: self
                .spoken_languages
                .into_iter()
                .filter_map(|l| non_empty(l.english_name).or(non_empty(l.name)))
                .collect(),
            production_companies: self.production_companies.into_iter().map(|c| c.name).collect(),
            production_countries: self.production_countries.into_iter().map(|c| c.name).collect(),
            vote_average: self.vote_average,
            vote_count: self.vote_count,
            number_of_seasons: self.number_of_seasons,
            number_of_episodes: self.number_of_episodes,
            homepage: non_empty(self.homepage),
            budget: self.budget.filter(|b| *b > 0),
            revenue: self.revenue.filter(|r| *r > 0),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TmdbCastMember {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub character: Option<String>,
    #[serde(default)]
    pub profile_path: Option<String>,
    #[serde(default)]
    pub order: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TmdbCrewMember {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub job: Option<String>,
    #[serde(default)]
    pub department: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TmdbCredits {
    #[serde(default)]
    pub cast: Vec<TmdbCastMember>,
    #[serde(default)]
    pub crew: Vec<TmdbCrewMember>,
}

impl From<TmdbCredits> for Credits {
    fn from(raw: TmdbCredits) -> Self {
        Credits {
            cast: raw
                .cast
                .into_iter()
                .map(|c| CastMember {
                    id: c.id,
                    name: c.name,
                    character: non_empty(c.character),
                    profile_path: non_empty(c.profile_path),
                    order: c.order,
                })
                .collect(),
            crew: raw
                .crew
                .into_iter()
                .filter_map(|c| {
                    Some(CrewMember {
                        id: c.id,
                        name: c.name,
                        job: non_empty(c.job)?,
                        department: non_empty(c.department),
                    })
                })
                .collect(),
        }
    }
}
