use serde::Serialize;

use super::{cards, TitleCard};
use crate::models::Title;

/// Titles per home section
pub const SECTION_SIZE: usize = 6;

/// Raw feeds behind the home screen; a failed feed arrives empty
#[derive(Debug, Clone, Default)]
pub struct HomeFeeds {
    pub trending_all: Vec<Title>,
    pub trending_movies: Vec<Title>,
    pub trending_tv: Vec<Title>,
    pub top_rated_movies: Vec<Title>,
    pub top_rated_tv: Vec<Title>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct FeaturedTitle {
    pub card: TitleCard,
    pub overview: Option<String>,
    pub backdrop_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct HomeSection {
    pub heading: &'static str,
    pub titles: Vec<TitleCard>,
    /// Where "see all" leads, if anywhere
    pub see_all: Option<&'static str>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct HomeView {
    pub featured: Option<FeaturedTitle>,
    pub sections: Vec<HomeSection>,
}

fn backdrop_url(path: &str) -> String {
    format!("{}/original{}", crate::models::POSTER_BASE_URL, path)
}

pub fn home_view(feeds: &HomeFeeds) -> HomeView {
    let featured = feeds.trending_all.first().map(|title| FeaturedTitle {
        card: TitleCard::from(title),
        overview: title.overview.clone(),
        backdrop_url: title.backdrop_path.as_deref().map(backdrop_url),
    });

    let section = |heading, titles: &[Title], see_all| HomeSection {
        heading,
        titles: cards(titles, SECTION_SIZE),
        see_all,
    };

    HomeView {
        featured,
        sections: vec![
            section("Trending Movies", &feeds.trending_movies, None),
            section("Trending TV Shows", &feeds.trending_tv, None),
            section(
                "Top Rated Movies",
                &feeds.top_rated_movies,
                Some("/top-rated-movies/1"),
            ),
            section(
                "Top Rated TV Shows",
                &feeds.top_rated_tv,
                Some("/top-rated-tv-shows/1"),
            ),
        ],
    }
}
