use serde::Serialize;

use super::{cards, TitleCard};
use crate::{
    error::{AppError, AppResult},
    models::{MediaType, Page, Title},
};

/// TMDB refuses pages past this one on listing endpoints
pub const MAX_PROVIDER_PAGE: u32 = 500;

const PAGE_WINDOW: u32 = 3;

/// Parses the `:pgno` route segment; pages start at 1
pub fn parse_page(raw: &str) -> AppResult<u32> {
    match raw.trim().parse::<u32>() {
        Ok(page) if page >= 1 => Ok(page),
        _ => Err(AppError::InvalidInput(format!(
            "Invalid page number: {}",
            raw
        ))),
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Pagination {
    pub current: u32,
    pub total_pages: u32,
    pub previous_disabled: bool,
    pub next_disabled: bool,
    pub previous_page: Option<u32>,
    pub next_page: Option<u32>,
    /// Up to three page numbers starting at the current page
    pub window: Vec<u32>,
}

impl Pagination {
    /// Clamps `current` to `[1, total_pages]`
    pub fn new(current: u32, total_pages: u32) -> Self {
        let total_pages = total_pages.clamp(1, MAX_PROVIDER_PAGE);
        let current = current.clamp(1, total_pages);
        let previous_disabled = current <= 1;
        let next_disabled = current >= total_pages;
        let window_end = current.saturating_add(PAGE_WINDOW - 1).min(total_pages);

        Pagination {
            current,
            total_pages,
            previous_disabled,
            next_disabled,
            previous_page: (!previous_disabled).then(|| current - 1),
            next_page: (!next_disabled).then(|| current + 1),
            window: (current..=window_end).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TopRatedView {
    pub heading: &'static str,
    pub media_type: MediaType,
    pub titles: Vec<TitleCard>,
    pub pagination: Pagination,
    /// Path prefix for page links, e.g. `/top-rated-movies/`
    pub base_path: &'static str,
}

pub fn top_rated_view(media_type: MediaType, requested: u32, page: &Page<Title>) -> TopRatedView {
    let (heading, base_path) = match media_type {
        MediaType::Movie => ("Top Rated Movies", "/top-rated-movies/"),
        MediaType::Tv => ("Top Rated TV Shows", "/top-rated-tv-shows/"),
    };

    TopRatedView {
        heading,
        media_type,
        titles: cards(&page.results, page.results.len()),
        pagination: Pagination::new(requested, page.total_pages),
        base_path,
    }
}
