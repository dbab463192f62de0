use serde::Serialize;

use super::{cards, TitleCard};
use crate::models::{MediaType, Title};

/// Results shown in the header dropdown
pub const HEADER_RESULTS: usize = 8;

/// Results offered when adding to a list
pub const LIST_SEARCH_RESULTS: usize = 10;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SearchView {
    pub query: String,
    pub results: Vec<TitleCard>,
}

pub fn header_search_view(query: &str, results: &[Title]) -> SearchView {
    SearchView {
        query: query.trim().to_string(),
        results: cards(results, HEADER_RESULTS),
    }
}

pub fn list_search_view(query: &str, results: &[Title]) -> SearchView {
    let movies: Vec<Title> = results
        .iter()
        .filter(|t| t.media_type == MediaType::Movie)
        .cloned()
        .collect();

    SearchView {
        query: query.trim().to_string(),
        results: cards(&movies, LIST_SEARCH_RESULTS),
    }
}
