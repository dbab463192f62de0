use askama::Template;

use crate::{
    error::{AppError, AppResult},
    models::MovieList,
    services::ranking::RankedList,
};

const COLUMNS: usize = 5;
const PADDING: u32 = 32;
const HEADER_HEIGHT: u32 = 80;
const TILE_WIDTH: u32 = 180;
const POSTER_HEIGHT: u32 = 270;
const TILE_GAP: u32 = 24;
const CAPTION_HEIGHT: u32 = 40;
const MAX_CAPTION_CHARS: usize = 22;

/// Rendered image of a list, ready to download
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub file_name: String,
    pub content_type: &'static str,
    pub body: Vec<u8>,
}

/// Turns a rank-sorted list into a shareable image
#[cfg_attr(test, mockall::automock)]
pub trait SnapshotRenderer: Send + Sync {
    fn render(&self, list: &MovieList, items: &RankedList) -> AppResult<Snapshot>;
}

/// Download name: non-alphanumerics become `_`, lowercased
pub fn snapshot_file_name(list_name: &str) -> String {
    let stem: String = list_name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '_' })
        .collect();
    format!("{}_movie_list.svg", stem)
}

struct SnapshotTile {
    x: u32,
    y: u32,
    position: usize,
    title: String,
    poster_url: Option<String>,
}

#[derive(Template)]
#[template(path = "list_snapshot.svg", escape = "html")]
struct SnapshotTemplate {
    name: String,
    width: u32,
    height: u32,
    padding: u32,
    tile_width: u32,
    poster_height: u32,
    tiles: Vec<SnapshotTile>,
}

fn caption(title: &str) -> String {
    if title.chars().count() <= MAX_CAPTION_CHARS {
        return title.to_string();
    }
    let mut short: String = title.chars().take(MAX_CAPTION_CHARS - 1).collect();
    short.push('…');
    short
}

/// Poster grid rendered through an askama SVG template
#[derive(Debug, Clone, Default)]
pub struct SvgSnapshotRenderer;

impl SnapshotRenderer for SvgSnapshotRenderer {
    fn render(&self, list: &MovieList, items: &RankedList) -> AppResult<Snapshot> {
        let columns = items.len().clamp(1, COLUMNS) as u32;
        let rows = items.len().div_ceil(COLUMNS).max(1) as u32;
        let row_height = POSTER_HEIGHT + CAPTION_HEIGHT + TILE_GAP;

        let tiles = items
            .items()
            .iter()
            .enumerate()
            .map(|(index, item)| {
                let column = (index % COLUMNS) as u32;
                let row = (index / COLUMNS) as u32;
                SnapshotTile {
                    x: PADDING + column * (TILE_WIDTH + TILE_GAP),
                    y: HEADER_HEIGHT + row * row_height,
                    position: index + 1,
                    title: caption(&item.title),
                    poster_url: item.poster_url.clone(),
                }
            })
            .collect();

        let template = SnapshotTemplate {
            name: list.name.clone(),
            width: PADDING * 2 + columns * TILE_WIDTH + (columns - 1) * TILE_GAP,
            height: HEADER_HEIGHT + rows * row_height + PADDING,
            padding: PADDING,
            tile_width: TILE_WIDTH,
            poster_height: POSTER_HEIGHT,
            tiles,
        };

        let body = template
            .render()
            .map_err(|e| AppError::Internal(format!("Snapshot render error: {}", e)))?;

        Ok(Snapshot {
            file_name: snapshot_file_name(&list.name),
            content_type: "image/svg+xml",
            body: body.into_bytes(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{MediaType, NewListItem, TitleRef};
    use chrono::Utc;
    use uuid::Uuid;

    fn list(name: &str) -> MovieList {
        MovieList {
            id: Uuid::new_v4(),
            owner_id: Uuid::new_v4(),
            name: name.to_string(),
            created_at: Utc::now(),
        }
    }

    fn ranked(titles: &[&str]) -> RankedList {
        let mut ranked = RankedList::new(Uuid::new_v4(), Vec::new());
        for (i, title) in titles.iter().enumerate() {
            ranked.append(NewListItem {
                title: TitleRef {
                    media_type: MediaType::Movie,
                    tmdb_id: i as u64 + 1,
                },
                name: title.to_string(),
                poster_url: Some(format!("https://image.tmdb.org/t/p/w500/{}.jpg", i)),
            });
        }
        ranked
    }

    #[test]
    fn test_snapshot_file_name() {
        assert_eq!(snapshot_file_name("My Top 10!"), "my_top_10__movie_list.svg");
        assert_eq!(snapshot_file_name("Horror"), "horror_movie_list.svg");
    }

    #[test]
    fn test_caption_truncates_long_titles() {
        assert_eq!(caption("Heat"), "Heat");
        let long = caption("Dr. Strangelove or: How I Learned to Stop Worrying");
        assert_eq!(long.chars().count(), MAX_CAPTION_CHARS);
        assert!(long.ends_with('…'));
    }

    #[test]
    fn test_render_lists_titles_in_rank_order() {
        let snapshot = SvgSnapshotRenderer
            .render(&list("Favourites"), &ranked(&["Alien", "Brazil", "Casablanca"]))
            .unwrap();
        let svg = String::from_utf8(snapshot.body).unwrap();

        assert_eq!(snapshot.content_type, "image/svg+xml");
        assert_eq!(snapshot.file_name, "favourites_movie_list.svg");
        let alien = svg.find("Alien").unwrap();
        let brazil = svg.find("Brazil").unwrap();
        let casablanca = svg.find("Casablanca").unwrap();
        assert!(alien < brazil && brazil < casablanca);
    }

    #[test]
    fn test_render_escapes_markup_in_names() {
        let snapshot = SvgSnapshotRenderer
            .render(&list("<script>"), &ranked(&["Tom & Jerry"]))
            .unwrap();
        let svg = String::from_utf8(snapshot.body).unwrap();
        assert!(!svg.contains("<script>"));
        assert!(svg.contains("Tom &amp; Jerry"));
    }
}
