use serde::Serialize;

use super::{format_vote, title_link};
use crate::{
    models::{poster_url, Suggestion, TitleDetails},
    services::recommendations::AiReply,
};

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SuggestedTitle {
    pub title: String,
    pub overview: Option<String>,
    pub poster_url: Option<String>,
    pub rating: String,
    pub link: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct AiView {
    /// Model output exactly as received
    pub text: String,
    pub suggestion: Option<Suggestion>,
    pub title: Option<SuggestedTitle>,
}

/// `details` is present when the suggested id resolved on the provider
pub fn ai_view(reply: AiReply, details: Option<&TitleDetails>) -> AiView {
    AiView {
        title: details.map(|d| SuggestedTitle {
            title: d.title.clone(),
            overview: d.overview.clone(),
            poster_url: d.poster_path.as_deref().map(poster_url),
            rating: format_vote(d.vote_average),
            link: title_link(d.media_type, d.id),
        }),
        text: reply.text,
        suggestion: reply.suggestion,
    }
}
