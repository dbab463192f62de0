use regex::Regex;
use reqwest::Client as HttpClient;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::{
    error::{AppError, AppResult},
    models::{MediaType, RecommendationRequest, Suggestion},
    services::tmdb::HTTP_TIMEOUT,
};

/// Model reply: the raw text and the suggestion parsed out of it, if any
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct AiReply {
    pub text: String,
    pub suggestion: Option<Suggestion>,
}

/// Picks one title for the viewer's mood
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait Recommender: Send + Sync {
    async fn recommend(&self, request: &RecommendationRequest) -> AppResult<AiReply>;

    fn name(&self) -> &'static str;
}

/// Extracts a [`Suggestion`] from model output.
///
/// Structured JSON is tried first. Free text falls back to the
/// `Movie: <title>, tmdbid: <id>, type: <movie|tv>` shape the prompt asks for;
/// both the id and the type must be present.
pub struct SuggestionParser {
    tmdb_id: Regex,
    media_type: Regex,
    title: Regex,
}

impl SuggestionParser {
    pub fn new() -> AppResult<Self> {
        let compile = |pattern: &str| {
            Regex::new(pattern)
                .map_err(|e| AppError::Internal(format!("Invalid suggestion pattern: {}", e)))
        };

        Ok(Self {
            tmdb_id: compile(r"(?i)tmdbid[:\s]*([0-9]+)")?,
            media_type: compile(r"(?i)type[:\s]*(movie|tv)")?,
            title: compile(r"(?i)movie:\s*(.+?)\s*,\s*tmdbid")?,
        })
    }

    pub fn parse(&self, text: &str) -> Option<Suggestion> {
        if let Some(suggestion) = Self::parse_json(text) {
            return Some(suggestion);
        }

        let tmdb_id = self
            .tmdb_id
            .captures(text)
            .and_then(|c| c.get(1))
            .and_then(|m| m.as_str().parse::<u64>().ok())?;
        let media_type = self
            .media_type
            .captures(text)
            .and_then(|c| c.get(1))
            .and_then(|m| m.as_str().parse::<MediaType>().ok())?;
        let title = self
            .title
            .captures(text)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().trim().to_string())
            .filter(|t| !t.is_empty());

        Some(Suggestion {
            title,
            tmdb_id,
            media_type,
        })
    }

    fn parse_json(text: &str) -> Option<Suggestion> {
        let trimmed = text
            .trim()
            .trim_start_matches("```json")
            .trim_start_matches("```")
            .trim_end_matches("```")
            .trim();
        serde_json::from_str(trimmed).ok()
    }
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiContent>,
}

#[derive(Debug, Deserialize)]
struct GeminiContent {
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Deserialize)]
struct GeminiPart {
    #[serde(default)]
    text: Option<String>,
}

impl GeminiResponse {
    fn into_text(self) -> Option<String> {
        let text: String = self
            .candidates
            .into_iter()
            .next()?
            .content?
            .parts
            .into_iter()
            .filter_map(|p| p.text)
            .collect();
        Some(text).filter(|t| !t.trim().is_empty())
    }
}

/// Request body asking for `{title, tmdb_id, media_type}` JSON output
fn generate_content_body(prompt: &str) -> serde_json::Value {
    json!({
        "contents": [{ "parts": [{ "text": prompt }] }],
        "generationConfig": {
            "responseMimeType": "application/json",
            "responseSchema": {
                "type": "OBJECT",
                "properties": {
                    "title": { "type": "STRING" },
                    "tmdb_id": { "type": "INTEGER" },
                    "media_type": { "type": "STRING", "enum": ["movie", "tv"] }
                },
                "required": ["tmdb_id", "media_type"]
            }
        }
    })
}

/// Google Gemini `generateContent` client
pub struct GeminiRecommender {
    http_client: HttpClient,
    api_key: String,
    api_url: String,
    model: String,
    parser: SuggestionParser,
}

impl GeminiRecommender {
    pub fn new(api_key: String, api_url: String, model: String) -> AppResult<Self> {
        Ok(Self {
            http_client: HttpClient::builder().timeout(HTTP_TIMEOUT).build()?,
            api_key,
            api_url: api_url.trim_end_matches('/').to_string(),
            model,
            parser: SuggestionParser::new()?,
        })
    }
}

#[async_trait::async_trait]
impl Recommender for GeminiRecommender {
    async fn recommend(&self, request: &RecommendationRequest) -> AppResult<AiReply> {
        request.validate()?;

        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.api_url, self.model
        );

        let response = self
            .http_client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&generate_content_body(&request.prompt()))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::from_upstream("Gemini", status, &body));
        }

        let text = response
            .json::<GeminiResponse>()
            .await?
            .into_text()
            .ok_or_else(|| AppError::ExternalApi("Gemini returned no text".to_string()))?;

        let suggestion = self.parser.parse(&text);
        match &suggestion {
            Some(s) => tracing::info!(tmdb_id = s.tmdb_id, media_type = %s.media_type, "AI suggestion parsed"),
            None => tracing::warn!("AI reply did not contain a usable suggestion"),
        }

        Ok(AiReply { text, suggestion })
    }

    fn name(&self) -> &'static str {
        "Gemini"
    }
}
