use serde::{Deserialize, Serialize};

use super::MediaType;
use crate::error::{AppError, AppResult};

/// Form submitted on the AI suggestion screen
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Default)]
pub struct RecommendationRequest {
    pub mood: String,
    #[serde(default)]
    pub genre: Option<String>,
    pub duration: String,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub age_rating: Option<String>,
}

fn filled(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

impl RecommendationRequest {
    /// Mood and available time are required; everything else is optional
    pub fn validate(&self) -> AppResult<()> {
        if self.mood.trim().is_empty() {
            return Err(AppError::InvalidInput("Mood is required".to_string()));
        }
        if self.duration.trim().is_empty() {
            return Err(AppError::InvalidInput(
                "Available time is required".to_string(),
            ));
        }
        Ok(())
    }

    /// Builds the prompt sent to the model
    pub fn prompt(&self) -> String {
        let mut prompt = format!(
            "I am in a {} mood, I prefer {} genre, and I have {} to watch something.",
            self.mood.trim(),
            filled(&self.genre).unwrap_or("any"),
            self.duration.trim()
        );
        if let Some(region) = filled(&self.region) {
            prompt.push_str(&format!(" I am watching from {}.", region));
        }
        if let Some(age_rating) = filled(&self.age_rating) {
            prompt.push_str(&format!(
                " The title must be rated {} or lower.",
                age_rating
            ));
        }
        prompt.push_str(
            " Recommend me one film or TV show. \
             Respond exactly like this: Movie: <title>, tmdbid: <id>, type: <movie|tv>",
        );
        prompt
    }
}

/// Title picked by the model, resolved to a metadata provider id
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct Suggestion {
    #[serde(default)]
    pub title: Option<String>,
    pub tmdb_id: u64,
    pub media_type: MediaType,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> RecommendationRequest {
        RecommendationRequest {
            mood: "adventurous".to_string(),
            genre: None,
            duration: "2 hours".to_string(),
            region: None,
            age_rating: None,
        }
    }

    #[test]
    fn test_validate_requires_mood_and_duration() {
        assert!(request().validate().is_ok());

        let mut missing_mood = request();
        missing_mood.mood = "  ".to_string();
        assert!(missing_mood.validate().is_err());

        let mut missing_duration = request();
        missing_duration.duration = String::new();
        assert!(missing_duration.validate().is_err());
    }

    #[test]
    fn test_prompt_defaults_genre_to_any() {
        let prompt = request().prompt();
        assert!(prompt.contains("adventurous mood"));
        assert!(prompt.contains("prefer any genre"));
        assert!(prompt.contains("2 hours"));
        assert!(!prompt.contains("watching from"));
    }

    #[test]
    fn test_prompt_includes_optional_fields() {
        let mut req = request();
        req.genre = Some("sci-fi".to_string());
        req.region = Some("Canada".to_string());
        req.age_rating = Some("PG-13".to_string());

        let prompt = req.prompt();
        assert!(prompt.contains("prefer sci-fi genre"));
        assert!(prompt.contains("watching from Canada"));
        assert!(prompt.contains("rated PG-13"));
    }
}
