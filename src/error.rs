use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// Path the browser is sent to when an action needs a session
pub const SIGN_IN_PATH: &str = "/sign-in";

/// Application-level errors
#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Cache error: {0}")]
    Cache(#[from] redis::RedisError),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Rate limited: {0}")]
    RateLimited(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Sign in required")]
    Unauthenticated,

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("External API error: {0}")]
    ExternalApi(String),

    #[error("Request superseded by a newer one")]
    Superseded,

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    /// Maps a non-success upstream status to the typed failure callers expect
    pub fn from_upstream(service: &str, status: reqwest::StatusCode, body: &str) -> Self {
        match status {
            reqwest::StatusCode::NOT_FOUND => {
                AppError::NotFound(format!("{} resource not found", service))
            }
            reqwest::StatusCode::TOO_MANY_REQUESTS => {
                AppError::RateLimited(format!("{} rate limit exceeded", service))
            }
            reqwest::StatusCode::UNAUTHORIZED | reqwest::StatusCode::FORBIDDEN => {
                AppError::Unauthorized(format!("{} rejected credentials: {}", service, body))
            }
            _ => AppError::ExternalApi(format!(
                "{} returned status {}: {}",
                service, status, body
            )),
        }
    }

    /// Failures a feed may swallow and render as an empty section
    pub fn is_degradable(&self) -> bool {
        matches!(
            self,
            AppError::Network(_)
                | AppError::NotFound(_)
                | AppError::RateLimited(_)
                | AppError::ExternalApi(_)
        )
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            AppError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::RateLimited(msg) => (StatusCode::TOO_MANY_REQUESTS, msg.clone()),
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg.clone()),
            AppError::Unauthenticated => {
                let body = Json(json!({
                    "error": self.to_string(),
                    "redirect": SIGN_IN_PATH,
                }));
                return (StatusCode::UNAUTHORIZED, body).into_response();
            }
            AppError::Superseded => return StatusCode::NO_CONTENT.into_response(),
            AppError::Database(_)
            | AppError::Migration(_)
            | AppError::Cache(_)
            | AppError::Internal(_) => {
                tracing::error!(error = %self, "Request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, self.to_string())
            }
            AppError::ExternalApi(msg) => (StatusCode::BAD_GATEWAY, msg.clone()),
            AppError::Network(_) => (StatusCode::BAD_GATEWAY, self.to_string()),
        };

        let body = Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
