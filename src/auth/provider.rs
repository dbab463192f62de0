/// Supabase GoTrue auth provider
///
/// Endpoints used (all under `{supabase_url}/auth/v1`, with the project's
/// anonymous key in the `apikey` header):
///
/// - `POST /token?grant_type=password` and `?grant_type=refresh_token`
/// - `POST /signup`
/// - `GET /user` and `POST /logout` with the user's bearer token
/// - `GET /authorize?provider=` for the OAuth redirect
use chrono::{DateTime, Duration, Utc};
use reqwest::{Client as HttpClient, Url};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{Session, UserIdentity},
    services::tmdb::HTTP_TIMEOUT,
};

/// OAuth providers enabled on the project
pub const OAUTH_PROVIDERS: &[&str] = &["google"];

#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait AuthProvider: Send + Sync {
    async fn sign_in_with_password(&self, email: &str, password: &str) -> AppResult<Session>;

    /// Registers a user. `None` means the address must be confirmed first.
    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        full_name: Option<String>,
    ) -> AppResult<Option<Session>>;

    /// Exchanges a refresh token for a new session
    async fn refresh(&self, refresh_token: &str) -> AppResult<Session>;

    /// Resolves the user behind an access token
    async fn user(&self, access_token: &str) -> AppResult<UserIdentity>;

    async fn sign_out(&self, access_token: &str) -> AppResult<()>;

    /// URL the browser visits to start an OAuth sign-in
    fn authorize_url(&self, provider: &str) -> AppResult<String>;
}

// ============================================================================
// GoTrue API Types
// ============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GoTrueUserMetadata {
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GoTrueUser {
    pub id: Uuid,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub user_metadata: GoTrueUserMetadata,
}

impl From<GoTrueUser> for UserIdentity {
    /// Display name prefers the full name, then the name, then the email
    fn from(user: GoTrueUser) -> Self {
        let filled = |v: Option<String>| v.filter(|s| !s.trim().is_empty());
        let display_name = filled(user.user_metadata.full_name)
            .or(filled(user.user_metadata.name))
            .or_else(|| user.email.clone())
            .unwrap_or_else(|| "Viewer".to_string());

        UserIdentity {
            id: user.id,
            email: user.email,
            display_name,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct GoTrueSession {
    pub access_token: String,
    pub refresh_token: String,
    #[serde(default)]
    pub expires_in: Option<i64>,
    #[serde(default)]
    pub expires_at: Option<i64>,
    pub user: GoTrueUser,
}

impl GoTrueSession {
    pub fn into_session(self, now: DateTime<Utc>) -> Session {
        let expires_at = self
            .expires_at
            .and_then(|ts| DateTime::<Utc>::from_timestamp(ts, 0))
            .unwrap_or_else(|| now + Duration::seconds(self.expires_in.unwrap_or(3600)));

        Session {
            access_token: self.access_token,
            refresh_token: self.refresh_token,
            expires_at,
            user: self.user.into(),
        }
    }
}

/// Sign-up answers with a session when confirmation is disabled, otherwise
/// with the bare user
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum GoTrueSignUp {
    Session(GoTrueSession),
    User(GoTrueUser),
}

#[derive(Serialize)]
struct PasswordGrant<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct RefreshGrant<'a> {
    refresh_token: &'a str,
}

#[derive(Serialize)]
struct SignUpBody<'a> {
    email: &'a str,
    password: &'a str,
    data: SignUpData,
}

#[derive(Serialize)]
struct SignUpData {
    #[serde(skip_serializing_if = "Option::is_none")]
    full_name: Option<String>,
}

pub struct GoTrueClient {
    http_client: HttpClient,
    auth_url: String,
    anon_key: String,
    redirect_url: String,
}

impl GoTrueClient {
    pub fn new(supabase_url: &str, anon_key: String, redirect_url: String) -> AppResult<Self> {
        Ok(Self {
            http_client: HttpClient::builder().timeout(HTTP_TIMEOUT).build()?,
            auth_url: format!("{}/auth/v1", supabase_url.trim_end_matches('/')),
            anon_key,
            redirect_url,
        })
    }

    async fn check(response: reqwest::Response) -> AppResult<reqwest::Response> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        tracing::warn!(status = %status, "Auth provider request failed");

        // GoTrue answers a bad password or a revoked refresh token with 400
        if status == reqwest::StatusCode::BAD_REQUEST && body.contains("invalid_grant") {
            return Err(AppError::Unauthorized(
                "Invalid credentials or expired session".to_string(),
            ));
        }
        Err(AppError::from_upstream("Auth provider", status, &body))
    }

    async fn token<B: Serialize + Sync>(&self, grant_type: &str, body: &B) -> AppResult<Session> {
        let response = self
            .http_client
            .post(format!("{}/token", self.auth_url))
            .query(&[("grant_type", grant_type)])
            .header("apikey", &self.anon_key)
            .json(body)
            .send()
            .await?;

        let session: GoTrueSession = Self::check(response).await?.json().await?;
        Ok(session.into_session(Utc::now()))
    }
}

#[async_trait::async_trait]
impl AuthProvider for GoTrueClient {
    async fn sign_in_with_password(&self, email: &str, password: &str) -> AppResult<Session> {
        let session = self
            .token("password", &PasswordGrant { email, password })
            .await?;
        tracing::info!(user_id = %session.user_id(), "Signed in with password");
        Ok(session)
    }

    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        full_name: Option<String>,
    ) -> AppResult<Option<Session>> {
        let response = self
            .http_client
            .post(format!("{}/signup", self.auth_url))
            .header("apikey", &self.anon_key)
            .json(&SignUpBody {
                email,
                password,
                data: SignUpData { full_name },
            })
            .send()
            .await?;

        match Self::check(response).await?.json::<GoTrueSignUp>().await? {
            GoTrueSignUp::Session(session) => Ok(Some(session.into_session(Utc::now()))),
            GoTrueSignUp::User(user) => {
                tracing::info!(user_id = %user.id, "Sign-up awaiting email confirmation");
                Ok(None)
            }
        }
    }

    async fn refresh(&self, refresh_token: &str) -> AppResult<Session> {
        self.token("refresh_token", &RefreshGrant { refresh_token })
            .await
    }

    async fn user(&self, access_token: &str) -> AppResult<UserIdentity> {
        let response = self
            .http_client
            .get(format!("{}/user", self.auth_url))
            .header("apikey", &self.anon_key)
            .bearer_auth(access_token)
            .send()
            .await?;

        let user: GoTrueUser = Self::check(response).await?.json().await?;
        Ok(user.into())
    }

    async fn sign_out(&self, access_token: &str) -> AppResult<()> {
        let response = self
            .http_client
            .post(format!("{}/logout", self.auth_url))
            .header("apikey", &self.anon_key)
            .bearer_auth(access_token)
            .send()
            .await?;

        Self::check(response).await?;
        Ok(())
    }

    fn authorize_url(&self, provider: &str) -> AppResult<String> {
        let provider = provider.to_lowercase();
        if !OAUTH_PROVIDERS.contains(&provider.as_str()) {
            return Err(AppError::InvalidInput(format!(
                "Unsupported sign-in provider: {}",
                provider
            )));
        }

        let url = Url::parse_with_params(
            &format!("{}/authorize", self.auth_url),
            &[
                ("provider", provider.as_str()),
                ("redirect_to", self.redirect_url.as_str()),
            ],
        )
        .map_err(|e| AppError::Internal(format!("Invalid auth URL: {}", e)))?;

        Ok(url.to_string())
    }
}
