use std::convert::Infallible;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Redirect, Response,
    },
    Json,
};
use chrono::{Duration, Utc};
use futures::{Stream, StreamExt};
use serde::Deserialize;
use serde_json::json;
use tokio_stream::wrappers::WatchStream;

use super::AppState;
use crate::{
    auth::{extractors::REFRESH_MARGIN_SECS, ClientSession, SessionSnapshot, SessionStatus},
    error::{AppError, AppResult},
    models::Session,
};

#[derive(Debug, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct SignUpRequest {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub full_name: Option<String>,
}

/// Tokens handed back by the OAuth redirect
#[derive(Debug, Deserialize)]
pub struct CallbackRequest {
    pub access_token: String,
    pub refresh_token: String,
    #[serde(default = "default_expires_in")]
    pub expires_in: i64,
}

fn default_expires_in() -> i64 {
    3600
}

impl Credentials {
    fn validate(&self) -> AppResult<()> {
        if self.email.trim().is_empty() || !self.email.contains('@') {
            return Err(AppError::InvalidInput("A valid email is required".to_string()));
        }
        if self.password.is_empty() {
            return Err(AppError::InvalidInput("Password is required".to_string()));
        }
        Ok(())
    }
}

pub async fn sign_in(
    State(state): State<AppState>,
    client: ClientSession,
    Json(credentials): Json<Credentials>,
) -> AppResult<Json<SessionStatus>> {
    credentials.validate()?;

    let session = state
        .sessions
        .provider()
        .sign_in_with_password(credentials.email.trim(), &credentials.password)
        .await?;
    client.store.set_session(session);

    Ok(Json(client.store.snapshot().status()))
}

pub async fn sign_up(
    State(state): State<AppState>,
    client: ClientSession,
    Json(request): Json<SignUpRequest>,
) -> AppResult<Response> {
    let credentials = Credentials {
        email: request.email,
        password: request.password,
    };
    credentials.validate()?;

    let full_name = request.full_name.filter(|n| !n.trim().is_empty());
    let session = state
        .sessions
        .provider()
        .sign_up(credentials.email.trim(), &credentials.password, full_name)
        .await?;

    match session {
        Some(session) => {
            client.store.set_session(session);
            Ok((StatusCode::CREATED, Json(client.store.snapshot().status())).into_response())
        }
        None => Ok((
            StatusCode::ACCEPTED,
            Json(json!({ "status": "confirmation_required" })),
        )
            .into_response()),
    }
}

/// Completes an OAuth sign-in once the provider redirected back with tokens
pub async fn callback(
    State(state): State<AppState>,
    client: ClientSession,
    Json(request): Json<CallbackRequest>,
) -> AppResult<Json<SessionStatus>> {
    let user = state.sessions.provider().user(&request.access_token).await?;
    tracing::info!(client_id = %client.client_id, user_id = %user.id, "OAuth sign-in completed");

    client.store.set_session(Session {
        access_token: request.access_token,
        refresh_token: request.refresh_token,
        expires_at: Utc::now() + Duration::seconds(request.expires_in),
        user,
    });

    Ok(Json(client.store.snapshot().status()))
}

pub async fn refresh(client: ClientSession) -> AppResult<Json<SessionStatus>> {
    client.store.refresh().await?;
    Ok(Json(client.store.snapshot().status()))
}

pub async fn sign_out(client: ClientSession) -> Json<SessionStatus> {
    client.store.sign_out().await;
    Json(client.store.snapshot().status())
}

/// Current session state, refreshed first when close to expiry
pub async fn session(client: ClientSession) -> Json<SessionStatus> {
    if let Err(e) = client
        .store
        .fresh_session(Duration::seconds(REFRESH_MARGIN_SECS))
        .await
    {
        tracing::warn!(client_id = %client.client_id, error = %e, "Session check could not refresh");
    }
    Json(client.store.snapshot().status())
}

/// Redirects the browser to the provider's OAuth consent page
pub async fn oauth(
    State(state): State<AppState>,
    Path(provider): Path<String>,
) -> AppResult<Redirect> {
    let url = state.sessions.provider().authorize_url(&provider)?;
    Ok(Redirect::to(&url))
}

fn session_event(snapshot: SessionSnapshot) -> Event {
    Event::default()
        .event("session")
        .json_data(snapshot.status())
        .unwrap_or_else(|e| {
            tracing::error!(error = %e, "Failed to encode session event");
            Event::default().comment("encoding error")
        })
}

/// Server-sent stream of session changes, starting with the current state
pub async fn events(client: ClientSession) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    tracing::debug!(client_id = %client.client_id, "Session feed subscribed");

    let stream = WatchStream::new(client.store.subscribe())
        .map(|snapshot| Ok::<_, Infallible>(session_event(snapshot)));

    Sse::new(stream).keep_alive(KeepAlive::default())
}
