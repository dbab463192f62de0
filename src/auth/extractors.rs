use std::sync::Arc;

use axum::{extract::FromRequestParts, http::request::Parts};
use chrono::Duration;

use crate::{
    auth::{registry::SessionRegistry, store::SessionStore},
    error::AppError,
    middleware::ClientId,
    models::Session,
    routes::AppState,
};

/// Sessions this close to expiry are refreshed before use
pub const REFRESH_MARGIN_SECS: i64 = 60;

/// The requesting browser and its session store. The store goes back to the
/// registry when the request is done with it.
pub struct ClientSession {
    pub client_id: ClientId,
    pub store: Arc<SessionStore>,
    registry: SessionRegistry,
}

impl Drop for ClientSession {
    fn drop(&mut self) {
        self.registry.release(&self.store);
    }
}

#[axum::async_trait]
impl FromRequestParts<AppState> for ClientSession {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let client_id = parts
            .extensions
            .get::<ClientId>()
            .copied()
            .ok_or_else(|| AppError::Internal("Missing client id extension".into()))?;

        let store = state.sessions.store_for(client_id.0).await;
        Ok(ClientSession {
            client_id,
            store,
            registry: state.sessions.clone(),
        })
    }
}

/// Optional session; anonymous requests get `None` instead of a rejection
pub struct MaybeSession(pub Option<Arc<Session>>);

#[axum::async_trait]
impl FromRequestParts<AppState> for MaybeSession {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let client = ClientSession::from_request_parts(parts, state).await?;

        match client
            .store
            .fresh_session(Duration::seconds(REFRESH_MARGIN_SECS))
            .await
        {
            Ok(session) => Ok(MaybeSession(session)),
            Err(e) => {
                tracing::warn!(client_id = %client.client_id, error = %e, "Expired session could not be refreshed");
                Ok(MaybeSession(None))
            }
        }
    }
}

/// Required session. Rejects with `Unauthenticated` (401 plus a sign-in hint).
pub struct CurrentSession(pub Arc<Session>);

#[axum::async_trait]
impl FromRequestParts<AppState> for CurrentSession {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let MaybeSession(session) = MaybeSession::from_request_parts(parts, state).await?;
        session.map(CurrentSession).ok_or(AppError::Unauthenticated)
    }
}
