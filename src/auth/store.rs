//! Per-client session state.
//!
//! A [`SessionStore`] owns one browser's session as an immutable
//! [`SessionSnapshot`] behind a `watch` channel. Every change replaces the
//! snapshot wholesale and wakes subscribers, so readers never see a
//! half-updated session.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tokio::sync::{watch, Mutex};
use uuid::Uuid;

use crate::{
    auth::provider::AuthProvider,
    db::{Cache, CacheKey},
    error::{AppError, AppResult},
    models::{Session, UserIdentity},
};

/// How long a persisted session survives without activity
const SESSION_CACHE_TTL: u64 = 60 * 60 * 24 * 30; // 30 days

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionSnapshot {
    pub session: Option<Arc<Session>>,
    /// Message of the last failed refresh, cleared by the next success
    pub error: Option<String>,
    pub loading: bool,
}

/// What the browser is told about its session; tokens never leave the server
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SessionStatus {
    pub signed_in: bool,
    pub user: Option<UserIdentity>,
    pub expires_at: Option<DateTime<Utc>>,
    pub error: Option<String>,
    pub loading: bool,
}

impl SessionSnapshot {
    pub fn status(&self) -> SessionStatus {
        SessionStatus {
            signed_in: self.session.is_some(),
            user: self.session.as_ref().map(|s| s.user.clone()),
            expires_at: self.session.as_ref().map(|s| s.expires_at),
            error: self.error.clone(),
            loading: self.loading,
        }
    }
}

pub struct SessionStore {
    client_id: Uuid,
    tx: watch::Sender<SessionSnapshot>,
    provider: Arc<dyn AuthProvider>,
    cache: Option<Cache>,
    refresh_lock: Mutex<()>,
}

impl SessionStore {
    pub fn new(
        client_id: Uuid,
        provider: Arc<dyn AuthProvider>,
        cache: Option<Cache>,
        initial: Option<Session>,
    ) -> Self {
        let (tx, _rx) = watch::channel(SessionSnapshot {
            session: initial.map(Arc::new),
            error: None,
            loading: false,
        });

        Self {
            client_id,
            tx,
            provider,
            cache,
            refresh_lock: Mutex::new(()),
        }
    }

    pub fn client_id(&self) -> Uuid {
        self.client_id
    }

    pub fn get_session(&self) -> Option<Arc<Session>> {
        self.tx.borrow().session.clone()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.tx.borrow().clone()
    }

    /// Observes every snapshot replacement from now on
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.tx.subscribe()
    }

    /// Signed out and nobody is watching
    pub fn is_idle(&self) -> bool {
        self.tx.borrow().session.is_none() && self.tx.receiver_count() == 0
    }

    /// Installs a session obtained from a sign-in
    pub fn set_session(&self, session: Session) -> Arc<Session> {
        let session = Arc::new(session);
        self.replace(SessionSnapshot {
            session: Some(Arc::clone(&session)),
            error: None,
            loading: false,
        });
        session
    }

    /// Exchanges the refresh token for a new session.
    ///
    /// A transport or upstream failure keeps the current session and records
    /// the error. An explicit rejection from the provider clears the session.
    /// If the session was replaced or signed out while the provider was
    /// answering, the outcome is dropped and the newer state stands.
    pub async fn refresh(&self) -> AppResult<Arc<Session>> {
        let current = self.get_session().ok_or(AppError::Unauthenticated)?;
        let _guard = self.refresh_lock.lock().await;

        // Another request refreshed while this one waited for the lock
        match self.get_session() {
            Some(latest) if latest.refresh_token != current.refresh_token => return Ok(latest),
            None => return Err(AppError::Unauthenticated),
            Some(_) => {}
        }

        self.tx.send_modify(|snapshot| snapshot.loading = true);

        let outcome = self.provider.refresh(&current.refresh_token).await;

        let (snapshot, result) = match outcome {
            Ok(session) => {
                let session = Arc::new(session);
                let snapshot = SessionSnapshot {
                    session: Some(Arc::clone(&session)),
                    error: None,
                    loading: false,
                };
                (snapshot, Ok(session))
            }
            Err(AppError::Unauthorized(msg)) => {
                let snapshot = SessionSnapshot {
                    session: None,
                    error: Some(msg.clone()),
                    loading: false,
                };
                (snapshot, Err(AppError::Unauthorized(msg)))
            }
            Err(e) => {
                let snapshot = SessionSnapshot {
                    session: Some(Arc::clone(&current)),
                    error: Some(e.to_string()),
                    loading: false,
                };
                (snapshot, Err(e))
            }
        };

        if !self.replace_if_holding(&current, snapshot) {
            tracing::info!(client_id = %self.client_id, "Session changed during refresh, discarding result");
            return match self.get_session() {
                Some(latest) => Ok(latest),
                None => Err(AppError::Unauthenticated),
            };
        }

        match &result {
            Ok(session) => {
                tracing::info!(client_id = %self.client_id, user_id = %session.user_id(), "Session refreshed")
            }
            Err(AppError::Unauthorized(_)) => {
                tracing::info!(client_id = %self.client_id, "Refresh token rejected, signing out")
            }
            Err(e) => {
                tracing::warn!(client_id = %self.client_id, error = %e, "Session refresh failed, keeping prior session")
            }
        }
        result
    }

    /// The session, refreshed first when it expires within `margin`.
    ///
    /// A failed refresh still yields the old session while it is valid.
    pub async fn fresh_session(&self, margin: Duration) -> AppResult<Option<Arc<Session>>> {
        let Some(session) = self.get_session() else {
            return Ok(None);
        };
        let now = Utc::now();
        if !session.expires_within(now, margin) {
            return Ok(Some(session));
        }

        match self.refresh().await {
            Ok(session) => Ok(Some(session)),
            Err(AppError::Unauthorized(_)) | Err(AppError::Unauthenticated) => Ok(None),
            Err(_) if !session.is_expired(now) => Ok(Some(session)),
            Err(e) => Err(e),
        }
    }

    /// Clears the session after a best-effort logout at the provider
    pub async fn sign_out(&self) {
        if let Some(session) = self.get_session() {
            if let Err(e) = self.provider.sign_out(&session.access_token).await {
                tracing::warn!(client_id = %self.client_id, error = %e, "Provider logout failed");
            }
            tracing::info!(client_id = %self.client_id, user_id = %session.user_id(), "Signed out");
        }
        self.replace(SessionSnapshot::default());
    }

    fn replace(&self, snapshot: SessionSnapshot) {
        self.persist(&snapshot);
        self.tx.send_replace(snapshot);
    }

    /// Replaces the snapshot only while it still carries `expected`
    fn replace_if_holding(&self, expected: &Session, snapshot: SessionSnapshot) -> bool {
        self.tx.send_if_modified(|value| {
            let holding = value
                .session
                .as_ref()
                .is_some_and(|s| s.refresh_token == expected.refresh_token);
            if holding {
                self.persist(&snapshot);
                *value = snapshot;
            }
            holding
        })
    }

    fn persist(&self, snapshot: &SessionSnapshot) {
        let Some(cache) = &self.cache else {
            return;
        };
        let key = CacheKey::Session(self.client_id);
        match &snapshot.session {
            Some(session) => cache.set_in_background(&key, session.as_ref(), SESSION_CACHE_TTL),
            None => cache.delete_in_background(&key),
        }
    }
}
