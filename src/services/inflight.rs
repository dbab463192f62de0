//! Stale-response protection for type-ahead requests.
//!
//! Each request registers under `(client, kind)` and gets a generation number.
//! Registering again for the same key supersedes the earlier request; when the
//! earlier one completes, [`Ticket::finish`] turns its result into
//! [`AppError::Superseded`] so a slow response never replaces a fresher one.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use uuid::Uuid;

use crate::error::{AppError, AppResult};

/// Semantic identity of a request, together with the client id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestKind {
    HeaderSearch,
    ListSearch,
    Recommendation,
}

type Key = (Uuid, RequestKind);

#[derive(Default)]
struct Generations {
    next: AtomicU64,
    current: Mutex<HashMap<Key, u64>>,
}

impl Generations {
    fn current(&self) -> MutexGuard<'_, HashMap<Key, u64>> {
        // The map holds plain integers, so a poisoned lock is still consistent
        self.current
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[derive(Clone, Default)]
pub struct InFlight {
    generations: Arc<Generations>,
}

/// Registration of one in-flight request. Dropping it, finished or not,
/// releases its key unless a newer request took the key over.
pub struct Ticket {
    key: Key,
    generation: u64,
    generations: Arc<Generations>,
}

impl InFlight {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a request, superseding any earlier one with the same key
    pub fn begin(&self, client_id: Uuid, kind: RequestKind) -> Ticket {
        let generation = self.generations.next.fetch_add(1, Ordering::Relaxed) + 1;
        let key = (client_id, kind);
        self.generations.current().insert(key, generation);

        Ticket {
            key,
            generation,
            generations: Arc::clone(&self.generations),
        }
    }

    /// Number of keys with a request outstanding
    pub fn pending(&self) -> usize {
        self.generations.current().len()
    }
}

impl Ticket {
    pub fn is_current(&self) -> bool {
        self.generations.current().get(&self.key) == Some(&self.generation)
    }

    /// Passes `result` through if this is still the newest request for its key
    pub fn finish<T>(self, result: AppResult<T>) -> AppResult<T> {
        if !self.is_current() {
            tracing::debug!(kind = ?self.key.1, "Discarding superseded response");
            return Err(AppError::Superseded);
        }
        result
    }
}

impl Drop for Ticket {
    fn drop(&mut self) {
        let mut current = self.generations.current();
        if current.get(&self.key) == Some(&self.generation) {
            current.remove(&self.key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latest_request_wins() {
        let inflight = InFlight::new();
        let client = Uuid::new_v4();

        let first = inflight.begin(client, RequestKind::HeaderSearch);
        let second = inflight.begin(client, RequestKind::HeaderSearch);

        assert!(!first.is_current());
        assert!(matches!(first.finish(Ok(1)), Err(AppError::Superseded)));
        assert_eq!(second.finish(Ok(2)).unwrap(), 2);
        assert_eq!(inflight.pending(), 0);
    }

    #[test]
    fn test_finished_key_does_not_revive_old_ticket() {
        let inflight = InFlight::new();
        let client = Uuid::new_v4();

        let stale = inflight.begin(client, RequestKind::ListSearch);
        let fresh = inflight.begin(client, RequestKind::ListSearch);
        fresh.finish(Ok(())).unwrap();

        let _next = inflight.begin(client, RequestKind::ListSearch);
        assert!(matches!(stale.finish(Ok(())), Err(AppError::Superseded)));
    }

    #[test]
    fn test_keys_are_independent() {
        let inflight = InFlight::new();
        let client = Uuid::new_v4();
        let other = Uuid::new_v4();

        let search = inflight.begin(client, RequestKind::HeaderSearch);
        let _ai = inflight.begin(client, RequestKind::Recommendation);
        let _other_search = inflight.begin(other, RequestKind::HeaderSearch);

        assert!(search.is_current());
    }

    #[test]
    fn test_abandoned_ticket_releases_its_key() {
        let inflight = InFlight::new();
        let client = Uuid::new_v4();

        let ticket = inflight.begin(client, RequestKind::Recommendation);
        assert_eq!(inflight.pending(), 1);
        drop(ticket);
        assert_eq!(inflight.pending(), 0);
    }

    #[test]
    fn test_dropped_stale_ticket_keeps_newer_registration() {
        let inflight = InFlight::new();
        let client = Uuid::new_v4();

        let stale = inflight.begin(client, RequestKind::HeaderSearch);
        let fresh = inflight.begin(client, RequestKind::HeaderSearch);
        drop(stale);

        assert_eq!(inflight.pending(), 1);
        assert!(fresh.is_current());
    }

    #[tokio::test]
    async fn test_cancelled_request_releases_its_key() {
        let inflight = InFlight::new();
        let client = Uuid::new_v4();

        let request = {
            let inflight = inflight.clone();
            async move {
                let ticket = inflight.begin(client, RequestKind::ListSearch);
                std::future::pending::<()>().await;
                ticket.finish(Ok(()))
            }
        };
        let timed_out =
            tokio::time::timeout(std::time::Duration::from_millis(10), request).await;

        assert!(timed_out.is_err());
        assert_eq!(inflight.pending(), 0);
    }

    #[test]
    fn test_current_ticket_passes_errors_through() {
        let inflight = InFlight::new();
        let ticket = inflight.begin(Uuid::new_v4(), RequestKind::HeaderSearch);
        let result: AppResult<()> = ticket.finish(Err(AppError::RateLimited("x".into())));
        assert!(matches!(result, Err(AppError::RateLimited(_))));
    }
}
