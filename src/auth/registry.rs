use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use tokio::{task::JoinHandle, time::MissedTickBehavior};
use uuid::Uuid;

use crate::{
    auth::{provider::AuthProvider, store::SessionStore},
    db::{Cache, CacheKey},
    models::Session,
};

type Stores = HashMap<Uuid, Arc<SessionStore>>;

/// One [`SessionStore`] per browser, keyed by the client id cookie.
///
/// Stores are only kept while they hold a session, have a subscriber, or are
/// in use by a request. Anonymous browsers leave nothing behind.
#[derive(Clone)]
pub struct SessionRegistry {
    stores: Arc<RwLock<Stores>>,
    provider: Arc<dyn AuthProvider>,
    cache: Option<Cache>,
}

impl SessionRegistry {
    /// `cache` persists sessions across restarts; `None` keeps them in memory
    pub fn new(provider: Arc<dyn AuthProvider>, cache: Option<Cache>) -> Self {
        Self {
            stores: Arc::new(RwLock::new(HashMap::new())),
            provider,
            cache,
        }
    }

    pub fn provider(&self) -> &Arc<dyn AuthProvider> {
        &self.provider
    }

    // Entries are swapped whole, so a poisoned map is still consistent
    fn read(&self) -> RwLockReadGuard<'_, Stores> {
        self.stores
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Stores> {
        self.stores
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// The client's store, created on first use and restored from the cache.
    /// Pair every call with [`SessionRegistry::release`].
    pub async fn store_for(&self, client_id: Uuid) -> Arc<SessionStore> {
        let existing = self.read().get(&client_id).cloned();
        if let Some(store) = existing {
            return store;
        }

        let restored = self.restore(client_id).await;
        let mut stores = self.write();
        let store = stores.entry(client_id).or_insert_with(|| {
            Arc::new(SessionStore::new(
                client_id,
                Arc::clone(&self.provider),
                self.cache.clone(),
                restored,
            ))
        });
        Arc::clone(store)
    }

    /// Called by the last user of a store obtained from
    /// [`SessionRegistry::store_for`], just before it lets go. Evicts the store
    /// when the caller's reference and the registry's are the only ones left.
    pub fn release(&self, store: &Arc<SessionStore>) {
        let client_id = store.client_id();
        let mut stores = self.write();
        let evict = stores.get(&client_id).is_some_and(|entry| {
            Arc::ptr_eq(entry, store) && Arc::strong_count(entry) == 2 && entry.is_idle()
        });
        if evict {
            stores.remove(&client_id);
            tracing::trace!(client_id = %client_id, "Evicted idle session store");
        }
    }

    /// Evicts every unused store, including ones left behind by closed
    /// session feeds
    pub fn prune(&self) -> usize {
        let mut stores = self.write();
        let before = stores.len();
        stores.retain(|_, store| !Self::is_unused(store));
        let evicted = before - stores.len();
        if evicted > 0 {
            tracing::debug!(evicted, remaining = stores.len(), "Pruned idle session stores");
        }
        evicted
    }

    /// Runs [`SessionRegistry::prune`] on a fixed period until the runtime
    /// shuts down
    pub fn spawn_pruner(&self, period: Duration) -> JoinHandle<()> {
        let registry = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                registry.prune();
            }
        })
    }

    // The registry's own reference is the only one left
    fn is_unused(store: &Arc<SessionStore>) -> bool {
        Arc::strong_count(store) == 1 && store.is_idle()
    }

    async fn restore(&self, client_id: Uuid) -> Option<Session> {
        let cache = self.cache.as_ref()?;
        let session: Session = cache.lookup(&CacheKey::Session(client_id)).await?;
        tracing::debug!(client_id = %client_id, user_id = %session.user_id(), "Restored persisted session");
        Some(session)
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }
}
