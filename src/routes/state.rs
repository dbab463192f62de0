use std::sync::Arc;

use crate::{
    auth::{AuthProvider, SessionRegistry},
    db::{Cache, Store},
    services::{
        InFlight, ListManager, MetadataProvider, Recommender, SnapshotRenderer,
    },
};

/// Shared application state
///
/// Every collaborator sits behind a trait object so tests can swap in fakes.
#[derive(Clone)]
pub struct AppState {
    pub metadata: Arc<dyn MetadataProvider>,
    pub store: Arc<dyn Store>,
    pub sessions: SessionRegistry,
    pub recommender: Arc<dyn Recommender>,
    pub lists: ListManager,
    pub inflight: InFlight,
}

impl AppState {
    pub fn new(
        metadata: Arc<dyn MetadataProvider>,
        store: Arc<dyn Store>,
        auth: Arc<dyn AuthProvider>,
        recommender: Arc<dyn Recommender>,
        renderer: Arc<dyn SnapshotRenderer>,
        session_cache: Option<Cache>,
    ) -> Self {
        Self {
            lists: ListManager::new(Arc::clone(&store), renderer),
            sessions: SessionRegistry::new(auth, session_cache),
            metadata,
            store,
            recommender,
            inflight: InFlight::new(),
        }
    }
}
