//! Session-scoped upload storage
//!
//! Each upload gets its own random session id; entries expire after the
//! configured idle TTL and the store is bounded by session count.

use std::sync::Arc;

use moka::future::Cache;
use rand::Rng;

use crate::config::ServerConfig;
use crate::data::Upload;

#[derive(Clone)]
pub struct SessionStore {
    uploads: Cache<String, Arc<Upload>>,
}

impl SessionStore {
    pub fn new(config: &ServerConfig) -> Self {
        let uploads = Cache::builder()
            .max_capacity(config.max_sessions)
            .time_to_idle(config.session_ttl)
            .build();
        SessionStore { uploads }
    }

    /// Stores the upload under a fresh session id and returns the id.
    pub async fn insert(&self, upload: Upload) -> String {
        let id = new_session_id();
        tracing::info!(
            "Session {} created for '{}' ({} sheets)",
            id,
            upload.filename,
            upload.sheet_names().len()
        );
        self.uploads.insert(id.clone(), Arc::new(upload)).await;
        id
    }

    pub async fn get(&self, id: &str) -> Option<Arc<Upload>> {
        self.uploads.get(id).await
    }

    /// Returns true if the session existed.
    pub async fn remove(&self, id: &str) -> bool {
        self.uploads.remove(id).await.is_some()
    }

    pub fn len(&self) -> u64 {
        self.uploads.entry_count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn new_session_id() -> String {
    format!("{:032x}", rand::thread_rng().gen::<u128>())
}
