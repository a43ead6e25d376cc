//! Read-only access to per-session patient context.

use std::collections::HashMap;

use async_trait::async_trait;
use care_core::QueryContext;
use thiserror::Error;
use tokio::sync::RwLock;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ContextStoreError {
    #[error("context store unavailable: {0}")]
    Unavailable(String),
}

/// Supplies prior history, medications and vitals for a session.
///
/// The pipeline only reads through this trait.
#[async_trait]
pub trait ContextStore: Send + Sync {
    async fn load(&self, session_id: &str) -> Result<Option<QueryContext>, ContextStoreError>;
}

/// Thread-safe in-memory store keyed by session id.
#[derive(Debug, Default)]
pub struct InMemoryContextStore {
    contexts: RwLock<HashMap<String, QueryContext>>,
}

impl InMemoryContextStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a session. Called by the host application, not the pipeline.
    pub async fn insert(&self, session_id: impl Into<String>, context: QueryContext) {
        self.contexts.write().await.insert(session_id.into(), context);
    }

    pub async fn len(&self) -> usize {
        self.contexts.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.contexts.read().await.is_empty()
    }
}

#[async_trait]
impl ContextStore for InMemoryContextStore {
    async fn load(&self, session_id: &str) -> Result<Option<QueryContext>, ContextStoreError> {
        Ok(self.contexts.read().await.get(session_id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_insert_and_load() {
        let store = InMemoryContextStore::new();
        assert!(store.is_empty().await);

        store
            .insert("s1", QueryContext::default().with_medication("warfarin"))
            .await;

        let loaded = store.load("s1").await.unwrap().unwrap();
        assert!(loaded.takes_medication("warfarin"));
        assert!(store.load("missing").await.unwrap().is_none());
        assert_eq!(store.len().await, 1);
    }
}
