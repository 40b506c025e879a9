//! No-op backend handle used when no credentials are configured.

use super::{BackendApi, BackendError, Param, PushChannel, PushEvent, Subscription};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::mpsc;

/// Stand-in for the live client. Every query resolves to an empty result and
/// subscriptions are inert, so callers can hold either handle without
/// branching.
#[derive(Debug, Default)]
pub struct MockBackend;

impl MockBackend {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl BackendApi for MockBackend {
    fn is_configured(&self) -> bool {
        false
    }

    async fn rows(&self, _table: &str, _query: &[Param]) -> Result<Vec<Value>, BackendError> {
        Ok(Vec::new())
    }

    async fn insert(&self, _table: &str, _row: Value) -> Result<(), BackendError> {
        Ok(())
    }

    async fn upsert(
        &self,
        _table: &str,
        _row: Value,
        _on_conflict: &str,
    ) -> Result<(), BackendError> {
        Ok(())
    }

    async fn update(
        &self,
        _table: &str,
        _query: &[Param],
        _patch: Value,
    ) -> Result<(), BackendError> {
        Ok(())
    }

    fn subscribe(&self, _channels: &[PushChannel], _tx: mpsc::Sender<PushEvent>) -> Subscription {
        Subscription::noop()
    }
}
