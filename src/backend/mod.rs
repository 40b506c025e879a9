//! Backend client adapter.
//!
//! Produces a single data-source handle for the hosted backend. Whether the
//! handle talks to the network is decided once, at construction time: real
//! credentials yield a [`LiveBackend`], anything else yields a [`MockBackend`]
//! whose calls all resolve to empty results. Callers never branch on which
//! one they hold.

mod live;
mod mock;
mod push;
#[cfg(test)]
pub mod stub;

pub use live::*;
pub use mock::*;
pub use push::*;

use crate::config::Config;

use async_trait::async_trait;
use serde_json::Value;
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tokio::sync::mpsc;

/// Backend table names. The data access layer is the only code allowed to
/// query these.
pub mod tables {
    pub const STATIONS: &str = "stations";
    pub const REALTIME_READINGS: &str = "realtime_readings";
    pub const DAILY_SUMMARIES: &str = "daily_summaries";
    pub const INVERTERS: &str = "inverters";
    pub const ALERTS: &str = "alerts";
}

/// Backend error types.
#[derive(Error, Debug)]
pub enum BackendError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("backend returned status {0}")]
    Status(u16),
    #[error("decode error: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("invalid backend configuration: {0}")]
    Config(String),
}

/// Query parameter for row requests, PostgREST style
/// (`("station_id", "eq.3")`, `("order", "timestamp.desc")`, ...).
pub type Param = (String, String);

/// Build a single query parameter.
pub fn param(key: &str, value: impl Into<String>) -> Param {
    (key.to_string(), value.into())
}

/// The data-source handle shared by all data access functions.
///
/// Two implementations exist: [`LiveBackend`] bound to the configured
/// endpoint, and [`MockBackend`] whose every method is a no-op with an empty
/// result. Both satisfy the same call shape.
#[async_trait]
pub trait BackendApi: Send + Sync {
    /// Whether this handle is backed by real credentials.
    fn is_configured(&self) -> bool;

    /// Fetch rows from a table, filtered and ordered by `query`.
    async fn rows(&self, table: &str, query: &[Param]) -> Result<Vec<Value>, BackendError>;

    /// Insert a single row.
    async fn insert(&self, table: &str, row: Value) -> Result<(), BackendError>;

    /// Insert a row, merging with an existing one on conflict over the given
    /// comma-separated column list.
    async fn upsert(&self, table: &str, row: Value, on_conflict: &str) -> Result<(), BackendError>;

    /// Patch all rows matched by `query`.
    async fn update(&self, table: &str, query: &[Param], patch: Value)
        -> Result<(), BackendError>;

    /// Open a push subscription on the given channels. Row changes arrive as
    /// [`PushEvent`]s on `tx` until the subscription is released.
    fn subscribe(&self, channels: &[PushChannel], tx: mpsc::Sender<PushEvent>) -> Subscription;
}

// Process-wide handle. The live client owns a connection pool, so it must be
// constructed at most once; first caller wins, everyone else gets the cached
// Arc.
static HANDLE: Mutex<Option<Arc<dyn BackendApi>>> = Mutex::new(None);

/// Get the process-wide backend handle, constructing it on first access from
/// the environment configuration.
pub fn handle() -> Arc<dyn BackendApi> {
    let mut guard = HANDLE.lock().unwrap_or_else(|e| e.into_inner());
    if let Some(existing) = guard.as_ref() {
        return existing.clone();
    }
    let built = build(&Config::load());
    *guard = Some(built.clone());
    built
}

/// Drop the cached handle so the next [`handle`] call reconstructs it.
/// Teardown hook for tests.
pub fn reset() {
    let mut guard = HANDLE.lock().unwrap_or_else(|e| e.into_inner());
    *guard = None;
}

/// Construct a backend handle for the given configuration.
pub fn build(cfg: &Config) -> Arc<dyn BackendApi> {
    if !cfg.is_configured() {
        tracing::info!("No backend credentials configured, running in demo mode");
        return Arc::new(MockBackend::new());
    }

    match LiveBackend::new(cfg) {
        Ok(live) => Arc::new(live),
        Err(e) => {
            tracing::warn!("Failed to create backend client, falling back to demo mode: {e}");
            Arc::new(MockBackend::new())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_falls_back_on_bad_url() {
        let cfg = Config {
            backend_url: "not a url at all".to_string(),
            backend_key: "anon-key".to_string(),
            ..Config::default()
        };
        let backend = build(&cfg);
        assert!(!backend.is_configured());
    }

    #[test]
    fn test_singleton_returns_same_instance() {
        reset();

        let handles: Vec<_> = (0..8)
            .map(|_| std::thread::spawn(handle))
            .collect::<Vec<_>>()
            .into_iter()
            .map(|h| h.join().unwrap())
            .collect();

        for other in &handles[1..] {
            assert!(Arc::ptr_eq(&handles[0], other));
        }

        reset();
        let rebuilt = handle();
        assert!(!Arc::ptr_eq(&handles[0], &rebuilt));
        reset();
    }
}
