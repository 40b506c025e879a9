//! Live backend client bound to a hosted PostgREST-style endpoint.

use super::{param, BackendApi, BackendError, Param, PushChannel, PushEvent, Subscription};
use crate::config::Config;

use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc};

/// How often each push channel checks its table cursor for row changes.
const PUSH_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Client for the configured backend. Cheap to clone; all clones share one
/// connection pool.
#[derive(Clone)]
pub struct LiveBackend {
    http: reqwest::Client,
    base: String,
    read_key: String,
    write_key: String,
}

impl LiveBackend {
    /// Create a client bound to the configured endpoint.
    pub fn new(cfg: &Config) -> Result<Self, BackendError> {
        let url = reqwest::Url::parse(&cfg.backend_url)
            .map_err(|e| BackendError::Config(format!("{}: {e}", cfg.backend_url)))?;

        let http = reqwest::Client::builder()
            .build()
            .map_err(BackendError::Http)?;

        Ok(Self {
            http,
            base: url.as_str().trim_end_matches('/').to_string(),
            read_key: cfg.backend_key.clone(),
            write_key: cfg.write_key().to_string(),
        })
    }

    fn endpoint(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base, table)
    }

    fn check_status(resp: &reqwest::Response) -> Result<(), BackendError> {
        if resp.status().is_success() {
            Ok(())
        } else {
            Err(BackendError::Status(resp.status().as_u16()))
        }
    }
}

#[async_trait]
impl BackendApi for LiveBackend {
    fn is_configured(&self) -> bool {
        true
    }

    async fn rows(&self, table: &str, query: &[Param]) -> Result<Vec<Value>, BackendError> {
        let resp = self
            .http
            .get(self.endpoint(table))
            .header("apikey", &self.read_key)
            .bearer_auth(&self.read_key)
            .query(query)
            .send()
            .await?;

        Self::check_status(&resp)?;
        Ok(resp.json().await?)
    }

    async fn insert(&self, table: &str, row: Value) -> Result<(), BackendError> {
        let resp = self
            .http
            .post(self.endpoint(table))
            .header("apikey", &self.write_key)
            .header("Prefer", "return=minimal")
            .bearer_auth(&self.write_key)
            .json(&row)
            .send()
            .await?;

        Self::check_status(&resp)
    }

    async fn upsert(&self, table: &str, row: Value, on_conflict: &str) -> Result<(), BackendError> {
        let resp = self
            .http
            .post(self.endpoint(table))
            .header("apikey", &self.write_key)
            .header("Prefer", "resolution=merge-duplicates,return=minimal")
            .bearer_auth(&self.write_key)
            .query(&[("on_conflict", on_conflict)])
            .json(&row)
            .send()
            .await?;

        Self::check_status(&resp)
    }

    async fn update(
        &self,
        table: &str,
        query: &[Param],
        patch: Value,
    ) -> Result<(), BackendError> {
        let resp = self
            .http
            .patch(self.endpoint(table))
            .header("apikey", &self.write_key)
            .header("Prefer", "return=minimal")
            .bearer_auth(&self.write_key)
            .query(query)
            .json(&patch)
            .send()
            .await?;

        Self::check_status(&resp)
    }

    fn subscribe(&self, channels: &[PushChannel], tx: mpsc::Sender<PushEvent>) -> Subscription {
        let (stop_tx, _) = broadcast::channel(1);

        for &channel in channels {
            let backend = self.clone();
            let tx = tx.clone();
            let stop_rx = stop_tx.subscribe();
            tokio::spawn(watch_channel(backend, channel, tx, stop_rx));
        }

        Subscription::from_stop(stop_tx)
    }
}

/// Watch one channel's table cursor and emit a push event whenever it moves.
async fn watch_channel(
    backend: LiveBackend,
    channel: PushChannel,
    tx: mpsc::Sender<PushEvent>,
    mut stop_rx: broadcast::Receiver<()>,
) {
    let mut interval = tokio::time::interval(PUSH_POLL_INTERVAL);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    let mut last_seen: Option<i64> = None;

    loop {
        tokio::select! {
            _ = stop_rx.recv() => {
                break;
            }
            _ = interval.tick() => {
                let cursor = match latest_row_id(&backend, channel).await {
                    Ok(c) => c,
                    Err(e) => {
                        tracing::debug!("Push watch on {} failed: {e}", channel.table());
                        continue;
                    }
                };

                // The first observation only establishes the baseline.
                if last_seen.is_some() && cursor != last_seen && tx.send(PushEvent { channel }).await.is_err() {
                    break;
                }
                last_seen = cursor;
            }
        }
    }
}

async fn latest_row_id(
    backend: &LiveBackend,
    channel: PushChannel,
) -> Result<Option<i64>, BackendError> {
    let rows = backend
        .rows(
            channel.table(),
            &[
                param("select", "id"),
                param("order", "id.desc"),
                param("limit", "1"),
            ],
        )
        .await?;

    Ok(rows.first().and_then(|row| row.get("id")).and_then(Value::as_i64))
}
