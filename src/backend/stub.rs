//! Scriptable backend stub for tests.

use super::{BackendApi, BackendError, Param, PushChannel, PushEvent, Subscription};

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::{mpsc, Semaphore};

/// In-memory [`BackendApi`] that reports itself as configured, serves canned
/// rows per table, and records every call.
#[derive(Default)]
pub struct StubBackend {
    rows_by_table: Mutex<HashMap<String, Vec<Value>>>,
    fail_reads: bool,
    read_calls: AtomicUsize,
    gate: Option<Arc<Semaphore>>,
    unsubscribes: Arc<AtomicUsize>,
    inserts: Mutex<Vec<(String, Value)>>,
    upserts: Mutex<Vec<(String, Value, String)>>,
    updates: Mutex<Vec<(String, Value)>>,
    push_tx: Mutex<Option<mpsc::Sender<PushEvent>>>,
}

impl StubBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// A stub whose every read fails with a server error.
    pub fn failing() -> Self {
        Self {
            fail_reads: true,
            ..Self::default()
        }
    }

    /// Serve the given rows for a table.
    pub fn with_rows(self, table: &str, rows: Vec<Value>) -> Self {
        self.rows_by_table
            .lock()
            .unwrap()
            .insert(table.to_string(), rows);
        self
    }

    /// Block every read on the semaphore until the test releases or closes it.
    pub fn gated(mut self, gate: Arc<Semaphore>) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn read_count(&self) -> usize {
        self.read_calls.load(Ordering::SeqCst)
    }

    pub fn unsubscribe_counter(&self) -> Arc<AtomicUsize> {
        self.unsubscribes.clone()
    }

    pub fn inserts(&self) -> Vec<(String, Value)> {
        self.inserts.lock().unwrap().clone()
    }

    pub fn upserts(&self) -> Vec<(String, Value, String)> {
        self.upserts.lock().unwrap().clone()
    }

    pub fn updates(&self) -> Vec<(String, Value)> {
        self.updates.lock().unwrap().clone()
    }

    /// Emit a push event to the most recent subscriber.
    pub async fn emit_push(&self, channel: PushChannel) {
        let tx = self.push_tx.lock().unwrap().clone();
        if let Some(tx) = tx {
            let _ = tx.send(PushEvent { channel }).await;
        }
    }
}

#[async_trait]
impl BackendApi for StubBackend {
    fn is_configured(&self) -> bool {
        true
    }

    async fn rows(&self, table: &str, _query: &[Param]) -> Result<Vec<Value>, BackendError> {
        self.read_calls.fetch_add(1, Ordering::SeqCst);

        if let Some(gate) = &self.gate {
            // A closed semaphore unblocks all pending reads at once.
            let _ = gate.acquire().await;
        }

        if self.fail_reads {
            return Err(BackendError::Status(500));
        }

        Ok(self
            .rows_by_table
            .lock()
            .unwrap()
            .get(table)
            .cloned()
            .unwrap_or_default())
    }

    async fn insert(&self, table: &str, row: Value) -> Result<(), BackendError> {
        self.inserts.lock().unwrap().push((table.to_string(), row));
        Ok(())
    }

    async fn upsert(&self, table: &str, row: Value, on_conflict: &str) -> Result<(), BackendError> {
        self.upserts
            .lock()
            .unwrap()
            .push((table.to_string(), row, on_conflict.to_string()));
        Ok(())
    }

    async fn update(&self, table: &str, _query: &[Param], patch: Value) -> Result<(), BackendError> {
        self.updates.lock().unwrap().push((table.to_string(), patch));
        Ok(())
    }

    fn subscribe(&self, _channels: &[PushChannel], tx: mpsc::Sender<PushEvent>) -> Subscription {
        *self.push_tx.lock().unwrap() = Some(tx);
        let counter = self.unsubscribes.clone();
        Subscription::on_release(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        })
    }
}
