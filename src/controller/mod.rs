//! Realtime orchestration controller.
//!
//! Owns the acquisition lifecycle: a recurring refresh timer that runs
//! non-overlapping fetch cycles, a push subscription that triggers
//! out-of-band refetches, and (in configured mode) a second timer driving the
//! ingestion writer. `start()`/`stop()` make the lifecycle explicit so it can
//! be exercised without any UI attached.

use crate::backend::{BackendApi, PushChannel, PushEvent, Subscription};
use crate::data::{self, DashboardData};

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;
use tokio::sync::{broadcast, mpsc};

/// Delay before the very first fetch when no backend is configured, so the
/// loading placeholder does not flash straight to data.
const FIRST_FETCH_DELAY: Duration = Duration::from_millis(500);

/// Interval of the write-side ingestion timer.
const INGEST_INTERVAL: Duration = Duration::from_secs(10);

/// How many alerts one fetch cycle requests.
const ALERT_LIMIT: usize = 10;

/// The polling/subscription controller behind the dashboard.
pub struct RealtimeController {
    backend: Arc<dyn BackendApi>,
    refresh_interval: Duration,
    shared: Arc<Shared>,
    stop: Mutex<Option<broadcast::Sender<()>>>,
    subscription: Mutex<Option<Subscription>>,
}

struct Shared {
    data: RwLock<DashboardData>,
    /// The single fetch-in-progress gate. A refresh tick or push event that
    /// finds it set skips its cycle instead of piling up.
    fetch_in_progress: AtomicBool,
}

impl RealtimeController {
    pub fn new(backend: Arc<dyn BackendApi>, refresh_interval: Duration) -> Self {
        Self {
            backend,
            refresh_interval,
            shared: Arc::new(Shared {
                data: RwLock::new(DashboardData::default()),
                fetch_in_progress: AtomicBool::new(false),
            }),
            stop: Mutex::new(None),
            subscription: Mutex::new(None),
        }
    }

    /// Start the refresh loop and, when a backend is configured, the push
    /// subscription and the ingestion timer. Idempotent while running.
    pub fn start(&self) {
        let mut stop_guard = self.stop.lock().unwrap();
        if stop_guard.is_some() {
            return;
        }
        let (stop_tx, _) = broadcast::channel(1);
        *stop_guard = Some(stop_tx.clone());
        drop(stop_guard);

        let configured = self.backend.is_configured();
        tracing::info!(
            "Starting realtime controller ({} mode, refresh every {:?})",
            if configured { "live" } else { "demo" },
            self.refresh_interval,
        );

        tokio::spawn(run_refresh_loop(
            self.backend.clone(),
            self.shared.clone(),
            self.refresh_interval,
            configured,
            stop_tx.subscribe(),
        ));

        if configured {
            let (tx, rx) = mpsc::channel(16);
            let subscription = self
                .backend
                .subscribe(&[PushChannel::RealtimeReadings, PushChannel::Alerts], tx);
            *self.subscription.lock().unwrap() = Some(subscription);

            tokio::spawn(run_push_listener(
                self.backend.clone(),
                self.shared.clone(),
                rx,
                stop_tx.subscribe(),
            ));

            tokio::spawn(run_ingest_loop(self.backend.clone(), stop_tx.subscribe()));
        }
    }

    /// Stop both timers and release the push subscription. All three go
    /// together; anything left running after this is a resource leak.
    pub fn stop(&self) {
        if let Some(stop_tx) = self.stop.lock().unwrap().take() {
            let _ = stop_tx.send(());
        }
        if let Some(subscription) = self.subscription.lock().unwrap().take() {
            subscription.unsubscribe();
        }
    }

    /// Current dashboard snapshot.
    pub fn snapshot(&self) -> DashboardData {
        self.shared.data.read().unwrap().clone()
    }
}

async fn run_refresh_loop(
    backend: Arc<dyn BackendApi>,
    shared: Arc<Shared>,
    refresh_interval: Duration,
    configured: bool,
    mut stop_rx: broadcast::Receiver<()>,
) {
    if !configured {
        tokio::select! {
            _ = stop_rx.recv() => return,
            _ = tokio::time::sleep(FIRST_FETCH_DELAY) => {}
        }
    }

    // First tick fires immediately and doubles as the initial fetch.
    let mut interval = tokio::time::interval(refresh_interval);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = stop_rx.recv() => {
                break;
            }
            _ = interval.tick() => {
                tokio::spawn(run_cycle(backend.clone(), shared.clone()));
            }
        }
    }
}

async fn run_push_listener(
    backend: Arc<dyn BackendApi>,
    shared: Arc<Shared>,
    mut rx: mpsc::Receiver<PushEvent>,
    mut stop_rx: broadcast::Receiver<()>,
) {
    loop {
        tokio::select! {
            _ = stop_rx.recv() => {
                break;
            }
            event = rx.recv() => {
                match event {
                    Some(event) => {
                        tracing::debug!("Push event on {}, refetching", event.channel.table());
                        tokio::spawn(run_cycle(backend.clone(), shared.clone()));
                    }
                    None => break,
                }
            }
        }
    }
}

async fn run_ingest_loop(backend: Arc<dyn BackendApi>, mut stop_rx: broadcast::Receiver<()>) {
    let mut interval = tokio::time::interval(INGEST_INTERVAL);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    // Skip the immediate first tick; ingestion has no catching up to do.
    interval.tick().await;

    loop {
        tokio::select! {
            _ = stop_rx.recv() => {
                break;
            }
            _ = interval.tick() => {
                if let Err(e) = data::seed_backend_data(backend.as_ref()).await {
                    tracing::error!("Ingestion round failed: {e}");
                }
            }
        }
    }
}

/// Run one fetch cycle unless another is already in flight.
async fn run_cycle(backend: Arc<dyn BackendApi>, shared: Arc<Shared>) {
    if shared.fetch_in_progress.swap(true, Ordering::SeqCst) {
        tracing::debug!("Skipping fetch cycle, previous cycle still in flight");
        return;
    }

    let result = fetch_all(backend).await;

    {
        let mut data = shared.data.write().unwrap();
        match result {
            Ok(snapshot) => *data = snapshot,
            Err(message) => {
                tracing::error!("Fetch orchestration failed: {message}");
                data.loading = false;
                data.error = Some(message);
            }
        }
    }

    shared.fetch_in_progress.store(false, Ordering::SeqCst);
}

/// Issue all five entity fetches concurrently and join them. The snapshot is
/// assembled only once every fetch has settled; the individual fetches cannot
/// fail, so the error path here covers orchestration itself (a lost task).
async fn fetch_all(backend: Arc<dyn BackendApi>) -> Result<DashboardData, String> {
    let b = backend.clone();
    let realtime = tokio::spawn(async move { data::realtime_power(b.as_ref(), None).await });
    let b = backend.clone();
    let summary = tokio::spawn(async move { data::today_summary(b.as_ref(), None).await });
    let b = backend.clone();
    let inverters = tokio::spawn(async move { data::inverters_status(b.as_ref(), None).await });
    let b = backend.clone();
    let alerts = tokio::spawn(async move { data::active_alerts(b.as_ref(), ALERT_LIMIT).await });
    let b = backend.clone();
    let trend = tokio::spawn(async move { data::trend_24h(b.as_ref(), None).await });

    let (realtime, summary, inverters, alerts, trend) =
        tokio::join!(realtime, summary, inverters, alerts, trend);

    let realtime = realtime.map_err(|e| format!("realtime fetch task failed: {e}"))?;
    let summary = summary.map_err(|e| format!("summary fetch task failed: {e}"))?;
    let inverters = inverters.map_err(|e| format!("inverter fetch task failed: {e}"))?;
    let alerts = alerts.map_err(|e| format!("alert fetch task failed: {e}"))?;
    let trend = trend.map_err(|e| format!("trend fetch task failed: {e}"))?;

    Ok(DashboardData {
        realtime: realtime.value,
        summary: summary.value,
        inverters: inverters.value,
        alerts: alerts.value,
        trend: trend.value,
        loading: false,
        error: None,
    })
}
