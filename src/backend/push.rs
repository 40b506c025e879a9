//! Push subscription types.
//!
//! Two logical channels exist, one per watched table. Events carry no row
//! payload; subscribers re-fetch on notification.

use tokio::sync::broadcast;

use super::tables;

/// Logical subscription topic, one per watched backend table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushChannel {
    RealtimeReadings,
    Alerts,
}

impl PushChannel {
    /// The backend table this channel reports changes for.
    pub fn table(self) -> &'static str {
        match self {
            PushChannel::RealtimeReadings => tables::REALTIME_READINGS,
            PushChannel::Alerts => tables::ALERTS,
        }
    }
}

/// A row-change notification on one channel.
#[derive(Debug, Clone, Copy)]
pub struct PushEvent {
    pub channel: PushChannel,
}

/// Handle for an open push subscription.
///
/// Dropping the handle releases the subscription; [`Subscription::unsubscribe`]
/// does so explicitly and consumes the handle, so release happens exactly once.
pub struct Subscription {
    stop: Option<broadcast::Sender<()>>,
    on_release: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    /// An inert subscription with nothing to release.
    pub fn noop() -> Self {
        Self {
            stop: None,
            on_release: None,
        }
    }

    /// A subscription whose watcher tasks listen on the given stop channel.
    pub fn from_stop(stop: broadcast::Sender<()>) -> Self {
        Self {
            stop: Some(stop),
            on_release: None,
        }
    }

    /// A subscription that runs `f` when released. Used by test stubs to
    /// observe teardown.
    pub fn on_release(f: impl FnOnce() + Send + 'static) -> Self {
        Self {
            stop: None,
            on_release: Some(Box::new(f)),
        }
    }

    /// Release the subscription.
    pub fn unsubscribe(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        if let Some(f) = self.on_release.take() {
            f();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release();
    }
}
