//! In-memory publish/subscribe registry for progress events.

use crate::core::status::{ProcessingStage, ProcessingStatus};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use tracing::warn;

/// Handle identifying a registered subscriber.
///
/// Returned by [`StatusBroadcaster::subscribe`] and passed back to
/// [`StatusBroadcaster::unsubscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Trait for observers of task progress.
pub trait StatusSubscriber: Send + Sync {
    /// Called synchronously for every emitted status event.
    fn on_status(&self, status: &ProcessingStatus);
}

impl<F> StatusSubscriber for F
where
    F: Fn(&ProcessingStatus) + Send + Sync,
{
    fn on_status(&self, status: &ProcessingStatus) {
        self(status);
    }
}

/// Decouples status production from consumption.
///
/// Subscribers are invoked synchronously in registration order. A
/// subscriber that panics is caught and logged; delivery continues to
/// the remaining subscribers and never fails the emitting task. Events
/// are not persisted: if nobody is subscribed when an event is emitted,
/// it is lost.
#[derive(Default)]
pub struct StatusBroadcaster {
    subscribers: RwLock<Vec<(SubscriptionId, Arc<dyn StatusSubscriber>)>>,
    next_id: RwLock<u64>,
}

impl StatusBroadcaster {
    /// Creates an empty broadcaster.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a subscriber and returns its handle.
    pub fn subscribe(&self, subscriber: Arc<dyn StatusSubscriber>) -> SubscriptionId {
        let mut next = self.next_id.write();
        let id = SubscriptionId(*next);
        *next += 1;
        self.subscribers.write().push((id, subscriber));
        id
    }

    /// Registers a closure as a subscriber.
    pub fn subscribe_fn<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&ProcessingStatus) + Send + Sync + 'static,
    {
        self.subscribe(Arc::new(callback))
    }

    /// Removes a subscriber. Unknown handles are a no-op.
    pub fn unsubscribe(&self, id: SubscriptionId) {
        self.subscribers.write().retain(|(sid, _)| *sid != id);
    }

    /// Returns the number of registered subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.read().len()
    }

    /// Constructs a status event and delivers it to every subscriber.
    ///
    /// Returns the emitted event so callers can retain it themselves.
    pub fn emit(
        &self,
        stage: ProcessingStage,
        message: impl Into<String>,
        progress: f64,
        details: Option<HashMap<String, serde_json::Value>>,
    ) -> ProcessingStatus {
        let mut status = ProcessingStatus::new(stage, message, progress);
        if let Some(details) = details {
            status = status.with_details(details);
        }
        self.deliver(&status);
        status
    }

    /// Delivers an already-built status event to every subscriber.
    pub fn deliver(&self, status: &ProcessingStatus) {
        let subscribers = self.subscribers.read().clone();
        for (id, subscriber) in subscribers {
            let outcome = catch_unwind(AssertUnwindSafe(|| subscriber.on_status(status)));
            if outcome.is_err() {
                warn!(
                    subscription_id = id.0,
                    stage = %status.stage,
                    "status subscriber panicked; continuing delivery"
                );
            }
        }
    }
}

impl std::fmt::Debug for StatusBroadcaster {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StatusBroadcaster")
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}

/// A subscriber that accumulates every event it receives.
///
/// Used by the executor to build per-task status history and by tests
/// as a list-collecting stub.
#[derive(Debug, Default)]
pub struct CollectingSubscriber {
    events: parking_lot::Mutex<Vec<ProcessingStatus>>,
}

impl CollectingSubscriber {
    /// Creates an empty collector.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of all collected events.
    #[must_use]
    pub fn events(&self) -> Vec<ProcessingStatus> {
        self.events.lock().clone()
    }

    /// Returns the number of collected events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    /// Returns true if nothing has been collected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }

    /// Drains the collected events, leaving the collector empty.
    #[must_use]
    pub fn take(&self) -> Vec<ProcessingStatus> {
        std::mem::take(&mut self.events.lock())
    }
}

impl StatusSubscriber for CollectingSubscriber {
    fn on_status(&self, status: &ProcessingStatus) {
        self.events.lock().push(status.clone());
    }
}
