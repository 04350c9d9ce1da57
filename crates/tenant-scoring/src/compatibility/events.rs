use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, Weak};

use serde::Serialize;
use tracing::warn;

use super::calculator::ScoreResult;
use super::domain::{ApplicationId, OwnerId, PropertyId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum EventType {
    PreferencesUpdated,
    ScoreCalculated,
    ScoresInvalidated,
}

impl EventType {
    pub const fn as_str(self) -> &'static str {
        match self {
            EventType::PreferencesUpdated => "preferences-updated",
            EventType::ScoreCalculated => "score-calculated",
            EventType::ScoresInvalidated => "scores-invalidated",
        }
    }
}

/// Notifications broadcast by the scoring engine.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ScoringEvent {
    PreferencesUpdated {
        owner_id: OwnerId,
        version: u64,
    },
    ScoreCalculated {
        owner_id: OwnerId,
        application_id: ApplicationId,
        property_id: PropertyId,
        result: ScoreResult,
    },
    ScoresInvalidated {
        owner_id: OwnerId,
        evicted: usize,
    },
}

impl ScoringEvent {
    pub fn event_type(&self) -> EventType {
        match self {
            ScoringEvent::PreferencesUpdated { .. } => EventType::PreferencesUpdated,
            ScoringEvent::ScoreCalculated { .. } => EventType::ScoreCalculated,
            ScoringEvent::ScoresInvalidated { .. } => EventType::ScoresInvalidated,
        }
    }
}

type Callback = Arc<dyn Fn(&ScoringEvent) + Send + Sync>;

struct Listener {
    id: u64,
    event_type: EventType,
    callback: Callback,
}

#[derive(Default)]
struct Registry {
    next_id: AtomicU64,
    listeners: Mutex<Vec<Listener>>,
}

/// Synchronous in-process publish/subscribe registry keyed by event type.
#[derive(Clone, Default)]
pub struct EventBus {
    registry: Arc<Registry>,
}

/// Handle returned by [`EventBus::subscribe`]. Dropping it keeps the listener registered.
#[must_use = "call `unsubscribe` to stop receiving events"]
pub struct Subscription {
    id: u64,
    registry: Weak<Registry>,
}

impl Subscription {
    pub fn unsubscribe(self) {
        if let Some(registry) = self.registry.upgrade() {
            registry
                .listeners
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .retain(|listener| listener.id != self.id);
        }
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<F>(&self, event_type: EventType, callback: F) -> Subscription
    where
        F: Fn(&ScoringEvent) + Send + Sync + 'static,
    {
        let id = self.registry.next_id.fetch_add(1, Ordering::Relaxed);
        self.registry
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Listener {
                id,
                event_type,
                callback: Arc::new(callback),
            });

        Subscription {
            id,
            registry: Arc::downgrade(&self.registry),
        }
    }

    pub fn listener_count(&self, event_type: EventType) -> usize {
        self.registry
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|listener| listener.event_type == event_type)
            .count()
    }

    /// Deliver an event to its subscribers in registration order.
    ///
    /// Callbacks run outside the registry lock; a panicking callback is logged and skipped.
    /// Returns the number of callbacks that completed.
    pub fn emit(&self, event: &ScoringEvent) -> usize {
        let event_type = event.event_type();
        let callbacks: Vec<(u64, Callback)> = self
            .registry
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|listener| listener.event_type == event_type)
            .map(|listener| (listener.id, Arc::clone(&listener.callback)))
            .collect();

        let mut delivered = 0;
        for (subscription, callback) in callbacks {
            match catch_unwind(AssertUnwindSafe(|| callback(event))) {
                Ok(()) => delivered += 1,
                Err(_) => warn!(
                    event = event_type.as_str(),
                    subscription, "event subscriber panicked; continuing delivery"
                ),
            }
        }
        delivered
    }
}
