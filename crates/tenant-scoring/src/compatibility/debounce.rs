use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::sync::watch;
use tracing::debug;

type Job<V> = Box<dyn FnOnce() -> V + Send + 'static>;

/// A key waiting for its timer. Keys missing from the map are idle or computing.
struct PendingSlot<V> {
    job: Job<V>,
    generation: u64,
    joined: usize,
    receiver: watch::Receiver<Option<V>>,
}

#[derive(Debug, thiserror::Error)]
pub enum DebounceError {
    #[error("debounced computation ended without producing a result")]
    Abandoned,
}

/// Coalesces requests sharing a key into one computation.
///
/// The window is a fixed delay measured from the first request for a key; later
/// requests join the pending slot without extending it. A joiner replaces the job
/// unless it carries an older generation than the pending one, so the computation
/// runs against the most recent inputs of the newest generation. Every joined
/// caller observes the same value through one shared channel. Requests arriving
/// after the timer fired open a new window.
pub struct DebounceScheduler<K, V> {
    delay: Duration,
    slots: Arc<Mutex<HashMap<K, PendingSlot<V>>>>,
}

impl<K, V> DebounceScheduler<K, V>
where
    K: Eq + Hash + Clone + Send + 'static,
    V: Clone + Send + Sync + 'static,
{
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            slots: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Number of keys currently waiting for their timer.
    pub fn pending(&self) -> usize {
        self.slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub async fn schedule<F>(&self, key: K, generation: u64, job: F) -> Result<V, DebounceError>
    where
        F: FnOnce() -> V + Send + 'static,
    {
        let mut receiver = {
            let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
            match slots.get_mut(&key) {
                Some(slot) => {
                    if generation >= slot.generation {
                        slot.job = Box::new(job);
                        slot.generation = generation;
                    } else {
                        debug!(
                            pending = slot.generation,
                            generation, "keeping newer pending job"
                        );
                    }
                    slot.joined += 1;
                    slot.receiver.clone()
                }
                None => {
                    let (sender, receiver) = watch::channel(None);
                    slots.insert(
                        key.clone(),
                        PendingSlot {
                            job: Box::new(job),
                            generation,
                            joined: 1,
                            receiver: receiver.clone(),
                        },
                    );
                    self.arm(key, sender);
                    receiver
                }
            }
        };

        let resolved = receiver
            .wait_for(Option::is_some)
            .await
            .map_err(|_| DebounceError::Abandoned)?;
        (*resolved).clone().ok_or(DebounceError::Abandoned)
    }

    fn arm(&self, key: K, sender: watch::Sender<Option<V>>) {
        let slots = Arc::clone(&self.slots);
        let delay = self.delay;

        tokio::spawn(async move {
            tokio::time::sleep(delay).await;

            let slot = slots
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .remove(&key);
            let Some(slot) = slot else {
                return;
            };

            debug!(joined = slot.joined, "running debounced computation");
            let value = (slot.job)();
            sender.send_replace(Some(value));
        });
    }
}
