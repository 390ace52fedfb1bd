use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use tokio::sync::broadcast::{self, error::RecvError};
use tracing::warn;

use crate::Record;

const DEFAULT_CAPACITY: usize = 16;

/// A change notification for one collection.
#[derive(Debug, Clone, PartialEq)]
pub enum ChangeEvent {
    /// The complete current content of the collection.
    Snapshot(Vec<Record>),
    /// The store could not deliver the collection (permissions, backend down).
    Failed(String),
}

/// Fans change events out to every subscriber of a collection.
///
/// Stores own one hub and publish after each successful mutation while still
/// holding their write lock, so events leave the hub in mutation order.
#[derive(Debug)]
pub struct ChangeHub {
    channels: Mutex<HashMap<String, broadcast::Sender<ChangeEvent>>>,
    capacity: usize,
}

impl Default for ChangeHub {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }
}

impl ChangeHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a hub whose per-collection queues hold `capacity` events
    /// before slow subscribers start skipping ahead.
    pub fn with_capacity(capacity: usize) -> Self {
        ChangeHub {
            channels: Mutex::new(HashMap::new()),
            capacity: capacity.max(1),
        }
    }

    /// Sends an event to all current subscribers of `collection`.
    ///
    /// Publishing to a collection nobody watches is a no-op.
    pub fn publish(&self, collection: &str, event: ChangeEvent) {
        let channels = self.channels.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(sender) = channels.get(collection) {
            // An error only means there are no receivers right now.
            let _ = sender.send(event);
        }
    }

    /// Registers a subscriber. `current` is delivered first, before any
    /// event published after this call.
    pub fn subscribe(&self, collection: &str, current: Vec<Record>) -> Subscription {
        let mut channels = self.channels.lock().unwrap_or_else(PoisonError::into_inner);
        let receiver = channels
            .entry(collection.to_string())
            .or_insert_with(|| broadcast::channel(self.capacity).0)
            .subscribe();

        Subscription {
            collection: collection.to_string(),
            initial: Some(current),
            receiver: Some(receiver),
        }
    }

    /// Number of live subscriptions on `collection`.
    pub fn subscriber_count(&self, collection: &str) -> usize {
        let channels = self.channels.lock().unwrap_or_else(PoisonError::into_inner);
        channels
            .get(collection)
            .map_or(0, broadcast::Sender::receiver_count)
    }
}

/// Handle on a collection's change stream.
///
/// The subscription is released by [`Subscription::close`] or by dropping
/// the handle, whichever comes first.
#[derive(Debug)]
pub struct Subscription {
    collection: String,
    initial: Option<Vec<Record>>,
    receiver: Option<broadcast::Receiver<ChangeEvent>>,
}

impl Subscription {
    pub fn collection(&self) -> &str {
        &self.collection
    }

    pub fn is_open(&self) -> bool {
        self.receiver.is_some()
    }

    /// Waits for the next event.
    ///
    /// Returns `None` once the subscription is closed or the store is gone.
    /// When this subscriber falls behind, stale events are skipped: every
    /// snapshot is the full collection, so only the newest ones matter.
    pub async fn recv(&mut self) -> Option<ChangeEvent> {
        if let Some(records) = self.initial.take() {
            return Some(ChangeEvent::Snapshot(records));
        }

        let receiver = self.receiver.as_mut()?;
        loop {
            match receiver.recv().await {
                Ok(event) => return Some(event),
                Err(RecvError::Lagged(skipped)) => {
                    warn!(collection = %self.collection, skipped, "subscriber lagged, skipping stale snapshots");
                }
                Err(RecvError::Closed) => {
                    self.receiver = None;
                    return None;
                }
            }
        }
    }

    /// Releases the subscription. Further `recv` calls return `None`.
    pub fn close(&mut self) {
        self.initial = None;
        self.receiver = None;
    }
}
