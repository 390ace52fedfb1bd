use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{PoisonError, RwLock};

use thiserror::Error;

use crate::{ChangeEvent, ChangeHub, Fields, Record, RecordId, Subscription};

/// A document store organised in named collections.
///
/// Stores know nothing about what the fields mean; typing and validation
/// belong to higher layers. Updates replace the whole field map, there is no
/// merge-by-field at this level.
///
/// All methods take `&self` to support stores with internal locking.
pub trait DocumentStore {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Stores a new record and returns the id assigned to it.
    fn create_record(&self, collection: &str, fields: Fields) -> Result<RecordId, Self::Error>;

    /// Retrieves a record, or None if the id is unknown.
    fn get_record(&self, collection: &str, id: &RecordId) -> Result<Option<Record>, Self::Error>;

    /// Replaces the fields of an existing record. Returns false if the id is unknown.
    fn update_record(
        &self,
        collection: &str,
        id: &RecordId,
        fields: Fields,
    ) -> Result<bool, Self::Error>;

    /// Removes a record. Returns false if the id is unknown.
    fn delete_record(&self, collection: &str, id: &RecordId) -> Result<bool, Self::Error>;

    /// Lists every record of the collection, ordered by id.
    fn list_records(&self, collection: &str) -> Result<Vec<Record>, Self::Error>;

    /// Subscribes to the collection's change stream.
    ///
    /// The subscription first yields the collection as it is now, then a
    /// full snapshot after every later mutation.
    fn subscribe(&self, collection: &str) -> Result<Subscription, Self::Error>;
}

#[derive(Debug, Error)]
pub enum MemoryError {
    #[error("store is offline")]
    Offline,
}

type Collections = HashMap<String, BTreeMap<RecordId, Fields>>;

/// An in-memory store backed by a HashMap of ordered collections.
///
/// Useful for testing and as a reference implementation. It can be switched
/// offline to exercise the unavailable-backend paths of its callers.
#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: RwLock<Collections>,
    hub: ChangeHub,
    offline: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// When offline, every operation fails with [`MemoryError::Offline`].
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Pushes a failure notification to the subscribers of `collection`,
    /// as a backend would on a permission error.
    pub fn fail_subscribers(&self, collection: &str, reason: impl Into<String>) {
        let _guard = self.collections.write().unwrap_or_else(PoisonError::into_inner);
        self.hub.publish(collection, ChangeEvent::Failed(reason.into()));
    }

    /// Number of live subscriptions on `collection`.
    pub fn subscriber_count(&self, collection: &str) -> usize {
        self.hub.subscriber_count(collection)
    }

    fn check_online(&self) -> Result<(), MemoryError> {
        if self.offline.load(Ordering::SeqCst) {
            Err(MemoryError::Offline)
        } else {
            Ok(())
        }
    }

    fn snapshot(collections: &Collections, collection: &str) -> Vec<Record> {
        collections
            .get(collection)
            .map(|records| {
                records
                    .iter()
                    .map(|(id, fields)| Record::new(id.clone(), fields.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }

    fn publish(&self, collections: &Collections, collection: &str) {
        self.hub.publish(
            collection,
            ChangeEvent::Snapshot(Self::snapshot(collections, collection)),
        );
    }
}

impl DocumentStore for MemoryStore {
    type Error = MemoryError;

    fn create_record(&self, collection: &str, fields: Fields) -> Result<RecordId, Self::Error> {
        self.check_online()?;
        let mut collections = self.collections.write().unwrap_or_else(PoisonError::into_inner);
        let id = RecordId::generate();
        collections
            .entry(collection.to_string())
            .or_default()
            .insert(id.clone(), fields);
        self.publish(&collections, collection);
        Ok(id)
    }

    fn get_record(&self, collection: &str, id: &RecordId) -> Result<Option<Record>, Self::Error> {
        self.check_online()?;
        let collections = self.collections.read().unwrap_or_else(PoisonError::into_inner);
        Ok(collections
            .get(collection)
            .and_then(|records| records.get(id))
            .map(|fields| Record::new(id.clone(), fields.clone())))
    }

    fn update_record(
        &self,
        collection: &str,
        id: &RecordId,
        fields: Fields,
    ) -> Result<bool, Self::Error> {
        self.check_online()?;
        let mut collections = self.collections.write().unwrap_or_else(PoisonError::into_inner);
        let Some(slot) = collections
            .get_mut(collection)
            .and_then(|records| records.get_mut(id))
        else {
            return Ok(false);
        };
        *slot = fields;
        self.publish(&collections, collection);
        Ok(true)
    }

    fn delete_record(&self, collection: &str, id: &RecordId) -> Result<bool, Self::Error> {
        self.check_online()?;
        let mut collections = self.collections.write().unwrap_or_else(PoisonError::into_inner);
        let removed = collections
            .get_mut(collection)
            .and_then(|records| records.remove(id))
            .is_some();
        if removed {
            self.publish(&collections, collection);
        }
        Ok(removed)
    }

    fn list_records(&self, collection: &str) -> Result<Vec<Record>, Self::Error> {
        self.check_online()?;
        let collections = self.collections.read().unwrap_or_else(PoisonError::into_inner);
        Ok(Self::snapshot(&collections, collection))
    }

    fn subscribe(&self, collection: &str) -> Result<Subscription, Self::Error> {
        self.check_online()?;
        // Holding the lock keeps writers from publishing between the
        // snapshot and the registration.
        let collections = self.collections.read().unwrap_or_else(PoisonError::into_inner);
        Ok(self
            .hub
            .subscribe(collection, Self::snapshot(&collections, collection)))
    }
}
