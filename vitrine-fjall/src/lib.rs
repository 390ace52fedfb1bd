//! Fjall-backed document store for Vitrine.
//!
//! Each collection lives in its own partition; records are stored as JSON
//! bytes keyed by their id, so partition order is id order.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Mutex, PoisonError};

use fjall::{Config, Keyspace, PartitionCreateOptions, PartitionHandle, PersistMode};
use thiserror::Error;
use tracing::{debug, warn};
use vitrine_core::{ChangeEvent, ChangeHub, DocumentStore, Fields, Record, RecordId, Subscription};

#[derive(Debug, Error)]
pub enum FjallError {
    #[error("Fjall error: {0}")]
    Fjall(#[from] fjall::Error),
    #[error("invalid collection name: {0:?}")]
    InvalidCollection(String),
    #[error("corrupt record {key}: {reason}")]
    Corrupt { key: String, reason: String },
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A persistent document store backed by Fjall.
pub struct FjallStore {
    keyspace: Keyspace,
    partitions: Mutex<HashMap<String, PartitionHandle>>,
    // Serialises mutations so snapshots are published in write order.
    writes: Mutex<()>,
    hub: ChangeHub,
}

impl FjallStore {
    /// Opens a Fjall store at the given path.
    ///
    /// Creates the database if it doesn't exist.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, FjallError> {
        let keyspace = Config::new(path).open()?;
        Ok(Self {
            keyspace,
            partitions: Mutex::new(HashMap::new()),
            writes: Mutex::new(()),
            hub: ChangeHub::new(),
        })
    }

    fn partition(&self, collection: &str) -> Result<PartitionHandle, FjallError> {
        let valid = !collection.is_empty()
            && collection
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '.' || c == '#');
        if !valid {
            return Err(FjallError::InvalidCollection(collection.to_string()));
        }

        let mut partitions = self.partitions.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(handle) = partitions.get(collection) {
            return Ok(handle.clone());
        }
        let handle = self
            .keyspace
            .open_partition(collection, PartitionCreateOptions::default())?;
        partitions.insert(collection.to_string(), handle.clone());
        Ok(handle)
    }

    fn decode(key: &[u8], value: &[u8]) -> Result<Record, FjallError> {
        let id = std::str::from_utf8(key).map_err(|e| FjallError::Corrupt {
            key: String::from_utf8_lossy(key).into_owned(),
            reason: e.to_string(),
        })?;
        let fields: Fields = serde_json::from_slice(value).map_err(|e| FjallError::Corrupt {
            key: id.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Record::new(RecordId::new(id), fields))
    }

    /// Reads every record of the partition. Records that fail to decode are
    /// logged and skipped.
    fn scan(partition: &PartitionHandle) -> Result<Vec<Record>, FjallError> {
        let mut records = Vec::new();
        for kv in partition.iter() {
            let (key, value) = kv?;
            match Self::decode(&key, &value) {
                Ok(record) => records.push(record),
                Err(err) => warn!(%err, "skipping corrupt record"),
            }
        }
        Ok(records)
    }

    /// Flushes and publishes after a mutation that has already been applied.
    ///
    /// The write stands whatever happens here: failures are logged and
    /// forwarded to subscribers instead of being reported to the writer.
    fn commit(&self, collection: &str, partition: &PartitionHandle) {
        if let Err(err) = self.keyspace.persist(PersistMode::SyncAll) {
            warn!(collection, %err, "failed to flush journal");
        }
        match Self::scan(partition) {
            Ok(records) => {
                debug!(collection, records = records.len(), "publishing snapshot");
                self.hub.publish(collection, ChangeEvent::Snapshot(records));
            }
            Err(err) => {
                warn!(collection, %err, "failed to read back collection");
                self.hub.publish(collection, ChangeEvent::Failed(err.to_string()));
            }
        }
    }
}

impl DocumentStore for FjallStore {
    type Error = FjallError;

    fn create_record(&self, collection: &str, fields: Fields) -> Result<RecordId, Self::Error> {
        let partition = self.partition(collection)?;
        let bytes = serde_json::to_vec(&fields)?;
        let id = RecordId::generate();

        let _writes = self.writes.lock().unwrap_or_else(PoisonError::into_inner);
        partition.insert(id.as_bytes(), bytes)?;
        self.commit(collection, &partition);
        Ok(id)
    }

    fn get_record(&self, collection: &str, id: &RecordId) -> Result<Option<Record>, Self::Error> {
        let partition = self.partition(collection)?;
        partition
            .get(id.as_bytes())?
            .map(|value| Self::decode(id.as_bytes(), &value))
            .transpose()
    }

    fn update_record(
        &self,
        collection: &str,
        id: &RecordId,
        fields: Fields,
    ) -> Result<bool, Self::Error> {
        let partition = self.partition(collection)?;
        let bytes = serde_json::to_vec(&fields)?;

        let _writes = self.writes.lock().unwrap_or_else(PoisonError::into_inner);
        if !partition.contains_key(id.as_bytes())? {
            return Ok(false);
        }
        partition.insert(id.as_bytes(), bytes)?;
        self.commit(collection, &partition);
        Ok(true)
    }

    fn delete_record(&self, collection: &str, id: &RecordId) -> Result<bool, Self::Error> {
        let partition = self.partition(collection)?;

        let _writes = self.writes.lock().unwrap_or_else(PoisonError::into_inner);
        if !partition.contains_key(id.as_bytes())? {
            return Ok(false);
        }
        partition.remove(id.as_bytes())?;
        self.commit(collection, &partition);
        Ok(true)
    }

    fn list_records(&self, collection: &str) -> Result<Vec<Record>, Self::Error> {
        let partition = self.partition(collection)?;
        Self::scan(&partition)
    }

    fn subscribe(&self, collection: &str) -> Result<Subscription, Self::Error> {
        let partition = self.partition(collection)?;
        let _writes = self.writes.lock().unwrap_or_else(PoisonError::into_inner);
        let current = Self::scan(&partition)?;
        Ok(self.hub.subscribe(collection, current))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn temp_store() -> (FjallStore, TempDir) {
        let dir = TempDir::new().unwrap();
        let store = FjallStore::open(dir.path()).unwrap();
        (store, dir)
    }

    fn fields(name: &str) -> Fields {
        let mut fields = Fields::new();
        fields.insert("name".into(), json!(name));
        fields
    }

    #[test]
    fn create_get() {
        let (store, _dir) = temp_store();
        let id = store.create_record("joias", fields("ring")).unwrap();

        let record = store.get_record("joias", &id).unwrap().unwrap();
        assert_eq!(record.fields, fields("ring"));
    }

    #[test]
    fn get_missing() {
        let (store, _dir) = temp_store();
        let retrieved = store.get_record("joias", &RecordId::new("nope")).unwrap();
        assert_eq!(retrieved, None);
    }

    #[test]
    fn update_and_delete_report_missing_ids() {
        let (store, _dir) = temp_store();
        let missing = RecordId::new("nope");

        assert!(!store.update_record("joias", &missing, fields("x")).unwrap());
        assert!(!store.delete_record("joias", &missing).unwrap());
    }

    #[test]
    fn update_replaces_record() {
        let (store, _dir) = temp_store();
        let id = store.create_record("joias", fields("ring")).unwrap();

        assert!(store.update_record("joias", &id, fields("band")).unwrap());
        let record = store.get_record("joias", &id).unwrap().unwrap();
        assert_eq!(record.fields, fields("band"));
    }

    #[test]
    fn delete_removes_record() {
        let (store, _dir) = temp_store();
        let id = store.create_record("joias", fields("ring")).unwrap();

        assert!(store.delete_record("joias", &id).unwrap());
        assert!(store.list_records("joias").unwrap().is_empty());
    }

    #[test]
    fn rejects_bad_collection_names() {
        let (store, _dir) = temp_store();
        assert!(matches!(
            store.list_records("no spaces"),
            Err(FjallError::InvalidCollection(_))
        ));
        assert!(matches!(
            store.list_records(""),
            Err(FjallError::InvalidCollection(_))
        ));
    }

    #[test]
    fn persistence() {
        let dir = TempDir::new().unwrap();

        let id = {
            let store = FjallStore::open(dir.path()).unwrap();
            store.create_record("joias", fields("survivor")).unwrap()
        };

        {
            let store = FjallStore::open(dir.path()).unwrap();
            let records = store.list_records("joias").unwrap();
            assert_eq!(records.len(), 1);
            assert_eq!(records[0].id, id);
            assert_eq!(records[0].fields, fields("survivor"));
        }
    }

    #[tokio::test]
    async fn corrupt_record_does_not_fail_writes() {
        let (store, _dir) = temp_store();
        store
            .partition("joias")
            .unwrap()
            .insert("corrupt", b"not json".as_slice())
            .unwrap();
        let mut sub = store.subscribe("joias").unwrap();
        assert_eq!(sub.recv().await, Some(ChangeEvent::Snapshot(Vec::new())));

        let id = store.create_record("joias", fields("ring")).unwrap();

        let records = store.list_records("joias").unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, id);
        match sub.recv().await {
            Some(ChangeEvent::Snapshot(records)) => {
                assert_eq!(records.len(), 1);
                assert_eq!(records[0].id, id);
            }
            other => panic!("unexpected event: {:?}", other),
        }

        assert!(store.delete_record("joias", &id).unwrap());
        assert!(store.list_records("joias").unwrap().is_empty());
    }

    #[tokio::test]
    async fn subscribers_receive_full_snapshots() {
        let (store, _dir) = temp_store();
        let first = store.create_record("joias", fields("a")).unwrap();

        let mut sub = store.subscribe("joias").unwrap();
        match sub.recv().await {
            Some(ChangeEvent::Snapshot(records)) => assert_eq!(records.len(), 1),
            other => panic!("unexpected event: {:?}", other),
        }

        store.delete_record("joias", &first).unwrap();
        assert_eq!(sub.recv().await, Some(ChangeEvent::Snapshot(Vec::new())));
    }
}
