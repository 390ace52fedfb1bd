use std::future::Future;

use crate::{DocumentStore, Fields, Record, RecordId, Subscription};

/// Async document store.
///
/// Mirrors the `DocumentStore` trait but with async methods, enabling
/// network-backed implementations. Methods are prefixed with `async_` to
/// avoid name collisions when a type implements both traits.
///
/// Once started, a call runs to completion; dropping the future only means
/// the caller stops waiting for the outcome.
pub trait AsyncDocumentStore: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    fn async_create(
        &self,
        collection: &str,
        fields: Fields,
    ) -> impl Future<Output = Result<RecordId, Self::Error>> + Send;

    fn async_get(
        &self,
        collection: &str,
        id: &RecordId,
    ) -> impl Future<Output = Result<Option<Record>, Self::Error>> + Send;

    fn async_update(
        &self,
        collection: &str,
        id: &RecordId,
        fields: Fields,
    ) -> impl Future<Output = Result<bool, Self::Error>> + Send;

    fn async_delete(
        &self,
        collection: &str,
        id: &RecordId,
    ) -> impl Future<Output = Result<bool, Self::Error>> + Send;

    fn async_list(
        &self,
        collection: &str,
    ) -> impl Future<Output = Result<Vec<Record>, Self::Error>> + Send;

    fn async_subscribe(
        &self,
        collection: &str,
    ) -> impl Future<Output = Result<Subscription, Self::Error>> + Send;
}

/// Blanket impl: any sync `DocumentStore` is also an `AsyncDocumentStore`.
impl<S: DocumentStore + Send + Sync> AsyncDocumentStore for S {
    type Error = S::Error;

    async fn async_create(&self, collection: &str, fields: Fields) -> Result<RecordId, Self::Error> {
        self.create_record(collection, fields)
    }

    async fn async_get(
        &self,
        collection: &str,
        id: &RecordId,
    ) -> Result<Option<Record>, Self::Error> {
        self.get_record(collection, id)
    }

    async fn async_update(
        &self,
        collection: &str,
        id: &RecordId,
        fields: Fields,
    ) -> Result<bool, Self::Error> {
        self.update_record(collection, id, fields)
    }

    async fn async_delete(&self, collection: &str, id: &RecordId) -> Result<bool, Self::Error> {
        self.delete_record(collection, id)
    }

    async fn async_list(&self, collection: &str) -> Result<Vec<Record>, Self::Error> {
        self.list_records(collection)
    }

    async fn async_subscribe(&self, collection: &str) -> Result<Subscription, Self::Error> {
        self.subscribe(collection)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryStore;
    use serde_json::json;

    #[tokio::test]
    async fn store_as_async_store_basic() {
        let store = MemoryStore::new();
        let mut fields = Fields::new();
        fields.insert("name".into(), json!("ring"));

        let id = store.async_create("items", fields.clone()).await.unwrap();
        let retrieved = store.async_get("items", &id).await.unwrap();
        assert_eq!(retrieved, Some(Record::new(id.clone(), fields)));

        assert!(store.async_delete("items", &id).await.unwrap());
        assert!(store.async_list("items").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn async_subscribe_sees_writes() {
        let store = MemoryStore::new();
        let mut sub = store.async_subscribe("items").await.unwrap();
        assert_eq!(sub.recv().await, Some(crate::ChangeEvent::Snapshot(Vec::new())));

        let id = store.async_create("items", Fields::new()).await.unwrap();
        match sub.recv().await {
            Some(crate::ChangeEvent::Snapshot(records)) => {
                assert_eq!(records.len(), 1);
                assert_eq!(records[0].id, id);
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }
}
