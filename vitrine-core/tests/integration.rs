//! Integration tests for the Vitrine store contract

use serde_json::json;
use vitrine_core::{AsyncDocumentStore, ChangeEvent, DocumentStore, Fields, MemoryStore, RecordId};

fn fields(name: &str) -> Fields {
    let mut fields = Fields::new();
    fields.insert("name".into(), json!(name));
    fields
}

fn names(event: Option<ChangeEvent>) -> Vec<String> {
    match event {
        Some(ChangeEvent::Snapshot(records)) => records
            .into_iter()
            .map(|r| r.fields["name"].as_str().unwrap().to_string())
            .collect(),
        other => panic!("expected a snapshot, got {other:?}"),
    }
}

#[test]
fn collections_are_independent() {
    let store = MemoryStore::new();
    store.create_record("joias", fields("ring")).unwrap();
    store.create_record("outros", fields("watch")).unwrap();

    assert_eq!(store.list_records("joias").unwrap().len(), 1);
    assert_eq!(store.list_records("outros").unwrap().len(), 1);
    assert!(store.list_records("vazio").unwrap().is_empty());
}

#[test]
fn list_is_ordered_by_id() {
    let store = MemoryStore::new();
    for name in ["a", "b", "c", "d"] {
        store.create_record("joias", fields(name)).unwrap();
    }

    let ids: Vec<RecordId> = store
        .list_records("joias")
        .unwrap()
        .into_iter()
        .map(|r| r.id)
        .collect();
    let mut sorted = ids.clone();
    sorted.sort();
    assert_eq!(ids, sorted);
}

#[tokio::test]
async fn subscription_follows_every_mutation() {
    let store = MemoryStore::new();
    let ring = store.create_record("joias", fields("ring")).unwrap();

    let mut sub = store.async_subscribe("joias").await.unwrap();
    assert_eq!(names(sub.recv().await), vec!["ring"]);

    store.update_record("joias", &ring, fields("band")).unwrap();
    assert_eq!(names(sub.recv().await), vec!["band"]);

    store.delete_record("joias", &ring).unwrap();
    assert!(names(sub.recv().await).is_empty());
}

#[tokio::test]
async fn failed_writes_publish_nothing() {
    let store = MemoryStore::new();
    let mut sub = store.subscribe("joias").unwrap();
    sub.recv().await;

    let missing = RecordId::new("missing");
    assert!(!store.update_record("joias", &missing, fields("x")).unwrap());
    assert!(!store.delete_record("joias", &missing).unwrap());
    store.create_record("joias", fields("ring")).unwrap();

    assert_eq!(names(sub.recv().await), vec!["ring"]);
}

#[tokio::test]
async fn subscribers_on_other_collections_are_not_notified() {
    let store = MemoryStore::new();
    let mut sub = store.subscribe("outros").unwrap();
    sub.recv().await;

    store.create_record("joias", fields("ring")).unwrap();
    store.create_record("outros", fields("watch")).unwrap();

    assert_eq!(names(sub.recv().await), vec!["watch"]);
}
