use std::collections::HashSet;

use bson::{Bson, doc};
use docstore::{memory::InMemoryStore, prelude::*};
use serde_json::json;

fn store() -> DocumentStore<InMemoryStore> {
    DocumentStore::new(InMemoryStore::new())
}

#[tokio::test]
async fn create_update_get_scenario() {
    let store = store();

    let id = store.create_document("users", doc! { "name": "A" }).await.unwrap();
    assert!(store.update_document("users", &id, doc! { "name": "B" }).await.unwrap());

    let users = store.get_documents("users", doc! {}).await.unwrap();

    assert_eq!(users.len(), 1);
    assert_eq!(users[0].id, id);
    assert_eq!(users[0].data, doc! { "name": "B" });

    let flattened = users[0].to_flattened();
    assert_eq!(flattened.get_str("id").unwrap(), id.as_str());
    assert_eq!(flattened.get_str("name").unwrap(), "B");
}

#[tokio::test]
async fn identifiers_are_unique_per_collection() {
    let store = store();
    let mut seen = HashSet::new();

    for n in 0..64 {
        let id = store.create_document("events", doc! { "n": n }).await.unwrap();
        assert!(seen.insert(id));
    }
}

#[tokio::test]
async fn empty_filter_returns_everything_not_deleted() {
    let store = store();

    let a = store.create_document("notes", doc! { "title": "a" }).await.unwrap();
    let b = store.create_document("notes", doc! { "title": "b" }).await.unwrap();
    let c = store.create_document("notes", doc! { "title": "c" }).await.unwrap();

    assert!(store.delete_document("notes", &b).await.unwrap());

    let ids = store
        .get_documents("notes", Filter::new())
        .await
        .unwrap()
        .into_iter()
        .map(|doc| doc.id)
        .collect::<Vec<_>>();

    assert_eq!(ids, vec![a, c]);
}

#[tokio::test]
async fn update_changes_only_named_fields() {
    let store = store();
    let id = store
        .create_document("users", doc! { "name": "Ada", "role": "admin" })
        .await
        .unwrap();

    assert!(store.update_document("users", &id, doc! { "x": 1 }).await.unwrap());

    let found = store.get_documents("users", Filter::by_id(&id)).await.unwrap();

    assert_eq!(found[0].get("x"), Some(&Bson::Int32(1)));
    assert_eq!(found[0].get("name"), Some(&Bson::from("Ada")));
    assert_eq!(found[0].get("role"), Some(&Bson::from("admin")));
}

#[tokio::test]
async fn deleted_documents_are_gone_and_second_delete_is_false() {
    let store = store();
    let id = store.create_document("users", doc! { "name": "A" }).await.unwrap();

    assert!(store.delete_document("users", &id).await.unwrap());
    assert!(store.get_documents("users", doc! { "id": id.as_str() }).await.unwrap().is_empty());
    assert!(!store.delete_document("users", &id).await.unwrap());
}

#[tokio::test]
async fn missing_ids_report_false_without_error() {
    let store = store();
    let missing = DocumentId::generate();

    assert!(!store.update_document("users", &missing, doc! { "name": "Z" }).await.unwrap());
    assert!(!store.update_document("users", &missing, doc! {}).await.unwrap());
    assert!(!store.delete_document("users", &missing).await.unwrap());
}

#[tokio::test]
async fn filters_match_all_conditions() {
    let store = store();
    store.create_document("users", doc! { "name": "A", "age": 30 }).await.unwrap();
    store.create_document("users", doc! { "name": "B", "age": 30 }).await.unwrap();
    store.create_document("users", doc! { "name": "C", "age": 41 }).await.unwrap();

    assert_eq!(store.get_documents("users", doc! { "age": 30 }).await.unwrap().len(), 2);
    assert_eq!(
        store.get_documents("users", doc! { "age": 30, "name": "B" }).await.unwrap().len(),
        1
    );
    assert!(store.get_documents("users", doc! { "age": 30, "name": "C" }).await.unwrap().is_empty());
    assert!(store.get_documents("nobody", doc! {}).await.unwrap().is_empty());
}

#[tokio::test]
async fn reserved_fields_cannot_be_written() {
    let store = store();

    let err = store
        .create_document("users", doc! { "id": "mine" })
        .await
        .unwrap_err();
    assert!(matches!(err, DocumentStoreError::InvalidDocument(_)));

    let id = store.create_document("users", doc! { "name": "A" }).await.unwrap();
    let err = store
        .update_document("users", &id, doc! { "created_at": 0 })
        .await
        .unwrap_err();
    assert!(matches!(err, DocumentStoreError::InvalidDocument(_)));
}

#[tokio::test]
async fn empty_collection_name_is_rejected() {
    let store = store();

    let err = store.create_document("", doc! { "a": 1 }).await.unwrap_err();

    assert!(matches!(err, DocumentStoreError::InvalidCollection(_)));
}

#[tokio::test]
async fn json_documents_round_trip() {
    let store = store();

    let id = store
        .create_json("settings", &json!({ "dark_mode": true, "language": "en" }))
        .await
        .unwrap();

    let found = store.find_document("settings", Filter::by_id(&id)).await.unwrap().unwrap();
    let value = found.to_json().unwrap();

    assert_eq!(value["id"], json!(id.as_str()));
    assert_eq!(value["dark_mode"], json!(true));
    assert_eq!(value["language"], json!("en"));
    assert!(value["created_at"].is_string());

    let err = store.create_json("settings", &json!([1, 2])).await.unwrap_err();
    assert!(matches!(err, DocumentStoreError::InvalidDocument(_)));
}

#[tokio::test]
async fn push_appends_to_arrays() {
    let store = store();
    let id = store.create_document("groups", doc! { "name": "core" }).await.unwrap();

    assert!(store.push_to_field("groups", &id, "members", "u1").await.unwrap());
    assert!(store.push_to_field("groups", &id, "members", "u2").await.unwrap());
    assert!(!store.push_to_field("groups", &DocumentId::generate(), "members", "u3").await.unwrap());

    let group = store.find_document("groups", Filter::by_id(&id)).await.unwrap().unwrap();
    assert_eq!(group.get("members"), Some(&Bson::from(vec!["u1", "u2"])));

    let err = store.push_to_field("groups", &id, "id", "x").await.unwrap_err();
    assert!(matches!(err, DocumentStoreError::InvalidDocument(_)));
}

#[tokio::test]
async fn dynamic_store_shares_the_api() {
    let store = store().into_dyn();

    let id = store.create_document("users", doc! { "name": "A" }).await.unwrap();
    assert_eq!(store.count_documents("users", doc! { "name": "A" }).await.unwrap(), 1);
    assert_eq!(store.list_collections().await.unwrap(), vec!["users"]);

    let store = store.into_static::<InMemoryStore>().unwrap();
    assert!(store.delete_document("users", &id).await.unwrap());

    store.drop_collection("users").await.unwrap();
    store.shutdown().await.unwrap();
}

#[tokio::test]
async fn shut_down_store_fails_with_storage_error() {
    let backend = InMemoryStore::new();
    let handle = DocumentStore::new(backend.clone());

    DocumentStore::new(backend).shutdown().await.unwrap();

    let err = handle.get_documents("users", doc! {}).await.unwrap_err();
    assert!(matches!(err, DocumentStoreError::Storage(_)));
}
