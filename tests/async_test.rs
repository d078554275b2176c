use chrono::{DateTime, Utc};
use dante::{criteria, AsyncDante, Config, Criteria, DanteError, Document, Model};
use futures_util::StreamExt;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::borrow::Cow;

fn doc(value: Value) -> Document {
    value.as_object().unwrap().clone()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Message {
    name: String,
    text: String,
}

impl Model for Message {
    fn collection_name() -> Cow<'static, str> {
        Cow::Borrowed("Message")
    }
}

#[tokio::test]
async fn test_hello_world_flow() {
    let dir = tempfile::tempdir().unwrap();
    let db = AsyncDante::open(dir.path().join("mydatabase.db")).await.unwrap();
    let coll = db.collection("mycollection").await.unwrap();

    coll.insert(&doc(json!({"name": "Dante", "text": "Hello World!"}))).await.unwrap();
    coll.insert(&doc(json!({"name": "Virgil", "text": "Hi!"}))).await.unwrap();

    let dante = coll.find_one(&criteria! { "name" => "Dante" }).await.unwrap().unwrap();
    assert_eq!(dante["text"], "Hello World!");

    let n = coll
        .update(&doc(json!({"name": "Beatrice"})), &criteria! { "name" => "Dante" })
        .await
        .unwrap();
    assert_eq!(n, 1);
    assert!(coll.find_one(&criteria! { "name" => "Dante" }).await.unwrap().is_none());
    assert!(coll.find_one(&criteria! { "name" => "Beatrice" }).await.unwrap().is_some());

    db.close().await.unwrap();
}

#[tokio::test]
async fn test_concurrent_inserts() {
    let db = AsyncDante::memory().await.unwrap();
    let coll = db.collection("test").await.unwrap();

    let obj1 = doc(json!({"a": 1, "b": 2, "c": 3}));
    let obj2 = doc(json!({"a": 1, "e": 4, "f": 5}));
    let (r1, r2) = tokio::join!(coll.insert(&obj1), coll.insert(&obj2));
    r1.unwrap();
    r2.unwrap();

    assert_eq!(coll.find_many(None, &criteria! { "a" => 1 }).await.unwrap().len(), 2);
    db.close().await.unwrap();
}

#[tokio::test]
async fn test_insert_datetime() {
    let db = AsyncDante::memory().await.unwrap();
    let coll = db.collection("test").await.unwrap();

    let now = Utc::now();
    coll.insert(&doc(json!({"a": 1, "b": now}))).await.unwrap();
    let result = coll.find_one(&criteria! { "a" => 1 }).await.unwrap().unwrap();
    let stored: DateTime<Utc> = result["b"].as_str().unwrap().parse().unwrap();
    assert_eq!(stored, now);

    // same encoding on both sides, so timestamps are matchable
    assert!(coll.find_one(&criteria! { "b" => json!(now) }).await.unwrap().is_some());
    db.close().await.unwrap();
}

#[tokio::test]
async fn test_set_delete_clear() {
    let db = AsyncDante::memory().await.unwrap();
    let coll = db.collection("test").await.unwrap();
    coll.insert(&doc(json!({"a": 1, "b": 2}))).await.unwrap();
    coll.insert(&doc(json!({"a": 2, "b": 2}))).await.unwrap();

    assert_eq!(coll.set(&doc(json!({"b": 3})), &criteria! { "a" => 1 }).await.unwrap(), 1);
    assert_eq!(coll.count(&criteria! { "b" => 3 }).await.unwrap(), 1);
    assert_eq!(coll.delete(&criteria! { "a" => 1 }).await.unwrap(), 1);
    assert_eq!(coll.clear().await.unwrap(), 1);
    assert!(coll.all().await.unwrap().is_empty());
    db.close().await.unwrap();
}

#[tokio::test]
async fn test_stream() {
    let db = AsyncDante::memory().await.unwrap();
    let coll = db.collection("test").await.unwrap();
    coll.insert(&doc(json!({"a": 1}))).await.unwrap();
    coll.insert(&doc(json!({"a": 2}))).await.unwrap();

    let docs: Vec<Document> = coll.stream().await.unwrap().collect().await;
    assert_eq!(docs.len(), 2);
    db.close().await.unwrap();
}

#[tokio::test]
async fn test_typed_collection() {
    let db = AsyncDante::memory().await.unwrap();
    let coll = db.model::<Message>().await.unwrap();
    assert_eq!(coll.name(), "Message");

    let msg = Message { name: "Dante".into(), text: "Hello world!".into() };
    coll.insert(&msg).await.unwrap();
    assert_eq!(coll.find_one(&criteria! { "name" => "Dante" }).await.unwrap(), Some(msg));

    let err = coll
        .set(&doc(json!({"text": "x"})), &criteria! { "name" => "Dante" })
        .await
        .unwrap_err();
    assert!(matches!(err, DanteError::Unsupported { .. }));
    db.close().await.unwrap();
}

#[tokio::test]
async fn test_manual_commit() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("test.db");

    let db = AsyncDante::with_config(Config::file(&path).auto_commit(false)).await.unwrap();
    let coll = db.collection("test").await.unwrap();
    coll.insert(&doc(json!({"kept": false}))).await.unwrap();
    db.close().await.unwrap();

    let db = AsyncDante::with_config(Config::file(&path).auto_commit(false)).await.unwrap();
    let coll = db.collection("test").await.unwrap();
    assert!(coll.all().await.unwrap().is_empty());
    coll.insert(&doc(json!({"kept": true}))).await.unwrap();
    db.commit().await.unwrap();
    db.close().await.unwrap();

    let db = AsyncDante::open(&path).await.unwrap();
    let coll = db.collection("test").await.unwrap();
    assert_eq!(coll.all().await.unwrap(), vec![doc(json!({"kept": true}))]);
    db.close().await.unwrap();
}

#[tokio::test]
async fn test_closed_handle() {
    let db = AsyncDante::memory().await.unwrap();
    let coll = db.collection("test").await.unwrap();
    db.close().await.unwrap();
    db.close().await.unwrap();
    assert!(matches!(coll.count(&Criteria::new()).await.unwrap_err(), DanteError::Closed));
    assert!(matches!(db.commit().await.unwrap_err(), DanteError::Closed));
}

#[tokio::test]
async fn test_reopen_sees_data() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("test.db");

    let first = AsyncDante::open(&path).await.unwrap();
    let coll = first.collection("test").await.unwrap();
    coll.insert(&doc(json!({"a": 1}))).await.unwrap();

    let second = AsyncDante::open(&path).await.unwrap();
    let coll = second.collection("test").await.unwrap();
    assert_eq!(
        coll.find_one(&criteria! { "a" => 1 }).await.unwrap(),
        Some(doc(json!({"a": 1})))
    );

    first.close().await.unwrap();
    second.close().await.unwrap();
}

#[tokio::test]
async fn test_nested_path_matching() {
    let db = AsyncDante::memory().await.unwrap();
    let coll = db.collection("test").await.unwrap();
    let data = doc(json!({"a": {"b": {"c": 1}}, "x": "y"}));
    coll.insert(&data).await.unwrap();

    assert_eq!(coll.find_one(&criteria! { "a__b__c" => 1 }).await.unwrap(), Some(data));
    assert!(coll.find_one(&criteria! { "a__b__c" => 2 }).await.unwrap().is_none());
    assert!(coll.find_one(&criteria! { "a__nope__c" => 1 }).await.unwrap().is_none());
    assert!(coll.find_one(&criteria! { "x__y" => 1 }).await.unwrap().is_none());
    db.close().await.unwrap();
}

#[tokio::test]
async fn test_update_zero_matches() {
    let db = AsyncDante::memory().await.unwrap();
    let coll = db.collection("test").await.unwrap();
    coll.insert(&doc(json!({"a": 1}))).await.unwrap();

    let miss = criteria! { "a" => 2 };
    assert_eq!(coll.update(&doc(json!({"a": 9})), &miss).await.unwrap(), 0);
    assert_eq!(coll.set(&doc(json!({"a": 9})), &miss).await.unwrap(), 0);
    assert_eq!(coll.delete(&miss).await.unwrap(), 0);
    assert_eq!(coll.all().await.unwrap(), vec![doc(json!({"a": 1}))]);
    db.close().await.unwrap();
}

#[tokio::test]
async fn test_clear_returns_count() {
    let db = AsyncDante::memory().await.unwrap();
    let coll = db.collection("test").await.unwrap();
    for i in 0..7 {
        coll.insert(&doc(json!({"i": i}))).await.unwrap();
    }
    assert_eq!(coll.clear().await.unwrap(), 7);
    assert!(coll.all().await.unwrap().is_empty());
    db.close().await.unwrap();
}

#[tokio::test]
async fn test_invalid_path_is_an_error() {
    let db = AsyncDante::memory().await.unwrap();
    let coll = db.collection("test").await.unwrap();
    let err = coll.find_one(&criteria! { "a____b" => 1 }).await.unwrap_err();
    assert!(matches!(err, DanteError::InvalidPath { .. }));
    db.close().await.unwrap();
}

#[tokio::test]
async fn test_schema_mismatch_on_decode() {
    let db = AsyncDante::memory().await.unwrap();
    db.collection("Message")
        .await
        .unwrap()
        .insert(&doc(json!({"name": 1})))
        .await
        .unwrap();

    let err = db.model::<Message>().await.unwrap().all().await.unwrap_err();
    assert!(matches!(err, DanteError::SchemaMismatch { .. }));
    db.close().await.unwrap();
}

#[tokio::test]
async fn test_set_nested_paths() {
    let db = AsyncDante::memory().await.unwrap();
    let coll = db.collection("test").await.unwrap();
    coll.insert(&doc(json!({"k": 1}))).await.unwrap();
    coll.insert(&doc(json!({"k": 2, "x": 3}))).await.unwrap();

    assert_eq!(coll.set(&doc(json!({"x__y": 5})), &criteria! { "k" => 1 }).await.unwrap(), 1);
    assert_eq!(
        coll.find_one(&criteria! { "k" => 1 }).await.unwrap(),
        Some(doc(json!({"k": 1, "x": {"y": 5}})))
    );
    // "x" is a scalar in this one, so nothing changes
    assert_eq!(coll.set(&doc(json!({"x__y": 5})), &criteria! { "k" => 2 }).await.unwrap(), 0);
    assert_eq!(
        coll.find_one(&criteria! { "k" => 2 }).await.unwrap(),
        Some(doc(json!({"k": 2, "x": 3})))
    );
    db.close().await.unwrap();
}
