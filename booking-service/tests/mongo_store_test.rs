mod common;

use booking_service::models::StatusCheck;
use booking_service::services::{MongoStatusStore, StatusStore};
use common::test_config;

/// Round-trips through a real MongoDB. Point `TEST_MONGODB_URI` at an instance.
#[tokio::test]
#[ignore = "Requires MongoDB (set TEST_MONGODB_URI)"]
async fn mongo_store_round_trips_newest_first() {
    let config = test_config(true);
    let store = MongoStatusStore::connect(&config.mongodb)
        .await
        .expect("Failed to connect to MongoDB");
    store
        .initialize_indexes()
        .await
        .expect("Failed to create indexes");

    let first = StatusCheck::new("first".to_string());
    let second = StatusCheck::new("second".to_string());
    store.insert(&first).await.unwrap();
    store.insert(&second).await.unwrap();

    let listed = store.list(1000).await.unwrap();
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0].id, second.id);
    assert_eq!(listed[1].timestamp, first.timestamp);

    store.health_check().await.unwrap();
    store.shutdown().await;
}

#[tokio::test]
async fn unreachable_mongo_fails_to_connect() {
    let mut config = test_config(true);
    config.mongodb.uri = "mongodb://127.0.0.1:1".to_string();
    config.mongodb.connect_timeout = std::time::Duration::from_millis(200);

    assert!(MongoStatusStore::connect(&config.mongodb).await.is_err());
}

#[tokio::test]
async fn application_starts_without_reachable_mongo() {
    let mut config = test_config(true);
    config.mongodb.uri = "mongodb://127.0.0.1:1".to_string();
    config.mongodb.connect_timeout = std::time::Duration::from_millis(200);

    let app = booking_service::Application::build(config)
        .await
        .expect("Startup must tolerate a missing store");
    assert_ne!(app.port(), 0);
}
