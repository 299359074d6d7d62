//! API integration tests against a running server and database

use reqwest::{Client, StatusCode};
use serde_json::{json, Value};

const BASE_URL: &str = "http://localhost:5000";

/// ISBN-13 that no other test run is likely to have stored
fn unique_isbn() -> String {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("clock before epoch")
        .subsec_nanos();
    format!("979{:010}", nanos)
}

async fn create_book(client: &Client, isbn: &str) -> Value {
    let response = client
        .post(format!("{}/books", BASE_URL))
        .json(&json!({
            "title": "Integration Book",
            "author": "Test Author",
            "isbn": isbn,
            "published_year": 2001
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::CREATED);
    response.json().await.expect("Failed to parse response")
}

async fn delete_book(client: &Client, id: i64) -> StatusCode {
    client
        .delete(format!("{}/books/{}", BASE_URL, id))
        .send()
        .await
        .expect("Failed to send request")
        .status()
}

#[tokio::test]
#[ignore] // Run with: cargo test -- --ignored
async fn test_health_check() {
    let client = Client::new();

    let response = client
        .get(format!("{}/health", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
#[ignore]
async fn test_list_books() {
    let client = Client::new();

    let response = client
        .get(format!("{}/books", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert!(body.is_array());
}

#[tokio::test]
#[ignore]
async fn test_create_get_and_delete_book() {
    let client = Client::new();
    let isbn = unique_isbn();

    let created = create_book(&client, &isbn).await;
    let id = created["id"].as_i64().expect("No book ID");
    assert_eq!(created["isbn"], isbn);

    let response = client
        .get(format!("{}/books/{}", BASE_URL, id))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::OK);

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["title"], "Integration Book");
    assert_eq!(body["published_year"], 2001);

    assert_eq!(delete_book(&client, id).await, StatusCode::OK);
    assert_eq!(delete_book(&client, id).await, StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore]
async fn test_duplicate_isbn_conflicts() {
    let client = Client::new();
    let isbn = unique_isbn();

    let created = create_book(&client, &isbn).await;
    let id = created["id"].as_i64().expect("No book ID");

    let response = client
        .post(format!("{}/books", BASE_URL))
        .json(&json!({ "title": "Copy", "author": "Someone", "isbn": isbn }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::CONFLICT);

    delete_book(&client, id).await;
}

#[tokio::test]
#[ignore]
async fn test_partial_update() {
    let client = Client::new();
    let isbn = unique_isbn();

    let created = create_book(&client, &isbn).await;
    let id = created["id"].as_i64().expect("No book ID");

    let response = client
        .put(format!("{}/books/{}", BASE_URL, id))
        .json(&json!({ "title": "Renamed" }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::OK);

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["title"], "Renamed");
    assert_eq!(body["author"], "Test Author");
    assert_eq!(body["isbn"], isbn);

    delete_book(&client, id).await;
}

#[tokio::test]
#[ignore]
async fn test_create_without_title_is_rejected() {
    let client = Client::new();

    let response = client
        .post(format!("{}/books", BASE_URL))
        .json(&json!({ "author": "Nobody", "isbn": unique_isbn() }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["errors"][0]["field"], "title");
}
