//! API integration tests
//!
//! These run against a live server with a synced catalog:
//! `cargo test --test api_tests -- --ignored`

use reqwest::{Client, StatusCode};
use serde_json::{json, Value};

const BASE_URL: &str = "http://localhost:8080/api/v1";

/// Create a user with a unique email and return its ID
async fn create_user(client: &Client, label: &str) -> i64 {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("Clock before epoch")
        .as_nanos();

    let response = client
        .post(format!("{}/users", BASE_URL))
        .json(&json!({
            "name": format!("Test {}", label),
            "email": format!("{}-{}@example.com", label, nanos),
            "phone": "123456789"
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::CREATED);
    let body: Value = response.json().await.expect("Failed to parse response");
    body["id"].as_i64().expect("No id in response")
}

/// Sync the catalog and return a book that still has copies available
async fn available_book(client: &Client) -> Value {
    let response = client
        .post(format!("{}/books/sync", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());

    let books: Value = client
        .get(format!("{}/books", BASE_URL))
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse response");

    books
        .as_array()
        .expect("Books should be an array")
        .iter()
        .find(|b| b["available_quantity"].as_i64().unwrap_or(0) > 0)
        .cloned()
        .expect("No book with available copies")
}

async fn get_book(client: &Client, external_id: i64) -> Value {
    client
        .get(format!("{}/books/{}", BASE_URL, external_id))
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse response")
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
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
#[ignore]
async fn test_duplicate_email_is_rejected() {
    let client = Client::new();
    let payload = json!({
        "name": "Duplicate",
        "email": format!("dup-{}@example.com", std::process::id()),
    });

    let first = client
        .post(format!("{}/users", BASE_URL))
        .json(&payload)
        .send()
        .await
        .expect("Failed to send request");
    assert!(first.status() == StatusCode::CREATED || first.status() == StatusCode::CONFLICT);

    let second = client
        .post(format!("{}/users", BASE_URL))
        .json(&payload)
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(second.status(), StatusCode::CONFLICT);
}

#[tokio::test]
#[ignore]
async fn test_reservation_lifecycle() {
    let client = Client::new();
    let user_id = create_user(&client, "lifecycle").await;
    let book = available_book(&client).await;
    let external_id = book["external_id"].as_i64().unwrap();
    let available_before = book["available_quantity"].as_i64().unwrap();

    // Create
    let response = client
        .post(format!("{}/reservations", BASE_URL))
        .json(&json!({
            "user_id": user_id,
            "book_external_id": external_id,
            "rental_days": 5,
            "start_date": "2024-01-01"
        }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::CREATED);

    let created: Value = response.json().await.expect("Failed to parse response");
    let reservation_id = created["id"].as_i64().unwrap();
    assert_eq!(created["status"], "ACTIVE");
    assert_eq!(created["expected_return_date"], "2024-01-06");
    assert_eq!(created["late_fee"], "0.00");
    assert_eq!(created["total_fee"], created["base_fee"]);

    let after_create = get_book(&client, external_id).await;
    assert_eq!(
        after_create["available_quantity"].as_i64().unwrap(),
        available_before - 1
    );

    // Query twice without mutation
    let first: Value = client
        .get(format!("{}/reservations/{}", BASE_URL, reservation_id))
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse response");
    let second: Value = client
        .get(format!("{}/reservations/{}", BASE_URL, reservation_id))
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse response");
    assert_eq!(first, second);

    // Still ACTIVE in storage, but overdue by query
    let overdue: Value = client
        .get(format!("{}/reservations/overdue", BASE_URL))
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse response");
    assert!(overdue
        .as_array()
        .unwrap()
        .iter()
        .any(|r| r["id"].as_i64() == Some(reservation_id) && r["status"] == "ACTIVE"));

    // Return three days late
    let response = client
        .post(format!("{}/reservations/{}/return", BASE_URL, reservation_id))
        .json(&json!({ "return_date": "2024-01-09" }))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());

    let returned: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(returned["status"], "OVERDUE");
    assert_eq!(returned["actual_return_date"], "2024-01-09");
    assert_ne!(returned["late_fee"], "0.00");

    let after_return = get_book(&client, external_id).await;
    assert_eq!(
        after_return["available_quantity"].as_i64().unwrap(),
        available_before
    );

    // Returning again is forbidden and leaves state alone
    let response = client
        .post(format!("{}/reservations/{}/return", BASE_URL, reservation_id))
        .json(&json!({ "return_date": "2024-01-10" }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["error"], "InvalidState");

    let unchanged = get_book(&client, external_id).await;
    assert_eq!(unchanged["available_quantity"], after_return["available_quantity"]);
}

#[tokio::test]
#[ignore]
async fn test_reservation_without_stock_is_rejected() {
    let client = Client::new();
    let user_id = create_user(&client, "nostock").await;
    let book = available_book(&client).await;
    let external_id = book["external_id"].as_i64().unwrap();
    let stock_before = book["stock_quantity"].as_i64().unwrap();
    let outstanding = stock_before - book["available_quantity"].as_i64().unwrap();

    // Leave no copy on the shelf
    let response = client
        .put(format!(
            "{}/books/{}/stock?stock_quantity={}",
            BASE_URL, external_id, outstanding
        ))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());

    let response = client
        .post(format!("{}/reservations", BASE_URL))
        .json(&json!({
            "user_id": user_id,
            "book_external_id": external_id,
            "rental_days": 3,
            "start_date": "2024-02-01"
        }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["error"], "BookNotAvailable");

    let user_reservations: Value = client
        .get(format!("{}/users/{}/reservations", BASE_URL, user_id))
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse response");
    assert!(user_reservations.as_array().unwrap().is_empty());

    // Restore the original stock
    client
        .put(format!(
            "{}/books/{}/stock?stock_quantity={}",
            BASE_URL, external_id, stock_before
        ))
        .send()
        .await
        .expect("Failed to send request");
}

#[tokio::test]
#[ignore]
async fn test_non_positive_rental_days_is_rejected() {
    let client = Client::new();
    let user_id = create_user(&client, "baddays").await;
    let book = available_book(&client).await;

    let response = client
        .post(format!("{}/reservations", BASE_URL))
        .json(&json!({
            "user_id": user_id,
            "book_external_id": book["external_id"],
            "rental_days": 0,
            "start_date": "2024-02-01"
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
#[ignore]
async fn test_unknown_reservation_returns_404() {
    let client = Client::new();

    let response = client
        .get(format!("{}/reservations/{}", BASE_URL, i64::MAX))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore]
async fn test_user_with_reservations_cannot_be_deleted() {
    let client = Client::new();
    let user_id = create_user(&client, "keeper").await;
    let book = available_book(&client).await;

    let response = client
        .post(format!("{}/reservations", BASE_URL))
        .json(&json!({
            "user_id": user_id,
            "book_external_id": book["external_id"],
            "rental_days": 2,
            "start_date": "2024-03-01"
        }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::CREATED);
    let reservation: Value = response.json().await.expect("Failed to parse response");

    let response = client
        .delete(format!("{}/users/{}", BASE_URL, user_id))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["error"], "Duplicate");

    let response = client
        .get(format!("{}/users/{}", BASE_URL, user_id))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::OK);

    // Give the copy back
    client
        .post(format!(
            "{}/reservations/{}/return",
            BASE_URL, reservation["id"]
        ))
        .json(&json!({ "return_date": "2024-03-03" }))
        .send()
        .await
        .expect("Failed to send request");
}

#[tokio::test]
#[ignore]
async fn test_user_without_reservations_is_deleted() {
    let client = Client::new();
    let user_id = create_user(&client, "leaver").await;

    let response = client
        .delete(format!("{}/users/{}", BASE_URL, user_id))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = client
        .get(format!("{}/users/{}", BASE_URL, user_id))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore]
async fn test_blank_user_name_is_rejected() {
    let client = Client::new();

    let response = client
        .post(format!("{}/users", BASE_URL))
        .json(&json!({
            "name": "   ",
            "email": format!("blank-{}@example.com", std::process::id()),
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
