//! API integration tests against a running server.
//!
//! Start the server with a migrated database and a bootstrap head admin,
//! then run with: cargo test -- --ignored
//! Credentials come from FREIGHTDESK_TEST_EMAIL / FREIGHTDESK_TEST_PASSWORD.

use reqwest::{Client, StatusCode};
use serde_json::{json, Value};

const BASE_URL: &str = "http://localhost:8080/api/v1";

fn credentials() -> (String, String) {
    (
        std::env::var("FREIGHTDESK_TEST_EMAIL").unwrap_or_else(|_| "head@freightdesk.local".into()),
        std::env::var("FREIGHTDESK_TEST_PASSWORD").unwrap_or_else(|_| "change-me".into()),
    )
}

/// Suffix keeping plate and license numbers unique between runs
fn unique_suffix() -> String {
    let nanos = chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default();
    format!("{:06}", nanos.rem_euclid(1_000_000))
}

async fn get_auth_token(client: &Client) -> String {
    let (email, password) = credentials();
    let response = client
        .post(format!("{}/auth/login", BASE_URL))
        .json(&json!({ "email": email, "password": password }))
        .send()
        .await
        .expect("Failed to send login request");

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.expect("Failed to parse login response");
    body["token"].as_str().expect("No token in response").to_string()
}

async fn create_truck(client: &Client, token: &str) -> Value {
    let response = client
        .post(format!("{}/trucks", BASE_URL))
        .bearer_auth(token)
        .json(&json!({
            "plate_no": format!("T{}", unique_suffix()),
            "truck_type": "wing_van"
        }))
        .send()
        .await
        .expect("Failed to create truck");
    assert_eq!(response.status(), StatusCode::CREATED);
    response.json().await.expect("truck body")
}

async fn create_driver(client: &Client, token: &str) -> Value {
    let suffix = unique_suffix();
    let response = client
        .post(format!("{}/drivers", BASE_URL))
        .bearer_auth(token)
        .json(&json!({
            "first_name": "Test",
            "last_name": format!("Driver{}", suffix),
            "phone_no": "09170000000",
            "license_no": format!("LIC-{}", suffix),
            "license_expiry_date": "2030-12-31"
        }))
        .send()
        .await
        .expect("Failed to create driver");
    assert_eq!(response.status(), StatusCode::CREATED);
    response.json().await.expect("driver body")
}

fn deployment_payload(truck_id: &Value, driver_id: &Value) -> Value {
    json!({
        "truck_id": truck_id,
        "driver_id": driver_id,
        "helper_count": 2,
        "sacks_count": 300,
        "pickup_site": "North Depot",
        "destination": "Harbor Warehouse"
    })
}

async fn get_json(client: &Client, token: &str, path: &str) -> Value {
    client
        .get(format!("{}{}", BASE_URL, path))
        .bearer_auth(token)
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse response")
}

async fn patch_deployment(client: &Client, token: &str, id: &Value, body: Value) -> reqwest::Response {
    client
        .patch(format!("{}/deployments/{}", BASE_URL, id))
        .bearer_auth(token)
        .json(&body)
        .send()
        .await
        .expect("Failed to patch deployment")
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
async fn test_login_invalid_credentials() {
    let client = Client::new();
    let (email, _) = credentials();

    let response = client
        .post(format!("{}/auth/login", BASE_URL))
        .json(&json!({ "email": email, "password": "wrong" }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore]
async fn test_deployment_round_trip() {
    let client = Client::new();
    let token = get_auth_token(&client).await;
    let truck = create_truck(&client, &token).await;
    let driver = create_driver(&client, &token).await;

    let response = client
        .post(format!("{}/deployments", BASE_URL))
        .bearer_auth(&token)
        .json(&deployment_payload(&truck["id"], &driver["id"]))
        .send()
        .await
        .expect("Failed to create deployment");
    assert_eq!(response.status(), StatusCode::CREATED);
    let deployment: Value = response.json().await.unwrap();
    let id = deployment["id"].clone();

    assert_eq!(deployment["status"], "preparing");
    assert!(deployment["deployment_code"].as_str().unwrap().starts_with("DPL-"));
    assert_eq!(deployment["truck_type"], "wing_van");

    let truck_now = get_json(&client, &token, &format!("/trucks/{}", truck["id"])).await;
    assert_eq!(truck_now["status"], "deployed");

    let response = patch_deployment(
        &client,
        &token,
        &id,
        json!({
            "status": "ongoing",
            "departed": "2024-03-01T06:00:00Z",
            "pickup_in": "2024-03-01T07:00:00Z",
            "pickup_out": "2024-03-01T08:00:00Z",
            "dest_arrival": "2024-03-01T12:00:00Z",
            "dest_departure": "2024-03-01T13:30:00Z"
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let updated: Value = response.json().await.unwrap();
    assert_eq!(updated["unloading_time"], "1h 30m");

    let response = patch_deployment(&client, &token, &id, json!({ "status": "completed" })).await;
    assert_eq!(response.status(), StatusCode::OK);

    let truck_now = get_json(&client, &token, &format!("/trucks/{}", truck["id"])).await;
    assert_eq!(truck_now["status"], "available");
    let driver_now = get_json(&client, &token, &format!("/drivers/{}", driver["id"])).await;
    assert_eq!(driver_now["status"], "available");
    assert_eq!(driver_now["trip_count"], 1);

    // Terminal states do not move
    let response = patch_deployment(&client, &token, &id, json!({ "status": "ongoing" })).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
#[ignore]
async fn test_completion_is_idempotent() {
    let client = Client::new();
    let token = get_auth_token(&client).await;
    let truck = create_truck(&client, &token).await;
    let driver = create_driver(&client, &token).await;

    let deployment: Value = client
        .post(format!("{}/deployments", BASE_URL))
        .bearer_auth(&token)
        .json(&deployment_payload(&truck["id"], &driver["id"]))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let id = deployment["id"].clone();

    for _ in 0..2 {
        let response = patch_deployment(&client, &token, &id, json!({ "status": "completed" })).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    let driver_now = get_json(&client, &token, &format!("/drivers/{}", driver["id"])).await;
    assert_eq!(driver_now["trip_count"], 1);
}

#[tokio::test]
#[ignore]
async fn test_concurrent_booking_of_one_truck() {
    let client = Client::new();
    let token = get_auth_token(&client).await;
    let truck = create_truck(&client, &token).await;
    let first_driver = create_driver(&client, &token).await;
    let second_driver = create_driver(&client, &token).await;

    let first = client
        .post(format!("{}/deployments", BASE_URL))
        .bearer_auth(&token)
        .json(&deployment_payload(&truck["id"], &first_driver["id"]))
        .send();
    let second = client
        .post(format!("{}/deployments", BASE_URL))
        .bearer_auth(&token)
        .json(&deployment_payload(&truck["id"], &second_driver["id"]))
        .send();
    let (first, second) = tokio::join!(first, second);

    let mut statuses = vec![first.unwrap().status(), second.unwrap().status()];
    statuses.sort();
    assert_eq!(statuses, vec![StatusCode::CREATED, StatusCode::BAD_REQUEST]);

    // The losing driver must not have been left deployed
    let drivers = [first_driver, second_driver];
    let mut available = 0;
    for driver in &drivers {
        let now = get_json(&client, &token, &format!("/drivers/{}", driver["id"])).await;
        if now["status"] == "available" {
            available += 1;
        }
    }
    assert_eq!(available, 1);
}

#[tokio::test]
#[ignore]
async fn test_replacement_swaps_assets_and_keeps_history() {
    let client = Client::new();
    let token = get_auth_token(&client).await;
    let truck = create_truck(&client, &token).await;
    let spare = create_truck(&client, &token).await;
    let driver = create_driver(&client, &token).await;

    let deployment: Value = client
        .post(format!("{}/deployments", BASE_URL))
        .bearer_auth(&token)
        .json(&deployment_payload(&truck["id"], &driver["id"]))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let id = deployment["id"].clone();

    let response = client
        .post(format!("{}/deployments/{}/replacement", BASE_URL, id))
        .bearer_auth(&token)
        .json(&json!({
            "truck_id": spare["id"],
            "reason": "mechanical_issue",
            "remarks": "Flat tire at the depot"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let replaced: Value = response.json().await.unwrap();
    assert_eq!(replaced["current_truck"]["id"], spare["id"]);
    assert_eq!(replaced["original_truck"]["id"], truck["id"]);

    let old_truck = get_json(&client, &token, &format!("/trucks/{}", truck["id"])).await;
    assert_eq!(old_truck["status"], "available");
    let spare_now = get_json(&client, &token, &format!("/trucks/{}", spare["id"])).await;
    assert_eq!(spare_now["status"], "deployed");

    let history = get_json(&client, &token, &format!("/deployments/{}/history", id)).await;
    assert_eq!(history["replacement"]["reason"], "mechanical_issue");
    assert!(history["events"].as_array().unwrap().len() >= 2);

    // A replacement that names neither a truck nor a driver is rejected
    let response = client
        .post(format!("{}/deployments/{}/replacement", BASE_URL, id))
        .bearer_auth(&token)
        .json(&json!({ "reason": "other" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
#[ignore]
async fn test_registration_starts_pending() {
    let client = Client::new();
    let email = format!("visitor{}@example.com", unique_suffix());

    let response = client
        .post(format!("{}/auth/register", BASE_URL))
        .json(&json!({
            "first_name": "Vera",
            "last_name": "Visitor",
            "email": email,
            "password": "visitor-pass-123"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let user: Value = response.json().await.unwrap();
    assert_eq!(user["status"], "pending");
    assert_eq!(user["role"], "visitor");

    let response = client
        .post(format!("{}/auth/login", BASE_URL))
        .json(&json!({ "email": email, "password": "visitor-pass-123" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

async fn create_deployment(client: &Client, token: &str, truck: &Value, driver: &Value) -> Value {
    let response = client
        .post(format!("{}/deployments", BASE_URL))
        .bearer_auth(token)
        .json(&deployment_payload(&truck["id"], &driver["id"]))
        .send()
        .await
        .expect("Failed to create deployment");
    assert_eq!(response.status(), StatusCode::CREATED);
    response.json().await.expect("deployment body")
}

#[tokio::test]
#[ignore]
async fn test_replacement_with_deployed_candidate_changes_nothing() {
    let client = Client::new();
    let token = get_auth_token(&client).await;
    let truck = create_truck(&client, &token).await;
    let driver = create_driver(&client, &token).await;
    let busy_truck = create_truck(&client, &token).await;
    let busy_driver = create_driver(&client, &token).await;

    let deployment = create_deployment(&client, &token, &truck, &driver).await;
    create_deployment(&client, &token, &busy_truck, &busy_driver).await;
    let id = deployment["id"].clone();

    let response = client
        .post(format!("{}/deployments/{}/replacement", BASE_URL, id))
        .bearer_auth(&token)
        .json(&json!({ "truck_id": busy_truck["id"], "reason": "mechanical_issue" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let after = get_json(&client, &token, &format!("/deployments/{}", id)).await;
    assert!(after["replacement"].is_null());
    assert_eq!(after["current_truck"]["id"], truck["id"]);

    for (path, expected) in [
        (format!("/trucks/{}", truck["id"]), "deployed"),
        (format!("/trucks/{}", busy_truck["id"]), "deployed"),
        (format!("/drivers/{}", driver["id"]), "deployed"),
    ] {
        let asset = get_json(&client, &token, &path).await;
        assert_eq!(asset["status"], expected, "{}", path);
    }
}

#[tokio::test]
#[ignore]
async fn test_out_of_order_milestones_are_rejected() {
    let client = Client::new();
    let token = get_auth_token(&client).await;
    let truck = create_truck(&client, &token).await;
    let driver = create_driver(&client, &token).await;
    let deployment = create_deployment(&client, &token, &truck, &driver).await;
    let id = deployment["id"].clone();

    // pickup_out with no pickup_in
    let response = patch_deployment(
        &client,
        &token,
        &id,
        json!({ "departed": "2024-03-01T06:00:00Z", "pickup_out": "2024-03-01T08:00:00Z" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let after = get_json(&client, &token, &format!("/deployments/{}", id)).await;
    assert!(after["timeline"]["departed"].is_null());
    assert!(after["timeline"]["pickup_out"].is_null());

    let response = patch_deployment(
        &client,
        &token,
        &id,
        json!({ "departed": "2024-03-01T06:00:00Z", "pickup_in": "2024-03-01T07:00:00Z" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    // pickup_out earlier than pickup_in
    let response = patch_deployment(&client, &token, &id, json!({ "pickup_out": "2024-03-01T06:30:00Z" })).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let after = get_json(&client, &token, &format!("/deployments/{}", id)).await;
    assert!(after["timeline"]["pickup_out"].is_null());
    assert!(after["timeline"]["pickup_in"].is_string());
}

#[tokio::test]
#[ignore]
async fn test_revoked_account_token_stops_working() {
    let client = Client::new();
    let token = get_auth_token(&client).await;
    let email = format!("clerk{}@example.com", unique_suffix());

    let response = client
        .post(format!("{}/users", BASE_URL))
        .bearer_auth(&token)
        .json(&json!({
            "first_name": "Cara",
            "last_name": "Clerk",
            "email": email,
            "password": "clerk-pass-123",
            "role": "visitor"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let user: Value = response.json().await.unwrap();

    let login: Value = client
        .post(format!("{}/auth/login", BASE_URL))
        .json(&json!({ "email": email, "password": "clerk-pass-123" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let clerk_token = login["token"].as_str().unwrap().to_string();

    let me = client
        .get(format!("{}/auth/me", BASE_URL))
        .bearer_auth(&clerk_token)
        .send()
        .await
        .unwrap();
    assert_eq!(me.status(), StatusCode::OK);

    let response = client
        .put(format!("{}/users/{}/status", BASE_URL, user["id"]))
        .bearer_auth(&token)
        .json(&json!({ "status": "revoked" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let me = client
        .get(format!("{}/auth/me", BASE_URL))
        .bearer_auth(&clerk_token)
        .send()
        .await
        .unwrap();
    assert_eq!(me.status(), StatusCode::UNAUTHORIZED);

    // Revoked accounts can still be soft deleted
    let response = client
        .delete(format!("{}/users/{}", BASE_URL, user["id"]))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
#[ignore]
async fn test_pending_registration_can_be_deleted() {
    let client = Client::new();
    let token = get_auth_token(&client).await;

    let registered: Value = client
        .post(format!("{}/auth/register", BASE_URL))
        .json(&json!({
            "first_name": "Pat",
            "last_name": "Pending",
            "email": format!("pending{}@example.com", unique_suffix()),
            "password": "pending-pass-123"
        }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    let response = client
        .delete(format!("{}/users/{}", BASE_URL, registered["id"]))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let user = get_json(&client, &token, &format!("/users/{}", registered["id"])).await;
    assert_eq!(user["status"], "inactive");

    // A second delete has nothing left to do
    let response = client
        .delete(format!("{}/users/{}", BASE_URL, registered["id"]))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
