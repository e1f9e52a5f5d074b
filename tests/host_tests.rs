// tests/host_tests.rs

use std::net::SocketAddr;
use std::sync::Arc;

use motormart::config::Config;
use motormart::routes;
use motormart::state::AppState;
use motormart::store::MemoryStore;
use motormart::utils::jwt::{sign_magic_token, sign_session_token};
use uuid::Uuid;

const JWT_SECRET: &str = "integration_test_secret";

fn test_config() -> Config {
    Config {
        database_url: String::new(),
        jwt_secret: JWT_SECRET.to_string(),
        session_ttl_seconds: 600,
        magic_link_ttl_seconds: 600,
        public_base_url: "http://localhost:3000".to_string(),
        rust_log: "error".to_string(),
    }
}

async fn spawn_app(store: Arc<MemoryStore>) -> String {
    let state = AppState {
        store,
        config: test_config(),
    };

    let app = routes::create_router(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    tokio::spawn(async move {
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .unwrap();
    });

    address
}

fn random_email() -> String {
    format!("host-{}@example.com", Uuid::new_v4())
}

/// Walks the magic-link exchange and returns a Bearer session token.
async fn sign_in(client: &reqwest::Client, address: &str, email: &str) -> String {
    let magic = sign_magic_token(email, JWT_SECRET, 600).expect("Failed to sign magic token");

    let session: serde_json::Value = client
        .post(format!("{}/api/auth/session", address))
        .json(&serde_json::json!({ "token": magic }))
        .send()
        .await
        .expect("Failed to execute request")
        .json()
        .await
        .expect("Failed to parse session json");

    session["token"]
        .as_str()
        .expect("session response carries a token")
        .to_string()
}

#[tokio::test]
async fn host_routes_require_a_session_token() {
    let store = Arc::new(MemoryStore::new());
    let address = spawn_app(store).await;
    let client = reqwest::Client::new();

    let response = client
        .get(format!("{}/api/host/listings", address))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 401);

    // A magic-link token is not a session token.
    let magic = sign_magic_token("a@b.com", JWT_SECRET, 600).unwrap();
    let response = client
        .get(format!("{}/api/host/listings", address))
        .header("Authorization", format!("Bearer {}", magic))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 401);
}

#[tokio::test]
async fn magic_link_endpoint_validates_the_email() {
    let store = Arc::new(MemoryStore::new());
    let address = spawn_app(store).await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{}/api/auth/magic-link", address))
        .json(&serde_json::json!({ "email": random_email() }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 202);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["sent"], true);

    let response = client
        .post(format!("{}/api/auth/magic-link", address))
        .json(&serde_json::json!({ "email": "not-an-email" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 400);
}

#[tokio::test]
async fn session_exchange_rejects_bad_tokens() {
    let store = Arc::new(MemoryStore::new());
    let address = spawn_app(store).await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{}/api/auth/session", address))
        .json(&serde_json::json!({ "token": "junk" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 401);

    // A session token cannot be replayed as a magic-link token.
    let session = sign_session_token(7, "a@b.com", JWT_SECRET, 600).unwrap();
    let response = client
        .post(format!("{}/api/auth/session", address))
        .json(&serde_json::json!({ "token": session }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 401);
}

#[tokio::test]
async fn session_exchange_registers_the_host() {
    let store = Arc::new(MemoryStore::new());
    let address = spawn_app(store).await;
    let client = reqwest::Client::new();
    let email = random_email();

    let magic = sign_magic_token(&email, JWT_SECRET, 600).unwrap();
    let session: serde_json::Value = client
        .post(format!("{}/api/auth/session", address))
        .json(&serde_json::json!({ "token": magic }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(session["type"], "Bearer");
    assert_eq!(session["email"], email.as_str());
    assert!(session["host_id"].as_i64().unwrap() > 0);
    assert!(session["token"].as_str().is_some());
}

#[tokio::test]
async fn create_and_close_a_listing() {
    let store = Arc::new(MemoryStore::new());
    let address = spawn_app(store).await;
    let client = reqwest::Client::new();
    let token = sign_in(&client, &address, &random_email()).await;

    let response = client
        .post(format!("{}/api/host/listings", address))
        .bearer_auth(&token)
        .json(&serde_json::json!({
            "title": "Toyota Harrier 2018",
            "listing_type": "rent",
            "price": 180_000.0,
            "currency": "ugx",
            "location": "Kampala, Uganda",
            "description": "Well kept.<script>alert('x')</script>"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 201);

    let created: serde_json::Value = response.json().await.unwrap();
    let id = created["id"].as_i64().expect("created listing has an id");
    let slug = created["slug"].as_str().unwrap();
    assert!(slug.starts_with("toyota-harrier-2018-"));
    assert_eq!(created["price_per_day"], 180_000.0);
    assert_eq!(created["currency"], "UGX");
    assert_eq!(created["status"], "active");
    assert!(
        !created["description"].as_str().unwrap().contains("script"),
        "description must be sanitized"
    );

    // The new listing is live in the public catalog.
    let response = client
        .get(format!("{}/api/cars/{}", address, slug))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);

    // Close it from the dashboard.
    let updated: serde_json::Value = client
        .put(format!("{}/api/host/listings/{}", address, id))
        .bearer_auth(&token)
        .json(&serde_json::json!({ "status": "closed" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(updated["status"], "closed");
    assert!(updated["closed_at"].as_str().is_some());

    // Still browsable during the grace window, flagged as closed.
    let detail: serde_json::Value = client
        .get(format!("{}/api/cars/{}", address, slug))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(detail["closed_for_display"], true);
}

#[tokio::test]
async fn dashboard_partitions_active_and_closed() {
    let store = Arc::new(MemoryStore::new());
    let address = spawn_app(store).await;
    let client = reqwest::Client::new();
    let token = sign_in(&client, &address, &random_email()).await;

    for (title, status) in [("Live one", "active"), ("Sold one", "closed")] {
        let response = client
            .post(format!("{}/api/host/listings", address))
            .bearer_auth(&token)
            .json(&serde_json::json!({
                "title": title,
                "listing_type": "buy",
                "price": 45_000_000.0,
                "status": status
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 201);
    }

    let dashboard: serde_json::Value = client
        .get(format!("{}/api/host/listings", address))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    let active = dashboard["active"].as_array().unwrap();
    let closed = dashboard["closed"].as_array().unwrap();
    assert_eq!(active.len(), 1);
    assert_eq!(closed.len(), 1);
    assert_eq!(active[0]["title"], "Live one");
    assert_eq!(closed[0]["title"], "Sold one");
}

#[tokio::test]
async fn create_rejects_invalid_payloads() {
    let store = Arc::new(MemoryStore::new());
    let address = spawn_app(store).await;
    let client = reqwest::Client::new();
    let token = sign_in(&client, &address, &random_email()).await;

    // Unknown listing type.
    let response = client
        .post(format!("{}/api/host/listings", address))
        .bearer_auth(&token)
        .json(&serde_json::json!({
            "title": "Bad ad",
            "listing_type": "lease",
            "price": 100.0
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 400);

    // Non-positive price.
    let response = client
        .post(format!("{}/api/host/listings", address))
        .bearer_auth(&token)
        .json(&serde_json::json!({
            "title": "Free car",
            "listing_type": "buy",
            "price": 0.0
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 400);
}

#[tokio::test]
async fn empty_update_is_a_bad_request() {
    let store = Arc::new(MemoryStore::new());
    let address = spawn_app(store).await;
    let client = reqwest::Client::new();
    let token = sign_in(&client, &address, &random_email()).await;

    let created: serde_json::Value = client
        .post(format!("{}/api/host/listings", address))
        .bearer_auth(&token)
        .json(&serde_json::json!({
            "title": "Honda Fit",
            "listing_type": "rent",
            "price": 90_000.0
        }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let id = created["id"].as_i64().unwrap();

    let response = client
        .put(format!("{}/api/host/listings/{}", address, id))
        .bearer_auth(&token)
        .json(&serde_json::json!({}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 400);
}

#[tokio::test]
async fn updates_are_scoped_to_the_owner() {
    let store = Arc::new(MemoryStore::new());
    let address = spawn_app(store).await;
    let client = reqwest::Client::new();

    let owner_token = sign_in(&client, &address, &random_email()).await;
    let intruder_token = sign_in(&client, &address, &random_email()).await;

    let created: serde_json::Value = client
        .post(format!("{}/api/host/listings", address))
        .bearer_auth(&owner_token)
        .json(&serde_json::json!({
            "title": "Nissan Patrol",
            "listing_type": "buy",
            "price": 120_000_000.0
        }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let id = created["id"].as_i64().unwrap();

    let response = client
        .put(format!("{}/api/host/listings/{}", address, id))
        .bearer_auth(&intruder_token)
        .json(&serde_json::json!({ "status": "closed" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 404);

    // The intruder's dashboard stays empty.
    let dashboard: serde_json::Value = client
        .get(format!("{}/api/host/listings", address))
        .bearer_auth(&intruder_token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(dashboard["active"].as_array().unwrap().is_empty());
    assert!(dashboard["closed"].as_array().unwrap().is_empty());
}
