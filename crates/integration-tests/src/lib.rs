//! Integration tests for the TechShop API.
//!
//! # Running Tests
//!
//! ```bash
//! # Apply the schema and load the sample store
//! cargo run -p techshop-cli -- migrate
//! cargo run -p techshop-cli -- seed
//!
//! # Start the API
//! cargo run -p techshop-api
//!
//! # Run integration tests
//! cargo test -p techshop-integration-tests -- --ignored
//! ```
//!
//! # Test Categories
//!
//! - `auth` - Registration, login, and the admin user list
//! - `products` - Catalog CRUD and keyword search
//! - `reviews` - Review submission and rating aggregates
//! - `orders` - Checkout and the pay/deliver lifecycle
//! - `health` - Health probes and frontend runtime config
//!
//! Every test drives the real HTTP surface with `reqwest` and is ignored
//! unless a server is running against a seeded database.

#![cfg_attr(not(test), forbid(unsafe_code))]

use reqwest::{Client, StatusCode};
use serde_json::{Value, json};
use uuid::Uuid;

/// Base URL for the API (configurable via environment).
#[must_use]
pub fn api_base_url() -> String {
    std::env::var("API_BASE_URL").unwrap_or_else(|_| "http://localhost:5000".to_string())
}

/// Database URL for tests that reach around the API (configurable via
/// environment, same resolution as the server).
#[must_use]
pub fn database_url() -> String {
    std::env::var("API_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .expect("API_DATABASE_URL or DATABASE_URL must be set for database-backed tests")
}

/// Admin account created by `techshop-cli seed`.
pub const SEED_ADMIN_EMAIL: &str = "admin@example.com";
/// Password shared by all seeded accounts.
pub const SEED_PASSWORD: &str = "123456";
/// Password used for accounts the tests register themselves.
pub const TEST_PASSWORD: &str = "123456";

/// A signed-in API caller as the auth endpoints return it.
#[derive(Debug, Clone)]
pub struct TestUser {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub is_admin: bool,
    pub token: String,
}

impl TestUser {
    /// `Authorization` header value for this user.
    #[must_use]
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.token)
    }
}

fn user_from_auth_body(body: &Value) -> TestUser {
    TestUser {
        id: body["id"].as_i64().expect("auth body missing id"),
        name: body["name"]
            .as_str()
            .expect("auth body missing name")
            .to_string(),
        email: body["email"]
            .as_str()
            .expect("auth body missing email")
            .to_string(),
        is_admin: body["isAdmin"].as_bool().expect("auth body missing isAdmin"),
        token: body["token"]
            .as_str()
            .expect("auth body missing token")
            .to_string(),
    }
}

/// Register a fresh account with a unique email and return the signed-in
/// identity.
pub async fn register_unique(client: &Client, name: &str) -> TestUser {
    let email = format!("test-{}@example.com", Uuid::new_v4());
    let resp = client
        .post(format!("{}/api/users", api_base_url()))
        .json(&json!({"name": name, "email": email, "password": TEST_PASSWORD}))
        .send()
        .await
        .expect("register request failed");

    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = resp.json().await.expect("register body was not JSON");
    user_from_auth_body(&body)
}

/// Log in and return the raw response, for tests that assert on failures.
pub async fn login_raw(client: &Client, email: &str, password: &str) -> reqwest::Response {
    client
        .post(format!("{}/api/users/login", api_base_url()))
        .json(&json!({"email": email, "password": password}))
        .send()
        .await
        .expect("login request failed")
}

/// Log in with credentials expected to be valid.
pub async fn login(client: &Client, email: &str, password: &str) -> TestUser {
    let resp = login_raw(client, email, password).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.expect("login body was not JSON");
    user_from_auth_body(&body)
}

/// Sign in as the seeded admin account.
pub async fn seeded_admin(client: &Client) -> TestUser {
    login(client, SEED_ADMIN_EMAIL, SEED_PASSWORD).await
}

/// Create a placeholder product as the given admin and return its id.
pub async fn create_product(client: &Client, admin: &TestUser) -> i64 {
    let resp = client
        .post(format!("{}/api/products", api_base_url()))
        .header(reqwest::header::AUTHORIZATION, admin.bearer())
        .send()
        .await
        .expect("create product request failed");

    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = resp.json().await.expect("product body was not JSON");
    body["id"].as_i64().expect("product body missing id")
}

/// Delete a product as the given admin, ignoring the outcome. Test cleanup.
pub async fn delete_product(client: &Client, admin: &TestUser, product_id: i64) {
    let _ = client
        .delete(format!("{}/api/products/{product_id}", api_base_url()))
        .header(reqwest::header::AUTHORIZATION, admin.bearer())
        .send()
        .await;
}
