//! Integration tests for the Voltcart API.
//!
//! # Running Tests
//!
//! ```bash
//! # Migrate and seed a database, then start the API
//! cargo run -p voltcart-cli -- migrate
//! cargo run -p voltcart-cli -- seed products crates/cli/seeds/products.yaml
//! cargo run -p voltcart-api
//!
//! # Run the ignored HTTP tests against it
//! cargo test -p voltcart-integration-tests -- --ignored
//! ```
//!
//! `VOLTCART_TEST_URL` overrides the default `http://127.0.0.1:8000`.
//! Tests register throwaway users with random emails, so they can run against
//! a shared development database.

use reqwest::{Client, StatusCode};
use serde_json::{Value, json};
use uuid::Uuid;

/// Base URL of the API under test.
#[must_use]
pub fn base_url() -> String {
    std::env::var("VOLTCART_TEST_URL").unwrap_or_else(|_| "http://127.0.0.1:8000".to_string())
}

/// A registered user with a live access token.
#[derive(Debug, Clone)]
pub struct TestUser {
    pub client: Client,
    pub email: String,
    pub access: String,
    pub refresh: String,
}

impl TestUser {
    /// Register a fresh account and log in.
    ///
    /// # Panics
    ///
    /// Panics if the API rejects registration or login.
    pub async fn register() -> Self {
        let client = Client::new();
        let base = base_url();
        let tag = Uuid::new_v4().simple().to_string();
        let email = format!("it-{tag}@example.com");
        let password = format!("Pw-{tag}");

        let resp = client
            .post(format!("{base}/auth/users"))
            .json(&json!({
                "username": format!("it-{tag}"),
                "email": email,
                "password": password,
                "first_name": "Integration",
                "last_name": "Test",
            }))
            .send()
            .await
            .expect("register request failed");
        assert_eq!(resp.status(), StatusCode::CREATED, "registration rejected");

        let tokens: Value = client
            .post(format!("{base}/auth/jwt/create"))
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await
            .expect("login request failed")
            .json()
            .await
            .expect("login response was not JSON");

        Self {
            client,
            email,
            access: tokens["access"].as_str().expect("no access token").to_string(),
            refresh: tokens["refresh"].as_str().expect("no refresh token").to_string(),
        }
    }

    /// `GET` a path with the bearer token.
    ///
    /// # Panics
    ///
    /// Panics if the request cannot be sent.
    pub async fn get(&self, path: &str) -> reqwest::Response {
        self.client
            .get(format!("{}{path}", base_url()))
            .bearer_auth(&self.access)
            .send()
            .await
            .expect("request failed")
    }

    /// Send a JSON body with the bearer token.
    ///
    /// # Panics
    ///
    /// Panics if the request cannot be sent.
    pub async fn send(&self, method: reqwest::Method, path: &str, body: &Value) -> reqwest::Response {
        self.client
            .request(method, format!("{}{path}", base_url()))
            .bearer_auth(&self.access)
            .json(body)
            .send()
            .await
            .expect("request failed")
    }

    /// `POST` a JSON body with the bearer token.
    ///
    /// # Panics
    ///
    /// Panics if the request cannot be sent.
    pub async fn post(&self, path: &str, body: &Value) -> reqwest::Response {
        self.send(reqwest::Method::POST, path, body).await
    }
}

/// The first product in the catalog as `(id, price)`.
///
/// # Panics
///
/// Panics if the catalog is empty (seed it first).
pub async fn first_product(user: &TestUser) -> (i64, String) {
    let products: Vec<Value> = user
        .get("/products")
        .await
        .json()
        .await
        .expect("catalog was not JSON");
    let product = products.first().expect("catalog is empty; run the seed command");
    (
        product["id"].as_i64().expect("product id"),
        product["price"].as_str().expect("price string").to_string(),
    )
}
