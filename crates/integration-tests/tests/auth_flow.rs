//! Integration tests for accounts and tokens.
//!
//! Require a running API and database. Run with `--ignored`.

use reqwest::{Client, StatusCode};
use serde_json::{Value, json};

use voltcart_integration_tests::{TestUser, base_url};

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn test_health() {
    let resp = Client::new()
        .get(format!("{}/health", base_url()))
        .send()
        .await
        .expect("request failed");
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp.headers().contains_key("x-request-id"));
}

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn test_login_with_wrong_password_is_401() {
    let user = TestUser::register().await;
    let resp = Client::new()
        .post(format!("{}/auth/jwt/create", base_url()))
        .json(&json!({ "email": user.email, "password": "definitely-wrong" }))
        .send()
        .await
        .expect("request failed");

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body: Value = resp.json().await.expect("json body");
    assert_eq!(
        body["detail"],
        "No active account found with the given credentials"
    );
}

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn test_refresh_and_verify() {
    let user = TestUser::register().await;
    let client = Client::new();

    let resp = client
        .post(format!("{}/auth/jwt/refresh", base_url()))
        .json(&json!({ "refresh": user.refresh }))
        .send()
        .await
        .expect("request failed");
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.expect("json body");
    let access = body["access"].as_str().expect("access token");

    let resp = client
        .post(format!("{}/auth/jwt/verify", base_url()))
        .json(&json!({ "token": access }))
        .send()
        .await
        .expect("request failed");
    assert_eq!(resp.status(), StatusCode::OK);

    // An access token cannot be used as a refresh token
    let resp = client
        .post(format!("{}/auth/jwt/refresh", base_url()))
        .json(&json!({ "refresh": user.access }))
        .send()
        .await
        .expect("request failed");
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn test_duplicate_email_rejected() {
    let user = TestUser::register().await;
    let resp = Client::new()
        .post(format!("{}/auth/users", base_url()))
        .json(&json!({
            "username": "someone-else",
            "email": user.email,
            "password": "another-password",
        }))
        .send()
        .await
        .expect("request failed");

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = resp.json().await.expect("json body");
    assert!(body.get("email").is_some());
}

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn test_requests_without_token_are_401() {
    let resp = Client::new()
        .get(format!("{}/carts/me", base_url()))
        .send()
        .await
        .expect("request failed");
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn test_profile_created_on_first_access() {
    let user = TestUser::register().await;

    let first: Value = user.get("/profiles/me").await.json().await.expect("json body");
    assert_eq!(first["first_name"], "Integration");
    assert_eq!(first["shipping_address"], "");

    let second: Value = user.get("/profiles/me/").await.json().await.expect("json body");
    assert_eq!(first["id"], second["id"]);

    let list: Vec<Value> = user.get("/profiles").await.json().await.expect("json body");
    assert_eq!(list.len(), 1);
}

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn test_catalog_writes_require_staff() {
    let user = TestUser::register().await;
    let resp = user
        .post(
            "/products",
            &json!({
                "name": "Nope",
                "brand": "Nope",
                "description": "Nope",
                "price": "1.00",
                "stock": 1,
                "category": "Tablets"
            }),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}
