//! Integration tests for the cart and cart items.
//!
//! Require a running API, a migrated database and a seeded catalog.
//! Run with `--ignored`.

use reqwest::{Method, StatusCode};
use serde_json::{Value, json};

use voltcart_integration_tests::{TestUser, first_product};

#[tokio::test]
#[ignore = "Requires running API server and seeded database"]
async fn test_new_user_has_no_cart() {
    let user = TestUser::register().await;

    let resp = user.get("/carts/me").await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = resp.json().await.expect("json body");
    assert_eq!(body["detail"], "No cart found for this user");

    let resp = user.post("/carts/clear", &json!({})).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let carts: Vec<Value> = user.get("/carts").await.json().await.expect("json body");
    assert!(carts.is_empty());
}

#[tokio::test]
#[ignore = "Requires running API server and seeded database"]
async fn test_adding_same_product_twice_merges_lines() {
    let user = TestUser::register().await;
    let (product_id, _) = first_product(&user).await;

    let resp = user
        .post("/cart-items", &json!({ "productId": product_id, "color": "Black" }))
        .await;
    assert_eq!(resp.status(), StatusCode::OK);

    // Different color still merges into the first line
    let cart: Value = user
        .post("/cart-items", &json!({ "productId": product_id, "color": "Teal" }))
        .await
        .json()
        .await
        .expect("json body");

    let items = cart["items"].as_array().expect("items");
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["quantity"], 2);
    assert_eq!(items[0]["color"], "Black");
}

#[tokio::test]
#[ignore = "Requires running API server and seeded database"]
async fn test_cart_item_actions() {
    let user = TestUser::register().await;
    let (product_id, _) = first_product(&user).await;

    let cart: Value = user
        .post("/cart-items", &json!({ "productId": product_id }))
        .await
        .json()
        .await
        .expect("json body");
    let item_id = cart["items"][0]["id"].as_i64().expect("item id");
    let path = format!("/cart-items/{item_id}");

    let cart: Value = user
        .send(Method::PATCH, &path, &json!({ "action": "increment" }))
        .await
        .json()
        .await
        .expect("json body");
    assert_eq!(cart["items"][0]["quantity"], 2);

    let resp = user
        .send(Method::PATCH, &path, &json!({ "action": "bogus" }))
        .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = resp.json().await.expect("json body");
    assert_eq!(body["detail"], "Invalid action");

    let item: Value = user.get(&path).await.json().await.expect("json body");
    assert_eq!(item["quantity"], 2);

    let cart: Value = user
        .send(Method::PATCH, &path, &json!({ "action": "decrement" }))
        .await
        .json()
        .await
        .expect("json body");
    assert_eq!(cart["items"][0]["quantity"], 1);

    // Decrementing the last unit removes the line
    let cart: Value = user
        .send(Method::PATCH, &path, &json!({ "action": "decrement" }))
        .await
        .json()
        .await
        .expect("json body");
    assert!(cart["items"].as_array().expect("items").is_empty());
    assert_eq!(cart["total_price"], "0");
}

#[tokio::test]
#[ignore = "Requires running API server and seeded database"]
async fn test_parallel_increments_all_land() {
    const REQUESTS: i64 = 20;

    let user = TestUser::register().await;
    let (product_id, _) = first_product(&user).await;

    let cart: Value = user
        .post("/cart-items", &json!({ "productId": product_id }))
        .await
        .json()
        .await
        .expect("json body");
    let item_id = cart["items"][0]["id"].as_i64().expect("item id");
    let path = format!("/cart-items/{item_id}");

    let handles: Vec<_> = (0..REQUESTS)
        .map(|_| {
            let user = user.clone();
            let path = path.clone();
            tokio::spawn(async move {
                user.send(Method::PATCH, &path, &json!({ "action": "increment" }))
                    .await
                    .status()
            })
        })
        .collect();
    for handle in handles {
        assert_eq!(handle.await.expect("task panicked"), StatusCode::OK);
    }

    let item: Value = user.get(&path).await.json().await.expect("json body");
    assert_eq!(item["quantity"], REQUESTS + 1);
}

#[tokio::test]
#[ignore = "Requires running API server and seeded database"]
async fn test_clear_cart() {
    let user = TestUser::register().await;
    let (product_id, _) = first_product(&user).await;

    user.post("/cart-items", &json!({ "productId": product_id })).await;
    user.post("/cart-items", &json!({ "productId": product_id })).await;

    let resp = user.post("/carts/clear", &json!({})).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.expect("json body");
    assert_eq!(body["detail"], "Cart cleared.");

    let cart: Value = user.get("/carts/me").await.json().await.expect("json body");
    assert!(cart["items"].as_array().expect("items").is_empty());
}

#[tokio::test]
#[ignore = "Requires running API server and seeded database"]
async fn test_other_users_items_are_hidden() {
    let owner = TestUser::register().await;
    let stranger = TestUser::register().await;
    let (product_id, _) = first_product(&owner).await;

    let cart: Value = owner
        .post("/cart-items", &json!({ "productId": product_id }))
        .await
        .json()
        .await
        .expect("json body");
    let item_id = cart["items"][0]["id"].as_i64().expect("item id");

    let resp = stranger.get(&format!("/cart-items/{item_id}")).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let resp = stranger
        .send(Method::DELETE, &format!("/cart-items/{item_id}"), &json!({}))
        .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore = "Requires running API server and seeded database"]
async fn test_unknown_product_is_404() {
    let user = TestUser::register().await;
    let resp = user
        .post("/cart-items", &json!({ "productId": i32::MAX }))
        .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let resp = user.post("/cart-items", &json!({})).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = user
        .send(Method::PATCH, "/cart-items/abc", &json!({ "action": "increment" }))
        .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = resp.json().await.expect("json body");
    assert!(body["detail"].is_string());
}
