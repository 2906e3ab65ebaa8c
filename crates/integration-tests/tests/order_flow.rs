//! Integration tests for order placement and order items.
//!
//! Require a running API, a migrated database and a seeded catalog.
//! Run with `--ignored`.

use reqwest::StatusCode;
use rust_decimal::Decimal;
use serde_json::{Value, json};

use voltcart_integration_tests::{TestUser, first_product};

#[tokio::test]
#[ignore = "Requires running API server and seeded database"]
async fn test_no_orders_is_empty_list() {
    let user = TestUser::register().await;
    let resp = user.get("/orders/me").await;
    assert_eq!(resp.status(), StatusCode::OK);
    let orders: Vec<Value> = resp.json().await.expect("json body");
    assert!(orders.is_empty());
}

#[tokio::test]
#[ignore = "Requires running API server and seeded database"]
async fn test_place_card_order() {
    let user = TestUser::register().await;
    let (product_id, price) = first_product(&user).await;

    let resp = user
        .post(
            "/orders",
            &json!({
                "shipping_address": "1 Main St",
                "billing_address": "1 Main St",
                "payment_method": "card",
                "card": {"cardNumber": "4242 4242 4242 4242", "expiry": "12/29", "cvv": "123"},
                "items": [
                    {"product": product_id, "quantity": 2, "color": "Black"},
                    {"product": product_id, "quantity": 1},
                    {"product": product_id, "quantity": 3, "size": "L"}
                ]
            }),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    let order: Value = resp.json().await.expect("json body");
    assert_eq!(order["status"], "Order placed");
    assert_eq!(order["card"]["card_number"], "**** **** **** 4242");
    assert_eq!(order["items"].as_array().expect("items").len(), 3);
    assert!(order["card"].get("cvv").is_none());

    // 2 + 1 + 3 units at the current price
    let unit: Decimal = price.parse().expect("price decimal");
    let total: Decimal = order["total_price"]
        .as_str()
        .expect("total string")
        .parse()
        .expect("total decimal");
    assert_eq!(total, unit * Decimal::from(6));

    let orders: Vec<Value> = user.get("/orders/me").await.json().await.expect("json body");
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0]["id"], order["id"]);

    let items: Vec<Value> = user.get("/order-items").await.json().await.expect("json body");
    assert_eq!(items.len(), 3);
}

#[tokio::test]
#[ignore = "Requires running API server and seeded database"]
async fn test_unknown_product_writes_nothing() {
    let user = TestUser::register().await;
    let (product_id, _) = first_product(&user).await;

    let resp = user
        .post(
            "/orders",
            &json!({
                "shipping_address": "1 Main St",
                "billing_address": "1 Main St",
                "payment_method": "paypal",
                "items": [
                    {"product": product_id, "quantity": 1},
                    {"product": i32::MAX, "quantity": 1}
                ]
            }),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = resp.json().await.expect("json body");
    assert_eq!(body["detail"], format!("Product {} not found", i32::MAX));

    let orders: Vec<Value> = user.get("/orders/me").await.json().await.expect("json body");
    assert!(orders.is_empty());
}

#[tokio::test]
#[ignore = "Requires running API server and seeded database"]
async fn test_card_payment_without_card_is_400() {
    let user = TestUser::register().await;
    let (product_id, _) = first_product(&user).await;

    let resp = user
        .post(
            "/orders",
            &json!({
                "shipping_address": "1 Main St",
                "billing_address": "1 Main St",
                "payment_method": "card",
                "items": [{"product": product_id, "quantity": 1}]
            }),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
#[ignore = "Requires running API server and seeded database"]
async fn test_other_users_orders_are_hidden() {
    let owner = TestUser::register().await;
    let stranger = TestUser::register().await;
    let (product_id, _) = first_product(&owner).await;

    let order: Value = owner
        .post(
            "/orders",
            &json!({
                "shipping_address": "1 Main St",
                "billing_address": "1 Main St",
                "payment_method": "paypal",
                "items": [{"product": product_id, "quantity": 1}]
            }),
        )
        .await
        .json()
        .await
        .expect("json body");
    let order_id = order["id"].as_i64().expect("order id");

    let resp = stranger.get(&format!("/orders/{order_id}")).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    // Status changes are staff only, even for the owner
    let resp = owner
        .send(
            reqwest::Method::PATCH,
            &format!("/orders/{order_id}"),
            &json!({ "status": "Shipped" }),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}
