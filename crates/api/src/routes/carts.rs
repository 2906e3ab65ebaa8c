//! Cart route handlers.
//!
//! Every user has at most one cart. It is created by the first
//! `POST /cart-items` and never by a read.

use axum::{Json, extract::State};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::instrument;

use voltcart_core::{CartId, CartItemId, LineItem, ProductId, UserId};

use crate::db::{CartRepository, RepositoryError};
use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::models::{Cart, CartItem};
use crate::state::AppState;

/// Cart as returned by the API.
#[derive(Debug, Serialize)]
pub struct CartView {
    pub id: CartId,
    pub user: UserId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub items: Vec<CartItemView>,
    pub total_price: Decimal,
}

impl From<Cart> for CartView {
    fn from(cart: Cart) -> Self {
        let total_price = cart.total_price();
        Self {
            id: cart.id,
            user: cart.user_id,
            created_at: cart.created_at,
            updated_at: cart.updated_at,
            items: cart.items.into_iter().map(CartItemView::from).collect(),
            total_price,
        }
    }
}

/// Cart line as returned by the API.
#[derive(Debug, Serialize)]
pub struct CartItemView {
    pub id: CartItemId,
    pub product_name: String,
    pub product_id: ProductId,
    pub quantity: i32,
    pub total_price: Decimal,
    pub color: Option<String>,
    pub size: Option<String>,
}

impl From<CartItem> for CartItemView {
    fn from(item: CartItem) -> Self {
        let total_price = item.total_price();
        Self {
            id: item.id,
            product_name: item.product_name,
            product_id: item.product_id,
            quantity: item.quantity,
            total_price,
            color: item.color,
            size: item.size,
        }
    }
}

/// List the caller's cart as zero or one entries.
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<Vec<CartView>>> {
    let cart = CartRepository::new(state.pool()).get_for_user(user.id).await?;
    Ok(Json(cart.into_iter().map(CartView::from).collect()))
}

/// Get the caller's cart.
#[instrument(skip(state))]
pub async fn me(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<CartView>> {
    let cart = CartRepository::new(state.pool())
        .get_for_user(user.id)
        .await?
        .ok_or_else(|| AppError::NotFound("No cart found for this user".to_owned()))?;

    Ok(Json(CartView::from(cart)))
}

#[derive(Debug, Serialize)]
pub struct DetailResponse {
    pub detail: &'static str,
}

/// Remove every item from the caller's cart. The cart itself stays.
#[instrument(skip(state))]
pub async fn clear(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<DetailResponse>> {
    let removed = CartRepository::new(state.pool())
        .clear(user.id)
        .await
        .map_err(|e| match e {
            RepositoryError::NotFound => AppError::NotFound("No cart found.".to_owned()),
            other => other.into(),
        })?;

    tracing::info!(user_id = %user.id, removed, "cart cleared");

    Ok(Json(DetailResponse {
        detail: "Cart cleared.",
    }))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn cart(items: Vec<CartItem>) -> Cart {
        let now = Utc::now();
        Cart {
            id: CartId::new(1),
            user_id: UserId::new(7),
            created_at: now,
            updated_at: now,
            items,
        }
    }

    fn item(id: i32, price: Decimal, quantity: i32) -> CartItem {
        CartItem {
            id: CartItemId::new(id),
            cart_id: CartId::new(1),
            product_id: ProductId::new(id * 10),
            product_name: format!("Product {id}"),
            unit_price: price,
            quantity,
            color: None,
            size: Some("M".to_string()),
        }
    }

    #[test]
    fn test_cart_view_totals_as_strings() {
        let view = CartView::from(cart(vec![item(1, Decimal::new(1999, 2), 2)]));
        let json = serde_json::to_value(view).unwrap();

        assert_eq!(json["user"], 7);
        assert_eq!(json["total_price"], "39.98");
        assert_eq!(json["items"][0]["total_price"], "39.98");
        assert_eq!(json["items"][0]["product_id"], 10);
        assert_eq!(json["items"][0]["product_name"], "Product 1");
        assert_eq!(json["items"][0]["color"], serde_json::Value::Null);
        assert_eq!(json["items"][0]["size"], "M");
    }

    #[test]
    fn test_empty_cart_total_is_zero() {
        let view = CartView::from(cart(Vec::new()));
        assert_eq!(view.total_price, Decimal::ZERO);
        assert!(view.items.is_empty());
    }

    #[test]
    fn test_cart_total_sums_lines() {
        let view = CartView::from(cart(vec![
            item(1, Decimal::new(1000, 2), 3),
            item(2, Decimal::new(550, 2), 1),
        ]));
        assert_eq!(view.total_price, Decimal::new(3550, 2));
    }
}
