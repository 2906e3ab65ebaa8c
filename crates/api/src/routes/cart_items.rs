//! Cart item route handlers.
//!
//! Mutations answer with the caller's full cart. Items in another user's
//! cart are reported as missing.

use axum::{
    Json,
    extract::State,
    http::StatusCode,
};
use serde::Deserialize;
use tracing::instrument;

use voltcart_core::{CartItemId, ProductId};

use crate::db::{CartRepository, RepositoryError};
use crate::error::{AppError, Result};
use crate::extract::{ApiJson, ApiPath};
use crate::middleware::RequireAuth;
use crate::models::{CartItem, CartItemAction, CurrentUser, InvalidAction};
use crate::routes::carts::{CartItemView, CartView};
use crate::state::AppState;
use crate::validation::{FieldErrors, MAX_VARIANT_LENGTH, REQUIRED, check_max_len};

const NOT_FOUND: &str = "No CartItem matches the given query.";

#[derive(Debug, Deserialize)]
pub struct AddItemRequest {
    #[serde(rename = "productId", alias = "product_id")]
    product_id: Option<ProductId>,
    color: Option<String>,
    size: Option<String>,
}

impl AddItemRequest {
    fn validate(&self) -> std::result::Result<ProductId, FieldErrors> {
        let mut errors = FieldErrors::new();
        if let Some(color) = &self.color {
            check_max_len(&mut errors, "color", color, Some(MAX_VARIANT_LENGTH));
        }
        if let Some(size) = &self.size {
            check_max_len(&mut errors, "size", size, Some(MAX_VARIANT_LENGTH));
        }
        let Some(product_id) = self.product_id else {
            errors.add("productId", REQUIRED);
            return Err(errors);
        };
        errors.into_result()?;
        Ok(product_id)
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateItemRequest {
    action: Option<String>,
}

impl UpdateItemRequest {
    fn action(&self) -> Result<CartItemAction> {
        self.action
            .as_deref()
            .unwrap_or_default()
            .parse()
            .map_err(|e: InvalidAction| AppError::BadRequest(e.to_string()))
    }
}

/// List the items in the caller's cart.
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<Vec<CartItemView>>> {
    let items = CartRepository::new(state.pool()).list_items(user.id).await?;
    Ok(Json(items.into_iter().map(CartItemView::from).collect()))
}

/// Get one item from the caller's cart.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiPath(id): ApiPath<CartItemId>,
) -> Result<Json<CartItemView>> {
    let item = own_item(&state, &user, id).await?;
    Ok(Json(CartItemView::from(item)))
}

/// Add one unit of a product to the caller's cart.
///
/// A product already in the cart has its quantity bumped; the color and size
/// of the existing line are kept.
#[instrument(skip(state))]
pub async fn create(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiJson(request): ApiJson<AddItemRequest>,
) -> Result<Json<CartView>> {
    let product_id = request.validate()?;

    let item_id = CartRepository::new(state.pool())
        .add_product(
            user.id,
            product_id,
            request.color.as_deref(),
            request.size.as_deref(),
        )
        .await
        .map_err(|e| match e {
            RepositoryError::NotFound => {
                AppError::NotFound(format!("Product {product_id} not found"))
            }
            other => other.into(),
        })?;

    tracing::info!(cart_item_id = %item_id, product_id = %product_id, "product added to cart");

    full_cart(&state, &user).await
}

/// Apply an `increment`, `decrement` or `remove` action to a cart item.
#[instrument(skip(state))]
pub async fn update(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiPath(id): ApiPath<CartItemId>,
    ApiJson(request): ApiJson<UpdateItemRequest>,
) -> Result<Json<CartView>> {
    let item = own_item(&state, &user, id).await?;
    let action = request.action()?;

    let outcome = CartRepository::new(state.pool())
        .apply_action(item.id, user.id, action)
        .await
        .map_err(|e| match e {
            RepositoryError::NotFound => AppError::NotFound(NOT_FOUND.to_owned()),
            other => other.into(),
        })?;

    tracing::info!(cart_item_id = %item.id, ?action, ?outcome, "cart item updated");

    full_cart(&state, &user).await
}

/// Delete a cart item.
#[instrument(skip(state))]
pub async fn destroy(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiPath(id): ApiPath<CartItemId>,
) -> Result<StatusCode> {
    let item = own_item(&state, &user, id).await?;
    CartRepository::new(state.pool()).delete_item(item.id).await?;

    tracing::info!(cart_item_id = %item.id, "cart item deleted");

    Ok(StatusCode::NO_CONTENT)
}

async fn own_item(state: &AppState, user: &CurrentUser, id: CartItemId) -> Result<CartItem> {
    CartRepository::new(state.pool())
        .get_item_for_user(id, user.id)
        .await?
        .ok_or_else(|| AppError::NotFound(NOT_FOUND.to_owned()))
}

async fn full_cart(state: &AppState, user: &CurrentUser) -> Result<Json<CartView>> {
    let cart = CartRepository::new(state.pool())
        .get_for_user(user.id)
        .await?
        .ok_or_else(|| AppError::NotFound("No cart found for this user".to_owned()))?;

    Ok(Json(CartView::from(cart)))
}
