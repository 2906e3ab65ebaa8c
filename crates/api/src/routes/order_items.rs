//! Order item route handlers.
//!
//! Reads are scoped like orders. Only staff may add, restatus or remove lines.

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use tracing::instrument;

use voltcart_core::{OrderId, OrderItemId, ProductId};

use crate::db::{OrderRepository, RepositoryError};
use crate::error::{AppError, Result};
use crate::extract::{ApiJson, ApiPath};
use crate::middleware::{RequireAuth, RequireStaff};
use crate::models::NewOrderItem;
use crate::routes::orders::{OrderItemView, StatusRequest};
use crate::state::AppState;
use crate::validation::{FieldErrors, MAX_VARIANT_LENGTH, check_max_len, required};

const NOT_FOUND: &str = "No OrderItem matches the given query.";

#[derive(Debug, Deserialize)]
pub struct CreateItemRequest {
    order: Option<OrderId>,
    product: Option<ProductId>,
    quantity: Option<i64>,
    color: Option<String>,
    size: Option<String>,
}

impl CreateItemRequest {
    fn validate(self) -> std::result::Result<(OrderId, NewOrderItem), FieldErrors> {
        let mut errors = FieldErrors::new();
        let order = required(&mut errors, "order", self.order);
        let product = required(&mut errors, "product", self.product);

        let quantity = match self.quantity.map(i32::try_from) {
            Some(Ok(quantity)) if quantity >= 1 => Some(quantity),
            Some(_) => {
                errors.add("quantity", "Ensure this value is greater than or equal to 1.");
                None
            }
            None => Some(1),
        };

        if let Some(color) = &self.color {
            check_max_len(&mut errors, "color", color, Some(MAX_VARIANT_LENGTH));
        }
        if let Some(size) = &self.size {
            check_max_len(&mut errors, "size", size, Some(MAX_VARIANT_LENGTH));
        }

        let (Some(order), Some(product_id), Some(quantity)) = (order, product, quantity) else {
            return Err(errors);
        };
        errors.into_result()?;

        Ok((
            order,
            NewOrderItem {
                product_id,
                quantity,
                color: self.color,
                size: self.size,
            },
        ))
    }
}

/// List order items: lines of the caller's orders, or every line for staff.
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<Vec<OrderItemView>>> {
    let items = OrderRepository::new(state.pool())
        .list_items(user.scope())
        .await?;
    Ok(Json(items.into_iter().map(OrderItemView::from).collect()))
}

/// Get one order item.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiPath(id): ApiPath<OrderItemId>,
) -> Result<Json<OrderItemView>> {
    let item = OrderRepository::new(state.pool())
        .get_item(id, user.scope())
        .await?
        .ok_or_else(|| AppError::NotFound(NOT_FOUND.to_owned()))?;
    Ok(Json(OrderItemView::from(item)))
}

/// Add a line to an existing order.
#[instrument(skip(state))]
pub async fn create(
    State(state): State<AppState>,
    RequireStaff(_user): RequireStaff,
    ApiJson(request): ApiJson<CreateItemRequest>,
) -> Result<impl IntoResponse> {
    let (order_id, item) = request.validate()?;

    let created = OrderRepository::new(state.pool())
        .create_item(order_id, &item)
        .await
        .map_err(|e| match e {
            RepositoryError::NotFound => AppError::NotFound(format!(
                "Order {order_id} or product {} not found",
                item.product_id
            )),
            other => other.into(),
        })?;

    tracing::info!(order_item_id = %created.id, order_id = %order_id, "order item added");

    Ok((StatusCode::CREATED, Json(OrderItemView::from(created))))
}

/// Change an order item's status. Other fields are read-only.
#[instrument(skip(state))]
pub async fn update(
    State(state): State<AppState>,
    RequireStaff(_user): RequireStaff,
    ApiPath(id): ApiPath<OrderItemId>,
    ApiJson(request): ApiJson<StatusRequest>,
) -> Result<Json<OrderItemView>> {
    let status = request.validate()?;
    let item = OrderRepository::new(state.pool())
        .update_item_status(id, &status)
        .await
        .map_err(not_found)?;

    tracing::info!(order_item_id = %item.id, status = %item.status, "order item status changed");

    Ok(Json(OrderItemView::from(item)))
}

/// Delete an order item.
#[instrument(skip(state))]
pub async fn destroy(
    State(state): State<AppState>,
    RequireStaff(_user): RequireStaff,
    ApiPath(id): ApiPath<OrderItemId>,
) -> Result<StatusCode> {
    OrderRepository::new(state.pool())
        .delete_item(id)
        .await
        .map_err(not_found)?;

    tracing::info!(order_item_id = %id, "order item deleted");

    Ok(StatusCode::NO_CONTENT)
}

fn not_found(err: RepositoryError) -> AppError {
    match err {
        RepositoryError::NotFound => AppError::NotFound(NOT_FOUND.to_owned()),
        other => other.into(),
    }
}
