//! Order route handlers.
//!
//! Callers see their own orders; staff see every order. Placed orders only
//! change through staff status updates.

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use voltcart_core::{
    LineItem, MAX_STATUS_LENGTH, OrderId, OrderItemId, PaymentMethod, ProductId, UserId,
};

use crate::db::{OrderRepository, ProductRepository, RepositoryError};
use crate::error::{AppError, Result};
use crate::extract::{ApiJson, ApiPath};
use crate::middleware::{RequireAuth, RequireStaff};
use crate::models::{
    CardSummary, CurrentUser, NewOrder, NewOrderItem, Order, OrderItem, TokenizedCard,
};
use crate::services::cards::{CardError, CardInput, CardVault, card_field_errors};
use crate::state::AppState;
use crate::validation::{
    FieldErrors, MAX_VARIANT_LENGTH, check_max_len, check_text, required,
};

const NOT_FOUND: &str = "No Order matches the given query.";

/// Render a placement time as e.g. `April 22, 2025`.
fn format_placed_at(placed_at: DateTime<Utc>) -> String {
    placed_at.format("%B %-d, %Y").to_string()
}

/// Order as returned by the API.
#[derive(Debug, Serialize)]
pub struct OrderView {
    pub id: OrderId,
    pub user: UserId,
    pub shipping_address: String,
    pub billing_address: String,
    pub payment_method: PaymentMethod,
    pub card: Option<CardView>,
    pub placed_at: String,
    pub status: String,
    pub items: Vec<OrderItemView>,
    pub total_price: Decimal,
}

impl From<Order> for OrderView {
    fn from(order: Order) -> Self {
        let total_price = order.total_price();
        Self {
            id: order.id,
            user: order.user_id,
            shipping_address: order.shipping_address,
            billing_address: order.billing_address,
            payment_method: order.payment_method,
            card: order.card.map(CardView::from),
            placed_at: format_placed_at(order.placed_at),
            status: order.status,
            items: order.items.into_iter().map(OrderItemView::from).collect(),
            total_price,
        }
    }
}

/// Masked card details.
#[derive(Debug, Serialize)]
pub struct CardView {
    pub card_number: String,
    pub expiry: String,
}

impl From<CardSummary> for CardView {
    fn from(card: CardSummary) -> Self {
        Self {
            card_number: card.masked_number(),
            expiry: card.expiry,
        }
    }
}

/// Order line as returned by the API.
#[derive(Debug, Serialize)]
pub struct OrderItemView {
    pub id: OrderItemId,
    pub product_name: String,
    pub product_image: Option<String>,
    pub status: String,
    pub quantity: i32,
    pub total_price: Decimal,
    pub color: Option<String>,
    pub size: Option<String>,
}

impl From<OrderItem> for OrderItemView {
    fn from(item: OrderItem) -> Self {
        let total_price = item.total_price();
        Self {
            id: item.id,
            product_name: item.product_name,
            product_image: item.product_image,
            status: item.status,
            quantity: item.quantity,
            total_price,
            color: item.color,
            size: item.size,
        }
    }
}

// =============================================================================
// Placement
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct PlaceOrderRequest {
    shipping_address: Option<String>,
    billing_address: Option<String>,
    payment_method: Option<String>,
    card: Option<CardRequest>,
    items: Option<Vec<OrderLineRequest>>,
}

#[derive(Deserialize)]
pub struct CardRequest {
    #[serde(rename = "cardNumber", alias = "card_number")]
    card_number: Option<String>,
    expiry: Option<String>,
    cvv: Option<String>,
}

impl std::fmt::Debug for CardRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CardRequest")
            .field("card_number", &"[REDACTED]")
            .field("expiry", &self.expiry)
            .field("cvv", &"[REDACTED]")
            .finish()
    }
}

#[derive(Debug, Deserialize)]
pub struct OrderLineRequest {
    product: Option<ProductId>,
    quantity: Option<i64>,
    color: Option<String>,
    size: Option<String>,
}

impl PlaceOrderRequest {
    /// Check the whole payload, tokenizing the card if one is required.
    fn validate(self, vault: &CardVault) -> Result<NewOrder> {
        let mut errors = FieldErrors::new();

        let shipping_address = required(&mut errors, "shipping_address", self.shipping_address);
        if let Some(address) = &shipping_address {
            check_text(&mut errors, "shipping_address", address, None);
        }
        let billing_address = required(&mut errors, "billing_address", self.billing_address);
        if let Some(address) = &billing_address {
            check_text(&mut errors, "billing_address", address, None);
        }

        let payment_method = match required(&mut errors, "payment_method", self.payment_method)
            .map(|method| method.parse::<PaymentMethod>())
        {
            Some(Ok(method)) => Some(method),
            Some(Err(e)) => {
                errors.add("payment_method", e.to_string());
                None
            }
            None => None,
        };

        let card = match (payment_method, self.card) {
            (Some(method), Some(card)) if method.requires_card() => {
                tokenize(vault, &card, &mut errors)?
            }
            (Some(method), None) if method.requires_card() => {
                errors.add("card", "Card details are required for card payments.");
                None
            }
            _ => None,
        };

        let items = validate_lines(self.items.unwrap_or_default(), &mut errors);

        let (Some(shipping_address), Some(billing_address), Some(payment_method)) =
            (shipping_address, billing_address, payment_method)
        else {
            return Err(errors.into());
        };
        errors.into_result()?;

        Ok(NewOrder {
            shipping_address,
            billing_address,
            payment_method,
            card,
            items,
        })
    }
}

/// Tokenize a submitted card, recording field problems under `card`.
fn tokenize(
    vault: &CardVault,
    card: &CardRequest,
    errors: &mut FieldErrors,
) -> Result<Option<TokenizedCard>> {
    let input = CardInput {
        number: card.card_number.as_deref().unwrap_or_default(),
        expiry: card.expiry.as_deref().unwrap_or_default(),
        cvv: card.cvv.as_deref().unwrap_or_default(),
    };

    match vault.tokenize(input) {
        Ok(tokenized) => Ok(Some(tokenized)),
        Err(card_errors) => {
            if let Some(CardError::Key(reason)) =
                card_errors.iter().find(|e| matches!(e, CardError::Key(_)))
            {
                return Err(AppError::Internal(format!("card fingerprint failed: {reason}")));
            }
            errors.nest("card", card_field_errors(&card_errors));
            Ok(None)
        }
    }
}

fn validate_lines(lines: Vec<OrderLineRequest>, errors: &mut FieldErrors) -> Vec<NewOrderItem> {
    if lines.is_empty() {
        errors.add("items", "An order needs at least one item.");
        return Vec::new();
    }

    let mut items = Vec::with_capacity(lines.len());
    for (index, line) in lines.into_iter().enumerate() {
        let mut line_errors = FieldErrors::new();

        let product = required(&mut line_errors, "product", line.product);
        let quantity = match required(&mut line_errors, "quantity", line.quantity) {
            Some(quantity) if quantity >= 1 => i32::try_from(quantity).ok().or_else(|| {
                line_errors.add("quantity", "Ensure this value is less than or equal to 2147483647.");
                None
            }),
            Some(_) => {
                line_errors.add("quantity", "Ensure this value is greater than or equal to 1.");
                None
            }
            None => None,
        };
        if let Some(color) = &line.color {
            check_max_len(&mut line_errors, "color", color, Some(MAX_VARIANT_LENGTH));
        }
        if let Some(size) = &line.size {
            check_max_len(&mut line_errors, "size", size, Some(MAX_VARIANT_LENGTH));
        }

        match (product, quantity) {
            (Some(product_id), Some(quantity)) if line_errors.is_empty() => {
                items.push(NewOrderItem {
                    product_id,
                    quantity,
                    color: line.color,
                    size: line.size,
                });
            }
            _ => errors.nest(&format!("items.{index}"), line_errors),
        }
    }
    items
}

/// Place an order for the caller.
///
/// Every product must exist before anything is written. The card, order and
/// lines are then stored in one transaction.
#[instrument(skip(state, request))]
pub async fn create(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiJson(request): ApiJson<PlaceOrderRequest>,
) -> Result<impl IntoResponse> {
    let order = request.validate(state.cards())?;

    let wanted = order.product_ids();
    let existing = ProductRepository::new(state.pool())
        .existing_ids(&wanted)
        .await?;
    if let Some(missing) = wanted.iter().find(|id| !existing.contains(id)) {
        return Err(AppError::NotFound(format!("Product {missing} not found")));
    }

    let placed = OrderRepository::new(state.pool())
        .create(user.id, &order)
        .await
        .map_err(|e| match e {
            RepositoryError::NotFound => {
                AppError::NotFound("A product in this order no longer exists".to_owned())
            }
            other => other.into(),
        })?;

    tracing::info!(
        order_id = %placed.id,
        lines = placed.items.len(),
        payment_method = %placed.payment_method,
        "order placed"
    );

    Ok((StatusCode::CREATED, Json(OrderView::from(placed))))
}

// =============================================================================
// Reads and staff updates
// =============================================================================

/// The caller's own orders, newest first. Empty when there are none.
#[instrument(skip(state))]
pub async fn me(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<Vec<OrderView>>> {
    let orders = OrderRepository::new(state.pool()).list(Some(user.id)).await?;
    Ok(Json(orders.into_iter().map(OrderView::from).collect()))
}

/// List orders: the caller's own, or every order for staff.
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<Vec<OrderView>>> {
    let orders = OrderRepository::new(state.pool())
        .list(user.scope())
        .await?;
    Ok(Json(orders.into_iter().map(OrderView::from).collect()))
}

/// Get one order.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiPath(id): ApiPath<OrderId>,
) -> Result<Json<OrderView>> {
    let order = visible_order(&state, &user, id).await?;
    Ok(Json(OrderView::from(order)))
}

#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    status: Option<String>,
}

impl StatusRequest {
    /// The trimmed new status.
    pub(crate) fn validate(self) -> std::result::Result<String, FieldErrors> {
        let mut errors = FieldErrors::new();
        let status = required(&mut errors, "status", self.status);
        let Some(status) = status else {
            return Err(errors);
        };
        check_text(&mut errors, "status", &status, Some(MAX_STATUS_LENGTH));
        errors.into_result()?;
        Ok(status.trim().to_owned())
    }
}

/// Change an order's status.
#[instrument(skip(state))]
pub async fn update_status(
    State(state): State<AppState>,
    RequireStaff(_user): RequireStaff,
    ApiPath(id): ApiPath<OrderId>,
    ApiJson(request): ApiJson<StatusRequest>,
) -> Result<Json<OrderView>> {
    let status = request.validate()?;
    let order = OrderRepository::new(state.pool())
        .update_status(id, &status)
        .await
        .map_err(not_found)?;

    tracing::info!(order_id = %order.id, status = %order.status, "order status changed");

    Ok(Json(OrderView::from(order)))
}

/// Delete an order, its lines and its stored card.
#[instrument(skip(state))]
pub async fn destroy(
    State(state): State<AppState>,
    RequireStaff(_user): RequireStaff,
    ApiPath(id): ApiPath<OrderId>,
) -> Result<StatusCode> {
    OrderRepository::new(state.pool())
        .delete(id)
        .await
        .map_err(not_found)?;

    tracing::info!(order_id = %id, "order deleted");

    Ok(StatusCode::NO_CONTENT)
}

async fn visible_order(state: &AppState, user: &CurrentUser, id: OrderId) -> Result<Order> {
    OrderRepository::new(state.pool())
        .get(id, user.scope())
        .await?
        .ok_or_else(|| AppError::NotFound(NOT_FOUND.to_owned()))
}

fn not_found(err: RepositoryError) -> AppError {
    match err {
        RepositoryError::NotFound => AppError::NotFound(NOT_FOUND.to_owned()),
        other => other.into(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;
    use secrecy::SecretString;
    use serde_json::json;
    use voltcart_core::CardId;

    use super::*;
    use crate::validation::REQUIRED;

    fn vault() -> CardVault {
        CardVault::new(SecretString::from("kD8#mW2$xQ7!nB4%vL9^tR3&yH6*pJ1@"))
    }

    fn request(value: serde_json::Value) -> PlaceOrderRequest {
        serde_json::from_value(value).unwrap()
    }

    fn field_errors(result: Result<NewOrder>) -> FieldErrors {
        match result {
            Err(AppError::Validation(errors)) => errors,
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_placed_at_format() {
        let at = Utc.with_ymd_and_hms(2025, 4, 2, 15, 30, 0).unwrap();
        assert_eq!(format_placed_at(at), "April 2, 2025");
    }

    #[test]
    fn test_paypal_order_without_card() {
        let order = request(json!({
            "shipping_address": "1 Main St",
            "billing_address": "1 Main St",
            "payment_method": "paypal",
            "items": [{"product": 1, "quantity": 2}, {"product": 5, "quantity": 1, "color": "Red"}]
        }))
        .validate(&vault())
        .unwrap();

        assert_eq!(order.payment_method, PaymentMethod::Paypal);
        assert!(order.card.is_none());
        assert_eq!(order.items.len(), 2);
        assert_eq!(order.items[1].color.as_deref(), Some("Red"));
    }

    #[test]
    fn test_card_order_is_tokenized() {
        let order = request(json!({
            "shipping_address": "1 Main St",
            "billing_address": "2 Side St",
            "payment_method": "card",
            "card": {"cardNumber": "4242 4242 4242 4242", "expiry": "12/29", "cvv": "123"},
            "items": [{"product": 1, "quantity": 1}]
        }))
        .validate(&vault())
        .unwrap();

        let card = order.card.unwrap();
        assert_eq!(card.last4, "4242");
        assert_eq!(card.expiry, "12/29");
        assert_eq!(card.fingerprint.len(), 64);
    }

    #[test]
    fn test_card_required_for_card_payments() {
        let errors = field_errors(
            request(json!({
                "shipping_address": "1 Main St",
                "billing_address": "1 Main St",
                "payment_method": "card",
                "items": [{"product": 1, "quantity": 1}]
            }))
            .validate(&vault()),
        );
        assert!(errors.get("card").is_some());
    }

    #[test]
    fn test_collects_every_problem() {
        let errors = field_errors(
            request(json!({
                "billing_address": "",
                "payment_method": "cash",
                "items": [{"product": 1, "quantity": 0}, {"quantity": 1}]
            }))
            .validate(&vault()),
        );

        assert_eq!(errors.get("shipping_address").unwrap(), &[REQUIRED.to_string()]);
        assert!(errors.get("billing_address").is_some());
        assert!(errors.get("payment_method").is_some());
        assert!(errors.get("items.0.quantity").is_some());
        assert_eq!(errors.get("items.1.product").unwrap(), &[REQUIRED.to_string()]);
    }

    #[test]
    fn test_empty_items_rejected() {
        let errors = field_errors(
            request(json!({
                "shipping_address": "1 Main St",
                "billing_address": "1 Main St",
                "payment_method": "paypal",
                "items": []
            }))
            .validate(&vault()),
        );
        assert!(errors.get("items").is_some());
    }

    #[test]
    fn test_order_view_shape() {
        let order = Order {
            id: OrderId::new(3),
            user_id: UserId::new(8),
            shipping_address: "1 Main St".to_string(),
            billing_address: "1 Main St".to_string(),
            payment_method: PaymentMethod::Card,
            card: Some(CardSummary {
                id: CardId::new(1),
                last4: "4242".to_string(),
                expiry: "12/29".to_string(),
            }),
            status: "Order placed".to_string(),
            placed_at: Utc.with_ymd_and_hms(2025, 4, 22, 9, 0, 0).unwrap(),
            items: vec![OrderItem {
                id: OrderItemId::new(1),
                order_id: OrderId::new(3),
                product_id: ProductId::new(2),
                product_name: "Pulse 5".to_string(),
                product_image: None,
                unit_price: Decimal::new(1999, 2),
                status: "Order placed".to_string(),
                quantity: 2,
                color: None,
                size: None,
            }],
        };

        let json = serde_json::to_value(OrderView::from(order)).unwrap();
        assert_eq!(json["user"], 8);
        assert_eq!(json["payment_method"], "card");
        assert_eq!(json["placed_at"], "April 22, 2025");
        assert_eq!(json["card"]["card_number"], "**** **** **** 4242");
        assert_eq!(json["total_price"], "39.98");
        assert_eq!(json["items"][0]["total_price"], "39.98");
        assert!(json["card"].get("cvv").is_none());
    }

    #[test]
    fn test_status_validation() {
        let ok: StatusRequest = serde_json::from_str(r#"{"status": " Shipped "}"#).unwrap();
        assert_eq!(ok.validate().unwrap(), "Shipped");

        let blank: StatusRequest = serde_json::from_str(r#"{"status": "  "}"#).unwrap();
        assert!(blank.validate().is_err());

        let long = "x".repeat(MAX_STATUS_LENGTH + 1);
        let too_long: StatusRequest =
            serde_json::from_value(json!({ "status": long })).unwrap();
        assert!(too_long.validate().is_err());
    }
}
