//! Order domain types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use voltcart_core::{
    CardId, LineItem, OrderId, OrderItemId, PaymentMethod, ProductId, UserId, sum_line_totals,
};

/// A placed order with its lines.
#[derive(Debug, Clone)]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub shipping_address: String,
    pub billing_address: String,
    pub payment_method: PaymentMethod,
    pub card: Option<CardSummary>,
    pub status: String,
    pub placed_at: DateTime<Utc>,
    pub items: Vec<OrderItem>,
}

impl Order {
    /// Sum of every line's total at current product prices.
    #[must_use]
    pub fn total_price(&self) -> Decimal {
        sum_line_totals(&self.items)
    }
}

/// The non-sensitive part of a stored card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardSummary {
    pub id: CardId,
    pub last4: String,
    pub expiry: String,
}

impl CardSummary {
    /// Card number with everything but the last four digits hidden.
    #[must_use]
    pub fn masked_number(&self) -> String {
        format!("**** **** **** {}", self.last4)
    }
}

/// One product line in an order.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderItem {
    pub id: OrderItemId,
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub product_name: String,
    pub product_image: Option<String>,
    /// Live product price, not a snapshot from purchase time.
    pub unit_price: Decimal,
    pub status: String,
    pub quantity: i32,
    pub color: Option<String>,
    pub size: Option<String>,
}

impl LineItem for OrderItem {
    fn quantity(&self) -> i32 {
        self.quantity
    }

    fn unit_price(&self) -> Decimal {
        self.unit_price
    }
}

/// Card data reduced to what may be stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenizedCard {
    pub last4: String,
    pub expiry: String,
    /// Hex HMAC-SHA256 of the full card number.
    pub fingerprint: String,
}

/// A validated order ready to insert.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub shipping_address: String,
    pub billing_address: String,
    pub payment_method: PaymentMethod,
    /// Present exactly when `payment_method` is `card`.
    pub card: Option<TokenizedCard>,
    pub items: Vec<NewOrderItem>,
}

/// A validated order line ready to insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrderItem {
    pub product_id: ProductId,
    pub quantity: i32,
    pub color: Option<String>,
    pub size: Option<String>,
}

impl NewOrder {
    /// Distinct product IDs referenced by the lines, in first-seen order.
    #[must_use]
    pub fn product_ids(&self) -> Vec<ProductId> {
        let mut ids: Vec<ProductId> = Vec::with_capacity(self.items.len());
        for item in &self.items {
            if !ids.contains(&item.product_id) {
                ids.push(item.product_id);
            }
        }
        ids
    }
}
