//! Cart domain types.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use voltcart_core::{CartId, CartItemId, LineItem, ProductId, UserId, sum_line_totals};

/// A user's cart with its items.
#[derive(Debug, Clone)]
pub struct Cart {
    pub id: CartId,
    pub user_id: UserId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub items: Vec<CartItem>,
}

impl Cart {
    /// Sum of every item's total. Zero for an empty cart.
    #[must_use]
    pub fn total_price(&self) -> Decimal {
        sum_line_totals(&self.items)
    }
}

/// One product line in a cart, priced at the product's current price.
#[derive(Debug, Clone, PartialEq)]
pub struct CartItem {
    pub id: CartItemId,
    pub cart_id: CartId,
    pub product_id: ProductId,
    pub product_name: String,
    pub unit_price: Decimal,
    pub quantity: i32,
    pub color: Option<String>,
    pub size: Option<String>,
}

impl LineItem for CartItem {
    fn quantity(&self) -> i32 {
        self.quantity
    }

    fn unit_price(&self) -> Decimal {
        self.unit_price
    }
}

/// Quantity adjustment requested through `PATCH /cart-items/{id}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CartItemAction {
    Increment,
    Decrement,
    Remove,
}

/// Error for an action string that is not recognized.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid action")]
pub struct InvalidAction;

impl FromStr for CartItemAction {
    type Err = InvalidAction;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "increment" => Ok(Self::Increment),
            "decrement" => Ok(Self::Decrement),
            "remove" => Ok(Self::Remove),
            _ => Err(InvalidAction),
        }
    }
}

/// What to do with a cart item row after applying an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuantityOutcome {
    /// Persist the new quantity.
    Set(i32),
    /// Delete the row.
    Delete,
}

impl CartItemAction {
    /// Resolve the action against the item's current quantity.
    ///
    /// A decrement that would leave zero or fewer units deletes the row rather
    /// than storing a non-positive quantity.
    #[must_use]
    pub const fn outcome(self, quantity: i32) -> QuantityOutcome {
        match self {
            Self::Increment => QuantityOutcome::Set(quantity.saturating_add(1)),
            Self::Decrement => {
                let next = quantity.saturating_sub(1);
                if next <= 0 {
                    QuantityOutcome::Delete
                } else {
                    QuantityOutcome::Set(next)
                }
            }
            Self::Remove => QuantityOutcome::Delete,
        }
    }
}
