//! Product domain types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use voltcart_core::{ProductCategory, ProductId};

/// A catalog product.
#[derive(Debug, Clone, PartialEq)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub brand: String,
    pub description: String,
    /// Unit price, `NUMERIC(10, 2)`, never negative.
    pub price: Decimal,
    /// Units on hand, never negative.
    pub stock: i32,
    /// Image path or URL.
    pub image: Option<String>,
    /// Storage options offered, e.g. `["128GB", "256GB"]`.
    pub storage: Vec<String>,
    /// Color options offered.
    pub colors: Vec<String>,
    pub category: ProductCategory,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A validated product ready to insert.
#[derive(Debug, Clone, PartialEq)]
pub struct NewProduct {
    pub name: String,
    pub brand: String,
    pub description: String,
    pub price: Decimal,
    pub stock: i32,
    pub image: Option<String>,
    pub storage: Vec<String>,
    pub colors: Vec<String>,
    pub category: ProductCategory,
}

/// A validated partial update. `None` leaves the field unchanged; for `image`,
/// `Some(None)` clears it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductChanges {
    pub name: Option<String>,
    pub brand: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub stock: Option<i32>,
    pub image: Option<Option<String>>,
    pub storage: Option<Vec<String>>,
    pub colors: Option<Vec<String>>,
    pub category: Option<ProductCategory>,
}

impl ProductChanges {
    /// Apply these changes to `product`, yielding the full row to write back.
    #[must_use]
    pub fn apply_to(self, product: Product) -> NewProduct {
        NewProduct {
            name: self.name.unwrap_or(product.name),
            brand: self.brand.unwrap_or(product.brand),
            description: self.description.unwrap_or(product.description),
            price: self.price.unwrap_or(product.price),
            stock: self.stock.unwrap_or(product.stock),
            image: self.image.unwrap_or(product.image),
            storage: self.storage.unwrap_or(product.storage),
            colors: self.colors.unwrap_or(product.colors),
            category: self.category.unwrap_or(product.category),
        }
    }
}
