//! Cart repository for database operations.
//!
//! Every lookup is keyed by the owning user, so an item in someone else's cart
//! is indistinguishable from one that does not exist.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use voltcart_core::{CartId, CartItemId, ProductId, UserId};

use super::RepositoryError;
use crate::models::{Cart, CartItem, CartItemAction, QuantityOutcome};

const ITEM_SELECT: &str = r"
    SELECT ci.id, ci.cart_id, ci.product_id, p.name AS product_name, p.price AS unit_price,
           ci.quantity, ci.color, ci.size
    FROM shop.cart_item ci
    JOIN shop.product p ON p.id = ci.product_id
    JOIN shop.cart c ON c.id = ci.cart_id
";

#[derive(sqlx::FromRow)]
struct CartRow {
    id: i32,
    user_id: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct CartItemRow {
    id: i32,
    cart_id: i32,
    product_id: i32,
    product_name: String,
    unit_price: Decimal,
    quantity: i32,
    color: Option<String>,
    size: Option<String>,
}

impl From<CartItemRow> for CartItem {
    fn from(row: CartItemRow) -> Self {
        Self {
            id: CartItemId::new(row.id),
            cart_id: CartId::new(row.cart_id),
            product_id: ProductId::new(row.product_id),
            product_name: row.product_name,
            unit_price: row.unit_price,
            quantity: row.quantity,
            color: row.color,
            size: row.size,
        }
    }
}

/// Repository for cart database operations.
pub struct CartRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CartRepository<'a> {
    /// Create a new cart repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a user's cart with its items, oldest item first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn get_for_user(&self, user_id: UserId) -> Result<Option<Cart>, RepositoryError> {
        let row = sqlx::query_as::<_, CartRow>(
            "SELECT id, user_id, created_at, updated_at FROM shop.cart WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let items = sqlx::query_as::<_, CartItemRow>(&format!(
            "{ITEM_SELECT} WHERE ci.cart_id = $1 ORDER BY ci.id"
        ))
        .bind(row.id)
        .fetch_all(self.pool)
        .await?;

        Ok(Some(Cart {
            id: CartId::new(row.id),
            user_id: UserId::new(row.user_id),
            created_at: row.created_at,
            updated_at: row.updated_at,
            items: items.into_iter().map(CartItem::from).collect(),
        }))
    }

    /// List the items in a user's cart.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_items(&self, user_id: UserId) -> Result<Vec<CartItem>, RepositoryError> {
        let rows = sqlx::query_as::<_, CartItemRow>(&format!(
            "{ITEM_SELECT} WHERE c.user_id = $1 ORDER BY ci.id"
        ))
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(CartItem::from).collect())
    }

    /// Get one item from a user's cart.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_item_for_user(
        &self,
        id: CartItemId,
        user_id: UserId,
    ) -> Result<Option<CartItem>, RepositoryError> {
        let row = sqlx::query_as::<_, CartItemRow>(&format!(
            "{ITEM_SELECT} WHERE ci.id = $1 AND c.user_id = $2"
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(CartItem::from))
    }

    /// Add one unit of a product to a user's cart.
    ///
    /// Creates the cart if the user has none. If the cart already holds the
    /// product its quantity goes up by one and the stored color/size are kept;
    /// otherwise a new line with quantity 1 is inserted. Runs in one transaction.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product doesn't exist.
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn add_product(
        &self,
        user_id: UserId,
        product_id: ProductId,
        color: Option<&str>,
        size: Option<&str>,
    ) -> Result<CartItemId, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let product_exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM shop.product WHERE id = $1)")
                .bind(product_id)
                .fetch_one(&mut *tx)
                .await?;
        if !product_exists {
            return Err(RepositoryError::NotFound);
        }

        let cart_id: i32 = sqlx::query_scalar(
            r"
            INSERT INTO shop.cart (user_id)
            VALUES ($1)
            ON CONFLICT (user_id) DO UPDATE SET updated_at = NOW()
            RETURNING id
            ",
        )
        .bind(user_id)
        .fetch_one(&mut *tx)
        .await?;

        let item_id: i32 = sqlx::query_scalar(
            r"
            INSERT INTO shop.cart_item (cart_id, product_id, quantity, color, size)
            VALUES ($1, $2, 1, $3, $4)
            ON CONFLICT ON CONSTRAINT cart_item_cart_product_key
            DO UPDATE SET quantity = shop.cart_item.quantity + 1
            RETURNING id
            ",
        )
        .bind(cart_id)
        .bind(product_id)
        .bind(color)
        .bind(size)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(CartItemId::new(item_id))
    }

    /// Apply a quantity action to an item in a user's cart.
    ///
    /// The row is locked while the new quantity is computed, so concurrent
    /// actions on the same item are applied one after another. Returns the
    /// outcome that was written.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the item isn't in the user's cart.
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn apply_action(
        &self,
        id: CartItemId,
        user_id: UserId,
        action: CartItemAction,
    ) -> Result<QuantityOutcome, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let quantity: Option<i32> = sqlx::query_scalar(
            r"
            SELECT ci.quantity
            FROM shop.cart_item ci
            JOIN shop.cart c ON c.id = ci.cart_id
            WHERE ci.id = $1 AND c.user_id = $2
            FOR UPDATE OF ci
            ",
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?;
        let quantity = quantity.ok_or(RepositoryError::NotFound)?;

        let outcome = action.outcome(quantity);
        match outcome {
            QuantityOutcome::Set(next) => {
                sqlx::query("UPDATE shop.cart_item SET quantity = $2 WHERE id = $1")
                    .bind(id)
                    .bind(next)
                    .execute(&mut *tx)
                    .await?;
            }
            QuantityOutcome::Delete => {
                sqlx::query("DELETE FROM shop.cart_item WHERE id = $1")
                    .bind(id)
                    .execute(&mut *tx)
                    .await?;
            }
        }

        tx.commit().await?;

        Ok(outcome)
    }

    /// Delete a cart item.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the item doesn't exist.
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete_item(&self, id: CartItemId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM shop.cart_item WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Remove every item from a user's cart, returning how many were removed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user has no cart.
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn clear(&self, user_id: UserId) -> Result<u64, RepositoryError> {
        let cart_id: Option<i32> =
            sqlx::query_scalar("SELECT id FROM shop.cart WHERE user_id = $1")
                .bind(user_id)
                .fetch_optional(self.pool)
                .await?;

        let cart_id = cart_id.ok_or(RepositoryError::NotFound)?;

        let result = sqlx::query("DELETE FROM shop.cart_item WHERE cart_id = $1")
            .bind(cart_id)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}
