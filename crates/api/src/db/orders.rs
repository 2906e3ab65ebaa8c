//! Order repository for database operations.
//!
//! Orders are loaded with their card summary and lines. Line prices are read
//! from the product at query time.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, Transaction};

use voltcart_core::{
    CardId, ORDER_PLACED, OrderId, OrderItemId, PaymentMethod, ProductId, UserId,
};

use super::RepositoryError;
use crate::models::{CardSummary, NewOrder, NewOrderItem, Order, OrderItem};

const ORDER_SELECT: &str = r"
    SELECT o.id, o.user_id, o.shipping_address, o.billing_address, o.payment_method,
           o.status, o.placed_at,
           cd.id AS card_id, cd.last4 AS card_last4, cd.expiry AS card_expiry
    FROM shop.order o
    LEFT JOIN shop.card_details cd ON cd.id = o.card_id
";

const ITEM_SELECT: &str = r"
    SELECT oi.id, oi.order_id, oi.product_id, p.name AS product_name,
           p.image AS product_image, p.price AS unit_price,
           oi.status, oi.quantity, oi.color, oi.size
    FROM shop.order_item oi
    JOIN shop.product p ON p.id = oi.product_id
    JOIN shop.order o ON o.id = oi.order_id
";

#[derive(sqlx::FromRow)]
struct OrderRow {
    id: i32,
    user_id: i32,
    shipping_address: String,
    billing_address: String,
    payment_method: String,
    status: String,
    placed_at: DateTime<Utc>,
    card_id: Option<i32>,
    card_last4: Option<String>,
    card_expiry: Option<String>,
}

impl OrderRow {
    fn into_order(self, items: Vec<OrderItem>) -> Result<Order, RepositoryError> {
        let payment_method = self.payment_method.parse::<PaymentMethod>().map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid payment method in database: {e}"))
        })?;

        let card = match (self.card_id, self.card_last4, self.card_expiry) {
            (Some(id), Some(last4), Some(expiry)) => Some(CardSummary {
                id: CardId::new(id),
                last4,
                expiry,
            }),
            _ => None,
        };

        Ok(Order {
            id: OrderId::new(self.id),
            user_id: UserId::new(self.user_id),
            shipping_address: self.shipping_address,
            billing_address: self.billing_address,
            payment_method,
            card,
            status: self.status,
            placed_at: self.placed_at,
            items,
        })
    }
}

#[derive(sqlx::FromRow)]
struct OrderItemRow {
    id: i32,
    order_id: i32,
    product_id: i32,
    product_name: String,
    product_image: Option<String>,
    unit_price: Decimal,
    status: String,
    quantity: i32,
    color: Option<String>,
    size: Option<String>,
}

impl From<OrderItemRow> for OrderItem {
    fn from(row: OrderItemRow) -> Self {
        Self {
            id: OrderItemId::new(row.id),
            order_id: OrderId::new(row.order_id),
            product_id: ProductId::new(row.product_id),
            product_name: row.product_name,
            product_image: row.product_image,
            unit_price: row.unit_price,
            status: row.status,
            quantity: row.quantity,
            color: row.color,
            size: row.size,
        }
    }
}

/// Repository for order and order item database operations.
///
/// Methods taking `owner: Option<UserId>` restrict results to that user's
/// orders when `Some`, and see every order when `None`.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    // =========================================================================
    // Orders
    // =========================================================================

    /// Place an order: card row (if any), order row, and one row per line.
    ///
    /// All writes share one transaction. The referenced products are locked
    /// for the duration so none can vanish between the check and the insert.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if any referenced product is missing.
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn create(&self, user_id: UserId, order: &NewOrder) -> Result<Order, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let wanted: Vec<i32> = order.product_ids().iter().map(ProductId::as_i32).collect();
        let locked: Vec<i32> =
            sqlx::query_scalar("SELECT id FROM shop.product WHERE id = ANY($1) FOR SHARE")
                .bind(&wanted)
                .fetch_all(&mut *tx)
                .await?;
        if locked.len() != wanted.len() {
            return Err(RepositoryError::NotFound);
        }

        let card_id: Option<i32> = match &order.card {
            Some(card) => Some(
                sqlx::query_scalar(
                    r"
                    INSERT INTO shop.card_details (last4, expiry, fingerprint)
                    VALUES ($1, $2, $3)
                    RETURNING id
                    ",
                )
                .bind(&card.last4)
                .bind(&card.expiry)
                .bind(&card.fingerprint)
                .fetch_one(&mut *tx)
                .await?,
            ),
            None => None,
        };

        let order_id: i32 = sqlx::query_scalar(
            r"
            INSERT INTO shop.order
                (user_id, shipping_address, billing_address, payment_method, card_id, status)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id
            ",
        )
        .bind(user_id)
        .bind(&order.shipping_address)
        .bind(&order.billing_address)
        .bind(order.payment_method)
        .bind(card_id)
        .bind(ORDER_PLACED)
        .fetch_one(&mut *tx)
        .await?;
        let order_id = OrderId::new(order_id);

        for item in &order.items {
            insert_item(&mut tx, order_id, item).await?;
        }

        tx.commit().await?;

        self.get(order_id, None)
            .await?
            .ok_or(RepositoryError::NotFound)
    }

    /// List orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    /// Returns `RepositoryError::DataCorruption` if a stored payment method is unknown.
    pub async fn list(&self, owner: Option<UserId>) -> Result<Vec<Order>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            "{ORDER_SELECT} WHERE ($1::int IS NULL OR o.user_id = $1) \
             ORDER BY o.placed_at DESC, o.id DESC"
        ))
        .bind(owner)
        .fetch_all(self.pool)
        .await?;

        let ids: Vec<i32> = rows.iter().map(|row| row.id).collect();
        let mut items = self.items_by_order(&ids).await?;

        rows.into_iter()
            .map(|row| {
                let lines = items.remove(&row.id).unwrap_or_default();
                row.into_order(lines)
            })
            .collect()
    }

    /// Get one order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    /// Returns `RepositoryError::DataCorruption` if the stored payment method is unknown.
    pub async fn get(
        &self,
        id: OrderId,
        owner: Option<UserId>,
    ) -> Result<Option<Order>, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "{ORDER_SELECT} WHERE o.id = $1 AND ($2::int IS NULL OR o.user_id = $2)"
        ))
        .bind(id)
        .bind(owner)
        .fetch_optional(self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let items = self
            .items_by_order(&[row.id])
            .await?
            .remove(&row.id)
            .unwrap_or_default();

        row.into_order(items).map(Some)
    }

    /// Set an order's status.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order doesn't exist.
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn update_status(&self, id: OrderId, status: &str) -> Result<Order, RepositoryError> {
        let result = sqlx::query("UPDATE shop.order SET status = $2 WHERE id = $1")
            .bind(id)
            .bind(status)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        self.get(id, None).await?.ok_or(RepositoryError::NotFound)
    }

    /// Delete an order with its lines and stored card.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order doesn't exist.
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn delete(&self, id: OrderId) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let card_id: Option<Option<i32>> =
            sqlx::query_scalar("DELETE FROM shop.order WHERE id = $1 RETURNING card_id")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;

        let Some(card_id) = card_id else {
            return Err(RepositoryError::NotFound);
        };

        if let Some(card_id) = card_id {
            sqlx::query("DELETE FROM shop.card_details WHERE id = $1")
                .bind(card_id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    // =========================================================================
    // Order items
    // =========================================================================

    /// List order items ordered by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_items(&self, owner: Option<UserId>) -> Result<Vec<OrderItem>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderItemRow>(&format!(
            "{ITEM_SELECT} WHERE ($1::int IS NULL OR o.user_id = $1) ORDER BY oi.id"
        ))
        .bind(owner)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(OrderItem::from).collect())
    }

    /// Get one order item.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_item(
        &self,
        id: OrderItemId,
        owner: Option<UserId>,
    ) -> Result<Option<OrderItem>, RepositoryError> {
        let row = sqlx::query_as::<_, OrderItemRow>(&format!(
            "{ITEM_SELECT} WHERE oi.id = $1 AND ($2::int IS NULL OR o.user_id = $2)"
        ))
        .bind(id)
        .bind(owner)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(OrderItem::from))
    }

    /// Add a line to an existing order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order or product doesn't exist.
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn create_item(
        &self,
        order_id: OrderId,
        item: &NewOrderItem,
    ) -> Result<OrderItem, RepositoryError> {
        let mut tx = self.pool.begin().await?;
        let id = insert_item(&mut tx, order_id, item).await.map_err(|e| match e {
            RepositoryError::Database(sqlx::Error::Database(ref db_err))
                if db_err.is_foreign_key_violation() =>
            {
                RepositoryError::NotFound
            }
            other => other,
        })?;
        tx.commit().await?;

        self.get_item(id, None)
            .await?
            .ok_or(RepositoryError::NotFound)
    }

    /// Set an order item's status.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the item doesn't exist.
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn update_item_status(
        &self,
        id: OrderItemId,
        status: &str,
    ) -> Result<OrderItem, RepositoryError> {
        let result = sqlx::query("UPDATE shop.order_item SET status = $2 WHERE id = $1")
            .bind(id)
            .bind(status)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        self.get_item(id, None)
            .await?
            .ok_or(RepositoryError::NotFound)
    }

    /// Delete an order item.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the item doesn't exist.
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete_item(&self, id: OrderItemId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM shop.order_item WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn items_by_order(
        &self,
        order_ids: &[i32],
    ) -> Result<HashMap<i32, Vec<OrderItem>>, RepositoryError> {
        if order_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows = sqlx::query_as::<_, OrderItemRow>(&format!(
            "{ITEM_SELECT} WHERE oi.order_id = ANY($1) ORDER BY oi.id"
        ))
        .bind(order_ids)
        .fetch_all(self.pool)
        .await?;

        let mut grouped: HashMap<i32, Vec<OrderItem>> = HashMap::new();
        for row in rows {
            grouped.entry(row.order_id).or_default().push(OrderItem::from(row));
        }
        Ok(grouped)
    }
}

async fn insert_item(
    tx: &mut Transaction<'_, Postgres>,
    order_id: OrderId,
    item: &NewOrderItem,
) -> Result<OrderItemId, RepositoryError> {
    let id: i32 = sqlx::query_scalar(
        r"
        INSERT INTO shop.order_item (order_id, product_id, status, quantity, color, size)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING id
        ",
    )
    .bind(order_id)
    .bind(item.product_id)
    .bind(ORDER_PLACED)
    .bind(item.quantity)
    .bind(&item.color)
    .bind(&item.size)
    .fetch_one(&mut **tx)
    .await?;

    Ok(OrderItemId::new(id))
}
