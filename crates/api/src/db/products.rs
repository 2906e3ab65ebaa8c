//! Product repository for database operations.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use sqlx::types::Json;

use voltcart_core::{ProductCategory, ProductId};

use super::RepositoryError;
use crate::models::{NewProduct, Product};

const PRODUCT_COLUMNS: &str = "id, name, brand, description, price, stock, image, storage, colors, \
                               category, created_at, updated_at";

#[derive(sqlx::FromRow)]
struct ProductRow {
    id: i32,
    name: String,
    brand: String,
    description: String,
    price: Decimal,
    stock: i32,
    image: Option<String>,
    storage: Json<Vec<String>>,
    colors: Json<Vec<String>>,
    category: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ProductRow> for Product {
    type Error = RepositoryError;

    fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
        let category = row.category.parse::<ProductCategory>().map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid category in database: {e}"))
        })?;

        Ok(Self {
            id: ProductId::new(row.id),
            name: row.name,
            brand: row.brand,
            description: row.description,
            price: row.price,
            stock: row.stock,
            image: row.image,
            storage: row.storage.0,
            colors: row.colors.0,
            category,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Repository for catalog database operations.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List every product ordered by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if a stored category is unknown.
    pub async fn list(&self) -> Result<Vec<Product>, RepositoryError> {
        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM shop.product ORDER BY id"
        ))
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(Product::try_from).collect()
    }

    /// Get a product by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the stored category is unknown.
    pub async fn get(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM shop.product WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        row.map(Product::try_from).transpose()
    }

    /// Return the subset of `ids` that exist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn existing_ids(&self, ids: &[ProductId]) -> Result<Vec<ProductId>, RepositoryError> {
        let raw: Vec<i32> = ids.iter().map(ProductId::as_i32).collect();
        let found: Vec<i32> =
            sqlx::query_scalar("SELECT id FROM shop.product WHERE id = ANY($1) ORDER BY id")
                .bind(&raw)
                .fetch_all(self.pool)
                .await?;

        Ok(found.into_iter().map(ProductId::new).collect())
    }

    /// Insert a product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(&self, product: &NewProduct) -> Result<Product, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            r"
            INSERT INTO shop.product
                (name, brand, description, price, stock, image, storage, colors, category)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {PRODUCT_COLUMNS}
            "
        ))
        .bind(&product.name)
        .bind(&product.brand)
        .bind(&product.description)
        .bind(product.price)
        .bind(product.stock)
        .bind(&product.image)
        .bind(Json(&product.storage))
        .bind(Json(&product.colors))
        .bind(product.category)
        .fetch_one(self.pool)
        .await?;

        Product::try_from(row)
    }

    /// Overwrite every field of an existing product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product doesn't exist.
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn update(
        &self,
        id: ProductId,
        product: &NewProduct,
    ) -> Result<Product, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            r"
            UPDATE shop.product
            SET name = $2,
                brand = $3,
                description = $4,
                price = $5,
                stock = $6,
                image = $7,
                storage = $8,
                colors = $9,
                category = $10,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {PRODUCT_COLUMNS}
            "
        ))
        .bind(id)
        .bind(&product.name)
        .bind(&product.brand)
        .bind(&product.description)
        .bind(product.price)
        .bind(product.stock)
        .bind(&product.image)
        .bind(Json(&product.storage))
        .bind(Json(&product.colors))
        .bind(product.category)
        .fetch_optional(self.pool)
        .await?;

        row.map(Product::try_from)
            .transpose()?
            .ok_or(RepositoryError::NotFound)
    }

    /// Insert a product, or update the existing one with the same name and brand.
    ///
    /// Used by catalog seeding so re-running a seed file is idempotent.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn upsert_by_name(&self, product: &NewProduct) -> Result<Product, RepositoryError> {
        let existing: Option<i32> = sqlx::query_scalar(
            "SELECT id FROM shop.product WHERE name = $1 AND brand = $2 ORDER BY id LIMIT 1",
        )
        .bind(&product.name)
        .bind(&product.brand)
        .fetch_optional(self.pool)
        .await?;

        match existing {
            Some(id) => self.update(ProductId::new(id), product).await,
            None => self.create(product).await,
        }
    }

    /// Delete a product. Cart and order lines referencing it are removed too.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product doesn't exist.
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete(&self, id: ProductId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM shop.product WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
