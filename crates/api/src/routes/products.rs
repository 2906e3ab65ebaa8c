//! Product catalog route handlers.
//!
//! Any authenticated user may read the catalog. Writes require staff.

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

use voltcart_core::{ProductCategory, ProductId};

use crate::db::{ProductRepository, RepositoryError};
use crate::error::{AppError, Result};
use crate::extract::{ApiJson, ApiPath};
use crate::middleware::{RequireAuth, RequireStaff};
use crate::models::{NewProduct, Product, ProductChanges};
use crate::state::AppState;
use crate::validation::{FieldErrors, REQUIRED, check_decimal, check_text, present, required};

const NOT_FOUND: &str = "No Product matches the given query.";

const MIN_ZERO: &str = "Ensure this value is greater than or equal to 0.";

/// Product as returned by the API.
#[derive(Debug, Serialize)]
pub struct ProductView {
    pub id: ProductId,
    pub name: String,
    pub brand: String,
    pub description: String,
    pub price: Decimal,
    pub stock: i32,
    pub image: Option<String>,
    pub storage: Vec<String>,
    pub colors: Vec<String>,
    pub category: ProductCategory,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Product> for ProductView {
    fn from(product: Product) -> Self {
        Self {
            id: product.id,
            name: product.name,
            brand: product.brand,
            description: product.description,
            price: product.price,
            stock: product.stock,
            image: product.image,
            storage: product.storage,
            colors: product.colors,
            category: product.category,
            created_at: product.created_at,
            updated_at: product.updated_at,
        }
    }
}

/// Product fields accepted on create and update.
///
/// Everything is optional at the serde level so missing fields are reported
/// alongside other validation errors.
#[derive(Debug, Default, Deserialize)]
pub struct ProductPayload {
    name: Option<String>,
    brand: Option<String>,
    description: Option<String>,
    price: Option<Decimal>,
    stock: Option<i64>,
    #[serde(default, deserialize_with = "present")]
    image: Option<Option<String>>,
    storage: Option<Vec<String>>,
    colors: Option<Vec<String>>,
    category: Option<String>,
}

impl ProductPayload {
    fn fields(&self) -> Fields<'_> {
        Fields {
            name: self.name.as_deref(),
            brand: self.brand.as_deref(),
            description: self.description.as_deref(),
            price: self.price,
            stock: self.stock,
            category: self.category.as_deref(),
        }
    }

    /// Validate a full product (create or `PUT`).
    fn into_new_product(self) -> std::result::Result<NewProduct, FieldErrors> {
        let mut errors = FieldErrors::new();
        let checked = check_fields(&mut errors, &self.fields());

        let name = required(&mut errors, "name", self.name);
        let brand = required(&mut errors, "brand", self.brand);
        let description = required(&mut errors, "description", self.description);
        let price = required(&mut errors, "price", self.price);
        if self.stock.is_none() {
            errors.add("stock", REQUIRED);
        }
        if self.category.is_none() {
            errors.add("category", REQUIRED);
        }

        let (Some(name), Some(brand), Some(description), Some(price), Some(stock), Some(category)) =
            (name, brand, description, price, checked.stock, checked.category)
        else {
            return Err(errors);
        };
        errors.into_result()?;

        Ok(NewProduct {
            name,
            brand,
            description,
            price,
            stock,
            image: self.image.flatten(),
            storage: self.storage.unwrap_or_default(),
            colors: self.colors.unwrap_or_default(),
            category,
        })
    }

    /// Validate a partial update (`PATCH`).
    fn into_changes(self) -> std::result::Result<ProductChanges, FieldErrors> {
        let mut errors = FieldErrors::new();
        let checked = check_fields(&mut errors, &self.fields());
        errors.into_result()?;

        Ok(ProductChanges {
            name: self.name,
            brand: self.brand,
            description: self.description,
            price: self.price,
            stock: checked.stock,
            image: self.image,
            storage: self.storage,
            colors: self.colors,
            category: checked.category,
        })
    }
}

struct Fields<'a> {
    name: Option<&'a str>,
    brand: Option<&'a str>,
    description: Option<&'a str>,
    price: Option<Decimal>,
    stock: Option<i64>,
    category: Option<&'a str>,
}

/// Values that change type during validation. `None` when absent or invalid.
struct Checked {
    stock: Option<i32>,
    category: Option<ProductCategory>,
}

/// Check every present field, recording problems in `errors`.
fn check_fields(errors: &mut FieldErrors, fields: &Fields<'_>) -> Checked {
    if let Some(name) = fields.name {
        check_text(errors, "name", name, Some(200));
    }
    if let Some(brand) = fields.brand {
        check_text(errors, "brand", brand, Some(100));
    }
    if let Some(description) = fields.description {
        check_text(errors, "description", description, None);
    }
    if let Some(price) = fields.price {
        if price < Decimal::ZERO {
            errors.add("price", MIN_ZERO);
        }
        check_decimal(errors, "price", price, 10, 2);
    }

    let stock = match fields.stock.map(i32::try_from) {
        Some(Ok(stock)) if stock >= 0 => Some(stock),
        Some(Ok(_)) => {
            errors.add("stock", MIN_ZERO);
            None
        }
        Some(Err(_)) => {
            errors.add("stock", "Ensure this value is less than or equal to 2147483647.");
            None
        }
        None => None,
    };

    let category = match fields.category.map(str::parse::<ProductCategory>) {
        Some(Ok(category)) => Some(category),
        Some(Err(e)) => {
            errors.add("category", e.to_string());
            None
        }
        None => None,
    };

    Checked { stock, category }
}

/// List the catalog ordered by ID.
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    RequireAuth(_user): RequireAuth,
) -> Result<Json<Vec<ProductView>>> {
    let products = ProductRepository::new(state.pool()).list().await?;
    Ok(Json(products.into_iter().map(ProductView::from).collect()))
}

/// Get one product.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(_user): RequireAuth,
    ApiPath(id): ApiPath<ProductId>,
) -> Result<Json<ProductView>> {
    let product = find(&state, id).await?;
    Ok(Json(ProductView::from(product)))
}

/// Add a product to the catalog.
#[instrument(skip(state))]
pub async fn create(
    State(state): State<AppState>,
    RequireStaff(_user): RequireStaff,
    ApiJson(payload): ApiJson<ProductPayload>,
) -> Result<impl IntoResponse> {
    let product = payload.into_new_product()?;
    let created = ProductRepository::new(state.pool()).create(&product).await?;

    tracing::info!(product_id = %created.id, "product created");

    Ok((StatusCode::CREATED, Json(ProductView::from(created))))
}

/// Replace every field of a product.
#[instrument(skip(state))]
pub async fn replace(
    State(state): State<AppState>,
    RequireStaff(_user): RequireStaff,
    ApiPath(id): ApiPath<ProductId>,
    ApiJson(payload): ApiJson<ProductPayload>,
) -> Result<Json<ProductView>> {
    let product = payload.into_new_product()?;
    let updated = ProductRepository::new(state.pool())
        .update(id, &product)
        .await
        .map_err(not_found)?;

    Ok(Json(ProductView::from(updated)))
}

/// Update some fields of a product.
#[instrument(skip(state))]
pub async fn update(
    State(state): State<AppState>,
    RequireStaff(_user): RequireStaff,
    ApiPath(id): ApiPath<ProductId>,
    ApiJson(payload): ApiJson<ProductPayload>,
) -> Result<Json<ProductView>> {
    let changes = payload.into_changes()?;
    let existing = find(&state, id).await?;

    let updated = ProductRepository::new(state.pool())
        .update(id, &changes.apply_to(existing))
        .await?;

    Ok(Json(ProductView::from(updated)))
}

/// Remove a product from the catalog.
#[instrument(skip(state))]
pub async fn destroy(
    State(state): State<AppState>,
    RequireStaff(_user): RequireStaff,
    ApiPath(id): ApiPath<ProductId>,
) -> Result<StatusCode> {
    ProductRepository::new(state.pool())
        .delete(id)
        .await
        .map_err(not_found)?;

    tracing::info!(product_id = %id, "product deleted");

    Ok(StatusCode::NO_CONTENT)
}

async fn find(state: &AppState, id: ProductId) -> Result<Product> {
    ProductRepository::new(state.pool())
        .get(id)
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
    use super::*;

    fn payload(json: &str) -> ProductPayload {
        serde_json::from_str(json).unwrap()
    }

    const FULL: &str = r#"{
        "name": "Pulse 5",
        "brand": "Voltline",
        "description": "Portable speaker",
        "price": "129.99",
        "stock": 12,
        "colors": ["Black"],
        "category": "Bluetooth Speakers"
    }"#;

    #[test]
    fn test_full_payload_is_valid() {
        let product = payload(FULL).into_new_product().unwrap();
        assert_eq!(product.price, Decimal::new(12999, 2));
        assert_eq!(product.stock, 12);
        assert_eq!(product.category, ProductCategory::BluetoothSpeakers);
        assert_eq!(product.image, None);
        assert!(product.storage.is_empty());
    }

    #[test]
    fn test_missing_fields_reported_together() {
        let errors = payload(r#"{"name": "Pulse 5"}"#).into_new_product().unwrap_err();
        for field in ["brand", "description", "price", "stock", "category"] {
            assert_eq!(errors.get(field), Some(&[REQUIRED.to_string()][..]), "{field}");
        }
        assert!(errors.get("name").is_none());
    }

    #[test]
    fn test_rejects_unknown_category() {
        let json = FULL.replace("Bluetooth Speakers", "Toasters");
        let errors = payload(&json).into_new_product().unwrap_err();
        assert_eq!(
            errors.get("category").unwrap(),
            &["\"Toasters\" is not a valid choice.".to_string()]
        );
    }

    #[test]
    fn test_rejects_negative_stock_and_price() {
        let json = FULL.replace("12,", "-1,").replace("129.99", "-5");
        let errors = payload(&json).into_new_product().unwrap_err();
        assert!(errors.get("stock").is_some());
        assert!(errors.get("price").is_some());
    }

    #[test]
    fn test_rejects_extra_decimal_places() {
        let errors = payload(r#"{"price": "1.999"}"#).into_changes().unwrap_err();
        assert!(errors.get("price").is_some());
    }

    #[test]
    fn test_patch_distinguishes_null_image() {
        let changes = payload(r#"{"image": null}"#).into_changes().unwrap();
        assert_eq!(changes.image, Some(None));

        let changes = payload(r#"{"stock": 3}"#).into_changes().unwrap();
        assert_eq!(changes.image, None);
        assert_eq!(changes.stock, Some(3));
    }
}
