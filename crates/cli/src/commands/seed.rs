//! Seed the catalog from a YAML file.
//!
//! Products are matched on name and brand, so running the same file twice
//! updates rather than duplicates.
//!
//! ```yaml
//! products:
//!   - name: Pulse 5
//!     brand: Voltline
//!     description: Portable speaker
//!     price: "129.99"
//!     stock: 40
//!     colors: [Black]
//!     category: Bluetooth Speakers
//! ```

use std::path::Path;

use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::{error, info};

use voltcart_api::db::{self, ProductRepository};
use voltcart_api::models::NewProduct;
use voltcart_core::ProductCategory;

use super::database_url;

/// Top level of a product seed file.
#[derive(Debug, Deserialize)]
pub struct ProductSeed {
    pub products: Vec<SeedProduct>,
}

/// One product entry.
#[derive(Debug, Deserialize)]
pub struct SeedProduct {
    pub name: String,
    pub brand: String,
    pub description: String,
    pub price: Decimal,
    pub stock: i32,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub storage: Vec<String>,
    #[serde(default)]
    pub colors: Vec<String>,
    pub category: ProductCategory,
}

impl SeedProduct {
    fn into_new_product(self) -> NewProduct {
        NewProduct {
            name: self.name,
            brand: self.brand,
            description: self.description,
            price: self.price,
            stock: self.stock,
            image: self.image,
            storage: self.storage,
            colors: self.colors,
            category: self.category,
        }
    }
}

/// Check every entry, returning one message per problem.
#[must_use]
pub fn validate_seed(seed: &ProductSeed) -> Vec<String> {
    let mut errors = Vec::new();
    for (index, product) in seed.products.iter().enumerate() {
        let label = format!("products[{index}] ({})", product.name);
        if product.name.trim().is_empty() {
            errors.push(format!("{label}: name is blank"));
        }
        if product.brand.trim().is_empty() {
            errors.push(format!("{label}: brand is blank"));
        }
        if product.price < Decimal::ZERO {
            errors.push(format!("{label}: price is negative"));
        }
        if product.price.normalize().scale() > 2 {
            errors.push(format!("{label}: price has more than 2 decimal places"));
        }
        if product.stock < 0 {
            errors.push(format!("{label}: stock is negative"));
        }
    }
    errors
}

/// Upsert the products in `file_path`.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, any entry is
/// invalid, or a database operation fails.
pub async fn products(file_path: &str) -> Result<(), Box<dyn std::error::Error>> {
    let path = Path::new(file_path);
    if !path.exists() {
        return Err(format!("File not found: {file_path}").into());
    }

    info!(path = %file_path, "Loading products from file");

    // Read and validate YAML before connecting to database
    let content = tokio::fs::read_to_string(path).await?;
    let seed: ProductSeed = serde_yaml::from_str(&content)?;

    info!(products = seed.products.len(), "Parsed seed file");

    let errors = validate_seed(&seed);
    if !errors.is_empty() {
        error!("Seed validation failed:");
        for err in &errors {
            error!("  - {err}");
        }
        return Err(format!("{} validation errors found", errors.len()).into());
    }

    let pool = db::create_pool(&database_url()?).await?;
    info!("Connected to database");

    let repo = ProductRepository::new(&pool);
    let mut upserted = 0;
    for product in seed.products {
        let saved = repo.upsert_by_name(&product.into_new_product()).await?;
        info!(product_id = %saved.id, name = %saved.name, "Product upserted");
        upserted += 1;
    }

    info!("Seeding complete! Products upserted: {upserted}");
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_bundled_seed_file_is_valid() {
        let seed: ProductSeed =
            serde_yaml::from_str(include_str!("../../seeds/products.yaml")).unwrap();
        assert!(!seed.products.is_empty());
        assert!(validate_seed(&seed).is_empty());
    }

    #[test]
    fn test_defaults_for_optional_lists() {
        let seed: ProductSeed = serde_yaml::from_str(
            r#"
products:
  - name: Cable
    brand: Voltline
    description: USB-C
    price: "9.99"
    stock: 5
    category: Chargers & Cables
"#,
        )
        .unwrap();

        let product = seed.products.into_iter().next().unwrap().into_new_product();
        assert!(product.storage.is_empty());
        assert!(product.colors.is_empty());
        assert_eq!(product.image, None);
        assert_eq!(product.category, ProductCategory::ChargersAndCables);
    }

    #[test]
    fn test_rejects_unknown_category() {
        let result: Result<ProductSeed, _> = serde_yaml::from_str(
            r#"
products:
  - name: Toaster
    brand: Acme
    description: Not electronics
    price: "20"
    stock: 1
    category: Kitchen
"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_validation_messages() {
        let seed: ProductSeed = serde_yaml::from_str(
            r#"
products:
  - name: Broken
    brand: " "
    description: Bad values
    price: "-1.005"
    stock: -3
    category: Tablets
"#,
        )
        .unwrap();

        let errors = validate_seed(&seed);
        assert_eq!(errors.len(), 4);
        assert!(errors.iter().any(|e| e.contains("brand is blank")));
        assert!(errors.iter().any(|e| e.contains("stock is negative")));
    }
}
