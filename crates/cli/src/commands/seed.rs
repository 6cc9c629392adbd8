//! Seed the product catalog from a YAML file.
//!
//! Categories are keyed by name and products by `(category, name)`, so
//! running the same file twice leaves the catalog unchanged.
//!
//! ```yaml
//! categories:
//!   - name: Shirts
//!     products:
//!       - name: Oxford Shirt
//!         description: Cotton oxford shirt
//!         price: "1299.00"
//!         quantity_available: 25
//!         seller: Loom House
//!         brand_name: Loom
//!         listing_date: 2026-01-15
//!         highlights: Regular fit
//!         color: Blue
//!         fabric: Cotton
//!         sizes:
//!           - { kind: shirt, size: "38" }
//!           - { kind: shirt, size: "40" }
//! ```

use std::path::Path;
use std::sync::Arc;

use chrono::NaiveDate;
use serde::Deserialize;
use tracing::info;

use dac_retail_core::{CategoryId, Price};
use dac_retail_storefront::db::PgStore;
use dac_retail_storefront::models::{NewProduct, ProductSize};
use dac_retail_storefront::services::{CatalogService, CommerceError};

use super::ConnectError;

/// Errors that can occur while seeding.
#[derive(Debug, thiserror::Error)]
pub enum SeedError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("Invalid catalog file: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error(transparent)]
    Connect(#[from] ConnectError),

    #[error("Failed to seed {name}: {source}")]
    Catalog {
        name: String,
        source: CommerceError,
    },
}

/// Top level of a catalog file.
#[derive(Debug, Deserialize)]
pub struct CatalogFile {
    pub categories: Vec<SeedCategory>,
}

#[derive(Debug, Deserialize)]
pub struct SeedCategory {
    pub name: String,
    #[serde(default)]
    pub products: Vec<SeedProduct>,
}

#[derive(Debug, Deserialize)]
pub struct SeedProduct {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: Price,
    pub quantity_available: i32,
    pub image: Option<String>,
    pub seller: String,
    pub brand_name: String,
    pub listing_date: NaiveDate,
    pub manufacturing_date: Option<NaiveDate>,
    pub expiry_date: Option<NaiveDate>,
    #[serde(default)]
    pub highlights: String,
    pub color: Option<String>,
    pub fabric: Option<String>,
    #[serde(default)]
    pub sizes: Vec<ProductSize>,
}

impl SeedProduct {
    fn into_new_product(self, category_id: CategoryId) -> NewProduct {
        NewProduct {
            category_id,
            name: self.name,
            description: self.description,
            price: self.price,
            quantity_available: self.quantity_available,
            image: self.image,
            seller: self.seller,
            brand_name: self.brand_name,
            listing_date: self.listing_date,
            manufacturing_date: self.manufacturing_date,
            expiry_date: self.expiry_date,
            highlights: self.highlights,
            color: self.color,
            fabric: self.fabric,
            sizes: self.sizes,
        }
    }
}

/// Counts reported after a seeding run.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct SeedSummary {
    pub categories: usize,
    pub products: usize,
}

/// Parse a catalog file.
///
/// # Errors
///
/// Returns an error if the YAML does not match [`CatalogFile`].
pub fn parse_catalog(content: &str) -> Result<CatalogFile, SeedError> {
    Ok(serde_yaml::from_str(content)?)
}

/// Upsert every category and product in `file` through the catalog service.
///
/// # Errors
///
/// Stops at the first category or product the service rejects.
pub async fn apply(catalog: &CatalogService, file: CatalogFile) -> Result<SeedSummary, SeedError> {
    let mut summary = SeedSummary::default();

    for seed in file.categories {
        let category = catalog
            .upsert_category(&seed.name)
            .await
            .map_err(|source| SeedError::Catalog {
                name: seed.name.clone(),
                source,
            })?;
        summary.categories += 1;

        for product in seed.products {
            let name = product.name.clone();
            catalog
                .upsert_product(&product.into_new_product(category.id))
                .await
                .map_err(|source| SeedError::Catalog { name, source })?;
            summary.products += 1;
        }
    }

    Ok(summary)
}

/// Seed the catalog from a YAML file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, the database is
/// unreachable, or a product is invalid.
pub async fn catalog(path: &Path) -> Result<(), SeedError> {
    info!(path = %path.display(), "Loading catalog from file");

    // Read and validate YAML before connecting to database
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| SeedError::Read {
            path: path.display().to_string(),
            source,
        })?;
    let file = parse_catalog(&content)?;
    info!(categories = file.categories.len(), "Parsed catalog");

    let pool = super::connect().await?;
    let service = CatalogService::new(Arc::new(PgStore::new(pool)));

    let summary = apply(&service, file).await?;
    info!(
        categories = summary.categories,
        products = summary.products,
        "Seeding complete!"
    );
    Ok(())
}
