//! Catalog reads and seeding.

use std::sync::Arc;

use tracing::instrument;

use dac_retail_core::{CategoryId, ProductId};

use super::CommerceError;
use crate::db::Store;
use crate::models::{Category, NewProduct, Product};

/// Read access to categories and products, plus upserts for seeding.
#[derive(Clone)]
pub struct CatalogService {
    store: Arc<dyn Store>,
}

impl CatalogService {
    #[must_use]
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// # Errors
    ///
    /// Returns `Persistence` if the store fails.
    pub async fn list_categories(&self) -> Result<Vec<Category>, CommerceError> {
        let mut uow = self.store.begin().await?;
        Ok(uow.list_categories().await?)
    }

    /// A category together with its products.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown category.
    #[instrument(skip(self), fields(category_id = %id))]
    pub async fn category_products(
        &self,
        id: CategoryId,
    ) -> Result<(Category, Vec<Product>), CommerceError> {
        let mut uow = self.store.begin().await?;
        let category = uow
            .get_category(id)
            .await?
            .ok_or_else(|| CommerceError::not_found(format!("category {id}")))?;
        let products = uow.list_products(Some(id)).await?;
        Ok((category, products))
    }

    /// # Errors
    ///
    /// Returns `Persistence` if the store fails.
    pub async fn list_products(&self) -> Result<Vec<Product>, CommerceError> {
        let mut uow = self.store.begin().await?;
        Ok(uow.list_products(None).await?)
    }

    /// # Errors
    ///
    /// Returns `NotFound` for an unknown product.
    pub async fn get_product(&self, id: ProductId) -> Result<Product, CommerceError> {
        let mut uow = self.store.begin().await?;
        uow.get_product(id)
            .await?
            .ok_or_else(|| CommerceError::not_found(format!("product {id}")))
    }

    /// Insert a category, or return the one with this name.
    ///
    /// # Errors
    ///
    /// Returns `Validation` for a blank name.
    pub async fn upsert_category(&self, name: &str) -> Result<Category, CommerceError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(CommerceError::Validation(
                "category name cannot be empty".to_owned(),
            ));
        }
        let mut uow = self.store.begin().await?;
        let category = uow.upsert_category(name).await?;
        uow.commit().await?;
        Ok(category)
    }

    /// Insert or replace a product.
    ///
    /// # Errors
    ///
    /// Returns `Validation` for a negative price or stock, or a size that
    /// does not belong to its family, and `NotFound` for an unknown category.
    #[instrument(skip(self, product), fields(name = %product.name))]
    pub async fn upsert_product(&self, product: &NewProduct) -> Result<Product, CommerceError> {
        validate_product(product)?;

        let mut uow = self.store.begin().await?;
        if uow.get_category(product.category_id).await?.is_none() {
            return Err(CommerceError::not_found(format!(
                "category {}",
                product.category_id
            )));
        }
        let stored = uow.upsert_product(product).await?;
        uow.commit().await?;
        Ok(stored)
    }
}

fn validate_product(product: &NewProduct) -> Result<(), CommerceError> {
    if product.name.trim().is_empty() {
        return Err(CommerceError::Validation(
            "product name cannot be empty".to_owned(),
        ));
    }
    if product.price.is_negative() {
        return Err(CommerceError::Validation(format!(
            "{}: price cannot be negative",
            product.name
        )));
    }
    if product.quantity_available < 0 {
        return Err(CommerceError::Validation(format!(
            "{}: quantity_available cannot be negative",
            product.name
        )));
    }
    if let Some(bad) = product.sizes.iter().find(|s| !s.kind.allows(&s.size)) {
        return Err(CommerceError::Validation(format!(
            "{}: {} is not a valid {} size",
            product.name, bad.size, bad.kind
        )));
    }
    Ok(())
}
