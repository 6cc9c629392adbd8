//! Cart operations.

use std::sync::Arc;

use tracing::instrument;

use dac_retail_core::{ProductId, UserId};

use super::CommerceError;
use crate::db::Store;
use crate::models::{CartItemView, CartLine, CartView};

/// Per-user cart management.
#[derive(Clone)]
pub struct CartService {
    store: Arc<dyn Store>,
}

impl CartService {
    #[must_use]
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Add `quantity` of a product, creating the cart and line as needed.
    ///
    /// # Errors
    ///
    /// Returns `Validation` for a quantity below 1 or a line total that would
    /// overflow, and `NotFound` for an unknown product.
    #[instrument(skip(self), fields(user_id = %user, product_id = %product))]
    pub async fn add_line(
        &self,
        user: UserId,
        product: ProductId,
        quantity: i32,
    ) -> Result<CartLine, CommerceError> {
        if quantity < 1 {
            return Err(CommerceError::Validation(
                "quantity must be at least 1".to_owned(),
            ));
        }

        let mut uow = self.store.begin().await?;
        if uow.get_product(product).await?.is_none() {
            return Err(CommerceError::not_found(format!("product {product}")));
        }
        let cart = uow.get_or_create_cart(user).await?;
        // Concurrent adds to the same cart queue here
        uow.lock_cart(user).await?;
        let in_cart = uow
            .cart_lines(cart.id)
            .await?
            .into_iter()
            .find(|line| line.product_id == product)
            .map_or(0, |line| line.quantity);
        if in_cart.checked_add(quantity).is_none() {
            return Err(CommerceError::Validation(format!(
                "cart cannot hold more than {} of one product",
                i32::MAX
            )));
        }
        let line = uow.add_to_line(cart.id, product, quantity).await?;
        uow.commit().await?;

        tracing::info!(quantity = line.quantity, "Cart line updated");
        Ok(line)
    }

    /// Remove a product's line from the cart.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the user has no cart or no line for `product`.
    #[instrument(skip(self), fields(user_id = %user, product_id = %product))]
    pub async fn remove_line(&self, user: UserId, product: ProductId) -> Result<(), CommerceError> {
        let mut uow = self.store.begin().await?;
        let cart = uow
            .find_cart(user)
            .await?
            .ok_or_else(|| CommerceError::not_found("cart"))?;
        if !uow.remove_line(cart.id, product).await? {
            return Err(CommerceError::not_found(format!("cart line for product {product}")));
        }
        uow.commit().await?;
        Ok(())
    }

    /// The user's cart with current prices and a subtotal.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the user has no cart.
    pub async fn get_cart(&self, user: UserId) -> Result<CartView, CommerceError> {
        let mut uow = self.store.begin().await?;
        let cart = uow
            .find_cart(user)
            .await?
            .ok_or_else(|| CommerceError::not_found("cart"))?;

        let mut items = Vec::new();
        for line in uow.cart_lines(cart.id).await? {
            if let Some(product) = uow.get_product(line.product_id).await? {
                items.push(CartItemView::new(&line, &product));
            }
        }
        Ok(CartView::new(items))
    }

    /// One line of the user's cart.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if there is no cart or no line for `product`.
    pub async fn get_line(
        &self,
        user: UserId,
        product: ProductId,
    ) -> Result<CartItemView, CommerceError> {
        let mut uow = self.store.begin().await?;
        let not_found = || CommerceError::not_found(format!("cart line for product {product}"));
        let cart = uow.find_cart(user).await?.ok_or_else(not_found)?;
        let line = uow
            .cart_lines(cart.id)
            .await?
            .into_iter()
            .find(|line| line.product_id == product)
            .ok_or_else(not_found)?;
        let product = uow.get_product(product).await?.ok_or_else(not_found)?;
        Ok(CartItemView::new(&line, &product))
    }
}
