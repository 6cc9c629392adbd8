//! Cart queries.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use dac_retail_core::{CartId, CartLineId, ProductId, UserId};

use super::PgUnitOfWork;
use crate::db::RepositoryError;
use crate::db::store::CartStore;
use crate::models::{Cart, CartLine};

#[derive(sqlx::FromRow)]
struct CartRow {
    id: CartId,
    user_id: UserId,
    created_at: DateTime<Utc>,
}

impl From<CartRow> for Cart {
    fn from(row: CartRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            created_at: row.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct CartLineRow {
    id: CartLineId,
    cart_id: CartId,
    product_id: ProductId,
    quantity: i32,
}

impl From<CartLineRow> for CartLine {
    fn from(row: CartLineRow) -> Self {
        Self {
            id: row.id,
            cart_id: row.cart_id,
            product_id: row.product_id,
            quantity: row.quantity,
        }
    }
}

#[async_trait]
impl CartStore for PgUnitOfWork {
    async fn find_cart(&mut self, user: UserId) -> Result<Option<Cart>, RepositoryError> {
        let row = sqlx::query_as::<_, CartRow>(
            "SELECT id, user_id, created_at FROM store.cart WHERE user_id = $1",
        )
        .bind(user)
        .fetch_optional(&mut *self.tx)
        .await?;
        Ok(row.map(Cart::from))
    }

    async fn lock_cart(&mut self, user: UserId) -> Result<Option<Cart>, RepositoryError> {
        let row = sqlx::query_as::<_, CartRow>(
            "SELECT id, user_id, created_at FROM store.cart WHERE user_id = $1 FOR UPDATE",
        )
        .bind(user)
        .fetch_optional(&mut *self.tx)
        .await?;
        Ok(row.map(Cart::from))
    }

    async fn get_or_create_cart(&mut self, user: UserId) -> Result<Cart, RepositoryError> {
        let row = sqlx::query_as::<_, CartRow>(
            r"
            INSERT INTO store.cart (user_id)
            VALUES ($1)
            ON CONFLICT (user_id) DO UPDATE SET user_id = EXCLUDED.user_id
            RETURNING id, user_id, created_at
            ",
        )
        .bind(user)
        .fetch_one(&mut *self.tx)
        .await?;
        Ok(row.into())
    }

    async fn cart_lines(&mut self, cart: CartId) -> Result<Vec<CartLine>, RepositoryError> {
        let rows = sqlx::query_as::<_, CartLineRow>(
            "SELECT id, cart_id, product_id, quantity FROM store.cart_line \
             WHERE cart_id = $1 ORDER BY id",
        )
        .bind(cart)
        .fetch_all(&mut *self.tx)
        .await?;
        Ok(rows.into_iter().map(CartLine::from).collect())
    }

    async fn add_to_line(
        &mut self,
        cart: CartId,
        product: ProductId,
        quantity: i32,
    ) -> Result<CartLine, RepositoryError> {
        let row = sqlx::query_as::<_, CartLineRow>(
            r"
            INSERT INTO store.cart_line (cart_id, product_id, quantity)
            VALUES ($1, $2, $3)
            ON CONFLICT (cart_id, product_id)
                DO UPDATE SET quantity = store.cart_line.quantity + EXCLUDED.quantity
            RETURNING id, cart_id, product_id, quantity
            ",
        )
        .bind(cart)
        .bind(product)
        .bind(quantity)
        .fetch_one(&mut *self.tx)
        .await?;
        Ok(row.into())
    }

    async fn remove_line(
        &mut self,
        cart: CartId,
        product: ProductId,
    ) -> Result<bool, RepositoryError> {
        let result =
            sqlx::query("DELETE FROM store.cart_line WHERE cart_id = $1 AND product_id = $2")
                .bind(cart)
                .bind(product)
                .execute(&mut *self.tx)
                .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn clear_cart(&mut self, cart: CartId) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM store.cart_line WHERE cart_id = $1")
            .bind(cart)
            .execute(&mut *self.tx)
            .await?;
        Ok(())
    }
}
