//! Catalog queries.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};

use dac_retail_core::{CategoryId, Price, ProductId, SizeKind};

use super::PgUnitOfWork;
use crate::db::RepositoryError;
use crate::db::store::CatalogStore;
use crate::models::{Category, NewProduct, Product, ProductSize};

#[derive(sqlx::FromRow)]
struct CategoryRow {
    id: CategoryId,
    name: String,
}

impl From<CategoryRow> for Category {
    fn from(row: CategoryRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
        }
    }
}

#[derive(sqlx::FromRow)]
struct ProductRow {
    id: ProductId,
    category_id: CategoryId,
    name: String,
    description: String,
    price: Price,
    quantity_available: i32,
    image: Option<String>,
    seller: String,
    brand_name: String,
    listing_date: NaiveDate,
    manufacturing_date: Option<NaiveDate>,
    expiry_date: Option<NaiveDate>,
    highlights: String,
    color: Option<String>,
    fabric: Option<String>,
    created_at: DateTime<Utc>,
}

impl ProductRow {
    fn into_product(self, sizes: Vec<ProductSize>) -> Product {
        Product {
            id: self.id,
            category_id: self.category_id,
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
            sizes,
            created_at: self.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct SizeRow {
    product_id: ProductId,
    kind: SizeKind,
    size: String,
}

impl PgUnitOfWork {
    /// Load the size variants of `rows` and build products.
    async fn with_sizes(&mut self, rows: Vec<ProductRow>) -> Result<Vec<Product>, RepositoryError> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<i32> = rows.iter().map(|r| r.id.as_i32()).collect();
        let size_rows = sqlx::query_as::<_, SizeRow>(
            "SELECT product_id, kind, size FROM store.product_size \
             WHERE product_id = ANY($1) ORDER BY kind, size",
        )
        .bind(&ids)
        .fetch_all(&mut *self.tx)
        .await?;

        let mut sizes: HashMap<ProductId, Vec<ProductSize>> = HashMap::new();
        for row in size_rows {
            sizes.entry(row.product_id).or_default().push(ProductSize {
                kind: row.kind,
                size: row.size,
            });
        }

        Ok(rows
            .into_iter()
            .map(|row| {
                let product_sizes = sizes.remove(&row.id).unwrap_or_default();
                row.into_product(product_sizes)
            })
            .collect())
    }
}

#[async_trait]
impl CatalogStore for PgUnitOfWork {
    async fn list_categories(&mut self) -> Result<Vec<Category>, RepositoryError> {
        let rows = sqlx::query_as::<_, CategoryRow>(
            "SELECT id, name FROM store.product_category ORDER BY name, id",
        )
        .fetch_all(&mut *self.tx)
        .await?;
        Ok(rows.into_iter().map(Category::from).collect())
    }

    async fn get_category(&mut self, id: CategoryId) -> Result<Option<Category>, RepositoryError> {
        let row = sqlx::query_as::<_, CategoryRow>(
            "SELECT id, name FROM store.product_category WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await?;
        Ok(row.map(Category::from))
    }

    async fn upsert_category(&mut self, name: &str) -> Result<Category, RepositoryError> {
        // DO UPDATE so RETURNING yields the existing row on conflict.
        let row = sqlx::query_as::<_, CategoryRow>(
            r"
            INSERT INTO store.product_category (name)
            VALUES ($1)
            ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name
            RETURNING id, name
            ",
        )
        .bind(name)
        .fetch_one(&mut *self.tx)
        .await?;
        Ok(row.into())
    }

    async fn list_products(
        &mut self,
        category: Option<CategoryId>,
    ) -> Result<Vec<Product>, RepositoryError> {
        let rows = sqlx::query_as::<_, ProductRow>(
            r"
            SELECT id, category_id, name, description, price, quantity_available, image,
                   seller, brand_name, listing_date, manufacturing_date, expiry_date,
                   highlights, color, fabric, created_at
            FROM store.product
            WHERE $1::INTEGER IS NULL OR category_id = $1
            ORDER BY id
            ",
        )
        .bind(category)
        .fetch_all(&mut *self.tx)
        .await?;
        self.with_sizes(rows).await
    }

    async fn get_product(&mut self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(
            r"
            SELECT id, category_id, name, description, price, quantity_available, image,
                   seller, brand_name, listing_date, manufacturing_date, expiry_date,
                   highlights, color, fabric, created_at
            FROM store.product
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await?;
        match row {
            Some(row) => Ok(self.with_sizes(vec![row]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn upsert_product(&mut self, product: &NewProduct) -> Result<Product, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(
            r"
            INSERT INTO store.product (
                category_id, name, description, price, quantity_available, image, seller,
                brand_name, listing_date, manufacturing_date, expiry_date, highlights, color, fabric
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            ON CONFLICT (category_id, name) DO UPDATE SET
                description = EXCLUDED.description,
                price = EXCLUDED.price,
                quantity_available = EXCLUDED.quantity_available,
                image = EXCLUDED.image,
                seller = EXCLUDED.seller,
                brand_name = EXCLUDED.brand_name,
                listing_date = EXCLUDED.listing_date,
                manufacturing_date = EXCLUDED.manufacturing_date,
                expiry_date = EXCLUDED.expiry_date,
                highlights = EXCLUDED.highlights,
                color = EXCLUDED.color,
                fabric = EXCLUDED.fabric
            RETURNING id, category_id, name, description, price, quantity_available, image,
                seller, brand_name, listing_date, manufacturing_date, expiry_date,
                highlights, color, fabric, created_at
            ",
        )
        .bind(product.category_id)
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.price)
        .bind(product.quantity_available)
        .bind(&product.image)
        .bind(&product.seller)
        .bind(&product.brand_name)
        .bind(product.listing_date)
        .bind(product.manufacturing_date)
        .bind(product.expiry_date)
        .bind(&product.highlights)
        .bind(&product.color)
        .bind(&product.fabric)
        .fetch_one(&mut *self.tx)
        .await?;

        sqlx::query("DELETE FROM store.product_size WHERE product_id = $1")
            .bind(row.id)
            .execute(&mut *self.tx)
            .await?;
        for size in &product.sizes {
            sqlx::query(
                "INSERT INTO store.product_size (product_id, kind, size) VALUES ($1, $2, $3) \
                 ON CONFLICT DO NOTHING",
            )
            .bind(row.id)
            .bind(size.kind)
            .bind(&size.size)
            .execute(&mut *self.tx)
            .await?;
        }

        self.with_sizes(vec![row])
            .await?
            .pop()
            .ok_or(RepositoryError::NotFound)
    }

    async fn lock_products(&mut self, ids: &[ProductId]) -> Result<Vec<Product>, RepositoryError> {
        let mut ids: Vec<i32> = ids.iter().map(ProductId::as_i32).collect();
        ids.sort_unstable();
        ids.dedup();
        let rows = sqlx::query_as::<_, ProductRow>(
            r"
            SELECT id, category_id, name, description, price, quantity_available, image,
                   seller, brand_name, listing_date, manufacturing_date, expiry_date,
                   highlights, color, fabric, created_at
            FROM store.product
            WHERE id = ANY($1)
            ORDER BY id
            FOR UPDATE
            ",
        )
        .bind(&ids)
        .fetch_all(&mut *self.tx)
        .await?;
        self.with_sizes(rows).await
    }

    async fn adjust_stock(&mut self, id: ProductId, delta: i32) -> Result<i32, RepositoryError> {
        let quantity: Option<i32> = sqlx::query_scalar(
            r"
            UPDATE store.product
            SET quantity_available = quantity_available + $2
            WHERE id = $1
            RETURNING quantity_available
            ",
        )
        .bind(id)
        .bind(delta)
        .fetch_optional(&mut *self.tx)
        .await?;
        quantity.ok_or(RepositoryError::NotFound)
    }
}
