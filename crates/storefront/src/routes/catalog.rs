//! Catalog route handlers.

use axum::{Json, extract::State};
use serde::Serialize;

use dac_retail_core::{CategoryId, ProductId};

use crate::error::Result;
use crate::extract::ApiPath;
use crate::models::{Category, Product};
use crate::state::AppState;

/// A category with its products.
#[derive(Debug, Serialize)]
pub struct CategoryProducts {
    pub category: Category,
    pub products: Vec<Product>,
}

/// Everything the landing page shows.
#[derive(Debug, Serialize)]
pub struct Home {
    pub products: Vec<Product>,
    pub categories: Vec<Category>,
}

/// All products and categories in one response.
pub async fn home(State(state): State<AppState>) -> Result<Json<Home>> {
    let catalog = state.catalog();
    Ok(Json(Home {
        products: catalog.list_products().await?,
        categories: catalog.list_categories().await?,
    }))
}

/// List all categories.
pub async fn categories(State(state): State<AppState>) -> Result<Json<Vec<Category>>> {
    Ok(Json(state.catalog().list_categories().await?))
}

/// Show a category and the products in it.
pub async fn category_products(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<CategoryId>,
) -> Result<Json<CategoryProducts>> {
    let (category, products) = state.catalog().category_products(id).await?;
    Ok(Json(CategoryProducts { category, products }))
}

/// List all products.
pub async fn products(State(state): State<AppState>) -> Result<Json<Vec<Product>>> {
    Ok(Json(state.catalog().list_products().await?))
}

/// Product detail.
pub async fn product(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<ProductId>,
) -> Result<Json<Product>> {
    Ok(Json(state.catalog().get_product(id).await?))
}
