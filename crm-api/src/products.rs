use axum::{
    extract::{Query, State},
    routing::post,
    Json, Router,
};
use crm_catalog::{CreateProductInput, Product, ProductFilter, RestockReport};
use crm_core::repository::{split_order_by, Page};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Serialize, Deserialize)]
pub struct ProductMutationResponse {
    pub product: Option<Product>,
    pub success: bool,
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct ListProductsQuery {
    pub order_by: Option<String>,
    pub name: Option<String>,
    pub price_gte: Option<Decimal>,
    pub price_lte: Option<Decimal>,
    pub stock_lt: Option<i32>,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/products", post(create_product).get(list_products))
        .route("/products/restock", post(restock_low_stock))
}

/// POST /products
async fn create_product(
    State(state): State<AppState>,
    Json(req): Json<CreateProductInput>,
) -> Result<Json<ProductMutationResponse>, AppError> {
    let result = state.products.create_product(req).await?;

    Ok(Json(ProductMutationResponse {
        product: result.record,
        success: result.success,
        message: result.message,
    }))
}

/// POST /products/restock
async fn restock_low_stock(State(state): State<AppState>) -> Result<Json<RestockReport>, AppError> {
    let report = state.restock.update_low_stock_products().await?;
    tracing::info!(updated = report.updated_products.len(), "{}", report.message);
    Ok(Json(report))
}

/// GET /products
async fn list_products(
    State(state): State<AppState>,
    Query(query): Query<ListProductsQuery>,
) -> Result<Json<Page<Product>>, AppError> {
    let filter = ProductFilter {
        name: query.name,
        price_gte: query.price_gte,
        price_lte: query.price_lte,
        stock_lt: query.stock_lt,
    };
    let order_by = split_order_by(query.order_by.as_deref());

    let page = state.products.list_products(&filter, &order_by).await?;
    Ok(Json(page))
}
