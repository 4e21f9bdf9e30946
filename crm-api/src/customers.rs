use axum::{
    extract::{Query, State},
    routing::{get, post},
    Json, Router,
};
use crm_core::repository::{split_order_by, Page};
use crm_core::{BulkCreateResult, BulkCustomerRow, CreateCustomerInput, Customer, CustomerFilter};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct CustomerMutationResponse {
    pub customer: Option<Customer>,
    pub success: bool,
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct BulkCreateRequest {
    pub customers: Vec<BulkCustomerRow>,
}

#[derive(Debug, Deserialize)]
pub struct ListCustomersQuery {
    pub order_by: Option<String>,
    pub name: Option<String>,
    pub email: Option<String>,
}

// ============================================================================
// Handlers
// ============================================================================

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/customers", post(create_customer).get(list_customers))
        .route("/customers/bulk", post(bulk_create_customers))
}

/// POST /customers
async fn create_customer(
    State(state): State<AppState>,
    Json(req): Json<CreateCustomerInput>,
) -> Result<Json<CustomerMutationResponse>, AppError> {
    let result = state.customers.create_customer(req).await?;

    Ok(Json(CustomerMutationResponse {
        customer: result.record,
        success: result.success,
        message: result.message,
    }))
}

/// POST /customers/bulk
async fn bulk_create_customers(
    State(state): State<AppState>,
    Json(req): Json<BulkCreateRequest>,
) -> Result<Json<BulkCreateResult>, AppError> {
    let result = state.customers.bulk_create_customers(req.customers).await?;
    Ok(Json(result))
}

/// GET /customers
async fn list_customers(
    State(state): State<AppState>,
    Query(query): Query<ListCustomersQuery>,
) -> Result<Json<Page<Customer>>, AppError> {
    let filter = CustomerFilter {
        name: query.name,
        email: query.email,
    };
    let order_by = split_order_by(query.order_by.as_deref());

    let page = state.customers.list_customers(&filter, &order_by).await?;
    Ok(Json(page))
}
