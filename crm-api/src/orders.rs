use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use crm_core::repository::{split_order_by, Page};
use crm_order::{CreateOrderInput, Order, OrderFilter, OrderOutcome};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::{status_for, AppError};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ListOrdersQuery {
    pub order_by: Option<String>,
    pub order_date_gte: Option<DateTime<Utc>>,
    pub order_date_lte: Option<DateTime<Utc>>,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/orders", get(list_orders).post(create_order))
        .route("/orders/{id}", get(get_order))
}

/// POST /orders
///
/// 201 with the created order, or the status matching the rejection kind with
/// the failed outcome as body.
async fn create_order(
    State(state): State<AppState>,
    Json(req): Json<CreateOrderInput>,
) -> Result<Response, AppError> {
    let outcome = state.orders.create_order(req).await?;

    let status = match &outcome {
        OrderOutcome::Created { .. } => StatusCode::CREATED,
        OrderOutcome::Failed { kind, .. } => status_for(*kind),
    };
    Ok((status, Json(outcome)).into_response())
}

/// GET /orders/{id}
async fn get_order(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<Json<Order>, AppError> {
    let order = state.orders.get_order(id).await?;
    Ok(Json(order))
}

/// GET /orders
async fn list_orders(
    State(state): State<AppState>,
    Query(query): Query<ListOrdersQuery>,
) -> Result<Json<Page<Order>>, AppError> {
    if let (Some(from), Some(to)) = (query.order_date_gte, query.order_date_lte) {
        if from > to {
            return Err(AppError::ValidationError(
                "order_date_gte must not be after order_date_lte".to_string(),
            ));
        }
    }

    let filter = OrderFilter {
        order_date_gte: query.order_date_gte,
        order_date_lte: query.order_date_lte,
    };
    let order_by = split_order_by(query.order_by.as_deref());

    let page = state.orders.list_orders(&filter, &order_by).await?;
    Ok(Json(page))
}
