use async_trait::async_trait;
use crm_core::{CoreResult, SortKey};
use uuid::Uuid;

use crate::models::{NewOrder, Order, OrderFilter};

/// Repository trait for order data access
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Inserts the order row and its product links in one transaction.
    async fn create_order(&self, order: &NewOrder) -> CoreResult<Order>;

    async fn get_order(&self, id: Uuid) -> CoreResult<Option<Order>>;

    async fn list_orders(&self, filter: &OrderFilter, order_by: &[SortKey]) -> CoreResult<Vec<Order>>;

    async fn list_customer_orders(&self, customer_id: Uuid) -> CoreResult<Vec<Order>>;
}
