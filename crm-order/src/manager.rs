use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use crm_catalog::ProductRepository;
use crm_core::repository::{parse_order_by, Page};
use crm_core::{CoreError, CoreResult, CustomerRepository, ErrorKind};
use crm_shared::models::events::OrderCreatedEvent;
use crm_shared::DomainEvent;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::models::{calculate_total, NewOrder, Order, OrderFilter, ORDER_TOTAL_MAX};
use crate::repository::OrderRepository;

#[derive(Debug, Clone, Deserialize)]
pub struct CreateOrderInput {
    pub customer_id: Uuid,
    pub product_ids: Vec<Uuid>,
    pub order_date: Option<DateTime<Utc>>,
}

/// Result of an order creation attempt. Rejections carry the error kind so callers
/// can tell a missing customer from a bad product list.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum OrderOutcome {
    Created { order: Order },
    Failed { kind: ErrorKind, message: String },
}

impl OrderOutcome {
    pub fn failed(err: &CoreError) -> Self {
        OrderOutcome::Failed {
            kind: err.kind(),
            message: err.to_string(),
        }
    }

    pub fn order(&self) -> Option<&Order> {
        match self {
            OrderOutcome::Created { order } => Some(order),
            OrderOutcome::Failed { .. } => None,
        }
    }
}

/// Order workflows over injected customer, product and order repositories.
pub struct OrderManager {
    customers: Arc<dyn CustomerRepository>,
    products: Arc<dyn ProductRepository>,
    orders: Arc<dyn OrderRepository>,
}

impl OrderManager {
    pub fn new(
        customers: Arc<dyn CustomerRepository>,
        products: Arc<dyn ProductRepository>,
        orders: Arc<dyn OrderRepository>,
    ) -> Self {
        Self { customers, products, orders }
    }

    /// Resolves the customer and the full product set before anything is written,
    /// so a rejected request leaves no order behind.
    #[instrument(skip_all, fields(customer_id = %input.customer_id, products = input.product_ids.len()))]
    pub async fn create_order(&self, input: CreateOrderInput) -> CoreResult<OrderOutcome> {
        let draft = match self.resolve(&input).await {
            Ok(draft) => draft,
            Err(e) if e.is_internal() => return Err(e),
            Err(e) => {
                warn!(kind = ?e.kind(), "Order rejected: {}", e);
                return Ok(OrderOutcome::failed(&e));
            }
        };

        let order = self.orders.create_order(&draft).await?;

        info!(order_id = %order.id, total = %order.total_amount, "Order created");
        DomainEvent::OrderCreated(OrderCreatedEvent {
            order_id: order.id,
            customer_id: order.customer.id,
            product_count: order.products.len(),
            total_amount: order.total_amount,
            order_date: order.order_date,
        })
        .emit();

        Ok(OrderOutcome::Created { order })
    }

    pub async fn get_order(&self, id: Uuid) -> CoreResult<Order> {
        self.orders
            .get_order(id)
            .await?
            .ok_or_else(|| CoreError::NotFound(format!("Order {} does not exist", id)))
    }

    pub async fn list_orders(&self, filter: &OrderFilter, order_by: &[String]) -> CoreResult<Page<Order>> {
        let keys = parse_order_by::<Order>(order_by)?;
        let orders = self.orders.list_orders(filter, &keys).await?;
        Ok(Page::new(orders))
    }

    async fn resolve(&self, input: &CreateOrderInput) -> CoreResult<NewOrder> {
        if input.product_ids.is_empty() {
            return Err(CoreError::ValidationError("At least one product is required".to_string()));
        }

        if self.customers.get_customer(input.customer_id).await?.is_none() {
            return Err(CoreError::NotFound(format!("Customer {} does not exist", input.customer_id)));
        }

        let mut products = self.products.get_products(&input.product_ids).await?;

        let resolved: HashSet<Uuid> = products.iter().map(|p| p.id).collect();
        let missing: Vec<String> = input
            .product_ids
            .iter()
            .filter(|id| !resolved.contains(id))
            .map(|id| id.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(CoreError::NotFound(format!("Products do not exist: {}", missing.join(", "))));
        }

        // Repeated ids collapse to one product each, so the counts differ.
        if products.len() != input.product_ids.len() {
            return Err(CoreError::PartialMatch {
                requested: input.product_ids.len(),
                resolved: products.len(),
            });
        }

        products.sort_by_key(|p| input.product_ids.iter().position(|id| *id == p.id));

        let total_amount = calculate_total(&products);
        if total_amount > ORDER_TOTAL_MAX {
            return Err(CoreError::ValidationError(format!(
                "Order total {} exceeds the maximum of {}",
                total_amount, ORDER_TOTAL_MAX
            )));
        }

        Ok(NewOrder {
            customer_id: input.customer_id,
            product_ids: products.iter().map(|p| p.id).collect(),
            total_amount,
            order_date: input.order_date.unwrap_or_else(Utc::now),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use crm_catalog::{NewProduct, Product, ProductFilter};
    use crm_core::{Customer, CustomerFilter, NewCustomer, SortKey};
    use rust_decimal::Decimal;

    use crate::models::CustomerSummary;

    struct OneCustomer(Customer);

    #[async_trait]
    impl CustomerRepository for OneCustomer {
        async fn create_customer(&self, _: &NewCustomer) -> CoreResult<Customer> {
            unimplemented!()
        }

        async fn create_customers(&self, _: &[NewCustomer]) -> CoreResult<Vec<Customer>> {
            unimplemented!()
        }

        async fn get_customer(&self, id: Uuid) -> CoreResult<Option<Customer>> {
            Ok(Some(self.0.clone()).filter(|c| c.id == id))
        }

        async fn find_by_email(&self, _: &str) -> CoreResult<Option<Customer>> {
            unimplemented!()
        }

        async fn email_exists(&self, _: &str) -> CoreResult<bool> {
            unimplemented!()
        }

        async fn list_customers(&self, _: &CustomerFilter, _: &[SortKey]) -> CoreResult<Vec<Customer>> {
            unimplemented!()
        }
    }

    struct FixedProducts(Vec<Product>);

    #[async_trait]
    impl ProductRepository for FixedProducts {
        async fn create_product(&self, _: &NewProduct) -> CoreResult<Product> {
            unimplemented!()
        }

        async fn get_product(&self, _: Uuid) -> CoreResult<Option<Product>> {
            unimplemented!()
        }

        async fn get_products(&self, ids: &[Uuid]) -> CoreResult<Vec<Product>> {
            Ok(self.0.iter().filter(|p| ids.contains(&p.id)).cloned().collect())
        }

        async fn find_by_name(&self, _: &str) -> CoreResult<Option<Product>> {
            unimplemented!()
        }

        async fn list_products(&self, _: &ProductFilter, _: &[SortKey]) -> CoreResult<Vec<Product>> {
            unimplemented!()
        }

        async fn list_below_stock(&self, _: i32) -> CoreResult<Vec<Product>> {
            unimplemented!()
        }

        async fn update_stock(&self, _: Uuid, _: i32) -> CoreResult<Product> {
            unimplemented!()
        }
    }

    /// Records every insert and echoes it back as an order.
    #[derive(Default)]
    struct RecordingOrders {
        inserted: Mutex<Vec<NewOrder>>,
    }

    #[async_trait]
    impl OrderRepository for RecordingOrders {
        async fn create_order(&self, order: &NewOrder) -> CoreResult<Order> {
            self.inserted.lock().unwrap().push(order.clone());
            Ok(Order {
                id: Uuid::new_v4(),
                customer: CustomerSummary { id: order.customer_id, name: String::new(), email: String::new() },
                products: vec![],
                total_amount: order.total_amount,
                order_date: order.order_date,
            })
        }

        async fn get_order(&self, _: Uuid) -> CoreResult<Option<Order>> {
            Ok(None)
        }

        async fn list_orders(&self, _: &OrderFilter, _: &[SortKey]) -> CoreResult<Vec<Order>> {
            Ok(vec![])
        }

        async fn list_customer_orders(&self, _: Uuid) -> CoreResult<Vec<Order>> {
            Ok(vec![])
        }
    }

    fn customer() -> Customer {
        Customer {
            id: Uuid::new_v4(),
            name: "Alice".to_string(),
            nickname: None,
            email: "alice@example.com".to_string(),
            phone: None,
            created_at: Utc::now(),
        }
    }

    fn products(count: usize, price: &str) -> Vec<Product> {
        (0..count)
            .map(|i| Product {
                id: Uuid::new_v4(),
                name: format!("Item {}", i),
                price: Decimal::from_str(price).unwrap(),
                stock: 1,
            })
            .collect()
    }

    fn manager(customer: &Customer, products: &[Product], orders: Arc<RecordingOrders>) -> OrderManager {
        OrderManager::new(
            Arc::new(OneCustomer(customer.clone())),
            Arc::new(FixedProducts(products.to_vec())),
            orders,
        )
    }

    #[tokio::test]
    async fn test_total_above_column_limit_is_rejected() {
        let alice = customer();
        let catalog = products(101, "99999999.99");
        let orders = Arc::new(RecordingOrders::default());

        let outcome = manager(&alice, &catalog, orders.clone())
            .create_order(CreateOrderInput {
                customer_id: alice.id,
                product_ids: catalog.iter().map(|p| p.id).collect(),
                order_date: None,
            })
            .await
            .unwrap();

        match outcome {
            OrderOutcome::Failed { kind, message } => {
                assert_eq!(kind, ErrorKind::Validation);
                assert!(message.contains("exceeds the maximum of 9999999999.99"), "{}", message);
            }
            other => panic!("expected rejection, got {:?}", other),
        }
        assert!(orders.inserted.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_total_at_column_limit_is_stored() {
        let alice = customer();
        let mut catalog = products(100, "99999999.99");
        catalog.extend(products(1, "0.99"));
        assert_eq!(calculate_total(&catalog), ORDER_TOTAL_MAX);
        let orders = Arc::new(RecordingOrders::default());

        let outcome = manager(&alice, &catalog, orders.clone())
            .create_order(CreateOrderInput {
                customer_id: alice.id,
                product_ids: catalog.iter().map(|p| p.id).collect(),
                order_date: None,
            })
            .await
            .unwrap();

        assert_eq!(outcome.order().unwrap().total_amount, ORDER_TOTAL_MAX);
        let inserted = orders.inserted.lock().unwrap();
        assert_eq!(inserted.len(), 1);
        assert_eq!(inserted[0].product_ids.len(), 101);
    }

    #[test]
    fn test_outcome_is_tagged() {
        let err = CoreError::PartialMatch { requested: 2, resolved: 1 };
        let value = serde_json::to_value(OrderOutcome::failed(&err)).unwrap();
        assert_eq!(value["status"], "failed");
        assert_eq!(value["kind"], "PARTIAL_MATCH");
        assert_eq!(value["message"], "Requested 2 products but only 1 matched");
    }
}
