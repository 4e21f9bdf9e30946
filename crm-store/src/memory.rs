//! In-process store backing all three repositories, for tests and `storage.backend = "memory"`.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use crm_catalog::{NewProduct, Product, ProductFilter, ProductRepository};
use crm_core::repository::sort_records;
use crm_core::{CoreError, CoreResult, Customer, CustomerFilter, CustomerRepository, NewCustomer, SortKey};
use crm_order::{CustomerSummary, NewOrder, Order, OrderFilter, OrderRepository};
use rust_decimal::Decimal;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Debug, Clone)]
struct OrderRecord {
    id: Uuid,
    customer_id: Uuid,
    product_ids: Vec<Uuid>,
    total_amount: Decimal,
    order_date: DateTime<Utc>,
}

/// Rows are kept in insertion order.
#[derive(Debug, Default)]
struct MemoryState {
    customers: Vec<Customer>,
    products: Vec<Product>,
    orders: Vec<OrderRecord>,
}

impl MemoryState {
    fn email_taken(&self, email: &str) -> bool {
        self.customers.iter().any(|c| c.email == email)
    }

    fn hydrate(&self, record: &OrderRecord) -> Option<Order> {
        let customer = self.customers.iter().find(|c| c.id == record.customer_id)?;
        let products = record
            .product_ids
            .iter()
            .filter_map(|id| self.products.iter().find(|p| p.id == *id).cloned())
            .collect();

        Some(Order {
            id: record.id,
            customer: CustomerSummary::from(customer),
            products,
            total_amount: record.total_amount,
            order_date: record.order_date,
        })
    }
}

#[derive(Clone, Default)]
pub struct InMemoryStore {
    state: Arc<RwLock<MemoryState>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn build_customer(customer: &NewCustomer) -> Customer {
    Customer {
        id: Uuid::new_v4(),
        name: customer.name.clone(),
        nickname: customer.nickname.clone(),
        email: customer.email.clone(),
        phone: customer.phone.clone(),
        created_at: Utc::now(),
    }
}

#[async_trait]
impl CustomerRepository for InMemoryStore {
    async fn create_customer(&self, customer: &NewCustomer) -> CoreResult<Customer> {
        let mut state = self.state.write().await;
        if state.email_taken(&customer.email) {
            return Err(CoreError::ConflictError(format!("Email already exists: {}", customer.email)));
        }

        let created = build_customer(customer);
        state.customers.push(created.clone());
        Ok(created)
    }

    async fn create_customers(&self, customers: &[NewCustomer]) -> CoreResult<Vec<Customer>> {
        let mut state = self.state.write().await;

        // Check the whole batch before touching state so a conflict stores nothing.
        for (idx, customer) in customers.iter().enumerate() {
            let repeated = customers[..idx].iter().any(|c| c.email == customer.email);
            if repeated || state.email_taken(&customer.email) {
                return Err(CoreError::ConflictError(format!("Email already exists: {}", customer.email)));
            }
        }

        let created: Vec<Customer> = customers.iter().map(build_customer).collect();
        state.customers.extend(created.iter().cloned());
        Ok(created)
    }

    async fn get_customer(&self, id: Uuid) -> CoreResult<Option<Customer>> {
        let state = self.state.read().await;
        Ok(state.customers.iter().find(|c| c.id == id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> CoreResult<Option<Customer>> {
        let state = self.state.read().await;
        Ok(state.customers.iter().find(|c| c.email == email).cloned())
    }

    async fn email_exists(&self, email: &str) -> CoreResult<bool> {
        Ok(self.state.read().await.email_taken(email))
    }

    async fn list_customers(&self, filter: &CustomerFilter, order_by: &[SortKey]) -> CoreResult<Vec<Customer>> {
        let state = self.state.read().await;
        let mut customers: Vec<Customer> = state.customers.iter().filter(|c| filter.matches(c)).cloned().collect();
        sort_records(&mut customers, order_by);
        Ok(customers)
    }
}

#[async_trait]
impl ProductRepository for InMemoryStore {
    async fn create_product(&self, product: &NewProduct) -> CoreResult<Product> {
        let created = Product {
            id: Uuid::new_v4(),
            name: product.name.clone(),
            price: product.price,
            stock: product.stock,
        };
        self.state.write().await.products.push(created.clone());
        Ok(created)
    }

    async fn get_product(&self, id: Uuid) -> CoreResult<Option<Product>> {
        let state = self.state.read().await;
        Ok(state.products.iter().find(|p| p.id == id).cloned())
    }

    async fn get_products(&self, ids: &[Uuid]) -> CoreResult<Vec<Product>> {
        let state = self.state.read().await;
        Ok(state.products.iter().filter(|p| ids.contains(&p.id)).cloned().collect())
    }

    async fn find_by_name(&self, name: &str) -> CoreResult<Option<Product>> {
        let state = self.state.read().await;
        Ok(state.products.iter().find(|p| p.name == name).cloned())
    }

    async fn list_products(&self, filter: &ProductFilter, order_by: &[SortKey]) -> CoreResult<Vec<Product>> {
        let state = self.state.read().await;
        let mut products: Vec<Product> = state.products.iter().filter(|p| filter.matches(p)).cloned().collect();
        if order_by.is_empty() {
            sort_records(&mut products, &[SortKey::asc("name")]);
        } else {
            sort_records(&mut products, order_by);
        }
        Ok(products)
    }

    async fn list_below_stock(&self, threshold: i32) -> CoreResult<Vec<Product>> {
        let state = self.state.read().await;
        let mut products: Vec<Product> = state.products.iter().filter(|p| p.stock < threshold).cloned().collect();
        sort_records(&mut products, &[SortKey::asc("name")]);
        Ok(products)
    }

    async fn update_stock(&self, id: Uuid, stock: i32) -> CoreResult<Product> {
        if stock < 0 {
            return Err(CoreError::ValidationError("Stock cannot be negative.".to_string()));
        }

        let mut state = self.state.write().await;
        let product = state
            .products
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| CoreError::NotFound(format!("Product {} does not exist", id)))?;
        product.stock = stock;
        Ok(product.clone())
    }
}

#[async_trait]
impl OrderRepository for InMemoryStore {
    async fn create_order(&self, order: &NewOrder) -> CoreResult<Order> {
        let mut state = self.state.write().await;

        if !state.customers.iter().any(|c| c.id == order.customer_id) {
            return Err(CoreError::NotFound(format!("Customer {} does not exist", order.customer_id)));
        }
        if let Some(missing) = order.product_ids.iter().find(|id| !state.products.iter().any(|p| p.id == **id)) {
            return Err(CoreError::NotFound(format!("Product {} does not exist", missing)));
        }

        let record = OrderRecord {
            id: Uuid::new_v4(),
            customer_id: order.customer_id,
            product_ids: order.product_ids.clone(),
            total_amount: order.total_amount,
            order_date: order.order_date,
        };
        let created = state
            .hydrate(&record)
            .ok_or_else(|| CoreError::InternalError(format!("Order {} could not be assembled", record.id)))?;
        state.orders.push(record);
        Ok(created)
    }

    async fn get_order(&self, id: Uuid) -> CoreResult<Option<Order>> {
        let state = self.state.read().await;
        Ok(state.orders.iter().find(|o| o.id == id).and_then(|o| state.hydrate(o)))
    }

    async fn list_orders(&self, filter: &OrderFilter, order_by: &[SortKey]) -> CoreResult<Vec<Order>> {
        let state = self.state.read().await;
        let mut orders: Vec<Order> = state
            .orders
            .iter()
            .filter(|o| filter.matches(o.order_date))
            .filter_map(|o| state.hydrate(o))
            .collect();
        if order_by.is_empty() {
            sort_records(&mut orders, &[SortKey::desc("order_date")]);
        } else {
            sort_records(&mut orders, order_by);
        }
        Ok(orders)
    }

    async fn list_customer_orders(&self, customer_id: Uuid) -> CoreResult<Vec<Order>> {
        let state = self.state.read().await;
        let mut orders: Vec<Order> = state
            .orders
            .iter()
            .filter(|o| o.customer_id == customer_id)
            .filter_map(|o| state.hydrate(o))
            .collect();
        sort_records(&mut orders, &[SortKey::desc("order_date")]);
        Ok(orders)
    }
}
