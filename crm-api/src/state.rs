use std::sync::Arc;

use crm_catalog::{ProductService, RestockService};
use crm_core::CustomerService;
use crm_order::OrderManager;
use crm_store::Repositories;

#[derive(Clone)]
pub struct AppState {
    pub customers: Arc<CustomerService>,
    pub products: Arc<ProductService>,
    pub restock: Arc<RestockService>,
    pub orders: Arc<OrderManager>,
}

impl AppState {
    pub fn new(repos: &Repositories) -> Self {
        Self {
            customers: Arc::new(CustomerService::new(repos.customers.clone())),
            products: Arc::new(ProductService::new(repos.products.clone())),
            restock: Arc::new(RestockService::new(repos.products.clone())),
            orders: Arc::new(OrderManager::new(
                repos.customers.clone(),
                repos.products.clone(),
                repos.orders.clone(),
            )),
        }
    }
}
