use std::sync::Arc;

use chrono::Utc;
use crm_core::{CoreError, CoreResult};
use crm_shared::models::events::ProductRestockedEvent;
use crm_shared::DomainEvent;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::product::{Product, ProductRepository};

/// Products with stock strictly below this are restocked.
pub const LOW_STOCK_THRESHOLD: i32 = 10;

/// Units added to each low-stock product.
pub const RESTOCK_INCREMENT: i32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RestockPolicy {
    pub threshold: i32,
    pub increment: i32,
}

impl Default for RestockPolicy {
    fn default() -> Self {
        Self {
            threshold: LOW_STOCK_THRESHOLD,
            increment: RESTOCK_INCREMENT,
        }
    }
}

impl RestockPolicy {
    pub fn needs_restock(&self, product: &Product) -> bool {
        product.stock < self.threshold
    }

    pub fn restocked_level(&self, stock: i32) -> CoreResult<i32> {
        stock
            .checked_add(self.increment)
            .ok_or_else(|| CoreError::ValidationError(format!("Stock overflow restocking from {}", stock)))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RestockReport {
    pub updated_products: Vec<Product>,
    pub message: String,
}

pub fn restock_message(updated: usize) -> String {
    if updated == 0 {
        "No products needed restocking.".to_string()
    } else {
        format!("{} products restocked.", updated)
    }
}

/// Low-stock restocking over an injected product repository.
///
/// Each product is read then written on its own; two concurrent runs may both
/// restock the same product.
pub struct RestockService {
    products: Arc<dyn ProductRepository>,
    policy: RestockPolicy,
}

impl RestockService {
    pub fn new(products: Arc<dyn ProductRepository>) -> Self {
        Self::with_policy(products, RestockPolicy::default())
    }

    pub fn with_policy(products: Arc<dyn ProductRepository>, policy: RestockPolicy) -> Self {
        Self { products, policy }
    }

    #[instrument(skip_all, fields(threshold = self.policy.threshold))]
    pub async fn update_low_stock_products(&self) -> CoreResult<RestockReport> {
        let low_stock = self.products.list_below_stock(self.policy.threshold).await?;
        let mut updated = Vec::with_capacity(low_stock.len());

        for product in low_stock {
            if !self.policy.needs_restock(&product) {
                continue;
            }

            let new_stock = self.policy.restocked_level(product.stock)?;
            let saved = self.products.update_stock(product.id, new_stock).await?;

            info!(product_id = %saved.id, previous = product.stock, stock = saved.stock, "Product restocked");
            DomainEvent::ProductRestocked(ProductRestockedEvent {
                product_id: saved.id,
                previous_stock: product.stock,
                new_stock: saved.stock,
                timestamp: Utc::now().timestamp(),
            })
            .emit();

            updated.push(saved);
        }

        let message = restock_message(updated.len());
        Ok(RestockReport {
            updated_products: updated,
            message,
        })
    }
}
