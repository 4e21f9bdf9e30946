use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use crm_catalog::Product;
use crm_core::repository::Sortable;
use crm_core::Customer;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The customer fields embedded in an order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CustomerSummary {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

impl From<&Customer> for CustomerSummary {
    fn from(customer: &Customer) -> Self {
        Self {
            id: customer.id,
            name: customer.name.clone(),
            email: customer.email.clone(),
        }
    }
}

/// A customer's purchase of a set of products.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Order {
    pub id: Uuid,
    pub customer: CustomerSummary,
    pub products: Vec<Product>,
    pub total_amount: Decimal,
    pub order_date: DateTime<Utc>,
}

/// An order whose customer and products have already been resolved.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub customer_id: Uuid,
    pub product_ids: Vec<Uuid>,
    pub total_amount: Decimal,
    pub order_date: DateTime<Utc>,
}

/// Inclusive `order_date` bounds.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OrderFilter {
    pub order_date_gte: Option<DateTime<Utc>>,
    pub order_date_lte: Option<DateTime<Utc>>,
}

impl OrderFilter {
    pub fn matches(&self, order_date: DateTime<Utc>) -> bool {
        self.order_date_gte.map_or(true, |from| order_date >= from)
            && self.order_date_lte.map_or(true, |to| order_date <= to)
    }
}

/// Largest total `orders.total_amount NUMERIC(12,2)` holds: 9,999,999,999.99.
pub const ORDER_TOTAL_MAX: Decimal = Decimal::from_parts(3_567_587_327, 232, 0, false, 2);

/// Exact decimal sum of the product prices.
pub fn calculate_total(products: &[Product]) -> Decimal {
    products.iter().map(|p| p.price).sum()
}

impl Sortable for Order {
    const SORT_FIELDS: &'static [&'static str] = &["id", "order_date", "total_amount", "customer"];

    fn compare_field(&self, other: &Self, field: &str) -> Ordering {
        match field {
            "id" => self.id.cmp(&other.id),
            "order_date" => self.order_date.cmp(&other.order_date),
            "total_amount" => self.total_amount.cmp(&other.total_amount),
            "customer" => self.customer.name.cmp(&other.customer.name),
            _ => Ordering::Equal,
        }
    }

    fn sort_column(field: &str) -> Option<&'static str> {
        match field {
            "id" => Some("o.id"),
            "order_date" => Some("o.order_date"),
            "total_amount" => Some("o.total_amount"),
            "customer" => Some("c.name"),
            _ => None,
        }
    }
}
