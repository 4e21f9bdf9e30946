use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::Order;

/// Headline numbers for the periodic CRM report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrmReport {
    pub customers: usize,
    pub orders: usize,
    pub revenue: Decimal,
}

impl CrmReport {
    pub fn new(customers: usize, orders: &[Order]) -> Self {
        Self {
            customers,
            orders: orders.len(),
            revenue: orders.iter().map(|o| o.total_amount).sum(),
        }
    }
}

impl fmt::Display for CrmReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} customers, {} orders, {} revenue",
            self.customers, self.orders, self.revenue
        )
    }
}
