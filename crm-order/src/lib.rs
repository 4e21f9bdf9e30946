pub mod models;
pub mod repository;
pub mod manager;
pub mod report;

pub use models::{calculate_total, CustomerSummary, NewOrder, Order, OrderFilter, ORDER_TOTAL_MAX};
pub use repository::OrderRepository;
pub use manager::{CreateOrderInput, OrderManager, OrderOutcome};
pub use report::CrmReport;
