use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
pub struct CustomerCreatedEvent {
    pub customer_id: Uuid,
    pub timestamp: i64,
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
pub struct CustomersImportedEvent {
    pub created: usize,
    pub rejected: usize,
    pub timestamp: i64,
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
pub struct ProductCreatedEvent {
    pub product_id: Uuid,
    pub price: Decimal,
    pub stock: i32,
    pub timestamp: i64,
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
pub struct OrderCreatedEvent {
    pub order_id: Uuid,
    pub customer_id: Uuid,
    pub product_count: usize,
    pub total_amount: Decimal,
    pub order_date: DateTime<Utc>,
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
pub struct ProductRestockedEvent {
    pub product_id: Uuid,
    pub previous_stock: i32,
    pub new_stock: i32,
    pub timestamp: i64,
}

/// Facts recorded after a mutation has been persisted.
#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DomainEvent {
    CustomerCreated(CustomerCreatedEvent),
    CustomersImported(CustomersImportedEvent),
    ProductCreated(ProductCreatedEvent),
    OrderCreated(OrderCreatedEvent),
    ProductRestocked(ProductRestockedEvent),
}

impl DomainEvent {
    pub fn name(&self) -> &'static str {
        match self {
            DomainEvent::CustomerCreated(_) => "CUSTOMER_CREATED",
            DomainEvent::CustomersImported(_) => "CUSTOMERS_IMPORTED",
            DomainEvent::ProductCreated(_) => "PRODUCT_CREATED",
            DomainEvent::OrderCreated(_) => "ORDER_CREATED",
            DomainEvent::ProductRestocked(_) => "PRODUCT_RESTOCKED",
        }
    }

    /// Writes the event to the `crm::events` log target as a JSON payload.
    pub fn emit(&self) {
        match serde_json::to_string(self) {
            Ok(payload) => tracing::info!(target: "crm::events", event = self.name(), %payload),
            Err(e) => tracing::warn!(target: "crm::events", event = self.name(), "Failed to serialize event: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_is_tagged_with_type() {
        let event = DomainEvent::ProductRestocked(ProductRestockedEvent {
            product_id: Uuid::nil(),
            previous_stock: 5,
            new_stock: 15,
            timestamp: 0,
        });

        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["type"], "PRODUCT_RESTOCKED");
        assert_eq!(value["new_stock"], 15);
        assert_eq!(event.name(), "PRODUCT_RESTOCKED");
    }
}
