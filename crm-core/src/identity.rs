use std::cmp::Ordering;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::repository::{SortKey, Sortable};
use crate::CoreResult;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Customer {
    pub id: Uuid,
    pub name: String,
    pub nickname: Option<String>,
    pub email: String,
    pub phone: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A validated customer ready to be inserted.
#[derive(Debug, Clone, PartialEq)]
pub struct NewCustomer {
    pub name: String,
    pub nickname: Option<String>,
    pub email: String,
    pub phone: Option<String>,
}

/// Case-insensitive substring filters.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CustomerFilter {
    pub name: Option<String>,
    pub email: Option<String>,
}

impl CustomerFilter {
    pub fn matches(&self, customer: &Customer) -> bool {
        contains_ci(&customer.name, self.name.as_deref())
            && contains_ci(&customer.email, self.email.as_deref())
    }
}

fn contains_ci(haystack: &str, needle: Option<&str>) -> bool {
    match needle {
        Some(n) => haystack.to_lowercase().contains(&n.to_lowercase()),
        None => true,
    }
}

impl Sortable for Customer {
    const SORT_FIELDS: &'static [&'static str] = &["id", "name", "email", "phone", "created_at"];

    fn compare_field(&self, other: &Self, field: &str) -> Ordering {
        match field {
            "id" => self.id.cmp(&other.id),
            "name" => self.name.cmp(&other.name),
            "email" => self.email.cmp(&other.email),
            "phone" => self.phone.cmp(&other.phone),
            "created_at" => self.created_at.cmp(&other.created_at),
            _ => Ordering::Equal,
        }
    }

    fn sort_column(field: &str) -> Option<&'static str> {
        match field {
            "id" => Some("id"),
            "name" => Some("name"),
            "email" => Some("email"),
            "phone" => Some("phone"),
            "created_at" => Some("created_at"),
            _ => None,
        }
    }
}

/// Repository trait for customer data access
#[async_trait]
pub trait CustomerRepository: Send + Sync {
    /// Fails with `ConflictError` when the email is taken.
    async fn create_customer(&self, customer: &NewCustomer) -> CoreResult<Customer>;

    /// Inserts every row in one transaction: all rows are stored or none are.
    async fn create_customers(&self, customers: &[NewCustomer]) -> CoreResult<Vec<Customer>>;

    async fn get_customer(&self, id: Uuid) -> CoreResult<Option<Customer>>;

    async fn find_by_email(&self, email: &str) -> CoreResult<Option<Customer>>;

    async fn email_exists(&self, email: &str) -> CoreResult<bool>;

    async fn list_customers(
        &self,
        filter: &CustomerFilter,
        order_by: &[SortKey],
    ) -> CoreResult<Vec<Customer>>;
}
