use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use crm_shared::models::events::{CustomerCreatedEvent, CustomersImportedEvent};
use crm_shared::{DomainEvent, Masked};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use crate::identity::{Customer, CustomerFilter, CustomerRepository, NewCustomer};
use crate::mutation::MutationResult;
use crate::repository::{parse_order_by, Page};
use crate::validation::{
    is_too_long, is_valid_email, is_valid_phone, length_message, normalize_optional, validate_email, validate_length,
    validate_phone, NAME_MAX_LENGTH, NICKNAME_MAX_LENGTH,
};
use crate::{CoreError, CoreResult};

#[derive(Debug, Clone, Deserialize)]
pub struct CreateCustomerInput {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub nickname: Option<String>,
}

/// One row of a bulk import. Every field is optional so a malformed row
/// becomes a row error instead of rejecting the whole request.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BulkCustomerRow {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub nickname: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkCreateResult {
    pub created: Vec<Customer>,
    pub errors: Vec<String>,
}

/// Customer creation workflows over an injected repository.
pub struct CustomerService {
    repo: Arc<dyn CustomerRepository>,
}

impl CustomerService {
    pub fn new(repo: Arc<dyn CustomerRepository>) -> Self {
        Self { repo }
    }

    #[instrument(skip_all)]
    pub async fn create_customer(&self, input: CreateCustomerInput) -> CoreResult<MutationResult<Customer>> {
        let email = input.email.trim().to_string();
        let phone = normalize_optional(input.phone);

        if let Err(e) = validate_email(&email) {
            return Ok(rejected(e));
        }
        if self.repo.email_exists(&email).await? {
            return Ok(MutationResult::rejected("Email already exists."));
        }
        if let Err(e) = validate_phone(phone.as_deref()) {
            return Ok(rejected(e));
        }
        let name = input.name.trim().to_string();
        if name.is_empty() {
            return Ok(MutationResult::rejected("Name is required."));
        }
        let nickname = normalize_optional(input.nickname);
        let lengths = validate_length("Name", &name, NAME_MAX_LENGTH)
            .and_then(|_| validate_length("Nickname", nickname.as_deref().unwrap_or_default(), NICKNAME_MAX_LENGTH));
        if let Err(e) = lengths {
            return Ok(rejected(e));
        }

        let new_customer = NewCustomer {
            name,
            nickname,
            email,
            phone,
        };

        match self.repo.create_customer(&new_customer).await {
            Ok(customer) => {
                info!(customer_id = %customer.id, email = %Masked(&customer.email), "Customer created");
                DomainEvent::CustomerCreated(CustomerCreatedEvent {
                    customer_id: customer.id,
                    timestamp: Utc::now().timestamp(),
                })
                .emit();
                Ok(MutationResult::ok(customer, "Customer created."))
            }
            // Lost a race with a concurrent insert of the same email.
            Err(CoreError::ConflictError(_)) => Ok(MutationResult::rejected("Email already exists.")),
            Err(e) => Err(e),
        }
    }

    /// Validates every row independently, then commits the valid ones together.
    ///
    /// Row failures are reported as `Row <n>: <reason>` with a 1-based index. A storage
    /// failure while committing aborts the batch and nothing is persisted.
    #[instrument(skip_all, fields(rows = rows.len()))]
    pub async fn bulk_create_customers(&self, rows: Vec<BulkCustomerRow>) -> CoreResult<BulkCreateResult> {
        let mut accepted = Vec::new();
        let mut errors = Vec::new();
        let mut seen_emails = HashSet::new();

        for (idx, row) in rows.into_iter().enumerate() {
            match self.check_row(row, &seen_emails).await? {
                Ok(new_customer) => {
                    seen_emails.insert(new_customer.email.clone());
                    accepted.push(new_customer);
                }
                Err(reason) => {
                    warn!(row = idx + 1, "Rejected bulk customer row");
                    errors.push(format!("Row {}: {}", idx + 1, reason));
                }
            }
        }

        let created = if accepted.is_empty() {
            Vec::new()
        } else {
            self.repo.create_customers(&accepted).await?
        };

        info!(created = created.len(), rejected = errors.len(), "Bulk customer import finished");
        DomainEvent::CustomersImported(CustomersImportedEvent {
            created: created.len(),
            rejected: errors.len(),
            timestamp: Utc::now().timestamp(),
        })
        .emit();

        Ok(BulkCreateResult { created, errors })
    }

    pub async fn list_customers(&self, filter: &CustomerFilter, order_by: &[String]) -> CoreResult<Page<Customer>> {
        let keys = parse_order_by::<Customer>(order_by)?;
        let customers = self.repo.list_customers(filter, &keys).await?;
        Ok(Page::new(customers))
    }

    /// Outer `Err` is a storage failure; inner `Err` is the row's rejection reason.
    async fn check_row(
        &self,
        row: BulkCustomerRow,
        seen_emails: &HashSet<String>,
    ) -> CoreResult<Result<NewCustomer, String>> {
        let email = row.email.map(|e| e.trim().to_string()).unwrap_or_default();
        if email.is_empty() {
            return Ok(Err("Email is required".to_string()));
        }
        if !is_valid_email(&email) {
            return Ok(Err(format!("Invalid email format: {}", email)));
        }
        if seen_emails.contains(&email) || self.repo.email_exists(&email).await? {
            return Ok(Err(format!("Email already exists: {}", email)));
        }

        let phone = normalize_optional(row.phone);
        if let Some(p) = phone.as_deref() {
            if !is_valid_phone(p) {
                return Ok(Err(format!("Invalid phone format: {}", p)));
            }
        }

        let name = match normalize_optional(row.name) {
            Some(n) => n,
            None => return Ok(Err("Name is required".to_string())),
        };
        if is_too_long(&name, NAME_MAX_LENGTH) {
            return Ok(Err(length_message("Name", NAME_MAX_LENGTH)));
        }
        let nickname = normalize_optional(row.nickname);
        if nickname.as_deref().is_some_and(|n| is_too_long(n, NICKNAME_MAX_LENGTH)) {
            return Ok(Err(length_message("Nickname", NICKNAME_MAX_LENGTH)));
        }

        Ok(Ok(NewCustomer {
            name,
            nickname,
            email,
            phone,
        }))
    }
}

fn rejected(e: CoreError) -> MutationResult<Customer> {
    match e {
        CoreError::ValidationError(msg) => MutationResult::rejected(msg),
        other => MutationResult::rejected(other.to_string()),
    }
}
