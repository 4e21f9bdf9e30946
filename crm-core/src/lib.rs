pub mod validation;
pub mod repository;
pub mod identity;
pub mod customers;
pub mod mutation;

pub use identity::{Customer, CustomerFilter, CustomerRepository, NewCustomer};
pub use customers::{BulkCreateResult, BulkCustomerRow, CreateCustomerInput, CustomerService};
pub use mutation::MutationResult;
pub use repository::{Page, SortKey, Sortable};

use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Validation failed: {0}")]
    ValidationError(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Requested {requested} products but only {resolved} matched")]
    PartialMatch { requested: usize, resolved: usize },
    #[error("Conflict: {0}")]
    ConflictError(String),
    #[error("Internal service error: {0}")]
    InternalError(String),
}

/// Wire-level classification of a [`CoreError`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    Validation,
    NotFound,
    PartialMatch,
    Conflict,
    Internal,
}

impl CoreError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CoreError::ValidationError(_) => ErrorKind::Validation,
            CoreError::NotFound(_) => ErrorKind::NotFound,
            CoreError::PartialMatch { .. } => ErrorKind::PartialMatch,
            CoreError::ConflictError(_) => ErrorKind::Conflict,
            CoreError::InternalError(_) => ErrorKind::Internal,
        }
    }

    /// Storage or infrastructure failures, as opposed to rejected input.
    pub fn is_internal(&self) -> bool {
        matches!(self, CoreError::InternalError(_))
    }
}

pub type CoreResult<T> = Result<T, CoreError>;
