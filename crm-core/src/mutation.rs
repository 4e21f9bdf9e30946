use serde::{Deserialize, Serialize};

/// `{record, success, message}` envelope returned by create mutations.
///
/// Rejected input never surfaces as a fault: it becomes `success = false` with a message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MutationResult<T> {
    pub record: Option<T>,
    pub success: bool,
    pub message: String,
}

impl<T> MutationResult<T> {
    pub fn ok(record: T, message: impl Into<String>) -> Self {
        Self {
            record: Some(record),
            success: true,
            message: message.into(),
        }
    }

    pub fn rejected(message: impl Into<String>) -> Self {
        Self {
            record: None,
            success: false,
            message: message.into(),
        }
    }
}
