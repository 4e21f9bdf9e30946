pub mod pii;
pub mod models;

pub use models::DomainEvent;
pub use pii::Masked;
