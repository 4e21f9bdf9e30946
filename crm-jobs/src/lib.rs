pub mod client;
pub mod error;
pub mod jobs;
pub mod sink;

pub use client::{ApiClient, HttpApiClient};
pub use error::{JobError, JobResult};
pub use jobs::Job;
pub use sink::FileSink;
