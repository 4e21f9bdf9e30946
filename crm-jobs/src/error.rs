#[derive(Debug, thiserror::Error)]
pub enum JobError {
    #[error("Transport error: {0}")]
    Transport(String),
    #[error("API returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("Invalid API response: {0}")]
    Decode(String),
    #[error("Log write failed: {0}")]
    Sink(#[from] std::io::Error),
}

pub type JobResult<T> = Result<T, JobError>;
