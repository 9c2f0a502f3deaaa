use thiserror::Error;

/// Persistence failures. These surface as user-visible messages in the
/// shell; they never touch the in-memory table.
#[derive(Debug, Error)]
pub enum IoError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Arrow(#[from] arrow_schema::ArrowError),

    #[error("format error: {0}")]
    Format(String),
}

pub type Result<T> = std::result::Result<T, IoError>;
