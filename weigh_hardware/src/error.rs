use thiserror::Error;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("reading timeout")]
    Timeout,
    #[error("no reading available: {0}")]
    Unavailable(String),
    #[error("device reported: {0}")]
    Device(String),
    #[error("http error: {0}")]
    Http(String),
    #[error("malformed reading: {0}")]
    Parse(String),
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, SourceError>;
