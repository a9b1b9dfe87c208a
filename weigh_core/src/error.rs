use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum WeighError {
    /// Transient: the source produced no usable value this poll.
    #[error("reading unavailable: {0}")]
    ReadingUnavailable(String),
    #[error("timeout waiting for reading")]
    Timeout,
    /// Escalated after `max_consecutive_failures` failed polls in a row.
    #[error("reading source failing: {failures} consecutive failures")]
    SourceFailing { failures: u32 },
    #[error("axle configuration unavailable: {0}")]
    ConfigurationUnavailable(String),
    /// Caller contract violation (e.g. finish before all axles are captured).
    #[error("invalid capture request: {0}")]
    InvalidCaptureRequest(String),
    #[error("configuration error: {0}")]
    Config(String),
    #[error("capture cancelled")]
    Cancelled,
}

impl WeighError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        WeighError::InvalidCaptureRequest(msg.into())
    }
}

#[derive(Debug, Error, Clone)]
pub enum BuildError {
    #[error("missing reading source")]
    MissingSource,
    #[error("missing reading slot")]
    MissingSlot,
    #[error("invalid config: {0}")]
    InvalidConfig(&'static str),
}

pub type Result<T> = eyre::Result<T>;
pub use eyre::Report;
