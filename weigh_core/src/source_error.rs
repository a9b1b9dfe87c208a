//! Maps `Box<dyn Error>` from the `ReadingSource` boundary to a typed `WeighError`.
//!
//! The traits in `weigh_traits` use `Box<dyn Error + Send + Sync>`; this module
//! converts those to our error enum, with an optional feature-gated path for
//! `weigh_hardware::SourceError` downcasting.

use crate::error::WeighError;

/// Map a source failure to a typed `WeighError`.
///
/// Known hardware error types are downcast first, then string heuristics apply.
/// Every result is transient from the session's point of view.
pub fn map_source_error(e: &(dyn std::error::Error + 'static)) -> WeighError {
    #[cfg(feature = "hardware-errors")]
    {
        use weigh_hardware::error::SourceError;
        if let Some(src) = e.downcast_ref::<SourceError>() {
            return match src {
                SourceError::Timeout => WeighError::Timeout,
                other => WeighError::ReadingUnavailable(other.to_string()),
            };
        }
    }

    let s = e.to_string();
    if s.to_lowercase().contains("timeout") || s.to_lowercase().contains("timed out") {
        WeighError::Timeout
    } else {
        WeighError::ReadingUnavailable(s)
    }
}

/// Convenience for the boxed form returned by `ReadingSource::poll`.
pub fn map_source_error_dyn(e: &(dyn std::error::Error + Send + Sync + 'static)) -> WeighError {
    map_source_error(e)
}
