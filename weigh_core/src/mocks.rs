//! Test and helper mocks for weigh_core

/// A source that always errors on poll; used for sessions that are fed
/// externally polled results via `ingest`.
pub struct NoopSource;

impl weigh_traits::ReadingSource for NoopSource {
    fn poll(
        &mut self,
        _slot: weigh_traits::ReadingSlot,
        _timeout: std::time::Duration,
    ) -> Result<f64, Box<dyn std::error::Error + Send + Sync>> {
        Err(Box::new(std::io::Error::other("noop source")))
    }
}
