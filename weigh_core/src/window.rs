//! Bounded history of recent samples for one capture.
use std::collections::VecDeque;
use std::time::Instant;

/// Default number of samples kept per capture.
pub const DEFAULT_WINDOW_CAPACITY: usize = 5;

/// One weight observation, stamped when the source returned it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub value: f64,
    pub observed_at: Instant,
}

impl Sample {
    pub fn new(value: f64, observed_at: Instant) -> Self {
        Self { value, observed_at }
    }
}

/// Sliding window over the most recent samples, oldest first.
///
/// Invariant: `len() <= capacity()`. Pushing into a full window evicts exactly
/// the oldest sample.
#[derive(Debug, Clone)]
pub struct ReadingWindow {
    buf: VecDeque<Sample>,
    capacity: usize,
}

impl ReadingWindow {
    /// Capacity is clamped to at least 1.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            buf: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a sample, returning the evicted one if the window was full.
    pub fn push(&mut self, sample: Sample) -> Option<Sample> {
        let evicted = if self.buf.len() == self.capacity {
            self.buf.pop_front()
        } else {
            None
        };
        self.buf.push_back(sample);
        debug_assert!(self.buf.len() <= self.capacity);
        evicted
    }

    pub fn latest(&self) -> Option<&Sample> {
        self.buf.back()
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.buf.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &Sample> + '_ {
        self.buf.iter()
    }

    /// Sample values oldest first.
    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        self.buf.iter().map(|s| s.value)
    }
}

impl Default for ReadingWindow {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(v: f64) -> Sample {
        Sample::new(v, Instant::now())
    }

    #[test]
    fn evicts_oldest_when_full() {
        let mut w = ReadingWindow::new(3);
        assert!(w.push(sample(1.0)).is_none());
        assert!(w.push(sample(2.0)).is_none());
        assert!(w.push(sample(3.0)).is_none());
        let evicted = w.push(sample(4.0)).map(|s| s.value);
        assert_eq!(evicted, Some(1.0));
        assert_eq!(w.values().collect::<Vec<_>>(), vec![2.0, 3.0, 4.0]);
        assert_eq!(w.latest().map(|s| s.value), Some(4.0));
    }

    #[test]
    fn zero_capacity_is_clamped() {
        let mut w = ReadingWindow::new(0);
        assert_eq!(w.capacity(), 1);
        w.push(sample(1.0));
        w.push(sample(2.0));
        assert_eq!(w.len(), 1);
        assert_eq!(w.latest().map(|s| s.value), Some(2.0));
    }

    #[test]
    fn clear_empties_window() {
        let mut w = ReadingWindow::default();
        w.push(sample(1.0));
        w.clear();
        assert!(w.is_empty());
        assert!(w.latest().is_none());
        assert_eq!(w.capacity(), DEFAULT_WINDOW_CAPACITY);
    }
}
