//! Replay source: hands out a fixed list of readings and failures in order.
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use weigh_traits::{ReadingSlot, ReadingSource};

use crate::error::SourceError;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Step {
    Value(f64),
    Fail,
    Timeout,
    /// Block for the given duration, then return the value.
    Slow(f64, Duration),
}

/// Once the script runs out the last value is repeated; an empty or
/// failure-terminated script keeps failing.
pub struct ScriptedSource {
    steps: VecDeque<Step>,
    last_value: Option<f64>,
    polls: Arc<AtomicUsize>,
}

impl ScriptedSource {
    pub fn new(steps: impl IntoIterator<Item = Step>) -> Self {
        Self {
            steps: steps.into_iter().collect(),
            last_value: None,
            polls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn values(values: impl IntoIterator<Item = f64>) -> Self {
        Self::new(values.into_iter().map(Step::Value))
    }

    /// Shared counter of `poll` calls, readable after the source moved into a poller.
    pub fn poll_counter(&self) -> Arc<AtomicUsize> {
        self.polls.clone()
    }
}

impl ReadingSource for ScriptedSource {
    fn poll(
        &mut self,
        slot: ReadingSlot,
        _timeout: Duration,
    ) -> Result<f64, Box<dyn std::error::Error + Send + Sync>> {
        self.polls.fetch_add(1, Ordering::Relaxed);
        let step = match self.steps.pop_front() {
            Some(step) => step,
            None => {
                return self.last_value.ok_or_else(|| {
                    let e = SourceError::Unavailable(format!("script exhausted for {slot}"));
                    Box::new(e) as Box<dyn std::error::Error + Send + Sync>
                });
            }
        };
        match step {
            Step::Value(v) => {
                self.last_value = Some(v);
                Ok(v)
            }
            Step::Slow(v, d) => {
                std::thread::sleep(d);
                self.last_value = Some(v);
                Ok(v)
            }
            Step::Fail => {
                self.last_value = None;
                Err(Box::new(SourceError::Unavailable("scripted failure".into())))
            }
            Step::Timeout => {
                self.last_value = None;
                Err(Box::new(SourceError::Timeout))
            }
        }
    }
}
