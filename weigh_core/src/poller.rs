//! Background polling of a reading source.
//!
//! A `Poller` spawns one thread that owns the `ReadingSource`, polls it at a
//! fixed interval and hands each result over a bounded channel (latest wins).
//! Polls are single-flight: a poll that outlives the interval is never overlapped;
//! the missed ticks are skipped and counted as overruns.
//!
//! Stopping (explicitly or on drop) raises a shutdown flag, wakes the thread out
//! of its inter-poll wait and joins it. No result is delivered once `stop()` has
//! returned.
use crossbeam_channel as xch;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::{Duration, Instant};

use weigh_traits::clock::Clock;
use weigh_traits::{ReadingSlot, ReadingSource};

use crate::error::WeighError;
use crate::source_error::map_source_error_dyn;

pub type PollResult = Result<f64, WeighError>;

pub struct Poller {
    rx: xch::Receiver<PollResult>,
    last_ok: Arc<AtomicU64>,
    overruns: Arc<AtomicU64>,
    epoch: Instant,
    shutdown: Arc<AtomicBool>,
    /// Dropping the sender wakes the thread out of its wait.
    wake_tx: Option<xch::Sender<()>>,
    join_handle: Option<std::thread::JoinHandle<()>>,
}

impl Poller {
    pub fn spawn<R, C>(
        mut source: R,
        slot: ReadingSlot,
        interval: Duration,
        timeout: Duration,
        clock: C,
    ) -> Self
    where
        R: ReadingSource + Send + 'static,
        C: Clock + Send + Sync + 'static,
    {
        let (tx, rx) = xch::bounded::<PollResult>(1);
        let (wake_tx, wake_rx) = xch::bounded::<()>(0);
        let shutdown = Arc::new(AtomicBool::new(false));
        let shutdown_clone = shutdown.clone();
        let last_ok = Arc::new(AtomicU64::new(0));
        let last_ok_clone = last_ok.clone();
        let overruns = Arc::new(AtomicU64::new(0));
        let overruns_clone = overruns.clone();
        let drain_rx = rx.clone();
        let interval = interval.max(Duration::from_millis(1));
        let epoch = clock.now();

        let join_handle = std::thread::spawn(move || {
            loop {
                if shutdown_clone.load(Ordering::Relaxed) {
                    tracing::debug!(%slot, "poller received shutdown signal");
                    break;
                }

                let started = clock.now();
                let result = source
                    .poll(slot, timeout)
                    .map_err(|e| map_source_error_dyn(&*e));
                if result.is_ok() {
                    last_ok_clone.store(clock.ms_since(epoch), Ordering::Relaxed);
                }

                // A stop raised while the poll was in flight discards its result
                if shutdown_clone.load(Ordering::Relaxed) {
                    break;
                }
                // Latest wins: replace an unconsumed result instead of blocking
                let _ = drain_rx.try_recv();
                let _ = tx.try_send(result);

                let spent = clock.now().saturating_duration_since(started);
                let wait = if spent >= interval {
                    let missed = spent.as_nanos() / interval.as_nanos();
                    let missed = missed.min(u128::from(u64::MAX)) as u64;
                    overruns_clone.fetch_add(missed, Ordering::Relaxed);
                    tracing::warn!(%slot, ?spent, ?interval, missed, "poll overran its interval");
                    Duration::ZERO
                } else {
                    interval - spent
                };
                match wake_rx.recv_timeout(wait) {
                    Err(xch::RecvTimeoutError::Timeout) => {}
                    _ => break,
                }
            }
            tracing::trace!(%slot, "poller thread exiting cleanly");
        });

        Self {
            rx,
            last_ok,
            overruns,
            epoch,
            shutdown,
            wake_tx: Some(wake_tx),
            join_handle: Some(join_handle),
        }
    }

    /// Most recent result delivered since the last call, if any.
    pub fn latest(&self) -> Option<PollResult> {
        if self.shutdown.load(Ordering::Relaxed) {
            return None;
        }
        self.rx.try_iter().last()
    }

    /// Block up to `timeout` for the next result.
    pub fn recv_timeout(&self, timeout: Duration) -> Option<PollResult> {
        if self.shutdown.load(Ordering::Relaxed) {
            return None;
        }
        self.rx.recv_timeout(timeout).ok()
    }

    /// Number of ticks skipped because a poll outlived the interval.
    pub fn overruns(&self) -> u64 {
        self.overruns.load(Ordering::Relaxed)
    }

    pub fn stalled_for(&self, now_ms: u64) -> u64 {
        now_ms.saturating_sub(self.last_ok.load(Ordering::Relaxed))
    }

    /// Stall using this poller's epoch and a real monotonic clock.
    pub fn stalled_for_now(&self) -> u64 {
        let ms = Instant::now().saturating_duration_since(self.epoch).as_millis();
        self.stalled_for(ms.min(u128::from(u64::MAX)) as u64)
    }

    pub fn is_stopped(&self) -> bool {
        self.join_handle.is_none()
    }

    /// Cancel polling and wait for the thread to exit. Idempotent.
    pub fn stop(&mut self) {
        self.shutdown.store(true, Ordering::Relaxed);
        self.wake_tx.take();
        if let Some(handle) = self.join_handle.take() {
            match handle.join() {
                Ok(()) => tracing::trace!("poller thread joined"),
                Err(e) => tracing::warn!(?e, "poller thread panicked during shutdown"),
            }
        }
        while self.rx.try_recv().is_ok() {}
    }
}

impl Drop for Poller {
    fn drop(&mut self) {
        // Returns right away between polls, or once an in-flight poll
        // returns (bounded by the source timeout).
        self.stop();
    }
}
