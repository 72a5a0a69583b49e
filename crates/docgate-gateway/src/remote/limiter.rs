//! Dual sliding-window rate limiter (per minute, per hour).
//!
//! Each window is a sorted log of call timestamps. `acquire` takes the lock,
//! purges expired entries, computes how long this call must wait for both
//! windows to have room, and records the call at its projected start time
//! before releasing the lock. The sleep itself happens without the lock, so
//! concurrent acquirers queue behind each other's reservations instead of
//! all observing the same free slot.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use tokio::time::Instant;

const MINUTE: Duration = Duration::from_secs(60);
const HOUR: Duration = Duration::from_secs(3600);

#[derive(Debug)]
struct RateWindow {
    span: Duration,
    limit: usize,
    stamps: VecDeque<Instant>,
}

impl RateWindow {
    fn new(span: Duration, limit: u32) -> Self {
        Self {
            span,
            limit: (limit as usize).max(1),
            stamps: VecDeque::new(),
        }
    }

    fn purge(&mut self, now: Instant) {
        while let Some(&front) = self.stamps.front() {
            if front + self.span <= now {
                self.stamps.pop_front();
            } else {
                break;
            }
        }
    }

    /// Time from `at` until one more call fits.
    fn wait_at(&self, at: Instant) -> Duration {
        if self.stamps.len() < self.limit {
            return Duration::ZERO;
        }
        // The entry `limit` places from the end must leave the window first.
        let idx = self.stamps.len() - self.limit;
        match self.stamps.get(idx) {
            Some(&t) => (t + self.span).saturating_duration_since(at),
            None => Duration::ZERO,
        }
    }

    fn record(&mut self, at: Instant) {
        let pos = self.stamps.partition_point(|t| *t <= at);
        self.stamps.insert(pos, at);
    }
}

#[derive(Debug)]
struct Windows {
    minute: RateWindow,
    hour: RateWindow,
}

/// Shared limiter guarding one remote endpoint.
#[derive(Debug)]
pub struct RateLimiter {
    inner: Mutex<Windows>,
}

impl RateLimiter {
    pub fn new(requests_per_minute: u32, requests_per_hour: u32) -> Self {
        Self {
            inner: Mutex::new(Windows {
                minute: RateWindow::new(MINUTE, requests_per_minute),
                hour: RateWindow::new(HOUR, requests_per_hour),
            }),
        }
    }

    /// Reserve a slot and return how long the caller must wait before using it.
    ///
    /// Both windows are checked on every call; when both are saturated the
    /// hour delay is computed from the moment the minute delay ends, so the
    /// two delays add up.
    pub fn reserve(&self) -> Duration {
        let now = Instant::now();
        // Poisoned mutex means a logic bug elsewhere; never block calls on it.
        let mut w = match self.inner.lock() {
            Ok(g) => g,
            Err(poisoned) => poisoned.into_inner(),
        };

        w.minute.purge(now);
        w.hour.purge(now);

        let minute_wait = w.minute.wait_at(now);
        let hour_wait = w.hour.wait_at(now + minute_wait);
        let wait = minute_wait + hour_wait;

        let at = now + wait;
        w.minute.record(at);
        w.hour.record(at);
        wait
    }

    /// Suspend until one more call is within both limits, then proceed.
    /// Never fails.
    pub async fn acquire(&self) {
        let wait = self.reserve();
        if !wait.is_zero() {
            tracing::debug!(wait_ms = wait.as_millis() as u64, "rate limit reached, waiting");
            tokio::time::sleep(wait).await;
        }
    }

    /// Calls currently counted in (minute, hour) windows.
    pub fn in_flight(&self) -> (usize, usize) {
        let now = Instant::now();
        let mut w = match self.inner.lock() {
            Ok(g) => g,
            Err(poisoned) => poisoned.into_inner(),
        };
        w.minute.purge(now);
        w.hour.purge(now);
        (w.minute.stamps.len(), w.hour.stamps.len())
    }
}
