//! Client-side throttling of calls to a remote API.

use std::{
    collections::VecDeque,
    num::NonZeroUsize,
    sync::{Mutex, PoisonError},
    thread,
    time::{Duration, Instant},
};

use log::debug;

/// Calls allowed per period when no other limit is configured
pub const DEFAULT_MAX_CALLS: usize = 10;
/// Length of the rolling window when no other limit is configured
pub const DEFAULT_PERIOD: Duration = Duration::from_secs(60);

/// A rate limiter allowing at most `max_calls` calls in any rolling window of length `period`.
///
/// The limiter is shared by reference between threads.
/// Callers that would exceed the limit are put to sleep until the oldest call leaves the window, they never fail.
#[derive(Debug)]
pub struct SlidingWindowLimiter {
    max_calls: NonZeroUsize,
    period: Duration,
    calls: Mutex<VecDeque<Instant>>,
}

impl SlidingWindowLimiter {
    pub fn new(max_calls: NonZeroUsize, period: Duration) -> Self {
        SlidingWindowLimiter {
            max_calls,
            period,
            calls: Mutex::new(VecDeque::with_capacity(max_calls.get())),
        }
    }

    pub fn max_calls(&self) -> usize {
        self.max_calls.get()
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Block until a call may be made, then record it
    pub fn acquire(&self) {
        loop {
            let wait = {
                // The queue stays consistent even if another holder panicked
                let mut calls = self.calls.lock().unwrap_or_else(PoisonError::into_inner);
                let now = Instant::now();
                while calls
                    .front()
                    .is_some_and(|oldest| now.duration_since(*oldest) >= self.period)
                {
                    calls.pop_front();
                }

                if calls.len() < self.max_calls.get() {
                    calls.push_back(now);
                    return;
                }
                calls.front().map_or(Duration::ZERO, |oldest| {
                    self.period.saturating_sub(now.duration_since(*oldest))
                })
            };
            debug!("Rate limit reached, waiting {:?}", wait);
            thread::sleep(wait);
        }
    }
}

impl Default for SlidingWindowLimiter {
    fn default() -> Self {
        SlidingWindowLimiter::new(
            NonZeroUsize::new(DEFAULT_MAX_CALLS).unwrap_or(NonZeroUsize::MIN),
            DEFAULT_PERIOD,
        )
    }
}
