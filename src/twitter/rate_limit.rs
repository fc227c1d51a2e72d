//! Outbound rate limiting for status posts.
//!
//! Every post request passes through one shared [`RateLimiter`]. Requests
//! inside the budget go straight through; once the budget for the current
//! window is spent, callers wait for the window to reset. Nothing is ever
//! rejected.

use std::time::Duration;

use log::{debug, warn};
use tokio::sync::Mutex;
use tokio::time::{sleep_until, Instant};

/// Default number of posts allowed per window.
pub const DEFAULT_MAX_REQUESTS: usize = 300;

/// Default window length (3 hours).
pub const DEFAULT_PERIOD: Duration = Duration::from_secs(3 * 60 * 60);

#[derive(Debug, Default)]
struct Window {
    started_at: Option<Instant>,
    used: usize,
}

/// Fixed-window rate limiter shared by all outbound posts.
///
/// The window opens with the first request after a reset. Waiting callers
/// queue on a fair mutex, so they are released in arrival order.
#[derive(Debug)]
pub struct RateLimiter {
    max_requests: usize,
    period: Duration,
    window: Mutex<Window>,
}

impl RateLimiter {
    /// Creates a limiter allowing `max_requests` per `period`.
    ///
    /// A budget of zero would block forever, so it is raised to one.
    pub fn new(max_requests: usize, period: Duration) -> Self {
        if max_requests == 0 {
            warn!("Rate limit budget of 0 requests is unusable, using 1");
        }
        Self {
            max_requests: max_requests.max(1),
            period,
            window: Mutex::new(Window::default()),
        }
    }

    pub fn max_requests(&self) -> usize {
        self.max_requests
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Waits until the budget allows one more request, then records it.
    pub async fn acquire(&self) {
        // The lock is held while sleeping so later callers stay queued behind us.
        let mut window = self.window.lock().await;

        loop {
            let now = Instant::now();
            if let Some(started_at) = window.started_at {
                if now >= started_at + self.period {
                    debug!("Rate window expired, resetting budget");
                    *window = Window::default();
                }
            }

            if window.used < self.max_requests {
                window.started_at.get_or_insert(now);
                window.used += 1;
                debug!(
                    "Rate budget: {}/{} requests used in current window",
                    window.used, self.max_requests
                );
                return;
            }

            let reset_at = window.started_at.map_or(now, |started_at| started_at + self.period);
            warn!(
                "Outbound budget of {} requests exhausted, waiting {:?} for the window to reset",
                self.max_requests,
                reset_at.saturating_duration_since(now)
            );
            sleep_until(reset_at).await;
        }
    }

    /// Returns how many requests can pass right now without waiting.
    ///
    /// Never waits for the window lock. While another caller holds it, that
    /// caller is either about to use budget or sleeping until the window
    /// resets, so nothing can pass right now and this returns 0.
    pub fn remaining(&self) -> usize {
        let Ok(window) = self.window.try_lock() else {
            return 0;
        };
        match window.started_at {
            Some(started_at) if Instant::now() < started_at + self.period => {
                self.max_requests.saturating_sub(window.used)
            }
            _ => self.max_requests,
        }
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_REQUESTS, DEFAULT_PERIOD)
    }
}
