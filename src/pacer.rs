//! Dispatch pacing: minimum spacing between outbound requests.

use std::time::Duration;
use tokio::time::Instant;

/// Default spacing between dispatches (the upstream allows a few requests per
/// second; 2.5s keeps a single client comfortably below the limit).
pub const DEFAULT_MIN_INTERVAL: Duration = Duration::from_millis(2500);

/// Tracks the last dispatch and computes how long the next one must wait.
///
/// The pacer does no I/O and never sleeps; the queue asks it for a wait,
/// sleeps, and then records the dispatch when it actually happens.
#[derive(Debug, Clone)]
pub struct Pacer {
    min_interval: Duration,
    last_dispatch: Option<Instant>,
}

impl Pacer {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_dispatch: None,
        }
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    pub fn last_dispatch(&self) -> Option<Instant> {
        self.last_dispatch
    }

    /// Wait required before a dispatch at `now` is allowed. Zero when nothing
    /// has been dispatched yet or the spacing has already elapsed.
    pub fn time_until_next_slot(&self, now: Instant) -> Duration {
        match self.last_dispatch {
            Some(last) => self
                .min_interval
                .saturating_sub(now.saturating_duration_since(last)),
            None => Duration::ZERO,
        }
    }

    /// Record a dispatch. Timestamps never move backwards.
    pub fn record_dispatch(&mut self, at: Instant) {
        self.last_dispatch = Some(match self.last_dispatch {
            Some(last) if last > at => last,
            _ => at,
        });
    }
}

impl Default for Pacer {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_INTERVAL)
    }
}
