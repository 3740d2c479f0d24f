#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Fixed-cadence publisher that coalesces session snapshots for observers.

use std::time::Duration;

use lane_defence_core::StateSnapshot;
use tracing::debug;

const NANOS_PER_SEC: u128 = 1_000_000_000;

/// Configuration parameters required to construct the publisher.
#[derive(Clone, Copy, Debug)]
pub struct Config {
    interval: Duration,
}

impl Config {
    /// Creates a new configuration publishing once per `interval`.
    ///
    /// A zero interval publishes on every call.
    #[must_use]
    pub const fn new(interval: Duration) -> Self {
        Self { interval }
    }
}

/// Publishes at most one snapshot per call once the cadence elapsed.
#[derive(Debug)]
pub struct Publisher {
    interval: Duration,
    accumulator: Duration,
    pending: Option<PublishRequest>,
    last_snapshot: Option<StateSnapshot>,
}

impl Publisher {
    /// Creates a new publisher using the supplied configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            interval: config.interval,
            accumulator: Duration::ZERO,
            pending: None,
            last_snapshot: None,
        }
    }

    /// Returns the last snapshot published, if any.
    #[must_use]
    pub fn last_snapshot(&self) -> Option<&StateSnapshot> {
        self.last_snapshot.as_ref()
    }

    /// Forces a publish on the next call regardless of cadence.
    pub fn request_immediate(&mut self) {
        self.enqueue_request(PublishRequest::Immediate);
    }

    /// Accumulates `dt` and publishes a freshly captured snapshot when due.
    ///
    /// `capture` runs at most once per call and only when a snapshot is due.
    pub fn handle<F>(&mut self, dt: Duration, capture: F, out: &mut Vec<StateSnapshot>)
    where
        F: FnOnce() -> StateSnapshot,
    {
        self.accumulator = self.accumulator.saturating_add(dt);
        let due = self.resolve_due_intervals();
        if due > 1 {
            debug!(skipped = due - 1, "coalesced snapshot backlog");
        }
        if due > 0 {
            self.enqueue_request(PublishRequest::Cadence);
        }

        if self.pending.take().is_none() {
            return;
        }

        let snapshot = capture();
        self.last_snapshot = Some(snapshot.clone());
        out.push(snapshot);
    }

    fn resolve_due_intervals(&mut self) -> u32 {
        if self.interval.is_zero() {
            self.accumulator = Duration::ZERO;
            return 1;
        }

        let accumulated = self.accumulator.as_nanos();
        let interval = self.interval.as_nanos();
        let remainder = accumulated % interval;
        self.accumulator = Duration::new(
            u64::try_from(remainder / NANOS_PER_SEC).unwrap_or(u64::MAX),
            u32::try_from(remainder % NANOS_PER_SEC).unwrap_or(0),
        );
        u32::try_from(accumulated / interval).unwrap_or(u32::MAX)
    }

    fn enqueue_request(&mut self, request: PublishRequest) {
        match (self.pending, request) {
            (None, _) | (Some(PublishRequest::Cadence), PublishRequest::Immediate) => {
                self.pending = Some(request);
            }
            _ => {}
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum PublishRequest {
    Cadence,
    Immediate,
}
