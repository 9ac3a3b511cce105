//! Time source and epoch clock
//!
//! Epochs are `floor(time / duration)`. The stored epoch only ever moves
//! forward: clock jitter inside an epoch, or a later change of duration that
//! would renumber `now` into an earlier epoch, leaves it untouched.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicI64, Ordering};

use crate::types::{Epoch, Timestamp};

/// Source of wall-clock time for the engine
pub trait Clock: Send + Sync {
    /// Current Unix time in seconds
    fn now(&self) -> Timestamp;
}

/// Wall clock backed by the system time
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        chrono::Utc::now().timestamp()
    }
}

/// Manually driven clock for tests and simulations
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicI64,
}

impl ManualClock {
    pub fn new(start: Timestamp) -> Self {
        Self {
            now: AtomicI64::new(start),
        }
    }

    pub fn set(&self, timestamp: Timestamp) {
        self.now.store(timestamp, Ordering::SeqCst);
    }

    pub fn advance(&self, secs: i64) -> Timestamp {
        self.now.fetch_add(secs, Ordering::SeqCst) + secs
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        self.now.load(Ordering::SeqCst)
    }
}

/// Lazily advanced epoch counter
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpochClock {
    /// Epoch length in seconds
    duration_secs: u64,
    /// Highest epoch observed so far
    current: Epoch,
}

impl EpochClock {
    pub fn new(duration_secs: u64, now: Timestamp) -> Self {
        let mut clock = Self {
            duration_secs,
            current: 0,
        };
        clock.current = clock.epoch_of(now);
        clock
    }

    /// Epoch containing `timestamp`; times before the Unix epoch map to 0
    pub fn epoch_of(&self, timestamp: Timestamp) -> Epoch {
        if timestamp <= 0 {
            return 0;
        }
        timestamp as u64 / self.duration_secs
    }

    pub fn current(&self) -> Epoch {
        self.current
    }

    pub fn duration_secs(&self) -> u64 {
        self.duration_secs
    }

    /// Epoch that an advance at `now` would settle on, without mutating
    pub fn peek(&self, now: Timestamp) -> Epoch {
        self.current.max(self.epoch_of(now))
    }

    /// Raise the stored epoch to `epoch_of(now)`; returns the new epoch on rollover
    pub fn advance(&mut self, now: Timestamp) -> Option<Epoch> {
        let observed = self.epoch_of(now);
        if observed > self.current {
            self.current = observed;
            Some(observed)
        } else {
            None
        }
    }

    /// Change the divisor for future epochs; history is not renumbered
    pub fn set_duration(&mut self, duration_secs: u64) {
        self.duration_secs = duration_secs;
    }

    /// Start of the next epoch under the current duration
    pub fn next_epoch_start(&self) -> Timestamp {
        ((self.current + 1) * self.duration_secs) as Timestamp
    }
}
