//! Clock adapters.
//!
//! - [`SystemClock`] reads the wall clock.
//! - [`SimulatedClock`] only moves when told to, for replays and tests
//!   where the cooldown window must be crossed deterministically.

use core::cell::Cell;

use chrono::{DateTime, Duration, Utc};

use crate::app::ports::ClockPort;

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl ClockPort for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Manually advanced clock.
#[derive(Debug, Clone)]
pub struct SimulatedClock {
    now: Cell<DateTime<Utc>>,
}

impl SimulatedClock {
    pub fn starting_at(start: DateTime<Utc>) -> Self {
        Self {
            now: Cell::new(start),
        }
    }

    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
    }

    pub fn advance_secs(&self, secs: i64) {
        self.advance(Duration::seconds(secs));
    }
}

impl ClockPort for SimulatedClock {
    fn now(&self) -> DateTime<Utc> {
        self.now.get()
    }
}
