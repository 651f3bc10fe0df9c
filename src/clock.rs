//! Simulation clock
//!
//! The surrounding engine owns time; nodes only read it. [`SimClock`] is a
//! cloneable handle so the engine and every node observe the same value.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Source of the current simulation time, in seconds
pub trait Clock {
    fn now(&self) -> f64;
}

/// Shared, manually advanced simulation clock
#[derive(Debug, Clone, Default)]
pub struct SimClock {
    bits: Arc<AtomicU64>,
}

impl SimClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a clock starting at `time`
    pub fn at(time: f64) -> Self {
        let clock = Self::new();
        clock.set(time);
        clock
    }

    pub fn set(&self, time: f64) {
        self.bits.store(time.to_bits(), Ordering::SeqCst);
    }

    /// Move the clock forward by `delta` seconds
    pub fn advance(&self, delta: f64) {
        self.set(self.now() + delta);
    }
}

impl Clock for SimClock {
    fn now(&self) -> f64 {
        f64::from_bits(self.bits.load(Ordering::SeqCst))
    }
}
