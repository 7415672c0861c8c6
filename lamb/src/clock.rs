//! Shared state describing an external clock input.
//!
//! A [ClockSync] has exactly one writer, the clock capture interrupt, and is
//! read without locking from the poll loop.  A stale read only delays a
//! period change by one poll, so no synchronization beyond the atomics
//! themselves is needed.

use core::sync::atomic::{AtomicBool, AtomicU32, Ordering};

/// The measured state of an external clock input
#[derive(Debug)]
pub struct ClockSync {
    selected: AtomicBool,
    armed: AtomicBool,
    period_us: AtomicU32,
    last_edge_us: AtomicU32,
    min_period_us: u32,
}

impl ClockSync {
    /// Create a new, unselected clock.  Measured periods at or below
    /// `min_period_us` do not count as an active clock.
    pub const fn new(min_period_us: u32) -> Self {
        Self {
            selected: AtomicBool::new(false),
            armed: AtomicBool::new(false),
            period_us: AtomicU32::new(0),
            last_edge_us: AtomicU32::new(0),
            min_period_us,
        }
    }

    /// Record whether the clock input is selected (e.g. a jack is patched)
    pub fn set_selected(&self, selected: bool) {
        self.selected.store(selected, Ordering::Relaxed);
        if !selected {
            self.armed.store(false, Ordering::Relaxed);
        }
    }
    /// Record a rising edge on the clock input at `now_us`, a free-running
    /// microsecond timestamp.  The first edge after selection only arms the
    /// measurement; every subsequent edge updates the period.
    pub fn record_edge(&self, now_us: u32) {
        if self.armed.load(Ordering::Relaxed) {
            let last = self.last_edge_us.load(Ordering::Relaxed);
            self.period_us
                .store(now_us.wrapping_sub(last), Ordering::Relaxed);
        } else {
            self.armed.store(true, Ordering::Relaxed);
        }
        self.last_edge_us.store(now_us, Ordering::Relaxed);
    }
    /// Overwrite the measured period directly
    pub fn set_period(&self, period_us: u32) {
        self.period_us.store(period_us, Ordering::Relaxed);
    }

    /// Is the clock input selected?
    pub fn selected(&self) -> bool {
        self.selected.load(Ordering::Relaxed)
    }
    /// The last measured clock period, in microseconds
    pub fn period_us(&self) -> u32 {
        self.period_us.load(Ordering::Relaxed)
    }
    /// True if the LFO should follow the external clock: it must be
    /// selected and running slower than the minimum period
    pub fn is_active(&self) -> bool {
        self.selected() && self.period_us() > self.min_period_us
    }
}

impl Default for ClockSync {
    fn default() -> Self {
        Self::new(crate::LfoConfig::DEFAULT.min_clock_period_us)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inactive_until_selected_and_measured() {
        let clock = ClockSync::new(200);
        assert!(!clock.is_active());
        clock.record_edge(1_000);
        clock.record_edge(101_000);
        assert_eq!(clock.period_us(), 100_000);
        assert!(!clock.is_active());
        clock.set_selected(true);
        assert!(clock.is_active());
    }
    #[test]
    fn first_edge_only_arms() {
        let clock = ClockSync::new(200);
        clock.set_selected(true);
        clock.record_edge(5_000);
        assert_eq!(clock.period_us(), 0);
        assert!(!clock.is_active());
        clock.record_edge(55_000);
        assert_eq!(clock.period_us(), 50_000);
        assert!(clock.is_active());
    }
    #[test]
    fn too_fast_is_inactive() {
        let clock = ClockSync::new(200);
        clock.set_selected(true);
        clock.set_period(200);
        assert!(!clock.is_active());
        clock.set_period(201);
        assert!(clock.is_active());
    }
    #[test]
    fn timestamp_wraparound() {
        let clock = ClockSync::new(200);
        clock.record_edge(u32::MAX - 499);
        clock.record_edge(500);
        assert_eq!(clock.period_us(), 1_000);
    }
}
