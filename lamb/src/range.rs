//! Selection between the low and high frequency ranges.

use crate::{ClockSync, LfoConfig};
use core::cell::Cell;
use embedded_hal::digital::OutputPin;

/// Something that wants to hear about range changes, e.g. an LED
pub trait RangeIndicator {
    /// Called once per range change with the new range
    fn set_high_range(&mut self, high: bool);
}

/// Ignore range changes
impl RangeIndicator for () {
    fn set_high_range(&mut self, _high: bool) {}
}

/// Drive an output pin high while the high range is selected
#[derive(Debug)]
pub struct IndicatorPin<P: OutputPin>(pub P);

impl<P: OutputPin> RangeIndicator for IndicatorPin<P> {
    fn set_high_range(&mut self, high: bool) {
        let result = if high {
            self.0.set_high()
        } else {
            self.0.set_low()
        };
        if result.is_err() {
            log::warn!("Failed to drive range indicator");
        }
    }
}

/// Hysteretic selection of the frequency range.
///
/// Manually, the range follows a switch: its engage callback requests the
/// high range and its disengage callback the low range.  While an external
/// clock is active those requests are ignored and the range instead follows
/// the clock period: slower than the crossover period selects the low range,
/// faster selects the high range, and a period exactly at the crossover keeps
/// whichever range is current.  When the clock goes away the range is put
/// back wherever the switch currently points.
///
/// All state lives in [Cell]s so that switch callbacks can be bound to a
/// shared reference (see [crate::Callback::Method]).
#[derive(Debug)]
pub struct RangeSelector<'a> {
    clock: &'a ClockSync,
    crossover_us: u32,
    high: Cell<bool>,
    was_clocked: Cell<bool>,
}

impl<'a> RangeSelector<'a> {
    /// Create a new selector starting in the range chosen by `high`.  The
    /// config is only used for its crossover period; [crate::Lfo::new]
    /// validates it and checks that it matches its own.
    pub fn new(config: &LfoConfig, clock: &'a ClockSync, high: bool) -> Self {
        Self {
            clock,
            crossover_us: config.crossover_period_us(),
            high: Cell::new(high),
            was_clocked: Cell::new(clock.is_active()),
        }
    }

    /// Is the high range selected?
    pub fn is_high(&self) -> bool {
        self.high.get()
    }
    /// Is the external clock in control of the range?
    pub fn clocked(&self) -> bool {
        self.clock.is_active()
    }
    /// The clock period at which automatic selection flips
    pub fn crossover_period_us(&self) -> u32 {
        self.crossover_us
    }
    /// The clock feeding this selector
    pub fn clock(&self) -> &'a ClockSync {
        self.clock
    }

    /// Manual request for the high range
    pub fn request_high(&self) {
        self.request(true);
    }
    /// Manual request for the low range
    pub fn request_low(&self) {
        self.request(false);
    }
    fn request(&self, high: bool) {
        if !self.clocked() {
            self.set(high);
        }
    }
    fn set(&self, high: bool) {
        if self.high.replace(high) != high {
            log::debug!("Range -> {}", if high { "high" } else { "low" });
        }
    }

    /// Run the automatic part of range selection.  `switch_high` is the
    /// current debounced position of the manual range switch.
    pub fn update(&self, switch_high: bool) {
        let clocked = self.clocked();
        if self.was_clocked.replace(clocked) != clocked {
            log::debug!("Clock {}", if clocked { "locked" } else { "released" });
            if !clocked {
                self.set(switch_high);
            }
        }
        if clocked {
            let period = self.clock.period_us();
            if period > self.crossover_us && self.is_high() {
                self.set(false);
            } else if period < self.crossover_us && !self.is_high() {
                self.set(true);
            }
        }
    }
}
