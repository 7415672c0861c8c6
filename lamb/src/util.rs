//! Various utility types for conditioning raw inputs

use crate::fixedmath::interpolate;
use crate::ADC_MAX;

/// Conditioning for a noisy knob reading.
///
/// Readings within `dead_zone` counts of either end of the ADC range snap to
/// that end, and the rest of the travel is stretched to cover the whole
/// `[0, ADC_MAX]` domain, so both extremes are reachable despite noise and
/// pot tolerances.  On top of that, a new reading only replaces the held
/// value if it moved by more than `hysteresis` counts, or reached an end of
/// travel, which keeps ADC jitter from triggering a recomputation every
/// poll.
#[derive(Clone, Copy, Debug)]
pub struct KnobFilter {
    dead_zone: u16,
    hysteresis: u16,
    value: u16,
}

impl KnobFilter {
    /// Create a new filter holding the conditioned value of `initial`
    pub fn new(dead_zone: u16, hysteresis: u16, initial: u16) -> Self {
        let mut ret = Self {
            dead_zone,
            hysteresis,
            value: 0,
        };
        ret.value = ret.remap(initial);
        ret
    }
    fn remap(&self, raw: u16) -> u16 {
        let lo = self.dead_zone;
        let hi = ADC_MAX - self.dead_zone;
        let clamped = raw.clamp(lo, hi) - lo;
        interpolate(clamped as u32, (hi - lo) as u32, 0, ADC_MAX as u32) as u16
    }
    /// Feed a new raw reading, returning the held value
    pub fn update(&mut self, raw: u16) -> u16 {
        let candidate = self.remap(raw);
        let at_end = candidate == 0 || candidate == ADC_MAX;
        if candidate.abs_diff(self.value) > self.hysteresis || (at_end && candidate != self.value) {
            self.value = candidate;
        }
        self.value
    }
    /// The currently held value
    pub fn value(&self) -> u16 {
        self.value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dead_zone_reaches_both_ends() {
        let mut knob = KnobFilter::new(16, 4, 2000);
        assert_eq!(knob.update(3), 0);
        assert_eq!(knob.update(16), 0);
        assert_eq!(knob.update(ADC_MAX - 10), ADC_MAX);
        assert_eq!(knob.update(ADC_MAX), ADC_MAX);
    }
    #[test]
    fn jitter_is_suppressed() {
        let mut knob = KnobFilter::new(0, 4, 2000);
        assert_eq!(knob.value(), 2000);
        for raw in [2001, 1999, 2004, 1996, 2003] {
            assert_eq!(knob.update(raw), 2000);
        }
        assert_eq!(knob.update(2005), 2005);
        assert_eq!(knob.update(2002), 2005);
    }
    #[test]
    fn ends_snap_even_inside_hysteresis() {
        let mut knob = KnobFilter::new(0, 8, 3);
        assert_eq!(knob.value(), 3);
        assert_eq!(knob.update(0), 0);
        let mut knob = KnobFilter::new(0, 8, ADC_MAX - 2);
        assert_eq!(knob.update(ADC_MAX), ADC_MAX);
    }
    #[test]
    fn remap_is_monotonic() {
        let knob = KnobFilter::new(16, 0, 0);
        let mut last = 0;
        for raw in 0..=ADC_MAX {
            let v = knob.remap(raw);
            assert!(v >= last);
            last = v;
        }
    }
}
