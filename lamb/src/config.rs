//! Construction-time configuration of an LFO.  Nothing in here is read from a
//! file: a [LfoConfig] is built in code (usually from [LfoConfig::DEFAULT])
//! and validated once before it is handed to [crate::Lfo::new].

use crate::{DutyFxP, ADC_MAX};

/// The largest clock divide/multiply ratio supported when synchronized to an
/// external clock.  The coefficient table has `2 * MAX_CLOCK_RATIO - 1`
/// entries.
pub const MAX_CLOCK_RATIO: u32 = 16;

/// The span of periods a frequency range can produce, in microseconds
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PeriodRange {
    /// The period with the frequency knob fully counterclockwise
    pub slowest_us: u32,
    /// The period with the frequency knob fully clockwise
    pub fastest_us: u32,
}

impl PeriodRange {
    /// Default low range: 0.05Hz to 5Hz
    pub const LOW: Self = Self::new_unchecked(20_000_000, 200_000);
    /// Default high range: 50Hz to 4kHz
    pub const HIGH: Self = Self::new_unchecked(20_000, 250);

    const fn new_unchecked(slowest_us: u32, fastest_us: u32) -> Self {
        Self {
            slowest_us,
            fastest_us,
        }
    }
    /// Create a new range, checking that `fastest_us` is nonzero and strictly
    /// shorter than `slowest_us`
    pub const fn new(slowest_us: u32, fastest_us: u32) -> Result<Self, &'static str> {
        if fastest_us == 0 {
            Err("Fastest period must be nonzero")
        } else if fastest_us >= slowest_us {
            Err("Fastest period must be shorter than slowest period")
        } else {
            Ok(Self::new_unchecked(slowest_us, fastest_us))
        }
    }
    /// True if `period_us` lies within this range (inclusive)
    pub const fn contains(&self, period_us: u32) -> bool {
        period_us >= self.fastest_us && period_us <= self.slowest_us
    }
}

impl TryFrom<(u32, u32)> for PeriodRange {
    type Error = &'static str;
    fn try_from(value: (u32, u32)) -> Result<Self, Self::Error> {
        Self::new(value.0, value.1)
    }
}

/// How the frequency knob maps onto a range in free-running mode
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum KnobCurve {
    /// Equal knob travel gives an equal frequency ratio.  Uses the lookup
    /// tables in [crate::PeriodTables].
    #[default]
    Exponential,
    /// Period is linearly interpolated across the range
    Linear,
}

/// Every tunable constant of an LFO
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LfoConfig {
    /// The low frequency range
    pub low: PeriodRange,
    /// The high frequency range
    pub high: PeriodRange,
    /// The time between two calls to [crate::Oscillator::tick], in
    /// microseconds
    pub tick_interval_us: u32,
    /// The duty cycle with the duty knob fully counterclockwise
    pub duty_min: DutyFxP,
    /// The duty cycle with the duty knob fully clockwise
    pub duty_max: DutyFxP,
    /// The largest divide/multiply ratio when synchronized to a clock
    pub max_clock_ratio: u32,
    /// Clock periods at or below this are treated as no clock at all
    pub min_clock_period_us: u32,
    /// Free-running knob response
    pub knob_curve: KnobCurve,
    /// Readings within this many counts of either end of the ADC range snap
    /// to that end
    pub knob_dead_zone: u16,
    /// Knob changes of this many counts or fewer are ignored
    pub knob_hysteresis: u16,
    /// How long a switch must read the same value before it is believed
    pub debounce_ms: u32,
}

impl LfoConfig {
    /// The stock configuration of the module
    pub const DEFAULT: Self = Self {
        low: PeriodRange::LOW,
        high: PeriodRange::HIGH,
        tick_interval_us: 20,
        duty_min: DutyFxP::lit("0.1"),
        duty_max: DutyFxP::lit("0.9"),
        max_clock_ratio: 9,
        min_clock_period_us: 200,
        knob_curve: KnobCurve::Exponential,
        knob_dead_zone: 16,
        knob_hysteresis: 4,
        debounce_ms: 50,
    };

    /// Set the frequency ranges
    pub const fn with_ranges(mut self, low: PeriodRange, high: PeriodRange) -> Self {
        self.low = low;
        self.high = high;
        self
    }
    /// Set the tick interval
    pub const fn with_tick_interval(mut self, tick_interval_us: u32) -> Self {
        self.tick_interval_us = tick_interval_us;
        self
    }
    /// Set the duty cycle bounds
    pub const fn with_duty_bounds(mut self, min: DutyFxP, max: DutyFxP) -> Self {
        self.duty_min = min;
        self.duty_max = max;
        self
    }
    /// Set the largest clock divide/multiply ratio
    pub const fn with_max_clock_ratio(mut self, ratio: u32) -> Self {
        self.max_clock_ratio = ratio;
        self
    }
    /// Set the free-running knob response
    pub const fn with_knob_curve(mut self, curve: KnobCurve) -> Self {
        self.knob_curve = curve;
        self
    }

    /// The range selected by `high_range`
    pub const fn range(&self, high_range: bool) -> &PeriodRange {
        if high_range {
            &self.high
        } else {
            &self.low
        }
    }
    /// The clock period at which automatic range selection flips.  Zero if
    /// the ranges overlap, which [LfoConfig::validate] rejects.
    pub const fn crossover_period_us(&self) -> u32 {
        self.low.fastest_us.saturating_sub(self.high.slowest_us) / 2
    }

    /// Check the configuration for consistency
    pub fn validate(self) -> Result<Self, &'static str> {
        PeriodRange::new(self.low.slowest_us, self.low.fastest_us)?;
        PeriodRange::new(self.high.slowest_us, self.high.fastest_us)?;
        if self.high.slowest_us >= self.low.fastest_us {
            return Err("High range must be entirely faster than low range");
        }
        if self.tick_interval_us == 0 {
            return Err("Tick interval must be nonzero");
        }
        if self.duty_min == DutyFxP::ZERO || self.duty_min >= self.duty_max {
            return Err("Duty bounds must satisfy 0 < min < max < 1");
        }
        if self.max_clock_ratio < 1 || self.max_clock_ratio > MAX_CLOCK_RATIO {
            return Err("Clock ratio out of range");
        }
        if self.knob_dead_zone >= ADC_MAX / 4 {
            return Err("Knob dead zone too large");
        }
        Ok(self)
    }
}

impl Default for LfoConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid() {
        assert_eq!(LfoConfig::DEFAULT.validate(), Ok(LfoConfig::DEFAULT));
        assert_eq!(LfoConfig::DEFAULT.crossover_period_us(), 90_000);
    }
    #[test]
    fn range_construction() {
        assert!(PeriodRange::new(1000, 1000).is_err());
        assert!(PeriodRange::new(1000, 0).is_err());
        assert_eq!(PeriodRange::try_from((1000, 10)), PeriodRange::new(1000, 10));
        assert!(PeriodRange::LOW.contains(200_000));
        assert!(!PeriodRange::LOW.contains(199_999));
    }
    #[test]
    fn rejects_bad_configs() {
        let overlapping = LfoConfig::DEFAULT.with_ranges(
            PeriodRange::LOW,
            PeriodRange::new(300_000, 250).unwrap(),
        );
        assert!(overlapping.validate().is_err());
        assert_eq!(overlapping.crossover_period_us(), 0);
        assert!(LfoConfig::DEFAULT.with_tick_interval(0).validate().is_err());
        let inverted = LfoConfig::DEFAULT.with_duty_bounds(DutyFxP::lit("0.9"), DutyFxP::lit("0.1"));
        assert!(inverted.validate().is_err());
        let zero = LfoConfig::DEFAULT.with_duty_bounds(DutyFxP::ZERO, DutyFxP::lit("0.5"));
        assert!(zero.validate().is_err());
        assert!(LfoConfig::DEFAULT.with_max_clock_ratio(0).validate().is_err());
        assert!(LfoConfig::DEFAULT
            .with_max_clock_ratio(MAX_CLOCK_RATIO + 1)
            .validate()
            .is_err());
    }
}
