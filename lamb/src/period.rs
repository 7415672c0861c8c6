//! Translation of knob positions into a period, a duty cycle and finally a
//! pair of phase increments.

use crate::config::MAX_CLOCK_RATIO;
use crate::fixedmath::{interpolate, phase_increment, scale_by_duty};
use crate::{float_approx, DutyFxP, Increments, KnobCurve, LfoConfig, PeriodRange, ADC_MAX};
use arrayvec::ArrayVec;

/// The number of entries in each knob lookup table, one per ADC reading
pub const TABLE_LEN: usize = ADC_MAX as usize + 1;
const RATIO_TABLE_CAPACITY: usize = 2 * MAX_CLOCK_RATIO as usize - 1;

/// Exponential knob response tables, one per frequency range.
///
/// Entry `k` of a table holds
/// `fastest * exp((ADC_MAX - k) * ln(slowest / fastest) / ADC_MAX)`, so that
/// every step of the knob changes the frequency by the same ratio.  The
/// tables are computed once at startup so that the poll loop never needs to
/// evaluate a transcendental function.  They are large (32KiB together), so
/// on the target they should live in a `static` and be filled in place with
/// [PeriodTables::build].
pub struct PeriodTables {
    low: [u32; TABLE_LEN],
    high: [u32; TABLE_LEN],
}

impl PeriodTables {
    /// Unfilled tables, suitable for a `static` initializer
    pub const fn empty() -> Self {
        Self {
            low: [0u32; TABLE_LEN],
            high: [0u32; TABLE_LEN],
        }
    }
    /// Build both tables for `config`
    pub fn new(config: &LfoConfig) -> Self {
        let mut tables = Self::empty();
        tables.build(config);
        tables
    }
    /// Fill both tables in place for `config`
    pub fn build(&mut self, config: &LfoConfig) {
        fill_table(&mut self.low, &config.low);
        fill_table(&mut self.high, &config.high);
    }
    /// The table for the given range
    pub fn table(&self, high_range: bool) -> &[u32; TABLE_LEN] {
        if high_range {
            &self.high
        } else {
            &self.low
        }
    }
}

fn fill_table(table: &mut [u32; TABLE_LEN], range: &PeriodRange) {
    let fastest = range.fastest_us as f64;
    let ln_ratio = float_approx::ln(range.slowest_us as f64 / fastest);
    for (k, entry) in table.iter_mut().enumerate() {
        let exponent = ((ADC_MAX as usize - k) as f64) * ln_ratio / (ADC_MAX as f64);
        let period = fastest * float_approx::exp(exponent) + 0.5;
        *entry = (period as u32).clamp(range.fastest_us, range.slowest_us);
    }
}

/// The divide/multiply coefficients selectable by the frequency knob while
/// synchronized to an external clock.
///
/// For a maximum ratio N this is the `2N - 1` entry sweep
/// `{N, N-1, ..., 2, 1, 2, ..., N-1, N}`.  The lower half of the knob
/// multiplies the clock period by the coefficient (dividing the frequency),
/// the upper half divides it.
#[derive(Clone, Debug)]
pub struct ClockRatios {
    table: ArrayVec<u32, RATIO_TABLE_CAPACITY>,
}

impl ClockRatios {
    /// Build the table for ratios up to `max_ratio`, which is clamped to
    /// `[1, MAX_CLOCK_RATIO]`
    pub fn new(max_ratio: u32) -> Self {
        let n = max_ratio.clamp(1, MAX_CLOCK_RATIO);
        let table = (1..n)
            .rev()
            .map(|i| i + 1)
            .chain(1..=n)
            .collect::<ArrayVec<u32, RATIO_TABLE_CAPACITY>>();
        Self { table }
    }
    /// The coefficients, from fully counterclockwise to fully clockwise
    pub fn as_slice(&self) -> &[u32] {
        &self.table
    }
    /// The table index the knob reading falls in
    pub fn index(&self, knob: u16) -> usize {
        let bucket = (ADC_MAX as usize / self.table.len()).max(1);
        (knob as usize / bucket).min(self.table.len() - 1)
    }
    /// Apply the coefficient selected by `knob` to `clock_period_us`
    pub fn apply(&self, knob: u16, clock_period_us: u32) -> u32 {
        let coefficient = self.table[self.index(knob)];
        if (knob as u32) * 2 < ADC_MAX as u32 {
            clock_period_us.saturating_mul(coefficient)
        } else {
            clock_period_us / coefficient
        }
    }
}

/// Turns knob readings into periods and increments.  All inputs are
/// expected to already be filtered (see [crate::util::KnobFilter]).
pub struct PeriodCalculator<'a> {
    config: LfoConfig,
    tables: &'a PeriodTables,
    ratios: ClockRatios,
}

impl<'a> PeriodCalculator<'a> {
    /// Create a new calculator.  `tables` must have been built for `config`
    /// unless `config.knob_curve` is [KnobCurve::Linear], in which case they
    /// are never read.
    pub fn new(config: &LfoConfig, tables: &'a PeriodTables) -> Self {
        Self {
            config: *config,
            tables,
            ratios: ClockRatios::new(config.max_clock_ratio),
        }
    }

    /// The clock coefficient table in use
    pub fn ratios(&self) -> &ClockRatios {
        &self.ratios
    }

    /// The target period for a frequency knob reading.  `clock_period_us` is
    /// `Some` while synchronized to an active external clock.
    pub fn period_us(&self, freq_knob: u16, high_range: bool, clock_period_us: Option<u32>) -> u32 {
        let knob = freq_knob.min(ADC_MAX);
        match clock_period_us {
            Some(clock) => self
                .ratios
                .apply(knob, clock)
                .clamp(self.config.high.fastest_us, self.config.low.slowest_us),
            None => {
                let range = self.config.range(high_range);
                match self.config.knob_curve {
                    KnobCurve::Exponential => self.tables.table(high_range)[knob as usize]
                        .clamp(range.fastest_us, range.slowest_us),
                    KnobCurve::Linear => interpolate(
                        knob as u32,
                        ADC_MAX as u32,
                        range.slowest_us,
                        range.fastest_us,
                    ),
                }
            }
        }
    }

    /// The duty cycle for a duty knob reading, between the configured bounds
    pub fn duty(&self, duty_knob: u16) -> DutyFxP {
        let bits = interpolate(
            duty_knob as u32,
            ADC_MAX as u32,
            self.config.duty_min.to_bits() as u32,
            self.config.duty_max.to_bits() as u32,
        );
        DutyFxP::from_bits(bits as u16)
    }

    /// The per-tick phase steps that produce `period_us` with the rising half
    /// taking `duty` of it
    pub fn increments(&self, period_us: u32, duty: DutyFxP) -> Increments {
        let rising_us = scale_by_duty(period_us, duty);
        let falling_us = period_us - rising_us;
        let tick = self.config.tick_interval_us;
        Increments::new(
            phase_increment(rising_us, tick),
            phase_increment(falling_us, tick),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PhaseFxP;
    use rand::rngs::SmallRng;
    use rand::{Rng, SeedableRng};

    fn tables() -> Box<PeriodTables> {
        Box::new(PeriodTables::new(&LfoConfig::DEFAULT))
    }

    #[test]
    fn tables_hit_endpoints_and_are_monotonic() {
        let tables = tables();
        for (high, range) in [(false, PeriodRange::LOW), (true, PeriodRange::HIGH)] {
            let table = tables.table(high);
            assert_eq!(table[0], range.slowest_us);
            assert_eq!(table[TABLE_LEN - 1], range.fastest_us);
            assert!(table.windows(2).all(|w| w[0] >= w[1]));
        }
    }
    #[test]
    fn tables_are_exponential() {
        let tables = tables();
        // halfway along the knob is the geometric mean of the range
        let mid = tables.table(false)[2047] as f64;
        let expected = 200_000f64 * 100f64.powf(2048.0 / 4095.0);
        assert!((mid / expected - 1.0).abs() < 1e-6);
    }
    #[test]
    fn free_running_endpoints() {
        let tables = tables();
        let calc = PeriodCalculator::new(&LfoConfig::DEFAULT, &tables);
        assert_eq!(calc.period_us(0, false, None), 20_000_000);
        assert_eq!(calc.period_us(ADC_MAX, false, None), 200_000);
        assert_eq!(calc.period_us(0, true, None), 20_000);
        assert_eq!(calc.period_us(ADC_MAX, true, None), 250);
        assert_eq!(calc.period_us(u16::MAX, true, None), 250);
    }
    #[test]
    fn linear_curve() {
        let config = LfoConfig::DEFAULT.with_knob_curve(KnobCurve::Linear);
        let empty = Box::new(PeriodTables::empty());
        let calc = PeriodCalculator::new(&config, &empty);
        assert_eq!(calc.period_us(0, false, None), 20_000_000);
        assert_eq!(calc.period_us(ADC_MAX, false, None), 200_000);
        assert_eq!(calc.period_us(ADC_MAX, true, None), 250);
        let quarter = calc.period_us(1024, true, None);
        assert!((15_000..15_100).contains(&quarter));
    }
    #[test]
    fn ratio_table_is_symmetric() {
        for n in 1..=MAX_CLOCK_RATIO {
            let ratios = ClockRatios::new(n);
            let table = ratios.as_slice();
            let len = (2 * n - 1) as usize;
            assert_eq!(table.len(), len);
            assert_eq!(table[0], n);
            assert_eq!(table[len - 1], n);
            assert_eq!(table[(n - 1) as usize], 1);
            let center = (n - 1) as usize;
            assert!(table[..=center].windows(2).all(|w| w[0] >= w[1]));
            assert!(table[center..].windows(2).all(|w| w[0] <= w[1]));
        }
        assert_eq!(
            ClockRatios::new(9).as_slice(),
            &[9, 8, 7, 6, 5, 4, 3, 2, 1, 2, 3, 4, 5, 6, 7, 8, 9]
        );
        assert_eq!(ClockRatios::new(100).as_slice().len(), RATIO_TABLE_CAPACITY);
    }
    #[test]
    fn clocked_periods() {
        let tables = tables();
        let calc = PeriodCalculator::new(&LfoConfig::DEFAULT, &tables);
        let unity_knob = 240 * 8 + 100;
        assert_eq!(calc.ratios().index(unity_knob), 8);
        assert_eq!(calc.period_us(unity_knob, false, Some(100_000)), 100_000);
        assert_eq!(calc.period_us(0, false, Some(100_000)), 900_000);
        assert_eq!(calc.period_us(ADC_MAX, false, Some(100_000)), 11_111);
        // clamped to the slowest and fastest representable periods
        assert_eq!(calc.period_us(0, true, Some(10_000_000)), 20_000_000);
        assert_eq!(calc.period_us(ADC_MAX, true, Some(1_000)), 250);
    }
    #[test]
    fn duty_bounds() {
        let tables = tables();
        let calc = PeriodCalculator::new(&LfoConfig::DEFAULT, &tables);
        assert_eq!(calc.duty(0), LfoConfig::DEFAULT.duty_min);
        assert_eq!(calc.duty(ADC_MAX), LfoConfig::DEFAULT.duty_max);
        let half = calc.duty(ADC_MAX / 2).to_num::<f32>();
        assert!((half - 0.5).abs() < 0.001);
    }
    #[test]
    fn increments_follow_duty() {
        let tables = tables();
        let calc = PeriodCalculator::new(&LfoConfig::DEFAULT, &tables);
        let inc = calc.increments(1_000_000, DutyFxP::lit("0.25"));
        // rising half is a third as long as the falling half
        let ratio = inc.rising().to_num::<f64>() / inc.falling().to_num::<f64>();
        assert!((ratio - 3.0).abs() < 1e-3);
        // 250ms rising half at 20us/tick sweeps the range in 12500 ticks
        let expected = crate::SCALED_RESOLUTION.to_bits() / 12_500;
        assert_eq!(inc.rising().to_bits(), expected);
    }
    #[test]
    fn increments_never_stall() {
        let tables = tables();
        let mut rng = SmallRng::seed_from_u64(0x5eed);
        for config in [
            LfoConfig::DEFAULT,
            LfoConfig::DEFAULT.with_knob_curve(KnobCurve::Linear),
            LfoConfig::DEFAULT.with_tick_interval(1),
        ] {
            let calc = PeriodCalculator::new(&config, &tables);
            for _ in 0..20_000 {
                let clock = rng
                    .gen_bool(0.3)
                    .then(|| rng.gen_range(201..=50_000_000u32));
                let period = calc.period_us(rng.gen(), rng.gen(), clock);
                assert!(period > 0);
                let inc = calc.increments(period, calc.duty(rng.gen_range(0..=ADC_MAX)));
                assert!(inc.rising() >= PhaseFxP::DELTA);
                assert!(inc.falling() >= PhaseFxP::DELTA);
                assert!(inc.rising() <= crate::SCALED_RESOLUTION);
                assert!(inc.falling() <= crate::SCALED_RESOLUTION);
            }
        }
    }
}
