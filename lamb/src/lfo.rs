//! The poll-rate controller tying switches, knobs and range selection to
//! the increments published for the tick context.

use crate::range::RangeIndicator;
use crate::util::KnobFilter;
use crate::{
    Callback, DebouncedSwitch, DutyFxP, Increments, LfoConfig, LfoShared, PeriodCalculator,
    PeriodTables, RangeSelector,
};

/// One poll's worth of raw readings from the front panel
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ControlInputs {
    /// Frequency knob, `[0, ADC_MAX]`
    pub freq: u16,
    /// Duty knob, `[0, ADC_MAX]`
    pub duty: u16,
    /// Raw level of the range switch (high = high range)
    pub range_switch: bool,
    /// Raw level of the wave switch
    pub wave_switch: bool,
}

/// The pins and channels an LFO is wired to.  These are only identifiers:
/// reading and writing the pins is up to the caller.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LfoPins {
    /// ADC channel of the frequency knob
    pub freq: u8,
    /// ADC channel of the duty knob
    pub duty: u8,
    /// GPIO of the wave switch
    pub wave_switch: u8,
    /// GPIO of the range switch
    pub range_switch: u8,
    /// Output channel of the waveform
    pub output: u8,
}

#[derive(Clone, Copy, PartialEq, Eq)]
struct Observed {
    freq: u16,
    duty: u16,
    high_range: bool,
    clock_period_us: Option<u32>,
}

/// The poll-rate half of the LFO.
///
/// Every call to [Lfo::check] debounces the switches, runs range selection,
/// filters the knobs and, if anything that affects the waveform changed,
/// computes a new increment pair and commits it to the [LfoShared] read by
/// the [crate::Oscillator].
///
/// The range selector and the shared state are borrowed rather than owned
/// because the switch callbacks are bound to them.
pub struct Lfo<'a, I: RangeIndicator = ()> {
    pins: LfoPins,
    calc: PeriodCalculator<'a>,
    shared: &'a LfoShared,
    range: &'a RangeSelector<'a>,
    indicator: I,
    range_switch: DebouncedSwitch<'a, RangeSelector<'a>>,
    wave_switch: DebouncedSwitch<'a, LfoShared>,
    freq: KnobFilter,
    duty: KnobFilter,
    period_us: u32,
    duty_cycle: DutyFxP,
    increments: Increments,
    last: Option<Observed>,
    indicated_high: bool,
}

impl<'a, I: RangeIndicator> Lfo<'a, I> {
    /// Create a new LFO and commit its initial increments.  `initial` is a
    /// reading of the controls taken at power-up: the range and waveform
    /// start out wherever the switches point.
    pub fn new(
        config: &LfoConfig,
        pins: LfoPins,
        tables: &'a PeriodTables,
        shared: &'a LfoShared,
        range: &'a RangeSelector<'a>,
        mut indicator: I,
        initial: &ControlInputs,
    ) -> Result<Self, &'static str> {
        let config = config.validate()?;
        if range.crossover_period_us() != config.crossover_period_us() {
            return Err("Range selector was built from a different configuration");
        }
        let range_switch = DebouncedSwitch::new(
            pins.range_switch,
            false,
            initial.range_switch,
            Callback::method(range, RangeSelector::request_high),
            Callback::method(range, RangeSelector::request_low),
        )
        .with_window(config.debounce_ms);
        let wave_switch = DebouncedSwitch::new(
            pins.wave_switch,
            false,
            initial.wave_switch,
            Callback::method(shared, LfoShared::toggle_shape),
            Callback::method(shared, LfoShared::toggle_shape),
        )
        .with_window(config.debounce_ms);
        if range_switch.is_engaged() {
            range.request_high();
        } else {
            range.request_low();
        }
        shared.set_triangle(wave_switch.is_engaged());
        indicator.set_high_range(range.is_high());
        let mut ret = Self {
            pins,
            calc: PeriodCalculator::new(&config, tables),
            shared,
            range,
            indicator,
            range_switch,
            wave_switch,
            freq: KnobFilter::new(config.knob_dead_zone, config.knob_hysteresis, initial.freq),
            duty: KnobFilter::new(config.knob_dead_zone, config.knob_hysteresis, initial.duty),
            period_us: config.low.slowest_us,
            duty_cycle: config.duty_min,
            increments: Increments::default(),
            last: None,
            indicated_high: range.is_high(),
        };
        ret.recompute();
        Ok(ret)
    }

    /// Run one poll.  `now_ms` is a monotonic millisecond timestamp.  Returns
    /// true if new increments were committed.
    pub fn check(&mut self, inputs: &ControlInputs, now_ms: u32) -> bool {
        self.range_switch.check(inputs.range_switch, now_ms);
        self.wave_switch.check(inputs.wave_switch, now_ms);
        self.range.update(self.range_switch.is_engaged());
        let high = self.range.is_high();
        if high != self.indicated_high {
            self.indicated_high = high;
            self.indicator.set_high_range(high);
        }
        self.freq.update(inputs.freq);
        self.duty.update(inputs.duty);
        self.recompute()
    }

    fn observe(&self) -> Observed {
        Observed {
            freq: self.freq.value(),
            duty: self.duty.value(),
            high_range: self.range.is_high(),
            clock_period_us: self
                .range
                .clocked()
                .then(|| self.range.clock().period_us()),
        }
    }

    fn recompute(&mut self) -> bool {
        let observed = self.observe();
        if self.last == Some(observed) {
            return false;
        }
        self.last = Some(observed);
        let period_us = self.calc.period_us(
            observed.freq,
            observed.high_range,
            observed.clock_period_us,
        );
        let duty_cycle = self.calc.duty(observed.duty);
        let increments = self.calc.increments(period_us, duty_cycle);
        self.shared.commit(increments);
        log::trace!(
            "period {}us duty {} -> increments {}/{}",
            period_us,
            duty_cycle,
            increments.rising(),
            increments.falling()
        );
        self.period_us = period_us;
        self.duty_cycle = duty_cycle;
        self.increments = increments;
        true
    }

    /// Restart the waveform at the bottom of the rising half on the next tick
    pub fn reset_phase(&self) {
        self.shared.request_reset();
    }

    /// The current target period, in microseconds
    pub fn period_us(&self) -> u32 {
        self.period_us
    }
    /// The current duty cycle
    pub fn duty(&self) -> DutyFxP {
        self.duty_cycle
    }
    /// The increments most recently committed
    pub fn increments(&self) -> Increments {
        self.increments
    }
    /// Is the high range selected?
    pub fn high_range(&self) -> bool {
        self.range.is_high()
    }
    /// Is the triangle wave selected?
    pub fn triangle(&self) -> bool {
        self.shared.triangle()
    }
    /// The wiring this LFO was created with
    pub fn pins(&self) -> &LfoPins {
        &self.pins
    }
    /// The range indicator
    pub fn indicator(&self) -> &I {
        &self.indicator
    }
}
