//! The tick-rate half of the LFO: a reflecting phase accumulator.

use crate::sink::OutputSink;
use crate::{Increments, LfoShared, PhaseFxP, DAC_MAX, SCALED_RESOLUTION};

/// A ping-pong phase accumulator.
///
/// Every tick the phase moves up by the rising increment or down by the
/// falling increment.  Overshooting either bound reflects the overshoot back
/// into range and reverses direction, so a change of increments mid-cycle
/// never produces a discontinuity and never needs the phase re-zeroed.
///
/// The triangle output is the descaled phase.  The pulse output is full
/// scale while rising and zero while falling, and is only reported when it
/// changes.
#[derive(Clone, Debug)]
pub struct WaveformEngine {
    phase: PhaseFxP,
    rising: bool,
    last_pulse: Option<bool>,
}

impl WaveformEngine {
    /// Constructor.  Starts at the bottom of the rising half.
    pub const fn new() -> Self {
        Self {
            phase: PhaseFxP::ZERO,
            rising: true,
            last_pulse: None,
        }
    }
    /// Return to the bottom of the rising half.  Calling this repeatedly has
    /// the same effect as calling it once.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// The scaled phase, in `[0, SCALED_RESOLUTION]`
    pub fn phase(&self) -> PhaseFxP {
        self.phase
    }
    /// True during the rising half of the cycle
    pub fn rising(&self) -> bool {
        self.rising
    }

    /// Advance the phase by one tick
    pub fn advance(&mut self, increments: &Increments) {
        if self.rising {
            self.phase += increments.rising();
        } else {
            self.phase -= increments.falling();
        }
        if self.phase >= SCALED_RESOLUTION {
            self.phase = SCALED_RESOLUTION - (self.phase - SCALED_RESOLUTION);
            self.rising = false;
        } else if self.phase <= PhaseFxP::ZERO {
            self.phase = -self.phase;
            self.rising = true;
        }
    }

    /// The triangle output for the current phase
    pub fn triangle_sample(&self) -> u16 {
        self.phase.to_num::<i32>().clamp(0, DAC_MAX as i32) as u16
    }
    /// The pulse output for the current half cycle
    pub fn pulse_sample(&self) -> u16 {
        if self.rising {
            DAC_MAX
        } else {
            0
        }
    }

    /// Advance by one tick and return the sample to write, if any.  A
    /// triangle produces a sample every tick; a pulse only on the ticks where
    /// its level changes (including the first pulse tick after a change of
    /// shape).
    pub fn tick(&mut self, increments: &Increments, triangle: bool) -> Option<u16> {
        self.advance(increments);
        if triangle {
            self.last_pulse = None;
            Some(self.triangle_sample())
        } else if self.last_pulse != Some(self.rising) {
            self.last_pulse = Some(self.rising);
            Some(self.pulse_sample())
        } else {
            None
        }
    }
}

impl Default for WaveformEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// The tick context: a [WaveformEngine] driving an [OutputSink] from the
/// increments published in an [LfoShared].
///
/// [Oscillator::tick] must be called exactly once per tick interval, and
/// never re-entrantly.
pub struct Oscillator<'a, S: OutputSink> {
    engine: WaveformEngine,
    shared: &'a LfoShared,
    sink: S,
}

impl<'a, S: OutputSink> Oscillator<'a, S> {
    /// Create a new oscillator writing to `sink`
    pub fn new(shared: &'a LfoShared, sink: S) -> Self {
        Self {
            engine: WaveformEngine::new(),
            shared,
            sink,
        }
    }
    /// Run one tick
    #[inline]
    pub fn tick(&mut self) {
        if self.shared.take_reset() {
            self.engine.reset();
            log::info!("Phase reset");
        }
        let increments = self.shared.increments();
        if let Some(sample) = self.engine.tick(&increments, self.shared.triangle()) {
            self.sink.write(sample);
        }
    }
    /// The underlying phase accumulator
    pub fn engine(&self) -> &WaveformEngine {
        &self.engine
    }
    /// The output sink
    pub fn sink(&self) -> &S {
        &self.sink
    }
    /// Mutable access to the output sink
    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }
}
