//! This crate contains the control logic for a two-knob, two-switch LFO
//! module.  It is `no_std` and allocation-free, and is split along the two
//! execution rates the hardware imposes:
//!
//!  - The poll rate (the main loop), which reads the knobs and switches,
//!    decides on a frequency range, translates the knobs into a period and
//!    duty cycle and finally into a pair of phase increments.  See [Lfo].
//!  - The tick rate (a timer interrupt or DMA-paced callback), which advances
//!    a phase accumulator by the committed increments and pushes the
//!    resulting sample to an [sink::OutputSink].  See [Oscillator].
//!
//! The only state the two share is an [LfoShared], which hands the increment
//! pair across the boundary so that the tick context never observes half of
//! an update.
//!
//! All of the waveform math is fixed point.  The phase is stored as a
//! [PhaseFxP], whose integral bits are DAC codes and whose fractional bits
//! give the per-tick increment enough resolution to sweep periods from tens
//! of seconds down to a few hundred microseconds without stalling.

#![cfg_attr(not(test), no_std)]
#![warn(missing_docs)]

use fixed::types::{I15F17, U0F16};

pub mod callback;
pub mod clock;
pub mod config;
pub mod engine;
mod fixedmath;
mod float_approx;
mod lfo;
pub mod period;
pub mod range;
pub mod shared;
pub mod sink;
pub mod switch;
pub mod util;

pub use callback::Callback;
pub use clock::ClockSync;
pub use config::{KnobCurve, LfoConfig, PeriodRange};
pub use engine::{Oscillator, WaveformEngine};
pub use fixedmath::mul_div;
pub use lfo::{ControlInputs, Lfo, LfoPins};
pub use period::{ClockRatios, PeriodCalculator, PeriodTables};
pub use range::{RangeIndicator, RangeSelector};
pub use shared::{Increments, LfoShared};
pub use switch::DebouncedSwitch;

/// True if using libm for the startup table generation, false if using the
/// internal approximation functions
pub const USE_LIBM: bool = cfg!(feature = "libm");

/// The largest code accepted by the DAC (12 bits)
pub const DAC_MAX: u16 = 4095;
/// The largest reading returned by the ADC for a knob (12 bits)
pub const ADC_MAX: u16 = 4095;

/// The scaled phase of the oscillator.  This is a signed 32 bit fixed point
/// number with 17 fractional bits: the integral part is the DAC code the
/// phase corresponds to, and the fractional part is headroom so that the
/// per-tick increment stays integral at very slow rates.  A sign bit and one
/// spare integral bit allow the accumulator to overshoot either bound by up to
/// one full increment before it is reflected.
pub type PhaseFxP = I15F17;
/// A duty cycle: the fraction of the period spent in the rising half, as an
/// unsigned 16 bit fixed point number in `[0, 1)`
pub type DutyFxP = U0F16;

/// The phase value corresponding to a full scale output, i.e.
/// `DAC_MAX << 17`.  This is the upper reflection bound of the accumulator.
pub const SCALED_RESOLUTION: PhaseFxP = PhaseFxP::lit("4095");
