//! Destinations for the oscillator's samples.
//!
//! The oscillator only needs a single `write(sample)` operation, so every
//! transport is wrapped in an [OutputSink] and picked once at construction.

use crate::{mul_div, DAC_MAX};
use core::sync::atomic::{AtomicU32, Ordering};
use embedded_hal::i2c::I2c;
use embedded_hal::pwm::SetDutyCycle;

/// Something that accepts samples in `[0, DAC_MAX]`.  Called from the tick
/// context, so implementations must not block for longer than a tick.
pub trait OutputSink {
    /// Output `sample`.  Values above [DAC_MAX] are clamped.
    fn write(&mut self, sample: u16);
}

impl<S: OutputSink + ?Sized> OutputSink for &mut S {
    fn write(&mut self, sample: u16) {
        (**self).write(sample)
    }
}

/// Writes samples straight into a PWM compare register, to be smoothed by an
/// external RC filter.  The sample is scaled to the channel's maximum duty.
#[derive(Debug)]
pub struct PwmSink<P: SetDutyCycle> {
    channel: P,
}

impl<P: SetDutyCycle> PwmSink<P> {
    /// Wrap a configured, enabled PWM channel
    pub fn new(channel: P) -> Self {
        Self { channel }
    }
    /// Give back the PWM channel
    pub fn into_inner(self) -> P {
        self.channel
    }
}

impl<P: SetDutyCycle> OutputSink for PwmSink<P> {
    fn write(&mut self, sample: u16) {
        let max = self.channel.max_duty_cycle() as u32;
        let duty = mul_div(sample.min(DAC_MAX) as u32, max, DAC_MAX as u32);
        if self.channel.set_duty_cycle(duty as u16).is_err() {
            log::warn!("PWM write failed");
        }
    }
}

/// Stores samples into a memory cell that a looping DMA channel copies to the
/// output register on its own schedule.
#[derive(Debug)]
pub struct CellSink<'a> {
    cell: &'a AtomicU32,
}

impl<'a> CellSink<'a> {
    /// Wrap the DMA source cell
    pub fn new(cell: &'a AtomicU32) -> Self {
        Self { cell }
    }
}

impl OutputSink for CellSink<'_> {
    fn write(&mut self, sample: u16) {
        self.cell
            .store(sample.min(DAC_MAX) as u32, Ordering::Relaxed);
    }
}

/// The "write DAC register" command byte of an MCP4725
pub const MCP4725_CMD_WRITEDAC: u8 = 0x40;
/// The default 7-bit bus address of an MCP4725 (A0 tied low)
pub const MCP4725_ADDRESS: u8 = 0x62;

/// Format the 3-byte packet that sets an MCP4725-style 12 bit DAC: the
/// command byte, then the upper eight bits of the sample, then the lower four
/// bits left-aligned in the final byte.
pub fn dac_packet(sample: u16) -> [u8; 3] {
    let sample = sample.min(DAC_MAX);
    [
        MCP4725_CMD_WRITEDAC,
        (sample >> 4) as u8,
        ((sample & 0xF) << 4) as u8,
    ]
}

/// Sends each sample to an external DAC over I2C.  Each write is a full bus
/// transaction, so the tick interval has to allow for it.
#[derive(Debug)]
pub struct I2cDacSink<I: I2c> {
    bus: I,
    address: u8,
}

impl<I: I2c> I2cDacSink<I> {
    /// Talk to the DAC at 7-bit `address` on `bus`
    pub fn new(bus: I, address: u8) -> Self {
        Self { bus, address }
    }
    /// Give back the bus
    pub fn into_inner(self) -> I {
        self.bus
    }
}

impl<I: I2c> OutputSink for I2cDacSink<I> {
    fn write(&mut self, sample: u16) {
        if self.bus.write(self.address, &dac_packet(sample)).is_err() {
            log::warn!("I2C DAC write to {:#04x} failed", self.address);
        }
    }
}
