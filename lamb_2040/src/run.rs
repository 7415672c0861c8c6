use embedded_hal::delay::DelayNs;
use embedded_hal::digital::InputPin;
use embedded_hal_0_2::adc::{Channel, OneShot};
use rp_pico::hal::{Adc, Timer};

use lamb::{ClockSync, ControlInputs, Lfo, RangeIndicator};

/// The front panel: two knobs on ADC channels, the range and wave switches,
/// and the switch contact of the clock input jack.
pub struct Panel<F, D, R, W, J> {
    adc: Adc,
    freq: F,
    duty: D,
    range: R,
    wave: W,
    jack: J,
}

impl<F, D, R, W, J> Panel<F, D, R, W, J>
where
    F: Channel<Adc, ID = u8>,
    D: Channel<Adc, ID = u8>,
    R: InputPin,
    W: InputPin,
    J: InputPin,
{
    pub fn new(adc: Adc, freq: F, duty: D, range: R, wave: W, jack: J) -> Self {
        Self {
            adc,
            freq,
            duty,
            range,
            wave,
            jack,
        }
    }
    pub fn read(&mut self) -> ControlInputs {
        let freq: u16 = self.adc.read(&mut self.freq).unwrap_or_default();
        let duty: u16 = self.adc.read(&mut self.duty).unwrap_or_default();
        ControlInputs {
            freq,
            duty,
            range_switch: self.range.is_high().unwrap_or(false),
            wave_switch: self.wave.is_high().unwrap_or(false),
        }
    }
    /// Is a cable patched into the clock input?
    pub fn clock_patched(&mut self) -> bool {
        self.jack.is_high().unwrap_or(false)
    }
}

pub fn run<I, F, D, R, W, J>(
    lfo: &mut Lfo<'_, I>,
    panel: &mut Panel<F, D, R, W, J>,
    clock: &ClockSync,
    mut timer: Timer,
) -> !
where
    I: RangeIndicator,
    F: Channel<Adc, ID = u8>,
    D: Channel<Adc, ID = u8>,
    R: InputPin,
    W: InputPin,
    J: InputPin,
{
    loop {
        clock.set_selected(panel.clock_patched());
        let inputs = panel.read();
        let now_ms = (timer.get_counter().ticks() / 1000) as u32;
        lfo.check(&inputs, now_ms);
        timer.delay_ms(1);
    }
}
