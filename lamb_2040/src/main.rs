#![no_std]
#![no_main]

use panic_halt as _;
use rp_pico::entry;

use core::cell::RefCell;
use core::ptr::addr_of_mut;

use critical_section::Mutex;
use fugit::MicrosDurationU64;
use rp_pico::hal::{self, gpio, pac, pac::interrupt, timer::Alarm};

use lamb::range::IndicatorPin;
use lamb::sink::PwmSink;
use lamb::{ClockSync, Lfo, LfoConfig, LfoPins, LfoShared, Oscillator, PeriodTables, RangeSelector};

mod run;

const CONFIG: LfoConfig = LfoConfig::DEFAULT;
const TICK: MicrosDurationU64 = MicrosDurationU64::micros(CONFIG.tick_interval_us as u64);

/// GPIO/ADC numbers, as wired on the panel board
const PINS: LfoPins = LfoPins {
    freq: 0,
    duty: 1,
    wave_switch: 14,
    range_switch: 15,
    output: 0,
};

type OutputChannel = hal::pwm::Channel<hal::pwm::Slice<hal::pwm::Pwm0, hal::pwm::FreeRunning>, hal::pwm::A>;
type ClockPin = gpio::Pin<gpio::bank0::Gpio16, gpio::FunctionSioInput, gpio::PullDown>;

struct TickContext {
    alarm: hal::timer::Alarm0,
    timer: hal::Timer,
    /// Deadline of the next tick, advanced by exactly [TICK] every time so
    /// that interrupt latency doesn't accumulate
    next: hal::timer::Instant,
    osc: Oscillator<'static, PwmSink<OutputChannel>>,
}

struct ClockContext {
    pin: ClockPin,
    timer: hal::Timer,
}

static SHARED: LfoShared = LfoShared::new(true);
static CLOCK: ClockSync = ClockSync::new(CONFIG.min_clock_period_us);
static TICK_CONTEXT: Mutex<RefCell<Option<TickContext>>> = Mutex::new(RefCell::new(None));
static CLOCK_CONTEXT: Mutex<RefCell<Option<ClockContext>>> = Mutex::new(RefCell::new(None));

static mut TABLES: PeriodTables = PeriodTables::empty();

#[entry]
fn start() -> ! {
    let mut pac = pac::Peripherals::take().unwrap();
    let mut watchdog = hal::Watchdog::new(pac.WATCHDOG);
    let clocks = hal::clocks::init_clocks_and_plls(
        rp_pico::XOSC_CRYSTAL_FREQ,
        pac.XOSC,
        pac.CLOCKS,
        pac.PLL_SYS,
        pac.PLL_USB,
        &mut pac.RESETS,
        &mut watchdog,
    )
    .ok()
    .unwrap();
    let sio = hal::Sio::new(pac.SIO);
    let pins = rp_pico::Pins::new(
        pac.IO_BANK0,
        pac.PADS_BANK0,
        sio.gpio_bank0,
        &mut pac.RESETS,
    );
    let mut timer = hal::Timer::new(pac.TIMER, &mut pac.RESETS, &clocks);

    // Only ever touched here, before any interrupt is unmasked
    let tables: &'static PeriodTables = unsafe {
        let tables = &mut *addr_of_mut!(TABLES);
        tables.build(&CONFIG);
        tables
    };

    let slices = hal::pwm::Slices::new(pac.PWM, &mut pac.RESETS);
    let mut pwm = slices.pwm0;
    pwm.set_ph_correct();
    pwm.set_top(lamb::DAC_MAX);
    pwm.enable();
    pwm.channel_a.output_to(pins.gpio0);

    let mut panel = run::Panel::new(
        hal::Adc::new(pac.ADC, &mut pac.RESETS),
        hal::adc::AdcPin::new(pins.gpio26.into_floating_input()).unwrap(),
        hal::adc::AdcPin::new(pins.gpio27.into_floating_input()).unwrap(),
        pins.gpio15.into_pull_down_input(),
        pins.gpio14.into_pull_down_input(),
        pins.gpio17.into_pull_down_input(),
    );

    let clock_pin: ClockPin = pins.gpio16.into_pull_down_input();
    clock_pin.set_interrupt_enabled(gpio::Interrupt::EdgeHigh, true);

    let range = RangeSelector::new(&CONFIG, &CLOCK, false);
    let initial = panel.read();
    let mut lfo = Lfo::new(
        &CONFIG,
        PINS,
        tables,
        &SHARED,
        &range,
        IndicatorPin(pins.led.into_push_pull_output()),
        &initial,
    )
    .unwrap();

    let mut alarm = timer.alarm_0().unwrap();
    let next = timer.get_counter() + TICK;
    alarm.schedule_at(next).unwrap();
    alarm.enable_interrupt();
    critical_section::with(|cs| {
        TICK_CONTEXT.borrow_ref_mut(cs).replace(TickContext {
            alarm,
            timer,
            next,
            osc: Oscillator::new(&SHARED, PwmSink::new(pwm.channel_a)),
        });
        CLOCK_CONTEXT.borrow_ref_mut(cs).replace(ClockContext {
            pin: clock_pin,
            timer,
        });
    });
    unsafe {
        pac::NVIC::unmask(pac::Interrupt::TIMER_IRQ_0);
        pac::NVIC::unmask(pac::Interrupt::IO_IRQ_BANK0);
    }

    run::run(&mut lfo, &mut panel, &CLOCK, timer)
}

#[interrupt]
fn TIMER_IRQ_0() {
    critical_section::with(|cs| {
        if let Some(ctx) = TICK_CONTEXT.borrow_ref_mut(cs).as_mut() {
            ctx.alarm.clear_interrupt();
            ctx.next += TICK;
            if ctx.alarm.schedule_at(ctx.next).is_err() {
                // Fell more than a tick behind: drop the missed ticks and
                // restart the schedule from now
                log::warn!("Tick deadline missed");
                ctx.next = ctx.timer.get_counter() + TICK;
                if ctx.alarm.schedule_at(ctx.next).is_err() {
                    log::warn!("Failed to re-arm tick alarm");
                }
            }
            ctx.osc.tick();
        }
    });
}

#[interrupt]
fn IO_IRQ_BANK0() {
    critical_section::with(|cs| {
        if let Some(ctx) = CLOCK_CONTEXT.borrow_ref_mut(cs).as_mut() {
            if ctx.pin.interrupt_status(gpio::Interrupt::EdgeHigh) {
                CLOCK.record_edge(ctx.timer.get_counter_low());
                ctx.pin.clear_interrupt(gpio::Interrupt::EdgeHigh);
            }
        }
    });
}
