//! State handed from the poll loop to the tick interrupt.

use crate::{PhaseFxP, SCALED_RESOLUTION};
use core::cell::Cell;
use core::sync::atomic::{AtomicBool, Ordering};
use critical_section::Mutex;

/// The pair of per-tick phase steps, one for each half of the cycle.  Both
/// are always at least the smallest representable step and at most the full
/// scaled resolution, so a single reflection always brings the phase back
/// into range.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Increments([PhaseFxP; 2]);

impl Increments {
    const MIN: PhaseFxP = PhaseFxP::DELTA;
    const MAX: PhaseFxP = SCALED_RESOLUTION;

    /// Create a new pair, clamping each step into `[DELTA, SCALED_RESOLUTION]`
    pub fn new(rising: PhaseFxP, falling: PhaseFxP) -> Self {
        Self([
            rising.clamp(Self::MIN, Self::MAX),
            falling.clamp(Self::MIN, Self::MAX),
        ])
    }
    /// The step applied on the rising half
    pub const fn rising(&self) -> PhaseFxP {
        self.0[0]
    }
    /// The step applied on the falling half
    pub const fn falling(&self) -> PhaseFxP {
        self.0[1]
    }
}

impl Default for Increments {
    fn default() -> Self {
        Self([Self::MIN; 2])
    }
}

/// The state shared between the poll context and the tick context.
///
/// The increment pair is only ever replaced as a whole inside a critical
/// section, so the tick context can never see the rising step of one update
/// together with the falling step of another.  The remaining flags are
/// single-word atomics using only loads and stores, which Cortex-M0+
/// supports natively.
#[derive(Debug)]
pub struct LfoShared {
    increments: Mutex<Cell<Increments>>,
    triangle: AtomicBool,
    reset: AtomicBool,
}

impl LfoShared {
    /// Create new shared state with minimal increments
    pub const fn new(triangle: bool) -> Self {
        Self {
            increments: Mutex::new(Cell::new(Increments([Increments::MIN; 2]))),
            triangle: AtomicBool::new(triangle),
            reset: AtomicBool::new(false),
        }
    }

    /// Publish a new increment pair.  Called from the poll context once the
    /// pair has been fully computed.
    pub fn commit(&self, increments: Increments) {
        critical_section::with(|cs| self.increments.borrow(cs).set(increments));
    }
    /// Take a copy of the current increment pair
    pub fn increments(&self) -> Increments {
        critical_section::with(|cs| self.increments.borrow(cs).get())
    }

    /// Is the triangle wave selected (as opposed to the pulse)?
    pub fn triangle(&self) -> bool {
        self.triangle.load(Ordering::Relaxed)
    }
    /// Select the triangle (`true`) or pulse (`false`) wave
    pub fn set_triangle(&self, triangle: bool) {
        self.triangle.store(triangle, Ordering::Relaxed);
    }
    /// Switch between triangle and pulse.  There is a single writer, so a
    /// plain load/store pair is enough.
    pub fn toggle_shape(&self) {
        self.set_triangle(!self.triangle());
    }

    /// Ask the tick context to restart the waveform at the bottom of the
    /// rising half
    pub fn request_reset(&self) {
        self.reset.store(true, Ordering::Relaxed);
    }
    /// Consume a pending reset request
    pub fn take_reset(&self) -> bool {
        // Only the tick context clears the flag, so this can't lose a request
        // that lands between the load and the store.
        let pending = self.reset.load(Ordering::Relaxed);
        if pending {
            self.reset.store(false, Ordering::Relaxed);
        }
        pending
    }
}

impl Default for LfoShared {
    fn default() -> Self {
        Self::new(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn increments_are_clamped() {
        let inc = Increments::new(PhaseFxP::ZERO, PhaseFxP::from_num(-3));
        assert_eq!(inc.rising(), PhaseFxP::DELTA);
        assert_eq!(inc.falling(), PhaseFxP::DELTA);
        assert_eq!(Increments::default(), inc);
        let inc = Increments::new(PhaseFxP::MAX, SCALED_RESOLUTION + PhaseFxP::DELTA);
        assert_eq!(inc.rising(), SCALED_RESOLUTION);
        assert_eq!(inc.falling(), SCALED_RESOLUTION);
    }
    #[test]
    fn commit_replaces_whole_pair() {
        let shared = LfoShared::new(true);
        let inc = Increments::new(PhaseFxP::from_num(2), PhaseFxP::from_num(5));
        shared.commit(inc);
        assert_eq!(shared.increments(), inc);
    }
    #[test]
    fn commit_is_never_torn() {
        use std::sync::atomic::AtomicBool;
        use std::sync::Arc;
        let shared = Arc::new(LfoShared::new(true));
        let done = Arc::new(AtomicBool::new(false));
        let writer = {
            let shared = shared.clone();
            let done = done.clone();
            std::thread::spawn(move || {
                for i in 1..20_000i32 {
                    let step = PhaseFxP::from_bits(i);
                    shared.commit(Increments::new(step, step));
                }
                done.store(true, Ordering::Relaxed);
            })
        };
        while !done.load(Ordering::Relaxed) {
            let inc = shared.increments();
            assert_eq!(inc.rising(), inc.falling());
        }
        writer.join().unwrap();
    }
    #[test]
    fn shape_and_reset_flags() {
        let shared = LfoShared::default();
        assert!(shared.triangle());
        shared.toggle_shape();
        assert!(!shared.triangle());
        assert!(!shared.take_reset());
        shared.request_reset();
        shared.request_reset();
        assert!(shared.take_reset());
        assert!(!shared.take_reset());
    }
}
