//! Debouncing for mechanical switches.

use crate::Callback;

/// The default settling window, in milliseconds
pub const DEBOUNCE_MS: u32 = 50;

/// A debounced digital input that fires a [Callback] on each stable
/// transition.
///
/// The raw reading is fed to [DebouncedSwitch::check] at poll rate along
/// with a monotonic millisecond timestamp.  Any change in the raw reading
/// restarts the settling timer; once the reading has held for the settling
/// window it becomes the new stable state.  Moving into the engaged state
/// fires `on_engage`, moving out of it fires `on_disengage`.  Chatter inside
/// the settling window never fires anything.
///
/// With inverted polarity a low reading counts as engaged, which suits a
/// switch to ground with a pull-up.
#[derive(Debug)]
pub struct DebouncedSwitch<'a, R: ?Sized = ()> {
    pin: u8,
    inverted: bool,
    window_ms: u32,
    stable: bool,
    last_raw: bool,
    last_change_ms: u32,
    on_engage: Callback<'a, R>,
    on_disengage: Callback<'a, R>,
}

impl<'a, R: ?Sized> DebouncedSwitch<'a, R> {
    /// Create a new switch on `pin`.  `initial_raw` is the raw reading at
    /// construction, which is taken as already stable so that no callback
    /// fires for the position the switch was in at power-up.
    pub fn new(
        pin: u8,
        inverted: bool,
        initial_raw: bool,
        on_engage: Callback<'a, R>,
        on_disengage: Callback<'a, R>,
    ) -> Self {
        Self {
            pin,
            inverted,
            window_ms: DEBOUNCE_MS,
            stable: initial_raw,
            last_raw: initial_raw,
            last_change_ms: 0,
            on_engage,
            on_disengage,
        }
    }
    /// Use a settling window other than [DEBOUNCE_MS]
    pub fn with_window(mut self, window_ms: u32) -> Self {
        self.window_ms = window_ms;
        self
    }

    /// Feed a raw reading taken at `now_ms`.  Returns `Some(engaged)` if this
    /// reading completed a stable transition (after the matching callback
    /// has run), `None` otherwise.
    pub fn check(&mut self, raw: bool, now_ms: u32) -> Option<bool> {
        if raw != self.last_raw {
            self.last_change_ms = now_ms;
            self.last_raw = raw;
        }
        if raw == self.stable || now_ms.wrapping_sub(self.last_change_ms) < self.window_ms {
            return None;
        }
        self.stable = raw;
        let engaged = self.is_engaged();
        if engaged {
            self.on_engage.invoke();
        } else {
            self.on_disengage.invoke();
        }
        Some(engaged)
    }

    /// True if the stable state is the engaged state
    pub fn is_engaged(&self) -> bool {
        self.stable != self.inverted
    }
    /// The pin this switch was bound to at construction
    pub fn pin(&self) -> u8 {
        self.pin
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::cell::Cell;

    #[derive(Default)]
    struct Counts {
        engaged: Cell<u32>,
        disengaged: Cell<u32>,
    }
    impl Counts {
        fn engage(&self) {
            self.engaged.set(self.engaged.get() + 1);
        }
        fn disengage(&self) {
            self.disengaged.set(self.disengaged.get() + 1);
        }
    }

    fn switch(counts: &Counts, inverted: bool, initial: bool) -> DebouncedSwitch<'_, Counts> {
        DebouncedSwitch::new(
            3,
            inverted,
            initial,
            Callback::method(counts, Counts::engage),
            Callback::method(counts, Counts::disengage),
        )
    }

    #[test]
    fn clean_press_and_release() {
        let counts = Counts::default();
        let mut sw = switch(&counts, false, false);
        assert_eq!(sw.check(false, 0), None);
        assert_eq!(sw.check(true, 100), None);
        assert_eq!(sw.check(true, 149), None);
        assert_eq!(sw.check(true, 150), Some(true));
        assert!(sw.is_engaged());
        assert_eq!(sw.check(true, 400), None);
        assert_eq!(sw.check(false, 500), None);
        assert_eq!(sw.check(false, 550), Some(false));
        assert_eq!((counts.engaged.get(), counts.disengaged.get()), (1, 1));
    }
    #[test]
    fn bounce_inside_window_fires_once() {
        let counts = Counts::default();
        let mut sw = switch(&counts, false, false);
        sw.check(true, 100);
        sw.check(false, 105);
        sw.check(true, 110);
        for t in (110..300).step_by(5) {
            sw.check(true, t);
        }
        assert_eq!(counts.engaged.get(), 1);
        assert_eq!(counts.disengaged.get(), 0);
    }
    #[test]
    fn blip_shorter_than_window_is_ignored() {
        let counts = Counts::default();
        let mut sw = switch(&counts, false, false);
        sw.check(true, 100);
        sw.check(false, 120);
        for t in (120..400).step_by(10) {
            sw.check(false, t);
        }
        assert_eq!((counts.engaged.get(), counts.disengaged.get()), (0, 0));
        assert!(!sw.is_engaged());
    }
    #[test]
    fn inverted_polarity() {
        let counts = Counts::default();
        let mut sw = switch(&counts, true, true);
        assert!(!sw.is_engaged());
        sw.check(false, 10);
        assert_eq!(sw.check(false, 60), Some(true));
        assert_eq!(counts.engaged.get(), 1);
        assert_eq!(sw.pin(), 3);
    }
    #[test]
    fn empty_callbacks_and_custom_window() {
        let mut sw: DebouncedSwitch = DebouncedSwitch::new(0, false, false, Callback::Empty, Callback::Empty)
            .with_window(10);
        sw.check(true, 0);
        assert_eq!(sw.check(true, 10), Some(true));
    }
    #[test]
    fn millisecond_counter_wraparound() {
        let counts = Counts::default();
        let mut sw = switch(&counts, false, false);
        sw.check(true, u32::MAX - 20);
        assert_eq!(sw.check(true, 10), None);
        assert_eq!(sw.check(true, 29), Some(true));
    }
}
