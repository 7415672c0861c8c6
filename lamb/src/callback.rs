//! A zero-argument action that can be stored by value and invoked from (or
//! near) interrupt context without allocating.

/// A handle to a zero-argument action.
///
/// A `Callback` is one of:
///
///  - [Callback::Empty], which does nothing when invoked,
///  - [Callback::Function], a plain function pointer, or
///  - [Callback::Method], a receiver borrowed for `'a` together with a method
///    to call on it.
///
/// The receiver type `R` defaults to `()`, so a handle that can only ever
/// hold free functions is simply a `Callback<'static>`.  Methods take the
/// receiver by shared reference; receivers that need to change state on
/// invocation use interior mutability (see [crate::RangeSelector] and
/// [crate::LfoShared]).
///
/// ```
/// use core::cell::Cell;
/// use lamb::Callback;
///
/// struct Counter(Cell<u32>);
/// impl Counter {
///     fn bump(&self) {
///         self.0.set(self.0.get() + 1);
///     }
/// }
///
/// let counter = Counter(Cell::new(0));
/// let cb = Callback::method(&counter, Counter::bump);
/// cb.invoke();
/// cb.invoke();
/// assert_eq!(counter.0.get(), 2);
///
/// // Invoking an empty handle is a no-op
/// Callback::<Counter>::Empty.invoke();
/// ```
pub enum Callback<'a, R: ?Sized = ()> {
    /// Does nothing
    Empty,
    /// Calls a free function
    Function(fn()),
    /// Calls `method(receiver)`
    Method(&'a R, fn(&R)),
}

impl<'a, R: ?Sized> Callback<'a, R> {
    /// Bind a free function
    pub const fn function(f: fn()) -> Self {
        Self::Function(f)
    }
    /// Bind a method to a receiver
    pub const fn method(receiver: &'a R, method: fn(&R)) -> Self {
        Self::Method(receiver, method)
    }
    /// Dispatch to the stored action.  Does nothing on [Callback::Empty].
    #[inline]
    pub fn invoke(&self) {
        match self {
            Self::Empty => {}
            Self::Function(f) => f(),
            Self::Method(receiver, method) => method(receiver),
        }
    }
    /// True if invoking this handle would do nothing
    pub const fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }
}

impl<R: ?Sized> Default for Callback<'_, R> {
    fn default() -> Self {
        Self::Empty
    }
}

// Derive would place a `R: Clone` bound on these, which we don't need since
// we only ever hold a reference to the receiver.
impl<R: ?Sized> Clone for Callback<'_, R> {
    fn clone(&self) -> Self {
        *self
    }
}
impl<R: ?Sized> Copy for Callback<'_, R> {}

impl<R: ?Sized> core::fmt::Debug for Callback<'_, R> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(match self {
            Self::Empty => "Callback::Empty",
            Self::Function(_) => "Callback::Function",
            Self::Method(..) => "Callback::Method",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::cell::Cell;
    use core::sync::atomic::{AtomicU32, Ordering};

    static CALLS: AtomicU32 = AtomicU32::new(0);
    fn count_call() {
        CALLS.fetch_add(1, Ordering::Relaxed);
    }

    struct Toggle {
        on: Cell<bool>,
    }
    impl Toggle {
        fn flip(&self) {
            self.on.set(!self.on.get());
        }
    }

    #[test]
    fn empty_is_noop() {
        let cb: Callback = Callback::default();
        assert!(cb.is_empty());
        cb.invoke();
        cb.invoke();
    }
    #[test]
    fn free_function() {
        let cb: Callback = Callback::function(count_call);
        let before = CALLS.load(Ordering::Relaxed);
        cb.invoke();
        cb.clone().invoke();
        assert_eq!(CALLS.load(Ordering::Relaxed), before + 2);
    }
    #[test]
    fn bound_method() {
        let toggle = Toggle { on: Cell::new(false) };
        let cb = Callback::method(&toggle, Toggle::flip);
        assert!(!cb.is_empty());
        cb.invoke();
        assert!(toggle.on.get());
        let copy = cb;
        copy.invoke();
        assert!(!toggle.on.get());
    }
}
