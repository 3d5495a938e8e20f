//! Shared values for passing parameters between threads.
//!
//! Parameter values are stored in atomics so that any thread (a UI, a host automation thread) can
//! write them while the analysis side reads a consistent snapshot whenever it needs one. Writes do
//! no work beyond the store itself and raising a single [`ChangeFlag`]; whoever owns the flag
//! decides when to react.
use std::borrow::Cow;
use std::marker::PhantomData;
use std::ops;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use portable_atomic::{AtomicBool, AtomicF32, AtomicF64};

/// Parameter ID alias. Useful for type-erasing parameter names.
pub type ParamId = usize;

/// Trait for types that are parameter names.
///
/// This trait is most easily implemented as an enum of all possible parameters.
pub trait ParamName: Copy {
    /// Total number of elements in this type
    fn count() -> usize;

    /// Construct a [`Self`] from a [`ParamId`] value. The caller is expected to verify `value <
    /// Self::count()`, and so this method is declared as infallible.
    fn from_id(value: ParamId) -> Self;

    /// Construct a [`ParamId`] from this [`Self`]. Round-tripping through [`Self::from_id`]
    /// returns the same name.
    fn into_id(self) -> ParamId;

    /// Return a user-friendly name for this parameter name.
    fn name(&self) -> Cow<'static, str>;

    /// Create an iterator returning all values for this type, that is, all values converted from
    /// IDs in sequence in the range `0..Self::count()`.
    fn iter() -> impl Iterator<Item = Self> {
        (0..Self::count()).map(|i| Self::from_id(i as _))
    }
}

/// Specialized map type for storing values associated to parameters.
#[derive(Debug, Clone)]
pub struct ParamMap<P, T> {
    data: Vec<T>,
    __param: PhantomData<P>,
}

impl<P: ParamName, T: Default> Default for ParamMap<P, T> {
    fn default() -> Self {
        Self::new(|_| T::default())
    }
}

impl<P: ParamName, T> ops::Index<P> for ParamMap<P, T> {
    type Output = T;

    fn index(&self, index: P) -> &Self::Output {
        &self.data[index.into_id()]
    }
}

impl<P: ParamName, T> ops::IndexMut<P> for ParamMap<P, T> {
    fn index_mut(&mut self, index: P) -> &mut Self::Output {
        &mut self.data[index.into_id()]
    }
}

impl<P: ParamName, T> ParamMap<P, T> {
    /// Create a new parameter map, filled in by the provided closure.
    ///
    /// # Arguments
    ///
    /// * `fill_fn`: Closure which is called for each parameter, and returns the associated value.
    ///
    /// returns: ParamMap<P, T>
    pub fn new(fill_fn: impl FnMut(P) -> T) -> Self {
        Self {
            data: Vec::from_iter(P::iter().map(fill_fn)),
            __param: PhantomData,
        }
    }

    /// Iterate over parameters and references to their values.
    pub fn iter(&self) -> impl '_ + Iterator<Item = (P, &T)> {
        self.data
            .iter()
            .enumerate()
            .map(|(i, x)| (P::from_id(i as _), x))
    }
}

/// Single-word "something changed" flag, shared between any number of notifiers and one
/// consumer.
///
/// Raising is idempotent; [`ChangeFlag::take`] atomically tests and clears it, so any number of
/// raises between two takes are observed exactly once.
#[derive(Debug, Clone, Default)]
pub struct ChangeFlag(Arc<AtomicBool>);

impl ChangeFlag {
    /// Create a new flag in the raised state, so that the first take reports a change.
    pub fn raised() -> Self {
        Self(Arc::new(AtomicBool::new(true)))
    }

    /// Mark a change as pending.
    pub fn raise(&self) {
        self.0.store(true, Ordering::Release);
    }

    /// Test-and-clear the flag. Returns true if a change was pending.
    pub fn take(&self) -> bool {
        self.0.swap(false, Ordering::AcqRel)
    }

    /// Returns true if a change is pending, without clearing it.
    pub fn is_raised(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Thread-safe store of parameter values. Every write raises the associated [`ChangeFlag`].
pub struct ParamStore<P: ParamName> {
    values: ParamMap<P, AtomicF32>,
    changed: ChangeFlag,
}

impl<P: ParamName> ParamStore<P> {
    /// Create a new store with the given initial values, raising `changed` on every write.
    pub fn new(changed: ChangeFlag, mut initial: impl FnMut(P) -> f32) -> Self {
        Self {
            values: ParamMap::new(|p| AtomicF32::new(initial(p))),
            changed,
        }
    }

    /// Set a parameter value.
    ///
    /// # Arguments
    ///
    /// * `param`: Parameter to set
    /// * `value`: Value to set
    ///
    /// returns: ()
    pub fn set_parameter(&self, param: P, value: f32) {
        self.values[param].store(value, Ordering::Release);
        self.changed.raise();
    }

    /// Set the parameter as a boolean value. It will be encoded such that `value > 0.5` decodes
    /// back to the input boolean value.
    pub fn set_parameter_bool(&self, param: P, value: bool) {
        self.set_parameter(param, if value { 1.0 } else { 0.0 });
    }

    /// Read the current value of a parameter.
    pub fn get(&self, param: P) -> f32 {
        self.values[param].load(Ordering::Acquire)
    }

    /// Read the current value of a parameter as a boolean.
    pub fn get_bool(&self, param: P) -> bool {
        self.get(param) > 0.5
    }

    /// Flag raised by writes to this store.
    pub fn change_flag(&self) -> &ChangeFlag {
        &self.changed
    }
}

/// Shared sample rate, written by the audio side and read at analysis and rebuild time.
#[derive(Debug, Clone)]
pub struct Samplerate(Arc<AtomicF64>);

impl Samplerate {
    /// Create a new shared sample rate.
    pub fn new(samplerate: f64) -> Self {
        Self(Arc::new(AtomicF64::new(samplerate)))
    }

    /// Current sample rate, in Hz.
    pub fn get(&self) -> f64 {
        self.0.load(Ordering::Acquire)
    }

    /// Update the sample rate, in Hz.
    pub fn set(&self, samplerate: f64) {
        self.0.store(samplerate, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[derive(Debug, Copy, Clone, PartialEq, Eq)]
    enum Knob {
        Gain,
        Mix,
    }

    impl ParamName for Knob {
        fn count() -> usize {
            2
        }

        fn from_id(value: ParamId) -> Self {
            [Self::Gain, Self::Mix][value]
        }

        fn into_id(self) -> ParamId {
            self as _
        }

        fn name(&self) -> Cow<'static, str> {
            Cow::Borrowed(match self {
                Self::Gain => "Gain",
                Self::Mix => "Mix",
            })
        }
    }

    #[test]
    fn param_map_is_indexed_by_name() {
        let mut map = ParamMap::new(|p: Knob| p.name().len());
        map[Knob::Mix] = 10;
        assert_eq!(4, map[Knob::Gain]);
        assert_eq!(
            vec![(Knob::Gain, &4), (Knob::Mix, &10)],
            map.iter().collect::<Vec<_>>()
        );
    }

    #[test]
    fn store_write_raises_flag() {
        let flag = ChangeFlag::default();
        let store = ParamStore::new(flag.clone(), |_: Knob| 0.0);
        assert!(!flag.is_raised());

        store.set_parameter(Knob::Gain, 0.75);
        store.set_parameter_bool(Knob::Mix, true);
        assert_eq!(0.75, store.get(Knob::Gain));
        assert!(store.get_bool(Knob::Mix));
        assert!(flag.take());
        assert!(!flag.take());
    }

    #[test]
    fn concurrent_raises_are_taken_once() {
        let flag = ChangeFlag::default();
        let handles = (0..8)
            .map(|_| {
                let flag = flag.clone();
                thread::spawn(move || {
                    for _ in 0..100 {
                        flag.raise();
                    }
                })
            })
            .collect::<Vec<_>>();
        for handle in handles {
            handle.join().unwrap();
        }

        assert!(flag.take());
        assert!(!flag.take());
    }
}
