//! Joining several futures into one.
//!
//! # Semantics
//!
//! ```text
//! await_all_in_tuple((f1, f2, ..., fn)) -> FutureSet<(Option<T1>, ..., Option<Tn>)>
//! ```
//!
//! The joined future is fulfilled exactly once, after every input has
//! completed, in whatever order they arrive. Slot `i` is `None` when input `i`
//! was canceled. The join itself is never canceled by a canceled input; use
//! [`FutureSet::and_then_expand`] to run only when every input succeeded.

use parking_lot::Mutex;
use std::sync::Arc;

use crate::future::Future;
use crate::promise::Promise;

/// A tuple of options, one per joined input.
pub trait OptionTuple: Default + Send + 'static {
    /// The same tuple with every option unwrapped.
    type Values: Send + 'static;

    /// `Some` only when every slot holds a value.
    fn transpose(self) -> Option<Self::Values>;
}

/// An [`OptionTuple`] whose element types have defaults.
pub trait FillDefaults: OptionTuple {
    fn fill_defaults(self) -> Self::Values;
}

/// A tuple of futures that can be awaited as one.
pub trait AwaitAll {
    type Slots: OptionTuple;

    fn await_all(self) -> FutureSet<Self::Slots>;
}

/// A future of one optional value per joined input.
#[derive(Debug)]
pub struct FutureSet<V> {
    future: Future<V>,
}

impl<V: OptionTuple> FutureSet<V> {
    pub fn new(future: Future<V>) -> Self {
        Self { future }
    }

    pub fn into_future(self) -> Future<V> {
        self.future
    }

    /// Runs `continuation` with every value unwrapped, or cancels the result
    /// when any input was canceled.
    ///
    /// # Examples
    ///
    /// ```
    /// use promise_di::{await_all, Future};
    /// let sum = await_all!(Future::ready(1i32), Future::ready(2u8))
    ///     .and_then_expand(|(a, b)| a + i32::from(b));
    /// assert_eq!(sum.consume(), Some(3));
    /// ```
    pub fn and_then_expand<R, F>(self, continuation: F) -> Future<R>
    where
        R: Send + 'static,
        F: FnOnce(V::Values) -> R + Send + 'static,
    {
        let (promise, future) = Promise::pair();
        let _ = self
            .future
            .next(move |slots| match slots.and_then(OptionTuple::transpose) {
                Some(values) => promise.set_value(continuation(values)),
                None => promise.cancel(),
            });
        future
    }

    /// Runs `continuation` with the optional slots as they are.
    pub fn and_then_apply<R, F>(self, continuation: F) -> Future<R>
    where
        R: Send + 'static,
        F: FnOnce(V) -> R + Send + 'static,
    {
        self.future.and_then(continuation)
    }

    pub fn is_ready(&self) -> bool {
        self.future.is_ready()
    }

    /// Blocks until every input completed and returns the slots.
    pub fn consume(self) -> Option<V> {
        self.future.consume()
    }
}

/// A promise of a tuple of options, whose future is a [`FutureSet`].
#[derive(Debug)]
pub struct PromiseSet<V> {
    promise: Promise<V>,
}

impl<V: OptionTuple> PromiseSet<V> {
    pub fn new() -> Self {
        Self {
            promise: Promise::new(),
        }
    }

    pub fn pair() -> (Self, FutureSet<V>) {
        let set = Self::new();
        let future = set.get_future_set();
        (set, future)
    }

    /// # Panics
    ///
    /// Panics if the future set was already retrieved.
    pub fn get_future_set(&self) -> FutureSet<V> {
        FutureSet::new(self.promise.get_future())
    }

    pub fn set_value(self, slots: V) {
        self.promise.set_value(slots);
    }

    pub fn cancel(self) {
        self.promise.cancel();
    }
}

impl<V: OptionTuple> Default for PromiseSet<V> {
    fn default() -> Self {
        Self::new()
    }
}

struct JoinSlots<V> {
    values: V,
    remaining: usize,
    promise: Option<Promise<V>>,
}

/// Collects the inputs of one join. Each input writes its slot exactly once,
/// so the writer that brings `remaining` to zero is the one that fulfills.
struct JoinBuffer<V> {
    slots: Mutex<JoinSlots<V>>,
}

impl<V: Default + Send + 'static> JoinBuffer<V> {
    fn new(values: V, inputs: usize, promise: Promise<V>) -> Arc<Self> {
        Arc::new(Self {
            slots: Mutex::new(JoinSlots {
                values,
                remaining: inputs,
                promise: Some(promise),
            }),
        })
    }

    fn record(&self, write: impl FnOnce(&mut V)) {
        let finished = {
            let mut slots = self.slots.lock();
            write(&mut slots.values);
            slots.remaining -= 1;
            if slots.remaining == 0 {
                let values = std::mem::take(&mut slots.values);
                slots.promise.take().map(|promise| (promise, values))
            } else {
                None
            }
        };
        if let Some((promise, values)) = finished {
            promise.set_value(values);
        }
    }
}

macro_rules! impl_join_tuple {
    ($len:expr; $($name:ident : $idx:tt),+) => {
        impl<$($name: Send + 'static),+> OptionTuple for ($(Option<$name>,)+) {
            type Values = ($($name,)+);

            fn transpose(self) -> Option<Self::Values> {
                Some(($(self.$idx?,)+))
            }
        }

        impl<$($name: Default + Send + 'static),+> FillDefaults for ($(Option<$name>,)+) {
            fn fill_defaults(self) -> Self::Values {
                ($(self.$idx.unwrap_or_default(),)+)
            }
        }

        impl<$($name: Send + 'static),+> AwaitAll for ($(Future<$name>,)+) {
            type Slots = ($(Option<$name>,)+);

            fn await_all(self) -> FutureSet<Self::Slots> {
                let (promise, future) = Promise::pair();
                let buffer = JoinBuffer::new(<Self::Slots as Default>::default(), $len, promise);
                $(
                    let slot = Arc::clone(&buffer);
                    let _ = self.$idx.next(move |value| slot.record(|slots| slots.$idx = value));
                )+
                FutureSet::new(future)
            }
        }
    };
}

impl_join_tuple!(1; A: 0);
impl_join_tuple!(2; A: 0, B: 1);
impl_join_tuple!(3; A: 0, B: 1, C: 2);
impl_join_tuple!(4; A: 0, B: 1, C: 2, D: 3);
impl_join_tuple!(5; A: 0, B: 1, C: 2, D: 3, E: 4);
impl_join_tuple!(6; A: 0, B: 1, C: 2, D: 3, E: 4, F: 5);
impl_join_tuple!(7; A: 0, B: 1, C: 2, D: 3, E: 4, F: 5, G: 6);
impl_join_tuple!(8; A: 0, B: 1, C: 2, D: 3, E: 4, F: 5, G: 6, H: 7);

/// Joins a tuple of futures. See the module docs.
pub fn await_all_in_tuple<F: AwaitAll>(futures: F) -> FutureSet<F::Slots> {
    futures.await_all()
}

/// Joins a tuple of futures, substituting defaults for canceled inputs.
pub fn await_all_in_tuple_or_default<F>(
    futures: F,
) -> Future<<F::Slots as OptionTuple>::Values>
where
    F: AwaitAll,
    F::Slots: FillDefaults,
{
    futures
        .await_all()
        .into_future()
        .next(|slots| slots.unwrap_or_default().fill_defaults())
}

/// Joins any number of futures of one type. An empty input yields an
/// already fulfilled, empty vector.
pub fn await_all_iter<T, I>(futures: I) -> Future<Vec<Option<T>>>
where
    T: Send + 'static,
    I: IntoIterator<Item = Future<T>>,
{
    let futures: Vec<Future<T>> = futures.into_iter().collect();
    if futures.is_empty() {
        return Future::ready(Vec::new());
    }
    let (promise, future) = Promise::pair();
    let count = futures.len();
    let buffer = JoinBuffer::new((0..count).map(|_| None).collect(), count, promise);
    for (index, input) in futures.into_iter().enumerate() {
        let slot = Arc::clone(&buffer);
        let _ = input.next(move |value| slot.record(|slots: &mut Vec<Option<T>>| slots[index] = value));
    }
    future
}

/// Joins futures given as separate arguments.
///
/// ```
/// use promise_di::{await_all, Future};
/// let slots = await_all!(Future::ready(1), Future::<u8>::canceled()).consume();
/// assert_eq!(slots, Some((Some(1), None)));
/// ```
#[macro_export]
macro_rules! await_all {
    ($($future:expr),+ $(,)?) => {
        $crate::join::await_all_in_tuple(($($future,)+))
    };
}
