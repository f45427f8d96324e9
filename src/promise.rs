use std::fmt::{self, Debug};
use std::sync::Arc;

use crate::error::Error;
use crate::future::Future;
use crate::state::OutcomeState;

/// The producer side of an outcome.
///
/// Every handle counts as one producer. Cloning adds a producer and dropping
/// removes one; when the last producer goes away without fulfilling, the
/// outcome is canceled so that consumers never hang.
///
/// # Examples
///
/// ```
/// use promise_di::Promise;
/// use futures::executor::block_on;
/// use std::thread;
/// let (promise, future) = Promise::<String>::pair();
///
/// let task1 = thread::spawn(move || block_on(async {
///     assert_eq!(future.await.as_deref(), Some("Hi"));
/// }));
/// promise.set_value("Hi".into());
/// task1.join().expect("The task1 thread has panicked.");
/// ```
pub struct Promise<T> {
    state: Arc<OutcomeState<T>>,
}

impl<T> Promise<T> {
    pub fn new() -> Self {
        let state = Arc::new(OutcomeState::new());
        state.acquire_producer();
        Self { state }
    }

    /// A promise together with the single future of its lineage.
    pub fn pair() -> (Self, Future<T>) {
        let promise = Self::new();
        let future = promise.get_future();
        (promise, future)
    }

    /// A promise that already holds `value`.
    pub fn fulfilled(value: T) -> Self {
        let promise = Self::new();
        promise.state.emplace_result(value);
        promise
    }

    /// # Panics
    ///
    /// Panics if a future was already retrieved from this promise or any of
    /// its clones. Use [`Future::share`] to hand the value to several
    /// consumers.
    pub fn get_future(&self) -> Future<T> {
        match self.try_get_future() {
            Ok(future) => future,
            Err(error) => panic!("{error}"),
        }
    }

    pub fn try_get_future(&self) -> Result<Future<T>, Error> {
        if self.state.mark_future_retrieved() {
            return Err(Error::FutureAlreadyRetrieved);
        }
        Ok(Future::from_state(Arc::clone(&self.state)))
    }

    /// Fulfills the outcome, running the installed continuation on this
    /// thread.
    ///
    /// # Panics
    ///
    /// Panics if the outcome is already complete.
    pub fn set_value(self, value: T) {
        self.state.emplace_result(value);
    }

    /// Cancels the outcome. Has no effect when it is already complete.
    pub fn cancel(self) {
        self.state.cancel();
    }

    pub fn is_complete(&self) -> bool {
        self.state.is_complete()
    }
}

impl<T> Default for Promise<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for Promise<T> {
    fn clone(&self) -> Self {
        self.state.acquire_producer();
        Self {
            state: Arc::clone(&self.state),
        }
    }
}

impl<T> Drop for Promise<T> {
    /// If this is the last unresolved producer, cancel.
    fn drop(&mut self) {
        self.state.release_producer();
    }
}

impl<T> Debug for Promise<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Promise").field("state", &self.state).finish()
    }
}
