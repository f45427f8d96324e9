//! Single-consumer futures and the continuation combinators.
//!
//! Every combinator consumes the future it is called on and returns a new
//! future for the continuation's result. Continuations run on whichever
//! thread completes the source, or immediately on the calling thread when the
//! source is already complete.
//!
//! ```text
//!            then(f)        f(source)          always
//!   source ─ and_then(f) ─ f(value)       ─▶ only on success, else canceled
//!            or_else(f)     f()                only on cancel, else canceled
//!            next(f)        f(Option<value>)   always
//! ```

use std::fmt::{self, Debug};
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::{Duration, Instant};

use crate::error::Error;
use crate::promise::Promise;
use crate::shared::SharedFuture;
use crate::state::OutcomeState;

/// The consumer side of an outcome. Move-only: exactly one consumer may
/// observe or take the value.
///
/// A future also implements [`std::future::Future`], resolving to `None` when
/// the outcome was canceled.
pub struct Future<T> {
    state: Option<Arc<OutcomeState<T>>>,
}

impl<T> Future<T> {
    pub(crate) fn from_state(state: Arc<OutcomeState<T>>) -> Self {
        Self { state: Some(state) }
    }

    /// An already fulfilled future.
    pub fn ready(value: T) -> Self {
        Promise::fulfilled(value).get_future()
    }

    /// An already canceled future.
    pub fn canceled() -> Self {
        let promise = Promise::new();
        let future = promise.get_future();
        promise.cancel();
        future
    }

    fn take_state(&mut self) -> Arc<OutcomeState<T>> {
        match self.state.take() {
            Some(state) => state,
            None => panic!("future has no outcome attached"),
        }
    }

    /// False once the future was reset or consumed.
    pub fn is_valid(&self) -> bool {
        self.state.is_some()
    }

    pub fn is_ready(&self) -> bool {
        self.state.as_ref().is_some_and(|state| state.is_complete())
    }

    pub fn was_canceled(&self) -> bool {
        self.state.as_ref().is_some_and(|state| state.was_canceled())
    }

    /// Blocks until the outcome completes. Returns at once on an invalid
    /// future.
    pub fn wait(&self) {
        if let Some(state) = &self.state {
            state.wait();
        }
    }

    pub fn wait_for(&self, timeout: Duration) -> bool {
        self.state.as_ref().is_some_and(|state| state.wait_for(timeout))
    }

    pub fn wait_until(&self, deadline: Instant) -> bool {
        self.state.as_ref().is_some_and(|state| state.wait_until(deadline))
    }

    /// Blocks until complete and takes the value out, `None` if canceled.
    pub fn consume(mut self) -> Option<T> {
        let state = self.state.take()?;
        state.wait();
        state.take_result()
    }

    /// Like [`Future::consume`], reporting cancellation as an error.
    pub fn into_result(self) -> Result<T, Error> {
        self.consume().ok_or(Error::Canceled)
    }

    /// Converts into a copyable future for several consumers.
    pub fn share(mut self) -> SharedFuture<T> {
        SharedFuture::from_state(self.state.take())
    }

    /// Clears any installed continuation and lets go of the outcome.
    pub fn reset(&mut self) {
        if let Some(state) = self.state.take() {
            state.set_continuation(None);
        }
    }
}

impl<T: Clone> Future<T> {
    /// Blocks until complete and returns a copy of the value, `None` if
    /// canceled.
    pub fn get(&self) -> Option<T> {
        let state = self.state.as_ref()?;
        state.wait();
        state.clone_result()
    }
}

impl<T: Send + 'static> Future<T> {
    /// Runs `continuation` with this future once it completes, fulfilled or
    /// canceled. The returned future holds the continuation's result, or is
    /// canceled after the continuation ran when the source was canceled.
    ///
    /// # Panics
    ///
    /// Panics on an invalid future.
    pub fn then<R, F>(mut self, continuation: F) -> Future<R>
    where
        R: Send + 'static,
        F: FnOnce(Future<T>) -> R + Send + 'static,
    {
        let source = self.take_state();
        let (promise, future) = Promise::pair();
        let captured = Arc::clone(&source);
        source.set_continuation(Some(Box::new(move || {
            let canceled = captured.was_canceled();
            let result = continuation(Future::from_state(captured));
            if canceled {
                promise.cancel();
            } else {
                promise.set_value(result);
            }
        })));
        future
    }

    /// Runs `continuation` with the value only when the source succeeds.
    ///
    /// # Examples
    ///
    /// ```
    /// use promise_di::Promise;
    /// let (promise, future) = Promise::<i32>::pair();
    /// let doubled = future.and_then(|value| value * 2);
    /// promise.set_value(21);
    /// assert_eq!(doubled.consume(), Some(42));
    /// ```
    pub fn and_then<R, F>(self, continuation: F) -> Future<R>
    where
        R: Send + 'static,
        F: FnOnce(T) -> R + Send + 'static,
    {
        let (promise, future) = Promise::pair();
        let _ = self.then(move |source| match source.consume() {
            Some(value) => promise.set_value(continuation(value)),
            None => promise.cancel(),
        });
        future
    }

    /// Runs `continuation` only when the source is canceled.
    pub fn or_else<R, F>(self, continuation: F) -> Future<R>
    where
        R: Send + 'static,
        F: FnOnce() -> R + Send + 'static,
    {
        let (promise, future) = Promise::pair();
        let _ = self.then(move |source| {
            if source.was_canceled() {
                promise.set_value(continuation());
            } else {
                promise.cancel();
            }
        });
        future
    }

    /// Always runs `continuation`, passing `None` when the source was
    /// canceled. Like [`Future::then`], the returned future is canceled after
    /// the continuation ran on a canceled source.
    pub fn next<R, F>(self, continuation: F) -> Future<R>
    where
        R: Send + 'static,
        F: FnOnce(Option<T>) -> R + Send + 'static,
    {
        self.then(move |source| continuation(source.consume()))
    }
}

impl<T> Default for Future<T> {
    /// An invalid future with no outcome attached.
    fn default() -> Self {
        Self { state: None }
    }
}

impl<T> std::future::Future for Future<T> {
    type Output = Option<T>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let Some(state) = self.state.as_ref() else {
            return Poll::Ready(None);
        };
        match state.poll_complete(cx.waker()) {
            Poll::Ready(()) => Poll::Ready(state.take_result()),
            Poll::Pending => Poll::Pending,
        }
    }
}

impl<T> Debug for Future<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Future").field("state", &self.state).finish()
    }
}

#[cfg(test)]
mod tests {
use crate::{Future, Promise};
use futures::executor::block_on;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

#[test]
fn test_next_sees_value() {
    let (promise, future) = Promise::<i32>::pair();
    let seen = future.next(|value| value);
    promise.set_value(1234);
    assert_eq!(seen.consume(), Some(Some(1234)));
}

#[test]
fn test_next_sees_none_when_promise_dropped() {
    let (promise, future) = Promise::<i32>::pair();
    let ran = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&ran);
    let seen = future.next(move |value| {
        counter.fetch_add(1, Ordering::SeqCst);
        value.is_none()
    });
    drop(promise);
    assert_eq!(ran.load(Ordering::SeqCst), 1);
    assert!(seen.was_canceled());
}

#[test]
fn test_next_then_or_else_takes_cancel_branch() {
    let (promise, future) = Promise::<i32>::pair();
    let fallback = future.next(|value| value.unwrap_or_default()).or_else(|| -1);
    promise.cancel();
    assert_eq!(fallback.consume(), Some(-1));
}

#[test]
fn test_next_on_unit_outcome_reports_success() {
    let (promise, future) = Promise::<()>::pair();
    let ok = future.next(|value| value.is_some());
    promise.set_value(());
    assert_eq!(ok.consume(), Some(true));

    let (promise, future) = Promise::<()>::pair();
    let seen = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&seen);
    let ok = future.next(move |value| {
        if value.is_none() {
            counter.fetch_add(1, Ordering::SeqCst);
        }
    });
    promise.cancel();
    assert_eq!(seen.load(Ordering::SeqCst), 1);
    assert!(ok.was_canceled());
}

#[test]
fn test_then_runs_on_cancel_and_cancels_result() {
    let (promise, future) = Promise::<i32>::pair();
    let ran = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&ran);
    let result = future.then(move |source| {
        counter.fetch_add(1, Ordering::SeqCst);
        source.was_canceled()
    });
    promise.cancel();
    assert_eq!(ran.load(Ordering::SeqCst), 1);
    assert!(result.was_canceled());
    assert_eq!(result.consume(), None);
}

#[test]
fn test_then_receives_fulfilled_source() {
    let (promise, future) = Promise::<i32>::pair();
    let result = future.then(|source| source.consume().map(|value| value + 1));
    promise.set_value(1);
    assert_eq!(result.consume(), Some(Some(2)));
}

#[test]
fn test_and_then_skipped_on_cancel() {
    let (promise, future) = Promise::<i32>::pair();
    let ran = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&ran);
    let result = future.and_then(move |value| {
        counter.fetch_add(1, Ordering::SeqCst);
        value
    });
    promise.cancel();
    assert_eq!(ran.load(Ordering::SeqCst), 0);
    assert!(result.was_canceled());
}

#[test]
fn test_or_else_skipped_on_success() {
    let (promise, future) = Promise::<i32>::pair();
    let result = future.or_else(|| -1);
    promise.set_value(3);
    assert!(result.was_canceled());
}

#[test]
fn test_and_then_or_else_runs_exactly_one_branch() {
    for cancel in [false, true] {
        let (promise, future) = Promise::<i32>::pair();
        let succeeded = Arc::new(AtomicUsize::new(0));
        let failed = Arc::new(AtomicUsize::new(0));
        let on_success = Arc::clone(&succeeded);
        let on_failure = Arc::clone(&failed);
        let _ = future
            .and_then(move |_| {
                on_success.fetch_add(1, Ordering::SeqCst);
            })
            .or_else(move || {
                on_failure.fetch_add(1, Ordering::SeqCst);
            });
        if cancel {
            promise.cancel();
        } else {
            promise.set_value(0);
        }
        assert_eq!(succeeded.load(Ordering::SeqCst) + failed.load(Ordering::SeqCst), 1);
        assert_eq!(failed.load(Ordering::SeqCst) == 1, cancel);
    }
}

#[test]
fn test_continuation_on_ready_future_runs_inline() {
    let result = Future::ready(20).and_then(|value| value + 1);
    assert!(result.is_ready());
    assert_eq!(result.consume(), Some(21));
}

#[test]
fn test_reset_drops_continuation() {
    let (promise, mut future) = Promise::<i32>::pair();
    future.reset();
    assert!(!future.is_valid());
    promise.set_value(1);
    assert!(!future.is_ready());
    assert_eq!(future.consume(), None);
}

#[test]
fn test_chain_completes_on_producer_thread() {
    let (promise, future) = Promise::<u32>::pair();
    let chained = future.and_then(|value| value * 2).and_then(|value| value + 1);
    let task = thread::spawn(move || {
        thread::sleep(Duration::from_millis(10));
        promise.set_value(20);
    });
    assert!(chained.wait_for(Duration::from_secs(5)));
    assert_eq!(chained.get(), Some(41));
    task.join().expect("The producer thread has panicked");
}

#[test]
fn test_await_canceled_future() {
    assert_eq!(block_on(Future::<i32>::canceled()), None);
    assert_eq!(Future::<i32>::canceled().into_result(), Err(crate::Error::Canceled));
}
}
