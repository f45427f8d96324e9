use std::fmt::{self, Debug};
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::{Duration, Instant};

use crate::state::OutcomeState;

/// A copyable view of an outcome, for several consumers of one value.
///
/// Unlike [`Future`](crate::Future) it never takes the value out; every
/// clone observes its own copy. Awaiting a shared future registers one waker
/// per awaiting task.
///
/// # Examples
///
/// ```
/// use promise_di::Promise;
/// use futures::executor::block_on;
/// use std::thread;
/// let (promise, future) = Promise::<String>::pair();
/// let shared = future.share();
/// let other = shared.clone();
///
/// let task1 = thread::spawn(move || block_on(async { shared.await }));
/// let task2 = thread::spawn(move || block_on(async { other.await }));
/// promise.set_value("🍓".into());
/// assert_eq!(task1.join().expect("The task1 thread has panicked").as_deref(), Some("🍓"));
/// assert_eq!(task2.join().expect("The task2 thread has panicked").as_deref(), Some("🍓"));
/// ```
pub struct SharedFuture<T> {
    state: Option<Arc<OutcomeState<T>>>,
}

impl<T> SharedFuture<T> {
    pub(crate) fn from_state(state: Option<Arc<OutcomeState<T>>>) -> Self {
        Self { state }
    }

    pub fn is_valid(&self) -> bool {
        self.state.is_some()
    }

    pub fn is_ready(&self) -> bool {
        self.state.as_ref().is_some_and(|state| state.is_complete())
    }

    pub fn was_canceled(&self) -> bool {
        self.state.as_ref().is_some_and(|state| state.was_canceled())
    }

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

    /// Lets go of the outcome. Other clones are unaffected.
    pub fn reset(&mut self) {
        self.state = None;
    }
}

impl<T: Clone> SharedFuture<T> {
    /// Blocks until complete and returns a copy of the value, `None` if
    /// canceled.
    pub fn get(&self) -> Option<T> {
        let state = self.state.as_ref()?;
        state.wait();
        state.clone_result()
    }
}

impl<T> Clone for SharedFuture<T> {
    fn clone(&self) -> Self {
        Self {
            state: self.state.clone(),
        }
    }
}

impl<T> Default for SharedFuture<T> {
    fn default() -> Self {
        Self { state: None }
    }
}

impl<T: Clone> std::future::Future for SharedFuture<T> {
    type Output = Option<T>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let Some(state) = self.state.as_ref() else {
            return Poll::Ready(None);
        };
        match state.poll_complete(cx.waker()) {
            Poll::Ready(()) => Poll::Ready(state.clone_result()),
            Poll::Pending => Poll::Pending,
        }
    }
}

impl<T> Debug for SharedFuture<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedFuture").field("state", &self.state).finish()
    }
}

#[cfg(test)]
mod tests {
use crate::Promise;
use futures::executor::block_on;
use std::thread;

#[test]
fn test_two_consumers() {
    let (op, op_a) = Promise::<String>::pair();
    let op_a = op_a.share();
    let op_b = op_a.clone();
    let task1 = thread::spawn(move || block_on(async { op_a.await }));
    let task2 = thread::spawn(move || block_on(async { op_b.await }));
    op.set_value(String::from("🍓"));
    assert_eq!(task1.join().expect("The task1 thread has panicked").as_deref(), Some("🍓"));
    assert_eq!(task2.join().expect("The task2 thread has panicked").as_deref(), Some("🍓"));
}

#[test]
fn test_get_is_repeatable() {
    let shared = Promise::fulfilled(7).get_future().share();
    assert_eq!(shared.get(), Some(7));
    assert_eq!(shared.clone().get(), Some(7));
}

#[test]
fn test_abandoned_yields_none_for_every_clone() {
    let (op, op_a) = Promise::<i32>::pair();
    let shared = op_a.share();
    let other = shared.clone();
    drop(op);
    assert!(shared.was_canceled());
    assert_eq!(shared.get(), None);
    assert_eq!(other.get(), None);
}

#[test]
fn test_reset_only_affects_one_clone() {
    let shared = Promise::fulfilled(1).get_future().share();
    let mut other = shared.clone();
    other.reset();
    assert!(!other.is_valid());
    assert!(shared.is_ready());
}
}
