use parking_lot::{Condvar, Mutex};
use std::fmt::{self, Debug};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::task::{Poll, Waker};
use std::time::{Duration, Instant};

pub(crate) type Continuation = Box<dyn FnOnce() + Send + 'static>;

struct Inner<T> {
    result: Option<T>,
    continuation: Option<Continuation>,
    wakers: Vec<Waker>,
}

/// The completion state shared by every promise and future of one lineage.
///
/// `complete` only ever goes from false to true, and it is written under
/// `inner` so that a continuation being installed and the outcome being
/// completed agree on which side runs the continuation.
pub(crate) struct OutcomeState<T> {
    complete: AtomicBool,
    canceled: AtomicBool,
    future_retrieved: AtomicBool,
    producers: AtomicUsize,
    inner: Mutex<Inner<T>>,
    completion: Condvar,
}

impl<T> OutcomeState<T> {
    /// A pending outcome with no producers. Callers acquire one for every
    /// promise handle they create.
    pub(crate) fn new() -> Self {
        Self {
            complete: AtomicBool::new(false),
            canceled: AtomicBool::new(false),
            future_retrieved: AtomicBool::new(false),
            producers: AtomicUsize::new(0),
            inner: Mutex::new(Inner {
                result: None,
                continuation: None,
                wakers: Vec::new(),
            }),
            completion: Condvar::new(),
        }
    }

    pub(crate) fn is_complete(&self) -> bool {
        self.complete.load(Ordering::Acquire)
    }

    pub(crate) fn was_canceled(&self) -> bool {
        self.canceled.load(Ordering::Acquire)
    }

    /// Blocks until the outcome completes or `timeout` elapses. Returns
    /// whether the outcome is complete.
    pub(crate) fn wait_for(&self, timeout: Duration) -> bool {
        match Instant::now().checked_add(timeout) {
            Some(deadline) => self.wait_until(deadline),
            None => {
                self.wait();
                true
            }
        }
    }

    pub(crate) fn wait_until(&self, deadline: Instant) -> bool {
        if self.is_complete() {
            return true;
        }
        let mut inner = self.inner.lock();
        while !self.is_complete() {
            if self.completion.wait_until(&mut inner, deadline).timed_out() {
                return self.is_complete();
            }
        }
        true
    }

    pub(crate) fn wait(&self) {
        if self.is_complete() {
            return;
        }
        let mut inner = self.inner.lock();
        while !self.is_complete() {
            self.completion.wait(&mut inner);
        }
    }

    /// Installs `continuation`, replacing any previous one. When the outcome
    /// is already complete the continuation runs right here instead.
    /// Passing `None` clears the slot.
    pub(crate) fn set_continuation(&self, continuation: Option<Continuation>) {
        let run_now = {
            let mut inner = self.inner.lock();
            if self.is_complete() {
                continuation
            } else {
                inner.continuation = continuation;
                None
            }
        };
        if let Some(continuation) = run_now {
            continuation();
        }
    }

    /// Stores the value and completes the outcome.
    ///
    /// # Panics
    ///
    /// Panics if the outcome was already complete.
    pub(crate) fn emplace_result(&self, value: T) {
        let accepted = self.complete_with(Some(value), false);
        assert!(accepted, "outcome was fulfilled after it had already completed");
    }

    /// Completes the outcome as canceled. Late cancels are ignored.
    pub(crate) fn cancel(&self) -> bool {
        self.complete_with(None, true)
    }

    fn complete_with(&self, result: Option<T>, canceled: bool) -> bool {
        let (continuation, wakers) = {
            let mut inner = self.inner.lock();
            if self.is_complete() {
                return false;
            }
            inner.result = result;
            if canceled {
                self.canceled.store(true, Ordering::Release);
            }
            self.complete.store(true, Ordering::Release);
            (inner.continuation.take(), std::mem::take(&mut inner.wakers))
        };
        self.completion.notify_all();
        for waker in wakers {
            waker.wake();
        }
        if let Some(continuation) = continuation {
            continuation();
        }
        true
    }

    pub(crate) fn acquire_producer(&self) {
        self.producers.fetch_add(1, Ordering::AcqRel);
    }

    /// Drops one producer. The last producer leaving a pending outcome
    /// cancels it.
    pub(crate) fn release_producer(&self) {
        if self.producers.fetch_sub(1, Ordering::AcqRel) == 1 && self.cancel() {
            tracing::trace!("promise abandoned before fulfillment, outcome canceled");
        }
    }

    /// Marks the lineage as having minted its future. Returns whether it had
    /// already been marked.
    pub(crate) fn mark_future_retrieved(&self) -> bool {
        self.future_retrieved.swap(true, Ordering::AcqRel)
    }

    pub(crate) fn take_result(&self) -> Option<T> {
        self.inner.lock().result.take()
    }

    /// Registers `waker` unless the outcome is already complete.
    pub(crate) fn poll_complete(&self, waker: &Waker) -> Poll<()> {
        if self.is_complete() {
            return Poll::Ready(());
        }
        let mut inner = self.inner.lock();
        if self.is_complete() {
            return Poll::Ready(());
        }
        if !inner.wakers.iter().any(|known| known.will_wake(waker)) {
            inner.wakers.push(waker.clone());
        }
        Poll::Pending
    }
}

impl<T: Clone> OutcomeState<T> {
    pub(crate) fn clone_result(&self) -> Option<T> {
        self.inner.lock().result.clone()
    }
}

impl<T> Debug for OutcomeState<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OutcomeState")
            .field("complete", &self.is_complete())
            .field("canceled", &self.was_canceled())
            .field("producers", &self.producers.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}
