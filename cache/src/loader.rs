use parking_lot::Mutex;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll, Waker};

/// The internal state of a value being loaded.
pub(crate) enum State<V> {
  Loading,
  /// `None` means the load failed; every waiter observes the same outcome.
  Complete(Option<Arc<V>>),
}

pub(crate) struct Inner<V> {
  pub(crate) state: State<V>,
  pub(crate) waiters: Vec<Waker>,
}

/// A shared, in-flight load. It can be awaited by any number of tasks
/// through `&LoadFuture`, and is completed exactly once by the loading task.
pub(crate) struct LoadFuture<V> {
  pub(crate) inner: Mutex<Inner<V>>,
}

impl<V> LoadFuture<V> {
  pub fn new() -> Self {
    Self {
      inner: Mutex::new(Inner {
        state: State::Loading,
        waiters: Vec::new(),
      }),
    }
  }

  /// Completes the load with an outcome, waking all waiters.
  pub fn complete(&self, value: Option<Arc<V>>) {
    let waiters = {
      let mut inner = self.inner.lock();
      inner.state = State::Complete(value);
      std::mem::take(&mut inner.waiters)
    };
    for waker in waiters {
      waker.wake();
    }
  }
}

impl<V> Future for &LoadFuture<V> {
  type Output = Option<Arc<V>>;

  fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
    let mut inner = self.inner.lock();
    match &inner.state {
      State::Complete(value) => Poll::Ready(value.clone()),
      State::Loading => {
        if !inner.waiters.iter().any(|w| w.will_wake(cx.waker())) {
          inner.waiters.push(cx.waker().clone());
        }
        Poll::Pending
      }
    }
  }
}
