use crate::error::StreamError;
use crate::observable::Observable;
use crate::observer::Observer;
use crate::rc::{MutArc, RcDeref, RcDerefMut};
use crate::subject::SubjectCore;
use crate::subscription::Subscription;
use crate::value::Value;

/// Multicast with a current value: every new subscriber first receives the
/// latest item (the seed until something is fed), then the live stream.
#[derive(Clone)]
pub struct BehaviorSubject {
  core: SubjectCore,
  latest: MutArc<Value>,
}

impl BehaviorSubject {
  pub fn new(seed: impl Into<Value>) -> Self {
    BehaviorSubject {
      core: SubjectCore::default(),
      latest: MutArc::own(seed.into()),
    }
  }

  /// The most recent item, read synchronously.
  pub fn latest_value(&self) -> Value { self.latest.rc_deref().clone() }

  /// The observable side. A subscription first receives the latest item;
  /// a subject that already terminated replays only the terminal event.
  pub fn observable(&self) -> Observable {
    let core = self.core.clone();
    let latest = self.latest.clone();
    Observable::source(move |mut subscriber| {
      if !core.is_terminated() {
        let current = latest.rc_deref().clone();
        subscriber.next(current);
        if subscriber.is_closed() {
          return;
        }
      }
      core.attach(subscriber);
    })
  }

  /// Subscribers currently attached and still open.
  pub fn subscriber_count(&self) -> usize { self.core.subscriber_count() }

  pub fn subscribe(
    &self,
    next: impl FnMut(Value) + Send + 'static,
  ) -> Subscription {
    self.observable().subscribe(next)
  }

  pub fn subscribe_err(
    &self,
    next: impl FnMut(Value) + Send + 'static,
    error: impl FnMut(StreamError) + Send + 'static,
  ) -> Subscription {
    self.observable().subscribe_err(next, error)
  }

  pub fn subscribe_complete(
    &self,
    next: impl FnMut(Value) + Send + 'static,
    complete: impl FnMut() + Send + 'static,
  ) -> Subscription {
    self.observable().subscribe_complete(next, complete)
  }

  pub fn subscribe_all(
    &self,
    next: impl FnMut(Value) + Send + 'static,
    error: impl FnMut(StreamError) + Send + 'static,
    complete: impl FnMut() + Send + 'static,
  ) -> Subscription {
    self.observable().subscribe_all(next, error, complete)
  }
}

impl Observer for BehaviorSubject {
  fn next(&mut self, value: Value) {
    if self.core.is_terminated() {
      return;
    }
    *self.latest.rc_deref_mut() = value.clone();
    self.core.next(value);
  }

  fn error(&mut self, err: StreamError) { self.core.error(err) }

  fn complete(&mut self) { self.core.complete() }

  fn is_closed(&self) -> bool { self.core.is_terminated() }
}
