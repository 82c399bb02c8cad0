use crate::error::StreamError;
use crate::observable::Observable;
use crate::observer::Observer;
use crate::subject::SubjectCore;
use crate::subscription::Subscription;
use crate::value::Value;

/// Multicast pipe with no history: a subscriber sees only what is fed in
/// while it is attached.
///
/// Clones share the same core, so any clone can feed and any clone can be
/// subscribed.
///
/// # Example
///
/// ```
/// use freshet::prelude::*;
///
/// let subject = PublishSubject::new();
/// subject.subscribe(|v| println!("{v:?}"));
/// subject.clone().next(Value::from(1));
/// subject.clone().complete();
/// ```
#[derive(Clone, Default)]
pub struct PublishSubject {
  core: SubjectCore,
}

impl PublishSubject {
  pub fn new() -> Self { Self::default() }

  /// The observable side. Every subscription attaches to the shared
  /// fan-out list; a subject that already terminated replays the
  /// terminal event immediately.
  pub fn observable(&self) -> Observable {
    let core = self.core.clone();
    Observable::source(move |subscriber| core.attach(subscriber))
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

impl Observer for PublishSubject {
  fn next(&mut self, value: Value) { self.core.next(value) }

  fn error(&mut self, err: StreamError) { self.core.error(err) }

  fn complete(&mut self) { self.core.complete() }

  fn is_closed(&self) -> bool { self.core.is_terminated() }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::observable;
  use crate::test_support::EventBuffer;

  #[test]
  fn no_replay_for_late_subscribers() {
    let subject = PublishSubject::new();
    let early = EventBuffer::new();
    early.subscribe_to(&subject.observable());
    subject.clone().next(Value::from(1));

    let late = EventBuffer::new();
    late.subscribe_to(&subject.observable());
    subject.clone().next(Value::from(2));

    assert_eq!(early.numbers(), vec![1.0, 2.0]);
    assert_eq!(late.numbers(), vec![2.0]);
  }

  #[test]
  fn feeds_from_an_upstream_observable() {
    let subject = PublishSubject::new();
    let events = EventBuffer::new();
    events.subscribe_to(&subject.observable());
    observable::from_iter([1, 2, 3]).subscribe_with(subject.clone());
    assert_eq!(events.numbers(), vec![1.0, 2.0, 3.0]);
    assert!(events.is_completed());
    assert!(subject.clone().is_closed());
  }

  #[test]
  fn clones_share_one_core() {
    let subject = PublishSubject::new();
    let events = EventBuffer::new();
    events.subscribe_to(&subject.clone().observable());
    subject.clone().next(Value::from(5));
    assert_eq!(events.numbers(), vec![5.0]);
    assert_eq!(subject.subscriber_count(), 1);
  }
}
