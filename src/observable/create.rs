use crate::error::StreamError;
use crate::observable::{Observable, Subscriber};
use crate::observer::Observer;
use crate::rc::{MutArc, RcDeref, RcDerefMut};
use crate::subscription::Subscription;
use crate::value::Value;

/// Creates an observable from an emission procedure.
///
/// `on_subscribe` runs once per subscription and receives a
/// [`StreamEmitter`]. Emitting synchronously inside it is fine, and so is
/// cloning the emitter into a callback or another thread and emitting
/// later; the observable itself keeps none of those captures alive, so the
/// producer's lifetime is whatever the user arranges.
pub fn create(
  on_subscribe: impl Fn(StreamEmitter) + Send + Sync + 'static,
) -> Observable {
  Observable::source(move |subscriber| {
    on_subscribe(StreamEmitter::new(subscriber));
  })
}

/// The producer handle passed to [`create`]'s emission procedure.
///
/// Clone and send it anywhere; all clones feed the same subscription.
/// Calls are serialized per chain, and everything after a terminal event
/// or disposal is silently dropped.
#[derive(Clone)]
pub struct StreamEmitter {
  slot: MutArc<Option<Subscriber>>,
  subscription: Subscription,
}

impl StreamEmitter {
  fn new(subscriber: Subscriber) -> Self {
    let subscription = subscriber.subscription().clone();
    StreamEmitter { slot: MutArc::own(Some(subscriber)), subscription }
  }

  pub fn next(&self, value: impl Into<Value>) {
    if let Some(subscriber) = self.slot.rc_deref_mut().as_mut() {
      subscriber.next(value.into());
    }
  }

  pub fn error(&self, err: StreamError) {
    if let Some(mut subscriber) = self.slot.rc_deref_mut().take() {
      subscriber.error(err);
    }
  }

  pub fn complete(&self) {
    if let Some(mut subscriber) = self.slot.rc_deref_mut().take() {
      subscriber.complete();
    }
  }

  /// `true` once emitting is pointless: terminal event sent or the
  /// subscription disposed. Long-running producers should poll this and
  /// stop.
  pub fn is_closed(&self) -> bool {
    self
      .slot
      .rc_deref()
      .as_ref()
      .is_none_or(|subscriber| subscriber.is_closed())
  }

  /// Run `f` when the subscription is disposed, for releasing whatever
  /// the producer holds.
  pub fn add_teardown(&self, f: impl FnOnce() + Send + 'static) {
    self.subscription.add_teardown(f);
  }
}
