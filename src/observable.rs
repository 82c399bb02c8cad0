//! Observable: a lazy description of a push-based stream.
//!
//! An [`Observable`] is a cheap handle onto an immutable pipeline node.
//! Nodes form a DAG built bottom-up; nothing runs until `subscribe`, which
//! walks the graph and instantiates one live chain per call. The stages of
//! a live chain share one [`Subscription`], so disposing it anywhere tears
//! the whole activation down.

use smallvec::SmallVec;
use std::sync::Arc;

use crate::error::StreamError;
use crate::observer::{CallbackObserver, Observer};
use crate::subscription::{Subscription, SubscriptionLike};
use crate::value::Value;

mod block;
mod create;
mod from_cell;
mod from_iter;
mod interval;
mod just;
mod range;
mod trivial;

pub use create::{create, StreamEmitter};
pub use from_cell::from_cell;
pub use from_iter::from_iter;
pub use interval::{interval, interval_on};
pub use just::just;
pub use range::range;
pub use trivial::{empty, never, throw};

pub use crate::ops::combine_latest::combine_latest;
pub use crate::ops::concat::concat;
pub use crate::ops::merge::merge;
pub use crate::ops::zip::zip;

type ConnectFn = dyn Fn(&[Observable], Subscriber) + Send + Sync;

/// One pipeline stage: the upstream edges plus the closure that wires a
/// live subscription of this stage.
struct StreamNode {
  upstream: SmallVec<[Observable; 1]>,
  connect: Box<ConnectFn>,
}

/// A handle onto a pipeline stage. Cloning shares the node; subscribing
/// activates it. Holding an `Observable` alone keeps nothing running.
#[derive(Clone)]
pub struct Observable {
  node: Arc<StreamNode>,
}

impl std::fmt::Debug for Observable {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Observable").finish_non_exhaustive()
  }
}

impl Observable {
  /// A leaf node with no upstream.
  pub(crate) fn source(
    connect: impl Fn(Subscriber) + Send + Sync + 'static,
  ) -> Self {
    Observable {
      node: Arc::new(StreamNode {
        upstream: SmallVec::new(),
        connect: Box::new(move |_, subscriber| connect(subscriber)),
      }),
    }
  }

  /// A stage over exactly one upstream.
  pub(crate) fn stage(
    upstream: Observable,
    connect: impl Fn(&Observable, Subscriber) + Send + Sync + 'static,
  ) -> Self {
    let mut edges = SmallVec::new();
    edges.push(upstream);
    Observable {
      node: Arc::new(StreamNode {
        upstream: edges,
        connect: Box::new(move |upstream, subscriber| {
          connect(&upstream[0], subscriber)
        }),
      }),
    }
  }

  /// A stage joining any number of upstreams.
  pub(crate) fn joining(
    upstream: Vec<Observable>,
    connect: impl Fn(&[Observable], Subscriber) + Send + Sync + 'static,
  ) -> Self {
    Observable {
      node: Arc::new(StreamNode {
        upstream: upstream.into(),
        connect: Box::new(connect),
      }),
    }
  }

  /// Instantiate this stage for one live chain.
  pub(crate) fn activate(&self, subscriber: Subscriber) {
    (self.node.connect)(&self.node.upstream, subscriber)
  }

  /// Subscribe with a value callback only.
  ///
  /// If an error reaches a subscription made this way it is unrecoverable
  /// and the engine panics with the error's message. Use
  /// [`Observable::subscribe_err`] on any chain that can fail.
  pub fn subscribe(
    &self,
    next: impl FnMut(Value) + Send + 'static,
  ) -> Subscription {
    self.subscribe_observer(CallbackObserver::new(next, None, None))
  }

  pub fn subscribe_err(
    &self,
    next: impl FnMut(Value) + Send + 'static,
    error: impl FnMut(StreamError) + Send + 'static,
  ) -> Subscription {
    self.subscribe_observer(CallbackObserver::new(
      next,
      Some(Box::new(error)),
      None,
    ))
  }

  pub fn subscribe_complete(
    &self,
    next: impl FnMut(Value) + Send + 'static,
    complete: impl FnMut() + Send + 'static,
  ) -> Subscription {
    self.subscribe_observer(CallbackObserver::new(
      next,
      None,
      Some(Box::new(complete)),
    ))
  }

  pub fn subscribe_all(
    &self,
    next: impl FnMut(Value) + Send + 'static,
    error: impl FnMut(StreamError) + Send + 'static,
    complete: impl FnMut() + Send + 'static,
  ) -> Subscription {
    self.subscribe_observer(CallbackObserver::new(
      next,
      Some(Box::new(error)),
      Some(Box::new(complete)),
    ))
  }

  /// Subscribe with a hand-written observer.
  pub fn subscribe_with(
    &self,
    observer: impl Observer + Send + 'static,
  ) -> Subscription {
    self.subscribe_observer(observer)
  }

  fn subscribe_observer(
    &self,
    observer: impl Observer + Send + 'static,
  ) -> Subscription {
    let subscription = Subscription::new();
    let subscriber =
      Subscriber::new(Box::new(observer), subscription.clone());
    self.activate(subscriber);
    subscription
  }
}

/// The live counterpart of an observer: the observer plus the chain's
/// shared subscription, with the gate every notification passes.
///
/// The gate admits nothing after disposal or a terminal event. Terminal
/// events forward first and dispose the chain after, so the final observer
/// sees them before any teardown runs.
pub struct Subscriber {
  observer: Box<dyn Observer + Send>,
  subscription: Subscription,
  stopped: bool,
}

impl Subscriber {
  pub(crate) fn new(
    observer: Box<dyn Observer + Send>,
    subscription: Subscription,
  ) -> Self {
    Subscriber { observer, subscription, stopped: false }
  }

  pub(crate) fn subscription(&self) -> &Subscription { &self.subscription }

  /// Inherent so call sites need no disambiguation between the
  /// `Observer` and `SubscriptionLike` impls.
  pub fn is_closed(&self) -> bool {
    self.stopped || self.subscription.is_closed() || self.observer.is_closed()
  }
}

impl Observer for Subscriber {
  fn next(&mut self, value: Value) {
    if !self.is_closed() {
      self.observer.next(value);
    }
  }

  fn error(&mut self, err: StreamError) {
    if !self.is_closed() {
      self.stopped = true;
      self.observer.error(err);
      self.subscription.unsubscribe();
    }
  }

  fn complete(&mut self) {
    if !self.is_closed() {
      self.stopped = true;
      self.observer.complete();
      self.subscription.unsubscribe();
    }
  }

  fn is_closed(&self) -> bool { Subscriber::is_closed(self) }
}

impl SubscriptionLike for Subscriber {
  #[inline]
  fn unsubscribe(&mut self) { self.subscription.unsubscribe() }

  #[inline]
  fn is_closed(&self) -> bool { Subscriber::is_closed(self) }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::sync::{Arc, Mutex};

  fn counting_source() -> Observable {
    Observable::source(|mut subscriber| {
      subscriber.next(Value::from(1));
      subscriber.next(Value::from(2));
      subscriber.next(Value::from(3));
      subscriber.complete();
      subscriber.next(Value::from(4));
      subscriber.error(StreamError::new("never dispatched"));
    })
  }

  #[test]
  fn gate_stops_after_complete() {
    let next = Arc::new(Mutex::new(0));
    let err = Arc::new(Mutex::new(0));
    let complete = Arc::new(Mutex::new(0));
    let (n, e, c) = (next.clone(), err.clone(), complete.clone());
    counting_source().subscribe_all(
      move |_| *n.lock().unwrap() += 1,
      move |_| *e.lock().unwrap() += 1,
      move || *c.lock().unwrap() += 1,
    );
    assert_eq!(*next.lock().unwrap(), 3);
    assert_eq!(*err.lock().unwrap(), 0);
    assert_eq!(*complete.lock().unwrap(), 1);
  }

  #[test]
  fn gate_stops_after_error() {
    let next = Arc::new(Mutex::new(0));
    let err = Arc::new(Mutex::new(0));
    let source = Observable::source(|mut subscriber| {
      subscriber.next(Value::from(1));
      subscriber.error(StreamError::new("boom"));
      subscriber.next(Value::from(2));
      subscriber.complete();
    });
    let (n, e) = (next.clone(), err.clone());
    source.subscribe_err(
      move |_| *n.lock().unwrap() += 1,
      move |_| *e.lock().unwrap() += 1,
    );
    assert_eq!(*next.lock().unwrap(), 1);
    assert_eq!(*err.lock().unwrap(), 1);
  }

  #[test]
  fn subscription_closed_after_terminal() {
    let subscription = counting_source().subscribe(|_| {});
    assert!(subscription.is_closed());
  }

  #[test]
  fn each_subscribe_is_a_fresh_activation() {
    let runs = Arc::new(Mutex::new(0));
    let r = runs.clone();
    let source = Observable::source(move |mut subscriber| {
      *r.lock().unwrap() += 1;
      subscriber.complete();
    });
    source.subscribe(|_| {});
    source.subscribe(|_| {});
    assert_eq!(*runs.lock().unwrap(), 2);
  }

  #[test]
  fn terminal_reaches_observer_before_teardown() {
    let order = Arc::new(Mutex::new(Vec::new()));
    let subscription = Subscription::new();
    let o = order.clone();
    subscription.add_teardown(move || o.lock().unwrap().push("teardown"));
    let o = order.clone();
    let observer = CallbackObserver::new(
      |_| {},
      None,
      Some(Box::new(move || o.lock().unwrap().push("complete"))),
    );
    let mut subscriber =
      Subscriber::new(Box::new(observer), subscription.clone());
    subscriber.complete();
    assert_eq!(*order.lock().unwrap(), vec!["complete", "teardown"]);
  }
}
