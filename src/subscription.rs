//! Disposal model of the engine.
//!
//! Every activation of a pipeline yields a [`Subscription`], an aggregate
//! of teardown entries for the whole chain. Disposal is explicit: dropping
//! a `Subscription` does NOT unsubscribe. Scoped disposal is opt-in through
//! [`SubscriptionGuard`], and collection-style lifetime management through
//! [`DisposeBag`].

use smallvec::SmallVec;
use std::{
  any::Any,
  fmt::{Debug, Formatter},
  sync::{Arc, Mutex},
};

/// The disposable capability: tear down a resource before its source is
/// done with it.
pub trait SubscriptionLike {
  /// Tear down. Idempotent; the second and later calls are no-ops.
  fn unsubscribe(&mut self);

  fn is_closed(&self) -> bool;
}

impl Debug for Box<dyn SubscriptionLike + Send> {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Box<dyn SubscriptionLike>")
      .field("is_closed", &self.is_closed())
      .finish()
  }
}

/// Shared teardown aggregate for one pipeline activation.
///
/// Clones refer to the same state, so an operator deep in the chain and the
/// caller of `subscribe` dispose the same thing. Disposal runs each
/// teardown entry exactly once, in insertion order.
#[derive(Clone, Debug, Default)]
pub struct Subscription(Arc<Mutex<Inner<Box<dyn SubscriptionLike + Send>>>>);

impl Subscription {
  pub fn new() -> Self { Self::default() }

  /// Attach a teardown entry. If the subscription is already closed the
  /// entry is torn down immediately.
  pub fn add<S: SubscriptionLike + Send + 'static>(&self, subscription: S) {
    if !self.is_same(&subscription) {
      self.0.lock().unwrap().add(Box::new(subscription));
    }
  }

  /// Run `f` when this subscription is disposed (immediately if it already
  /// was).
  pub fn add_teardown(&self, f: impl FnOnce() + Send + 'static) {
    self.add(ClosureSubscription::new(f));
  }

  /// Move into a scoped guard that disposes on drop.
  pub fn guard(self) -> SubscriptionGuard<Subscription> {
    SubscriptionGuard::new(self)
  }

  pub fn teardown_size(&self) -> usize {
    self.0.lock().unwrap().teardown.len()
  }

  fn is_same(&self, other: &dyn Any) -> bool {
    if let Some(other) = other.downcast_ref::<Self>() {
      Arc::ptr_eq(&self.0, &other.0)
    } else {
      false
    }
  }
}

impl SubscriptionLike for Subscription {
  #[inline]
  fn unsubscribe(&mut self) { self.0.unsubscribe(); }
  #[inline]
  fn is_closed(&self) -> bool { self.0.is_closed() }
}

struct Inner<T> {
  closed: bool,
  teardown: SmallVec<[T; 1]>,
}

impl<T> Debug for Inner<T> {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Inner")
      .field("closed", &self.closed)
      .field("teardown_count", &self.teardown.len())
      .finish()
  }
}

impl<T: SubscriptionLike> SubscriptionLike for Inner<T> {
  #[inline(always)]
  fn is_closed(&self) -> bool { self.closed }

  fn unsubscribe(&mut self) {
    if !self.closed {
      self.closed = true;
      for v in &mut self.teardown {
        v.unsubscribe();
      }
      self.teardown.clear();
    }
  }
}

impl<T: SubscriptionLike> Inner<T> {
  fn add(&mut self, mut v: T) {
    if self.closed {
      v.unsubscribe();
    } else {
      self.teardown.retain(|v| !v.is_closed());
      self.teardown.push(v);
    }
  }
}

impl<T> Default for Inner<T> {
  fn default() -> Self {
    Inner {
      closed: false,
      teardown: SmallVec::new(),
    }
  }
}

impl<T> SubscriptionLike for Arc<Mutex<T>>
where
  T: SubscriptionLike,
{
  #[inline]
  fn unsubscribe(&mut self) { self.lock().unwrap().unsubscribe() }

  #[inline]
  fn is_closed(&self) -> bool { self.lock().unwrap().is_closed() }
}

impl<T: ?Sized> SubscriptionLike for Box<T>
where
  T: SubscriptionLike,
{
  #[inline]
  fn unsubscribe(&mut self) {
    let s = &mut **self;
    s.unsubscribe()
  }

  #[inline]
  fn is_closed(&self) -> bool {
    let s = &**self;
    s.is_closed()
  }
}

/// A one-shot teardown closure as a subscription.
pub struct ClosureSubscription(Option<Box<dyn FnOnce() + Send>>);

impl ClosureSubscription {
  pub fn new(f: impl FnOnce() + Send + 'static) -> Self {
    ClosureSubscription(Some(Box::new(f)))
  }
}

impl SubscriptionLike for ClosureSubscription {
  fn unsubscribe(&mut self) {
    if let Some(f) = self.0.take() {
      f();
    }
  }

  fn is_closed(&self) -> bool { self.0.is_none() }
}

/// An RAII implementation of a "scoped subscribed" of a subscription.
/// When this structure is dropped (falls out of scope), the subscription
/// will be unsubscribed.
///
/// If you want to drop it immediately, wrap it in its own scope.
#[derive(Debug)]
#[must_use]
pub struct SubscriptionGuard<T: SubscriptionLike>(pub(crate) T);

impl<T: SubscriptionLike> SubscriptionGuard<T> {
  /// Wraps an existing subscription with a guard to enable RAII behavior
  /// for it.
  pub fn new(subscription: T) -> SubscriptionGuard<T> {
    SubscriptionGuard(subscription)
  }
}

impl<T: SubscriptionLike> Drop for SubscriptionGuard<T> {
  #[inline]
  fn drop(&mut self) { self.0.unsubscribe() }
}

/// Keeps a set of subscriptions alive and disposes all of them exactly
/// once, either on [`DisposeBag::clear`] or on drop.
///
/// The bag is the container-shaped cousin of [`SubscriptionGuard`]: hand it
/// every subscription whose lifetime should match the bag owner's.
#[derive(Default)]
pub struct DisposeBag {
  entries: Vec<Box<dyn SubscriptionLike + Send>>,
  disposed: bool,
}

impl DisposeBag {
  pub fn new() -> Self { Self::default() }

  /// Hand a subscription to the bag. If the bag was already disposed the
  /// subscription is disposed on the spot.
  pub fn insert<S: SubscriptionLike + Send + 'static>(
    &mut self,
    mut subscription: S,
  ) {
    if self.disposed {
      subscription.unsubscribe();
    } else {
      self.entries.push(Box::new(subscription));
    }
  }

  /// Dispose everything now. Later inserts are disposed immediately.
  pub fn clear(&mut self) {
    if !self.disposed {
      self.disposed = true;
      for entry in &mut self.entries {
        entry.unsubscribe();
      }
      self.entries.clear();
    }
  }

  pub fn is_disposed(&self) -> bool { self.disposed }

  pub fn len(&self) -> usize { self.entries.len() }

  pub fn is_empty(&self) -> bool { self.entries.is_empty() }
}

impl Drop for DisposeBag {
  fn drop(&mut self) { self.clear(); }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn add_and_prune() {
    let subscription = Subscription::new();
    let s1 = Subscription::new();
    let mut s2 = Subscription::new();
    subscription.add(s1);
    subscription.add(s2.clone());
    assert_eq!(subscription.teardown_size(), 2);
    // Closed entries are pruned on the next add.
    s2.unsubscribe();
    subscription.add(Subscription::new());
    assert_eq!(subscription.teardown_size(), 2);
  }

  #[test]
  fn unsubscribe_is_idempotent_and_tears_down_once() {
    let count = Arc::new(Mutex::new(0));
    let mut subscription = Subscription::new();
    let c = count.clone();
    subscription.add_teardown(move || *c.lock().unwrap() += 1);
    subscription.unsubscribe();
    subscription.unsubscribe();
    assert_eq!(*count.lock().unwrap(), 1);
    assert!(subscription.is_closed());
  }

  #[test]
  fn add_after_close_disposes_immediately() {
    let mut subscription = Subscription::new();
    subscription.unsubscribe();
    let late = Subscription::new();
    subscription.add(late.clone());
    assert!(late.is_closed());
  }

  #[test]
  fn clones_share_disposal() {
    let a = Subscription::new();
    let mut b = a.clone();
    b.unsubscribe();
    assert!(a.is_closed());
  }

  #[test]
  fn drop_does_not_dispose() {
    let a = Subscription::new();
    {
      let _clone = a.clone();
    }
    assert!(!a.is_closed());
  }

  #[test]
  fn guard_disposes_on_drop() {
    let a = Subscription::new();
    {
      let _guard = a.clone().guard();
      assert!(!a.is_closed());
    }
    assert!(a.is_closed());
  }

  #[test]
  fn bag_disposes_exactly_once() {
    let count = Arc::new(Mutex::new(0));
    let tracked = Subscription::new();
    let c = count.clone();
    tracked.add_teardown(move || *c.lock().unwrap() += 1);
    let mut bag = DisposeBag::new();
    bag.insert(tracked.clone());
    bag.clear();
    bag.clear();
    assert_eq!(*count.lock().unwrap(), 1);
    assert!(tracked.is_closed());
    // Inserting into a disposed bag tears down on the spot.
    let late = Subscription::new();
    bag.insert(late.clone());
    assert!(late.is_closed());
  }

  #[test]
  fn bag_disposes_on_drop() {
    let tracked = Subscription::new();
    {
      let mut bag = DisposeBag::new();
      bag.insert(tracked.clone());
      assert!(!tracked.is_closed());
    }
    assert!(tracked.is_closed());
  }
}
