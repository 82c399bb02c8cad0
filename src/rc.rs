//! Shared-interior helper used by operators that split one logical state
//! between two observer roles (combiners, gates, timed operators).

use std::sync::{Arc, Mutex, MutexGuard};

use crate::error::StreamError;
use crate::observer::Observer;
use crate::subscription::SubscriptionLike;
use crate::value::Value;

pub trait RcDeref {
  type Target<'a>
  where
    Self: 'a;
  fn rc_deref(&self) -> Self::Target<'_>;
}

pub trait RcDerefMut {
  type Target<'a>
  where
    Self: 'a;
  fn rc_deref_mut(&self) -> Self::Target<'_>;
}

#[derive(Default)]
pub struct MutArc<T>(Arc<Mutex<T>>);

impl<T> MutArc<T> {
  pub fn own(t: T) -> Self { Self(Arc::new(Mutex::new(t))) }

  pub fn ptr_eq(&self, other: &Self) -> bool {
    Arc::ptr_eq(&self.0, &other.0)
  }
}

impl<T> RcDeref for MutArc<T> {
  type Target<'a>
    = MutexGuard<'a, T>
  where
    Self: 'a;

  #[inline]
  fn rc_deref(&self) -> Self::Target<'_> { self.0.lock().unwrap() }
}

impl<T> RcDerefMut for MutArc<T> {
  type Target<'a>
    = MutexGuard<'a, T>
  where
    Self: 'a;

  #[inline]
  fn rc_deref_mut(&self) -> Self::Target<'_> { self.0.lock().unwrap() }
}

/// `Option<O>` slot as an observer: `None` swallows everything, terminal
/// events take the inner observer out so nothing can follow them.
impl<O> Observer for MutArc<Option<O>>
where
  O: Observer,
{
  fn next(&mut self, value: Value) {
    if let Some(inner) = self.rc_deref_mut().as_mut() {
      inner.next(value);
    }
  }

  fn error(&mut self, err: StreamError) {
    if let Some(mut inner) = self.rc_deref_mut().take() {
      inner.error(err);
    }
  }

  fn complete(&mut self) {
    if let Some(mut inner) = self.rc_deref_mut().take() {
      inner.complete();
    }
  }

  fn is_closed(&self) -> bool {
    self.rc_deref().as_ref().is_none_or(Observer::is_closed)
  }
}

impl<T: SubscriptionLike> SubscriptionLike for MutArc<T> {
  #[inline]
  fn unsubscribe(&mut self) { self.rc_deref_mut().unsubscribe() }

  #[inline]
  fn is_closed(&self) -> bool { self.rc_deref().is_closed() }
}

impl<T> Clone for MutArc<T> {
  #[inline]
  fn clone(&self) -> Self { Self(self.0.clone()) }
}
