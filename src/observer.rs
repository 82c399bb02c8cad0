//! Observer trait: the consumer half of a pipeline.
//!
//! An observer receives values, at most one terminal event (error or
//! complete), and nothing after that. All methods take `&mut self` so
//! observers stay object safe; pipelines are assembled at runtime, so
//! every stage holds its downstream as a trait object.

use crate::error::StreamError;
use crate::value::Value;

pub trait Observer {
  /// Receive the next value from the stream.
  fn next(&mut self, value: Value);

  /// Receive the terminal error. No notification follows.
  fn error(&mut self, err: StreamError);

  /// Receive normal completion. No notification follows.
  fn complete(&mut self);

  /// `true` once the observer will not accept more values. Sources use
  /// this to stop emitting early (e.g. after a `take` cut the chain).
  fn is_closed(&self) -> bool;
}

impl<T: Observer + ?Sized> Observer for Box<T> {
  #[inline]
  fn next(&mut self, value: Value) { (**self).next(value) }
  #[inline]
  fn error(&mut self, err: StreamError) { (**self).error(err) }
  #[inline]
  fn complete(&mut self) { (**self).complete() }
  #[inline]
  fn is_closed(&self) -> bool { (**self).is_closed() }
}

/// Observer assembled from optional callbacks, the shape behind every
/// `subscribe*` variant.
///
/// An error arriving with no error callback is unrecoverable and panics
/// with the error's message; subscribe with an error handler on any chain
/// that can fail.
pub struct CallbackObserver {
  next: Box<dyn FnMut(Value) + Send>,
  error: Option<Box<dyn FnMut(StreamError) + Send>>,
  complete: Option<Box<dyn FnMut() + Send>>,
  stopped: bool,
}

impl CallbackObserver {
  pub fn new(
    next: impl FnMut(Value) + Send + 'static,
    error: Option<Box<dyn FnMut(StreamError) + Send>>,
    complete: Option<Box<dyn FnMut() + Send>>,
  ) -> Self {
    CallbackObserver { next: Box::new(next), error, complete, stopped: false }
  }
}

impl Observer for CallbackObserver {
  fn next(&mut self, value: Value) {
    if !self.stopped {
      (self.next)(value);
    }
  }

  fn error(&mut self, err: StreamError) {
    if self.stopped {
      return;
    }
    self.stopped = true;
    match &mut self.error {
      Some(f) => f(err),
      None => panic!("unhandled stream error: {err}"),
    }
  }

  fn complete(&mut self) {
    if self.stopped {
      return;
    }
    self.stopped = true;
    if let Some(f) = &mut self.complete {
      f();
    }
  }

  fn is_closed(&self) -> bool { self.stopped }
}
