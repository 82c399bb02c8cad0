use crate::error::StreamError;
use crate::observable::Observable;
use crate::observer::Observer;

/// Creates an observable that produces no values.
///
/// Completes immediately. Never emits an error.
pub fn empty() -> Observable {
  Observable::source(|mut subscriber| subscriber.complete())
}

/// Creates an observable that never emits anything.
///
/// Neither emits a value, nor completes, nor emits an error.
pub fn never() -> Observable { Observable::source(|_| {}) }

/// Creates an observable that emits no items, just terminates with an
/// error.
pub fn throw(err: StreamError) -> Observable {
  Observable::source(move |mut subscriber| subscriber.error(err.clone()))
}
