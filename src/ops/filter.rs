use std::sync::Arc;

use crate::error::StreamError;
use crate::observable::{Observable, Subscriber};
use crate::observer::Observer;
use crate::value::Value;

impl Observable {
  /// Forwards only the items for which `predicate` returns `Ok(true)`.
  ///
  /// # Example
  ///
  /// ```
  /// use freshet::prelude::*;
  ///
  /// observable::from_iter([1, 2, 3, 4])
  ///   .filter(|v| Ok(v.as_number().unwrap_or(0.0) % 2.0 == 0.0))
  ///   .subscribe(|v| println!("{v:?}"));
  /// ```
  pub fn filter(
    &self,
    predicate: impl Fn(&Value) -> Result<bool, StreamError>
      + Send
      + Sync
      + 'static,
  ) -> Observable {
    let predicate = Arc::new(predicate);
    Observable::stage(self.clone(), move |upstream, down| {
      let subscription = down.subscription().clone();
      let observer = FilterObserver { down, predicate: predicate.clone() };
      upstream.activate(Subscriber::new(Box::new(observer), subscription));
    })
  }
}

struct FilterObserver<F> {
  down: Subscriber,
  predicate: Arc<F>,
}

impl<F> Observer for FilterObserver<F>
where
  F: Fn(&Value) -> Result<bool, StreamError> + Send + Sync + 'static,
{
  fn next(&mut self, value: Value) {
    match (self.predicate)(&value) {
      Ok(true) => self.down.next(value),
      Ok(false) => {}
      Err(err) => self.down.error(err),
    }
  }

  fn error(&mut self, err: StreamError) { self.down.error(err) }

  fn complete(&mut self) { self.down.complete() }

  fn is_closed(&self) -> bool { self.down.is_closed() }
}
