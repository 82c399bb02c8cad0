use std::sync::Arc;

use crate::error::StreamError;
use crate::observable::{Observable, Subscriber};
use crate::observer::Observer;
use crate::value::Value;

impl Observable {
  /// Emits the running accumulation of `f` over the source, starting from
  /// `seed`.
  ///
  /// Each activation starts from its own copy of the seed, so one chain
  /// subscribed twice accumulates twice.
  ///
  /// # Example
  ///
  /// ```
  /// use freshet::prelude::*;
  ///
  /// observable::from_iter([1, 2, 3])
  ///   .scan(0, |acc, v| {
  ///     let sum = acc.as_number().unwrap_or(0.0)
  ///       + v.as_number().unwrap_or(0.0);
  ///     Ok(Value::from(sum))
  ///   })
  ///   .subscribe(|v| println!("{v:?}"));
  /// ```
  pub fn scan(
    &self,
    seed: impl Into<Value>,
    f: impl Fn(&Value, Value) -> Result<Value, StreamError>
      + Send
      + Sync
      + 'static,
  ) -> Observable {
    let seed = seed.into();
    let f = Arc::new(f);
    Observable::stage(self.clone(), move |upstream, down| {
      let subscription = down.subscription().clone();
      let observer = ScanObserver { down, acc: seed.clone(), f: f.clone() };
      upstream.activate(Subscriber::new(Box::new(observer), subscription));
    })
  }
}

struct ScanObserver<F> {
  down: Subscriber,
  acc: Value,
  f: Arc<F>,
}

impl<F> Observer for ScanObserver<F>
where
  F: Fn(&Value, Value) -> Result<Value, StreamError> + Send + Sync + 'static,
{
  fn next(&mut self, value: Value) {
    match (self.f)(&self.acc, value) {
      Ok(next) => {
        self.acc = next.clone();
        self.down.next(next);
      }
      Err(err) => self.down.error(err),
    }
  }

  fn error(&mut self, err: StreamError) { self.down.error(err) }

  fn complete(&mut self) { self.down.complete() }

  fn is_closed(&self) -> bool { self.down.is_closed() }
}
