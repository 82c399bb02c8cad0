use std::sync::Arc;

use crate::error::StreamError;
use crate::observable::{Observable, Subscriber};
use crate::observer::Observer;
use crate::value::Value;

impl Observable {
  /// Folds the source with `f` and emits one final value at completion.
  ///
  /// An empty source emits the seed.
  pub fn reduce(
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
      let observer = ReduceObserver { down, acc: seed.clone(), f: f.clone() };
      upstream.activate(Subscriber::new(Box::new(observer), subscription));
    })
  }
}

struct ReduceObserver<F> {
  down: Subscriber,
  acc: Value,
  f: Arc<F>,
}

impl<F> Observer for ReduceObserver<F>
where
  F: Fn(&Value, Value) -> Result<Value, StreamError> + Send + Sync + 'static,
{
  fn next(&mut self, value: Value) {
    match (self.f)(&self.acc, value) {
      Ok(next) => self.acc = next,
      Err(err) => self.down.error(err),
    }
  }

  fn error(&mut self, err: StreamError) { self.down.error(err) }

  fn complete(&mut self) {
    let acc = std::mem::take(&mut self.acc);
    self.down.next(acc);
    self.down.complete();
  }

  fn is_closed(&self) -> bool { self.down.is_closed() }
}
