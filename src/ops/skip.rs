use crate::error::StreamError;
use crate::observable::{Observable, Subscriber};
use crate::observer::Observer;
use crate::value::Value;

impl Observable {
  /// Drops the first `count` items and forwards the rest.
  pub fn skip(&self, count: usize) -> Observable {
    Observable::stage(self.clone(), move |upstream, down| {
      let subscription = down.subscription().clone();
      let observer = SkipObserver { down, remaining: count };
      upstream.activate(Subscriber::new(Box::new(observer), subscription));
    })
  }
}

struct SkipObserver {
  down: Subscriber,
  remaining: usize,
}

impl Observer for SkipObserver {
  fn next(&mut self, value: Value) {
    if self.remaining > 0 {
      self.remaining -= 1;
      return;
    }
    self.down.next(value);
  }

  fn error(&mut self, err: StreamError) { self.down.error(err) }

  fn complete(&mut self) { self.down.complete() }

  fn is_closed(&self) -> bool { self.down.is_closed() }
}
