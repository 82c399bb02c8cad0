use crate::error::StreamError;
use crate::observable::{Observable, Subscriber};
use crate::observer::Observer;
use crate::value::Value;

impl Observable {
  /// Drops items that compare equal to the previous emitted item.
  ///
  /// Comparison is structural `Value` equality, so `1` and `1.0` are the
  /// same number but `Value::from(1)` and `Value::from("1")` are distinct.
  pub fn distinct_until_changed(&self) -> Observable {
    Observable::stage(self.clone(), move |upstream, down| {
      let subscription = down.subscription().clone();
      let observer = DistinctObserver { down, last: None };
      upstream.activate(Subscriber::new(Box::new(observer), subscription));
    })
  }
}

struct DistinctObserver {
  down: Subscriber,
  last: Option<Value>,
}

impl Observer for DistinctObserver {
  fn next(&mut self, value: Value) {
    if self.last.as_ref() == Some(&value) {
      return;
    }
    self.last = Some(value.clone());
    self.down.next(value);
  }

  fn error(&mut self, err: StreamError) { self.down.error(err) }

  fn complete(&mut self) { self.down.complete() }

  fn is_closed(&self) -> bool { self.down.is_closed() }
}
