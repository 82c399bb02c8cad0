use std::sync::Arc;

use crate::error::StreamError;
use crate::observable::{Observable, Subscriber};
use crate::observer::Observer;
use crate::value::Value;

impl Observable {
  /// Calls `f` on each item and passes its return downstream. An `Err`
  /// from `f` terminates the chain through the error channel.
  ///
  /// # Example
  ///
  /// ```
  /// use freshet::prelude::*;
  ///
  /// observable::from_iter([1, 2, 3])
  ///   .map(|v| Ok(Value::from(v.as_number().unwrap_or(0.0) * 2.0)))
  ///   .subscribe(|v| println!("{v:?}"));
  /// ```
  pub fn map(
    &self,
    f: impl Fn(Value) -> Result<Value, StreamError> + Send + Sync + 'static,
  ) -> Observable {
    let f = Arc::new(f);
    Observable::stage(self.clone(), move |upstream, down| {
      let subscription = down.subscription().clone();
      let observer = MapObserver { down, f: f.clone() };
      upstream.activate(Subscriber::new(Box::new(observer), subscription));
    })
  }
}

struct MapObserver<F> {
  down: Subscriber,
  f: Arc<F>,
}

impl<F> Observer for MapObserver<F>
where
  F: Fn(Value) -> Result<Value, StreamError> + Send + Sync + 'static,
{
  fn next(&mut self, value: Value) {
    match (self.f)(value) {
      Ok(mapped) => self.down.next(mapped),
      Err(err) => self.down.error(err),
    }
  }

  fn error(&mut self, err: StreamError) { self.down.error(err) }

  fn complete(&mut self) { self.down.complete() }

  fn is_closed(&self) -> bool { self.down.is_closed() }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::observable;
  use crate::test_support::EventBuffer;

  #[test]
  fn maps_each_item() {
    let events = EventBuffer::new();
    let doubled = observable::from_iter([1, 2, 3])
      .map(|v| Ok(Value::from(v.as_number().unwrap_or(0.0) * 2.0)));
    events.subscribe_to(&doubled);
    assert_eq!(events.numbers(), vec![2.0, 4.0, 6.0]);
    assert!(events.is_completed());
  }

  #[test]
  fn closure_err_flows_through_error_channel() {
    let events = EventBuffer::new();
    let source = observable::from_iter([1, 2, 3]).map(|v| {
      if v == Value::Number(2.0) {
        Err(StreamError::new("two is right out"))
      } else {
        Ok(v)
      }
    });
    events.subscribe_to(&source);
    assert_eq!(events.numbers(), vec![1.0]);
    assert_eq!(events.error_messages(), vec!["two is right out"]);
    assert_eq!(events.completes(), 0);
  }
}
