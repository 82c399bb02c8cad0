use std::sync::Arc;

use crate::error::StreamError;
use crate::observable::{Observable, Subscriber};
use crate::observer::Observer;
use crate::value::Value;

impl Observable {
  /// Forwards items while `predicate` returns `Ok(true)`, then completes.
  ///
  /// The first failing item is not emitted.
  pub fn take_while(
    &self,
    predicate: impl Fn(&Value) -> Result<bool, StreamError>
      + Send
      + Sync
      + 'static,
  ) -> Observable {
    let predicate = Arc::new(predicate);
    Observable::stage(self.clone(), move |upstream, down| {
      let subscription = down.subscription().clone();
      let observer = TakeWhileObserver { down, predicate: predicate.clone() };
      upstream.activate(Subscriber::new(Box::new(observer), subscription));
    })
  }
}

struct TakeWhileObserver<F> {
  down: Subscriber,
  predicate: Arc<F>,
}

impl<F> Observer for TakeWhileObserver<F>
where
  F: Fn(&Value) -> Result<bool, StreamError> + Send + Sync + 'static,
{
  fn next(&mut self, value: Value) {
    match (self.predicate)(&value) {
      Ok(true) => self.down.next(value),
      Ok(false) => self.down.complete(),
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
  fn stops_at_the_first_failing_item() {
    let events = EventBuffer::new();
    let source = observable::from_iter([1, 2, 3, 2, 1])
      .take_while(|v| Ok(v.as_number().unwrap_or(0.0) < 3.0));
    events.subscribe_to(&source);
    assert_eq!(events.numbers(), vec![1.0, 2.0]);
    assert!(events.is_completed());
  }

  #[test]
  fn passes_everything_when_the_predicate_holds() {
    let events = EventBuffer::new();
    let source = observable::from_iter([1, 2, 3]).take_while(|_| Ok(true));
    events.subscribe_to(&source);
    assert_eq!(events.numbers(), vec![1.0, 2.0, 3.0]);
    assert!(events.is_completed());
  }

  #[test]
  fn predicate_err_becomes_the_terminal_error() {
    let events = EventBuffer::new();
    let source = observable::from_iter([1, 2])
      .take_while(|_| Err(StreamError::new("no judgement possible")));
    events.subscribe_to(&source);
    assert!(events.numbers().is_empty());
    assert_eq!(events.error_messages(), vec!["no judgement possible"]);
  }
}
