use crate::error::StreamError;
use crate::observable::{Observable, Subscriber};
use crate::observer::Observer;
use crate::value::Value;

impl Observable {
  /// Forwards the first `count` items and then completes.
  ///
  /// `take(0)` completes immediately without activating the upstream.
  pub fn take(&self, count: usize) -> Observable {
    Observable::stage(self.clone(), move |upstream, mut down| {
      if count == 0 {
        down.complete();
        return;
      }
      let subscription = down.subscription().clone();
      let observer = TakeObserver { down, remaining: count };
      upstream.activate(Subscriber::new(Box::new(observer), subscription));
    })
  }
}

struct TakeObserver {
  down: Subscriber,
  remaining: usize,
}

impl Observer for TakeObserver {
  fn next(&mut self, value: Value) {
    if self.remaining == 0 {
      return;
    }
    self.remaining -= 1;
    self.down.next(value);
    if self.remaining == 0 {
      self.down.complete();
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
  use crate::test_support::{feed, EventBuffer};

  #[test]
  fn completes_after_count_items() {
    let events = EventBuffer::new();
    events.subscribe_to(&observable::from_iter([1, 2, 3, 4, 5]).take(3));
    assert_eq!(events.numbers(), vec![1.0, 2.0, 3.0]);
    assert!(events.is_completed());
  }

  #[test]
  fn take_zero_completes_without_touching_the_source() {
    let events = EventBuffer::new();
    let (input, source) = feed();
    events.subscribe_to(&source.take(0));
    // With no activation there is no emitter to feed.
    input.next(1);
    assert!(events.numbers().is_empty());
    assert!(events.is_completed());
  }

  #[test]
  fn short_source_completes_early() {
    let events = EventBuffer::new();
    events.subscribe_to(&observable::from_iter([1, 2]).take(5));
    assert_eq!(events.numbers(), vec![1.0, 2.0]);
    assert!(events.is_completed());
  }

  #[test]
  fn ignores_items_past_the_cutoff() {
    let events = EventBuffer::new();
    let (input, source) = feed();
    events.subscribe_to(&source.take(2));
    input.next(1);
    input.next(2);
    input.next(3);
    assert_eq!(events.numbers(), vec![1.0, 2.0]);
    assert_eq!(events.completes(), 1);
  }
}
