use std::collections::VecDeque;

use crate::error::StreamError;
use crate::observable::{Observable, Subscriber};
use crate::observer::Observer;
use crate::value::Value;

impl Observable {
  /// Emits the final `count` items of the source, at completion, in source
  /// order.
  ///
  /// Buffers at most `count` items. Nothing is emitted while the source is
  /// running, and nothing is emitted for a source that errors.
  pub fn take_last(&self, count: usize) -> Observable {
    Observable::stage(self.clone(), move |upstream, mut down| {
      if count == 0 {
        down.complete();
        return;
      }
      let subscription = down.subscription().clone();
      let observer =
        TakeLastObserver { down, count, tail: VecDeque::with_capacity(count) };
      upstream.activate(Subscriber::new(Box::new(observer), subscription));
    })
  }
}

struct TakeLastObserver {
  down: Subscriber,
  count: usize,
  tail: VecDeque<Value>,
}

impl Observer for TakeLastObserver {
  fn next(&mut self, value: Value) {
    if self.tail.len() == self.count {
      self.tail.pop_front();
    }
    self.tail.push_back(value);
  }

  fn error(&mut self, err: StreamError) {
    self.tail.clear();
    self.down.error(err);
  }

  fn complete(&mut self) {
    while let Some(value) = self.tail.pop_front() {
      self.down.next(value);
    }
    self.down.complete();
  }

  fn is_closed(&self) -> bool { self.down.is_closed() }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::observable;
  use crate::test_support::{feed, EventBuffer};

  #[test]
  fn replays_the_tail_at_completion() {
    let events = EventBuffer::new();
    events.subscribe_to(&observable::from_iter([1, 2, 3, 4, 5]).take_last(2));
    assert_eq!(events.numbers(), vec![4.0, 5.0]);
    assert!(events.is_completed());
  }

  #[test]
  fn nothing_flows_before_completion() {
    let events = EventBuffer::new();
    let (input, source) = feed();
    events.subscribe_to(&source.take_last(3));
    input.next(1);
    input.next(2);
    assert!(events.numbers().is_empty());
    input.complete();
    assert_eq!(events.numbers(), vec![1.0, 2.0]);
  }

  #[test]
  fn short_source_replays_everything() {
    let events = EventBuffer::new();
    events.subscribe_to(&observable::from_iter([1, 2]).take_last(10));
    assert_eq!(events.numbers(), vec![1.0, 2.0]);
  }

  #[test]
  fn error_discards_the_buffer() {
    let events = EventBuffer::new();
    let (input, source) = feed();
    events.subscribe_to(&source.take_last(2));
    input.next(1);
    input.error("lost");
    assert!(events.numbers().is_empty());
    assert_eq!(events.error_messages(), vec!["lost"]);
  }
}
