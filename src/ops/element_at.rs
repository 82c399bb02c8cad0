use crate::error::StreamError;
use crate::observable::{Observable, Subscriber};
use crate::observer::Observer;
use crate::value::Value;

impl Observable {
  /// Forwards only the item at `index` (zero-based), then completes.
  ///
  /// A source that completes before reaching `index` completes the chain
  /// without emitting.
  pub fn element_at(&self, index: usize) -> Observable {
    Observable::stage(self.clone(), move |upstream, down| {
      let subscription = down.subscription().clone();
      let observer = ElementAtObserver { down, index, seen: 0 };
      upstream.activate(Subscriber::new(Box::new(observer), subscription));
    })
  }
}

struct ElementAtObserver {
  down: Subscriber,
  index: usize,
  seen: usize,
}

impl Observer for ElementAtObserver {
  fn next(&mut self, value: Value) {
    let at_target = self.seen == self.index;
    self.seen += 1;
    if at_target {
      self.down.next(value);
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
  fn picks_the_item_at_the_index() {
    let events = EventBuffer::new();
    events.subscribe_to(&observable::from_iter([10, 20, 30, 40]).element_at(2));
    assert_eq!(events.numbers(), vec![30.0]);
    assert!(events.is_completed());
  }

  #[test]
  fn later_items_never_arrive() {
    let events = EventBuffer::new();
    let (input, source) = feed();
    events.subscribe_to(&source.element_at(0));
    input.next(1);
    input.next(2);
    assert_eq!(events.numbers(), vec![1.0]);
    assert_eq!(events.completes(), 1);
  }

  #[test]
  fn short_source_completes_empty() {
    let events = EventBuffer::new();
    events.subscribe_to(&observable::from_iter([1, 2]).element_at(5));
    assert!(events.numbers().is_empty());
    assert!(events.is_completed());
  }
}
