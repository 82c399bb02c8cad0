use crate::error::StreamError;
use crate::observable::{Observable, Subscriber};
use crate::observer::Observer;
use crate::rc::{MutArc, RcDeref, RcDerefMut};
use crate::subscription::Subscription;
use crate::value::Value;

/// Interleaves any number of sources into one stream.
///
/// Items forward in arrival order. The merge completes once every source
/// has completed; the first error from any source terminates the chain and
/// detaches the remaining sources.
pub fn merge(sources: impl IntoIterator<Item = Observable>) -> Observable {
  let sources: Vec<Observable> = sources.into_iter().collect();
  Observable::joining(sources, |upstream, mut down| {
    if upstream.is_empty() {
      down.complete();
      return;
    }
    let chain = down.subscription().clone();
    let state = MutArc::own(MergeState {
      down: Some(down),
      remaining: upstream.len(),
    });
    for source in upstream {
      // Every leg owns its subscription so one source finishing does not
      // detach the others; the chain still tears all legs down at once.
      let leg = Subscription::new();
      chain.add(leg.clone());
      let observer = MergeLeg { state: state.clone() };
      source.activate(Subscriber::new(Box::new(observer), leg));
    }
  })
}

impl Observable {
  /// Merges this stream with `other`. See [`merge`].
  pub fn merge_with(&self, other: &Observable) -> Observable {
    merge([self.clone(), other.clone()])
  }
}

struct MergeState {
  down: Option<Subscriber>,
  remaining: usize,
}

struct MergeLeg {
  state: MutArc<MergeState>,
}

impl Observer for MergeLeg {
  fn next(&mut self, value: Value) {
    if let Some(down) = self.state.rc_deref_mut().down.as_mut() {
      down.next(value);
    }
  }

  fn error(&mut self, err: StreamError) {
    if let Some(mut down) = self.state.rc_deref_mut().down.take() {
      down.error(err);
    }
  }

  fn complete(&mut self) {
    let mut state = self.state.rc_deref_mut();
    state.remaining -= 1;
    if state.remaining > 0 {
      return;
    }
    if let Some(mut down) = state.down.take() {
      down.complete();
    }
  }

  fn is_closed(&self) -> bool {
    self.state.rc_deref().down.as_ref().is_none_or(Subscriber::is_closed)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::observable;
  use crate::test_support::{feed, EventBuffer};

  #[test]
  fn interleaves_in_arrival_order() {
    let events = EventBuffer::new();
    let (left, left_src) = feed();
    let (right, right_src) = feed();
    events.subscribe_to(&left_src.merge_with(&right_src));
    left.next(1);
    right.next(10);
    left.next(2);
    assert_eq!(events.numbers(), vec![1.0, 10.0, 2.0]);
  }

  #[test]
  fn completes_only_after_every_source() {
    let events = EventBuffer::new();
    let (left, left_src) = feed();
    let (right, right_src) = feed();
    events.subscribe_to(&left_src.merge_with(&right_src));
    left.complete();
    assert_eq!(events.completes(), 0);
    right.next(5);
    right.complete();
    assert_eq!(events.numbers(), vec![5.0]);
    assert_eq!(events.completes(), 1);
  }

  #[test]
  fn first_error_wins() {
    let events = EventBuffer::new();
    let (left, left_src) = feed();
    let (right, right_src) = feed();
    events.subscribe_to(&left_src.merge_with(&right_src));
    left.error("left broke");
    right.next(1);
    assert!(events.numbers().is_empty());
    assert_eq!(events.error_messages(), vec!["left broke"]);
  }

  #[test]
  fn merging_nothing_completes() {
    let events = EventBuffer::new();
    events.subscribe_to(&merge([]));
    assert!(events.is_completed());
  }

  #[test]
  fn synchronous_sources_run_one_after_another() {
    let events = EventBuffer::new();
    let merged = merge([
      observable::from_iter([1, 2]),
      observable::from_iter([3, 4]),
    ]);
    events.subscribe_to(&merged);
    assert_eq!(events.numbers(), vec![1.0, 2.0, 3.0, 4.0]);
    assert!(events.is_completed());
  }
}
