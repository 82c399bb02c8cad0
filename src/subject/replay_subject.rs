use std::collections::VecDeque;

use crate::error::StreamError;
use crate::observable::Observable;
use crate::observer::Observer;
use crate::rc::{MutArc, RcDeref, RcDerefMut};
use crate::subject::SubjectCore;
use crate::subscription::Subscription;
use crate::value::Value;

struct ReplayBuffer {
  items: VecDeque<Value>,
  capacity: Option<usize>,
}

/// Multicast with history: a new subscriber first receives the buffered
/// items, oldest first, then joins the live stream.
#[derive(Clone)]
pub struct ReplaySubject {
  core: SubjectCore,
  buffer: MutArc<ReplayBuffer>,
}

impl ReplaySubject {
  /// Keeps at most `capacity` items; older ones fall off the front.
  pub fn with_capacity(capacity: usize) -> Self {
    ReplaySubject {
      core: SubjectCore::default(),
      buffer: MutArc::own(ReplayBuffer {
        items: VecDeque::new(),
        capacity: Some(capacity),
      }),
    }
  }

  /// Keeps every item ever fed.
  pub fn unbounded() -> Self {
    ReplaySubject {
      core: SubjectCore::default(),
      buffer: MutArc::own(ReplayBuffer {
        items: VecDeque::new(),
        capacity: None,
      }),
    }
  }

  /// The observable side. History replays before the live stream; a subject
  /// that already terminated replays history and then the terminal event.
  pub fn observable(&self) -> Observable {
    let core = self.core.clone();
    let buffer = self.buffer.clone();
    Observable::source(move |mut subscriber| {
      let history: Vec<Value> =
        buffer.rc_deref().items.iter().cloned().collect();
      for item in history {
        subscriber.next(item);
        if subscriber.is_closed() {
          return;
        }
      }
      core.attach(subscriber);
    })
  }

  /// Subscribers currently attached and still open.
  pub fn subscriber_count(&self) -> usize { self.core.subscriber_count() }

  pub fn subscribe(
    &self,
    next: impl FnMut(Value) + Send + 'static,
  ) -> Subscription {
    self.observable().subscribe(next)
  }

  pub fn subscribe_err(
    &self,
    next: impl FnMut(Value) + Send + 'static,
    error: impl FnMut(StreamError) + Send + 'static,
  ) -> Subscription {
    self.observable().subscribe_err(next, error)
  }

  pub fn subscribe_complete(
    &self,
    next: impl FnMut(Value) + Send + 'static,
    complete: impl FnMut() + Send + 'static,
  ) -> Subscription {
    self.observable().subscribe_complete(next, complete)
  }

  pub fn subscribe_all(
    &self,
    next: impl FnMut(Value) + Send + 'static,
    error: impl FnMut(StreamError) + Send + 'static,
    complete: impl FnMut() + Send + 'static,
  ) -> Subscription {
    self.observable().subscribe_all(next, error, complete)
  }
}

impl Observer for ReplaySubject {
  fn next(&mut self, value: Value) {
    if self.core.is_terminated() {
      return;
    }
    {
      let mut buffer = self.buffer.rc_deref_mut();
      match buffer.capacity {
        Some(0) => {}
        Some(capacity) => {
          while buffer.items.len() >= capacity {
            buffer.items.pop_front();
          }
          buffer.items.push_back(value.clone());
        }
        None => buffer.items.push_back(value.clone()),
      }
    }
    self.core.next(value);
  }

  fn error(&mut self, err: StreamError) { self.core.error(err) }

  fn complete(&mut self) { self.core.complete() }

  fn is_closed(&self) -> bool { self.core.is_terminated() }
}
