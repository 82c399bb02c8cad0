//! Subjects: one identity that is both an observer and an observable.
//!
//! Feeding the observer side fans out to every subscriber of the
//! observable side. Variants differ only in what a late subscriber is
//! handed first: nothing ([`PublishSubject`]), the latest item
//! ([`BehaviorSubject`]), or the buffered history ([`ReplaySubject`]).

mod behavior_subject;
mod publish_subject;
mod replay_subject;

pub use behavior_subject::BehaviorSubject;
pub use publish_subject::PublishSubject;
pub use replay_subject::ReplaySubject;

use std::sync::{Arc, Mutex};

use crate::error::StreamError;
use crate::observable::Subscriber;
use crate::observer::Observer;
use crate::rc::MutArc;
use crate::value::Value;

/// The shared fan-out list behind every subject variant.
///
/// Emission snapshots the list and delivers outside the lock, so a
/// callback may subscribe or unsubscribe freely; such mutations take
/// effect for the next emission. A subscriber disposed mid-broadcast is
/// silenced immediately by its own gate. The terminal event is recorded so
/// subscribers arriving afterwards get it replayed on attach.
#[derive(Clone, Default)]
pub(crate) struct SubjectCore {
  inner: Arc<Mutex<CoreInner>>,
}

#[derive(Default)]
struct CoreInner {
  entries: Vec<Entry>,
  terminal: Option<Terminal>,
  next_id: u64,
}

struct Entry {
  id: u64,
  handle: MutArc<Option<Subscriber>>,
}

#[derive(Clone)]
enum Terminal {
  Completed,
  Failed(StreamError),
}

enum AttachOutcome {
  Attached(u64),
  Terminated(Terminal),
}

impl SubjectCore {
  /// Wire a subscriber into the fan-out list, or replay the terminal
  /// event if the subject is already over.
  pub(crate) fn attach(&self, subscriber: Subscriber) {
    let subscription = subscriber.subscription().clone();
    let mut subscriber = Some(subscriber);
    let outcome = {
      let mut inner = self.inner.lock().unwrap();
      match inner.terminal.clone() {
        Some(terminal) => AttachOutcome::Terminated(terminal),
        None => {
          let id = inner.next_id;
          inner.next_id += 1;
          inner
            .entries
            .push(Entry { id, handle: MutArc::own(subscriber.take()) });
          AttachOutcome::Attached(id)
        }
      }
    };
    match outcome {
      AttachOutcome::Attached(id) => {
        // Disposal takes the entry out so the list does not collect
        // corpses between emissions. Registered outside the core lock:
        // on an already-closed subscription the teardown runs right
        // here, and it takes the lock itself.
        let core = self.clone();
        subscription.add_teardown(move || core.detach(id));
      }
      AttachOutcome::Terminated(terminal) => {
        if let Some(subscriber) = subscriber.take() {
          deliver_terminal(subscriber, terminal);
        }
      }
    }
  }

  pub(crate) fn next(&self, value: Value) {
    let snapshot: Vec<MutArc<Option<Subscriber>>> = {
      let inner = self.inner.lock().unwrap();
      if inner.terminal.is_some() {
        return;
      }
      inner.entries.iter().map(|entry| entry.handle.clone()).collect()
    };
    for mut handle in snapshot {
      handle.next(value.clone());
    }
  }

  pub(crate) fn error(&self, err: StreamError) {
    for mut handle in self.terminate(Terminal::Failed(err.clone())) {
      handle.error(err.clone());
    }
  }

  pub(crate) fn complete(&self) {
    for mut handle in self.terminate(Terminal::Completed) {
      handle.complete();
    }
  }

  /// Record the terminal event and hand back the drained subscriber
  /// list. Empty if the subject was already terminated, which keeps
  /// terminal delivery at most once per subscriber.
  fn terminate(&self, terminal: Terminal) -> Vec<MutArc<Option<Subscriber>>> {
    let mut inner = self.inner.lock().unwrap();
    if inner.terminal.is_some() {
      return Vec::new();
    }
    inner.terminal = Some(terminal);
    inner.entries.drain(..).map(|entry| entry.handle).collect()
  }

  pub(crate) fn is_terminated(&self) -> bool {
    self.inner.lock().unwrap().terminal.is_some()
  }

  pub(crate) fn subscriber_count(&self) -> usize {
    self
      .inner
      .lock()
      .unwrap()
      .entries
      .iter()
      .filter(|entry| !entry.handle.is_closed())
      .count()
  }

  fn detach(&self, id: u64) {
    self.inner.lock().unwrap().entries.retain(|entry| entry.id != id);
  }
}

fn deliver_terminal(mut subscriber: Subscriber, terminal: Terminal) {
  match terminal {
    Terminal::Completed => subscriber.complete(),
    Terminal::Failed(err) => subscriber.error(err),
  }
}
