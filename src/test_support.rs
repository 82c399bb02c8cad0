#![cfg(test)]
//! Test helpers: an event trace collector, plus a lock for tests that
//! touch the process-wide main loop or watcher pool. Those are shared
//! across the whole test binary, so such tests take [`main_guard`] to
//! serialize against each other.

use std::sync::{Arc, Mutex, MutexGuard};

use once_cell::sync::Lazy;

use crate::error::StreamError;
use crate::observable::{Observable, StreamEmitter};
use crate::scheduler::main_loop;
use crate::subscription::Subscription;
use crate::value::Value;

static MAIN_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

/// Records every notification a chain delivers.
#[derive(Clone, Default)]
pub struct EventBuffer(Arc<Mutex<Trace>>);

#[derive(Default)]
struct Trace {
  nexts: Vec<Value>,
  errors: Vec<StreamError>,
  completes: usize,
}

impl EventBuffer {
  pub fn new() -> Self { Self::default() }

  pub fn subscribe_to(&self, source: &Observable) -> Subscription {
    let (n, e, c) = (self.0.clone(), self.0.clone(), self.0.clone());
    source.subscribe_all(
      move |v| n.lock().unwrap().nexts.push(v),
      move |err| e.lock().unwrap().errors.push(err),
      move || c.lock().unwrap().completes += 1,
    )
  }

  pub fn nexts(&self) -> Vec<Value> { self.0.lock().unwrap().nexts.clone() }

  /// The next-trace with every item read as a number.
  pub fn numbers(&self) -> Vec<f64> {
    self
      .nexts()
      .iter()
      .map(|v| v.as_number().expect("non-number in trace"))
      .collect()
  }

  pub fn error_messages(&self) -> Vec<String> {
    self
      .0
      .lock()
      .unwrap()
      .errors
      .iter()
      .map(|e| e.message().to_owned())
      .collect()
  }

  pub fn completes(&self) -> usize { self.0.lock().unwrap().completes }

  pub fn is_completed(&self) -> bool { self.completes() > 0 }
}

/// A hand-driven source: the observable side hands its emitter to the
/// feed at activation, and the test pushes through it afterwards.
#[derive(Clone, Default)]
pub struct TestFeed(Arc<Mutex<Option<StreamEmitter>>>);

impl TestFeed {
  pub fn next(&self, value: impl Into<Value>) {
    if let Some(emitter) = &*self.0.lock().unwrap() {
      emitter.next(value);
    }
  }

  pub fn error(&self, message: &str) {
    if let Some(emitter) = &*self.0.lock().unwrap() {
      emitter.error(StreamError::new(message));
    }
  }

  pub fn complete(&self) {
    if let Some(emitter) = &*self.0.lock().unwrap() {
      emitter.complete();
    }
  }
}

pub fn feed() -> (TestFeed, Observable) {
  let feed = TestFeed::default();
  let slot = feed.0.clone();
  let source = crate::observable::create(move |emitter| {
    *slot.lock().unwrap() = Some(emitter);
  });
  (feed, source)
}

pub fn main_guard() -> MutexGuard<'static, ()> {
  MAIN_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Pump the global loop until `done` holds, at most `max` times.
pub fn pump_until(done: impl Fn() -> bool, max: usize) -> bool {
  for _ in 0..max {
    if done() {
      return true;
    }
    main_loop().pump();
  }
  done()
}
