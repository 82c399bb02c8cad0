use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use crate::error::StreamError;
use crate::observable::Observable;
use crate::value::Value;

impl Observable {
  /// Subscribes and blocks the calling thread until the stream terminates,
  /// returning everything it emitted, or the error if it failed.
  ///
  /// Only call this on streams that are known to terminate, and never from
  /// the main context: a chain that needs the main loop pumped would wait
  /// on the very thread this call is blocking.
  pub fn collect_blocking(&self) -> Result<Vec<Value>, StreamError> {
    let stopped = Arc::new(AtomicBool::new(false));
    let values = Arc::new(Mutex::new(Vec::new()));
    let failure = Arc::new(Mutex::new(None::<StreamError>));

    let v = values.clone();
    let f = failure.clone();
    let stop_on_err = stopped.clone();
    let stop_on_done = stopped.clone();
    self.subscribe_all(
      move |value| v.lock().unwrap().push(value),
      move |err| {
        *f.lock().unwrap() = Some(err);
        stop_on_err.store(true, Ordering::Relaxed);
      },
      move || stop_on_done.store(true, Ordering::Relaxed),
    );

    while !stopped.load(Ordering::Relaxed) {
      thread::sleep(Duration::from_millis(1));
    }

    let failure = failure.lock().unwrap().take();
    match failure {
      Some(err) => Err(err),
      None => {
        let collected = std::mem::take(&mut *values.lock().unwrap());
        Ok(collected)
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::observable;

  #[test]
  fn collects_a_synchronous_stream() {
    let collected = observable::from_iter(vec![1, 2, 3])
      .collect_blocking()
      .unwrap();
    assert_eq!(
      collected,
      vec![Value::from(1), Value::from(2), Value::from(3)]
    );
  }

  #[test]
  fn returns_the_failure() {
    let err = observable::throw(StreamError::new("broken"))
      .collect_blocking()
      .unwrap_err();
    assert_eq!(err.to_string(), "broken");
  }

  #[test]
  fn waits_for_an_asynchronous_producer() {
    let collected = observable::create(|emitter| {
      thread::spawn(move || {
        thread::sleep(Duration::from_millis(10));
        emitter.next(7);
        emitter.complete();
      });
    })
    .collect_blocking()
    .unwrap();
    assert_eq!(collected, vec![Value::from(7)]);
  }
}
