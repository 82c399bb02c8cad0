use std::sync::Arc;
use std::time::Duration;

use crate::observable::Observable;
use crate::observer::Observer;
use crate::rc::MutArc;
use crate::scheduler::{ArcScheduler, Scheduler, WorkerScheduler};
use crate::value::Value;

/// Creates an observable which fires `period` into the future and repeats
/// every `period` after, emitting 0, 1, 2, … as numbers.
///
/// Ticks come from the shared background worker; use
/// [`Observable::observe_on`] to move them elsewhere, or [`interval_on`]
/// to pick the timing context yourself.
pub fn interval(period: Duration) -> Observable {
  interval_on(period, WorkerScheduler::shared().clone())
}

/// [`interval`] with an explicit timing scheduler.
pub fn interval_on(
  period: Duration,
  scheduler: impl Scheduler + 'static,
) -> Observable {
  let scheduler: ArcScheduler = Arc::new(scheduler);
  Observable::source(move |subscriber| {
    let subscription = subscriber.subscription().clone();
    let observer = MutArc::own(Some(subscriber));
    let handle = scheduler.schedule_repeating(
      Box::new(move |seq| {
        let mut observer = observer.clone();
        observer.next(Value::from(seq));
      }),
      period,
    );
    subscription.add(handle);
  })
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::scheduler::ManualScheduler;
  use crate::subscription::SubscriptionLike;
  use std::sync::Mutex;

  #[test]
  fn ticks_on_virtual_time() {
    let scheduler = ManualScheduler::now();
    let ticks = Arc::new(Mutex::new(Vec::new()));
    let t = ticks.clone();
    let period = Duration::from_millis(10);
    interval_on(period, scheduler.clone())
      .subscribe(move |v| t.lock().unwrap().push(v));
    scheduler.run_tasks();
    assert!(ticks.lock().unwrap().is_empty());
    scheduler.advance_and_run(period, 3);
    assert_eq!(
      *ticks.lock().unwrap(),
      vec![Value::from(0), Value::from(1), Value::from(2)]
    );
  }

  #[test]
  fn unsubscribe_stops_the_timer() {
    let scheduler = ManualScheduler::now();
    let ticks = Arc::new(Mutex::new(0));
    let t = ticks.clone();
    let period = Duration::from_millis(10);
    let mut subscription = interval_on(period, scheduler.clone())
      .subscribe(move |_| *t.lock().unwrap() += 1);
    scheduler.advance_and_run(period, 2);
    assert_eq!(*ticks.lock().unwrap(), 2);
    subscription.unsubscribe();
    scheduler.advance_and_run(period, 5);
    assert_eq!(*ticks.lock().unwrap(), 2);
  }

  #[test]
  fn dropping_the_handle_does_not_cancel() {
    let scheduler = ManualScheduler::now();
    let ticks = Arc::new(Mutex::new(0));
    let t = ticks.clone();
    let period = Duration::from_millis(10);
    let subscription = interval_on(period, scheduler.clone())
      .subscribe(move |_| *t.lock().unwrap() += 1);
    drop(subscription);
    scheduler.advance_and_run(period, 2);
    assert_eq!(*ticks.lock().unwrap(), 2);
  }

  #[test]
  fn shared_worker_ticks_in_real_time() {
    let ticks = Arc::new(Mutex::new(0));
    let t = ticks.clone();
    let mut subscription = interval(Duration::from_millis(5))
      .subscribe(move |_| *t.lock().unwrap() += 1);
    std::thread::sleep(Duration::from_millis(40));
    subscription.unsubscribe();
    assert!(*ticks.lock().unwrap() >= 2);
  }
}
