//! The pumped main context.
//!
//! The engine never owns the host's event loop; the host calls
//! [`MainLoop::pump`] at its own bounded rate (one call is one Tick) and
//! the engine queues work onto it from any thread. [`main_loop`] is the
//! process-wide instance every main-bound facility uses.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use once_cell::sync::Lazy;
use tracing::trace;

use crate::scheduler::{
  ArcScheduler, RepeatingTask, Scheduler, Task, TaskHandle, WorkerScheduler,
};
use crate::subscription::SubscriptionLike;

static MAIN_LOOP: Lazy<MainLoop> = Lazy::new(MainLoop::new);

/// The process-wide main loop. The host pumps it; everything else posts
/// to it.
pub fn main_loop() -> &'static MainLoop { &MAIN_LOOP }

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TickerId(u64);

struct TickerSlot {
  id: TickerId,
  cancelled: AtomicBool,
  f: Mutex<Box<dyn FnMut() + Send>>,
}

pub struct MainLoop {
  posted: Mutex<VecDeque<Task>>,
  tickers: Mutex<Vec<Arc<TickerSlot>>>,
  next_ticker: AtomicU64,
}

impl MainLoop {
  /// A fresh, unshared loop. Hosts and tests that need isolation can pump
  /// their own; the engine's facilities all sit on [`main_loop`].
  pub fn new() -> Self {
    MainLoop {
      posted: Mutex::new(VecDeque::new()),
      tickers: Mutex::new(Vec::new()),
      next_ticker: AtomicU64::new(0),
    }
  }

  /// Queue `f` to run on the next tick. Callable from any thread.
  pub fn post(&self, f: impl FnOnce() + Send + 'static) {
    self.posted.lock().unwrap().push_back(Box::new(f));
  }

  /// Register a callback run once per tick, after the posted work.
  pub fn add_ticker(
    &self,
    f: impl FnMut() + Send + 'static,
  ) -> TickerId {
    let id = TickerId(self.next_ticker.fetch_add(1, Ordering::Relaxed));
    trace!(ticker = id.0, "main loop ticker registered");
    self.tickers.lock().unwrap().push(Arc::new(TickerSlot {
      id,
      cancelled: AtomicBool::new(false),
      f: Mutex::new(Box::new(f)),
    }));
    id
  }

  pub fn remove_ticker(&self, id: TickerId) {
    let mut tickers = self.tickers.lock().unwrap();
    if let Some(pos) = tickers.iter().position(|slot| slot.id == id) {
      let slot = tickers.remove(pos);
      slot.cancelled.store(true, Ordering::Relaxed);
      trace!(ticker = id.0, "main loop ticker removed");
    }
  }

  /// One Tick: drain the work posted so far, in order, then run each
  /// ticker once. Work posted while pumping runs on the next tick.
  pub fn pump(&self) {
    let batch = std::mem::take(&mut *self.posted.lock().unwrap());
    for task in batch {
      task();
    }

    let tickers: Vec<_> = self.tickers.lock().unwrap().clone();
    for slot in tickers {
      if !slot.cancelled.load(Ordering::Relaxed) {
        (slot.f.lock().unwrap())();
      }
    }
  }

  pub fn pending_posts(&self) -> usize { self.posted.lock().unwrap().len() }

  pub fn ticker_count(&self) -> usize { self.tickers.lock().unwrap().len() }
}

impl Default for MainLoop {
  fn default() -> Self { Self::new() }
}

/// Scheduler bound to the process-wide main loop.
///
/// Undelayed tasks run on the next tick in enqueue order. Delayed and
/// repeating tasks keep time on the shared worker and hop onto the main
/// loop when due, so a hop adds up to one tick of latency.
#[derive(Clone, Copy, Debug, Default)]
pub struct MainScheduler;

impl MainScheduler {
  pub fn new() -> Self { MainScheduler }
}

impl Scheduler for MainScheduler {
  fn schedule(&self, task: Task, delay: Option<Duration>) -> TaskHandle {
    let handle = TaskHandle::new();
    let h = handle.clone();
    match delay {
      None => {
        main_loop().post(move || {
          let mut h = h;
          if !h.is_closed() {
            task();
          }
          h.unsubscribe();
        });
      }
      Some(delay) => {
        // The same handle gates the timer and the hop onto the main
        // loop, so cancelling between the two still wins.
        WorkerScheduler::shared().schedule_with_handle(
          Box::new(move || {
            let h2 = h.clone();
            main_loop().post(move || {
              let mut h2 = h2;
              if !h2.is_closed() {
                task();
              }
              h2.unsubscribe();
            });
          }),
          Some(delay),
          handle.clone(),
        );
      }
    }
    handle
  }

  fn schedule_repeating(
    &self,
    task: RepeatingTask,
    period: Duration,
  ) -> TaskHandle {
    let handle = TaskHandle::new();
    let h = handle.clone();
    let task = Arc::new(Mutex::new(task));
    WorkerScheduler::shared().schedule_repeating_with_handle(
      Box::new(move |i| {
        let task = task.clone();
        let h2 = h.clone();
        main_loop().post(move || {
          if !h2.is_closed() {
            (task.lock().unwrap())(i);
          }
        });
      }),
      period,
      handle.clone(),
    );
    handle
  }

  fn for_chain(&self) -> ArcScheduler { Arc::new(MainScheduler) }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn posts_run_in_order_on_pump() {
    let lp = MainLoop::new();
    let seen = Arc::new(Mutex::new(Vec::new()));
    for i in 0..3 {
      let s = seen.clone();
      lp.post(move || s.lock().unwrap().push(i));
    }
    assert_eq!(lp.pending_posts(), 3);
    lp.pump();
    assert_eq!(*seen.lock().unwrap(), vec![0, 1, 2]);
    assert_eq!(lp.pending_posts(), 0);
  }

  #[test]
  fn work_posted_while_pumping_waits_for_next_tick() {
    let lp = Arc::new(MainLoop::new());
    let seen = Arc::new(Mutex::new(Vec::new()));
    let lp2 = lp.clone();
    let s = seen.clone();
    lp.post(move || {
      s.lock().unwrap().push("first");
      let s2 = s.clone();
      lp2.post(move || s2.lock().unwrap().push("second"));
    });
    lp.pump();
    assert_eq!(*seen.lock().unwrap(), vec!["first"]);
    lp.pump();
    assert_eq!(*seen.lock().unwrap(), vec!["first", "second"]);
  }

  #[test]
  fn tickers_run_once_per_pump_until_removed() {
    let lp = MainLoop::new();
    let count = Arc::new(Mutex::new(0));
    let c = count.clone();
    let id = lp.add_ticker(move || *c.lock().unwrap() += 1);
    lp.pump();
    lp.pump();
    assert_eq!(*count.lock().unwrap(), 2);
    lp.remove_ticker(id);
    assert_eq!(lp.ticker_count(), 0);
    lp.pump();
    assert_eq!(*count.lock().unwrap(), 2);
  }

  #[test]
  fn tickers_run_after_posted_work() {
    let lp = MainLoop::new();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let s = seen.clone();
    lp.add_ticker(move || s.lock().unwrap().push("tick"));
    let s = seen.clone();
    lp.post(move || s.lock().unwrap().push("post"));
    lp.pump();
    assert_eq!(*seen.lock().unwrap(), vec!["post", "tick"]);
  }
}
